//! Deployment configuration file support

use crate::error::{DeployError, Result};
use crate::service::ServiceDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name searched next to the running binary
pub const CONFIG_FILE_NAME: &str = "synk-deploy.toml";

/// Deployment configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeployConfig {
    /// Service registration settings
    pub service: ServiceSettings,

    /// Packaging settings
    pub build: BuildSettings,
}

/// Settings for registering the packaged executable as a service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name, unique per machine
    pub name: String,

    /// Human-readable description shown in services.msc
    pub description: String,

    /// Packaged executable (relative = inside install_dir)
    pub executable: PathBuf,

    /// Installation directory (empty = directory of this binary)
    pub install_dir: PathBuf,

    /// Combined stdout/stderr log (relative = inside install_dir)
    pub log_file: PathBuf,

    /// Service-control utility (relative = inside install_dir)
    pub nssm: PathBuf,

    /// Minimum wait between the stop and remove calls
    pub stop_grace_secs: u64,

    /// Upper bound on waiting for the service to report stopped
    pub stop_timeout_secs: u64,

    /// Interval between status queries while waiting for stop
    pub poll_interval_ms: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "local-synk".to_string(),
            description: "Local Synk scheduled file synchronisation service".to_string(),
            executable: PathBuf::from("local-synk.exe"),
            install_dir: PathBuf::new(),
            log_file: PathBuf::from("service.log"),
            nssm: PathBuf::from("nssm.exe"),
            stop_grace_secs: 5,
            stop_timeout_secs: 30,
            poll_interval_ms: 500,
        }
    }
}

impl ServiceSettings {
    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Resolve the installation directory to an absolute path
    ///
    /// An empty setting means "where this binary lives", mirroring how the
    /// service-control utility is expected to sit alongside the installer.
    pub fn resolve_install_dir(&self) -> Result<PathBuf> {
        if self.install_dir.as_os_str().is_empty() {
            let exe = std::env::current_exe()?;
            return exe.parent().map(Path::to_path_buf).ok_or_else(|| {
                DeployError::InvalidConfig(format!(
                    "cannot determine directory of {}",
                    exe.display()
                ))
            });
        }

        let cwd = std::env::current_dir()?;
        Ok(absolutize(&cwd, &self.install_dir))
    }

    /// Absolute path of the service-control utility
    pub fn nssm_path(&self, install_dir: &Path) -> PathBuf {
        absolutize(install_dir, &self.nssm)
    }

    /// Build the service descriptor with every path made absolute
    pub fn descriptor(&self, install_dir: &Path) -> ServiceDescriptor {
        let log = absolutize(install_dir, &self.log_file);
        ServiceDescriptor {
            name: self.name.clone(),
            executable: absolutize(install_dir, &self.executable),
            working_dir: install_dir.to_path_buf(),
            stdout_log: log.clone(),
            stderr_log: log,
            description: self.description.clone(),
        }
    }
}

/// Settings for the packaging tool invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuildSettings {
    /// Python entry point handed to the packager
    pub entry_point: PathBuf,

    /// Executable name (without platform suffix)
    pub output_name: String,

    /// Root of the per-platform build trees
    pub deploy_root: PathBuf,

    /// Packaging tool, either a bare name looked up on PATH or a path
    pub packager: String,

    /// Packages whose data and submodules are fully vendored
    pub collect_all: Vec<String>,

    /// Modules the packager cannot discover on its own
    pub hidden_imports: Vec<String>,

    /// Additional arguments appended before the entry point
    pub extra_args: Vec<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            entry_point: PathBuf::from("main.py"),
            output_name: "local-synk".to_string(),
            deploy_root: PathBuf::from("deploy"),
            packager: "pyinstaller".to_string(),
            collect_all: vec!["nicegui".to_string()],
            hidden_imports: vec!["win32timezone".to_string()],
            extra_args: Vec::new(),
        }
    }
}

impl DeployConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().to_string_lossy().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. Same directory as executable: synk-deploy.toml
    /// 2. Per-user config directory: synk-deploy/config.toml
    pub fn load_default() -> std::result::Result<Self, ConfigError> {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let config_path = exe_dir.join(CONFIG_FILE_NAME);
                if config_path.exists() {
                    return Self::load(&config_path);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("synk-deploy").join("config.toml");
            if config_path.exists() {
                return Self::load(&config_path);
            }
        }

        Ok(Self::default())
    }

    /// Write the commented sample configuration to a file
    pub fn write_sample<P: AsRef<Path>>(path: P) -> std::result::Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                    path: parent.to_string_lossy().to_string(),
                    source: e,
                })?;
            }
        }

        std::fs::write(path, Self::sample_config()).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Reject settings no component can work with
    pub fn validate(&self) -> Result<()> {
        if self.service.name.trim().is_empty() {
            return Err(DeployError::InvalidConfig(
                "service.name must not be empty".to_string(),
            ));
        }
        if self.build.output_name.trim().is_empty() {
            return Err(DeployError::InvalidConfig(
                "build.output_name must not be empty".to_string(),
            ));
        }
        if self.service.poll_interval_ms == 0 {
            return Err(DeployError::InvalidConfig(
                "service.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.service.stop_timeout_secs < self.service.stop_grace_secs {
            return Err(DeployError::InvalidConfig(format!(
                "service.stop_timeout_secs ({}) is shorter than service.stop_grace_secs ({})",
                self.service.stop_timeout_secs, self.service.stop_grace_secs
            )));
        }
        Ok(())
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# synk-deploy configuration
# Controls how local-synk is packaged and registered as a Windows service

[service]
# Service name, must be unique on the machine
name = "local-synk"

# Description shown in services.msc
description = "Local Synk scheduled file synchronisation service"

# Relative paths below are resolved against install_dir
executable = "local-synk.exe"

# Installation directory (empty = directory containing synk-deploy)
install_dir = ""

# stdout and stderr are both redirected to this file
log_file = "service.log"

# Service-control utility
nssm = "nssm.exe"

# Never remove the service sooner than this after asking it to stop
stop_grace_secs = 5

# Give up waiting for the stopped state after this long
stop_timeout_secs = 30

# Status polling interval while waiting for stop
poll_interval_ms = 500

[build]
entry_point = "main.py"
output_name = "local-synk"

# Artifacts land in <deploy_root>/<platform>/dist
deploy_root = "deploy"

# Packaging tool, looked up on PATH unless given as a path
packager = "pyinstaller"

# Packages to vendor completely (data files and submodules)
collect_all = ["nicegui"]

# Modules the packager cannot discover by itself
hidden_imports = ["win32timezone"]

extra_args = []
"#
        .to_string()
    }
}

/// Join `path` onto `base` unless it is already absolute
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading/writing config file
    Io {
        path: String,
        source: std::io::Error,
    },
    /// Error parsing TOML
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to access config file '{}': {}", path, source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path, source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}
