//! NSSM service-control utility wrapper

use super::descriptor::ServiceProperty;
use crate::error::{DeployError, Result};
use crate::process::{display_command, CommandOutput, CommandRunner};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

const TOOL: &str = "nssm";

/// Service state as reported by the service manager
///
/// Never cached: every operation queries it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceState {
    NotInstalled,
    Stopped,
    Running,
    Paused,
    /// Start, stop, pause or continue in progress
    Pending(String),
}

impl ServiceState {
    /// Parse the output of a successful `status` query
    pub fn parse(output: &str) -> Self {
        let text = output.trim();
        match text {
            "SERVICE_STOPPED" => ServiceState::Stopped,
            "SERVICE_RUNNING" => ServiceState::Running,
            "SERVICE_PAUSED" => ServiceState::Paused,
            other => ServiceState::Pending(other.to_string()),
        }
    }

    pub fn is_installed(&self) -> bool {
        !matches!(self, ServiceState::NotInstalled)
    }

    /// Stopped or gone, so removal cannot race a live process
    pub fn is_inactive(&self) -> bool {
        matches!(self, ServiceState::NotInstalled | ServiceState::Stopped)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::NotInstalled => f.write_str("not installed"),
            ServiceState::Stopped => f.write_str("stopped"),
            ServiceState::Running => f.write_str("running"),
            ServiceState::Paused => f.write_str("paused"),
            ServiceState::Pending(raw) => write!(f, "pending ({})", raw),
        }
    }
}

/// Handle on a located NSSM binary
pub struct Nssm<'a> {
    path: PathBuf,
    runner: &'a dyn CommandRunner,
}

impl<'a> Nssm<'a> {
    /// Verify the utility exists before any service call is made
    pub fn locate(path: impl Into<PathBuf>, runner: &'a dyn CommandRunner) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(DeployError::DependencyMissing {
                name: "NSSM service utility".to_string(),
                path,
            });
        }
        debug!("Using service utility at {}", path.display());
        Ok(Self { path, runner })
    }

    /// Create a new service record running `executable`
    pub fn install(&self, name: &str, executable: &Path) -> Result<()> {
        self.checked(
            &format!("install {}", name),
            &[
                OsString::from("install"),
                OsString::from(name),
                executable.as_os_str().to_os_string(),
            ],
        )
        .map(|_| ())
    }

    /// Set a property on an existing service record
    pub fn set(&self, name: &str, property: ServiceProperty, value: &str) -> Result<()> {
        self.checked(
            &format!("set {} on {}", property, name),
            &[
                OsString::from("set"),
                OsString::from(name),
                OsString::from(property.as_str()),
                OsString::from(value),
            ],
        )
        .map(|_| ())
    }

    /// Read a property back from the service record
    pub fn get(&self, name: &str, property: ServiceProperty) -> Result<String> {
        let output = self.checked(
            &format!("get {} of {}", property, name),
            &[
                OsString::from("get"),
                OsString::from(name),
                OsString::from(property.as_str()),
            ],
        )?;
        Ok(output.stdout.trim_end_matches(['\r', '\n']).to_string())
    }

    pub fn start(&self, name: &str) -> Result<()> {
        self.checked(
            &format!("start {}", name),
            &[OsString::from("start"), OsString::from(name)],
        )
        .map(|_| ())
    }

    /// Ask the service to stop; the raw output is returned unchecked
    pub fn stop(&self, name: &str) -> Result<CommandOutput> {
        self.run(&[OsString::from("stop"), OsString::from(name)])
    }

    /// Query the current state; a failing query means "not installed"
    pub fn status(&self, name: &str) -> Result<ServiceState> {
        let output = self.run(&[OsString::from("status"), OsString::from(name)])?;
        if !output.success() {
            debug!(
                "Status query for {} failed ({}): treating as not installed",
                name,
                output.status()
            );
            return Ok(ServiceState::NotInstalled);
        }
        Ok(ServiceState::parse(&output.stdout))
    }

    /// Remove the service record without an interactive prompt
    pub fn remove(&self, name: &str) -> Result<()> {
        self.checked(
            &format!("remove {}", name),
            &[
                OsString::from("remove"),
                OsString::from(name),
                OsString::from("confirm"),
            ],
        )
        .map(|_| ())
    }

    fn run(&self, args: &[OsString]) -> Result<CommandOutput> {
        debug!("{}", display_command(&self.path, args));
        self.runner
            .run(&self.path, args)
            .map_err(|source| DeployError::Spawn {
                tool: TOOL.to_string(),
                source,
            })
    }

    fn checked(&self, action: &str, args: &[OsString]) -> Result<CommandOutput> {
        let output = self.run(args)?;
        if output.success() {
            Ok(output)
        } else {
            Err(DeployError::external_tool(
                TOOL,
                action,
                output.status(),
                output.detail(),
            ))
        }
    }
}
