//! Packaging of the Python application into a single executable
//!
//! Each host platform gets its own tree under the deploy root:
//!
//! ```text
//! <deploy_root>/<platform>/build/          packager work directory
//! <deploy_root>/<platform>/dist/<name>     the artifact (.exe on Windows)
//! <deploy_root>/<platform>/<name>.spec     generated build descriptor
//! ```
//!
//! All of it is transient and wiped before every build.

use crate::config::{absolutize, BuildSettings};
use crate::error::{DeployError, Result};
use crate::process::{display_command, CommandRunner};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Paths of one platform's build tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    pub platform: String,
    pub platform_dir: PathBuf,
    pub work_dir: PathBuf,
    pub dist_dir: PathBuf,
    pub artifact: PathBuf,
}

impl BuildLayout {
    pub fn new(deploy_root: &Path, platform: &str, output_name: &str, exe_suffix: &str) -> Self {
        let platform_dir = deploy_root.join(platform);
        let dist_dir = platform_dir.join("dist");
        Self {
            platform: platform.to_string(),
            work_dir: platform_dir.join("build"),
            artifact: dist_dir.join(format!("{}{}", output_name, exe_suffix)),
            dist_dir,
            platform_dir,
        }
    }

    /// Layout for the platform this binary runs on
    pub fn for_host(deploy_root: &Path, output_name: &str) -> Self {
        Self::new(
            deploy_root,
            host_platform(),
            output_name,
            std::env::consts::EXE_SUFFIX,
        )
    }
}

/// Platform directory name for the current host
pub fn host_platform() -> &'static str {
    match std::env::consts::OS {
        "windows" => "windows",
        "macos" => "macos",
        "linux" => "linux",
        other => other,
    }
}

/// A successfully packaged executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub entry_point: PathBuf,
    pub output_name: String,
    pub platform: String,
    pub path: PathBuf,
}

/// Cleans the previous build and runs the packaging tool
pub struct BuildOrchestrator<'a> {
    settings: &'a BuildSettings,
    base_dir: PathBuf,
    layout: BuildLayout,
    runner: &'a dyn CommandRunner,
}

impl<'a> BuildOrchestrator<'a> {
    /// Relative paths in `settings` are resolved against `base_dir`
    pub fn new(
        settings: &'a BuildSettings,
        base_dir: &Path,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        let deploy_root = absolutize(base_dir, &settings.deploy_root);
        Self {
            settings,
            base_dir: base_dir.to_path_buf(),
            layout: BuildLayout::for_host(&deploy_root, &settings.output_name),
            runner,
        }
    }

    /// Override the target layout
    pub fn with_layout(mut self, layout: BuildLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> &BuildLayout {
        &self.layout
    }

    pub fn run(&self) -> Result<BuildArtifact> {
        let entry_point = absolutize(&self.base_dir, &self.settings.entry_point);
        info!(
            "Building {} for {} from {}",
            self.settings.output_name,
            self.layout.platform,
            entry_point.display()
        );

        self.clean();

        let packager = self.locate_packager()?;
        fs::create_dir_all(&self.layout.platform_dir)?;

        let args = self.packager_args(&entry_point);
        info!("{}", display_command(&packager, &args));

        let output = self
            .runner
            .run(&packager, &args)
            .map_err(|source| DeployError::Spawn {
                tool: self.settings.packager.clone(),
                source,
            })?;
        debug!("Packager output:\n{}", output.stdout.trim_end());

        if !output.success() {
            return Err(DeployError::external_tool(
                self.settings.packager.as_str(),
                format!("package {}", entry_point.display()),
                output.status(),
                output.detail(),
            ));
        }

        self.verify_artifact()?;

        println!("Build complete: {}", self.layout.artifact.display());
        Ok(BuildArtifact {
            entry_point,
            output_name: self.settings.output_name.clone(),
            platform: self.layout.platform.clone(),
            path: self.layout.artifact.clone(),
        })
    }

    /// Remove the previous build tree; failures only warn
    pub fn clean(&self) {
        for dir in [&self.layout.work_dir, &self.layout.dist_dir] {
            match fs::remove_dir_all(dir) {
                Ok(()) => debug!("Removed {}", dir.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove {}: {}", dir.display(), e),
            }
        }

        let entries = match fs::read_dir(&self.layout.platform_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return,
            Err(e) => {
                warn!("Could not list {}: {}", self.layout.platform_dir.display(), e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "spec") {
                match fs::remove_file(&path) {
                    Ok(()) => debug!("Removed {}", path.display()),
                    Err(e) => warn!("Could not remove {}: {}", path.display(), e),
                }
            }
        }
    }

    fn locate_packager(&self) -> Result<PathBuf> {
        let packager = Path::new(&self.settings.packager);
        let missing = || DeployError::DependencyMissing {
            name: format!("Packaging tool '{}'", self.settings.packager),
            path: packager.to_path_buf(),
        };

        if packager.components().count() > 1 || packager.is_absolute() {
            let path = absolutize(&self.base_dir, packager);
            return if path.is_file() { Ok(path) } else { Err(missing()) };
        }

        which::which(packager).map_err(|_| missing())
    }

    fn packager_args(&self, entry_point: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--noconfirm".into(),
            "--onefile".into(),
            "--name".into(),
            self.settings.output_name.clone().into(),
            "--distpath".into(),
            self.layout.dist_dir.clone().into(),
            "--workpath".into(),
            self.layout.work_dir.clone().into(),
            "--specpath".into(),
            self.layout.platform_dir.clone().into(),
        ];

        for package in &self.settings.collect_all {
            args.push("--collect-all".into());
            args.push(package.into());
        }
        for module in &self.settings.hidden_imports {
            args.push("--hidden-import".into());
            args.push(module.into());
        }
        args.extend(self.settings.extra_args.iter().map(OsString::from));
        args.push(entry_point.as_os_str().to_os_string());
        args
    }

    fn verify_artifact(&self) -> Result<()> {
        let artifact = &self.layout.artifact;
        match fs::metadata(artifact) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
            _ => Err(DeployError::ArtifactMissing {
                path: artifact.clone(),
            }),
        }
    }
}
