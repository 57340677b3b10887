//! Service descriptor handed to the service manager

use std::fmt;
use std::path::PathBuf;

/// Everything the service manager needs to register the application
///
/// Built from [`ServiceSettings::descriptor`](crate::config::ServiceSettings::descriptor),
/// which resolves every path against the installation directory. Once
/// registered, the service manager owns the persisted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Service name, unique per machine
    pub name: String,
    /// Absolute path of the packaged executable
    pub executable: PathBuf,
    /// Absolute working directory of the service process
    pub working_dir: PathBuf,
    /// Absolute stdout log path
    pub stdout_log: PathBuf,
    /// Absolute stderr log path
    pub stderr_log: PathBuf,
    /// Free-text description
    pub description: String,
}

impl ServiceDescriptor {
    /// Properties set on the service record after registration, in order
    pub fn properties(&self) -> Vec<(ServiceProperty, String)> {
        vec![
            (ServiceProperty::Description, self.description.clone()),
            (
                ServiceProperty::AppDirectory,
                self.working_dir.to_string_lossy().into_owned(),
            ),
            (
                ServiceProperty::AppStdout,
                self.stdout_log.to_string_lossy().into_owned(),
            ),
            (
                ServiceProperty::AppStderr,
                self.stderr_log.to_string_lossy().into_owned(),
            ),
        ]
    }

    /// Whether every path in the descriptor is absolute
    pub fn paths_are_absolute(&self) -> bool {
        [
            &self.executable,
            &self.working_dir,
            &self.stdout_log,
            &self.stderr_log,
        ]
        .iter()
        .all(|p| p.is_absolute())
    }
}

/// Service record properties understood by the service-control utility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceProperty {
    Description,
    AppDirectory,
    AppStdout,
    AppStderr,
}

impl ServiceProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceProperty::Description => "Description",
            ServiceProperty::AppDirectory => "AppDirectory",
            ServiceProperty::AppStdout => "AppStdout",
            ServiceProperty::AppStderr => "AppStderr",
        }
    }
}

impl fmt::Display for ServiceProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
