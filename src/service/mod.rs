//! Windows service lifecycle for the packaged application
//!
//! All service-manager calls go through the NSSM utility, which must sit in
//! the installation directory next to the packaged executable.

mod descriptor;
mod installer;
mod nssm;
mod uninstaller;

pub use descriptor::{ServiceDescriptor, ServiceProperty};
pub use installer::ServiceInstaller;
pub use nssm::{Nssm, ServiceState};
pub use uninstaller::{ServiceUninstaller, StopWait, UninstallOutcome};

use crate::config::ServiceSettings;

impl From<&ServiceSettings> for StopWait {
    fn from(settings: &ServiceSettings) -> Self {
        Self {
            grace: settings.stop_grace(),
            timeout: settings.stop_timeout(),
            poll_interval: settings.poll_interval(),
        }
    }
}
