//! Service installation
//!
//! Registers the packaged executable with the service manager, configures
//! its working directory and log redirection, verifies the record and
//! starts it. Any failure after registration removes the half-configured
//! record again so installation is all-or-nothing.

use super::descriptor::ServiceDescriptor;
use super::nssm::Nssm;
use crate::error::{DeployError, Result};
use crate::privilege::Privilege;
use crate::process::CommandRunner;
use std::path::Path;
use tracing::{error, info, warn};

/// Drives the install sequence for one service descriptor
pub struct ServiceInstaller<'a> {
    descriptor: ServiceDescriptor,
    nssm_path: &'a Path,
    runner: &'a dyn CommandRunner,
    privilege: &'a dyn Privilege,
}

impl<'a> ServiceInstaller<'a> {
    pub fn new(
        descriptor: ServiceDescriptor,
        nssm_path: &'a Path,
        runner: &'a dyn CommandRunner,
        privilege: &'a dyn Privilege,
    ) -> Self {
        Self {
            descriptor,
            nssm_path,
            runner,
            privilege,
        }
    }

    /// Install, configure and start the service
    pub fn install(&self) -> Result<()> {
        if !self.privilege.is_elevated() {
            return Err(DeployError::PermissionDenied {
                action: "Installing a service".to_string(),
            });
        }

        let nssm = Nssm::locate(self.nssm_path, self.runner)?;
        let descriptor = &self.descriptor;

        if !descriptor.paths_are_absolute() {
            return Err(DeployError::InvalidConfig(format!(
                "service paths for {} must be absolute",
                descriptor.name
            )));
        }

        if !descriptor.executable.is_file() {
            return Err(DeployError::ArtifactMissing {
                path: descriptor.executable.clone(),
            });
        }

        info!(
            "Registering service {} -> {}",
            descriptor.name,
            descriptor.executable.display()
        );
        nssm.install(&descriptor.name, &descriptor.executable)?;

        if let Err(e) = self.configure_and_start(&nssm) {
            error!("Install of {} failed after registration: {}", descriptor.name, e);
            self.rollback(&nssm);
            return Err(e);
        }

        println!("Service '{}' installed and started.", descriptor.name);
        println!("Logs: {}", descriptor.stdout_log.display());
        Ok(())
    }

    fn configure_and_start(&self, nssm: &Nssm<'_>) -> Result<()> {
        let name = &self.descriptor.name;
        let properties = self.descriptor.properties();

        for (property, value) in &properties {
            info!("Setting {} = {}", property, value);
            nssm.set(name, *property, value)?;
        }

        for (property, expected) in &properties {
            let actual = nssm.get(name, *property)?;
            if &actual != expected {
                return Err(DeployError::ConfigMismatch {
                    property: property.to_string(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        info!("Starting service {}", name);
        nssm.start(name)
    }

    fn rollback(&self, nssm: &Nssm<'_>) {
        let name = &self.descriptor.name;
        warn!("Removing partially installed service {}", name);
        if let Err(e) = nssm.remove(name) {
            warn!("Rollback of {} failed, remove it manually: {}", name, e);
        }
    }
}
