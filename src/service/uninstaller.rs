//! Service removal
//!
//! Uninstalling an absent service is a successful no-op. Elevation is only
//! demanded once the service is known to exist, right before the first
//! mutating call.

use super::nssm::Nssm;
use crate::clock::Clock;
use crate::error::{DeployError, Result};
use crate::privilege::Privilege;
use crate::process::CommandRunner;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long to wait between stopping and removing the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopWait {
    /// Removal is never issued sooner than this after the stop call
    pub grace: Duration,
    /// Stop waiting for the stopped state after this long
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for StopWait {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5),
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Result of an uninstall run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallOutcome {
    /// Nothing was registered under the name
    NotInstalled,
    Removed,
}

impl fmt::Display for UninstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UninstallOutcome::NotInstalled => f.write_str("Nothing to uninstall."),
            UninstallOutcome::Removed => f.write_str("Service uninstalled successfully!"),
        }
    }
}

/// Drives the stop-and-remove sequence for one service name
pub struct ServiceUninstaller<'a> {
    name: &'a str,
    nssm_path: &'a Path,
    wait: StopWait,
    runner: &'a dyn CommandRunner,
    privilege: &'a dyn Privilege,
    clock: &'a dyn Clock,
}

impl<'a> ServiceUninstaller<'a> {
    pub fn new(
        name: &'a str,
        nssm_path: &'a Path,
        runner: &'a dyn CommandRunner,
        privilege: &'a dyn Privilege,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            name,
            nssm_path,
            wait: StopWait::default(),
            runner,
            privilege,
            clock,
        }
    }

    pub fn with_wait(mut self, wait: StopWait) -> Self {
        self.wait = wait;
        self
    }

    pub fn uninstall(&self) -> Result<UninstallOutcome> {
        let nssm = Nssm::locate(self.nssm_path, self.runner)?;

        let state = nssm.status(self.name)?;
        if !state.is_installed() {
            info!("Service {} is not installed", self.name);
            return Ok(UninstallOutcome::NotInstalled);
        }
        debug!("Service {} is {}", self.name, state);

        if !self.privilege.is_elevated() {
            return Err(DeployError::PermissionDenied {
                action: "Removing a service".to_string(),
            });
        }

        println!("Stopping service '{}'...", self.name);
        let stop = nssm.stop(self.name)?;
        if !stop.success() {
            // Already stopped, or the stop verb is not handled cleanly.
            debug!("Stop of {} returned {}: {}", self.name, stop.status(), stop.detail());
        }
        let stopped_at = self.clock.now();

        self.wait_for_stop(&nssm, stopped_at)?;

        println!("Removing service '{}'...", self.name);
        nssm.remove(self.name).map_err(|e| match e {
            DeployError::ExternalTool {
                tool,
                action,
                status,
                detail,
            } => DeployError::ExternalTool {
                tool,
                action,
                status,
                detail: if detail.is_empty() {
                    ": try running as Administrator".to_string()
                } else {
                    format!("{}; try running as Administrator", detail)
                },
            },
            other => other,
        })?;

        Ok(UninstallOutcome::Removed)
    }

    /// Block until the grace period has passed and the service is inactive,
    /// or the timeout expires
    fn wait_for_stop(&self, nssm: &Nssm<'_>, stopped_at: std::time::Instant) -> Result<()> {
        loop {
            let elapsed = self.clock.now().saturating_duration_since(stopped_at);

            if elapsed >= self.wait.grace {
                let state = nssm.status(self.name)?;
                if state.is_inactive() {
                    debug!("Service {} is {} after {:?}", self.name, state, elapsed);
                    return Ok(());
                }
                if elapsed >= self.wait.timeout {
                    warn!(
                        "Service {} still {} after {:?}, removing anyway",
                        self.name, state, elapsed
                    );
                    return Ok(());
                }
                self.clock.sleep(self.wait.poll_interval);
            } else {
                let remaining = self.wait.grace - elapsed;
                self.clock.sleep(remaining.min(self.wait.poll_interval));
            }
        }
    }
}
