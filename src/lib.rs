//! synk-deploy - packaging and service management for local-synk
//!
//! Builds the Python application into a standalone executable and
//! registers it as a Windows background service through NSSM.

pub mod build;
pub mod clock;
pub mod config;
pub mod error;
pub mod privilege;
pub mod process;
pub mod service;

#[cfg(test)]
mod testing;

pub use error::{DeployError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
