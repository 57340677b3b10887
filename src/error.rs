//! Unified error types for synk-deploy

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for deployment operations
#[derive(Error, Debug)]
pub enum DeployError {
    /// The current process lacks administrative privilege
    #[error("{action} requires administrative privileges; re-run from an elevated (Administrator) prompt")]
    PermissionDenied { action: String },

    /// A required external tool could not be found
    #[error("{name} not found at {}", path.display())]
    DependencyMissing { name: String, path: PathBuf },

    /// An external tool ran but exited unsuccessfully
    #[error("{tool} failed to {action} ({status}){detail}")]
    ExternalTool {
        tool: String,
        action: String,
        status: String,
        detail: String,
    },

    /// An external tool could not be launched at all
    #[error("Failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// Packaging reported success but produced no usable artifact
    #[error("Build artifact missing or empty: {}", path.display())]
    ArtifactMissing { path: PathBuf },

    /// A service property read back differently from what was written
    #[error("Service property '{property}' is '{actual}', expected '{expected}'")]
    ConfigMismatch {
        property: String,
        expected: String,
        actual: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be loaded or saved
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for deployment operations
pub type Result<T> = std::result::Result<T, DeployError>;

impl DeployError {
    /// Create an external tool failure with context
    pub fn external_tool(
        tool: impl Into<String>,
        action: impl Into<String>,
        status: impl Into<String>,
        detail: impl AsRef<str>,
    ) -> Self {
        let detail = detail.as_ref().trim();
        Self::ExternalTool {
            tool: tool.into(),
            action: action.into(),
            status: status.into(),
            detail: if detail.is_empty() {
                String::new()
            } else {
                format!(": {}", detail)
            },
        }
    }

    /// Process exit code for this error. Every failure maps to 1.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
