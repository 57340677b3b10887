//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// synk-deploy - package local-synk and manage its Windows service
///
/// Builds the application into a single executable and registers it
/// with the service manager through NSSM.
#[derive(Parser, Debug)]
#[command(name = "synk-deploy")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output (can be repeated for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode - only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log output to file
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    /// Configuration file (default: synk-deploy.toml next to the binary)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Clean previous artifacts and package the application
    Build,

    /// Register the packaged executable as a service and start it
    Install,

    /// Stop and remove the service (no-op when it is not installed)
    Uninstall,

    /// Show the current state of the service
    Status,

    /// Print a sample configuration file
    Config {
        /// Write the sample to this path instead of stdout
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

impl Args {
    /// Get the log level based on verbose/quiet flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else {
            match self.verbose {
                0 => tracing::Level::INFO,
                1 => tracing::Level::DEBUG,
                _ => tracing::Level::TRACE,
            }
        }
    }
}
