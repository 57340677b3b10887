//! Command line and configuration file handling

mod args;
mod deploy;

pub use args::{Args, Command};
pub use deploy::{
    absolutize, BuildSettings, ConfigError, DeployConfig, ServiceSettings, CONFIG_FILE_NAME,
};
