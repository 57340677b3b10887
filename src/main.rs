//! synk-deploy CLI

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use synk_deploy::build::BuildOrchestrator;
use synk_deploy::clock::SystemClock;
use synk_deploy::config::{Args, Command, DeployConfig};
use synk_deploy::privilege::SystemPrivilege;
use synk_deploy::process::SystemRunner;
use synk_deploy::service::{Nssm, ServiceInstaller, ServiceUninstaller, StopWait};
use synk_deploy::DeployError;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<DeployError>()
            .map(DeployError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args)?;

    if let Command::Config { write } = &args.command {
        return cmd_config(write.as_deref());
    }

    let config = load_config(args.config.as_deref())?;
    config.validate()?;

    match args.command {
        Command::Build => cmd_build(&config),
        Command::Install => cmd_install(&config),
        Command::Uninstall => cmd_uninstall(&config),
        Command::Status => cmd_status(&config),
        Command::Config { .. } => Ok(()),
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let level = args.log_level();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if let Some(log_file) = &args.log {
        let file = std::fs::File::create(log_file)?;
        subscriber.with_writer(file).with_ansi(false).init();
    } else {
        subscriber.with_writer(std::io::stderr).init();
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<DeployConfig> {
    let config = match path {
        Some(path) => DeployConfig::load(path)?,
        None => DeployConfig::load_default()?,
    };
    debug!("Configuration: {:?}", config);
    Ok(config)
}

/// Clean and package the application
fn cmd_build(config: &DeployConfig) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let runner = SystemRunner;

    let artifact = BuildOrchestrator::new(&config.build, &cwd, &runner).run()?;
    info!("Packaged {} for {}", artifact.output_name, artifact.platform);
    Ok(())
}

/// Register, configure and start the service
fn cmd_install(config: &DeployConfig) -> Result<()> {
    let install_dir = config.service.resolve_install_dir()?;
    let nssm_path = config.service.nssm_path(&install_dir);
    let descriptor = config.service.descriptor(&install_dir);
    let runner = SystemRunner;
    let privilege = SystemPrivilege;

    println!("Installing service '{}'...", descriptor.name);
    ServiceInstaller::new(descriptor, &nssm_path, &runner, &privilege).install()?;
    Ok(())
}

/// Stop and remove the service
fn cmd_uninstall(config: &DeployConfig) -> Result<()> {
    let install_dir = config.service.resolve_install_dir()?;
    let nssm_path = config.service.nssm_path(&install_dir);
    let runner = SystemRunner;
    let privilege = SystemPrivilege;
    let clock = SystemClock;

    let outcome =
        ServiceUninstaller::new(&config.service.name, &nssm_path, &runner, &privilege, &clock)
            .with_wait(StopWait::from(&config.service))
            .uninstall()?;
    println!("{}", outcome);
    Ok(())
}

/// Show the current service state
fn cmd_status(config: &DeployConfig) -> Result<()> {
    let install_dir = config.service.resolve_install_dir()?;
    let runner = SystemRunner;

    let nssm = Nssm::locate(config.service.nssm_path(&install_dir), &runner)?;
    let state = nssm.status(&config.service.name)?;
    println!("{}: {}", config.service.name, state);
    Ok(())
}

/// Print or write a sample configuration file
fn cmd_config(write: Option<&Path>) -> Result<()> {
    match write {
        Some(path) => {
            DeployConfig::write_sample(path)?;
            println!("Wrote sample configuration to {}", path.display());
        }
        None => print!("{}", DeployConfig::sample_config()),
    }
    Ok(())
}
