pub mod cli;
pub mod core;

use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

/// Commands that operate on a loaded configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Tiers,
    Compare { json: bool },
    Simulate,
}

pub fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Fee calculator starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Tiers => cli::tiers::run(&config),
        AppCommand::Compare { json } => cli::compare::run(&config, json),
        AppCommand::Simulate => cli::simulate::run(&config),
    }
}
