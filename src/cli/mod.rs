//! Command-line interface: argument parsing, configuration merging and
//! command handlers.

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::{execute_command, run_command};
pub use parser::{Cli, Commands, EntityKind, Environment};

use crate::config::{ConfigError, Settings};
use crate::logger::init_logger;

/// Loads the configuration the CLI points at and applies CLI overrides.
pub fn load_and_merge_config(cli: &Cli) -> Result<Settings, ConfigError> {
    ConfigurationMerger::from_cli(cli)?.merge_cli_args(cli)
}

pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<()> {
    let config = settings.logger.to_logger_config()?;
    init_logger(&config)?;
    Ok(())
}
