//! Dispatches a parsed command to its handler and prints the result.

use super::handlers::{CheckCommandHandler, ItemCommandHandler, ListCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::Settings;
use crate::error::AppResult;
use crate::state::AppState;

pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    let output = run_command(cli, settings).await?;
    println!("{output}");
    Ok(())
}

/// Runs the command and returns what would be printed.
pub async fn run_command(cli: &Cli, settings: Settings) -> AppResult<String> {
    match &cli.command {
        Commands::Check { show } => CheckCommandHandler::new(settings).execute(*show),
        Commands::List(args) => {
            let state = AppState::from_settings(settings)?;
            ListCommandHandler::new(state).execute(args).await
        }
        Commands::Item(args) => {
            let state = AppState::from_settings(settings)?;
            ItemCommandHandler::new(state).execute(args).await
        }
    }
}
