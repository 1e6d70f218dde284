//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod batch;
pub mod collections;
pub mod config_cmd;
pub mod devices;
pub mod util;

use crate::cli::Command;
use crate::config::Settings;
use crate::error::CliError;

/// Dispatch an inventory-bound command to the appropriate handler.
pub fn dispatch(cmd: Command, settings: &Settings) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(args, settings),
        Command::Collections(args) => collections::handle(args, settings),
        Command::Batch(args) => batch::handle(args, settings),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
