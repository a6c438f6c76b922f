/// CLI argument parsing and command handling - Gateway
mod args;
mod commands;

pub use args::{Cli, Commands, OutputFormat, RideCommands, RoleArg};
pub use commands::{handle_command, handle_local_command, show_version};
