pub mod commands;

pub use commands::{AdminCommands, Cli, Commands, FilterArgs, OptionKind, OutputFormat};
