/// Shared helpers for running external tools
pub mod command;
