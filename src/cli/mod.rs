//! Command-line handlers for the `ledger` binary

pub mod commands;

pub use commands::{cmd_balance, cmd_demo, cmd_keygen, cmd_resolve, cmd_validate, CliResult};
