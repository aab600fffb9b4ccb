//! CLI module for libris
//!
//! - init: Create the data directory layout
//! - serve: Open the store and serve the HTTP API
//! - audit: Report records that break lending invariants

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{audit, build_inventory, init, run, run_command, serve};
pub use config::{Config, StoreBackend, ASSETS_DIR};
pub use errors::{CliError, CliErrorCode, CliResult};
