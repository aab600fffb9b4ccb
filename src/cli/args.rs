//! CLI argument definitions using clap
//!
//! Commands:
//! - libris init --config <path>
//! - libris serve --config <path> [--port <port>]
//! - libris audit --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// libris - catalog and lending tracker for physical books
#[derive(Parser, Debug)]
#[command(name = "libris")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./libris.json")]
        config: PathBuf,
    },

    /// Serve the HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./libris.json")]
        config: PathBuf,

        /// Override the configured HTTP port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Scan every stored book for broken lending invariants
    Audit {
        /// Path to configuration file
        #[arg(long, default_value = "./libris.json")]
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_port_override() {
        let cli = Cli::parse_from(["libris", "serve", "--config", "x.json", "--port", "9000"]);
        match cli.command {
            Command::Serve { config, port } => {
                assert_eq!(config, PathBuf::from("x.json"));
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::parse_from(["libris", "audit"]);
        assert!(matches!(
            cli.command,
            Command::Audit { ref config } if config == &PathBuf::from("./libris.json")
        ));
    }
}
