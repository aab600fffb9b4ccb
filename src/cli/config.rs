//! Configuration file
//!
//! JSON, loaded once at startup. Only `data_dir` is required.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::cover_assets::CoverConfig;
use crate::http_server::HttpServerConfig;
use crate::inventory::InventoryConfig;

/// Directory under `data_dir` holding cover objects
pub const ASSETS_DIR: &str = "assets";

/// Longest accepted loan period, ten years
pub const MAX_LOAN_PERIOD_DAYS: u32 = 3650;

/// Record store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Append-only journal under `data_dir`
    Journal,
    /// Process memory; lost on exit
    Memory,
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::Journal
    }
}

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    #[serde(default)]
    pub store_backend: StoreBackend,

    /// Base URL under which covers are served
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    #[serde(default = "default_loan_period_days")]
    pub loan_period_days: u32,

    /// Extra attempts after a version conflict on borrow/return
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,

    #[serde(default = "default_max_cover_bytes")]
    pub max_cover_bytes: u64,

    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_public_base_url() -> String {
    "http://localhost:8080/assets".to_string()
}
fn default_loan_period_days() -> u32 {
    14
}
fn default_max_conflict_retries() -> u32 {
    3
}
fn default_max_cover_bytes() -> u64 {
    5 * 1024 * 1024
} // 5MiB

impl Config {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if self.loan_period_days == 0 || self.loan_period_days > MAX_LOAN_PERIOD_DAYS {
            return Err(CliError::config_error(format!(
                "loan_period_days must be between 1 and {}",
                MAX_LOAN_PERIOD_DAYS
            )));
        }

        if self.max_cover_bytes == 0 {
            return Err(CliError::config_error("max_cover_bytes must be > 0"));
        }

        if !(self.public_base_url.starts_with("http://")
            || self.public_base_url.starts_with("https://"))
        {
            return Err(CliError::config_error(format!(
                "Invalid public_base_url: '{}'. Must start with http:// or https://",
                self.public_base_url
            )));
        }

        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn assets_path(&self) -> PathBuf {
        self.data_path().join(ASSETS_DIR)
    }

    pub fn inventory_config(&self) -> InventoryConfig {
        InventoryConfig {
            loan_period: Duration::days(i64::from(self.loan_period_days)),
            max_conflict_retries: self.max_conflict_retries,
        }
    }

    pub fn cover_config(&self) -> CoverConfig {
        CoverConfig {
            public_base_url: self.public_base_url.clone(),
            max_size: self.max_cover_bytes,
            ..Default::default()
        }
    }
}
