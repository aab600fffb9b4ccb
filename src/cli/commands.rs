//! CLI command implementations

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use super::args::Command;
use super::config::{Config, StoreBackend};
use super::errors::{CliError, CliResult};
use super::io::write_response;
use crate::cover_assets::{CoverAssetManager, LocalBackend};
use crate::http_server::HttpServer;
use crate::inventory::InventoryService;
use crate::observability::{Event, Logger};
use crate::record_store::{JournalRecordStore, MemoryRecordStore, RecordStore};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
        Command::Audit { config } => audit(&config),
    }
}

/// Create the data directory layout. Starts nothing.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;

    if is_initialized(&config) {
        return Err(CliError::already_initialized());
    }

    let assets = config.assets_path();
    fs::create_dir_all(&assets).map_err(|e| {
        CliError::config_error(format!("Failed to create directory {:?}: {}", assets, e))
    })?;

    if config.store_backend == StoreBackend::Journal {
        JournalRecordStore::open(config.data_path())
            .map_err(|e| CliError::boot_failed(e.to_string()))?;
    }

    write_response(json!({"initialized": true, "data_dir": config.data_dir}))
}

/// Serve the HTTP API until the process is stopped
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let config = Config::load(config_path)?;
    if !is_initialized(&config) {
        return Err(CliError::not_initialized());
    }

    let inventory = build_inventory(&config)?;
    let mut http_config = config.http.clone();
    if let Some(port) = port {
        http_config.port = port;
    }
    let server = HttpServer::new(http_config, inventory);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })?;

    Logger::info(Event::ShutdownComplete.as_str(), &[]);
    Ok(())
}

/// Print an audit report; fails when any finding is present
pub fn audit(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    if !is_initialized(&config) {
        return Err(CliError::not_initialized());
    }

    let inventory = build_inventory(&config)?;
    let report = inventory
        .audit()
        .map_err(|e| CliError::audit_failed(e.to_string()))?;
    let clean = report.is_clean();

    write_response(serde_json::to_value(&report)?)?;

    if clean {
        Ok(())
    } else {
        Err(CliError::audit_failed(format!(
            "{} undecodable record(s), {} duplicate active borrow(s)",
            report.undecodable.len(),
            report.duplicate_borrows.len()
        )))
    }
}

/// Open the configured store and cover backend
pub fn build_inventory(config: &Config) -> CliResult<InventoryService> {
    Logger::info(
        Event::ConfigLoaded.as_str(),
        &[("data_dir", config.data_dir.as_str())],
    );

    let store: Arc<dyn RecordStore> = match config.store_backend {
        StoreBackend::Journal => Arc::new(
            JournalRecordStore::open(config.data_path())
                .map_err(|e| CliError::boot_failed(e.to_string()))?,
        ),
        StoreBackend::Memory => Arc::new(MemoryRecordStore::new()),
    };
    Logger::info(
        Event::StoreOpened.as_str(),
        &[("backend", format!("{:?}", config.store_backend).to_lowercase().as_str())],
    );

    let covers = CoverAssetManager::new(
        Arc::new(LocalBackend::new(config.assets_path())),
        config.cover_config(),
    );
    Ok(InventoryService::new(store, covers, config.inventory_config()))
}

fn is_initialized(config: &Config) -> bool {
    config.assets_path().is_dir()
}
