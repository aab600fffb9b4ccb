//! # HTTP Server
//!
//! Combines the book, asset and observability routers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::book_routes::{book_routes, LibraryState};
use super::config::HttpServerConfig;
use super::observability_routes::{health_routes, observability_routes};
use crate::inventory::InventoryService;
use crate::observability::{Event, Logger};

/// Room for multipart framing and text parts on top of the cover itself
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// HTTP server for the catalog API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, inventory: InventoryService) -> Self {
        let router = Self::build_router(&config, inventory);
        Self { config, router }
    }

    fn build_router(config: &HttpServerConfig, inventory: InventoryService) -> Router {
        let body_limit = usize::try_from(inventory.covers().config().max_size)
            .unwrap_or(usize::MAX)
            .saturating_add(FORM_OVERHEAD_BYTES);
        let state = Arc::new(LibraryState::new(inventory));

        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(health_routes())
            .merge(book_routes(state.clone()))
            .nest("/observability", observability_routes(state))
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(cors)
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the process is stopped
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        Logger::info(Event::Serving.as_str(), &[("addr", addr.to_string().as_str())]);
        axum::serve(listener, self.router).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover_assets::{CoverAssetManager, CoverConfig, LocalBackend};
    use crate::inventory::InventoryConfig;
    use crate::record_store::MemoryRecordStore;
    use tempfile::TempDir;

    fn inventory(temp: &TempDir) -> InventoryService {
        let covers = CoverAssetManager::new(
            Arc::new(LocalBackend::new(temp.path().to_path_buf())),
            CoverConfig::default(),
        );
        InventoryService::new(
            Arc::new(MemoryRecordStore::new()),
            covers,
            InventoryConfig::default(),
        )
    }

    #[test]
    fn test_server_with_custom_port() {
        let temp = TempDir::new().unwrap();
        let server = HttpServer::new(HttpServerConfig::with_port(9090), inventory(&temp));
        assert_eq!(server.socket_addr(), "0.0.0.0:9090");
    }

    #[test]
    fn test_router_builds_with_origins() {
        let temp = TempDir::new().unwrap();
        let config = HttpServerConfig {
            cors_origins: vec!["http://localhost:5173".into()],
            ..Default::default()
        };
        let _router = HttpServer::new(config, inventory(&temp)).router();
    }
}
