//! # HTTP Server Module
//!
//! Axum surface over the inventory service.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET|POST /books` - List, create (multipart with a `cover` part)
//! - `GET|PATCH|DELETE /books/:id` - Fetch, sparse update, delete
//! - `PUT /books/:id/cover` - Replace the cover
//! - `POST /books/:id/borrow`, `POST /books/:id/return` - Lending
//! - `GET /assets/*key` - Stored cover images
//! - `GET /observability/metrics` - Counters

pub mod book_routes;
pub mod config;
pub mod errors;
pub mod observability_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use server::HttpServer;
