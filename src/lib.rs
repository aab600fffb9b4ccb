//! libris - catalog and lending tracker for physical books
//!
//! Layers, leaf first:
//!
//! - [`record_store`]: key-value persistence with versioned sparse updates
//! - [`cover_assets`]: blob storage for cover images
//! - [`catalog`]: the book aggregate and its pure rules
//! - [`inventory`]: the service every caller goes through
//! - [`http_server`] and [`cli`]: outer surfaces
//! - [`observability`]: structured logs and counters

pub mod catalog;
pub mod cli;
pub mod cover_assets;
pub mod http_server;
pub mod inventory;
pub mod observability;
pub mod record_store;
