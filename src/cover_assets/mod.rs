//! # Cover Asset Module
//!
//! Blob storage for book cover images. Objects are addressed by key and
//! exposed through a public base URL.

pub mod backend;
pub mod errors;
pub mod local;
pub mod manager;

pub use backend::BlobBackend;
pub use errors::{CoverError, CoverResult};
pub use local::LocalBackend;
pub use manager::{content_type_for, CoverAssetManager, CoverConfig};
