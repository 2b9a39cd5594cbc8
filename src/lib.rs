//! Songbook server library
//!
//! Song catalog with duplicate detection, faceted search and reviews, served
//! over a JSON HTTP API. Modules are exposed for the binary and for tests.

pub mod catalog;
pub mod catalog_store;
pub mod config;
pub mod normalize;
pub mod search;
pub mod server;
pub mod short_id;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use catalog::CatalogManager;
pub use catalog_store::{CatalogStore, SqliteCatalogStore};
pub use search::SearchEngine;
pub use server::{run_server, RequestsLoggingLevel};
