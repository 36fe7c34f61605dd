//! Library API
//!
//! A REST service for authors and their books, backed by SQLite: validated
//! CRUD, filtered and searchable book listings, and token-guarded routes.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;

pub use api::ApiServer;
pub use crate::core::{Config, LibraryError};
pub use db::DatabaseManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
