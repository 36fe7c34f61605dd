//! Core application layer
//!
//! - Configuration and structured logging
//! - Error type and HTTP error mapping
//! - Payload validation and list filtering
//! - Author and book services

pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod services;
pub mod validation;

pub use config::Config;
pub use error::{ErrorResponse, LibraryError, Result};
pub use filter::{BookFilter, OrderBy, OrderField};
pub use logging::Logger;
pub use services::{AuthorService, BookService};
pub use validation::{FieldErrors, WriteMode};
