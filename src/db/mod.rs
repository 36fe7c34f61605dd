//! Database module
//!
//! - SQLite connection pool management
//! - Repository implementations
//! - Versioned migrations
//! - Row models

pub mod manager;
pub mod migrations;
pub mod models;
pub mod repository;

pub use manager::DatabaseManager;
pub use models::{Author, Book, BookWithAuthor, NewAuthor, NewBook, User};
pub use repository::{AuthorRepository, BookRepository, Repository, UserRepository};
