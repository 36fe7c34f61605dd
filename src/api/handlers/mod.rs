pub mod authors;
pub mod books;
pub mod system;

pub use authors::*;
pub use books::*;
pub use system::*;

use crate::core::config::SecurityConfig;
use crate::core::error::{LibraryError, Result};
use crate::core::services::{AuthorService, BookService};
use crate::core::validation::json_type_name;
use crate::db::manager::DatabaseManager;
use crate::db::repository::{AuthorRepository, BookRepository, UserRepository};
use axum::{extract::rejection::JsonRejection, Json};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseManager>,
    pub author_service: Arc<AuthorService>,
    pub book_service: Arc<BookService>,
    pub user_repo: Arc<UserRepository>,
    pub jwt_secret: Arc<String>,
    pub token_ttl_hours: u64,
}

impl AppState {
    /// Wire repositories and services over one database
    pub fn new(db: Arc<DatabaseManager>, security: &SecurityConfig) -> Self {
        let author_repo = Arc::new(AuthorRepository::new(db.clone()));
        let book_repo = Arc::new(BookRepository::new(db.clone()));
        let user_repo = Arc::new(UserRepository::new(db.clone()));

        Self {
            author_service: Arc::new(AuthorService::new(author_repo.clone())),
            book_service: Arc::new(BookService::new(book_repo, author_repo)),
            user_repo,
            jwt_secret: Arc::new(security.jwt_secret.clone()),
            token_ttl_hours: security.token_ttl_hours,
            db,
        }
    }
}

/// Unwrap a JSON body that must be an object
pub fn json_object(body: std::result::Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>> {
    let Json(value) = body.map_err(|rejection| LibraryError::InvalidRequest(rejection.body_text()))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(LibraryError::InvalidRequest(format!(
            "Invalid data. Expected a dictionary, but got {}.",
            json_type_name(&other)
        ))),
    }
}

/// Detail-route ids that are not integers name no resource
pub fn parse_id(raw: &str, resource: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| LibraryError::NotFound(format!("{} with id {} not found", resource, raw)))
}
