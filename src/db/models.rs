//! Database models
//!
//! Data structures representing database tables

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Author record in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub bio: String,
    /// Live count of books referencing this author, computed by every read
    pub book_count: i64,
}

/// Author fields before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthor {
    pub name: String,
    pub bio: String,
}

/// Book record in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author_id: i64,
    pub published_date: NaiveDate,
    pub isbn: String,
    pub genre: Option<String>,
}

/// Book fields before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author_id: i64,
    pub published_date: NaiveDate,
    pub isbn: String,
    pub genre: Option<String>,
}

/// A book joined with its author, as read for responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookWithAuthor {
    pub book: Book,
    pub author: Author,
}

/// User record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}
