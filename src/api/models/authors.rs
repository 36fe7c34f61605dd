use crate::db::models::Author;
use serde::Serialize;

/// Author as returned by the API, with its live book count
#[derive(Debug, Clone, Serialize)]
pub struct AuthorResponse {
    pub id: i64,
    pub name: String,
    pub bio: String,
    pub book_count: i64,
}

impl From<Author> for AuthorResponse {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            name: author.name,
            bio: author.bio,
            book_count: author.book_count,
        }
    }
}
