//! Business logic services
//!
//! Services sit between the REST handlers and the repositories: they run the
//! payload validation, add the checks that need the store, and only then write.

use crate::core::error::{LibraryError, Result};
use crate::core::filter::BookFilter;
use crate::core::validation::{
    AuthorChanges, BookChanges, FieldErrors, WriteMode, MSG_ISBN_TAKEN,
};
use crate::db::models::{Author, Book, BookWithAuthor, NewAuthor, NewBook};
use crate::db::repository::{AuthorRepository, BookRepository, Repository};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Source of "today" for the publication date rule
pub type Clock = fn() -> NaiveDate;

/// Today's date in local time
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Author service for managing author business logic
pub struct AuthorService {
    author_repo: Arc<AuthorRepository>,
}

impl AuthorService {
    /// Create a new AuthorService
    pub fn new(author_repo: Arc<AuthorRepository>) -> Self {
        Self { author_repo }
    }

    pub async fn list(&self) -> Result<Vec<Author>> {
        self.author_repo.find_all().await
    }

    pub async fn get(&self, id: i64) -> Result<Author> {
        self.author_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::NotFound(format!("Author with id {} not found", id)))
    }

    /// Validate and create an author
    pub async fn create(&self, payload: &Map<String, Value>) -> Result<Author> {
        let mut errors = FieldErrors::new();
        let changes = AuthorChanges::parse(payload, WriteMode::Create, &mut errors);
        errors.into_result()?;

        let name = changes
            .name
            .ok_or_else(|| LibraryError::InvalidRequest("Author name missing".to_string()))?;
        let author = self
            .author_repo
            .create(&NewAuthor {
                name,
                bio: changes.bio.unwrap_or_default(),
            })
            .await?;

        info!(author_id = author.id, "Author created");
        Ok(author)
    }

    /// Validate and apply a full (PUT) or partial (PATCH) update
    pub async fn update(
        &self,
        id: i64,
        payload: &Map<String, Value>,
        mode: WriteMode,
    ) -> Result<Author> {
        let mut author = self.get(id).await?;

        let mut errors = FieldErrors::new();
        let changes = AuthorChanges::parse(payload, mode, &mut errors);
        errors.into_result()?;

        if let Some(name) = changes.name {
            author.name = name;
        }
        if let Some(bio) = changes.bio {
            author.bio = bio;
        }

        self.author_repo.update(&author).await?;
        info!(author_id = id, "Author updated");

        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.author_repo.delete(id).await? {
            return Err(LibraryError::NotFound(format!("Author with id {} not found", id)));
        }
        info!(author_id = id, "Author deleted");
        Ok(())
    }
}

/// Book service for managing book business logic
pub struct BookService {
    book_repo: Arc<BookRepository>,
    author_repo: Arc<AuthorRepository>,
    today: Clock,
}

impl BookService {
    /// Create a new BookService
    pub fn new(book_repo: Arc<BookRepository>, author_repo: Arc<AuthorRepository>) -> Self {
        Self {
            book_repo,
            author_repo,
            today: local_today,
        }
    }

    /// Replace the clock used for the publication date rule
    pub fn with_clock(mut self, today: Clock) -> Self {
        self.today = today;
        self
    }

    pub async fn list(&self, filter: &BookFilter) -> Result<Vec<BookWithAuthor>> {
        let books = self.book_repo.find_with_filter(filter).await?;
        debug!(filtered = !filter.is_empty(), count = books.len(), "Books listed");
        Ok(books)
    }

    pub async fn get(&self, id: i64) -> Result<BookWithAuthor> {
        self.book_repo
            .find_with_author(id)
            .await?
            .ok_or_else(|| LibraryError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Validate and create a book
    pub async fn create(&self, payload: &Map<String, Value>) -> Result<BookWithAuthor> {
        let mut errors = FieldErrors::new();
        let changes = BookChanges::parse(payload, WriteMode::Create, (self.today)(), &mut errors);
        self.check_store_rules(&changes, None, &mut errors).await?;
        errors.into_result()?;

        let draft = new_book_from(changes)?;
        let book = self.book_repo.create(&draft).await?;
        info!(book_id = book.id, author_id = book.author_id, "Book created");

        self.get(book.id).await
    }

    /// Validate and apply a full (PUT) or partial (PATCH) update
    pub async fn update(
        &self,
        id: i64,
        payload: &Map<String, Value>,
        mode: WriteMode,
    ) -> Result<BookWithAuthor> {
        let existing = self
            .book_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::NotFound(format!("Book with id {} not found", id)))?;

        let mut errors = FieldErrors::new();
        let changes = BookChanges::parse(payload, mode, (self.today)(), &mut errors);
        self.check_store_rules(&changes, Some(id), &mut errors).await?;
        errors.into_result()?;

        let book = apply_book_changes(existing, changes);
        self.book_repo.update(&book).await?;
        info!(book_id = id, author_id = book.author_id, "Book updated");

        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.book_repo.delete(id).await? {
            return Err(LibraryError::NotFound(format!("Book with id {} not found", id)));
        }
        info!(book_id = id, "Book deleted");
        Ok(())
    }

    /// Author existence and ISBN uniqueness, recorded alongside payload errors
    async fn check_store_rules(
        &self,
        changes: &BookChanges,
        book_id: Option<i64>,
        errors: &mut FieldErrors,
    ) -> Result<()> {
        if let Some(author_id) = changes.author_id {
            if !self.author_repo.exists(author_id).await? {
                errors.add(
                    "author_id",
                    format!("Invalid pk \"{}\" - object does not exist.", author_id),
                );
            }
        }

        if let Some(isbn) = &changes.isbn {
            if self.book_repo.isbn_in_use(isbn, book_id).await? {
                errors.add("isbn", MSG_ISBN_TAKEN);
            }
        }

        Ok(())
    }
}

fn new_book_from(changes: BookChanges) -> Result<NewBook> {
    match (changes.title, changes.author_id, changes.published_date, changes.isbn) {
        (Some(title), Some(author_id), Some(published_date), Some(isbn)) => Ok(NewBook {
            title,
            author_id,
            published_date,
            isbn,
            genre: changes.genre.flatten(),
        }),
        _ => Err(LibraryError::InvalidRequest(
            "Book payload is missing required fields".to_string(),
        )),
    }
}

fn apply_book_changes(mut book: Book, changes: BookChanges) -> Book {
    if let Some(title) = changes.title {
        book.title = title;
    }
    if let Some(author_id) = changes.author_id {
        book.author_id = author_id;
    }
    if let Some(published_date) = changes.published_date {
        book.published_date = published_date;
    }
    if let Some(isbn) = changes.isbn {
        book.isbn = isbn;
    }
    if let Some(genre) = changes.genre {
        book.genre = genre;
    }
    book
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::{MSG_FUTURE_DATE, MSG_ISBN_LENGTH, MSG_REQUIRED};
    use crate::db::DatabaseManager;
    use serde_json::json;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn services() -> (AuthorService, BookService) {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        let authors = Arc::new(AuthorRepository::new(db.clone()));
        let books = Arc::new(BookRepository::new(db));
        (
            AuthorService::new(authors.clone()),
            BookService::new(books, authors).with_clock(fixed_today),
        )
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn book_payload(author_id: i64, isbn: &str) -> Map<String, Value> {
        object(json!({
            "title": "T",
            "author_id": author_id,
            "published_date": "2020-01-01",
            "isbn": isbn,
            "genre": "drama",
        }))
    }

    fn field_errors(result: Result<impl std::fmt::Debug>) -> FieldErrors {
        match result {
            Err(LibraryError::ValidationError(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_book() {
        let (authors, books) = services();
        let author = authors
            .create(&object(json!({"name": "A. Author", "bio": ""})))
            .await
            .unwrap();
        assert_eq!(author.id, 1);

        let created = books.create(&book_payload(author.id, "1234567890123")).await.unwrap();
        assert_eq!(created.book.title, "T");
        assert_eq!(created.author.book_count, 1);
    }

    #[tokio::test]
    async fn test_store_and_payload_errors_reported_together() {
        let (_, books) = services();
        let mut payload = book_payload(5, "123");
        payload.insert("published_date".to_string(), json!("2024-06-16"));

        let errors = field_errors(books.create(&payload).await);
        assert_eq!(
            errors.get("author_id"),
            Some(&["Invalid pk \"5\" - object does not exist.".to_string()][..])
        );
        assert_eq!(errors.get("isbn"), Some(&[MSG_ISBN_LENGTH.to_string()][..]));
        assert_eq!(errors.get("published_date"), Some(&[MSG_FUTURE_DATE.to_string()][..]));
    }

    #[tokio::test]
    async fn test_duplicate_isbn() {
        let (authors, books) = services();
        authors.create(&object(json!({"name": "A"}))).await.unwrap();
        books.create(&book_payload(1, "1234567890123")).await.unwrap();

        let errors = field_errors(books.create(&book_payload(1, "1234567890123")).await);
        assert_eq!(errors.get("isbn"), Some(&[MSG_ISBN_TAKEN.to_string()][..]));
    }

    #[tokio::test]
    async fn test_partial_and_full_update() {
        let (authors, books) = services();
        authors.create(&object(json!({"name": "A"}))).await.unwrap();
        authors.create(&object(json!({"name": "B"}))).await.unwrap();
        let created = books.create(&book_payload(1, "1234567890123")).await.unwrap();

        // Keeping its own isbn is not a conflict
        let patched = books
            .update(
                created.book.id,
                &object(json!({"author_id": 2, "isbn": "1234567890123"})),
                WriteMode::Partial,
            )
            .await
            .unwrap();
        assert_eq!(patched.author.id, 2);
        assert_eq!(patched.book.title, "T");
        assert_eq!(authors.get(1).await.unwrap().book_count, 0);
        assert_eq!(authors.get(2).await.unwrap().book_count, 1);

        let errors = field_errors(
            books
                .update(created.book.id, &object(json!({"title": "New"})), WriteMode::Replace)
                .await,
        );
        assert_eq!(errors.get("isbn"), Some(&[MSG_REQUIRED.to_string()][..]));
        assert!(!errors.has("title"));
    }

    #[tokio::test]
    async fn test_missing_rows() {
        let (authors, books) = services();
        assert!(matches!(authors.get(9).await, Err(LibraryError::NotFound(_))));
        assert!(matches!(books.delete(9).await, Err(LibraryError::NotFound(_))));
        assert!(matches!(
            books.update(9, &Map::new(), WriteMode::Partial).await,
            Err(LibraryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_author_update() {
        let (authors, _) = services();
        authors.create(&object(json!({"name": "A", "bio": "old"}))).await.unwrap();

        let updated = authors
            .update(1, &object(json!({"bio": "new"})), WriteMode::Partial)
            .await
            .unwrap();
        assert_eq!(updated.name, "A");
        assert_eq!(updated.bio, "new");

        let errors = field_errors(authors.update(1, &object(json!({"bio": "x"})), WriteMode::Replace).await);
        assert_eq!(errors.get("name"), Some(&[MSG_REQUIRED.to_string()][..]));
    }
}
