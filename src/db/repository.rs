//! Repository pattern implementation for data access layer
//!
//! This module provides the Repository pattern for abstracting database operations.

use crate::core::error::{LibraryError, Result};
use crate::core::filter::BookFilter;
use crate::core::validation::MSG_ISBN_TAKEN;
use crate::db::manager::DatabaseManager;
use crate::db::models::{Author, Book, BookWithAuthor, NewAuthor, NewBook, User};
use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row};
use std::sync::Arc;

/// Generic repository trait for CRUD operations on integer-keyed entities
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Fields needed to create an entity before it has an id
    type Draft: Send + Sync;

    /// Find an entity by its ID
    async fn find_by_id(&self, id: i64) -> Result<Option<T>>;

    /// Find all entities
    async fn find_all(&self) -> Result<Vec<T>>;

    /// Create a new entity and return it with its assigned id
    async fn create(&self, draft: &Self::Draft) -> Result<T>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> Result<()>;

    /// Delete an entity by its ID, returning whether a row was removed
    async fn delete(&self, id: i64) -> Result<bool>;
}

const AUTHOR_COLUMNS: &str = "a.id, a.name, a.bio, \
     (SELECT COUNT(*) FROM books c WHERE c.author_id = a.id)";

const BOOK_COLUMNS: &str = "b.id, b.title, b.author_id, b.published_date, b.isbn, b.genre";

/// Read an author starting at column `offset`
fn author_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        bio: row.get(offset + 2)?,
        book_count: row.get(offset + 3)?,
    })
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author_id: row.get(2)?,
        published_date: row.get(3)?,
        isbn: row.get(4)?,
        genre: row.get(5)?,
    })
}

fn book_with_author_from_row(row: &Row<'_>) -> rusqlite::Result<BookWithAuthor> {
    Ok(BookWithAuthor {
        book: book_from_row(row)?,
        author: author_from_row(row, 6)?,
    })
}

/// Translate constraint failures on book writes into field errors
fn map_book_write_error(err: rusqlite::Error, author_id: i64) -> LibraryError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.code == rusqlite::ErrorCode::ConstraintViolation {
            if message.contains("books.isbn") {
                return LibraryError::field("isbn", MSG_ISBN_TAKEN);
            }
            if message.contains("FOREIGN KEY") {
                return LibraryError::field(
                    "author_id",
                    format!("Invalid pk \"{}\" - object does not exist.", author_id),
                );
            }
        }
    }
    LibraryError::DatabaseError(err)
}

/// Repository for Author entities
pub struct AuthorRepository {
    db: Arc<DatabaseManager>,
}

impl AuthorRepository {
    /// Create a new AuthorRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Check whether an author with this id exists
    pub async fn exists(&self, id: i64) -> Result<bool> {
        self.db
            .execute(move |conn| {
                conn.query_row("SELECT EXISTS(SELECT 1 FROM authors WHERE id = ?)", [id], |row| {
                    row.get(0)
                })
                .map_err(LibraryError::DatabaseError)
            })
            .await
    }
}

#[async_trait]
impl Repository<Author> for AuthorRepository {
    type Draft = NewAuthor;

    async fn find_by_id(&self, id: i64) -> Result<Option<Author>> {
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM authors a WHERE a.id = ?", AUTHOR_COLUMNS),
                    [id],
                    |row| author_from_row(row, 0),
                )
                .optional()
                .map_err(LibraryError::DatabaseError)
            })
            .await
    }

    async fn find_all(&self) -> Result<Vec<Author>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn
                    .prepare(&format!("SELECT {} FROM authors a ORDER BY a.id", AUTHOR_COLUMNS))
                    .map_err(LibraryError::DatabaseError)?;

                let authors = stmt
                    .query_map([], |row| author_from_row(row, 0))
                    .map_err(LibraryError::DatabaseError)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(LibraryError::DatabaseError)?;

                Ok(authors)
            })
            .await
    }

    async fn create(&self, author: &NewAuthor) -> Result<Author> {
        let author = author.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO authors (name, bio) VALUES (?, ?)",
                    rusqlite::params![&author.name, &author.bio],
                )
                .map_err(LibraryError::DatabaseError)?;

                Ok(Author {
                    id: conn.last_insert_rowid(),
                    name: author.name,
                    bio: author.bio,
                    book_count: 0,
                })
            })
            .await
    }

    async fn update(&self, author: &Author) -> Result<()> {
        let author = author.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "UPDATE authors SET name = ?, bio = ? WHERE id = ?",
                    rusqlite::params![&author.name, &author.bio, author.id],
                )
                .map_err(LibraryError::DatabaseError)?;
                Ok(())
            })
            .await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        self.db
            .execute(move |conn| {
                let removed = conn
                    .execute("DELETE FROM authors WHERE id = ?", [id])
                    .map_err(LibraryError::DatabaseError)?;
                Ok(removed > 0)
            })
            .await
    }
}

/// Repository for Book entities
pub struct BookRepository {
    db: Arc<DatabaseManager>,
}

impl BookRepository {
    /// Create a new BookRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find a book together with its author
    pub async fn find_with_author(&self, id: i64) -> Result<Option<BookWithAuthor>> {
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!(
                        "SELECT {}, {} FROM books b JOIN authors a ON a.id = b.author_id WHERE b.id = ?",
                        BOOK_COLUMNS, AUTHOR_COLUMNS
                    ),
                    [id],
                    book_with_author_from_row,
                )
                .optional()
                .map_err(LibraryError::DatabaseError)
            })
            .await
    }

    /// Find books matching a list filter, each with its author
    pub async fn find_with_filter(&self, filter: &BookFilter) -> Result<Vec<BookWithAuthor>> {
        let (tail, params) = filter.to_sql();
        self.db
            .execute(move |conn| {
                let query = format!(
                    "SELECT {}, {} FROM books b JOIN authors a ON a.id = b.author_id{}",
                    BOOK_COLUMNS, AUTHOR_COLUMNS, tail
                );
                let mut stmt = conn.prepare(&query).map_err(LibraryError::DatabaseError)?;

                let books = stmt
                    .query_map(
                        rusqlite::params_from_iter(params.iter()),
                        book_with_author_from_row,
                    )
                    .map_err(LibraryError::DatabaseError)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(LibraryError::DatabaseError)?;

                Ok(books)
            })
            .await
    }

    /// Check whether an ISBN is used by a book other than `exclude_id`
    pub async fn isbn_in_use(&self, isbn: &str, exclude_id: Option<i64>) -> Result<bool> {
        let isbn = isbn.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = ?1 AND (?2 IS NULL OR id <> ?2))",
                    rusqlite::params![&isbn, exclude_id],
                    |row| row.get(0),
                )
                .map_err(LibraryError::DatabaseError)
            })
            .await
    }
}

#[async_trait]
impl Repository<Book> for BookRepository {
    type Draft = NewBook;

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>> {
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM books b WHERE b.id = ?", BOOK_COLUMNS),
                    [id],
                    book_from_row,
                )
                .optional()
                .map_err(LibraryError::DatabaseError)
            })
            .await
    }

    async fn find_all(&self) -> Result<Vec<Book>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn
                    .prepare(&format!("SELECT {} FROM books b ORDER BY b.id", BOOK_COLUMNS))
                    .map_err(LibraryError::DatabaseError)?;

                let books = stmt
                    .query_map([], book_from_row)
                    .map_err(LibraryError::DatabaseError)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(LibraryError::DatabaseError)?;

                Ok(books)
            })
            .await
    }

    async fn create(&self, book: &NewBook) -> Result<Book> {
        let book = book.clone();
        self.db
            .transaction(move |tx| {
                tx.execute(
                    "INSERT INTO books (title, author_id, published_date, isbn, genre) \
                     VALUES (?, ?, ?, ?, ?)",
                    rusqlite::params![
                        &book.title,
                        book.author_id,
                        book.published_date,
                        &book.isbn,
                        &book.genre,
                    ],
                )
                .map_err(|e| map_book_write_error(e, book.author_id))?;

                tx.query_row(
                    &format!("SELECT {} FROM books b WHERE b.id = ?", BOOK_COLUMNS),
                    [tx.last_insert_rowid()],
                    book_from_row,
                )
                .map_err(LibraryError::DatabaseError)
            })
            .await
    }

    async fn update(&self, book: &Book) -> Result<()> {
        let book = book.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "UPDATE books SET title = ?, author_id = ?, published_date = ?, isbn = ?, \
                     genre = ? WHERE id = ?",
                    rusqlite::params![
                        &book.title,
                        book.author_id,
                        book.published_date,
                        &book.isbn,
                        &book.genre,
                        book.id,
                    ],
                )
                .map_err(|e| map_book_write_error(e, book.author_id))?;
                Ok(())
            })
            .await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        self.db
            .execute(move |conn| {
                let removed = conn
                    .execute("DELETE FROM books WHERE id = ?", [id])
                    .map_err(LibraryError::DatabaseError)?;
                Ok(removed > 0)
            })
            .await
    }
}

/// Repository for User entities (UUID keyed, so outside the generic trait)
pub struct UserRepository {
    db: Arc<DatabaseManager>,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    "SELECT id, username, password_hash, created_at FROM users WHERE id = ?",
                    [&id],
                    user_from_row,
                )
                .optional()
                .map_err(LibraryError::DatabaseError)
            })
            .await
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    "SELECT id, username, password_hash, created_at FROM users WHERE username = ?",
                    [&username],
                    user_from_row,
                )
                .optional()
                .map_err(LibraryError::DatabaseError)
            })
            .await
    }

    pub async fn create(&self, user: &User) -> Result<()> {
        let user = user.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO users (id, username, password_hash, created_at) \
                     VALUES (?, ?, ?, ?)",
                    rusqlite::params![
                        &user.id,
                        &user.username,
                        &user.password_hash,
                        &user.created_at,
                    ],
                )
                .map_err(LibraryError::DatabaseError)?;
                Ok(())
            })
            .await
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: row.get(3)?,
    })
}
