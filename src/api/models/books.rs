use super::authors::AuthorResponse;
use crate::core::validation::DATE_FORMAT;
use crate::db::models::BookWithAuthor;
use chrono::Datelike;
use serde::Serialize;

/// Book as returned by the API
///
/// The author is nested; `author_id` is accepted on input only.
#[derive(Debug, Clone, Serialize)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub author: AuthorResponse,
    pub published_date: String,
    pub published_year: i32,
    pub isbn: String,
    pub genre: Option<String>,
}

impl From<BookWithAuthor> for BookResponse {
    fn from(row: BookWithAuthor) -> Self {
        let BookWithAuthor { book, author } = row;
        Self {
            id: book.id,
            title: book.title,
            author: AuthorResponse::from(author),
            published_date: book.published_date.format(DATE_FORMAT).to_string(),
            published_year: book.published_date.year(),
            isbn: book.isbn,
            genre: book.genre,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Author, Book};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn row(published_date: NaiveDate) -> BookWithAuthor {
        BookWithAuthor {
            book: Book {
                id: 3,
                title: "T".to_string(),
                author_id: 1,
                published_date,
                isbn: "1234567890123".to_string(),
                genre: None,
            },
            author: Author {
                id: 1,
                name: "A. Author".to_string(),
                bio: String::new(),
                book_count: 1,
            },
        }
    }

    #[test]
    fn test_book_response_shape() {
        let book = row(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());

        let value = serde_json::to_value(BookResponse::from(book)).unwrap();
        assert_eq!(value["published_date"], "2020-01-01");
        assert_eq!(value["published_year"], 2020);
        assert_eq!(value["author"]["book_count"], 1);
        assert!(value["genre"].is_null());
        assert!(value.get("author_id").is_none());
    }

    proptest! {
        #[test]
        fn prop_published_year_matches_date(year in 1i32..=9999, ordinal in 1u32..=365) {
            let date = NaiveDate::from_yo_opt(year, ordinal).unwrap();
            let response = BookResponse::from(row(date));

            prop_assert_eq!(response.published_year, year);
            let year_prefix = format!("{:04}-", year);
            prop_assert!(response.published_date.starts_with(&year_prefix));
        }
    }
}
