//! Book list filtering
//!
//! Turns list query parameters into a typed [`BookFilter`], and a filter into
//! the `WHERE` / `ORDER BY` fragments the book repository runs.

use crate::core::error::{LibraryError, Result};
use std::collections::HashMap;

pub const MSG_INVALID_INTEGER: &str = "A valid integer is required.";

/// Columns a caller may order by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Title,
    PublishedDate,
    Genre,
}

impl OrderField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "title" => Some(OrderField::Title),
            "published_date" => Some(OrderField::PublishedDate),
            "genre" => Some(OrderField::Genre),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            OrderField::Title => "b.title",
            OrderField::PublishedDate => "b.published_date",
            OrderField::Genre => "b.genre",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: OrderField,
    pub descending: bool,
}

/// Restrictions for a book listing; empty means "all books"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub genre: Option<String>,
    pub author_id: Option<i64>,
    pub search_terms: Vec<String>,
    pub ordering: Vec<OrderBy>,
}

impl BookFilter {
    /// Build a filter from raw query parameters.
    ///
    /// Unknown parameters, unknown ordering fields and empty `genre` or
    /// `author_id` values are ignored; a non-integer `author_id` is rejected.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let present = |name: &str| params.get(name).filter(|v| !v.trim().is_empty());

        let author_id = match present("author_id") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<i64>()
                    .map_err(|_| LibraryError::field("author_id", MSG_INVALID_INTEGER))?,
            ),
            None => None,
        };

        let search_terms = params
            .get("search")
            .map(|s| split_terms(s))
            .unwrap_or_default();

        let ordering = params
            .get("ordering")
            .map(|s| parse_ordering(s))
            .unwrap_or_default();

        Ok(Self {
            genre: present("genre").cloned(),
            author_id,
            search_terms,
            ordering,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.genre.is_none()
            && self.author_id.is_none()
            && self.search_terms.is_empty()
            && self.ordering.is_empty()
    }

    /// Render the `WHERE ... ORDER BY ...` tail and its bound parameters.
    ///
    /// Columns are referenced through the `b` alias for `books`.
    pub fn to_sql(&self) -> (String, Vec<String>) {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(genre) = &self.genre {
            conditions.push("b.genre = ?".to_string());
            params.push(genre.clone());
        }

        if let Some(author_id) = self.author_id {
            conditions.push("b.author_id = ?".to_string());
            params.push(author_id.to_string());
        }

        for term in &self.search_terms {
            conditions.push(
                "(b.title LIKE ? ESCAPE '\\' OR b.genre LIKE ? ESCAPE '\\')".to_string(),
            );
            let pattern = format!("%{}%", escape_like(term));
            params.push(pattern.clone());
            params.push(pattern);
        }

        let mut sql = String::new();
        if !conditions.is_empty() {
            sql += " WHERE ";
            sql += &conditions.join(" AND ");
        }

        let mut order: Vec<String> = self
            .ordering
            .iter()
            .map(|o| {
                format!(
                    "{} {}",
                    o.field.column(),
                    if o.descending { "DESC" } else { "ASC" }
                )
            })
            .collect();
        order.push("b.id ASC".to_string());
        sql += " ORDER BY ";
        sql += &order.join(", ");

        (sql, params)
    }
}

/// Search terms are separated by whitespace or commas
fn split_terms(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_ordering(raw: &str) -> Vec<OrderBy> {
    raw.split(',')
        .map(str::trim)
        .filter_map(|term| {
            let (descending, name) = match term.strip_prefix('-') {
                Some(name) => (true, name),
                None => (false, term),
            };
            OrderField::parse(name).map(|field| OrderBy { field, descending })
        })
        .collect()
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
