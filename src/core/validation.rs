//! Request validation for author and book writes
//!
//! Payloads arrive as raw JSON objects and are checked field by field so that
//! every violation is reported in one response. Checks that need the store
//! (author existence, ISBN uniqueness) are added by the services on top of the
//! same [`FieldErrors`] before anything is written.

use crate::core::error::LibraryError;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_NULL: &str = "This field may not be null.";
pub const MSG_BLANK: &str = "This field may not be blank.";
pub const MSG_NOT_STRING: &str = "Not a valid string.";
pub const MSG_DATE_FORMAT: &str =
    "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";
pub const MSG_ISBN_LENGTH: &str = "ISBN must be exactly 13 characters";
pub const MSG_FUTURE_DATE: &str = "Published date cannot be in future";
pub const MSG_ISBN_TAKEN: &str = "book with this isbn already exists.";

pub const ISBN_LENGTH: usize = 13;
pub const AUTHOR_NAME_MAX: usize = 100;
pub const BOOK_TITLE_MAX: usize = 255;
pub const BOOK_GENRE_MAX: usize = 100;

/// Wire format for `published_date`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Per-field validation messages, serialized as `{"field": ["message", ...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for a field, if any
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Fail with a validation error if anything was recorded
    pub fn into_result(self) -> Result<(), LibraryError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(LibraryError::ValidationError(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{}: {}", field, messages.join(" "))?;
        }
        Ok(())
    }
}

/// How strictly a payload is checked for missing fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// POST: all required fields must be present
    Create,
    /// PUT: same as create, applied over an existing row
    Replace,
    /// PATCH: only supplied fields are validated
    Partial,
}

impl WriteMode {
    pub fn requires_all(self) -> bool {
        !matches!(self, WriteMode::Partial)
    }
}

/// ISBN rule: exactly 13 characters, whatever they are
pub fn validate_isbn(isbn: &str) -> Result<(), &'static str> {
    if isbn.chars().count() == ISBN_LENGTH {
        Ok(())
    } else {
        Err(MSG_ISBN_LENGTH)
    }
}

/// Publication dates may be today or earlier
pub fn validate_published_date(date: NaiveDate, today: NaiveDate) -> Result<(), &'static str> {
    if date > today {
        Err(MSG_FUTURE_DATE)
    } else {
        Ok(())
    }
}

/// Parse `YYYY-MM-DD`: a four-digit year from 0001, then one- or two-digit
/// month and day
pub fn parse_published_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.split('-');
    let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let digits = |part: &str, min: usize, max: usize| {
        (min..=max).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(year, 4, 4) || !digits(month, 1, 2) || !digits(day, 1, 2) {
        return None;
    }

    let year: i32 = year.parse().ok()?;
    if year < 1 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

pub fn max_length_message(max: usize) -> String {
    format!("Ensure this field has no more than {} characters.", max)
}

/// Type names reported back in type errors
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[derive(Clone, Copy)]
struct TextRule {
    required: bool,
    allow_blank: bool,
    allow_null: bool,
    max_length: Option<usize>,
}

/// Reads fields out of a payload, recording every violation it sees
struct FieldReader<'a> {
    payload: &'a Map<String, Value>,
    mode: WriteMode,
    errors: &'a mut FieldErrors,
}

impl<'a> FieldReader<'a> {
    fn new(payload: &'a Map<String, Value>, mode: WriteMode, errors: &'a mut FieldErrors) -> Self {
        Self { payload, mode, errors }
    }

    /// Returns the raw value, flagging missing required fields
    fn raw(&mut self, field: &str, required: bool) -> Option<&'a Value> {
        match self.payload.get(field) {
            Some(value) => Some(value),
            None => {
                if required && self.mode.requires_all() {
                    self.errors.add(field, MSG_REQUIRED);
                }
                None
            }
        }
    }

    /// `None` = absent or invalid, `Some(None)` = explicit null (when allowed).
    /// Strings are trimmed before the blank and length checks.
    fn text(&mut self, field: &str, rule: TextRule) -> Option<Option<String>> {
        let value = self.raw(field, rule.required)?;

        let text = match value {
            Value::Null if rule.allow_null => return Some(None),
            Value::Null => {
                self.errors.add(field, MSG_NULL);
                return None;
            }
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => {
                self.errors.add(field, MSG_NOT_STRING);
                return None;
            }
        };

        let mut valid = true;
        if !rule.allow_blank && text.is_empty() {
            self.errors.add(field, MSG_BLANK);
            valid = false;
        }
        if let Some(max) = rule.max_length {
            if text.chars().count() > max {
                self.errors.add(field, max_length_message(max));
                valid = false;
            }
        }

        valid.then_some(Some(text))
    }

    fn required_text(&mut self, field: &str, max_length: Option<usize>) -> Option<String> {
        self.text(
            field,
            TextRule {
                required: true,
                allow_blank: false,
                allow_null: false,
                max_length,
            },
        )
        .flatten()
    }

    fn date(&mut self, field: &str) -> Option<NaiveDate> {
        match self.raw(field, true)? {
            Value::Null => {
                self.errors.add(field, MSG_NULL);
                None
            }
            Value::String(s) => {
                let date = parse_published_date(s);
                if date.is_none() {
                    self.errors.add(field, MSG_DATE_FORMAT);
                }
                date
            }
            _ => {
                self.errors.add(field, MSG_DATE_FORMAT);
                None
            }
        }
    }

    /// Primary key reference given as an integer or a numeric string
    fn primary_key(&mut self, field: &str) -> Option<i64> {
        let value = self.raw(field, true)?;
        let parsed = match value {
            Value::Null => {
                self.errors.add(field, MSG_NULL);
                return None;
            }
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };

        if parsed.is_none() {
            let type_name = match value {
                Value::Number(n) if n.is_u64() => "int",
                other => json_type_name(other),
            };
            self.errors.add(
                field,
                format!("Incorrect type. Expected pk value, received {}.", type_name),
            );
        }
        parsed
    }
}

/// Validated author fields; `None` means "not supplied"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorChanges {
    pub name: Option<String>,
    pub bio: Option<String>,
}

impl AuthorChanges {
    pub fn parse(payload: &Map<String, Value>, mode: WriteMode, errors: &mut FieldErrors) -> Self {
        let mut reader = FieldReader::new(payload, mode, errors);

        let name = reader.required_text("name", Some(AUTHOR_NAME_MAX));
        let bio = reader
            .text(
                "bio",
                TextRule {
                    required: false,
                    allow_blank: true,
                    allow_null: false,
                    max_length: None,
                },
            )
            .flatten();

        Self { name, bio }
    }
}

/// Validated book fields; `None` means "not supplied"
///
/// `genre` is doubly optional: `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author_id: Option<i64>,
    pub published_date: Option<NaiveDate>,
    pub isbn: Option<String>,
    pub genre: Option<Option<String>>,
}

impl BookChanges {
    /// Run every payload-only rule. `published_year` and other read-only keys
    /// are never consulted.
    pub fn parse(
        payload: &Map<String, Value>,
        mode: WriteMode,
        today: NaiveDate,
        errors: &mut FieldErrors,
    ) -> Self {
        let mut reader = FieldReader::new(payload, mode, errors);

        let title = reader.required_text("title", Some(BOOK_TITLE_MAX));
        let author_id = reader.primary_key("author_id");

        let published_date = reader.date("published_date").and_then(|date| {
            match validate_published_date(date, today) {
                Ok(()) => Some(date),
                Err(message) => {
                    reader.errors.add("published_date", message);
                    None
                }
            }
        });

        let isbn = reader
            .required_text("isbn", None)
            .and_then(|isbn| match validate_isbn(&isbn) {
                Ok(()) => Some(isbn),
                Err(message) => {
                    reader.errors.add("isbn", message);
                    None
                }
            });

        let genre = reader.text(
            "genre",
            TextRule {
                required: false,
                allow_blank: true,
                allow_null: true,
                max_length: Some(BOOK_GENRE_MAX),
            },
        );

        Self {
            title,
            author_id,
            published_date,
            isbn,
            genre,
        }
    }
}
