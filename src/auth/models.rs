//! Authentication request/response models

use crate::core::validation::{
    max_length_message, FieldErrors, MSG_BLANK, MSG_NOT_STRING, MSG_NULL, MSG_REQUIRED,
};
use crate::db::models::User;
use serde::Serialize;
use serde_json::{Map, Value};

pub const USERNAME_MAX: usize = 150;

/// Credentials posted to register and login
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Read `username` and `password`, both required non-blank strings
    pub fn parse(payload: &Map<String, Value>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let username = credential_field(payload, "username", &mut errors);
        let password = credential_field(payload, "password", &mut errors);

        if let Some(name) = &username {
            if name.chars().count() > USERNAME_MAX {
                errors.add("username", max_length_message(USERNAME_MAX));
            }
        }

        match (username, password) {
            (Some(username), Some(password)) if errors.is_empty() => Ok(Self { username, password }),
            _ => Err(errors),
        }
    }
}

fn credential_field(payload: &Map<String, Value>, field: &str, errors: &mut FieldErrors) -> Option<String> {
    match payload.get(field) {
        None => errors.add(field, MSG_REQUIRED),
        Some(Value::Null) => errors.add(field, MSG_NULL),
        Some(Value::String(s)) if s.trim().is_empty() => errors.add(field, MSG_BLANK),
        Some(Value::String(s)) => return Some(s.clone()),
        Some(_) => errors.add(field, MSG_NOT_STRING),
    }
    None
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserInfo,
    pub token: String,
}

/// User info (without password)
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}
