//! Authentication API handlers

use crate::api::handlers::{json_object, AppState};
use crate::auth::jwt::generate_token;
use crate::auth::models::{Credentials, LoginResponse, UserInfo};
use crate::auth::password::{hash_password, verify_password};
use crate::core::error::{LibraryError, Result};
use crate::db::models::User;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

const MSG_USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Handler for POST /api/auth/register - User registration
pub async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let payload = json_object(body)?;
    let creds = Credentials::parse(&payload).map_err(LibraryError::ValidationError)?;

    tracing::info!(username = %creds.username, "User registration attempt");

    if state.user_repo.find_by_username(&creds.username).await?.is_some() {
        return Err(LibraryError::field("username", MSG_USERNAME_TAKEN));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        username: creds.username,
        password_hash: hash_password(&creds.password)?,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    state.user_repo.create(&user).await.map_err(|e| match e {
        LibraryError::DatabaseError(ref db_err) if is_unique_violation(db_err) => {
            LibraryError::field("username", MSG_USERNAME_TAKEN)
        }
        other => other,
    })?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(UserInfo::from(user))))
}

/// Handler for POST /api/auth/login - User login
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let payload = json_object(body)?;
    let creds = Credentials::parse(&payload).map_err(LibraryError::ValidationError)?;

    tracing::info!(username = %creds.username, "Login attempt");

    let user = state
        .user_repo
        .find_by_username(&creds.username)
        .await?
        .ok_or_else(|| LibraryError::AuthenticationError("Invalid credentials".to_string()))?;

    if !verify_password(&creds.password, &user.password_hash) {
        tracing::warn!(username = %creds.username, "Invalid password");
        return Err(LibraryError::AuthenticationError("Invalid credentials".to_string()));
    }

    let token = generate_token(&user.id, &state.jwt_secret, state.token_ttl_hours)?;

    tracing::info!(user_id = %user.id, username = %user.username, "Login successful");

    Ok(Json(LoginResponse {
        user: UserInfo::from(user),
        token,
    }))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
