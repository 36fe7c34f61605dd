//! Request authentication
//!
//! Resolves the caller from a bearer token (or `token` query parameter) to a
//! stored user. Route guards call [`authenticate_request`]; handlers that need
//! the caller extract [`AuthUser`].

use crate::api::handlers::AppState;
use crate::auth::jwt::validate_token;
use crate::core::error::{LibraryError, Result};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts},
};

/// Authenticated user stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
}

/// Token from `Authorization: Bearer ...`, falling back to `?token=...`
pub fn extract_token(request: &Request) -> Option<String> {
    let from_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    from_header.or_else(|| {
        request.uri().query().and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(k, _)| k == "token")
                .map(|(_, v)| v.into_owned())
        })
    })
}

/// Validate the request's token and attach the [`AuthUser`] to it
pub async fn authenticate_request(state: &AppState, request: &mut Request) -> Result<AuthUser> {
    let token = extract_token(request).ok_or_else(|| {
        LibraryError::AuthenticationError("Authentication credentials were not provided.".to_string())
    })?;

    let claims = validate_token(&token, &state.jwt_secret)?;

    let user = state
        .user_repo
        .find_by_id(&claims.user_id)
        .await?
        .ok_or_else(|| LibraryError::AuthenticationError("User not found".to_string()))?;

    let auth_user = AuthUser {
        id: user.id,
        username: user.username,
    };
    request.extensions_mut().insert(auth_user.clone());

    Ok(auth_user)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = LibraryError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| LibraryError::AuthenticationError("User not authenticated".to_string()))
    }
}
