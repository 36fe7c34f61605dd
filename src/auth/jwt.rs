//! JWT token generation and validation

use crate::core::error::{LibraryError, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub exp: usize,
}

/// Generate an HS256 token for a user, valid for `ttl_hours`
pub fn generate_token(user_id: &str, secret: &str, ttl_hours: u64) -> Result<String> {
    let ttl = i64::try_from(ttl_hours)
        .ok()
        .and_then(chrono::Duration::try_hours)
        .ok_or_else(|| LibraryError::ConfigError("token_ttl_hours is out of range".to_string()))?;

    let expiration = chrono::Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| LibraryError::AuthenticationError("Failed to calculate expiration".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        user_id: user_id.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| LibraryError::AuthenticationError(format!("Failed to generate token: {}", e)))
}

/// Check signature and expiry, returning the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| LibraryError::AuthenticationError(format!("Invalid token: {}", e)))?;

    Ok(token_data.claims)
}
