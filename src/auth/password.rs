//! Password hashing and verification using bcrypt

use crate::core::error::{LibraryError, Result};

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| LibraryError::TaskError(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored hash
///
/// A malformed hash counts as a mismatch rather than an internal error.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert_ne!(hash, "s3cret");
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_malformed_hash() {
        assert!(!verify_password("s3cret", "not-a-bcrypt-hash"));
    }
}
