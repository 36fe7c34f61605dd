//! Authentication module
//!
//! - User registration and login
//! - JWT token generation and validation
//! - Password hashing and verification
//! - Request authentication used by route guards

pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use handlers::{login, register};
pub use jwt::{generate_token, validate_token, Claims};
pub use middleware::{authenticate_request, AuthUser};
pub use password::{hash_password, verify_password};
