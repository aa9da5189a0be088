//! Session credentials and password storage for the evaluation platform

pub mod jwt;
pub mod password;

pub use jwt::{JwtClaims, JwtError, JwtValidator, SESSION_TOKEN_TYPE, SESSION_VALIDITY_HOURS};
pub use password::{
    check_stored_password, hash_password, is_password_hash, verify_password, PasswordCheck,
    PasswordError,
};

// Re-export useful types
pub use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation};
