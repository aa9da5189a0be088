//! Password hashing and verification using Argon2id
//!
//! Accounts imported from the previous platform may still carry plaintext
//! passwords. Such values are recognised by the missing PHC prefix and are
//! accepted exactly once through [`check_stored_password`], which tells the
//! caller to persist a fresh hash.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

/// PHC prefix shared by every hash this module produces
const HASH_PREFIX: &str = "$argon2";

/// Error types for password operations
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHashFormat(String),
}

/// Outcome of comparing a login attempt with the stored credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    /// Stored hash verified
    Valid,
    /// Stored value was legacy plaintext and matched; it must be re-hashed now
    LegacyMatch,
    /// Password does not match
    Invalid,
}

impl PasswordCheck {
    pub fn is_accepted(self) -> bool {
        !matches!(self, PasswordCheck::Invalid)
    }
}

/// Hash a password using Argon2id
///
/// Uses the crate defaults (Argon2id, 19 MiB memory, 2 iterations, one lane)
/// with a fresh 16 byte salt per call.
///
/// # Example
/// ```
/// use evalia_auth::password::hash_password;
///
/// let hash = hash_password("MySecurePassword123!").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a password against a PHC-formatted hash
///
/// # Example
/// ```
/// use evalia_auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("MyPassword123!").unwrap();
/// assert!(verify_password("MyPassword123!", &hash).unwrap());
/// assert!(!verify_password("WrongPassword", &hash).unwrap());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHashFormat(e.to_string()))?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

/// Whether a stored credential is a hash produced by this module
pub fn is_password_hash(stored: &str) -> bool {
    stored.starts_with(HASH_PREFIX)
}

/// Compare a login attempt with whatever is stored for the account
///
/// Hashed values go through Argon2 verification. Anything else is treated as
/// a legacy plaintext password and compared directly; a match returns
/// [`PasswordCheck::LegacyMatch`] so the caller can replace it with a hash.
pub fn check_stored_password(password: &str, stored: &str) -> Result<PasswordCheck, PasswordError> {
    if is_password_hash(stored) {
        return Ok(if verify_password(password, stored)? {
            PasswordCheck::Valid
        } else {
            PasswordCheck::Invalid
        });
    }

    if !stored.is_empty() && stored == password {
        Ok(PasswordCheck::LegacyMatch)
    } else {
        Ok(PasswordCheck::Invalid)
    }
}
