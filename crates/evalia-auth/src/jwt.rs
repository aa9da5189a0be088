//! JWT (JSON Web Token) handling for session credentials

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token type carried by browser/API sessions
pub const SESSION_TOKEN_TYPE: &str = "session";

/// Fixed lifetime of a session token
pub const SESSION_VALIDITY_HOURS: i64 = 24;

const SESSION_ISSUER: &str = "evalia-api";
const SESSION_AUDIENCE: &str = "evalia-web";

/// JWT claims for an authenticated platform user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Custom: email of the user the token was issued to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Custom: canonical role tag (student, professor, coordinator, dean, admin)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    /// Custom: token type, only "session" tokens are accepted by the API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl JwtClaims {
    pub fn new(subject: String, issuer: String, audience: String, validity: Duration) -> Self {
        let now = Utc::now();
        let exp = now + validity;

        Self {
            sub: subject,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: issuer,
            aud: audience,
            email: None,
            user_role: None,
            token_type: None,
        }
    }

    /// Claims for a 24 hour session of the given user
    pub fn session(user_id: String, email: String, role: String) -> Self {
        Self::new(
            user_id,
            SESSION_ISSUER.to_string(),
            SESSION_AUDIENCE.to_string(),
            Duration::hours(SESSION_VALIDITY_HOURS),
        )
        .with_email(email)
        .with_user_role(role)
        .with_token_type(SESSION_TOKEN_TYPE.to_string())
    }

    pub fn with_email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    pub fn with_user_role(mut self, role: String) -> Self {
        self.user_role = Some(role);
        self
    }

    pub fn with_token_type(mut self, token_type: String) -> Self {
        self.token_type = Some(token_type);
        self
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    pub fn expires_at(&self) -> chrono::DateTime<Utc> {
        chrono::DateTime::<Utc>::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// JWT errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT encoding error: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,
}

/// JWT validator
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    /// Create a new JWT validator using HMAC-SHA256 (symmetric secret)
    ///
    /// Validates signature and expiration only. Issuer and audience checks are
    /// opt-in through [`JwtValidator::with_issuer`] and [`JwtValidator::with_audience`].
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.validate_nbf = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn with_audience(mut self, audience: String) -> Self {
        self.validation.set_audience(&[audience]);
        self
    }

    pub fn with_issuer(mut self, issuer: String) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, JwtError> {
        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)?;

        if token_data.claims.is_expired() {
            return Err(JwtError::TokenExpired);
        }

        Ok(token_data.claims)
    }

    /// Encode JWT using HMAC-SHA256 (symmetric secret)
    pub fn encode(secret: &[u8], claims: &JwtClaims) -> Result<String, JwtError> {
        let header = Header::new(Algorithm::HS256);
        let encoding_key = EncodingKey::from_secret(secret);

        Ok(encode(&header, claims, &encoding_key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"test_secret_key_1234567890";

    #[test]
    fn test_jwt_encode_decode() {
        let claims = JwtClaims::new(
            "user-123".to_string(),
            "test-issuer".to_string(),
            "test-audience".to_string(),
            Duration::hours(1),
        );

        let token = JwtValidator::encode(TEST_SECRET, &claims).unwrap();

        let validator = JwtValidator::new(TEST_SECRET)
            .with_issuer("test-issuer".to_string())
            .with_audience("test-audience".to_string());

        let decoded_claims = validator.validate(&token).unwrap();

        assert_eq!(decoded_claims.sub, claims.sub);
        assert_eq!(decoded_claims.iss, claims.iss);
        assert_eq!(decoded_claims.aud, claims.aud);
    }

    #[test]
    fn test_session_claims_carry_identity() {
        let claims = JwtClaims::session(
            "7f1c".to_string(),
            "ana@uni.edu".to_string(),
            "student".to_string(),
        );

        let token = JwtValidator::encode(TEST_SECRET, &claims).unwrap();
        let decoded = JwtValidator::new(TEST_SECRET).validate(&token).unwrap();

        assert_eq!(decoded.sub, "7f1c");
        assert_eq!(decoded.email.as_deref(), Some("ana@uni.edu"));
        assert_eq!(decoded.user_role.as_deref(), Some("student"));
        assert_eq!(decoded.token_type.as_deref(), Some(SESSION_TOKEN_TYPE));
    }

    #[test]
    fn test_session_lifetime_is_24_hours() {
        let claims = JwtClaims::session(
            "u".to_string(),
            "u@uni.edu".to_string(),
            "dean".to_string(),
        );

        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_expired_token() {
        let claims = JwtClaims::new(
            "user-789".to_string(),
            "issuer".to_string(),
            "audience".to_string(),
            Duration::seconds(-10),
        );

        assert!(claims.is_expired());

        let token = JwtValidator::encode(TEST_SECRET, &claims).unwrap();
        let result = JwtValidator::new(TEST_SECRET).validate(&token);

        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = JwtClaims::session(
            "u".to_string(),
            "u@uni.edu".to_string(),
            "professor".to_string(),
        );
        let token = JwtValidator::encode(b"another-secret", &claims).unwrap();

        assert!(JwtValidator::new(TEST_SECRET).validate(&token).is_err());
    }

    #[test]
    fn test_optional_claims_skipped_when_none() {
        let claims = JwtClaims::new(
            "user-9".to_string(),
            "issuer".to_string(),
            "audience".to_string(),
            Duration::hours(1),
        );

        let json = serde_json::to_string(&claims).unwrap();

        assert!(!json.contains("email"));
        assert!(!json.contains("user_role"));
        assert!(!json.contains("token_type"));
    }
}
