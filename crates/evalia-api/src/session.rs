//! Session tokens and the cookie that carries them

use chrono::{DateTime, Utc};
use evalia_auth::{JwtClaims, JwtError, JwtValidator, SESSION_VALIDITY_HOURS};
use evalia_db::entities::user;

/// Cookie read by the auth middleware before the Authorization header
pub const SESSION_COOKIE: &str = "session_token";

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Mint a 24 hour session token for `user`
pub fn issue_session(secret: &str, user: &user::Model) -> Result<IssuedSession, JwtError> {
    let claims = JwtClaims::session(
        user.id.to_string(),
        user.email.clone(),
        user.role.as_str().to_string(),
    );
    let token = JwtValidator::encode(secret.as_bytes(), &claims)?;

    Ok(IssuedSession {
        token,
        expires_at: claims.expires_at(),
    })
}

pub fn session_cookie(token: &str) -> String {
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_VALIDITY_HOURS * 3600
    )
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use evalia_db::entities::user::UserRole;
    use uuid::Uuid;

    fn user(role: UserRole) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            email: "ana@uni.edu".to_string(),
            password_hash: String::new(),
            given_name: "Ana".to_string(),
            family_name: "Lopez".to_string(),
            role,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issued_session_round_trips() {
        let student = user(UserRole::Student);
        let session = issue_session("secret", &student).unwrap();

        let claims = JwtValidator::new(b"secret").validate(&session.token).unwrap();
        assert_eq!(claims.sub, student.id.to_string());
        assert_eq!(claims.user_role.as_deref(), Some("student"));
        assert_eq!(claims.email.as_deref(), Some("ana@uni.edu"));

        let hours = (session.expires_at - Utc::now()).num_minutes() as f64 / 60.0;
        assert!((23.9..=24.0).contains(&hours));
    }

    #[test]
    fn test_cookies() {
        assert!(session_cookie("abc").starts_with("session_token=abc;"));
        assert!(session_cookie("abc").contains("Max-Age=86400"));
        assert!(expired_session_cookie().contains("Max-Age=0"));
    }
}
