//! JWT Authentication Middleware
//!
//! Extracts the session JWT from the `session_token` cookie or the
//! Authorization header, validates it, and makes the caller available to
//! handlers via Axum's Extension.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use evalia_auth::{JwtValidator, SESSION_TOKEN_TYPE};
use evalia_db::entities::user::UserRole;
use evalia_engine::Caller;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{api_error, ApiError};
use crate::session::SESSION_COOKIE;

/// Authenticated user context extracted from JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    /// Canonical role parsed from the token
    pub role: UserRole,
}

impl AuthUser {
    /// Identity handed to engine operations
    pub fn caller(&self) -> Caller {
        Caller::new(self.user_id, self.email.clone(), self.role)
    }
}

/// JWT validation state shared across middleware instances
#[derive(Clone)]
pub struct JwtState {
    pub validator: Arc<JwtValidator>,
}

impl JwtState {
    /// Create new JWT state with the given secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            validator: Arc::new(JwtValidator::new(secret)),
        }
    }
}

fn cookie_token(request: &Request) -> Option<String> {
    let cookies = request.headers().get(header::COOKIE)?.to_str().ok()?;
    let prefix = format!("{SESSION_COOKIE}=");

    cookies
        .split(';')
        .map(str::trim)
        .find_map(|c| c.strip_prefix(prefix.as_str()))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn bearer_token(request: &Request) -> Result<String, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            api_error(
                StatusCode::UNAUTHORIZED,
                "MISSING_AUTH",
                "Missing authentication token (cookie or Authorization header)",
            )
        })?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| {
            api_error(
                StatusCode::UNAUTHORIZED,
                "INVALID_AUTH_FORMAT",
                "Invalid Authorization header format. Expected 'Bearer <token>'",
            )
        })
}

/// Authentication middleware that validates JWT session tokens
///
/// # Errors
/// Returns 401 Unauthorized if:
/// - Both cookie and Authorization header are missing
/// - Token is malformed, invalid or expired
/// - Token type is not "session"
/// - Subject or role claim cannot be parsed
pub async fn require_auth(
    State(state): State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = match cookie_token(&request) {
        Some(token) => token,
        None => bearer_token(&request)?,
    };

    let claims = state.validator.validate(&token).map_err(|e| {
        api_error(
            StatusCode::UNAUTHORIZED,
            "INVALID_TOKEN",
            format!("Invalid or expired token: {}", e),
        )
    })?;

    match claims.token_type.as_deref() {
        Some(SESSION_TOKEN_TYPE) => {}
        Some(other) => {
            return Err(api_error(
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN_TYPE",
                format!(
                    "Invalid token type '{}'. Expected 'session' token for API access",
                    other
                ),
            ));
        }
        None => {
            return Err(api_error(
                StatusCode::UNAUTHORIZED,
                "MISSING_TOKEN_TYPE",
                "Token missing 'token_type' claim",
            ));
        }
    }

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        api_error(
            StatusCode::UNAUTHORIZED,
            "MISSING_USER_ID",
            "Token subject is not a user id",
        )
    })?;

    let role = claims
        .user_role
        .as_deref()
        .and_then(|r| r.parse::<UserRole>().ok())
        .ok_or_else(|| {
            api_error(
                StatusCode::UNAUTHORIZED,
                "INVALID_ROLE",
                "Token missing a known 'user_role' claim",
            )
        })?;

    request.extensions_mut().insert(AuthUser {
        user_id,
        email: claims.email.unwrap_or_default(),
        role,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorResponse;
    use axum::{body::Body, http::Request, middleware, routing::get, Json, Router};
    use chrono::Duration;
    use evalia_auth::JwtClaims;
    use tower::ServiceExt; // For oneshot()

    const SECRET: &[u8] = b"test-secret-key";

    // Test handler that returns the authenticated user
    async fn protected_handler(axum::Extension(user): axum::Extension<AuthUser>) -> Json<AuthUser> {
        Json(user)
    }

    fn create_test_app(jwt_secret: &[u8]) -> Router {
        let jwt_state = Arc::new(JwtState::new(jwt_secret));

        Router::new()
            .route("/protected", get(protected_handler))
            .layer(middleware::from_fn_with_state(
                jwt_state.clone(),
                require_auth,
            ))
            .with_state(jwt_state)
    }

    fn session_token(user_id: Uuid, role: &str) -> String {
        let claims = JwtClaims::session(
            user_id.to_string(),
            "prof@uni.edu".to_string(),
            role.to_string(),
        );
        JwtValidator::encode(SECRET, &claims).unwrap()
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    fn with_bearer(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/protected")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_auth_middleware_valid_session_token() {
        let user_id = Uuid::new_v4();
        let token = session_token(user_id, "professor");

        let (status, body) = call(create_test_app(SECRET), with_bearer(&token)).await;

        assert_eq!(status, StatusCode::OK);
        let auth_user: AuthUser = serde_json::from_slice(&body).unwrap();
        assert_eq!(auth_user.user_id, user_id);
        assert_eq!(auth_user.email, "prof@uni.edu");
        assert_eq!(auth_user.role, UserRole::Professor);
    }

    #[tokio::test]
    async fn test_auth_middleware_normalizes_role_synonyms() {
        let token = session_token(Uuid::new_v4(), "docente");

        let (status, body) = call(create_test_app(SECRET), with_bearer(&token)).await;

        assert_eq!(status, StatusCode::OK);
        let auth_user: AuthUser = serde_json::from_slice(&body).unwrap();
        assert_eq!(auth_user.role, UserRole::Professor);
    }

    #[tokio::test]
    async fn test_auth_middleware_accepts_session_cookie() {
        let token = session_token(Uuid::new_v4(), "student");

        let request = Request::builder()
            .uri("/protected")
            .header("Cookie", format!("theme=dark; {}={}", SESSION_COOKIE, token))
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(create_test_app(SECRET), request).await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_middleware_missing_authorization_header() {
        let request = Request::builder()
            .uri("/protected")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(create_test_app(SECRET), request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code.as_deref(), Some("MISSING_AUTH"));
    }

    #[tokio::test]
    async fn test_auth_middleware_invalid_bearer_format() {
        let request = Request::builder()
            .uri("/protected")
            .header("Authorization", "InvalidFormat token123")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(create_test_app(SECRET), request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(error.error.contains("Invalid Authorization header format"));
    }

    #[tokio::test]
    async fn test_auth_middleware_expired_token() {
        let claims = JwtClaims::new(
            Uuid::new_v4().to_string(),
            "evalia-api".to_string(),
            "evalia-web".to_string(),
            Duration::seconds(-10), // Already expired
        )
        .with_user_role("student".to_string())
        .with_token_type("session".to_string());
        let token = JwtValidator::encode(SECRET, &claims).unwrap();

        let (status, body) = call(create_test_app(SECRET), with_bearer(&token)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(error.error.contains("Invalid or expired token"));
    }

    #[tokio::test]
    async fn test_auth_middleware_wrong_secret() {
        let claims = JwtClaims::session(
            Uuid::new_v4().to_string(),
            "x@uni.edu".to_string(),
            "dean".to_string(),
        );
        let token = JwtValidator::encode(b"wrong-secret-key", &claims).unwrap();

        let (status, _) = call(create_test_app(SECRET), with_bearer(&token)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_middleware_rejects_other_token_types() {
        let claims = JwtClaims::new(
            Uuid::new_v4().to_string(),
            "evalia-api".to_string(),
            "evalia-web".to_string(),
            Duration::hours(1),
        )
        .with_user_role("admin".to_string())
        .with_token_type("password_reset".to_string());
        let token = JwtValidator::encode(SECRET, &claims).unwrap();

        let (status, body) = call(create_test_app(SECRET), with_bearer(&token)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(error.error.contains("Invalid token type"));
        assert!(error.error.contains("Expected 'session' token"));
    }

    #[tokio::test]
    async fn test_auth_middleware_rejects_non_uuid_subject() {
        let claims = JwtClaims::session(
            "not-a-uuid".to_string(),
            "x@uni.edu".to_string(),
            "student".to_string(),
        );
        let token = JwtValidator::encode(SECRET, &claims).unwrap();

        let (status, body) = call(create_test_app(SECRET), with_bearer(&token)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code.as_deref(), Some("MISSING_USER_ID"));
    }

    #[tokio::test]
    async fn test_auth_middleware_rejects_unknown_role() {
        let token = session_token(Uuid::new_v4(), "janitor");

        let (status, body) = call(create_test_app(SECRET), with_bearer(&token)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code.as_deref(), Some("INVALID_ROLE"));
    }
}
