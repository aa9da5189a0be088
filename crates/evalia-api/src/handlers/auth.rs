//! Registration, login and session management

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use evalia_db::entities::user;
use evalia_engine::accounts::{self, NewAccount, SELF_SERVICE_ROLES};
use std::sync::Arc;
use tracing::error;

use super::json_body;
use crate::error::{api_error, engine_error, ApiError};
use crate::middleware::AuthUser;
use crate::models::{
    AuthConfig, ChangePasswordRequest, ErrorResponse, LoginRequest, LoginResponse,
    RegisterRequest, RegisterResponse, User,
};
use crate::session::{expired_session_cookie, issue_session, session_cookie, IssuedSession};
use crate::AppState;

impl From<RegisterRequest> for NewAccount {
    fn from(req: RegisterRequest) -> Self {
        Self {
            email: req.email,
            password: req.password,
            given_name: req.given_name,
            family_name: req.family_name,
            role: req.role,
            student_code: req.student_code,
            career_id: req.career_id,
            semester: req.semester,
            employee_code: req.employee_code,
            department: req.department,
        }
    }
}

fn start_session(state: &AppState, user: &user::Model) -> Result<IssuedSession, ApiError> {
    issue_session(&state.jwt_secret, user).map_err(|e| {
        error!("Failed to sign session token for {}: {}", user.id, e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error",
        )
    })
}

/// Public authentication settings
#[utoipa::path(
    get,
    path = "/api/auth/config",
    responses(
        (status = 200, description = "Authentication configuration", body = AuthConfig)
    ),
    tag = "auth"
)]
pub async fn auth_config(State(state): State<Arc<AppState>>) -> Json<AuthConfig> {
    Json(AuthConfig {
        signup_enabled: state.allow_signup,
        self_service_roles: SELF_SERVICE_ROLES
            .iter()
            .map(|r| r.as_str().to_string())
            .collect(),
    })
}

/// Register a student or professor account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation failed or email already registered", body = ErrorResponse),
        (status = 403, description = "Registration disabled or role not self-service", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    if !state.allow_signup {
        return Err(api_error(
            StatusCode::FORBIDDEN,
            "SIGNUP_DISABLED",
            "Public registration is disabled",
        ));
    }

    let req = json_body(payload)?;
    let profile = accounts::register(&state.db, req.into())
        .await
        .map_err(engine_error)?;
    let session = start_session(&state, &profile.user)?;

    let body = RegisterResponse {
        user: profile.into(),
        token: session.token.clone(),
        expires_at: session.expires_at,
    };

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, session_cookie(&session.token))],
        Json(body),
    )
        .into_response())
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Bad credentials or inactive account", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let req = json_body(payload)?;
    let profile = accounts::authenticate(&state.db, &req.email, &req.password)
        .await
        .map_err(engine_error)?;
    let session = start_session(&state, &profile.user)?;

    let body = LoginResponse {
        user: profile.into(),
        token: session.token.clone(),
        expires_at: session.expires_at,
    };

    Ok((
        [(header::SET_COOKIE, session_cookie(&session.token))],
        Json(body),
    )
        .into_response())
}

/// Clear the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Session cookie cleared")
    ),
    tag = "auth"
)]
pub async fn logout() -> Response {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, expired_session_cookie())],
    )
        .into_response()
}

/// Current user profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Invalid token or inactive account", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<User>, ApiError> {
    let profile = accounts::profile(&state.db, &auth_user.caller())
        .await
        .map_err(engine_error)?;

    Ok(Json(profile.into()))
}

/// Change the caller's password
#[utoipa::path(
    post,
    path = "/api/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "New password too short", body = ErrorResponse),
        (status = 401, description = "Current password is wrong", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let req = json_body(payload)?;
    accounts::change_password(
        &state.db,
        &auth_user.caller(),
        &req.current_password,
        &req.new_password,
    )
    .await
    .map_err(engine_error)?;

    Ok(StatusCode::NO_CONTENT)
}
