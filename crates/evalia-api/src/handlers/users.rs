//! Administrator-only account management

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use evalia_engine::accounts;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::json_body;
use crate::error::{engine_error, ApiError};
use crate::extract::ApiPath;
use crate::middleware::AuthUser;
use crate::models::{ErrorResponse, RegisterRequest, User};
use crate::AppState;

/// Create an account with any role
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Validation failed or email already registered", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let req = json_body(payload)?;
    let profile = accounts::create_account(&state.db, &auth_user.caller(), req.into())
        .await
        .map_err(engine_error)?;

    info!(
        "{} created account {} ({})",
        auth_user.email, profile.user.email, profile.user.role
    );

    Ok((StatusCode::CREATED, Json(profile.into())))
}

/// Deactivate an account; users are never hard-deleted
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    accounts::deactivate_user(&state.db, &auth_user.caller(), id)
        .await
        .map_err(engine_error)?;

    Ok(StatusCode::NO_CONTENT)
}
