//! Translation of engine failures into HTTP responses

use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};
use evalia_engine::EngineError;
use tracing::{error, warn};

use crate::models::{ErrorResponse, FieldError};

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: Some(code.to_string()),
            details: Vec::new(),
        }),
    )
}

/// Storage and credential failures are logged in full and reported
/// generically; everything else keeps its message.
pub fn engine_error(err: EngineError) -> ApiError {
    match err {
        EngineError::Validation(issues) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Request validation failed".to_string(),
                code: Some("VALIDATION_FAILED".to_string()),
                details: issues.into_iter().map(FieldError::from).collect(),
            }),
        ),
        EngineError::Unauthenticated => api_error(
            StatusCode::UNAUTHORIZED,
            "UNAUTHENTICATED",
            "Authentication required",
        ),
        EngineError::InvalidCredentials => api_error(
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            "Invalid email or password",
        ),
        EngineError::AccountDisabled => api_error(
            StatusCode::UNAUTHORIZED,
            "ACCOUNT_DISABLED",
            "This account has been deactivated",
        ),
        EngineError::Forbidden(reason) => {
            warn!("Forbidden: {}", reason);
            api_error(StatusCode::FORBIDDEN, "FORBIDDEN", reason)
        }
        EngineError::NotEnrolled => api_error(
            StatusCode::FORBIDDEN,
            "NOT_ENROLLED",
            "You are not enrolled in this group",
        ),
        EngineError::AlreadyEvaluated => api_error(
            StatusCode::BAD_REQUEST,
            "ALREADY_EVALUATED",
            "You already evaluated this professor for this group and period",
        ),
        EngineError::EmailTaken => api_error(
            StatusCode::BAD_REQUEST,
            "EMAIL_EXISTS",
            "Email already registered",
        ),
        err @ EngineError::NotFound { .. } => {
            api_error(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
        }
        err @ (EngineError::Storage(_) | EngineError::Credential(_)) => {
            error!("Request failed: {}", err);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            )
        }
    }
}

/// Malformed JSON bodies are validation failures, not 422s
pub fn bad_body(rejection: JsonRejection) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "Malformed request body".to_string(),
            code: Some("VALIDATION_FAILED".to_string()),
            details: vec![FieldError {
                field: "body".to_string(),
                message: rejection.body_text(),
            }],
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalia_engine::FieldIssue;
    use sea_orm::DbErr;

    #[test]
    fn test_validation_carries_field_details() {
        let (status, Json(body)) = engine_error(EngineError::Validation(vec![FieldIssue::new(
            "answers[0]",
            "rating 9 is outside 1..=5",
        )]));

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code.as_deref(), Some("VALIDATION_FAILED"));
        assert_eq!(body.details.len(), 1);
        assert_eq!(body.details[0].field, "answers[0]");
    }

    #[test]
    fn test_conflicts_and_eligibility() {
        let (status, Json(body)) = engine_error(EngineError::AlreadyEvaluated);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code.as_deref(), Some("ALREADY_EVALUATED"));

        let (status, Json(body)) = engine_error(EngineError::NotEnrolled);
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.code.as_deref(), Some("NOT_ENROLLED"));

        let (status, _) = engine_error(EngineError::not_found("course", "x"));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_storage_failure_is_generic() {
        let (status, Json(body)) = engine_error(EngineError::Storage(DbErr::Custom(
            "connection reset by peer at 10.0.0.3".to_string(),
        )));

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code.as_deref(), Some("INTERNAL_ERROR"));
        assert!(!body.error.contains("10.0.0.3"));
    }
}
