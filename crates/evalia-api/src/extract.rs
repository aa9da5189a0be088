//! Path and query extractors whose rejections use the JSON error shape

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ApiError;
use crate::models::{ErrorResponse, FieldError};

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiRejection))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiRejection))]
pub struct ApiQuery<T>(pub T);

/// Extractor failure reported as `VALIDATION_FAILED`
#[derive(Debug)]
pub struct ApiRejection(ApiError);

impl ApiRejection {
    fn validation(field: &str, message: String) -> Self {
        Self((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Malformed request {field}"),
                code: Some("VALIDATION_FAILED".to_string()),
                details: vec![FieldError {
                    field: field.to_string(),
                    message,
                }],
            }),
        ))
    }
}

impl From<PathRejection> for ApiRejection {
    fn from(rejection: PathRejection) -> Self {
        Self::validation("path", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiRejection {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation("query", rejection.body_text())
    }
}

impl IntoResponse for ApiRejection {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}
