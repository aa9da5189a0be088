//! Request handlers, one module per resource

pub mod auth;
pub mod catalog;
pub mod evaluations;
pub mod professors;
pub mod questions;
pub mod system;
pub mod users;

pub use auth::*;
pub use catalog::*;
pub use evaluations::*;
pub use professors::*;
pub use questions::*;
pub use system::*;
pub use users::*;

use axum::{extract::rejection::JsonRejection, Json};

use crate::error::{bad_body, ApiError};

/// Unwrap a JSON body, turning extractor rejections into 400s
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(bad_body)
}
