//! Error taxonomy of the evaluation engine

use std::fmt;

use evalia_auth::PasswordError;
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// One problem with one input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or incomplete input, reported per field
    #[error("validation failed: {}", join_issues(.0))]
    Validation(Vec<FieldIssue>),

    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account is disabled")]
    AccountDisabled,

    /// Valid identity, insufficient role or ownership
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("student is not enrolled in this group")]
    NotEnrolled,

    #[error("professor already evaluated for this group and period")]
    AlreadyEvaluated,

    #[error("email is already registered")]
    EmailTaken,

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("credential processing failed: {0}")]
    Credential(String),

    #[error("storage failure: {0}")]
    Storage(#[from] DbErr),
}

impl EngineError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation(vec![FieldIssue::new(field, message)])
    }

    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        EngineError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        EngineError::Forbidden(reason.into())
    }

    /// Fails with `Validation` when any issue was collected
    pub fn check(issues: Vec<FieldIssue>) -> EngineResult<()> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(issues))
        }
    }
}

impl From<PasswordError> for EngineError {
    fn from(err: PasswordError) -> Self {
        EngineError::Credential(err.to_string())
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_fields() {
        let err = EngineError::Validation(vec![
            FieldIssue::new("email", "must be a valid address"),
            FieldIssue::new("password", "must be at least 8 characters"),
        ]);

        assert_eq!(
            err.to_string(),
            "validation failed: email: must be a valid address; password: must be at least 8 characters"
        );
    }

    #[test]
    fn test_check_passes_without_issues() {
        assert!(EngineError::check(Vec::new()).is_ok());
        assert!(matches!(
            EngineError::check(vec![FieldIssue::new("x", "bad")]),
            Err(EngineError::Validation(issues)) if issues.len() == 1
        ));
    }

    #[test]
    fn test_not_found_formats_entity_and_id() {
        let err = EngineError::not_found("course", "CS201");
        assert_eq!(err.to_string(), "course 'CS201' not found");
    }
}
