// Error types surfaced to HTTP callers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

/// One violated request constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl Violation {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut violations: Vec<Violation> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter().map(move |err| {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} failed '{}' check", field, err.code));
                    Violation::new(field.clone(), err.code.to_string(), message)
                })
            })
            .collect();
        violations.sort_by(|a, b| a.field.cmp(&b.field).then(a.code.cmp(&b.code)));
        AppError::Validation(violations)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request format")]
    Validation(Vec<Violation>),

    #[error("Authentication error: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(details) => {
                warn!(violations = details.len(), "Rejected malformed request");
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                        "error": "Invalid request format",
                        "details": details,
                    })),
                )
                    .into_response()
            }
            AppError::Unauthorized(reason) => {
                warn!("Unauthorized request: {}", reason);
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({ "error": "Unauthorized" })),
                )
                    .into_response()
            }
            AppError::Internal(reason) => {
                error!("Error analyzing file: {}", reason);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "Failed to analyze file" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(required(message = "url is required"))]
        url: Option<String>,
        #[validate(length(min = 1))]
        name: String,
    }

    #[test]
    fn test_validation_errors_become_sorted_violations() {
        let sample = Sample {
            url: None,
            name: String::new(),
        };
        let err: AppError = sample.validate().unwrap_err().into();

        match err {
            AppError::Validation(details) => {
                assert_eq!(details.len(), 2);
                assert_eq!(details[0].field, "name");
                assert_eq!(details[0].code, "length");
                assert_eq!(details[1].field, "url");
                assert_eq!(details[1].message, "url is required");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation(vec![]).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("no token".into()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
