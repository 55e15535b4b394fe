use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::portfolio::repair::RepairError;
use crate::portfolio::schema::Violation;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or unusable input. Never retried.
    #[error("{0}")]
    BadRequest(String),

    #[error("Content extraction failed: {0}")]
    Extraction(String),

    #[error("Operation failed ({operation})")]
    Timeout { operation: String },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Model output could not be parsed: {0}")]
    ModelOutput(#[from] RepairError),

    /// Sanitized output was rejected. Signals a sanitizer defect.
    #[error("Schema validation failed with {} violation(s)", .0.len())]
    SchemaValidation(Vec<Violation>),

    /// A flight log supplied by the user does not conform.
    #[error("Flight log rejected with {} violation(s)", .0.len())]
    InvalidFlightLog(Vec<Violation>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// The single error envelope every failure collapses to.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidFlightLog(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Input and validation errors are deterministic; retrying cannot help.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            AppError::BadRequest(_)
                | AppError::InvalidFlightLog(_)
                | AppError::SchemaValidation(_)
                | AppError::NotFound(_)
        )
    }

    /// Short category label for the envelope's `error` field.
    pub fn label(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "Bad request",
            AppError::InvalidFlightLog(_) => "Invalid flight log",
            AppError::NotFound(_) => "Not found",
            _ => "Build failed",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let label = self.label();
        if status.is_server_error() {
            match &self {
                AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
                other => tracing::error!("{other}"),
            }
        }

        let (message, violations) = match self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) => (msg, None),
            // internals stay in the logs
            AppError::Internal(_) => ("An internal server error occurred".to_string(), None),
            AppError::SchemaValidation(v) => {
                (format!("Schema validation failed with {} violation(s)", v.len()), Some(v))
            }
            AppError::InvalidFlightLog(v) => {
                (format!("Flight log rejected with {} violation(s)", v.len()), Some(v))
            }
            other => (other.to_string(), None),
        };

        let body = ErrorBody {
            error: label,
            message: Some(message),
            violations,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidFlightLog(vec![]).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Timeout { operation: "ai:analyze".into() }.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::SchemaValidation(vec![]).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_timeout_names_operation() {
        let err = AppError::Timeout { operation: "pdf:cv.pdf".into() };
        assert_eq!(err.to_string(), "Operation failed (pdf:cv.pdf)");
    }

    #[test]
    fn test_envelope_skips_empty_violations() {
        let body = ErrorBody {
            error: "Bad request",
            message: Some("At least one file or one link is required".into()),
            violations: None,
        };
        let v = serde_json::to_value(body).unwrap();
        assert_eq!(v["error"], "Bad request");
        assert!(v.get("violations").is_none());
    }
}
