//! Error handling module for the RateMyBite backend.
//!
//! Provides the centralized error type with mapping to HTTP status codes and JSON bodies.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geocoding::GeocodeError;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const UPSTREAM_UNAVAILABLE: &str = "UPSTREAM_UNAVAILABLE";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, invalid or expired credential
    #[error("{0}")]
    Unauthorized(String),
    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),
    /// Resource not found
    #[error("{0}")]
    NotFound(String),
    /// Malformed or missing input
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },
    /// Duplicate unique value or disallowed state transition
    #[error("{0}")]
    Conflict(String),
    /// An external dependency (the geocoder) could not be reached
    #[error("{0}")]
    UpstreamUnavailable(String),
    /// Database error
    #[error("{0}")]
    Database(String),
    /// Internal server error
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Validation error without structured details.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: None,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::Forbidden(_) => codes::FORBIDDEN,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation { .. } => codes::VALIDATION_ERROR,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::UpstreamUnavailable(_) => codes::UPSTREAM_UNAVAILABLE,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::Conflict("A record with the same unique value already exists".to_string());
            }
        }
        tracing::error!("Database error: {:?}", err);
        AppError::Database("Database error".to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation {
            message: "Invalid request body".to_string(),
            details: Some(serde_json::Value::String(rejection.body_text())),
        }
    }
}

impl From<GeocodeError> for AppError {
    fn from(err: GeocodeError) -> Self {
        tracing::warn!("Geocoding unavailable: {}", err);
        AppError::UpstreamUnavailable(format!("Geocoding service unavailable: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::debug!("Rejected token: {}", err);
        AppError::Unauthorized("Invalid or expired token".to_string())
    }
}

impl From<pwhash::error::Error> for AppError {
    fn from(err: pwhash::error::Error) -> Self {
        tracing::error!("Password hashing error: {:?}", err);
        AppError::Internal("Password hashing failed".to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!("Blocking task failed: {:?}", err);
        AppError::Internal("Background task failed".to_string())
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::Validation { details, .. } => details.clone(),
            _ => None,
        };

        Self {
            error: error.to_string(),
            code: error.error_code().to_string(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Forbidden("no".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::UpstreamUnavailable("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_body_carries_details() {
        let err = AppError::Validation {
            message: "Rating must be between 1 and 5".into(),
            details: Some(serde_json::json!({ "rating": 7 })),
        };
        let body = serde_json::to_value(ErrorResponse::new(&err)).unwrap();
        assert_eq!(body["error"], "Rating must be between 1 and 5");
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["rating"], 7);

        let body = serde_json::to_value(ErrorResponse::new(&AppError::NotFound("x".into()))).unwrap();
        assert!(body.get("details").is_none());
    }
}
