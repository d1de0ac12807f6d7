//! Error handling for the Inventory Back-Office service
//!
//! Every failure leaves the API as `{ "error": { code, message, field? } }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business rule errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Insufficient stock: {message}")]
    InsufficientStock { message: String, available: i32 },

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Map unique-constraint violations to a duplicate error for `field`
    pub fn from_unique(err: sqlx::Error, field: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::DuplicateEntry(field.to_string())
            }
            _ => AppError::DatabaseError(err),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Validation { .. }
            | AppError::ValidationError(_)
            | AppError::DuplicateEntry(_)
            | AppError::InvalidStateTransition(_)
            | AppError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<i32>,
}

impl ErrorDetail {
    fn new(code: &str, message: String) -> Self {
        Self {
            code: code.to_string(),
            message,
            field: None,
            available_quantity: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_detail = match &self {
            AppError::InvalidCredentials => ErrorDetail::new(
                "INVALID_CREDENTIALS",
                "Invalid email or password".to_string(),
            ),
            AppError::Validation { field, message } => ErrorDetail {
                field: Some(field.clone()),
                ..ErrorDetail::new("VALIDATION_ERROR", message.clone())
            },
            AppError::ValidationError(msg) => ErrorDetail::new("VALIDATION_ERROR", msg.clone()),
            AppError::DuplicateEntry(field) => ErrorDetail {
                field: Some(field.clone()),
                ..ErrorDetail::new(
                    "DUPLICATE_ENTRY",
                    format!("A record with this {} already exists", field),
                )
            },
            AppError::NotFound(resource) => {
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource))
            }
            AppError::InvalidStateTransition(msg) => {
                ErrorDetail::new("INVALID_STATE_TRANSITION", msg.clone())
            }
            AppError::InsufficientStock { message, available } => ErrorDetail {
                available_quantity: Some(*available),
                ..ErrorDetail::new("INSUFFICIENT_STOCK", message.clone())
            },
            AppError::DatabaseError(err) => ErrorDetail::new("DATABASE_ERROR", err.to_string()),
            AppError::Internal(msg) => ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (self.status_code(), Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_bad_request() {
        assert_eq!(
            AppError::validation("rating", "out of range").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DuplicateEntry("email".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InsufficientStock {
                message: "Only 2 units available".into(),
                available: 2,
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_not_found_and_internal() {
        assert_eq!(
            AppError::NotFound("Product".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from_unique(sqlx::Error::RowNotFound, "product_id").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_response_status_matches() {
        let response = AppError::NotFound("Invoice".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
