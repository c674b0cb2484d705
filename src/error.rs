//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::processor::ProcessError;
use crate::store::StoreError;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("Transaction with id {0} already exists")]
    AlreadyExists(String),

    // Server errors (5xx)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ProcessError> for AppError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Validation(e) => AppError::Validation(e),
            ProcessError::AlreadyExists(id) => AppError::AlreadyExists(id),
            ProcessError::Connectivity(msg) => AppError::Unavailable(msg),
            ProcessError::Fatal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connectivity(msg) => AppError::Unavailable(msg),
            StoreError::Validation(msg) => AppError::Validation(DomainError::ConstraintViolation(msg)),
            StoreError::Conflict(id) => AppError::AlreadyExists(id),
            StoreError::Fatal(msg) => AppError::Internal(msg),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }
            AppError::Validation(domain_err) => match domain_err {
                DomainError::InvalidAmount(e) => {
                    (StatusCode::BAD_REQUEST, "invalid_amount", Some(e.to_string()))
                }
                DomainError::InvalidTransactionType(value) => {
                    (StatusCode::BAD_REQUEST, "invalid_transaction_type", Some(value.clone()))
                }
                DomainError::MissingUserId => (StatusCode::BAD_REQUEST, "missing_user_id", None),
                DomainError::ConstraintViolation(msg) => {
                    (StatusCode::BAD_REQUEST, "constraint_violation", Some(msg.clone()))
                }
            },

            // 409 Conflict
            AppError::AlreadyExists(id) => {
                (StatusCode::CONFLICT, "already_exists", Some(id.clone()))
            }

            // 503 Service Unavailable
            AppError::Unavailable(msg) => {
                tracing::warn!("Store unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", None)
            }

            // 500 Internal Server Error
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
