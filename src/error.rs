// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use crate::store::{StoreError, TxnError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
///
/// Precondition violations (`PlanFull`, `AlreadyJoined`, `NotParticipant`,
/// `QuotaExceeded`) are expected, recoverable outcomes: the operation simply
/// does not proceed and the caller may retry manually.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Plan already full")]
    PlanFull,

    #[error("Already joined this plan")]
    AlreadyJoined,

    #[error("Not a participant of this plan")]
    NotParticipant,

    #[error("You already have {0} active plans")]
    QuotaExceeded(usize),

    #[error("Could not complete the operation, try again")]
    Conflict,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            // Transaction retries exhausted: surface as a recoverable
            // precondition-shaped error, not an internal failure.
            StoreError::Contention(_) => AppError::Conflict,
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<TxnError<AppError>> for AppError {
    fn from(err: TxnError<AppError>) -> Self {
        match err {
            TxnError::Abort(app) => app,
            TxnError::Store(store) => store.into(),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::AccessDenied(msg) => {
                (StatusCode::FORBIDDEN, "access_denied", Some(msg.clone()))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::PlanFull => (
                StatusCode::CONFLICT,
                "plan_full",
                Some("Plan already full".to_string()),
            ),
            AppError::AlreadyJoined => (
                StatusCode::CONFLICT,
                "already_joined",
                Some("Already joined this plan".to_string()),
            ),
            AppError::NotParticipant => (
                StatusCode::CONFLICT,
                "not_participant",
                Some("Not a participant of this plan".to_string()),
            ),
            AppError::QuotaExceeded(_) => {
                (StatusCode::CONFLICT, "quota_exceeded", Some(self.to_string()))
            }
            AppError::Conflict => (
                StatusCode::CONFLICT,
                "conflict",
                Some("Could not complete the operation, try again".to_string()),
            ),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
