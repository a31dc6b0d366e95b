//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, BlobError, DeletionError, PaymentError, SubscriptionError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Subscription operation failed.
    #[error("Subscription error: {0}")]
    Subscription(#[from] SubscriptionError),

    /// Payment gateway unreachable or erroring.
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] PaymentError),

    /// Blob store unreachable or erroring (surfaced on uploads only).
    #[error("Storage error: {0}")]
    Storage(#[from] BlobError),

    /// Resource not found (or not owned by the caller).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated or not permitted.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DeletionError> for AppError {
    fn from(err: DeletionError) -> Self {
        match err {
            DeletionError::NotFound => Self::NotFound("account".to_owned()),
            DeletionError::Unauthorized => Self::Unauthorized("invalid credentials".to_owned()),
            DeletionError::Repository(e) => Self::Database(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry; a repository NotFound is an
        // ordinary 404, not an incident.
        let capture = match &self {
            Self::Database(RepositoryError::NotFound) => false,
            Self::Database(_) | Self::Internal(_) | Self::Gateway(_) | Self::Storage(_) => true,
            _ => false,
        };
        if capture {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::AlreadyRegistered => StatusCode::CONFLICT,
                AuthError::InvalidPhone(_) | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Subscription(err) => match err {
                SubscriptionError::NotAPaidTier(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Gateway(_) | Self::Storage(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Gateway(_) => "Payment service error".to_string(),
            Self::Storage(_) => "Storage service error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::AlreadyRegistered => {
                    "An account with this phone number already exists".to_string()
                }
                AuthError::InvalidPhone(e) => e.to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                _ => "Authentication error".to_string(),
            },
            Self::Subscription(SubscriptionError::NotAPaidTier(tier)) => {
                format!("{tier} is not a payable tier")
            }
            Self::Subscription(_) => "Subscription error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("customer".to_string());
        assert_eq!(err.to_string(), "Not found: customer");

        let err = AppError::Validation("phone must be 11 digits".to_string());
        assert_eq!(err.to_string(), "Validation error: phone must be 11 digits");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Validation("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_deletion_error_mapping() {
        assert!(matches!(
            AppError::from(DeletionError::NotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(DeletionError::Unauthorized),
            AppError::Unauthorized(_)
        ));
    }
}
