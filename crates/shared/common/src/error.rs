//! Unified error handling for the auth service and its store client.
//!
//! Store failures on the lookup path pass through unchanged. Failures on the
//! creation path are narrowed to the variants callers are allowed to see.

use std::time::Duration;

use domain::DomainError;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Validation
    #[error("{0}")]
    Validation(String),

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    // Creation orchestration
    #[error("User creation failed")]
    CreationFailed,

    #[error("Creation subscription failed: {0}")]
    Subscription(String),

    #[error("User creation was not confirmed within {0:?}")]
    ConfirmationTimeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,

    // Store errors
    #[error("Service unavailable")]
    ServiceUnavailable(String),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound => "NOT_FOUND",
            AppError::CreationFailed => "CREATION_FAILED",
            AppError::Subscription(_) => "SUBSCRIPTION_ERROR",
            AppError::ConfirmationTimeout(_) => "CONFIRMATION_TIMEOUT",
            AppError::Cancelled => "CANCELLED",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            // Show full message for client errors
            AppError::Validation(msg) => msg.clone(),

            // Hide details for internal errors
            AppError::Subscription(msg) => {
                tracing::error!("Subscription error: {}", msg);
                "Could not confirm user creation".to_string()
            }
            AppError::ServiceUnavailable(service) => {
                tracing::error!("Service unavailable: {}", service);
                format!("Service {} is unavailable", service)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            // Use default message for others
            _ => self.to_string(),
        }
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::Validation(msg),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn subscription(msg: impl Into<String>) -> Self {
        AppError::Subscription(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn service_unavailable(service: impl Into<String>) -> Self {
        AppError::ServiceUnavailable(service.into())
    }
}
