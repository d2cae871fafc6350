//! Structured error handling shared by the gRPC and REST adapters.
//!
//! Every failure in the service is an [`AppError`]. Adapters translate it into
//! a transport status: [`tonic::Status`] via `From`, HTTP via
//! [`AppError::http_status`]. Internal details are logged but never exposed to
//! clients.

use std::fmt::Display;

use http::StatusCode;
use thiserror::Error;
use tonic::Status;
use tracing::error;

/// Non-standard "client closed request" status used for cancelled calls.
const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Application error type with automatic Status conversion.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Internal: {0}")]
    Internal(String),

    /// Storage aborted the call: the statement was cancelled server-side or the
    /// pool closed during shutdown. A caller that disconnects simply drops the future.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),
}

impl AppError {
    /// Create a validation error for a single field.
    pub fn invalid(field: &str, description: impl Display) -> Self {
        Self::InvalidArgument(format!("{field}: {description}"))
    }

    /// Create a not found error for an entity.
    pub fn not_found(entity: &str, id: impl Display) -> Self {
        Self::NotFound(format!("{entity} not found: {id}"))
    }

    /// Create a conflict error for duplicate data.
    #[must_use]
    pub fn conflict(entity: &str, field: &str) -> Self {
        Self::AlreadyExists(format!("{entity} with this {field} already exists"))
    }

    /// HTTP status code for the REST adapter.
    #[must_use]
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidCredentials | Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cancelled(_) => StatusCode::from_u16(CLIENT_CLOSED_REQUEST)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Message safe to return to clients.
    ///
    /// Storage and internal failures are logged and replaced with a generic text.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Unavailable(msg) => {
                error!(error = %msg, "Storage error");
                "Internal server error".to_string()
            }
            Self::Internal(msg) => {
                error!(error = %msg, "Internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<AppError> for Status {
    fn from(error: AppError) -> Self {
        match &error {
            AppError::InvalidArgument(_) => Status::invalid_argument(error.to_string()),
            AppError::NotFound(msg) => Status::not_found(msg),
            AppError::InvalidCredentials => Status::unauthenticated("Invalid credentials"),
            AppError::Unauthenticated(msg) => Status::unauthenticated(msg),
            AppError::AlreadyExists(msg) => Status::already_exists(msg),
            AppError::Unavailable(_) | AppError::Internal(_) => {
                Status::internal(error.public_message())
            }
            AppError::Cancelled(msg) => Status::cancelled(msg),
            AppError::DeadlineExceeded(msg) => Status::deadline_exceeded(msg),
        }
    }
}

/// Extension trait for converting foreign errors into [`AppError::Internal`] with logging.
pub trait ErrorExt<T> {
    /// Convert error to an internal [`AppError`], logging the original.
    fn internal(self, msg: &'static str) -> Result<T, AppError>;
}

impl<T, E: Display> ErrorExt<T> for Result<T, E> {
    fn internal(self, msg: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            error!(error = %e, "{msg}");
            AppError::Internal(msg.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_helper_formats_correctly() {
        let err = AppError::not_found("Book", 42);
        assert!(err.to_string().contains("Book"));
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn conflict_helper_formats_correctly() {
        let err = AppError::conflict("User", "email");
        assert!(err.to_string().contains("User"));
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn status_conversion_maps_correctly() {
        assert_eq!(
            Status::from(AppError::invalid("title", "must not be empty")).code(),
            tonic::Code::InvalidArgument
        );
        assert_eq!(
            Status::from(AppError::NotFound("test".to_string())).code(),
            tonic::Code::NotFound
        );
        assert_eq!(
            Status::from(AppError::InvalidCredentials).code(),
            tonic::Code::Unauthenticated
        );
        assert_eq!(
            Status::from(AppError::Unauthenticated("test".to_string())).code(),
            tonic::Code::Unauthenticated
        );
        assert_eq!(
            Status::from(AppError::AlreadyExists("test".to_string())).code(),
            tonic::Code::AlreadyExists
        );
        assert_eq!(
            Status::from(AppError::Unavailable("test".to_string())).code(),
            tonic::Code::Internal
        );
        assert_eq!(
            Status::from(AppError::Cancelled("test".to_string())).code(),
            tonic::Code::Cancelled
        );
        assert_eq!(
            Status::from(AppError::DeadlineExceeded("test".to_string())).code(),
            tonic::Code::DeadlineExceeded
        );
    }

    #[test]
    fn http_status_maps_correctly() {
        assert_eq!(
            AppError::invalid("year", "must not be zero").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("Book", 1).http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidCredentials.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::conflict("User", "email").http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Unavailable("db down".to_string()).http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Cancelled("gone".to_string()).http_status().as_u16(),
            499
        );
        assert_eq!(
            AppError::DeadlineExceeded("slow".to_string()).http_status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn storage_details_are_not_exposed() {
        let status = Status::from(AppError::Unavailable("password=hunter2".to_string()));
        assert!(!status.message().contains("hunter2"));
    }
}
