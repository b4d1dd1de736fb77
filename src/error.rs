//! Error types for parallel-ingest
//!
//! Two levels of failure exist:
//! - [`Error`] - call-level failures (invalid configuration, upload handling,
//!   server errors). These abort the operation that returned them.
//! - [`TaskFailure`] - item-level failures inside a batch. These never abort a
//!   batch; the executor turns them into a failed [`TaskResult`].
//!
//! API integration goes through [`ToHttpStatus`] and the [`ApiError`] body.

use crate::types::TaskResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for parallel-ingest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for parallel-ingest
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_workers")
        key: Option<String>,
    },

    /// An ingest request carried no files
    #[error("no files uploaded")]
    NoUploads,

    /// An upload could not be read from the request
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    /// The knowledge-base ingester rejected a document
    #[error("ingest error: {0}")]
    Ingest(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Why a single item in a batch did not produce a successful result
///
/// The `Display` text becomes [`TaskResult::message`]. A processing function
/// error is reported verbatim so callers see the original cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskFailure {
    /// The processing function returned an error
    #[error("{0}")]
    Failed(String),

    /// The processing function panicked
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The processing function exceeded the per-item timeout
    #[error("timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    /// The batch was cancelled before this item completed
    #[error("cancelled")]
    Cancelled,
}

impl From<TaskFailure> for TaskResult {
    fn from(failure: TaskFailure) -> Self {
        TaskResult::failure(failure.to_string())
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "no_uploads",
///     "message": "no files uploaded"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "config_error", "invalid_upload")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::NoUploads => 400,
            Error::InvalidUpload(_) => 400,

            // 422 Unprocessable Entity - the document itself was rejected
            Error::Ingest(_) => 422,

            // 500 Internal Server Error - Server-side issues
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::NoUploads => "no_uploads",
            Error::InvalidUpload(_) => "invalid_upload",
            Error::Ingest(_) => "ingest_error",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let mut api_error = ApiError::new(error.error_code(), error.to_string());

        if let Error::Config { key: Some(key), .. } = &error {
            api_error.error.details = Some(serde_json::json!({
                "key": key,
            }));
        }

        api_error
    }
}
