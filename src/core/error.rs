// src/core/error.rs

use crate::core::response;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

lazy_static! {
    static ref IN_USE_PATTERN: Regex =
        Regex::new(r"(?i)\b(in use|being used|is using)\b").expect("static regex");
}

/// Every way a request can fail, from input validation to daemon rejections.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The daemon client was never initialized (socket missing at startup).
    #[error("Docker daemon is not connected: {0}")]
    NotConnected(String),

    /// The control socket could not be reached for this request.
    #[error("Docker daemon is unavailable: {0}")]
    DaemonUnavailable(String),

    /// The daemon answered with a non-2xx status.
    #[error("{message}")]
    DaemonError { status: u16, message: String },

    /// The daemon refused a delete because something still references the target.
    #[error("{0}")]
    ResourceInUse(String),

    #[error("{0}")]
    NotFound(String),

    /// Rejected before any daemon call.
    #[error("{0}")]
    InvalidInput(String),

    /// The daemon answered 2xx but the payload did not decode.
    #[error("Invalid response from Docker daemon: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::InvalidInput(message.into())
    }

    pub fn is_in_use(&self) -> bool {
        matches!(self, ApiError::ResourceInUse(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotConnected(_) | ApiError::DaemonUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::DaemonError { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::ResourceInUse(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        response::failure(self.status_code(), self.to_string(), self.is_in_use())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidResponse(err.to_string())
    }
}

/// Maps a rejected daemon call onto the error taxonomy.
///
/// Status codes decide first; the message is only inspected for 409 answers,
/// since the daemon also uses 409 for plain state conflicts such as pausing a
/// paused container.
pub fn classify(status: StatusCode, message: &str) -> ApiError {
    let message = message.trim().to_string();
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::CONFLICT if IN_USE_PATTERN.is_match(&message) => {
            ApiError::ResourceInUse(message)
        }
        _ => ApiError::DaemonError {
            status: status.as_u16(),
            message,
        },
    }
}
