//! Tutor API error types

use thiserror::Error;

/// API error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InvalidRequest, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unknown, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Network issues, timeouts
    Network,
    /// Rate limited (429)
    RateLimit,
    /// Server error (5xx)
    ServerError,
    /// Authentication failed (401, 403)
    Auth,
    /// Bad request (400, 404, 422)
    InvalidRequest,
    /// Unknown error
    Unknown,
}

/// Classify an HTTP error response by status code
pub fn classify_status(status: reqwest::StatusCode, body: &str) -> ApiError {
    match status.as_u16() {
        401 | 403 => ApiError::auth(format!("Authentication failed: {body}")),
        429 => ApiError::rate_limit(format!("Rate limited: {body}")),
        400 | 404 | 422 => ApiError::invalid_request(format!("Invalid request: {body}")),
        500..=599 => ApiError::server_error(format!("Server error: {body}")),
        _ => ApiError::unknown(format!("HTTP {status}: {body}")),
    }
}

/// Classify a reqwest transport failure
pub fn classify_transport(e: &reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::network(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        ApiError::network(format!("Connection failed: {e}"))
    } else {
        ApiError::unknown(format!("Request failed: {e}"))
    }
}
