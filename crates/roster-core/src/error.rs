//! Client-level error types.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Structured error built from a non-2xx HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub message: String,
    pub errors: Vec<String>,
    /// Derived code, always `HTTP_<status>`.
    pub code: String,
    pub status: u16,
    pub timestamp: DateTime<Utc>,
}

impl ApiError {
    pub fn from_status(status: u16, message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            message: message.into(),
            errors,
            code: format!("HTTP_{}", status),
            status,
            timestamp: Utc::now(),
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)?;
        if !self.errors.is_empty() {
            write!(f, ": {}", self.errors.join(", "))?;
        }
        Ok(())
    }
}

/// Failures surfaced by the request wrapper.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No internet connection")]
    Offline,

    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("{0}")]
    Http(ApiError),

    #[error("Connection failed: {0}")]
    Connection(String),

    /// 2xx response whose envelope reports `success: false`.
    #[error("{}", .errors.join(", "))]
    Rejected {
        message: Option<String>,
        errors: Vec<String>,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ClientError {
    /// Transient failures eligible for automatic retry:
    /// offline, timeout, 5xx, 429, and connection-level errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Offline | ClientError::Timeout(_) | ClientError::Connection(_) => true,
            ClientError::Http(e) => e.is_server_error() || e.is_rate_limited(),
            _ => false,
        }
    }

    /// HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http(e) => Some(e.status),
            _ => None,
        }
    }

    /// Messages to show a user, one per line.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ClientError::Http(e) if !e.errors.is_empty() => e.errors.clone(),
            ClientError::Http(e) => vec![e.message.clone()],
            ClientError::Rejected { errors, .. } => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// File selection failures. Field-scoped and recoverable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FileError {
    #[error("Unsupported file type: {mime}")]
    UnsupportedType { mime: String },

    #[error("File is too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("Failed to read file: {0}")]
    Read(String),
}

/// Key-value store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// Per-field validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("Validation failed: {}", .0.values().cloned().collect::<Vec<_>>().join(", "))]
pub struct ValidationErrors(pub BTreeMap<String, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ClientError::Offline.is_retryable());
        assert!(ClientError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(ClientError::Connection("reset".into()).is_retryable());
        assert!(ClientError::Http(ApiError::from_status(503, "down", vec![])).is_retryable());
        assert!(ClientError::Http(ApiError::from_status(429, "slow down", vec![])).is_retryable());

        assert!(!ClientError::Http(ApiError::from_status(404, "missing", vec![])).is_retryable());
        assert!(!ClientError::Http(ApiError::from_status(400, "bad", vec![])).is_retryable());
        assert!(!ClientError::Decode("eof".into()).is_retryable());
        assert!(
            !ClientError::Rejected {
                message: None,
                errors: vec!["Duplicate phone".into()]
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_api_error_code() {
        let err = ApiError::from_status(422, "Validation failed", vec!["Age is required".into()]);
        assert_eq!(err.code, "HTTP_422");
        assert_eq!(err.to_string(), "Validation failed (HTTP_422): Age is required");
    }
}
