//! Error types for the SDK.
//!
//! # Design
//! `Unauthenticated` means the session is gone: the access token was rejected
//! and no refresh was possible, so storage has already been cleared. Every
//! other non-2xx response lands in `Http` with the status code and the parsed
//! body (JSON when parseable, otherwise the raw text as a JSON string).
//! Absence of a stored token is never an error anywhere in the crate.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

/// Errors returned by `HttpClient` and `ApiClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The access token was rejected and could not be refreshed.
    #[error("UNAUTHENTICATED")]
    Unauthenticated,

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}")]
    Http { status: u16, body: Value },

    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("{0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body did not match the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// HTTP status for `Http` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parsed error body for `Http` errors.
    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    /// True for a 401 response or a failed refresh.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthenticated | ApiError::Http { status: 401, .. })
    }
}

/// Failures of a token storage backend. Missing tokens are `Ok(None)`, not
/// errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("token file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token file {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("secure store: {0}")]
    Backend(String),
}

/// Invalid or missing backend configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("baseUrl is required")]
    MissingBaseUrl,

    #[error("invalid timeout {value:?}: expected whole seconds")]
    InvalidTimeout { value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unauthenticated_displays_sentinel() {
        assert_eq!(ApiError::Unauthenticated.to_string(), "UNAUTHENTICATED");
    }

    #[test]
    fn http_error_displays_status() {
        let err = ApiError::Http {
            status: 422,
            body: json!({ "detail": "bad" }),
        };
        assert_eq!(err.to_string(), "HTTP 422");
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.body().unwrap()["detail"], "bad");
    }

    #[test]
    fn unauthorized_classification() {
        assert!(ApiError::Unauthenticated.is_unauthorized());
        assert!(ApiError::Http { status: 401, body: Value::Null }.is_unauthorized());
        assert!(!ApiError::Http { status: 403, body: Value::Null }.is_unauthorized());
        assert!(!ApiError::Transport("reset".into()).is_unauthorized());
    }
}
