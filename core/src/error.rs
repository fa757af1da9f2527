//! Error types for the POEditor client.
//!
//! # Design
//! `InvalidArgument` is raised by `build_*` methods before any request
//! exists, so callers can rely on it meaning "nothing was sent". Every
//! failure the platform reports, whether through an HTTP status or a
//! `"fail"` envelope, lands in `Api` with the remote code and message
//! untouched. A body that is not the expected JSON is `Deserialization`,
//! never `Api`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by the POEditor client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required parameter was missing or malformed. No request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The platform rejected the request.
    ///
    /// `code` and `message` come from the reply's envelope; when a non-200
    /// reply has none, `code` is the HTTP status and `message` the body or
    /// reason phrase.
    #[error("Status '{status}', code {code}: {message}")]
    Api {
        status: String,
        code: String,
        message: String,
    },

    /// The request never completed: connection refused, DNS, timeout.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Remote error code for `Api` errors.
    pub fn remote_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Deserialization(err.to_string())
    }
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        Self::Network(err.to_string())
    }
}
