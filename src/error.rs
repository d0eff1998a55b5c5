//! Error types
//!
//! Every fallible operation in the crate returns [`Error`]. Errors are handed
//! straight back to the caller; nothing here retries or swallows them.

use crate::api::http::DetailedResponse;
use reqwest::StatusCode;
use std::fmt;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for all client operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required credential or setting is missing or unusable
    #[error("{0}")]
    Configuration(String),

    /// The request URL could not be resolved
    #[error("{0}")]
    UrlResolution(String),

    /// A header or multi-part entry could not be turned into a request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A token endpoint rejected the credentials
    #[error("{0}")]
    Authentication(Box<AuthenticationError>),

    /// Network-level failure (connection refused, timeout, TLS)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The cancellation token attached to the request fired
    #[error("request cancelled")]
    Cancelled,

    /// A resource endpoint answered with an error status
    #[error("{message}")]
    RemoteApi {
        /// HTTP status returned by the server
        status: StatusCode,
        /// Message decoded from the error body, or a generic one
        message: String,
    },

    /// A successful response body was not the expected JSON
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// A request body could not be encoded as JSON
    #[error("failed to encode request body: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Reading a multi-part file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn url(message: impl Into<String>) -> Self {
        Self::UrlResolution(message.into())
    }

    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// HTTP status attached to the error, when the server produced one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Authentication(err) => Some(err.response.status_code),
            Self::RemoteApi { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// Returns the authentication failure details, if this is one
    pub fn as_authentication(&self) -> Option<&AuthenticationError> {
        match self {
            Self::Authentication(err) => Some(err),
            _ => None,
        }
    }
}

/// Returned when a token endpoint answers with a non-2xx status.
///
/// Carries the full response so callers can inspect the status, headers and
/// raw body the server sent.
#[derive(Debug)]
pub struct AuthenticationError {
    /// Human readable message (the raw body, or a synthesized one)
    pub message: String,
    /// The response that caused the failure; `result` is always `None`
    pub response: DetailedResponse,
}

impl AuthenticationError {
    pub fn new(response: DetailedResponse, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            response,
        }
    }
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AuthenticationError {}

impl From<AuthenticationError> for Error {
    fn from(err: AuthenticationError) -> Self {
        Self::Authentication(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use reqwest::header::HeaderMap;

    #[test]
    fn test_remote_api_displays_message_only() {
        let err = Error::RemoteApi {
            status: StatusCode::NOT_FOUND,
            message: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_authentication_error_keeps_response() {
        let response = DetailedResponse {
            status_code: StatusCode::UNAUTHORIZED,
            headers: HeaderMap::new(),
            result: None,
            raw_result: Bytes::from_static(b"bad credentials"),
        };
        let err: Error = AuthenticationError::new(response, "bad credentials").into();

        assert_eq!(err.to_string(), "bad credentials");
        let auth = err.as_authentication().unwrap();
        assert_eq!(auth.response.raw_result.as_ref(), b"bad credentials");
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    }
}
