//! Error types for Gofor

use thiserror::Error;

/// Errors raised while resolving or applying default options
///
/// These are returned synchronously, before any request reaches the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GoforError {
    /// Resolved defaults are not a JSON object
    #[error("Defaults must resolve to an object, got {found}")]
    TypeMismatch {
        /// JSON type that was found instead
        found: &'static str,
    },

    /// Defaults were reassigned after construction
    #[error("Defaults are immutable: construct a new instance to change them")]
    ImmutableAssignment,
}

/// Errors that can occur while a transport performs a request
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL is missing
    #[error("Missing required parameter: url")]
    MissingUrl,

    /// URL has invalid scheme
    #[error("Invalid URL: must start with http:// or https://")]
    InvalidUrlScheme,

    /// Invalid HTTP method in options
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// Header name or value cannot be sent
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    ConnectError(#[source] reqwest::Error),

    /// Server redirected while `redirect` was set to `error`
    #[error("Redirect not allowed: redirect mode is set to error")]
    RedirectNotAllowed,

    /// Response body exceeded the `size` limit
    #[error("Response body exceeds size limit of {0} bytes")]
    BodyTooLarge(u64),

    /// Other request error
    #[error("Request failed: {0}")]
    RequestError(String),
}

impl FetchError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::ConnectError(err)
        } else {
            FetchError::RequestError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            GoforError::TypeMismatch { found: "null" }.to_string(),
            "Defaults must resolve to an object, got null"
        );
        assert_eq!(
            GoforError::ImmutableAssignment.to_string(),
            "Defaults are immutable: construct a new instance to change them"
        );
        assert_eq!(
            FetchError::MissingUrl.to_string(),
            "Missing required parameter: url"
        );
        assert_eq!(
            FetchError::InvalidUrlScheme.to_string(),
            "Invalid URL: must start with http:// or https://"
        );
        assert_eq!(
            FetchError::InvalidMethod("BAD METHOD".to_string()).to_string(),
            "Invalid method: BAD METHOD"
        );
        assert_eq!(
            FetchError::BodyTooLarge(10).to_string(),
            "Response body exceeds size limit of 10 bytes"
        );
    }
}
