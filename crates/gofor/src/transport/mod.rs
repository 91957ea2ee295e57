//! Transport layer for sending merged requests
//!
//! Design: Gofor never performs I/O itself. A [`Transport`] receives the URL
//! and the merged options and returns a [`Response`]. [`HttpTransport`] is the
//! reqwest-backed default; [`transport_fn`] adapts a closure.

mod http;

pub use http::{HttpTransport, HttpTransportBuilder};

use crate::error::FetchError;
use crate::options::RequestOptions;
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;

/// Future returned by [`Gofor::fetch`](crate::Gofor::fetch)
pub type ResponseFuture = BoxFuture<'static, Result<Response, FetchError>>;

/// Trait for request transports
///
/// Implement this trait to route requests through a custom client.
/// Transports own the interpretation of options; keys they do not
/// understand should be ignored rather than rejected.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Unique identifier for this transport (for logging/debugging)
    fn name(&self) -> &'static str {
        "custom"
    }

    /// Perform the request
    async fn send(&self, url: String, options: RequestOptions) -> Result<Response, FetchError>;
}

/// Transport backed by a closure
///
/// Created with [`transport_fn`].
#[derive(Clone)]
pub struct TransportFn<F> {
    f: F,
}

/// Wrap a closure as a [`Transport`]
pub fn transport_fn<F, Fut>(f: F) -> TransportFn<F>
where
    F: Fn(String, RequestOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, FetchError>> + Send + 'static,
{
    TransportFn { f }
}

#[async_trait]
impl<F, Fut> Transport for TransportFn<F>
where
    F: Fn(String, RequestOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, FetchError>> + Send + 'static,
{
    fn name(&self) -> &'static str {
        "fn"
    }

    async fn send(&self, url: String, options: RequestOptions) -> Result<Response, FetchError> {
        (self.f)(url, options).await
    }
}

/// Response from a transport
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Final URL after redirects
    pub url: String,

    /// HTTP status code
    pub status: u16,

    /// Response headers, names lower-cased
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Raw response body
    #[serde(default, skip_serializing_if = "Bytes::is_empty")]
    pub body: Bytes,

    /// True if the request was redirected
    #[serde(default)]
    pub redirected: bool,
}

impl Response {
    /// Create a response with the given URL and status
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            status,
            ..Default::default()
        }
    }

    /// Set the body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a header
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// True for 2xx statuses
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_helpers() {
        let resp = Response::new("https://example.com", 200)
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"ok":true}"#);

        assert!(resp.ok());
        assert_eq!(resp.header("content-type"), Some("application/json"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(resp.text(), r#"{"ok":true}"#);
        assert_eq!(resp.json::<serde_json::Value>().unwrap(), json!({"ok": true}));
    }

    #[test]
    fn test_response_not_ok() {
        assert!(!Response::new("https://example.com", 404).ok());
        assert!(!Response::new("https://example.com", 301).ok());
        assert!(Response::new("https://example.com", 204).ok());
    }

    #[tokio::test]
    async fn test_transport_fn_passes_arguments() {
        let transport = transport_fn(|url, options: RequestOptions| async move {
            let status = if options.get_str("method") == Some("HEAD") { 204 } else { 200 };
            Ok::<_, FetchError>(Response::new(url, status))
        });

        let resp = transport
            .send(
                "https://example.com".to_string(),
                RequestOptions::new().method("HEAD"),
            )
            .await
            .unwrap();
        assert_eq!(resp.url, "https://example.com");
        assert_eq!(resp.status, 204);
        assert_eq!(transport.name(), "fn");
    }
}
