//! Default HTTP transport
//!
//! Sends merged options with reqwest, reading fetch-style keys:
//! `method`, `headers`, `body`, `redirect`, `follow`, `timeout` and `size`.
//! Browser-only keys such as `credentials`, `mode` or `cache` have no
//! meaning outside a browser and are ignored.

use crate::error::FetchError;
use crate::options::{RequestOptions, HEADERS_KEY};
use crate::transport::{Response, Transport};
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{trace, warn};
use url::Url;

/// Connect timeout unless configured otherwise
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Redirects followed when `follow` is not set
const DEFAULT_MAX_REDIRECTS: usize = 20;

/// Option keys this transport understands
const KNOWN_KEYS: &[&str] = &[
    "method", HEADERS_KEY, "body", "redirect", "follow", "timeout", "size",
];

/// How redirects are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum RedirectMode {
    /// Follow up to `follow` redirects
    #[default]
    Follow,
    /// Return the 3xx response as-is
    Manual,
    /// Fail on a 3xx response
    Error,
}

impl RedirectMode {
    fn from_options(options: &RequestOptions) -> Result<Self, FetchError> {
        match options.get("redirect") {
            None | Some(Value::Null) => Ok(RedirectMode::Follow),
            Some(Value::String(mode)) => match mode.as_str() {
                "follow" => Ok(RedirectMode::Follow),
                "manual" => Ok(RedirectMode::Manual),
                "error" => Ok(RedirectMode::Error),
                other => Err(FetchError::RequestError(format!(
                    "Invalid redirect mode: {other}"
                ))),
            },
            Some(other) => Err(FetchError::RequestError(format!(
                "Invalid redirect mode: {other}"
            ))),
        }
    }
}

/// Builder for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct HttpTransportBuilder {
    user_agent: String,
    connect_timeout: Duration,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl HttpTransportBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set User-Agent sent when options carry none
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Build the transport
    pub fn build(self) -> HttpTransport {
        HttpTransport {
            user_agent: self.user_agent,
            connect_timeout: self.connect_timeout,
        }
    }
}

/// reqwest-backed transport
///
/// Non-2xx responses are returned as normal responses; only transport
/// failures become errors.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    user_agent: String,
    connect_timeout: Duration,
}

impl Default for HttpTransport {
    fn default() -> Self {
        HttpTransportBuilder::new().build()
    }
}

impl HttpTransport {
    /// Create a transport with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport builder
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// User-Agent sent when options carry none
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, url: String, options: RequestOptions) -> Result<Response, FetchError> {
        if url.is_empty() {
            return Err(FetchError::MissingUrl);
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(FetchError::InvalidUrlScheme);
        }
        let parsed_url = Url::parse(&url).map_err(|_| FetchError::InvalidUrlScheme)?;

        for (key, _) in &options {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                trace!(option = %key, "Ignoring option not supported by http transport");
            }
        }

        let method = parse_method(&options)?;
        let mut headers = build_headers(&options)?;
        if !headers.contains_key(USER_AGENT) {
            let user_agent = HeaderValue::from_str(&self.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT));
            headers.insert(USER_AGENT, user_agent);
        }
        let body = encode_body(&options, &mut headers)?;

        let redirect = RedirectMode::from_options(&options)?;
        let policy = match redirect {
            RedirectMode::Follow => Policy::limited(
                u64_option(&options, "follow")
                    .map(|n| n as usize)
                    .unwrap_or(DEFAULT_MAX_REDIRECTS),
            ),
            RedirectMode::Manual | RedirectMode::Error => Policy::none(),
        };

        // Build client
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .redirect(policy);
        if let Some(ms) = u64_option(&options, "timeout").filter(|ms| *ms > 0) {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder.build().map_err(FetchError::ClientBuildError)?;

        let mut request = client.request(method, parsed_url.clone()).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if redirect == RedirectMode::Error && status.is_redirection() {
            return Err(FetchError::RedirectNotAllowed);
        }

        let redirected = response.url() != &parsed_url;
        let final_url = response.url().to_string();
        let resp_headers = collect_headers(response.headers());

        let limit = u64_option(&options, "size").filter(|n| *n > 0);
        if let (Some(limit), Some(length)) = (limit, response.content_length()) {
            if length > limit {
                return Err(FetchError::BodyTooLarge(limit));
            }
        }
        let body = read_body(response, limit).await?;

        Ok(Response {
            url: final_url,
            status: status.as_u16(),
            headers: resp_headers,
            body,
            redirected,
        })
    }
}

/// Read a non-negative integer option
fn u64_option(options: &RequestOptions, key: &str) -> Option<u64> {
    options.get(key).and_then(Value::as_u64)
}

/// Parse the `method` option, defaulting to GET
fn parse_method(options: &RequestOptions) -> Result<Method, FetchError> {
    match options.get("method") {
        None | Some(Value::Null) => Ok(Method::GET),
        Some(Value::String(method)) => Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| FetchError::InvalidMethod(method.clone())),
        Some(other) => Err(FetchError::InvalidMethod(other.to_string())),
    }
}

/// Convert the `headers` option into a header map
fn build_headers(options: &RequestOptions) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    let Some(map) = options.header_map() else {
        return Ok(headers);
    };

    for (name, value) in map {
        let value = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return Err(FetchError::InvalidHeader(name.clone())),
        };
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| FetchError::InvalidHeader(name.clone()))?;
        let header_value =
            HeaderValue::from_str(&value).map_err(|_| FetchError::InvalidHeader(name.clone()))?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

/// Encode the `body` option
///
/// Strings are sent as-is. Other JSON values are serialized, with a JSON
/// content type unless one was already set.
fn encode_body(
    options: &RequestOptions,
    headers: &mut HeaderMap,
) -> Result<Option<Bytes>, FetchError> {
    match options.get("body") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(Bytes::from(text.clone()))),
        Some(value) => {
            let encoded =
                serde_json::to_vec(value).map_err(|e| FetchError::RequestError(e.to_string()))?;
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            Ok(Some(Bytes::from(encoded)))
        }
    }
}

/// Flatten response headers, joining repeated values
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    collected
}

/// Read the response body, enforcing an optional size limit
async fn read_body(response: reqwest::Response, limit: Option<u64>) -> Result<Bytes, FetchError> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|e| {
            warn!("Error reading body chunk: {}", e);
            FetchError::from_reqwest(e)
        })?;
        body.extend_from_slice(&bytes);
        if let Some(limit) = limit {
            if body.len() as u64 > limit {
                return Err(FetchError::BodyTooLarge(limit));
            }
        }
    }

    Ok(Bytes::from(body))
}
