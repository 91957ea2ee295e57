//! Gofor - fetch with default options
//!
//! This crate wraps a fetch-style transport with a set of default request
//! options. Defaults are fixed when a [`Gofor`] is built, either as a static
//! JSON object or as a producer called on every request. Per-request options
//! are merged over them: top-level keys replace defaults, while `headers` is
//! merged header by header with the request winning.
//!
//! ## Example
//!
//! ```ignore
//! use gofor::{Gofor, RequestOptions};
//! use serde_json::json;
//!
//! let client = Gofor::with_defaults(json!({
//!     "credentials": "same-origin",
//!     "headers": {"Accept": "application/json"}
//! }));
//!
//! let response = client
//!     .fetch("https://example.com/api", RequestOptions::new().header("Accept", "text/plain"))?
//!     .await?;
//! ```
//!
//! ## Transports
//!
//! Requests are sent through a [`Transport`]:
//! - [`HttpTransport`] - reqwest-backed default
//! - [`transport_fn`] - adapts a closure, handy for tests and custom clients

pub mod client;
mod defaults;
mod error;
mod options;
pub mod transport;

pub use client::{gofor, gofor_with_transport, Gofor, GoforBuilder};
pub use defaults::DefaultsSource;
pub use error::{FetchError, GoforError};
pub use options::{RequestOptions, HEADERS_KEY};
pub use transport::{
    transport_fn, HttpTransport, HttpTransportBuilder, Response, ResponseFuture, Transport,
    TransportFn,
};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = "Gofor/0.1";
