//! Defaults-aware request issuer
//!
//! [`Gofor`] holds a [`DefaultsSource`] fixed at construction and a
//! [`Transport`]. Every request merges its options over freshly resolved
//! defaults before being handed to the transport.

use crate::defaults::DefaultsSource;
use crate::error::GoforError;
use crate::options::RequestOptions;
use crate::transport::{HttpTransport, ResponseFuture, Transport};
use futures::FutureExt;
use std::fmt;
use std::sync::Arc;

/// Builder for [`Gofor`]
#[derive(Default)]
pub struct GoforBuilder {
    defaults: DefaultsSource,
    transport: Option<Arc<dyn Transport>>,
}

impl GoforBuilder {
    /// Create a builder with no defaults and the HTTP transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the defaults source
    pub fn defaults(mut self, source: impl Into<DefaultsSource>) -> Self {
        self.defaults = source.into();
        self
    }

    /// Set a producer that supplies defaults on every request
    pub fn defaults_fn<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> serde_json::Value + Send + Sync + 'static,
    {
        self.defaults = DefaultsSource::deferred(producer);
        self
    }

    /// Set the transport
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Build the request issuer
    pub fn build(self) -> Gofor {
        Gofor {
            source: self.defaults,
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(HttpTransport::new())),
        }
    }
}

/// Request issuer with immutable default options
///
/// Cheap to clone; clones share the same source and transport.
#[derive(Clone)]
pub struct Gofor {
    source: DefaultsSource,
    transport: Arc<dyn Transport>,
}

impl Default for Gofor {
    fn default() -> Self {
        GoforBuilder::new().build()
    }
}

impl fmt::Debug for Gofor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gofor")
            .field("source", &self.source)
            .field("transport", &self.transport.name())
            .finish()
    }
}

impl Gofor {
    /// Create an issuer with no defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an issuer with the given defaults and the HTTP transport
    pub fn with_defaults(source: impl Into<DefaultsSource>) -> Self {
        GoforBuilder::new().defaults(source).build()
    }

    /// Create a builder
    pub fn builder() -> GoforBuilder {
        GoforBuilder::new()
    }

    /// Resolve the current defaults
    ///
    /// Producers are called on every access. Fails with
    /// [`GoforError::TypeMismatch`] if the source is not an object.
    pub fn defaults(&self) -> Result<RequestOptions, GoforError> {
        self.source.resolve()
    }

    /// Attempt to replace the defaults
    ///
    /// Defaults are fixed for the lifetime of the instance, so this always
    /// fails with [`GoforError::ImmutableAssignment`] and changes nothing.
    pub fn replace_defaults(&self, _source: impl Into<DefaultsSource>) -> Result<(), GoforError> {
        Err(GoforError::ImmutableAssignment)
    }

    /// Merge request options over the resolved defaults
    ///
    /// Omitted options yield the defaults unchanged.
    pub fn set_options(
        &self,
        options: impl Into<Option<RequestOptions>>,
    ) -> Result<RequestOptions, GoforError> {
        let defaults = self.defaults()?;
        let merged = match options.into() {
            Some(options) => defaults.merged_with(&options),
            None => defaults,
        };
        tracing::debug!(keys = merged.len(), "Merged request options");
        Ok(merged)
    }

    /// Issue a request with merged options
    ///
    /// Defaults resolution errors are returned here, before the transport is
    /// called. The transport's outcome is only observable by awaiting the
    /// returned future.
    pub fn fetch(
        &self,
        url: impl Into<String>,
        options: impl Into<Option<RequestOptions>>,
    ) -> Result<ResponseFuture, GoforError> {
        let merged = self.set_options(options)?;
        let url = url.into();
        tracing::debug!(transport = self.transport.name(), url = %url, "Dispatching request");

        let transport = Arc::clone(&self.transport);
        Ok(async move { transport.send(url, merged).await }.boxed())
    }
}

/// Create a request function bound to `source`, using the HTTP transport
///
/// ```ignore
/// let gofor = gofor::gofor(serde_json::json!({"credentials": "same-origin"}));
/// let response = gofor("https://example.com", None)?.await?;
/// ```
pub fn gofor(
    source: impl Into<DefaultsSource>,
) -> impl Fn(&str, Option<RequestOptions>) -> Result<ResponseFuture, GoforError> + Send + Sync {
    bind(Gofor::with_defaults(source))
}

/// Create a request function bound to `source` and `transport`
pub fn gofor_with_transport<T: Transport + 'static>(
    source: impl Into<DefaultsSource>,
    transport: T,
) -> impl Fn(&str, Option<RequestOptions>) -> Result<ResponseFuture, GoforError> + Send + Sync {
    bind(
        GoforBuilder::new()
            .defaults(source)
            .transport(transport)
            .build(),
    )
}

fn bind(
    client: Gofor,
) -> impl Fn(&str, Option<RequestOptions>) -> Result<ResponseFuture, GoforError> + Send + Sync {
    move |url: &str, options: Option<RequestOptions>| client.fetch(url, options)
}
