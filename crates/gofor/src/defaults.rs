//! Sources of default request options
//!
//! A source is either a fixed JSON value or a producer that is called on
//! every access. Nothing is cached, so a producer's latest output is always
//! what gets merged.

use crate::error::GoforError;
use crate::options::RequestOptions;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type Producer = Arc<dyn Fn() -> Value + Send + Sync>;

/// Where default options come from
#[derive(Clone, Default)]
pub enum DefaultsSource {
    /// No defaults: resolves to an empty mapping
    #[default]
    Empty,
    /// A fixed value, validated on every access
    Static(Value),
    /// A producer invoked on every access
    Deferred(Producer),
}

impl DefaultsSource {
    /// Create a deferred source from a producer
    pub fn deferred<F>(producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        DefaultsSource::Deferred(Arc::new(producer))
    }

    /// Resolve the source into options
    ///
    /// Fails with [`GoforError::TypeMismatch`] unless the value is a JSON object.
    pub fn resolve(&self) -> Result<RequestOptions, GoforError> {
        match self {
            DefaultsSource::Empty => Ok(RequestOptions::new()),
            DefaultsSource::Static(value) => RequestOptions::try_from(value.clone()),
            DefaultsSource::Deferred(producer) => RequestOptions::try_from(producer()),
        }
    }

    /// True if this source calls a producer on each access
    pub fn is_deferred(&self) -> bool {
        matches!(self, DefaultsSource::Deferred(_))
    }
}

impl fmt::Debug for DefaultsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultsSource::Empty => f.write_str("Empty"),
            DefaultsSource::Static(value) => f.debug_tuple("Static").field(value).finish(),
            DefaultsSource::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<Value> for DefaultsSource {
    fn from(value: Value) -> Self {
        DefaultsSource::Static(value)
    }
}

impl From<RequestOptions> for DefaultsSource {
    fn from(options: RequestOptions) -> Self {
        DefaultsSource::Static(options.into())
    }
}

impl From<Option<RequestOptions>> for DefaultsSource {
    fn from(options: Option<RequestOptions>) -> Self {
        options.map(Into::into).unwrap_or_default()
    }
}
