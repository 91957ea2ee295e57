//! Request options and the defaults merge
//!
//! Options are a JSON object of fetch-style keys (`headers`, `method`,
//! `credentials`, ...). Only `headers` gets a nested merge; every other key
//! is replaced wholesale by the per-request value.

use crate::error::GoforError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key whose mapping is merged entry by entry
pub const HEADERS_KEY: &str = "headers";

/// Fetch-style request options
///
/// A thin wrapper over a JSON object. Unknown keys are kept as-is so they
/// reach the transport untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestOptions(Map<String, Value>);

impl RequestOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary top-level option
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set a single header, keeping any other headers already present
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let entry = self
            .0
            .entry(HEADERS_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(headers) = entry {
            headers.insert(name.into(), Value::String(value.into()));
        }
        self
    }

    /// Set several headers at once
    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(self, |options, (name, value)| options.header(name, value))
    }

    /// Set the HTTP method
    pub fn method(self, method: impl Into<String>) -> Self {
        self.set("method", method.into())
    }

    /// Set the request body
    ///
    /// Strings are sent verbatim; other JSON values are serialized.
    pub fn body(self, body: impl Into<Value>) -> Self {
        self.set("body", body)
    }

    /// Set the credentials mode (`omit`, `same-origin`, `include`)
    pub fn credentials(self, credentials: impl Into<String>) -> Self {
        self.set("credentials", credentials.into())
    }

    /// Get a top-level option
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a top-level option as a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Header mapping, if `headers` is an object
    pub fn header_map(&self) -> Option<&Map<String, Value>> {
        self.0.get(HEADERS_KEY).and_then(Value::as_object)
    }

    /// Get a header value by exact name
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.header_map()
            .and_then(|headers| headers.get(name))
            .and_then(Value::as_str)
    }

    /// Check whether a top-level option is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// True if no options are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of top-level options
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Merge `overrides` on top of `self`, returning new options
    ///
    /// Top-level keys from `overrides` replace those in `self`, except
    /// `headers`, which is merged per header name with `overrides` winning.
    /// Header names match case-insensitively, so an override replaces a
    /// default spelled with different case. A non-object `headers` in
    /// `overrides` contributes no headers. Neither input is modified.
    pub fn merged_with(&self, overrides: &RequestOptions) -> RequestOptions {
        let mut merged = self.0.clone();
        for (key, value) in &overrides.0 {
            if key != HEADERS_KEY {
                merged.insert(key.clone(), value.clone());
            }
        }

        if overrides.contains_key(HEADERS_KEY) {
            let mut headers = self.header_map().cloned().unwrap_or_default();
            for (name, value) in overrides.header_map().into_iter().flatten() {
                headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
                headers.insert(name.clone(), value.clone());
            }
            merged.insert(HEADERS_KEY.to_string(), Value::Object(headers));
        }

        RequestOptions(merged)
    }
}

impl From<Map<String, Value>> for RequestOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<RequestOptions> for Value {
    fn from(options: RequestOptions) -> Self {
        Value::Object(options.0)
    }
}

impl TryFrom<Value> for RequestOptions {
    type Error = GoforError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(GoforError::TypeMismatch {
                found: json_type_name(&other),
            }),
        }
    }
}

impl<'a> IntoIterator for &'a RequestOptions {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Name of a JSON value's type, for error messages
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> RequestOptions {
        RequestOptions::try_from(value).unwrap()
    }

    #[test]
    fn test_merge_precedence() {
        let defaults = options(json!({
            "headers": {"A": "1", "B": "2"},
            "credentials": "same-origin"
        }));
        let request = options(json!({"headers": {"B": "X"}}));

        let merged = defaults.merged_with(&request);
        assert_eq!(
            Value::from(merged),
            json!({
                "headers": {"A": "1", "B": "X"},
                "credentials": "same-origin"
            })
        );
    }

    #[test]
    fn test_merge_empty_request_keeps_defaults() {
        let defaults = options(json!({"headers": {"A": "1"}, "mode": "cors"}));
        let merged = defaults.merged_with(&RequestOptions::new());
        assert_eq!(merged, defaults);
    }

    #[test]
    fn test_merge_does_not_add_headers_key() {
        let defaults = options(json!({"credentials": "include"}));
        let merged = defaults.merged_with(&options(json!({"method": "POST"})));
        assert!(!merged.contains_key(HEADERS_KEY));
        assert_eq!(merged.get_str("method"), Some("POST"));
        assert_eq!(merged.get_str("credentials"), Some("include"));
    }

    #[test]
    fn test_merge_headers_only_on_one_side() {
        let defaults = options(json!({"headers": {"Accept": "application/json"}}));
        let merged = defaults.merged_with(&options(json!({"method": "PUT"})));
        assert_eq!(merged.header_value("Accept"), Some("application/json"));

        let merged = RequestOptions::new().merged_with(&defaults);
        assert_eq!(merged.header_value("Accept"), Some("application/json"));
    }

    #[test]
    fn test_merge_other_nested_keys_replaced_wholesale() {
        let defaults = options(json!({"agent": {"keepAlive": true, "maxSockets": 4}}));
        let merged = defaults.merged_with(&options(json!({"agent": {"maxSockets": 8}})));
        assert_eq!(merged.get("agent"), Some(&json!({"maxSockets": 8})));
    }

    #[test]
    fn test_merge_non_object_headers_keep_defaults() {
        let defaults = options(json!({"headers": {"A": "1"}}));
        let merged = defaults.merged_with(&options(json!({"headers": null})));
        assert_eq!(merged.get(HEADERS_KEY), Some(&json!({"A": "1"})));

        let merged = defaults.merged_with(&options(json!({"headers": "bogus"})));
        assert_eq!(merged.get(HEADERS_KEY), Some(&json!({"A": "1"})));

        let merged = RequestOptions::new().merged_with(&options(json!({"headers": null})));
        assert_eq!(merged.get(HEADERS_KEY), Some(&json!({})));
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let defaults = options(json!({"headers": {"A": "1"}}));
        let request = options(json!({"headers": {"B": "2"}}));
        let _ = defaults.merged_with(&request);
        assert_eq!(Value::from(defaults), json!({"headers": {"A": "1"}}));
        assert_eq!(Value::from(request), json!({"headers": {"B": "2"}}));
    }

    #[test]
    fn test_header_override_ignores_name_case() {
        let defaults = RequestOptions::new()
            .header("content-type", "application/json")
            .header("Accept", "application/json");
        let request = RequestOptions::new().header("Content-Type", "text/plain");

        let merged = defaults.merged_with(&request);
        assert_eq!(
            merged.get(HEADERS_KEY),
            Some(&json!({"Content-Type": "text/plain", "Accept": "application/json"}))
        );

        let request = RequestOptions::new().header("ACCEPT", "text/html");
        let merged = defaults.merged_with(&request);
        assert_eq!(merged.header_value("ACCEPT"), Some("text/html"));
        assert_eq!(merged.header_value("Accept"), None);
        assert_eq!(merged.header_map().map(|h| h.len()), Some(2));
    }

    #[test]
    fn test_iterate_options() {
        let opts = RequestOptions::new().method("GET").credentials("omit");
        let keys: Vec<&str> = (&opts).into_iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["credentials", "method"]);
    }

    #[test]
    fn test_builder_setters() {
        let opts = RequestOptions::new()
            .method("POST")
            .credentials("include")
            .headers([("Accept", "text/plain"), ("X-Trace", "abc")])
            .body(json!({"name": "gofor"}));

        assert_eq!(opts.get_str("method"), Some("POST"));
        assert_eq!(opts.get_str("credentials"), Some("include"));
        assert_eq!(opts.header_value("Accept"), Some("text/plain"));
        assert_eq!(opts.header_value("X-Trace"), Some("abc"));
        assert_eq!(opts.get("body"), Some(&json!({"name": "gofor"})));
        assert_eq!(opts.len(), 4);
    }

    #[test]
    fn test_header_replaces_non_object_headers() {
        let opts = RequestOptions::new().set("headers", "bogus").header("A", "1");
        assert_eq!(opts.header_value("A"), Some("1"));
    }

    #[test]
    fn test_try_from_rejects_non_objects() {
        assert_eq!(
            RequestOptions::try_from(Value::Null),
            Err(GoforError::TypeMismatch { found: "null" })
        );
        assert_eq!(
            RequestOptions::try_from(json!("")),
            Err(GoforError::TypeMismatch { found: "string" })
        );
        assert_eq!(
            RequestOptions::try_from(json!([1, 2])),
            Err(GoforError::TypeMismatch { found: "array" })
        );
    }

    #[test]
    fn test_serde_transparent() {
        let opts: RequestOptions =
            serde_json::from_str(r#"{"credentials":"omit","headers":{"A":"1"}}"#).unwrap();
        assert_eq!(opts.get_str("credentials"), Some("omit"));
        assert_eq!(
            serde_json::to_value(&opts).unwrap(),
            json!({"credentials": "omit", "headers": {"A": "1"}})
        );
    }
}
