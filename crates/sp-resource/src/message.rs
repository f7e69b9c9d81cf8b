//! Request and response model.
//!
//! The host framework owns the transport; resources only read a [`Request`]
//! and mutate the [`Response`] that belongs to it.

use std::borrow::Cow;

use http::header::{self, HeaderName};
use http::{HeaderMap, HeaderValue, StatusCode, Uri};
use serde_json::{Map, Value};

/// Response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Text body.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Structured value, serialized to JSON by JSON resources.
    Value(Value),
}

impl Body {
    /// The text of a [`Body::Text`] body, or `None` for other variants.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Incoming request as seen by a resource.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Request URI (path and querystring).
    pub uri: Uri,
    /// Request headers. Lookup is case-insensitive.
    pub headers: HeaderMap,
    /// Per-request flags set by the host or by logic pages
    /// (`enable_jsonp`, `enable_cors`, ...).
    pub context: Map<String, Value>,
}

impl Request {
    /// Create a request for `uri` with no headers.
    #[must_use]
    pub fn new(uri: Uri) -> Self {
        Self {
            uri,
            ..Self::default()
        }
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set a per-request flag.
    #[must_use]
    pub fn with_flag(mut self, name: &str, enabled: bool) -> Self {
        self.context.insert(name.to_owned(), Value::Bool(enabled));
        self
    }

    /// Value of the `Accept` header, if present and non-empty.
    ///
    /// Bytes that are not UTF-8 are replaced rather than dropping the header,
    /// so such a header still takes part in negotiation.
    #[must_use]
    pub fn accept(&self) -> Option<Cow<'_, str>> {
        self.headers
            .get(header::ACCEPT)
            .map(|value| String::from_utf8_lossy(value.as_bytes()))
            .filter(|value| !value.trim().is_empty())
    }

    /// First querystring value for `name`.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.uri.query()?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;
        pairs
            .into_iter()
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    /// Whether the per-request flag `name` is set to a truthy value.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.context.get(name).is_some_and(is_truthy)
    }

    /// File extension of the last path segment, without the dot.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let segment = self.uri.path().rsplit('/').next()?;
        let (stem, ext) = segment.rsplit_once('.')?;
        (!stem.is_empty() && !ext.is_empty()).then_some(ext)
    }
}

/// Truthiness of a flag value: `false`, `null`, `0`, `""`, `[]` and `{}` are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Outgoing response, mutated in place by resources.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code.
    pub status: StatusCode,
    /// Response body.
    pub body: Body,
    /// Response headers. Lookup is case-insensitive.
    pub headers: HeaderMap,
    /// Charset appended to `text/*` content types.
    pub charset: Option<String>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl Response {
    /// Create an empty response with the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            body: Body::default(),
            headers: HeaderMap::new(),
            charset: None,
        }
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the charset.
    #[must_use]
    pub fn with_charset(mut self, charset: Option<String>) -> Self {
        self.charset = charset;
        self
    }

    /// Value of the `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(&header::CONTENT_TYPE)
    }

    /// Value of a header as text.
    #[must_use]
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Replace a header value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }
}
