//! Request and response model shared by storage, network and policy.

use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

/// How the page issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level document navigation.
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
    /// Value of the `Accept` header, if any.
    pub accept: Option<String>,
}

impl Request {
    /// A plain `GET` sub-resource request.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".to_string(), url, mode: RequestMode::default(), accept: None }
    }

    /// A `GET` navigation request, as issued when the page loads a document.
    pub fn navigate(url: Url) -> Self {
        Self { method: "GET".to_string(), url, mode: RequestMode::Navigate, accept: Some("text/html".to_string()) }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Whether the `Accept` header asks for an HTML document.
    pub fn accepts_html(&self) -> bool {
        self.accept
            .as_deref()
            .is_some_and(|accept| accept.to_ascii_lowercase().contains("text/html"))
    }

    /// Cache key for this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::from_url(&self.url)
    }
}

/// Lookup key of a stored entry.
///
/// Fragments never take part in matching. `without_query` is the form used
/// when a lookup ignores query-string differences.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub url: String,
    pub without_query: String,
}

impl RequestKey {
    pub fn from_url(url: &Url) -> Self {
        let mut exact = url.clone();
        exact.set_fragment(None);

        let mut bare = exact.clone();
        bare.set_query(None);

        Self { url: exact.to_string(), without_query: bare.to_string() }
    }
}

/// A captured response.
///
/// The body is reference counted, so `clone()` duplicates the response
/// without copying the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Bytes>) -> Self {
        Self { url: url.into(), status, headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 2xx status.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}
