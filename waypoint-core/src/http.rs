// HTTP request and response types

use crate::content_negotiation::{Accept, MediaType};
use crate::cookies::Cookie;
use crate::parameter::Value;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// HTTP methods understood by the route table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(clippy::upper_case_acronyms)]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
    TRACE,
    CONNECT,
}

impl HttpMethod {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "HEAD" => Some(HttpMethod::HEAD),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            "TRACE" => Some(HttpMethod::TRACE),
            "CONNECT" => Some(HttpMethod::CONNECT),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::TRACE => "TRACE",
            HttpMethod::CONNECT => "CONNECT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An already-parsed HTTP request.
///
/// The path is kept in its encoded form; query pairs are decoded when the
/// request is created. `data` is a request-scoped store that filters use to
/// hand values to action parameters.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub cookies: Vec<Cookie>,
    pub data: HashMap<String, Value<'static>>,
}

impl Request {
    /// Create a request from a method and a URI (path plus optional query string).
    pub fn new(method: HttpMethod, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, parse_query_string(query)),
            None => (uri, Vec::new()),
        };

        Self {
            method,
            path: path.to_string(),
            query,
            ..Default::default()
        }
    }

    /// Append a header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::debug!(header = name, "ignoring invalid header"),
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value<'static>>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// First value of a header (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// All values of a header, in the order they were received.
    pub fn headers(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// The request body mime type, without parameters (`text/plain; charset=utf-8` -> `text/plain`).
    pub fn content_type(&self) -> Option<String> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(MediaType::parse)
            .map(|mt| mt.mime_type())
    }

    /// The parsed `Accept` header, if the client sent one.
    pub fn accept(&self) -> Option<Accept> {
        let values: Vec<&str> = self
            .headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(Accept::parse(&values.join(",")))
        }
    }

    /// Whether the client accepts the given media type. A request without an
    /// `Accept` header accepts everything.
    pub fn accepts(&self, media_type: &MediaType) -> bool {
        self.accept().is_none_or(|accept| accept.accepts(media_type))
    }

    /// First query value for a name
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All query values for a name
    pub fn parameter_values(&self, name: &str) -> Vec<String> {
        self.query
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }
}

/// Parse a query string into decoded key/value pairs, keeping their order.
pub fn parse_query_string(query: &str) -> Vec<(String, String)> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query).unwrap_or_else(|e| {
        tracing::trace!(error = %e, "malformed query string");
        Vec::new()
    })
}

/// The response descriptor produced by an action.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn created() -> Self {
        Self::new(201)
    }

    pub fn no_content() -> Self {
        Self::new(204)
    }

    pub fn bad_request() -> Self {
        Self::new(400)
    }

    pub fn not_found() -> Self {
        Self::new(404)
    }

    pub fn internal_server_error() -> Self {
        Self::new(500)
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, crate::Error> {
        self.body =
            serde_json::to_vec(value).map_err(|e| crate::Error::Serialization(e.to_string()))?;
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Header lookup, ignoring the case of the name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!(HttpMethod::from_str("get"), Some(HttpMethod::GET));
        assert_eq!(HttpMethod::from_str("Patch"), Some(HttpMethod::PATCH));
        assert_eq!(HttpMethod::from_str("BREW"), None);
        assert_eq!(HttpMethod::OPTIONS.to_string(), "OPTIONS");
    }

    #[test]
    fn test_request_splits_query() {
        let req = Request::new(HttpMethod::GET, "/foo/bar?x=1&x=2&name=a%20b");
        assert_eq!(req.path, "/foo/bar");
        assert_eq!(req.parameter("x"), Some("1"));
        assert_eq!(req.parameter_values("x"), vec!["1", "2"]);
        assert_eq!(req.parameter("name"), Some("a b"));
        assert_eq!(req.parameter("missing"), None);
    }

    #[test]
    fn test_request_headers_are_case_insensitive() {
        let req = Request::new(HttpMethod::GET, "/")
            .with_header("X-Token", "a")
            .with_header("x-token", "b");
        assert_eq!(req.header("x-TOKEN"), Some("a"));
        assert_eq!(req.headers("X-Token"), vec!["a", "b"]);
    }

    #[test]
    fn test_content_type_strips_parameters() {
        let req = Request::new(HttpMethod::POST, "/")
            .with_header("Content-Type", "Text/Plain; charset=utf-8");
        assert_eq!(req.content_type().as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_accepts_without_header() {
        let req = Request::new(HttpMethod::GET, "/");
        assert!(req.accept().is_none());
        assert!(req.accepts(&MediaType::xml()));

        let req = req.with_header("Accept", "application/json");
        assert!(req.accepts(&MediaType::json()));
        assert!(!req.accepts(&MediaType::xml()));
    }

    #[test]
    fn test_response_header_lookup() {
        let response = HttpResponse::ok().with_header("content-type", "text/plain");
        assert_eq!(response.content_type(), Some("text/plain"));
        assert!(response.has_header("Content-Type"));
        assert!(!response.has_header("Vary"));
    }

    #[test]
    fn test_response_with_json() {
        let response = HttpResponse::ok().with_json(&vec![1, 2, 3]).unwrap();
        assert_eq!(response.body_str(), Some("[1,2,3]"));
        assert_eq!(response.content_type(), Some("application/json"));
    }
}
