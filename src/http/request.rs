//! Request representation handed to the dispatcher
//!
//! The connection layer collects the hyper body and copies the pieces the
//! router needs into this owned struct, so dispatch can run on a blocking
//! thread and tests can build requests without a socket.

use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use hyper::Method;

/// Owned, fully buffered HTTP request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Opaque caller identity used by the session store
    pub session_id: String,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            session_id: String::new(),
        }
    }

    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    #[must_use]
    pub fn with_body(mut self, content_type: &str, body: impl Into<Bytes>) -> Self {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            self.headers.insert(CONTENT_TYPE, value);
        }
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Whether the body is declared as JSON
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| media_type(ct).eq_ignore_ascii_case("application/json"))
    }
}

/// Strip parameters from a Content-Type value (`text/html; charset=utf-8` -> `text/html`)
pub fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or("").trim()
}

/// Find the value of `cookie_name` in the Cookie headers
/// `Set-Cookie` value that hands `session_id` to the client
pub fn session_cookie(cookie_name: &str, session_id: &str) -> String {
    format!("{cookie_name}={session_id}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn session_from_cookies(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; bookmark_session=abc123; lang=en"),
        );
        assert_eq!(
            session_from_cookies(&headers, "bookmark_session"),
            Some("abc123".to_string())
        );
        assert_eq!(session_from_cookies(&headers, "missing"), None);
    }

    #[test]
    fn test_session_from_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("sid=xyz"));
        assert_eq!(session_from_cookies(&headers, "sid"), Some("xyz".to_string()));
    }

    #[test]
    fn test_empty_session_cookie_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("sid="));
        assert_eq!(session_from_cookies(&headers, "sid"), None);
    }

    #[test]
    fn test_json_content_type() {
        let req = Request::new(Method::POST, "/bookmarks")
            .with_body("application/json; charset=utf-8", "{}");
        assert!(req.is_json());

        let req = Request::new(Method::POST, "/bookmarks")
            .with_body("application/x-www-form-urlencoded", "a=b");
        assert!(!req.is_json());
    }
}
