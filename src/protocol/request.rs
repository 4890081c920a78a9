//! Module `request`
//!
//! The request as seen by the middleware chain. Middlewares may rewrite `url`
//! (alias resolution, raw filesystem addressing); `original_url` keeps what
//! the client sent.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub original_url: String,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            method: method.into(),
            original_url: url.clone(),
            url,
            headers: Vec::new(),
        }
    }

    /// Shorthand for a `GET` request, mostly used by tests.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn is_head(&self) -> bool {
        self.method.eq_ignore_ascii_case("HEAD")
    }

    /// Only `GET` and `HEAD` are answered with file contents.
    pub fn is_read(&self) -> bool {
        self.is_head() || self.method.eq_ignore_ascii_case("GET")
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
