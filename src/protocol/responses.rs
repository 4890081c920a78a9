//! HTTP response handling
//!
//! Defines status codes, the response buffer middlewares fill in and its
//! wire formatting.

pub const OK: u16 = 200;
pub const BAD_REQUEST: u16 = 400;
pub const NOT_FOUND: u16 = 404;
pub const HEADERS_TOO_LARGE: u16 = 431;
pub const INTERNAL_ERROR: u16 = 500;

/// Reason phrase for the status codes this server produces.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        OK => "OK",
        BAD_REQUEST => "Bad Request",
        NOT_FOUND => "Not Found",
        HEADERS_TOO_LARGE => "Request Header Fields Too Large",
        INTERNAL_ERROR => "Internal Server Error",
        _ => "Unknown",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: OK,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain-text response carrying the reason phrase as body.
    pub fn error(status: u16) -> Self {
        let mut res = Self::new();
        res.set_error(status);
        res
    }

    /// Turn this response into a plain-text error, dropping anything set before.
    pub fn set_error(&mut self, status: u16) {
        self.status = status;
        self.headers.clear();
        self.set_header("Content-Type", "text/plain; charset=utf-8");
        self.body = reason_phrase(status).as_bytes().to_vec();
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set a header, replacing an existing one of the same name.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    /// Serialize as an HTTP/1.1 response. The connection is always closed
    /// afterwards. `head_only` omits the body but keeps its length.
    pub fn to_bytes(&self, head_only: bool) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status, reason_phrase(self.status));
        for (name, value) in &self.headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        head.push_str("Connection: close\r\n\r\n");

        let mut bytes = head.into_bytes();
        if !head_only {
            bytes.extend_from_slice(&self.body);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_wire_format() {
        let res = Response::error(NOT_FOUND);
        let text = String::from_utf8(res.to_bytes(false)).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Content-Length: 9\r\n"));
        assert!(text.ends_with("\r\n\r\nNot Found"));
    }

    #[test]
    fn test_head_only_omits_body() {
        let mut res = Response::new();
        res.set_body(b"hello".to_vec());
        let text = String::from_utf8(res.to_bytes(true)).unwrap();
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_set_header_replaces() {
        let mut res = Response::new();
        res.set_header("Content-Type", "text/plain");
        res.set_header("content-type", "text/css");
        assert_eq!(res.header("CONTENT-TYPE"), Some("text/css"));
    }
}
