//! HTTP request head parsing

use crate::error::ProtocolError;
use crate::protocol::Request;

/// Parse a request head (request line plus header lines, without the blank
/// line that ends it).
pub fn parse_request_head(head: &str) -> Result<Request, ProtocolError> {
    let mut lines = head.lines().filter(|line| !line.is_empty());
    let request_line = lines.next().ok_or(ProtocolError::EmptyRequest)?;

    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ProtocolError::MalformedRequestLine(request_line.to_string()));
    };

    if !version.starts_with("HTTP/1.") {
        return Err(ProtocolError::UnsupportedVersion(version.to_string()));
    }
    if !target.starts_with('/') {
        return Err(ProtocolError::InvalidTarget(target.to_string()));
    }

    let mut request = Request::new(method.to_ascii_uppercase(), target);
    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ProtocolError::MalformedHeader(line.to_string()))?;
        request
            .headers
            .push((name.trim().to_string(), value.trim().to_string()));
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_get_with_headers() {
        let req = parse_request_head("GET /src/main.ts?t=1 HTTP/1.1\r\nHost: localhost\r\n").unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.url, "/src/main.ts?t=1");
        assert_eq!(req.original_url, req.url);
        assert_eq!(req.header("host"), Some("localhost"));
    }

    #[test]
    fn test_rejects_bad_heads() {
        assert!(matches!(parse_request_head(""), Err(ProtocolError::EmptyRequest)));
        assert!(matches!(
            parse_request_head("GET /\r\n"),
            Err(ProtocolError::MalformedRequestLine(_))
        ));
        assert!(matches!(
            parse_request_head("GET / SPDY/3\r\n"),
            Err(ProtocolError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            parse_request_head("GET http://example.com/ HTTP/1.1\r\n"),
            Err(ProtocolError::InvalidTarget(_))
        ));
        assert!(matches!(
            parse_request_head("GET / HTTP/1.1\r\nno-colon\r\n"),
            Err(ProtocolError::MalformedHeader(_))
        ));
    }
}
