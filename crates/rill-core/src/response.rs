//! Completed response representation.

use http::{HeaderMap, StatusCode};

/// A fully-computed response: status, headers, body.
///
/// This is the shape of a response the dispatch layer can write out
/// synchronously. Streaming routes never produce one of these on the
/// dispatch stack; they hand a deferred body to the host instead.
#[derive(Debug, Clone, Default)]
pub struct ResponseParts {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body.
    pub body: Vec<u8>,
}

impl ResponseParts {
    /// Create a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A 200 response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// A 404 response.
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            headers: HeaderMap::new(),
            body: b"Not Found".to_vec(),
        }
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get the response body as text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_response() {
        let parts = ResponseParts::ok("hello");

        assert_eq!(parts.status, StatusCode::OK);
        assert!(parts.is_success());
        assert_eq!(parts.text(), Some("hello"));
    }

    #[test]
    fn test_not_found() {
        let parts = ResponseParts::not_found();

        assert_eq!(parts.status, StatusCode::NOT_FOUND);
        assert!(!parts.is_success());
    }

    #[test]
    fn test_text_rejects_invalid_utf8() {
        let parts = ResponseParts::ok(vec![0xff, 0xfe]);
        assert_eq!(parts.text(), None);
    }
}
