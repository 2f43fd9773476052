//! The response sink handlers write into.
//!
//! The routing core does not own a transport, so a [`ResponseContext`] is just
//! the minimal surface the engine needs: status, headers, and a body buffer.
//! The built-in OPTIONS fallback and error-aware middleware use it; whoever
//! invoked [`Router::handle`](crate::Router::handle) turns it into a wire
//! response afterwards, e.g. via [`ResponseContext::into_response`].

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Response, StatusCode};

/// Per-request response state.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    ended: bool,
}

impl ResponseContext {
    pub fn new() -> Self {
        Self { status: StatusCode::OK, headers: HeaderMap::new(), body: Bytes::new(), ended: false }
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Sets the body and marks the response complete.
    pub fn send(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
        self.ended = true;
    }

    /// Whether a handler has completed the response.
    #[inline]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Converts into an `http` response for the transport layer.
    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for ResponseContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header;

    #[test]
    fn send_marks_ended() {
        let mut res = ResponseContext::new();
        assert!(!res.is_ended());
        res.send("hello");
        assert!(res.is_ended());
        assert_eq!(res.body(), b"hello".as_slice());
    }

    #[test]
    fn into_response_carries_parts() {
        let mut res = ResponseContext::new();
        res.set_status(StatusCode::NOT_FOUND);
        res.insert_header(header::ALLOW, HeaderValue::from_static("GET"));
        res.send("missing");

        let response = res.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET");
        assert_eq!(response.body(), &Bytes::from_static(b"missing"));
    }
}
