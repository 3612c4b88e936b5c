//! The request and response collaborators seen by the negotiation core.
//!
//! The core never owns the HTTP layer. It reads a request through [`RequestHeaders`] and
//! writes a response through [`ResponseSink`]:
//! - `RequestHeaders` is implemented for `http::Request<B>` and `http::request::Parts`
//! - [`BufferedResponse`] is a `ResponseSink` collecting the response into an
//!   `http::Response<Bytes>`

use bytes::{Bytes, BytesMut};
use http::request::Parts;
use http::{HeaderMap, HeaderName, Method, Request, Response, StatusCode};
use std::io;

/// Read-only view of an incoming request.
pub trait RequestHeaders {
    /// Returns the HTTP method of the request
    fn method(&self) -> &Method;

    /// Returns the value of a header, repeated fields joined with `", "`.
    ///
    /// Values that are not visible ASCII are skipped.
    fn header(&self, name: &HeaderName) -> Option<String>;
}

/// Joins every value of `name` the way a list header may be split over several lines.
pub fn joined_header(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let mut values = headers.get_all(name).iter().filter_map(|value| value.to_str().ok());
    let first = values.next()?;
    Some(values.fold(first.to_owned(), |mut joined, value| {
        joined.push_str(", ");
        joined.push_str(value);
        joined
    }))
}

impl<B> RequestHeaders for Request<B> {
    fn method(&self) -> &Method {
        self.method()
    }

    fn header(&self, name: &HeaderName) -> Option<String> {
        joined_header(self.headers(), name)
    }
}

impl RequestHeaders for Parts {
    fn method(&self) -> &Method {
        &self.method
    }

    fn header(&self, name: &HeaderName) -> Option<String> {
        joined_header(&self.headers, name)
    }
}

/// Destination of a rendered response.
///
/// Headers and status are always set before the first body byte is written.
pub trait ResponseSink {
    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn set_status(&mut self, status: StatusCode);

    /// The writable body stream.
    fn body(&mut self) -> &mut dyn io::Write;
}

/// A [`ResponseSink`] that buffers the whole response in memory.
#[derive(Debug)]
pub struct BufferedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Writer,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self { status: StatusCode::OK, headers: HeaderMap::new(), body: Writer::new() }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body written so far.
    pub fn body_bytes(&self) -> &[u8] {
        &self.body.buf
    }

    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body.buf.freeze());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for BufferedResponse {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn body(&mut self) -> &mut dyn io::Write {
        &mut self.body
    }
}

#[derive(Debug)]
struct Writer {
    buf: BytesMut,
}

impl Writer {
    fn new() -> Self {
        Self { buf: BytesMut::with_capacity(4096) }
    }
}

impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
    use std::io::Write;

    #[test]
    fn test_request_header_lookup() {
        let req = Request::builder()
            .method(Method::HEAD)
            .header(ACCEPT, "text/html")
            .header(ACCEPT, "application/json;q=0.5")
            .body(())
            .unwrap();

        assert_eq!(RequestHeaders::method(&req), Method::HEAD);
        assert_eq!(req.header(&ACCEPT).as_deref(), Some("text/html, application/json;q=0.5"));
        assert_eq!(req.header(&ACCEPT_LANGUAGE), None);

        let (parts, ()) = req.into_parts();
        assert_eq!(RequestHeaders::method(&parts), Method::HEAD);
        assert_eq!(parts.header(&ACCEPT).as_deref(), Some("text/html, application/json;q=0.5"));
    }

    #[test]
    fn test_buffered_response() {
        let mut sink = BufferedResponse::new();
        sink.headers_mut().insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        sink.set_status(StatusCode::CREATED);
        sink.body().write_all(b"hello ").unwrap();
        sink.body().write_all(b"world").unwrap();
        assert_eq!(sink.body_bytes(), b"hello world");

        let response = sink.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(response.body(), &Bytes::from_static(b"hello world"));
    }
}
