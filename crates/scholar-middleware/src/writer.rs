//! Response writers.
//!
//! Stages and handlers produce their response by writing to a
//! [`ResponseWriter`]: headers first, then a status line, then body bytes.
//! Writing the body before a status implies `200 OK`. This lets a stage
//! substitute a decorating writer (see [`GzipResponseWriter`](crate::GzipResponseWriter))
//! without the downstream handler noticing.

use crate::types::Response;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use http_body_util::Full;
use std::io;

/// Destination of a response.
pub trait ResponseWriter: Send {
    /// Response headers written so far.
    fn headers(&self) -> &HeaderMap;

    /// Mutable response headers. Changes after [`write_head`](Self::write_head)
    /// have no effect on a response already sent.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// The status, once written.
    fn status(&self) -> Option<StatusCode>;

    /// Commits the status and headers. Later calls are ignored.
    fn write_head(&mut self, status: StatusCode);

    /// Writes a chunk of body, committing `200 OK` if no status was written.
    fn write_body(&mut self, chunk: &[u8]) -> io::Result<usize>;

    /// Flushes buffered body bytes towards the client.
    fn flush_body(&mut self) -> io::Result<()>;

    /// Writes the whole buffer.
    fn write_all_body(&mut self, mut chunk: &[u8]) -> io::Result<()> {
        while !chunk.is_empty() {
            match self.write_body(chunk) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "response writer accepted no bytes",
                    ))
                }
                Ok(n) => chunk = &chunk[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Writes a plain-text error response: `status`, then `message` and a newline.
    fn write_error(&mut self, status: StatusCode, message: &str) -> io::Result<()> {
        let headers = self.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        headers.remove(header::CONTENT_LENGTH);
        self.write_head(status);
        self.write_all_body(message.as_bytes())?;
        self.write_all_body(b"\n")
    }

    /// Writes the standard `404 page not found` response.
    fn write_not_found(&mut self) -> io::Result<()> {
        self.write_error(StatusCode::NOT_FOUND, "404 page not found")
    }
}

/// A writer that collects the response in memory.
///
/// The server host converts it into a hyper response once the pipeline
/// returns; tests inspect it directly.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use scholar_middleware::{BufferedResponse, ResponseWriter};
///
/// let mut writer = BufferedResponse::new();
/// writer.write_all_body(b"hello").unwrap();
///
/// assert_eq!(writer.status(), Some(StatusCode::OK));
/// assert_eq!(writer.body(), b"hello");
/// ```
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    flushes: usize,
}

impl BufferedResponse {
    /// Creates an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Body bytes written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Number of times [`flush_body`](ResponseWriter::flush_body) was called.
    #[must_use]
    pub const fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Converts into an HTTP response. An unwritten status becomes `200 OK`.
    #[must_use]
    pub fn into_response(self) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::from(self.body)));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseWriter for BufferedResponse {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn status(&self) -> Option<StatusCode> {
        self.status
    }

    fn write_head(&mut self, status: StatusCode) {
        if let Some(existing) = self.status {
            tracing::warn!(
                existing = existing.as_u16(),
                ignored = status.as_u16(),
                "superfluous write_head call"
            );
            return;
        }
        self.status = Some(status);
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.write_head(StatusCode::OK);
        }
        self.body.extend_from_slice(chunk);
        Ok(chunk.len())
    }

    fn flush_body(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_implies_ok() {
        let mut writer = BufferedResponse::new();
        assert_eq!(writer.status(), None);
        writer.write_all_body(b"abc").unwrap();
        assert_eq!(writer.status(), Some(StatusCode::OK));
    }

    #[test]
    fn test_second_write_head_ignored() {
        let mut writer = BufferedResponse::new();
        writer.write_head(StatusCode::CREATED);
        writer.write_head(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(writer.status(), Some(StatusCode::CREATED));
    }

    #[test]
    fn test_write_error() {
        let mut writer = BufferedResponse::new();
        writer
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from_static("999"));
        writer
            .write_error(StatusCode::FORBIDDEN, "Forbidden")
            .unwrap();

        let response = writer.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
    }

    #[test]
    fn test_write_not_found_body() {
        let mut writer = BufferedResponse::new();
        writer.write_not_found().unwrap();
        assert_eq!(writer.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(writer.body(), b"404 page not found\n");
    }

    #[test]
    fn test_into_response_defaults_to_ok() {
        let response = BufferedResponse::new().into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_flush_count() {
        let mut writer = BufferedResponse::new();
        writer.flush_body().unwrap();
        writer.flush_body().unwrap();
        assert_eq!(writer.flush_count(), 2);
    }
}
