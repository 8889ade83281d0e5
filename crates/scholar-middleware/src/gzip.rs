//! Gzip-compressing response writer.

use crate::writer::ResponseWriter;
use flate2::write::GzEncoder;
use flate2::Compression;
use http::{header, HeaderMap, StatusCode};
use std::io::{self, Write};

/// Adapts a [`ResponseWriter`] body into an `io::Write` for the encoder.
struct BodySink<'w> {
    out: &'w mut dyn ResponseWriter,
    muted: bool,
}

impl Write for BodySink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.muted {
            return Ok(buf.len());
        }
        self.out.write_body(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.muted {
            return Ok(());
        }
        self.out.flush_body()
    }
}

/// A [`ResponseWriter`] that gzip-compresses the body into another writer.
///
/// Headers and status pass straight through, except that `Content-Length`
/// is removed when the status is written since it would describe the
/// uncompressed body.
///
/// A response that cannot carry a body (1xx, 204 and 304 statuses, or any
/// answer to a HEAD request marked with [`set_head_only`](Self::set_head_only))
/// gets no gzip bytes at all: `Content-Encoding` is dropped when the status
/// is written and the encoder output is swallowed.
///
/// The writer must be finalized exactly once, with [`finish`](Self::finish)
/// (writes the gzip trailer and flushes the inner writer) or
/// [`discard`](Self::discard). If neither ran, dropping the writer finishes it.
///
/// # Example
///
/// ```
/// use flate2::Compression;
/// use scholar_middleware::{BufferedResponse, GzipResponseWriter, ResponseWriter};
///
/// let mut inner = BufferedResponse::new();
/// let mut gz = GzipResponseWriter::new(&mut inner, Compression::default());
/// gz.write_all_body(b"hello").unwrap();
/// gz.finish().unwrap();
/// assert_eq!(gz.finish_count(), 1);
/// drop(gz);
///
/// assert_eq!(&inner.body()[..2], &[0x1f, 0x8b]);
/// ```
pub struct GzipResponseWriter<'w> {
    encoder: GzEncoder<BodySink<'w>>,
    started: bool,
    finished: bool,
    finish_count: usize,
    head_only: bool,
}

/// Returns true if a response with `status` may carry a body.
fn allows_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

impl<'w> GzipResponseWriter<'w> {
    /// Wraps `inner`, compressing at `level`.
    pub fn new(inner: &'w mut dyn ResponseWriter, level: Compression) -> Self {
        Self {
            encoder: GzEncoder::new(
                BodySink {
                    out: inner,
                    muted: false,
                },
                level,
            ),
            started: false,
            finished: false,
            finish_count: 0,
            head_only: false,
        }
    }

    /// Marks the response as an answer to a HEAD request, so no body is sent.
    pub fn set_head_only(&mut self) {
        self.head_only = true;
    }

    /// Returns true once the response is known to carry no body.
    #[must_use]
    pub fn is_bodyless(&self) -> bool {
        self.encoder.get_ref().muted
    }

    /// Returns true once a status or body byte has been written through this writer.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Returns true once the writer has been finalized.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of times the writer was finalized. Never more than one.
    #[must_use]
    pub const fn finish_count(&self) -> usize {
        self.finish_count
    }

    /// Completes the gzip stream and flushes the inner writer.
    ///
    /// Only the first call does anything; later calls return `Ok(())`.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        if !self.started {
            self.write_head(StatusCode::OK);
        }
        self.finished = true;
        self.finish_count += 1;

        self.encoder.try_finish()?;
        self.encoder.get_mut().out.flush_body()
    }

    /// Finalizes without sending anything further to the inner writer.
    ///
    /// Used when the downstream handler failed before producing output, so
    /// the error can still be reported with its own status.
    pub fn discard(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.finish_count += 1;

        self.encoder.get_mut().muted = true;
        // Into a muted sink this cannot fail; it only releases the encoder state.
        let _ = self.encoder.try_finish();
    }

    fn inner(&self) -> &dyn ResponseWriter {
        &*self.encoder.get_ref().out
    }

    fn inner_mut(&mut self) -> &mut dyn ResponseWriter {
        &mut *self.encoder.get_mut().out
    }
}

impl ResponseWriter for GzipResponseWriter<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner().headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner_mut().headers_mut()
    }

    fn status(&self) -> Option<StatusCode> {
        self.inner().status()
    }

    fn write_head(&mut self, status: StatusCode) {
        let head_only = self.head_only;
        let inner = self.inner_mut();
        let bodyless = match inner.status() {
            Some(_) => false,
            None if head_only || !allows_body(status) => {
                inner.headers_mut().remove(header::CONTENT_ENCODING);
                true
            }
            None => {
                inner.headers_mut().remove(header::CONTENT_LENGTH);
                false
            }
        };
        inner.write_head(status);
        if bodyless {
            self.encoder.get_mut().muted = true;
        }
        self.started = true;
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<usize> {
        if self.finished {
            return Err(io::Error::other("gzip stream already finished"));
        }
        if self.inner().status().is_none() {
            self.write_head(StatusCode::OK);
        }
        self.started = true;
        self.encoder.write(chunk)
    }

    fn flush_body(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.encoder.flush()
    }
}

impl Drop for GzipResponseWriter<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        tracing::debug!("gzip writer dropped before finish, finalizing");
        if let Err(e) = self.finish() {
            tracing::warn!(error = %e, "failed to finalize gzip stream on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BufferedResponse;
    use flate2::read::GzDecoder;
    use http::HeaderValue;
    use std::io::Read;

    fn gunzip(bytes: &[u8]) -> String {
        let mut out = String::new();
        GzDecoder::new(bytes).read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_compresses_body() {
        let mut inner = BufferedResponse::new();
        {
            let mut gz = GzipResponseWriter::new(&mut inner, Compression::default());
            gz.write_all_body(b"hello, ").unwrap();
            gz.write_all_body(b"world").unwrap();
            gz.finish().unwrap();
        }
        assert_eq!(gunzip(inner.body()), "hello, world");
        assert_eq!(inner.status(), Some(StatusCode::OK));
        assert_eq!(inner.flush_count(), 1);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut inner = BufferedResponse::new();
        {
            let mut gz = GzipResponseWriter::new(&mut inner, Compression::fast());
            gz.write_all_body(b"x").unwrap();
            gz.finish().unwrap();
            gz.finish().unwrap();
            gz.discard();
            assert_eq!(gz.finish_count(), 1);
            assert!(gz.is_finished());
        }
        assert_eq!(inner.flush_count(), 1);
        assert_eq!(gunzip(inner.body()), "x");
    }

    #[test]
    fn test_drop_finalizes() {
        let mut inner = BufferedResponse::new();
        {
            let mut gz = GzipResponseWriter::new(&mut inner, Compression::default());
            gz.write_all_body(b"dropped").unwrap();
        }
        assert_eq!(gunzip(inner.body()), "dropped");
        assert_eq!(inner.flush_count(), 1);
    }

    #[test]
    fn test_write_after_finish_fails() {
        let mut inner = BufferedResponse::new();
        let mut gz = GzipResponseWriter::new(&mut inner, Compression::default());
        gz.finish().unwrap();
        assert!(gz.write_body(b"late").is_err());
    }

    #[test]
    fn test_removes_content_length() {
        let mut inner = BufferedResponse::new();
        inner
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from_static("5"));
        {
            let mut gz = GzipResponseWriter::new(&mut inner, Compression::default());
            gz.write_head(StatusCode::ACCEPTED);
            gz.write_all_body(b"hello").unwrap();
            gz.finish().unwrap();
        }
        assert!(inner.headers().get(header::CONTENT_LENGTH).is_none());
        assert_eq!(inner.status(), Some(StatusCode::ACCEPTED));
    }

    #[test]
    fn test_empty_body_still_valid_stream() {
        let mut inner = BufferedResponse::new();
        {
            let mut gz = GzipResponseWriter::new(&mut inner, Compression::default());
            assert!(!gz.is_started());
            gz.finish().unwrap();
        }
        assert_eq!(inner.status(), Some(StatusCode::OK));
        assert_eq!(gunzip(inner.body()), "");
    }

    #[test]
    fn test_discard_writes_nothing() {
        let mut inner = BufferedResponse::new();
        {
            let mut gz = GzipResponseWriter::new(&mut inner, Compression::default());
            gz.discard();
            assert_eq!(gz.finish_count(), 1);
        }
        assert!(inner.body().is_empty());
        assert_eq!(inner.status(), None);
        assert_eq!(inner.flush_count(), 0);
    }

    #[test]
    fn test_no_content_gets_no_gzip_bytes() {
        let mut inner = BufferedResponse::new();
        inner
            .headers_mut()
            .insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        {
            let mut gz = GzipResponseWriter::new(&mut inner, Compression::default());
            gz.write_head(StatusCode::NO_CONTENT);
            assert!(gz.is_bodyless());
            gz.finish().unwrap();
            assert_eq!(gz.finish_count(), 1);
        }
        assert_eq!(inner.status(), Some(StatusCode::NO_CONTENT));
        assert!(inner.body().is_empty());
        assert!(inner.headers().get(header::CONTENT_ENCODING).is_none());
    }

    #[test]
    fn test_not_modified_keeps_content_length() {
        let mut inner = BufferedResponse::new();
        inner
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from_static("120"));
        {
            let mut gz = GzipResponseWriter::new(&mut inner, Compression::default());
            gz.write_head(StatusCode::NOT_MODIFIED);
        }
        assert_eq!(inner.status(), Some(StatusCode::NOT_MODIFIED));
        assert!(inner.body().is_empty());
        assert_eq!(inner.headers()[header::CONTENT_LENGTH], "120");
    }

    #[test]
    fn test_head_only_swallows_body() {
        let mut inner = BufferedResponse::new();
        inner
            .headers_mut()
            .insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        {
            let mut gz = GzipResponseWriter::new(&mut inner, Compression::default());
            gz.set_head_only();
            gz.write_all_body(b"not for HEAD").unwrap();
            gz.finish().unwrap();
        }
        assert_eq!(inner.status(), Some(StatusCode::OK));
        assert!(inner.body().is_empty());
        assert!(inner.headers().get(header::CONTENT_ENCODING).is_none());
    }

    #[test]
    fn test_headers_pass_through() {
        let mut inner = BufferedResponse::new();
        {
            let mut gz = GzipResponseWriter::new(&mut inner, Compression::default());
            gz.headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
            assert_eq!(gz.headers()[header::CONTENT_TYPE], "text/html");
            gz.discard();
        }
        assert_eq!(inner.headers()[header::CONTENT_TYPE], "text/html");
    }
}
