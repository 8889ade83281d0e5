//! Gzip response compression.
//!
//! When the client lists `gzip` in `Accept-Encoding`, the rest of the chain
//! writes through a [`GzipResponseWriter`]. The decorator is finalized
//! exactly once before this stage returns, whether the chain succeeded or
//! failed:
//!
//! - on success, or on failure after output started, the gzip stream is
//!   finished so the client receives a complete stream
//! - on failure before any output, the decorator is discarded and
//!   `Content-Encoding` removed, so the error can be answered uncompressed
//!
//! If the future is dropped mid-request the decorator's `Drop` finishes it.
//!
//! HEAD requests and bodyless statuses pass through the decorator without
//! `Content-Encoding` or gzip bytes. A disabled compressor only adds `Vary`.

use crate::gzip::GzipResponseWriter;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::Request;
use crate::writer::ResponseWriter;
use flate2::Compression;
use http::{header, HeaderMap, HeaderValue, Method};
use scholar_core::{RequestContext, ScholarResult};

const GZIP: &str = "gzip";

/// Compresses responses with gzip for clients that accept it.
///
/// `Vary: Accept-Encoding` is added to every response passing through,
/// compressed or not, and also when the compressor is disabled.
#[derive(Debug, Clone, Copy)]
pub struct ResponseCompressor {
    level: Compression,
    enabled: bool,
}

impl ResponseCompressor {
    /// Creates a compressor at gzip `level` (0-9, higher levels are clamped to 9).
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
            enabled: true,
        }
    }

    /// A compressor that never encodes but still sends `Vary: Accept-Encoding`,
    /// so shared caches keep one entry per encoding across a config change.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// The compression level.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level.level()
    }

    /// Returns true if responses are gzip-encoded for clients that accept it.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for ResponseCompressor {
    fn default() -> Self {
        Self {
            level: Compression::default(),
            enabled: true,
        }
    }
}

/// Returns true if the request's `Accept-Encoding` headers mention gzip.
#[must_use]
pub fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains(GZIP))
}

impl Middleware for ResponseCompressor {
    fn name(&self) -> &'static str {
        "compression"
    }

    fn process<'a>(
        &'a self,
        ctx: RequestContext,
        request: Request,
        writer: &'a mut dyn ResponseWriter,
        next: Next<'a>,
    ) -> BoxFuture<'a, ScholarResult<()>> {
        Box::pin(async move {
            writer.headers_mut().append(
                header::VARY,
                HeaderValue::from_static("Accept-Encoding"),
            );

            if !self.enabled || !accepts_gzip(request.headers()) {
                return next.run(ctx, request, writer).await;
            }

            writer
                .headers_mut()
                .insert(header::CONTENT_ENCODING, HeaderValue::from_static(GZIP));

            let request_id = ctx.request_id();
            let mut gz = GzipResponseWriter::new(writer, self.level);
            if request.method() == Method::HEAD {
                gz.set_head_only();
            }
            let result = next.run(ctx, request, &mut gz).await;

            match result {
                Err(error) if !gz.is_started() => {
                    gz.discard();
                    drop(gz);
                    writer.headers_mut().remove(header::CONTENT_ENCODING);
                    Err(error)
                }
                result => {
                    if let Err(e) = gz.finish() {
                        if result.is_ok() {
                            return Err(e.into());
                        }
                        tracing::warn!(
                            request_id = %request_id,
                            error = %e,
                            "failed to finish gzip stream after handler error"
                        );
                    }
                    result
                }
            }
        })
    }
}
