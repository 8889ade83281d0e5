//! Directory listing guard.
//!
//! A static file server answers a path ending in `/` with a generated index
//! of the directory. This stage answers such paths with a plain 404 before
//! they reach any handler.

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::Request;
use crate::writer::ResponseWriter;
use scholar_core::{RequestContext, ScholarResult};

/// Rejects directory-style request paths with `404 page not found`.
///
/// Every other request passes through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectoryListing;

/// Returns true if `path` names a directory, i.e. ends in `/`.
///
/// The root path `/` counts as a directory.
#[must_use]
pub fn is_directory_path(path: &str) -> bool {
    path.ends_with('/')
}

impl Middleware for NoDirectoryListing {
    fn name(&self) -> &'static str {
        "no_directory_listing"
    }

    fn process<'a>(
        &'a self,
        ctx: RequestContext,
        request: Request,
        writer: &'a mut dyn ResponseWriter,
        next: Next<'a>,
    ) -> BoxFuture<'a, ScholarResult<()>> {
        Box::pin(async move {
            if is_directory_path(request.uri().path()) {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    http.path = request.uri().path(),
                    "directory listing refused"
                );
                writer.write_not_found()?;
                return Ok(());
            }

            next.run(ctx, request, writer).await
        })
    }
}
