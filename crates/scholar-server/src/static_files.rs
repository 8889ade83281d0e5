//! Static file handler.
//!
//! Serves files below a root directory for paths under a mount prefix.
//! It never lists directories: a path naming a directory is answered with
//! 404, and paths ending in `/` are expected to be stopped earlier by
//! [`NoDirectoryListing`](scholar_middleware::stages::NoDirectoryListing).
//!
//! # Security
//!
//! - `..` segments are refused with 403
//! - hidden files and directories (leading `.`) are refused with 403
//! - the resolved file must stay inside the canonical root

use bytes::Bytes;
use http::{header, HeaderValue, Method, StatusCode};
use scholar_core::{RequestContext, ScholarResult};
use scholar_middleware::{BoxFuture, Handler, Request, ResponseWriter};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Serves files from a directory.
///
/// # Example
///
/// ```
/// use scholar_server::StaticFiles;
///
/// let files = StaticFiles::new("/static/", "./public");
/// assert_eq!(files.mount(), "/static/");
/// ```
#[derive(Debug, Clone)]
pub struct StaticFiles {
    mount: String,
    root: PathBuf,
}

/// Why a request path could not be mapped to a file.
#[derive(Debug, PartialEq, Eq)]
enum Refusal {
    NotFound,
    Forbidden,
}

impl StaticFiles {
    /// Serves `root` for request paths starting with `mount`.
    pub fn new(mount: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            mount: mount.into(),
            root: root.into(),
        }
    }

    /// The URL prefix.
    #[must_use]
    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request path to a file below the root.
    async fn resolve(&self, request_path: &str) -> Result<PathBuf, Refusal> {
        let relative = request_path
            .strip_prefix(&self.mount)
            .ok_or(Refusal::NotFound)?;

        for component in Path::new(relative).components() {
            match component {
                Component::Normal(name) if name.to_string_lossy().starts_with('.') => {
                    return Err(Refusal::Forbidden);
                }
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(Refusal::Forbidden);
                }
            }
        }

        let root = tokio::fs::canonicalize(&self.root).await.map_err(|e| {
            tracing::error!(root = %self.root.display(), error = %e, "static root unavailable");
            Refusal::NotFound
        })?;
        let path = tokio::fs::canonicalize(root.join(relative))
            .await
            .map_err(|_| Refusal::NotFound)?;

        // Symlinks pointing outside the root.
        if !path.starts_with(&root) {
            return Err(Refusal::Forbidden);
        }
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(Refusal::NotFound),
        }
    }

    async fn serve(&self, request: &Request, writer: &mut dyn ResponseWriter) -> ScholarResult<()> {
        let method = request.method();
        if method != Method::GET && method != Method::HEAD {
            writer
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
            writer.write_error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")?;
            return Ok(());
        }

        let path = match self.resolve(request.uri().path()).await {
            Ok(path) => path,
            Err(Refusal::NotFound) => {
                writer.write_not_found()?;
                return Ok(());
            }
            Err(Refusal::Forbidden) => {
                tracing::info!(http.path = request.uri().path(), "static path refused");
                writer.write_error(StatusCode::FORBIDDEN, "Forbidden")?;
                return Ok(());
            }
        };

        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => Bytes::from(contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                writer.write_not_found()?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let headers = writer.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type(&path)),
        );
        headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        writer.write_head(StatusCode::OK);
        if method != Method::HEAD {
            writer.write_all_body(&contents)?;
        }
        Ok(())
    }
}

impl Handler for StaticFiles {
    fn call<'a>(
        &'a self,
        _ctx: RequestContext,
        request: Request,
        writer: &'a mut dyn ResponseWriter,
    ) -> BoxFuture<'a, ScholarResult<()>> {
        Box::pin(async move { self.serve(&request, writer).await })
    }
}

/// Guesses a content type from the file extension.
fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
