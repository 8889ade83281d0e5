//! Terminal request handlers.

use crate::middleware::BoxFuture;
use crate::types::Request;
use crate::writer::ResponseWriter;
use scholar_core::{RequestContext, ScholarResult};
use std::future;
use std::sync::Arc;

/// The end of a pipeline: produces the response for a request.
///
/// An `Err` is mapped to a response by
/// [`Pipeline::serve`](crate::Pipeline::serve) if nothing was written yet.
pub trait Handler: Send + Sync + 'static {
    /// Handles the request.
    fn call<'a>(
        &'a self,
        ctx: RequestContext,
        request: Request,
        writer: &'a mut dyn ResponseWriter,
    ) -> BoxFuture<'a, ScholarResult<()>>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call<'a>(
        &'a self,
        ctx: RequestContext,
        request: Request,
        writer: &'a mut dyn ResponseWriter,
    ) -> BoxFuture<'a, ScholarResult<()>> {
        (**self).call(ctx, request, writer)
    }
}

/// A handler built from a synchronous closure.
///
/// # Example
///
/// ```
/// use scholar_middleware::{FnHandler, ResponseWriter};
///
/// let handler = FnHandler::new(|ctx, _request, writer| {
///     let name = ctx.session().map_or("anonymous", |s| s.username.as_str());
///     writer.write_all_body(format!("hello {name}").as_bytes())?;
///     Ok(())
/// });
/// ```
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&RequestContext, &Request, &mut dyn ResponseWriter) -> ScholarResult<()>
        + Send
        + Sync
        + 'static,
{
    /// Wraps `func`.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&RequestContext, &Request, &mut dyn ResponseWriter) -> ScholarResult<()>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        ctx: RequestContext,
        request: Request,
        writer: &'a mut dyn ResponseWriter,
    ) -> BoxFuture<'a, ScholarResult<()>> {
        Box::pin(future::ready((self.func)(&ctx, &request, writer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BufferedResponse;
    use bytes::Bytes;
    use http_body_util::Full;
    use scholar_core::{ScholarError, SessionData};

    fn request() -> Request {
        http::Request::builder()
            .uri("/me")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_fn_handler_sees_context() {
        let handler = FnHandler::new(|ctx, _req, writer| {
            let session = ctx.require_session("test")?;
            writer.write_all_body(session.username.as_bytes())?;
            Ok(())
        });

        let ctx = RequestContext::new().with_session(SessionData::new(3, "ms.t"));
        let mut writer = BufferedResponse::new();
        handler.call(ctx, request(), &mut writer).await.unwrap();
        assert_eq!(writer.body(), b"ms.t");
    }

    #[tokio::test]
    async fn test_fn_handler_error() {
        let handler = FnHandler::new(|_ctx, _req, _writer| Err(ScholarError::not_found("student")));
        let mut writer = BufferedResponse::new();
        let result = handler.call(RequestContext::new(), request(), &mut writer).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_arc_handler() {
        let handler: Arc<dyn Handler> = Arc::new(FnHandler::new(|_ctx, _req, writer| {
            writer.write_all_body(b"shared")?;
            Ok(())
        }));
        let mut writer = BufferedResponse::new();
        handler
            .call(RequestContext::new(), request(), &mut writer)
            .await
            .unwrap();
        assert_eq!(writer.body(), b"shared");
    }
}
