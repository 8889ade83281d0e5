//! Route endpoints.

use crate::handler::Handler;
use crate::pipeline::Pipeline;
use crate::types::Request;
use crate::writer::ResponseWriter;
use scholar_core::{RequestContext, RouteDescriptor};
use std::fmt;
use std::sync::Arc;

/// A route bound to its pipeline and handler.
///
/// Serving binds the route descriptor into the request context, so stages
/// such as [`AuthorizationGate`](crate::stages::AuthorizationGate) see the
/// route that was matched.
///
/// # Example
///
/// ```
/// use http::Method;
/// use scholar_core::{Role, RouteDescriptor};
/// use scholar_middleware::{Endpoint, FnHandler, Pipeline};
///
/// let route = RouteDescriptor::new("list_students", Method::GET, "/api/students")
///     .require(Role::Teacher);
/// let endpoint = Endpoint::new(
///     route,
///     Pipeline::default(),
///     FnHandler::new(|_ctx, _req, writer| {
///         writer.write_all_body(b"[]")?;
///         Ok(())
///     }),
/// );
/// assert_eq!(endpoint.route().name(), "list_students");
/// ```
#[derive(Clone)]
pub struct Endpoint {
    route: Arc<RouteDescriptor>,
    pipeline: Arc<Pipeline>,
    handler: Arc<dyn Handler>,
}

impl Endpoint {
    /// Creates an endpoint.
    pub fn new(route: RouteDescriptor, pipeline: Pipeline, handler: impl Handler) -> Self {
        Self::shared(Arc::new(route), Arc::new(pipeline), Arc::new(handler))
    }

    /// Creates an endpoint from shared parts, e.g. one pipeline for many routes.
    #[must_use]
    pub fn shared(
        route: Arc<RouteDescriptor>,
        pipeline: Arc<Pipeline>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        Self {
            route,
            pipeline,
            handler,
        }
    }

    /// The route descriptor.
    #[must_use]
    pub fn route(&self) -> &RouteDescriptor {
        &self.route
    }

    /// The pipeline run before the handler.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Serves a request: binds the route, then runs the pipeline and handler.
    pub async fn serve(
        &self,
        ctx: RequestContext,
        request: Request,
        writer: &mut dyn ResponseWriter,
    ) {
        let ctx = ctx.with_route(Arc::clone(&self.route));
        self.pipeline
            .serve(ctx, request, writer, self.handler.as_ref())
            .await;
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("route", &self.route.name())
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
