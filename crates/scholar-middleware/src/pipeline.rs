//! Middleware pipeline.
//!
//! A [`Pipeline`] is an ordered list of stages, outermost first. Running it
//! composes the stages right-to-left around a terminal [`Handler`], so the
//! first stage added sees the request first and the response last.
//!
//! ## Standard order
//!
//! ```text
//! Request → NoDirectoryListing → ResponseCompressor → AuthenticationGate → AuthorizationGate → Handler
//! ```
//!
//! The directory guard runs first so directory requests are rejected without
//! touching the session. Authentication must precede authorization, which
//! reads the session it binds. Compression wraps both gates so their
//! 401/403 bodies are compressed like any other response.

use crate::handler::Handler;
use crate::middleware::{Middleware, Next};
use crate::stages::{AuthenticationGate, AuthorizationGate, NoDirectoryListing, ResponseCompressor};
use crate::types::Request;
use crate::writer::ResponseWriter;
use scholar_config::ScholarConfig;
use scholar_core::{RequestContext, ScholarError, ScholarResult};
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, ordered chain of middleware stages.
///
/// # Example
///
/// ```
/// use scholar_middleware::stages::{AuthenticationGate, NoDirectoryListing};
/// use scholar_middleware::Pipeline;
///
/// let pipeline = Pipeline::builder()
///     .stage(NoDirectoryListing)
///     .stage(AuthenticationGate::default())
///     .build();
///
/// assert_eq!(pipeline.stage_names(), vec!["no_directory_listing", "authentication"]);
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// The pipeline for routes that require a signed-in user.
    ///
    /// `NoDirectoryListing → ResponseCompressor → AuthenticationGate → AuthorizationGate`.
    /// With compression disabled the compressor stays in place and only adds `Vary`.
    #[must_use]
    pub fn standard(config: &ScholarConfig) -> Self {
        Self::public_builder(config)
            .stage(AuthenticationGate::new(config.session.cookie_name.clone()))
            .stage(AuthorizationGate::default())
            .build()
    }

    /// The pipeline for routes open to anonymous clients (login, static files).
    ///
    /// `NoDirectoryListing → ResponseCompressor`.
    #[must_use]
    pub fn public(config: &ScholarConfig) -> Self {
        Self::public_builder(config).build()
    }

    fn public_builder(config: &ScholarConfig) -> PipelineBuilder {
        let compressor = if config.compression.enabled {
            ResponseCompressor::new(config.compression.level)
        } else {
            ResponseCompressor::disabled()
        };
        Self::builder().stage(NoDirectoryListing).stage(compressor)
    }

    /// Runs the request through every stage and then `handler`.
    ///
    /// Returns the chain's result unchanged. Use [`serve`](Self::serve) to
    /// have escaped errors turned into responses.
    pub async fn run(
        &self,
        ctx: RequestContext,
        request: Request,
        writer: &mut dyn ResponseWriter,
        handler: &dyn Handler,
    ) -> ScholarResult<()> {
        self.build_chain(handler).run(ctx, request, writer).await
    }

    /// Runs the pipeline and answers any error that escaped it.
    ///
    /// If no status was written yet, the error is written as a plain-text
    /// response with the status of its category. Wiring faults and internal
    /// errors are logged at error level; their details never reach the client.
    pub async fn serve(
        &self,
        ctx: RequestContext,
        request: Request,
        writer: &mut dyn ResponseWriter,
        handler: &dyn Handler,
    ) {
        let request_id = ctx.request_id();
        if let Err(error) = self.run(ctx, request, writer, handler).await {
            write_escaped_error(request_id, &error, writer);
        }
    }

    fn build_chain<'a>(&'a self, handler: &'a dyn Handler) -> Next<'a> {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all middleware stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of middleware stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

fn write_escaped_error(
    request_id: scholar_core::RequestId,
    error: &ScholarError,
    writer: &mut dyn ResponseWriter,
) {
    let status = error.status_code();

    if status.is_server_error() {
        tracing::error!(request_id = %request_id, error = %error, "request failed");
    } else {
        tracing::debug!(request_id = %request_id, error = %error, "request rejected");
    }

    if let Some(sent) = writer.status() {
        tracing::warn!(
            request_id = %request_id,
            http.status_code = sent.as_u16(),
            "response already started, cannot report error"
        );
        return;
    }

    let message = status.canonical_reason().unwrap_or("Error");
    if let Err(e) = writer.write_error(status, message) {
        tracing::warn!(request_id = %request_id, error = %e, "failed to write error response");
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage. Stages run in the order they are added.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn shared_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}
