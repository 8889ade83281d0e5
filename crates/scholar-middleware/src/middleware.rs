//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that every pipeline stage
//! implements. A stage receives the request context, the request, the
//! response writer and a [`Next`] continuation. It either responds itself
//! (short-circuit) or calls `next.run` exactly once, possibly with a derived
//! context or a decorated writer.
//!
//! # Example
//!
//! ```
//! use scholar_core::{RequestContext, ScholarResult};
//! use scholar_middleware::{BoxFuture, Middleware, Next, Request, ResponseWriter};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: RequestContext,
//!         request: Request,
//!         writer: &'a mut dyn ResponseWriter,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, ScholarResult<()>> {
//!         Box::pin(async move {
//!             let started = ctx.elapsed();
//!             let result = next.run(ctx, request, writer).await;
//!             tracing::debug!(?started, "request done");
//!             result
//!         })
//!     }
//! }
//! ```

use crate::handler::Handler;
use crate::types::Request;
use crate::writer::ResponseWriter;
use scholar_core::{RequestContext, ScholarResult};
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A pipeline stage.
///
/// # Contract
///
/// - Call `next.run()` at most once; not calling it short-circuits the chain.
/// - Never mutate the context received; derive a new one with `with_*`.
/// - Return `Err` only for faults the stage cannot answer itself (wiring
///   faults, I/O errors); request failures are written as responses.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the stage name, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request.
    fn process<'a>(
        &'a self,
        ctx: RequestContext,
        request: Request,
        writer: &'a mut dyn ResponseWriter,
        next: Next<'a>,
    ) -> BoxFuture<'a, ScholarResult<()>>;
}

/// Continuation invoking the rest of the chain.
///
/// Consumed by [`run`](Self::run), so it can be invoked at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// More middleware to process.
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of chain.
    Handler(&'a dyn Handler),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that runs `middleware`, then `next`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    pub(crate) fn handler(handler: &'a dyn Handler) -> Self {
        Self {
            inner: NextInner::Handler(handler),
        }
    }

    /// Invokes the next middleware or the handler.
    ///
    /// `writer` may be a different writer than the one this stage received,
    /// e.g. a compressing decorator.
    pub async fn run(
        self,
        ctx: RequestContext,
        request: Request,
        writer: &mut dyn ResponseWriter,
    ) -> ScholarResult<()> {
        match self.inner {
            NextInner::Chain { middleware, next } => {
                middleware.process(ctx, request, writer, *next).await
            }
            NextInner::Handler(handler) => handler.call(ctx, request, writer).await,
        }
    }
}
