//! Role-based authorization.
//!
//! Compares the matched route's required roles with the authenticated
//! session. A route with no required roles is open to any signed-in user.
//! Otherwise holding any one of the roles is enough; there is no hierarchy,
//! so `ADMIN` does not imply `TEACHER`.

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::Request;
use crate::writer::ResponseWriter;
use http::StatusCode;
use scholar_core::{RequestContext, RoleRegistry, ScholarResult};
use std::sync::Arc;

const STAGE: &str = "authorization";

/// Rejects sessions holding none of the route's required roles with `403 Forbidden`.
///
/// Must run after [`AuthenticationGate`](super::AuthenticationGate) and after
/// the route was bound; a missing session or route is a wiring fault.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationGate {
    registry: Arc<RoleRegistry>,
}

impl AuthorizationGate {
    /// Creates a gate deciding role membership with `registry`.
    #[must_use]
    pub fn new(registry: RoleRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// The role table used by this gate.
    #[must_use]
    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }
}

impl Middleware for AuthorizationGate {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn process<'a>(
        &'a self,
        ctx: RequestContext,
        request: Request,
        writer: &'a mut dyn ResponseWriter,
        next: Next<'a>,
    ) -> BoxFuture<'a, ScholarResult<()>> {
        Box::pin(async move {
            let session = ctx.require_session(STAGE)?;
            let route = ctx.require_route(STAGE)?;

            let allowed = route.is_authenticated_only()
                || self.registry.grants_any(route.required_roles(), session);

            if !allowed {
                tracing::info!(
                    request_id = %ctx.request_id(),
                    user.id = session.user_id,
                    route = route.name(),
                    "access denied: no required role held"
                );
                writer.write_error(StatusCode::FORBIDDEN, "Forbidden")?;
                return Ok(());
            }

            next.run(ctx, request, writer).await
        })
    }
}
