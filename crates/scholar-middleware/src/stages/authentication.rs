//! Session authentication.
//!
//! Resolves the session cookie through the [`SessionStore`](scholar_core::SessionStore)
//! bound in the request context and extracts the [`SessionData`] stored
//! under [`SESSION_DATA_KEY`]. On success the data is bound into a derived
//! context for the rest of the chain.
//!
//! ## Outcomes
//!
//! | Condition | Result |
//! |---|---|
//! | no cookie store in context | `Err(ScholarError::Wiring)` |
//! | cookie missing, tampered, malformed or expired | `401 Unauthorized` |
//! | session without a well-formed `data` record | `401 Unauthorized` |
//! | otherwise | next stage runs with the session bound |
//!
//! The failure cause is logged and never sent to the client.

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::Request;
use crate::writer::ResponseWriter;
use http::StatusCode;
use scholar_core::{
    RequestContext, ScholarResult, SessionData, SessionError, SESSION_COOKIE_NAME,
    SESSION_DATA_KEY,
};

const STAGE: &str = "authentication";

/// Rejects requests without a valid session with `401 Unauthorized`.
///
/// # Example
///
/// ```
/// use scholar_middleware::stages::AuthenticationGate;
///
/// let gate = AuthenticationGate::new("school_session");
/// assert_eq!(gate.cookie_name(), "school_session");
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticationGate {
    cookie_name: String,
}

impl AuthenticationGate {
    /// Creates a gate reading the session cookie `cookie_name`.
    #[must_use]
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }

    /// Name of the session cookie.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }
}

impl Default for AuthenticationGate {
    fn default() -> Self {
        Self::new(SESSION_COOKIE_NAME)
    }
}

impl Middleware for AuthenticationGate {
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
            let store = ctx.require_cookie_store(STAGE)?;

            let session = match store.resolve(request.headers(), &self.cookie_name) {
                Ok(session) => session,
                Err(SessionError::Missing) => {
                    tracing::debug!(request_id = %ctx.request_id(), "no session cookie");
                    return unauthorized(writer);
                }
                Err(e) => {
                    tracing::warn!(
                        request_id = %ctx.request_id(),
                        error = %e,
                        "failed to resolve session"
                    );
                    return unauthorized(writer);
                }
            };

            let Some(data) = session.typed_record::<SessionData>(SESSION_DATA_KEY) else {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    "session carries no principal record"
                );
                return unauthorized(writer);
            };

            tracing::debug!(
                request_id = %ctx.request_id(),
                user.id = data.user_id,
                "request authenticated"
            );
            let ctx = ctx.with_session(data);
            next.run(ctx, request, writer).await
        })
    }
}

fn unauthorized(writer: &mut dyn ResponseWriter) -> ScholarResult<()> {
    writer.write_error(StatusCode::UNAUTHORIZED, "Unauthorized")?;
    Ok(())
}
