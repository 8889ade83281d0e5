//! Request context types.
//!
//! The [`RequestContext`] carries typed per-request bindings through the
//! middleware pipeline and into handlers. It is immutable: a stage that
//! contributes a binding derives a new context with one of the `with_*`
//! methods and passes that downstream. Upstream stages keep seeing the
//! context they created.

use crate::{RouteDescriptor, ScholarError, SessionData, SessionStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps request IDs sortable in logs.
///
/// # Example
///
/// ```
/// use scholar_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request context that flows through the middleware pipeline.
///
/// Bindings:
/// - `cookie_store`: the session backend, bound by the host before the pipeline runs
/// - `session`: the authenticated principal, bound by the authentication stage
/// - `route`: the matched route descriptor, bound by the endpoint
///
/// Cloning is cheap; every binding is reference counted.
///
/// # Example
///
/// ```
/// use scholar_core::{RequestContext, SessionData};
///
/// let root = RequestContext::new();
/// let child = root.with_session(SessionData::new(1, "jdoe"));
///
/// assert!(root.session().is_none());
/// assert_eq!(child.session().map(|s| s.user_id), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    cookie_store: Option<Arc<dyn SessionStore>>,
    session: Option<Arc<SessionData>>,
    route: Option<Arc<RouteDescriptor>>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates an empty context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates an empty context with the specified request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            cookie_store: None,
            session: None,
            route: None,
            started_at: Instant::now(),
        }
    }

    /// Returns a new context with the session backend bound.
    #[must_use]
    pub fn with_cookie_store(&self, store: Arc<dyn SessionStore>) -> Self {
        Self {
            cookie_store: Some(store),
            ..self.clone()
        }
    }

    /// Returns a new context with the authenticated principal bound.
    #[must_use]
    pub fn with_session(&self, session: SessionData) -> Self {
        Self {
            session: Some(Arc::new(session)),
            ..self.clone()
        }
    }

    /// Returns a new context with the matched route bound.
    #[must_use]
    pub fn with_route(&self, route: Arc<RouteDescriptor>) -> Self {
        Self {
            route: Some(route),
            ..self.clone()
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the time elapsed since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns the session backend, if bound.
    #[must_use]
    pub fn cookie_store(&self) -> Option<&Arc<dyn SessionStore>> {
        self.cookie_store.as_ref()
    }

    /// Returns the authenticated principal, if bound.
    #[must_use]
    pub fn session(&self) -> Option<&SessionData> {
        self.session.as_deref()
    }

    /// Returns the matched route, if bound.
    #[must_use]
    pub fn route(&self) -> Option<&RouteDescriptor> {
        self.route.as_deref()
    }

    /// Returns the session backend or a wiring fault naming `stage`.
    pub fn require_cookie_store(
        &self,
        stage: &'static str,
    ) -> Result<&Arc<dyn SessionStore>, ScholarError> {
        self.cookie_store
            .as_ref()
            .ok_or(ScholarError::wiring(stage, "cookie_store"))
    }

    /// Returns the authenticated principal or a wiring fault naming `stage`.
    pub fn require_session(&self, stage: &'static str) -> Result<&SessionData, ScholarError> {
        self.session()
            .ok_or(ScholarError::wiring(stage, "session_data"))
    }

    /// Returns the matched route or a wiring fault naming `stage`.
    pub fn require_route(&self, stage: &'static str) -> Result<&RouteDescriptor, ScholarError> {
        self.route().ok_or(ScholarError::wiring(stage, "route"))
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
