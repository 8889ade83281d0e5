//! Route table.
//!
//! Maps a method and path to an [`Endpoint`]. Patterns are split on `/`;
//! a `{name}` segment matches any single segment and is captured into
//! [`PathParams`]. Mounts match every path under a prefix and are tried
//! only when no route matches, longest prefix first.
//!
//! # Example
//!
//! ```
//! use http::Method;
//! use scholar_core::RouteDescriptor;
//! use scholar_middleware::{Endpoint, FnHandler, Pipeline};
//! use scholar_server::{RouteLookup, RouteTable};
//!
//! let endpoint = Endpoint::new(
//!     RouteDescriptor::new("get_student", Method::GET, "/api/students/{id}"),
//!     Pipeline::default(),
//!     FnHandler::new(|_ctx, _req, _writer| Ok(())),
//! );
//!
//! let mut table = RouteTable::new();
//! table.add(endpoint).unwrap();
//!
//! match table.lookup(&Method::GET, "/api/students/42") {
//!     RouteLookup::Found { params, .. } => assert_eq!(params.get("id"), Some("42")),
//!     _ => unreachable!(),
//! }
//! ```

use crate::error::{ServerError, ServerResult};
use http::Method;
use scholar_middleware::Endpoint;
use std::collections::HashMap;

/// Path parameters captured from `{name}` segments.
///
/// Inserted into the request's extensions before the endpoint runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    /// Returns the value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of captured parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Returns true if both patterns match the same paths, whatever the
/// parameters are named.
fn same_shape(a: &[Segment], b: &[Segment]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|pair| match pair {
            (Segment::Literal(x), Segment::Literal(y)) => x == y,
            (Segment::Param(_), Segment::Param(_)) => true,
            _ => false,
        })
}

fn parse_pattern(pattern: &str) -> Vec<Segment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => Segment::Param(name.to_string()),
            None => Segment::Literal(s.to_string()),
        })
        .collect()
}

struct Route {
    segments: Vec<Segment>,
    endpoint: Endpoint,
}

impl Route {
    fn capture(&self, path: &str) -> Option<PathParams> {
        // Trailing slashes are significant: "/a/" never matches "/a".
        if path.len() > 1 && path.ends_with('/') {
            return None;
        }
        let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if actual.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, value) in self.segments.iter().zip(actual) {
            match segment {
                Segment::Literal(expected) if expected == value => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), value.to_string());
                }
            }
        }
        Some(PathParams(params))
    }
}

struct Mount {
    prefix: String,
    endpoint: Endpoint,
}

/// Result of looking up a request in the [`RouteTable`].
#[derive(Debug)]
pub enum RouteLookup<'a> {
    /// A route or mount matched.
    Found {
        /// The endpoint to serve the request.
        endpoint: &'a Endpoint,
        /// Captured path parameters.
        params: PathParams,
    },
    /// The path matched a route, but not with this method.
    MethodNotAllowed,
    /// Nothing matched.
    NotFound,
}

/// Method and path to endpoint table.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    mounts: Vec<Mount>,
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.routes.len())
            .field(
                "mounts",
                &self.mounts.iter().map(|m| m.prefix.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an endpoint under its route's method and pattern.
    pub fn add(&mut self, endpoint: Endpoint) -> ServerResult<()> {
        let route = endpoint.route();
        let segments = parse_pattern(route.pattern());

        let duplicate = self.routes.iter().any(|existing| {
            existing.endpoint.route().method() == route.method()
                && same_shape(&existing.segments, &segments)
        });
        if duplicate {
            return Err(ServerError::DuplicateRoute {
                method: route.method().clone(),
                pattern: route.pattern().to_string(),
            });
        }

        tracing::debug!(
            route = route.name(),
            http.method = %route.method(),
            pattern = route.pattern(),
            "route registered"
        );
        self.routes.push(Route { segments, endpoint });
        Ok(())
    }

    /// Serves every path starting with `prefix` through `endpoint`.
    ///
    /// The method is not checked; the endpoint's handler decides.
    pub fn mount(&mut self, prefix: impl Into<String>, endpoint: Endpoint) {
        let prefix = prefix.into();
        tracing::debug!(prefix = %prefix, route = endpoint.route().name(), "mount registered");
        self.mounts.push(Mount { prefix, endpoint });
        self.mounts
            .sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
    }

    /// Finds the endpoint for a request.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> RouteLookup<'_> {
        let mut path_matched = false;
        for route in &self.routes {
            if let Some(params) = route.capture(path) {
                if route.endpoint.route().method() == method {
                    return RouteLookup::Found {
                        endpoint: &route.endpoint,
                        params,
                    };
                }
                path_matched = true;
            }
        }

        if let Some(mount) = self.mounts.iter().find(|m| path.starts_with(&m.prefix)) {
            return RouteLookup::Found {
                endpoint: &mount.endpoint,
                params: PathParams::default(),
            };
        }

        if path_matched {
            RouteLookup::MethodNotAllowed
        } else {
            RouteLookup::NotFound
        }
    }

    /// Number of routes, not counting mounts.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}
