//! Static per-route metadata.

use crate::Role;
use http::Method;
use std::collections::BTreeSet;

/// Metadata describing a registered route.
///
/// Descriptors are built once at registration time and shared read-only by
/// every request that matches the route.
///
/// # Example
///
/// ```
/// use http::Method;
/// use scholar_core::{Role, RouteDescriptor};
///
/// let route = RouteDescriptor::new("list_students", Method::GET, "/api/students")
///     .require(Role::Admin)
///     .require(Role::Teacher);
///
/// assert!(route.required_roles().contains(&Role::Teacher));
/// assert!(!route.is_authenticated_only());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    name: String,
    method: Method,
    pattern: String,
    required_roles: BTreeSet<Role>,
}

impl RouteDescriptor {
    /// Creates a descriptor with no required roles.
    #[must_use]
    pub fn new(name: impl Into<String>, method: Method, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            pattern: pattern.into(),
            required_roles: BTreeSet::new(),
        }
    }

    /// Adds a role that grants access. Any one listed role suffices.
    #[must_use]
    pub fn require(mut self, role: Role) -> Self {
        self.required_roles.insert(role);
        self
    }

    /// Adds several roles at once.
    #[must_use]
    pub fn require_any(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.required_roles.extend(roles);
        self
    }

    /// Route name, used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Path pattern, e.g. `/api/students/{id}`.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Roles any one of which grants access.
    #[must_use]
    pub const fn required_roles(&self) -> &BTreeSet<Role> {
        &self.required_roles
    }

    /// Returns true if any authenticated principal may access the route.
    #[must_use]
    pub fn is_authenticated_only(&self) -> bool {
        self.required_roles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_route_has_no_roles() {
        let route = RouteDescriptor::new("profile", Method::GET, "/api/me");
        assert!(route.is_authenticated_only());
        assert_eq!(route.name(), "profile");
        assert_eq!(route.method(), &Method::GET);
        assert_eq!(route.pattern(), "/api/me");
    }

    #[test]
    fn test_require_deduplicates() {
        let route = RouteDescriptor::new("x", Method::POST, "/x")
            .require(Role::Admin)
            .require(Role::Admin)
            .require_any([Role::Teacher, Role::Admin]);
        assert_eq!(route.required_roles().len(), 2);
    }
}
