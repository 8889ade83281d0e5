//! Roles and the role → claim predicate table.
//!
//! Roles are a closed enumeration. Whether a session holds a role is decided
//! by looking the role up in a [`RoleRegistry`], so adding a role means adding
//! a variant and one table entry rather than another conditional branch.

use crate::SessionData;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A role a route may require.
///
/// No hierarchy is modeled: `Admin` does not imply `Teacher`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// School administrator.
    Admin,
    /// Teacher.
    Teacher,
}

impl Role {
    /// All known roles.
    pub const ALL: [Role; 2] = [Role::Admin, Role::Teacher];

    /// Returns the canonical role name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Teacher => "TEACHER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "TEACHER" => Ok(Self::Teacher),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

/// Decides whether a session holds a role.
pub type RolePredicate = fn(&SessionData) -> bool;

/// Table mapping each role to the session claim that grants it.
///
/// # Example
///
/// ```
/// use scholar_core::{Role, RoleRegistry, SessionData};
///
/// let registry = RoleRegistry::default();
/// let session = SessionData::new(1, "mrs.k").teacher();
///
/// assert!(registry.grants(Role::Teacher, &session));
/// assert!(!registry.grants(Role::Admin, &session));
/// ```
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    predicates: HashMap<Role, RolePredicate>,
}

impl RoleRegistry {
    /// Creates an empty registry. Every role check fails against it.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            predicates: HashMap::new(),
        }
    }

    /// Registers (or replaces) the predicate for a role.
    #[must_use]
    pub fn with(mut self, role: Role, predicate: RolePredicate) -> Self {
        self.predicates.insert(role, predicate);
        self
    }

    /// Returns true if `session` holds `role`.
    ///
    /// Roles without a registered predicate are never granted.
    #[must_use]
    pub fn grants(&self, role: Role, session: &SessionData) -> bool {
        match self.predicates.get(&role) {
            Some(predicate) => predicate(session),
            None => {
                tracing::warn!(role = %role, "no predicate registered for role");
                false
            }
        }
    }

    /// Returns true if `session` holds at least one of `roles`.
    ///
    /// Stops at the first granted role.
    pub fn grants_any<'a, I>(&self, roles: I, session: &SessionData) -> bool
    where
        I: IntoIterator<Item = &'a Role>,
    {
        roles.into_iter().any(|role| self.grants(*role, session))
    }

    /// Returns true if a predicate is registered for `role`.
    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.predicates.contains_key(&role)
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::empty()
            .with(Role::Admin, |s| s.is_admin)
            .with(Role::Teacher, |s| s.is_teacher)
    }
}
