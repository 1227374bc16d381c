//! Roles, sessions, and per-request authentication state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Portal role attached to a profile.
///
/// Adding a role is a compile-time-checked change: every mapping below is
/// an exhaustive match, never a string-keyed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    PoloManager,
    Partner,
    Operator,
}

impl Role {
    /// Stable string form used in the database and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::PoloManager => "polo_manager",
            Role::Partner => "partner",
            Role::Operator => "operator",
        }
    }

    /// Parse the stable string form.
    pub fn from_str(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            "polo_manager" => Some(Role::PoloManager),
            "partner" => Some(Role::Partner),
            "operator" => Some(Role::Operator),
            _ => None,
        }
    }

    /// Dashboard path this role lands on after sign-in.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Teacher => "/professor/dashboard",
            Role::Student => "/aluno/dashboard",
            Role::PoloManager => "/polo/dashboard",
            Role::Partner => "/parceiro/dashboard",
            Role::Operator => "/operador/dashboard",
        }
    }

    /// Path prefix of the portal this role owns.
    pub fn portal_prefix(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Teacher => "/professor",
            Role::Student => "/aluno",
            Role::PoloManager => "/polo",
            Role::Partner => "/parceiro",
            Role::Operator => "/operador",
        }
    }

    /// All roles, in display order.
    pub fn all() -> [Role; 6] {
        [
            Role::Admin,
            Role::Teacher,
            Role::Student,
            Role::PoloManager,
            Role::Partner,
            Role::Operator,
        ]
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authentication state of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated(Role),
}

/// A persisted session (opaque bearer token bound to a profile).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub profile_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Resolved identity of an incoming session token.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub profile_id: Uuid,
    pub role: Role,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in Role::all() {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("professor"), None);
    }

    #[test]
    fn test_dashboard_under_own_portal() {
        for role in Role::all() {
            assert!(role.dashboard_path().starts_with(role.portal_prefix()));
        }
    }
}
