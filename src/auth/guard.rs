//! Request-time authorization guard.
//!
//! Stateless decision table evaluated once per request, before any page or
//! API logic runs. No side effects beyond the returned decision.

use super::types::{AuthState, Role};

/// Pages reachable without a session. An authenticated user hitting one of
/// these is bounced to their own dashboard.
pub const AUTH_PAGES: &[&str] = &[
    "/",
    "/login",
    "/register",
    "/verify-email",
    "/reset-password",
    "/reset-password/confirm",
];

/// API paths open to everyone, session or not. The certificate verification
/// endpoint is the public trust surface and must never require a session.
pub const OPEN_API_PATHS: &[&str] = &[
    "/api/auth/login",
    "/api/auth/register",
    "/api/certificates/verify",
];

/// Outcome of evaluating a request against the decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Pass the request through unchanged.
    Allow,
    /// No session on a protected path.
    RedirectLogin,
    /// Session present on a public/auth page.
    RedirectDashboard(Role),
    /// Session role does not own the requested portal.
    RedirectHome,
}

/// Whether the path is one of the enumerated auth pages.
pub fn is_auth_page(path: &str) -> bool {
    AUTH_PAGES.contains(&path)
}

/// Whether the path is an always-open API endpoint.
pub fn is_open_api_path(path: &str) -> bool {
    OPEN_API_PATHS.contains(&path)
}

/// The role owning the portal this path belongs to, if any.
///
/// Paths outside every portal prefix (shared pages, generic API routes) have
/// no owner and are accessible to any authenticated role.
pub fn portal_owner(path: &str) -> Option<Role> {
    Role::all().into_iter().find(|role| {
        let prefix = role.portal_prefix();
        path == prefix || path.starts_with(&format!("{}/", prefix))
    })
}

/// Evaluate the decision table for one request.
///
/// 1. No session and the path is protected: redirect to login.
/// 2. Session present and the path is an auth page: redirect to that
///    role's dashboard.
/// 3. Session present and the path belongs to another role's portal:
///    redirect to home.
/// 4. Otherwise: allow.
pub fn evaluate(state: AuthState, path: &str) -> GuardDecision {
    if is_open_api_path(path) {
        return GuardDecision::Allow;
    }

    match state {
        AuthState::Unauthenticated => {
            if is_auth_page(path) {
                GuardDecision::Allow
            } else {
                GuardDecision::RedirectLogin
            }
        }
        AuthState::Authenticated(role) => {
            if is_auth_page(path) {
                return GuardDecision::RedirectDashboard(role);
            }
            match portal_owner(path) {
                Some(owner) if owner != role => GuardDecision::RedirectHome,
                _ => GuardDecision::Allow,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthenticated_protected_redirects_to_login() {
        for path in ["/admin/dashboard", "/aluno/cursos", "/api/points", "/perfil"] {
            assert_eq!(
                evaluate(AuthState::Unauthenticated, path),
                GuardDecision::RedirectLogin,
                "path {path}"
            );
        }
    }

    #[test]
    fn test_unauthenticated_auth_pages_allowed() {
        for path in AUTH_PAGES {
            assert_eq!(
                evaluate(AuthState::Unauthenticated, path),
                GuardDecision::Allow
            );
        }
    }

    #[test]
    fn test_authenticated_on_auth_page_goes_to_dashboard() {
        for role in Role::all() {
            assert_eq!(
                evaluate(AuthState::Authenticated(role), "/login"),
                GuardDecision::RedirectDashboard(role)
            );
        }
    }

    #[test]
    fn test_cross_role_portal_access_denied() {
        for r1 in Role::all() {
            for r2 in Role::all() {
                let decision = evaluate(
                    AuthState::Authenticated(r1),
                    &format!("{}/dashboard", r2.portal_prefix()),
                );
                if r1 == r2 {
                    assert_eq!(decision, GuardDecision::Allow);
                } else {
                    assert_eq!(decision, GuardDecision::RedirectHome);
                }
            }
        }
    }

    #[test]
    fn test_unowned_protected_path_allowed_for_any_role() {
        for role in Role::all() {
            assert_eq!(
                evaluate(AuthState::Authenticated(role), "/api/content/abc"),
                GuardDecision::Allow
            );
        }
    }

    #[test]
    fn test_verification_endpoint_always_open() {
        assert_eq!(
            evaluate(AuthState::Unauthenticated, "/api/certificates/verify"),
            GuardDecision::Allow
        );
        assert_eq!(
            evaluate(
                AuthState::Authenticated(Role::Student),
                "/api/certificates/verify"
            ),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_prefix_matching_is_segment_aware() {
        // "/administracao" is not the admin portal
        assert_eq!(portal_owner("/administracao"), None);
        assert_eq!(portal_owner("/admin"), Some(Role::Admin));
        assert_eq!(portal_owner("/admin/usuarios"), Some(Role::Admin));
    }
}
