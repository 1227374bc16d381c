//! Guard middleware.
//!
//! Applies the decision table to every request before any handler runs.
//! The resolved identity (or its absence) is attached to the request so
//! handlers can enforce finer-grained role checks.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use super::{AppState, SESSION_COOKIE};
use crate::auth::guard::{evaluate, GuardDecision};
use crate::auth::provider::AuthProvider;
use crate::auth::sessions::SessionManager;
use crate::auth::types::{AuthState, SessionIdentity};

/// Evaluate the guard for one request.
pub async fn guard<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    mut req: Request,
    next: Next,
) -> Response {
    if state.config.dev_bypass_guard {
        tracing::warn!(path = %req.uri().path(), "Guard bypassed (dev_bypass_guard is set)");
        req.extensions_mut().insert(None::<SessionIdentity>);
        return next.run(req).await;
    }

    let token = extract_token(&req);
    let identity = token.as_deref().and_then(|t| resolve_identity(&state, t));

    let auth_state = match &identity {
        Some(identity) => AuthState::Authenticated(identity.role),
        None => AuthState::Unauthenticated,
    };

    let path = req.uri().path().to_string();
    match evaluate(auth_state, &path) {
        GuardDecision::Allow => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        GuardDecision::RedirectLogin => Redirect::temporary("/login").into_response(),
        GuardDecision::RedirectDashboard(role) => {
            Redirect::temporary(role.dashboard_path()).into_response()
        }
        GuardDecision::RedirectHome => Redirect::temporary("/").into_response(),
    }
}

/// Bearer token from the Authorization header, else the session cookie.
fn extract_token(req: &Request) -> Option<String> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    let cookies = req.headers().get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Resolve the session token, failing closed: any lookup error is treated
/// as an unauthenticated request.
fn resolve_identity<P: AuthProvider>(
    state: &AppState<P>,
    token: &str,
) -> Option<SessionIdentity> {
    let db = match state.db.lock() {
        Ok(db) => db,
        Err(_) => {
            tracing::warn!("Session lookup skipped: database lock poisoned");
            return None;
        }
    };

    match SessionManager::new(db.connection()).resolve(token) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Session lookup failed, treating as unauthenticated: {}", e);
            None
        }
    }
}
