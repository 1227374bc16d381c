//! Sign-in, registration, and session endpoints.
//!
//! Credentials never touch this crate: both login and registration are
//! delegated to the hosted provider, and only on success is a local
//! session minted against the profile row.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::provider::AuthProvider;
use crate::auth::sessions::SessionManager;
use crate::auth::types::{Role, SessionIdentity};
use crate::http::error::ApiError;
use crate::http::AppState;
use crate::profiles::ProfileManager;

#[derive(Deserialize)]
pub struct CredentialsBody {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterBody {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub dashboard: &'static str,
}

/// POST /api/auth/login
pub async fn login<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<LoginResponse>, ApiError> {
    let provider_session = state
        .provider
        .sign_in_with_password(&body.email, &body.password)
        .await?;

    let db = state.db()?;
    let profiles = ProfileManager::new(db.connection());

    let profile = profiles
        .get_by_email(&body.email)?
        .ok_or_else(|| ApiError::Auth(format!("no profile for {}", body.email)))?;

    if !profile.active {
        return Err(ApiError::Forbidden(format!(
            "profile {} is deactivated",
            profile.id
        )));
    }

    if provider_session.user.email_confirmed && !profile.email_verified {
        profiles.mark_email_verified(profile.id)?;
    }

    let session = SessionManager::new(db.connection()).create(profile.id)?;

    tracing::info!(user = %profile.email, role = %profile.role, "User signed in");

    Ok(Json(LoginResponse {
        token: session.token,
        role: profile.role,
        dashboard: profile.role.dashboard_path(),
    }))
}

/// POST /api/auth/register
///
/// Self-registration always lands on the student role; any other role is
/// granted later through the admin portal.
pub async fn register<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.provider.sign_up(&body.email, &body.password).await?;

    let db = state.db()?;
    let profiles = ProfileManager::new(db.connection());

    let profile = profiles.create(&body.email, &body.full_name, Role::Student)?;
    if user.email_confirmed {
        profiles.mark_email_verified(profile.id)?;
    }

    tracing::info!(user = %profile.email, "Profile registered");

    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /api/auth/logout
pub async fn logout<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::Auth("no session token to revoke".to_string()))?;

    let db = state.db()?;
    SessionManager::new(db.connection()).revoke(&token)?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/me
pub async fn me<P: AuthProvider + 'static>(
    Extension(identity): Extension<Option<SessionIdentity>>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = identity.ok_or_else(|| ApiError::Auth("no session".to_string()))?;

    Ok(Json(json!({
        "profile_id": identity.profile_id,
        "email": identity.email,
        "role": identity.role,
        "dashboard": identity.role.dashboard_path(),
    })))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
}
