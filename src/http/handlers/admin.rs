//! Admin portal user management.
//!
//! Routed under /admin so the guard already restricts these to the admin
//! portal owner; the explicit role check here covers the dev bypass path.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::provider::AuthProvider;
use crate::auth::sessions::SessionManager;
use crate::auth::types::{Role, SessionIdentity};
use crate::http::error::ApiError;
use crate::http::{require_role, AppState};
use crate::profiles::ProfileManager;

#[derive(Deserialize)]
pub struct ListParams {
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateUserBody {
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct SetRoleBody {
    pub role: Role,
}

#[derive(Deserialize)]
pub struct SetActiveBody {
    pub active: bool,
}

/// GET /admin/api/users?role=
pub async fn list_users<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let role = params
        .role
        .as_deref()
        .map(|s| Role::from_str(s).ok_or_else(|| ApiError::Validation(format!("unknown role: {}", s))))
        .transpose()?;

    let db = state.db()?;
    Ok(Json(ProfileManager::new(db.connection()).list(role)?))
}

/// POST /admin/api/users
pub async fn create_user<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Json(body): Json<CreateUserBody>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let db = state.db()?;
    let profile = ProfileManager::new(db.connection()).create(&body.email, &body.full_name, body.role)?;

    tracing::info!(user = %profile.email, role = %profile.role, "Profile created by admin");

    Ok((StatusCode::CREATED, Json(profile)))
}

/// PUT /admin/api/users/:id/role
///
/// Sessions keep working: the role is resolved from the profile on every
/// request, so the change takes effect immediately.
pub async fn set_role<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Path(id): Path<Uuid>,
    Json(body): Json<SetRoleBody>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let db = state.db()?;
    let manager = ProfileManager::new(db.connection());
    manager.set_role(id, body.role)?;

    let profile = manager
        .get(id)?
        .ok_or_else(|| ApiError::NotFound(format!("Profile {}", id)))?;

    Ok(Json(profile))
}

/// PUT /admin/api/users/:id/active
pub async fn set_active<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Path(id): Path<Uuid>,
    Json(body): Json<SetActiveBody>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let db = state.db()?;
    let manager = ProfileManager::new(db.connection());
    manager.set_active(id, body.active)?;

    if !body.active {
        SessionManager::new(db.connection()).revoke_all(id)?;
    }

    let profile = manager
        .get(id)?
        .ok_or_else(|| ApiError::NotFound(format!("Profile {}", id)))?;

    Ok(Json(profile))
}

/// DELETE /admin/api/users/:id
///
/// Deactivation, not deletion: the row stays for issued certificates and
/// the points ledger to reference.
pub async fn deactivate_user<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_role(&identity, &[Role::Admin])?;

    let db = state.db()?;
    ProfileManager::new(db.connection()).set_active(id, false)?;
    SessionManager::new(db.connection()).revoke_all(id)?;

    tracing::info!(profile = %id, "Profile deactivated by admin");

    Ok(StatusCode::NO_CONTENT)
}
