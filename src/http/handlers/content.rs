//! Content authoring endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::provider::AuthProvider;
use crate::auth::types::{Role, SessionIdentity};
use crate::content::{ContentItem, ContentKind, ContentManager};
use crate::http::error::ApiError;
use crate::http::{require_role, AppState};

#[derive(Deserialize)]
pub struct ContentBody {
    pub title: String,
    pub kind: ContentKind,
    pub body: serde_json::Value,
    pub course_id: String,
    pub lesson_id: Option<String>,
}

/// POST /api/content
pub async fn create<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Json(body): Json<ContentBody>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&identity, &[Role::Admin, Role::Teacher])?;

    let item = ContentItem::new(
        body.title,
        body.kind,
        body.body,
        body.course_id,
        body.lesson_id,
    );

    let db = state.db()?;
    ContentManager::new(db.connection()).create(&item)?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/content/:id
pub async fn get<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db()?;
    let item = ContentManager::new(db.connection())
        .get(id)?
        .ok_or_else(|| ApiError::NotFound(format!("Content item {}", id)))?;

    Ok(Json(item))
}

/// GET /api/courses/:course_id/content
pub async fn list_for_course<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db()?;
    let items = ContentManager::new(db.connection()).list_for_course(&course_id)?;

    Ok(Json(items))
}

/// PUT /api/content/:id
///
/// Carrying a different kind than the stored one is rejected; authors
/// create a new item to change the content type.
pub async fn update<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Path(id): Path<Uuid>,
    Json(body): Json<ContentBody>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&identity, &[Role::Admin, Role::Teacher])?;

    let mut item = ContentItem::new(
        body.title,
        body.kind,
        body.body,
        body.course_id,
        body.lesson_id,
    );
    item.id = id;

    let db = state.db()?;
    let manager = ContentManager::new(db.connection());
    manager.update(&item)?;

    let stored = manager
        .get(id)?
        .ok_or_else(|| ApiError::NotFound(format!("Content item {}", id)))?;

    Ok(Json(stored))
}

/// DELETE /api/content/:id
pub async fn remove<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_role(&identity, &[Role::Admin, Role::Teacher])?;

    let db = state.db()?;
    ContentManager::new(db.connection()).delete(id)?;

    Ok(StatusCode::NO_CONTENT)
}
