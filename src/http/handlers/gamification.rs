//! Points and achievement endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::provider::AuthProvider;
use crate::auth::types::{Role, SessionIdentity};
use crate::gamification::{AchievementManager, PointsLedger, StudentStats, TransactionKind};
use crate::http::error::ApiError;
use crate::http::{require_role, AppState};

#[derive(Deserialize)]
pub struct AwardBody {
    pub user_id: Uuid,
    pub points: i64,
    pub kind: TransactionKind,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Deserialize, Default)]
pub struct StatsBody {
    #[serde(default)]
    pub course_completions: u32,
    #[serde(default)]
    pub login_streak_days: u32,
    #[serde(default)]
    pub forum_posts: u32,
}

/// POST /api/points
pub async fn award<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Json(body): Json<AwardBody>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&identity, &[Role::Admin, Role::Teacher])?;

    if body.points == 0 {
        return Err(ApiError::Validation(
            "points must be non-zero".to_string(),
        ));
    }

    let db = state.db()?;
    let transaction = PointsLedger::new(db.connection()).award(
        body.user_id,
        body.points,
        body.kind,
        body.description.as_deref(),
    )?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// GET /api/users/:id/points
pub async fn total<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db()?;
    let total = PointsLedger::new(db.connection()).user_points(user_id)?;

    Ok(Json(json!({ "user_id": user_id, "total": total })))
}

/// GET /api/users/:id/points/transactions?limit=&offset=
pub async fn history<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params.limit.unwrap_or(50).min(200);
    let offset = params.offset.unwrap_or(0);

    let db = state.db()?;
    let transactions = PointsLedger::new(db.connection()).transactions(user_id, limit, offset)?;

    Ok(Json(transactions))
}

/// POST /api/users/:id/achievements/check
///
/// Activity counters come from the caller; totals come from the ledger.
/// Only staff may trigger a check since unlocks award points.
pub async fn check_achievements<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<StatsBody>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&identity, &[Role::Admin, Role::Teacher])?;

    let stats = StudentStats {
        course_completions: body.course_completions,
        login_streak_days: body.login_streak_days,
        forum_posts: body.forum_posts,
    };

    let db = state.db()?;
    let unlocked = AchievementManager::new(db.connection()).check_for_achievements(user_id, &stats)?;

    let summaries: Vec<_> = unlocked
        .iter()
        .map(|a| {
            json!({
                "id": a.id,
                "name": a.name,
                "description": a.description,
                "points": a.points,
            })
        })
        .collect();

    Ok(Json(summaries))
}

/// GET /api/users/:id/achievements
pub async fn unlocked<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db()?;
    let unlocked = AchievementManager::new(db.connection()).unlocked_for(user_id)?;

    let entries: Vec<_> = unlocked
        .iter()
        .map(|u| {
            json!({
                "id": u.achievement.id,
                "name": u.achievement.name,
                "description": u.achievement.description,
                "points": u.achievement.points,
                "unlocked_at": u.unlocked_at,
            })
        })
        .collect();

    Ok(Json(entries))
}
