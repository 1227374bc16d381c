//! HTTP surface: router, shared state, guard wiring.

pub mod error;
pub mod handlers;
pub mod middleware;

use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::auth::provider::AuthProvider;
use crate::auth::types::{Role, SessionIdentity};
use crate::storage::{AppConfig, Database};
use crate::tutor::TutorClient;
use error::ApiError;

/// Name of the session cookie checked by the guard.
pub const SESSION_COOKIE: &str = "aula_session";

/// Shared application state.
pub struct AppState<P> {
    pub db: Arc<Mutex<Database>>,
    pub config: Arc<AppConfig>,
    pub provider: Arc<P>,
    pub tutor: Arc<TutorClient>,
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            config: Arc::clone(&self.config),
            provider: Arc::clone(&self.provider),
            tutor: Arc::clone(&self.tutor),
        }
    }
}

impl<P> AppState<P> {
    /// Create state from its parts.
    pub fn new(db: Database, config: AppConfig, provider: P, tutor: TutorClient) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config: Arc::new(config),
            provider: Arc::new(provider),
            tutor: Arc::new(tutor),
        }
    }

    /// Lock the database. Never held across an await point.
    pub fn db(&self) -> Result<MutexGuard<'_, Database>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::unexpected("database lock poisoned"))
    }
}

/// Reject requests whose identity is missing or outside the allowed roles.
pub fn require_role(
    identity: &Option<SessionIdentity>,
    allowed: &[Role],
) -> Result<SessionIdentity, ApiError> {
    match identity {
        Some(identity) if allowed.contains(&identity.role) => Ok(identity.clone()),
        Some(identity) => Err(ApiError::Forbidden(format!(
            "role {} not allowed",
            identity.role
        ))),
        None => Err(ApiError::Auth("no session".to_string())),
    }
}

/// Build the application router with the guard applied to every route.
pub fn build_router<P>(state: AppState<P>) -> Router
where
    P: AuthProvider + Send + Sync + 'static,
{
    Router::new()
        // Public trust-verification surface
        .route(
            "/api/certificates/verify",
            get(handlers::certificates::verify::<P>),
        )
        // Auth
        .route("/api/auth/login", post(handlers::auth::login::<P>))
        .route("/api/auth/register", post(handlers::auth::register::<P>))
        .route("/api/auth/logout", post(handlers::auth::logout::<P>))
        .route("/api/me", get(handlers::auth::me::<P>))
        // Certificates
        .route("/api/certificates", post(handlers::certificates::issue::<P>))
        .route(
            "/api/certificates/:id/revoke",
            post(handlers::certificates::revoke::<P>),
        )
        .route(
            "/api/certificates/:id/render",
            get(handlers::certificates::render::<P>),
        )
        .route(
            "/api/students/:id/certificates",
            get(handlers::certificates::list_for_student::<P>),
        )
        // Certificate templates (admin portal)
        .route(
            "/admin/api/certificate-templates",
            get(handlers::certificates::list_templates::<P>)
                .post(handlers::certificates::create_template::<P>),
        )
        // Gamification
        .route("/api/points", post(handlers::gamification::award::<P>))
        .route(
            "/api/users/:id/points",
            get(handlers::gamification::total::<P>),
        )
        .route(
            "/api/users/:id/points/transactions",
            get(handlers::gamification::history::<P>),
        )
        .route(
            "/api/users/:id/achievements/check",
            post(handlers::gamification::check_achievements::<P>),
        )
        .route(
            "/api/users/:id/achievements",
            get(handlers::gamification::unlocked::<P>),
        )
        // Content
        .route("/api/content", post(handlers::content::create::<P>))
        .route(
            "/api/content/:id",
            get(handlers::content::get::<P>)
                .put(handlers::content::update::<P>)
                .delete(handlers::content::remove::<P>),
        )
        .route(
            "/api/courses/:course_id/content",
            get(handlers::content::list_for_course::<P>),
        )
        // Admin user management (guard enforces the /admin portal owner)
        .route(
            "/admin/api/users",
            get(handlers::admin::list_users::<P>).post(handlers::admin::create_user::<P>),
        )
        .route(
            "/admin/api/users/:id/role",
            put(handlers::admin::set_role::<P>),
        )
        .route(
            "/admin/api/users/:id/active",
            put(handlers::admin::set_active::<P>),
        )
        .route(
            "/admin/api/users/:id",
            delete(handlers::admin::deactivate_user::<P>),
        )
        // AI tutor / authoring assistant
        .route("/api/tutor/chat", post(handlers::tutor::chat::<P>))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::guard::<P>,
        ))
        .with_state(state)
}
