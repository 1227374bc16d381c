//! Shared test fixtures: an in-memory app with a stubbed auth provider.
#![allow(dead_code)]

use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use uuid::Uuid;

use aula::auth::provider::{AuthProvider, ProviderError, ProviderSession, ProviderUser};
use aula::auth::{Role, SessionManager};
use aula::certificates::{default_template, CertificateService};
use aula::gamification::AchievementManager;
use aula::http::{build_router, AppState};
use aula::profiles::ProfileManager;
use aula::storage::config::LlmSettings;
use aula::storage::{AppConfig, Database};
use aula::tutor::TutorClient;

/// Password the stub provider accepts.
pub const GOOD_PASSWORD: &str = "senha-correta";

/// Auth provider stub: accepts one password, confirms every email.
pub struct StubProvider;

impl AuthProvider for StubProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError> {
        if password != GOOD_PASSWORD {
            return Err(ProviderError::InvalidCredentials(
                "wrong password".to_string(),
            ));
        }
        Ok(ProviderSession {
            access_token: "stub-access-token".to_string(),
            user: ProviderUser {
                id: "stub-user".to_string(),
                email: email.to_string(),
                email_confirmed: true,
            },
        })
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<ProviderUser, ProviderError> {
        Ok(ProviderUser {
            id: "stub-user".to_string(),
            email: email.to_string(),
            email_confirmed: false,
        })
    }

    async fn get_user(&self, _access_token: &str) -> Result<ProviderUser, ProviderError> {
        Ok(ProviderUser {
            id: "stub-user".to_string(),
            email: "stub@example.com".to_string(),
            email_confirmed: true,
        })
    }
}

/// Build a router over a fresh in-memory database, seeded like the server.
pub fn setup() -> (Router, AppState<StubProvider>) {
    setup_with_config(AppConfig::default())
}

/// Same as [`setup`], with an explicit configuration.
pub fn setup_with_config(config: AppConfig) -> (Router, AppState<StubProvider>) {
    let db = Database::open_in_memory().expect("in-memory database");

    AchievementManager::new(db.connection())
        .initialize_achievements()
        .expect("seed achievements");
    CertificateService::new(db.connection())
        .create_template(&default_template())
        .expect("seed default template");

    let tutor = TutorClient::new(&LlmSettings::default()).expect("tutor client");
    let state = AppState::new(db, config, StubProvider, tutor);

    (build_router(state.clone()), state)
}

/// Create a profile with a live session, returning (profile id, token).
pub fn seed_user(state: &AppState<StubProvider>, email: &str, role: Role) -> (Uuid, String) {
    let db = state.db.lock().expect("database lock");
    let profile = ProfileManager::new(db.connection())
        .create(email, "Pessoa Teste", role)
        .expect("create profile");
    let session = SessionManager::new(db.connection())
        .create(profile.id)
        .expect("create session");
    (profile.id, session.token)
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}
