//! Aula server entry point.

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use aula::auth::HostedAuthClient;
use aula::certificates::{default_template, CertificateService};
use aula::gamification::AchievementManager;
use aula::http::{build_router, AppState};
use aula::storage::{load_config, Database};
use aula::tutor::TutorClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config().context("Failed to load configuration")?;

    if config.dev_bypass_guard {
        tracing::warn!("dev_bypass_guard is enabled: EVERY request skips the guard");
    }

    let db_path = config.resolved_database_path();
    tracing::info!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path).context("Failed to open database")?;

    seed(&db).context("Failed to seed initial data")?;

    let provider = HostedAuthClient::new(&config.auth).context("Failed to build auth client")?;
    let tutor = TutorClient::new(&config.llm).context("Failed to build tutor client")?;

    let http_addr = config.http_addr.clone();
    let state = AppState::new(db, config, provider, tutor);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("Failed to bind {}", http_addr))?;

    tracing::info!(addr = %http_addr, "Server listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Seed achievement rules and the default certificate template.
fn seed(db: &Database) -> anyhow::Result<()> {
    AchievementManager::new(db.connection()).initialize_achievements()?;

    let certificates = CertificateService::new(db.connection());
    if certificates.list_templates()?.is_empty() {
        certificates.create_template(&default_template())?;
        tracing::info!("Seeded default certificate template");
    }

    Ok(())
}
