//! Aula: a learning-management platform core.
//!
//! Profiles and roles, portal routing with a single request guard,
//! certificate issuance with public verification, an append-only points
//! ledger with achievements, course content items, and an AI tutor
//! proxied to an LLM completion API. State lives in SQLite; credentials
//! live with a hosted auth provider.

pub mod auth;
pub mod certificates;
pub mod content;
pub mod gamification;
pub mod http;
pub mod profiles;
pub mod storage;
pub mod tutor;

pub use http::{build_router, AppState};
pub use storage::{AppConfig, Database};
