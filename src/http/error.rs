//! API error mapping.
//!
//! Every data-access failure is converted at the call site into one of
//! these variants; nothing is retried. User-facing messages are in
//! Portuguese, details stay in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::provider::ProviderError;
use crate::auth::sessions::SessionError;
use crate::certificates::CertificateError;
use crate::content::ContentError;
use crate::gamification::achievements::AchievementError;
use crate::gamification::ledger::LedgerError;
use crate::profiles::ProfileError;
use crate::storage::DatabaseError;
use crate::tutor::TutorError;

/// API-level error taxonomy. The payload carries the variant detail for
/// logging; the response body carries only the user-facing message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl ApiError {
    pub fn unexpected(detail: impl Into<String>) -> Self {
        ApiError::Unexpected(detail.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Duplicate(_) => StatusCode::CONFLICT,
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Dados inválidos",
            ApiError::Auth(_) => "Credenciais inválidas",
            ApiError::Forbidden(_) => "Acesso não autorizado",
            ApiError::NotFound(_) => "Registro não encontrado",
            ApiError::Duplicate(_) => "Registro já existe",
            ApiError::Unexpected(_) => "Erro inesperado. Tente novamente.",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Unexpected(detail) => tracing::error!("request failed: {}", detail),
            other => tracing::debug!("request rejected: {}", other),
        }

        (self.status(), Json(json!({ "error": self.user_message() }))).into_response()
    }
}

impl From<CertificateError> for ApiError {
    fn from(e: CertificateError) -> Self {
        match e {
            CertificateError::NotFound(d) => ApiError::NotFound(d),
            CertificateError::DuplicateIssuance(d) => ApiError::Duplicate(d),
            CertificateError::Validation(d) => ApiError::Validation(d),
            CertificateError::Database(d) => ApiError::Unexpected(d),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::NotFound(d) => ApiError::NotFound(d),
            ProfileError::DuplicateEmail(d) => ApiError::Duplicate(d),
            ProfileError::Validation(d) => ApiError::Validation(d),
            ProfileError::Database(d) => ApiError::Unexpected(d),
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(e: ContentError) -> Self {
        match e {
            ContentError::NotFound(d) => ApiError::NotFound(d),
            ContentError::KindImmutable { .. } => ApiError::Validation(e.to_string()),
            ContentError::Validation(d) => ApiError::Validation(d),
            ContentError::Serialization(d) | ContentError::Database(d) => ApiError::Unexpected(d),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Database(d) => ApiError::Unexpected(d),
        }
    }
}

impl From<AchievementError> for ApiError {
    fn from(e: AchievementError) -> Self {
        match e {
            AchievementError::NotFound(d) => ApiError::NotFound(d),
            AchievementError::Database(d) => ApiError::Unexpected(d),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Database(d) => ApiError::Unexpected(d),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::InvalidCredentials(d) => ApiError::Auth(d),
            ProviderError::Connection(d) | ProviderError::Api(d) | ProviderError::Unexpected(d) => {
                ApiError::Unexpected(d)
            }
        }
    }
}

impl From<TutorError> for ApiError {
    fn from(e: TutorError) -> Self {
        ApiError::Unexpected(e.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        ApiError::Unexpected(e.to_string())
    }
}
