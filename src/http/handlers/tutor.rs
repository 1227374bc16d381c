//! AI tutor endpoint.
//!
//! The completion is forwarded as a plain-text stream so the client can
//! render tokens as they arrive.

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::auth::provider::AuthProvider;
use crate::auth::types::{Role, SessionIdentity};
use crate::http::error::ApiError;
use crate::http::{require_role, AppState};
use crate::tutor::{AUTHORING_SYSTEM_PROMPT, TUTOR_SYSTEM_PROMPT};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TutorMode {
    #[default]
    Tutor,
    Authoring,
}

#[derive(Deserialize)]
pub struct ChatBody {
    pub prompt: String,
    #[serde(default)]
    pub mode: TutorMode,
}

/// POST /api/tutor/chat
pub async fn chat<P: AuthProvider + 'static>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<Option<SessionIdentity>>,
    Json(body): Json<ChatBody>,
) -> Result<Response, ApiError> {
    if body.prompt.trim().is_empty() {
        return Err(ApiError::Validation("prompt is required".to_string()));
    }

    let system_prompt = match body.mode {
        TutorMode::Tutor => TUTOR_SYSTEM_PROMPT,
        // The authoring assistant is a staff tool.
        TutorMode::Authoring => {
            require_role(&identity, &[Role::Admin, Role::Teacher])?;
            AUTHORING_SYSTEM_PROMPT
        }
    };

    let stream = state
        .tutor
        .stream_completion(system_prompt, body.prompt.trim())
        .await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    )
        .into_response())
}
