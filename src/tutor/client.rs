//! LLM completion API client.
//!
//! One streaming chat-completion call: a system priming message plus the
//! user prompt. The response is forwarded as a stream of text deltas; no
//! retry or local cancellation beyond the HTTP client defaults.

use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::storage::config::LlmSettings;

/// System prompt for the student-facing tutor.
pub const TUTOR_SYSTEM_PROMPT: &str = "Você é um tutor educacional paciente. Responda em \
português, explique conceitos passo a passo e incentive o aluno a raciocinar.";

/// System prompt for the content-authoring assistant.
pub const AUTHORING_SYSTEM_PROMPT: &str = "Você é um assistente de criação de conteúdo \
educacional. Ajude professores a estruturar aulas, avaliações e materiais em português.";

/// Client for the LLM completion API.
pub struct TutorClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl TutorClient {
    /// Create a client from configuration.
    pub fn new(settings: &LlmSettings) -> Result<Self, TutorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| TutorError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    /// Send a prompt and stream back the completion text deltas.
    pub async fn stream_completion(
        &self,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<impl Stream<Item = Result<String, TutorError>>, TutorError> {
        let body = json!({
            "model": self.model,
            "stream": true,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": prompt },
            ],
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TutorError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TutorError::Api(format!("status {}: {}", status, detail)));
        }

        // SSE frames may be split across network chunks; carry the
        // incomplete tail in a line buffer between reads.
        let deltas = stream::unfold(
            (response.bytes_stream(), String::new()),
            |(mut bytes, mut buffer)| async move {
                loop {
                    match bytes.next().await {
                        Some(Ok(chunk)) => {
                            buffer.push_str(&String::from_utf8_lossy(&chunk));
                            let mut text = String::new();
                            while let Some(pos) = buffer.find('\n') {
                                let line = buffer[..pos].trim().to_string();
                                buffer.drain(..=pos);
                                if let Some(delta) = parse_sse_line(&line) {
                                    text.push_str(&delta);
                                }
                            }
                            if !text.is_empty() {
                                return Some((Ok(text), (bytes, buffer)));
                            }
                        }
                        Some(Err(e)) => {
                            return Some((
                                Err(TutorError::Connection(e.to_string())),
                                (bytes, buffer),
                            ));
                        }
                        None => return None,
                    }
                }
            },
        );

        Ok(deltas)
    }
}

/// Extract the content delta from one `data:` line, if any.
fn parse_sse_line(line: &str) -> Option<String> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }

    let chunk: CompletionChunk = serde_json::from_str(payload).ok()?;
    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|s| !s.is_empty())
}

#[derive(Deserialize)]
struct CompletionChunk {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    delta: CompletionDelta,
}

#[derive(Deserialize, Default)]
struct CompletionDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Tutor client errors.
#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("LLM API unreachable: {0}")]
    Connection(String),

    #[error("LLM API error: {0}")]
    Api(String),
}
