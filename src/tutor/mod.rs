//! AI tutor and authoring assistant, proxied to an external LLM API.

pub mod client;

pub use client::{TutorClient, TutorError, AUTHORING_SYSTEM_PROMPT, TUTOR_SYSTEM_PROMPT};
