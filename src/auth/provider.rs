//! Hosted auth provider client.
//!
//! Credentials are never checked locally: sign-in, sign-up, and user lookup
//! are delegated to the hosted provider through this seam. Errors are
//! propagated, never retried.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::storage::config::AuthProviderSettings;

/// Trait for hosted auth provider implementations.
pub trait AuthProvider: Send + Sync {
    /// Exchange email/password for a provider session.
    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<ProviderSession, ProviderError>> + Send;

    /// Register a new identity with the provider.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<ProviderUser, ProviderError>> + Send;

    /// Fetch the identity behind a provider access token.
    fn get_user(
        &self,
        access_token: &str,
    ) -> impl std::future::Future<Output = Result<ProviderUser, ProviderError>> + Send;
}

/// Identity record returned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub email_confirmed: bool,
}

/// Provider-side session returned on sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    pub user: ProviderUser,
}

/// Reqwest-backed client for the hosted auth API.
pub struct HostedAuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HostedAuthClient {
    /// Create a client from configuration.
    pub fn new(settings: &AuthProviderSettings) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Unexpected(e.to_string()))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::BAD_REQUEST
        {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::InvalidCredentials(body));
        }
        if !status.is_success() {
            return Err(ProviderError::Api(format!("status {}", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Api(e.to_string()))
    }
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

impl AuthProvider for HostedAuthClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError> {
        let response = self
            .http
            .post(format!("{}/token?grant_type=password", self.base_url))
            .header("apikey", &self.api_key)
            .json(&CredentialsBody { email, password })
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        Self::decode(response).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError> {
        let response = self
            .http
            .post(format!("{}/signup", self.base_url))
            .header("apikey", &self.api_key)
            .json(&CredentialsBody { email, password })
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        Self::decode(response).await
    }

    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, ProviderError> {
        let response = self
            .http
            .get(format!("{}/user", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        Self::decode(response).await
    }
}

/// Auth provider errors.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Provider unreachable: {0}")]
    Connection(String),

    #[error("Provider API error: {0}")]
    Api(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}
