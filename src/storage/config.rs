//! Application configuration loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub http_addr: String,
    /// Database file path (defaults to the platform data directory)
    pub database_path: Option<PathBuf>,
    /// Short-circuit the request guard entirely. Development only; the
    /// server logs a warning at startup and on every request while set.
    pub dev_bypass_guard: bool,
    /// Hosted auth provider settings
    pub auth: AuthProviderSettings,
    /// LLM completion API settings
    pub llm: LlmSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:8080".to_string(),
            database_path: None,
            dev_bypass_guard: false,
            auth: AuthProviderSettings::default(),
            llm: LlmSettings::default(),
        }
    }
}

impl AppConfig {
    /// Resolve the database path, falling back to the platform data dir.
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| get_data_dir().join("aula.db"))
    }
}

/// Hosted auth provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthProviderSettings {
    /// Base URL of the hosted auth API
    pub base_url: String,
    /// API key sent with every request
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AuthProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9999/auth/v1".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

/// LLM completion API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Base URL of the completion API
    pub base_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "aula", "Aula")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from file.
///
/// A missing file yields the defaults; a malformed file is an error.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load application configuration from an explicit path.
pub fn load_config_from(path: &PathBuf) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Save application configuration to file.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    let path = get_config_path();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.http_addr, "127.0.0.1:8080");
        assert!(!config.dev_bypass_guard);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = load_config_from(&path).expect("missing file should not error");
        assert_eq!(config.http_addr, AppConfig::default().http_addr);
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
http_addr = "0.0.0.0:3000"
dev_bypass_guard = true

[auth]
base_url = "https://auth.example.com/v1"
api_key = "key"
timeout_secs = 5

[llm]
base_url = "https://llm.example.com/v1"
api_key = "key"
model = "test-model"
timeout_secs = 30
"#,
        )
        .unwrap();

        let config = load_config_from(&path).expect("Failed to load config");
        assert_eq!(config.http_addr, "0.0.0.0:3000");
        assert!(config.dev_bypass_guard);
        assert_eq!(config.llm.model, "test-model");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "http_addr = [not toml").unwrap();

        assert!(matches!(
            load_config_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
