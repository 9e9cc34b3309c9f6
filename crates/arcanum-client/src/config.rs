//! Client configuration.
//!
//! Resolved from environment variables with sensible defaults, mirroring
//! the deployment knobs of the hosted site.

use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "/api";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_CHAT_ENDPOINT: &str = "/api/chat/completion";
const DEFAULT_CHAT_MODEL: &str = "deepseek-chat";

/// Configuration for the HTTP gateway and the chat endpoint.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the blog backend.
    pub base_url: String,
    /// Timeout applied to every backend request.
    pub timeout: Duration,
    /// Chat-completion endpoint (absolute, or relative to the host).
    pub chat_endpoint: String,
    /// Optional bearer key for the chat endpoint.
    pub chat_api_key: Option<String>,
    /// Default model requested from the chat endpoint.
    pub chat_model: String,
}

impl ClientConfig {
    /// Loads configuration from environment variables.
    ///
    /// Recognized variables: `ARCANUM_API_BASE_URL`, `ARCANUM_API_TIMEOUT_MS`,
    /// `ARCANUM_CHAT_API_URL`, `ARCANUM_CHAT_API_KEY`, `ARCANUM_CHAT_MODEL`.
    /// Unset or malformed values fall back to defaults.
    pub fn from_env() -> Self {
        let timeout_ms = env::var("ARCANUM_API_TIMEOUT_MS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Self {
            base_url: non_empty_env("ARCANUM_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_millis(timeout_ms),
            chat_endpoint: non_empty_env("ARCANUM_CHAT_API_URL")
                .unwrap_or_else(|| DEFAULT_CHAT_ENDPOINT.to_string()),
            chat_api_key: non_empty_env("ARCANUM_CHAT_API_KEY"),
            chat_model: non_empty_env("ARCANUM_CHAT_MODEL")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
        }
    }

    /// Resolves the model for a request, preferring an explicit override.
    pub fn resolve_model(&self, model: Option<&str>) -> String {
        match model.map(str::trim) {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => self.chat_model.clone(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            chat_endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            chat_api_key: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
