//! Completion client: a thin adapter over the configured LLM provider.
//!
//! One operation, text in, text out. Failures surface as typed errors that the
//! chat service turns into conversational apologies; nothing is retried.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod providers;
pub use providers::CompletionError;

const PROVIDER_ENV: &str = "TASKDECK_LLM_PROVIDER";
const MODEL_ENV: &str = "TASKDECK_LLM_MODEL";
const ENDPOINT_ENV: &str = "TASKDECK_LLM_ENDPOINT";

/// Supported completion providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
    /// Ollama local LLM server (OpenAI-compatible API)
    Ollama,
}

impl Default for LlmProvider {
    fn default() -> Self {
        LlmProvider::Ollama
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::OpenAI => write!(f, "openai"),
            LlmProvider::Anthropic => write!(f, "anthropic"),
            LlmProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "anthropic" | "claude" => Ok(LlmProvider::Anthropic),
            "ollama" => Ok(LlmProvider::Ollama),
            _ => Err(format!("Unknown provider type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Ollama,
            model: "gpt-oss".to_string(),
            temperature: 0.3,
            max_tokens: 4096,
            endpoint: None,
        }
    }
}

impl LlmConfig {
    /// Defaults overridden by `TASKDECK_LLM_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(provider) = std::env::var(PROVIDER_ENV) {
            match provider.parse() {
                Ok(parsed) => config.provider = parsed,
                Err(err) => tracing::warn!("Ignoring {}: {}", PROVIDER_ENV, err),
            }
        }
        if let Ok(model) = std::env::var(MODEL_ENV) {
            config.model = model;
        }
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            config.endpoint = Some(endpoint);
        }
        config
    }
}

/// Thin wrapper around the configured completion provider.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    config: LlmConfig,
    client: Client,
    api_key: Option<String>,
}

impl CompletionClient {
    pub fn new(config: LlmConfig) -> Self {
        let api_key = match config.provider {
            LlmProvider::OpenAI => std::env::var("OPENAI_API_KEY").ok(),
            LlmProvider::Anthropic => std::env::var("ANTHROPIC_API_KEY").ok(),
            LlmProvider::Ollama => None,
        };

        match config.provider {
            LlmProvider::Ollama => {
                tracing::info!("Completion client initialized with Ollama (local, no API key)");
            }
            provider if api_key.is_some() => {
                tracing::info!("Completion client initialized with {} API key", provider);
            }
            provider => {
                tracing::warn!(
                    "Completion client created without API key for {} - calls will fail",
                    provider
                );
            }
        }

        Self {
            config,
            client: Client::new(),
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self.config.provider, LlmProvider::Ollama)
            || self.config.endpoint.is_some()
            || self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        if let Some(ref endpoint) = self.config.endpoint {
            return endpoint.clone();
        }
        match self.config.provider {
            LlmProvider::Ollama => {
                std::env::var("OLLAMA_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:11434".to_string())
                    + "/v1/chat/completions"
            }
            LlmProvider::OpenAI => "https://api.openai.com/v1/chat/completions".to_string(),
            LlmProvider::Anthropic => "https://api.anthropic.com/v1/messages".to_string(),
        }
    }

    /// Single completion call. No retry: a failed call becomes a user-visible
    /// conversational error upstream.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> std::result::Result<String, CompletionError> {
        let endpoint = self.endpoint();
        match self.config.provider {
            LlmProvider::OpenAI | LlmProvider::Ollama => {
                providers::complete_openai(
                    &self.client,
                    &endpoint,
                    self.api_key.as_deref(),
                    &self.config,
                    system_prompt,
                    user_message,
                )
                .await
            }
            LlmProvider::Anthropic => {
                providers::complete_anthropic(
                    &self.client,
                    &endpoint,
                    self.api_key.as_deref(),
                    &self.config,
                    system_prompt,
                    user_message,
                )
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_local_provider() {
        let config = LlmConfig::default();
        assert!(matches!(config.provider, LlmProvider::Ollama));
        assert_eq!(config.model, "gpt-oss");
    }

    #[test]
    fn provider_parses_aliases() {
        assert_eq!("claude".parse::<LlmProvider>(), Ok(LlmProvider::Anthropic));
        assert_eq!("OpenAI".parse::<LlmProvider>(), Ok(LlmProvider::OpenAI));
        assert!("mystery".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn client_with_custom_endpoint_is_configured() {
        let config = LlmConfig {
            provider: LlmProvider::OpenAI,
            endpoint: Some("http://localhost:8080/v1/chat/completions".to_string()),
            ..LlmConfig::default()
        };
        let client = CompletionClient::new(config);
        assert!(client.is_configured());
    }
}
