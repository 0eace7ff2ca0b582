//! Wire-level request/response handling for the supported completion APIs.

use reqwest::Client;
use serde_json::{json, Value};

use super::LlmConfig;

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// Transport-level failure: the service could not be reached at all.
    #[error("Completion service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with a non-success status.
    #[error("Completion service error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A success response that carried no usable text content.
    #[error("Completion response carried no text content")]
    EmptyResponse,
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Unavailable(err.to_string())
    }
}

/// OpenAI-compatible chat completions (OpenAI itself and Ollama).
pub(crate) async fn complete_openai(
    client: &Client,
    endpoint: &str,
    api_key: Option<&str>,
    config: &LlmConfig,
    system_prompt: &str,
    user_message: &str,
) -> Result<String, CompletionError> {
    let body = json!({
        "model": config.model,
        "temperature": config.temperature,
        "max_tokens": config.max_tokens,
        "messages": [
            { "role": "system", "content": system_prompt },
            { "role": "user", "content": user_message },
        ],
    });

    let mut request = client.post(endpoint).json(&body);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(CompletionError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let payload: Value = response
        .json()
        .await
        .map_err(|_| CompletionError::EmptyResponse)?;
    payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(CompletionError::EmptyResponse)
}

/// Anthropic messages API. System prompt travels as its own parameter.
pub(crate) async fn complete_anthropic(
    client: &Client,
    endpoint: &str,
    api_key: Option<&str>,
    config: &LlmConfig,
    system_prompt: &str,
    user_message: &str,
) -> Result<String, CompletionError> {
    let body = json!({
        "model": config.model,
        "temperature": config.temperature,
        "max_tokens": config.max_tokens,
        "system": system_prompt,
        "messages": [
            { "role": "user", "content": user_message },
        ],
    });

    let response = client
        .post(endpoint)
        .header("x-api-key", api_key.unwrap_or_default())
        .header("anthropic-version", "2023-06-01")
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(CompletionError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let payload: Value = response
        .json()
        .await
        .map_err(|_| CompletionError::EmptyResponse)?;
    payload
        .pointer("/content/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(CompletionError::EmptyResponse)
}
