//! HTTP client for OpenAI-compatible `chat/completions` endpoints.
//!
//! Implements [`ModelClient`] for the production path. Non-2xx responses
//! become typed [`ModelError`]s: 429 is surfaced as
//! [`ModelError::RateLimited`] so callers can tell quota problems apart
//! from other upstream failures.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use trendsignal_core::AppConfig;

use crate::client::ModelClient;
use crate::error::ModelError;
use crate::image::ImagePayload;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";

const VISION_MAX_TOKENS: u32 = 2048;
const CHAT_MAX_TOKENS: u32 = 1024;

/// Longest slice of a non-JSON error body echoed into [`ModelError::Api`].
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// OpenAI chat completions client.
///
/// Use [`OpenAiClient::from_config`] in binaries or
/// [`OpenAiClient::with_base_url`] to point at a mock server in tests.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    completions_url: String,
    vision_model: String,
    chat_model: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"[redacted]")
            .field("completions_url", &self.completions_url)
            .field("vision_model", &self.vision_model)
            .field("chat_model", &self.chat_model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Builds the client from application config.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotConfigured`] if no API key is configured, or
    /// [`ModelError::Http`] if the `reqwest::Client` cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, ModelError> {
        let api_key = config
            .openai_api_key
            .as_deref()
            .ok_or_else(|| ModelError::NotConfigured("OPENAI_API_KEY is not set".into()))?;

        Ok(
            Self::with_base_url(api_key, config.openai_timeout_secs, &config.openai_base_url)?
                .with_models(&config.openai_vision_model, &config.openai_chat_model),
        )
    }

    /// Creates a client pointed at the public OpenAI API with default models.
    ///
    /// # Errors
    ///
    /// See [`OpenAiClient::with_base_url`].
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, ModelError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotConfigured`] if `api_key` is blank, or
    /// [`ModelError::Http`] if the `reqwest::Client` cannot be constructed.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ModelError> {
        if api_key.trim().is_empty() {
            return Err(ModelError::NotConfigured("OPENAI_API_KEY is empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("trendsignal/0.1 (trend-analysis)")
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.trim().to_owned(),
            completions_url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            vision_model: DEFAULT_MODEL.to_owned(),
            chat_model: DEFAULT_MODEL.to_owned(),
        })
    }

    /// Overrides the models used for vision and chat calls.
    #[must_use]
    pub fn with_models(mut self, vision_model: &str, chat_model: &str) -> Self {
        vision_model.clone_into(&mut self.vision_model);
        chat_model.clone_into(&mut self.chat_model);
        self
    }

    /// Sends one user message and returns the assistant's text.
    ///
    /// # Errors
    ///
    /// - [`ModelError::RateLimited`] on HTTP 429.
    /// - [`ModelError::Api`] on any other non-2xx status.
    /// - [`ModelError::Http`] on network failure.
    /// - [`ModelError::Deserialize`] if the envelope is not JSON.
    async fn complete(
        &self,
        model: &str,
        content: Value,
        max_tokens: u32,
    ) -> Result<String, ModelError> {
        let body = json!({
            "model": model,
            "messages": [{ "role": "user", "content": content }],
            "max_tokens": max_tokens,
        });

        let response = self
            .client
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        tracing::debug!(model, status = %status, bytes = text.len(), "model completion returned");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::RateLimited(provider_error_message(&text)));
        }
        if !status.is_success() {
            return Err(ModelError::Api {
                status: status.as_u16(),
                message: provider_error_message(&text),
            });
        }

        let envelope: Value =
            serde_json::from_str(&text).map_err(|e| ModelError::Deserialize {
                context: "chat completion response".to_string(),
                source: e,
            })?;

        let content = envelope
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"));

        Ok(message_content_to_text(content))
    }
}

impl ModelClient for OpenAiClient {
    async fn vision_complete(
        &self,
        prompt: &str,
        image: &ImagePayload,
    ) -> Result<String, ModelError> {
        let content = json!([
            { "type": "text", "text": prompt },
            { "type": "image_url", "image_url": { "url": image.data_url() } },
        ]);
        self.complete(&self.vision_model, content, VISION_MAX_TOKENS)
            .await
    }

    async fn chat_complete(&self, prompt: &str) -> Result<String, ModelError> {
        self.complete(&self.chat_model, Value::String(prompt.to_owned()), CHAT_MAX_TOKENS)
            .await
    }
}

/// Extracts plain text from a message `content` that is either a string or a
/// list of typed content blocks. Missing content yields an empty string.
pub(crate) fn message_content_to_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Array(blocks)) => blocks
            .iter()
            .find(|block| block.get("type").and_then(Value::as_str) == Some("text"))
            .and_then(|block| block.get("text"))
            .and_then(Value::as_str)
            .map(|text| text.trim().to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Pulls `error.message` out of a provider error body, falling back to a
/// short preview of the raw body.
fn provider_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.get("message")?.as_str().map(str::to_owned))
        .unwrap_or_else(|| {
            let preview: String = body.trim().chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
            if preview.is_empty() {
                "empty error body".to_string()
            } else {
                preview
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_content_string_is_trimmed() {
        let content = json!("  {\"a\":1}\n");
        assert_eq!(message_content_to_text(Some(&content)), "{\"a\":1}");
    }

    #[test]
    fn message_content_blocks_use_first_text_block() {
        let content = json!([
            { "type": "refusal", "refusal": "no" },
            { "type": "text", "text": " first " },
            { "type": "text", "text": "second" }
        ]);
        assert_eq!(message_content_to_text(Some(&content)), "first");
    }

    #[test]
    fn message_content_missing_or_null_is_empty() {
        assert_eq!(message_content_to_text(None), "");
        assert_eq!(message_content_to_text(Some(&Value::Null)), "");
    }

    #[test]
    fn provider_error_message_prefers_error_message_field() {
        let body = r#"{"error": {"message": "You exceeded your current quota", "type": "insufficient_quota"}}"#;
        assert_eq!(provider_error_message(body), "You exceeded your current quota");
    }

    #[test]
    fn provider_error_message_falls_back_to_body_preview() {
        assert_eq!(provider_error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(provider_error_message(""), "empty error body");
    }

    #[test]
    fn blank_api_key_is_not_configured() {
        let err = OpenAiClient::new("  ", 5).unwrap_err();
        assert!(matches!(err, ModelError::NotConfigured(_)));
    }

    #[test]
    fn from_config_without_key_is_not_configured() {
        let config = AppConfig {
            env: trendsignal_core::Environment::Test,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "info".to_string(),
            max_upload_bytes: 1024,
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            openai_vision_model: "gpt-4o".to_string(),
            openai_chat_model: "gpt-4o".to_string(),
            openai_timeout_secs: 5,
        };
        let err = OpenAiClient::from_config(&config).unwrap_err();
        assert!(matches!(err, ModelError::NotConfigured(_)));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let client = OpenAiClient::new("sk-secret", 5).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("chat/completions"));
    }
}
