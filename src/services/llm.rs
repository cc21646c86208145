use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::ProviderError;
use crate::config::{Config, LlmProvider};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 100,
            temperature: 0.7,
        }
    }
}

/// A hosted language model: one system instruction and one user prompt in,
/// free-form text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, ProviderError>;
}

pub fn build_generator(config: &Config) -> anyhow::Result<Arc<dyn TextGenerator>> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.reflection_timeout_secs.max(1)))
        .build()?;

    let generator: Arc<dyn TextGenerator> = match config.llm_provider {
        LlmProvider::OpenAi => {
            if config.openai_api_key.is_empty() {
                tracing::warn!("OPENAI_API_KEY is not set; reflections will use the fallback text");
            }
            Arc::new(OpenAiClient {
                http,
                api_key: config.openai_api_key.clone(),
                model: config.openai_model.clone(),
            })
        }
        LlmProvider::Anthropic => {
            if config.anthropic_api_key.is_empty() {
                tracing::warn!(
                    "ANTHROPIC_API_KEY is not set; reflections will use the fallback text"
                );
            }
            Arc::new(AnthropicClient {
                http,
                api_key: config.anthropic_api_key.clone(),
                model: config.anthropic_model.clone(),
            })
        }
    };
    Ok(generator)
}

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::Unauthorized("no OpenAI API key configured".into()));
        }

        let response = self
            .http
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "max_tokens": options.max_tokens,
                "temperature": options.temperature,
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": prompt },
                ]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let body: serde_json::Value = response.json().await?;
        non_empty(body["choices"][0]["message"]["content"].as_str())
    }
}

pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::Unauthorized("no Anthropic API key configured".into()));
        }

        let response = self
            .http
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": self.model,
                "max_tokens": options.max_tokens,
                "temperature": options.temperature,
                "system": system,
                "messages": [{
                    "role": "user",
                    "content": prompt
                }]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let body: serde_json::Value = response.json().await?;
        non_empty(body["content"][0]["text"].as_str())
    }
}

fn non_empty(text: Option<&str>) -> Result<String, ProviderError> {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(ProviderError::Malformed("completion had no text".into())),
    }
}
