//! Client for OpenAI-compatible chat completion endpoints.
//!
//! Works with OpenAI itself and with self-hosted servers that speak the same
//! schema (vLLM, Ollama, llama.cpp).

use crate::domain::ports::{ChatMessage, GradingModel};
use crate::utils::error::{GradeError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Clone)]
pub struct ChatModelSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub max_retries: u32,
    /// First backoff step; doubled on every retry.
    pub retry_delay: Duration,
}

impl Default for ChatModelSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            temperature: 0.0,
            max_tokens: 800,
            timeout: Duration::from_secs(60),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

pub struct OpenAiChatModel {
    client: reqwest::Client,
    settings: ChatModelSettings,
}

impl OpenAiChatModel {
    pub fn new(settings: ChatModelSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &ChatModelSettings {
        &self.settings
    }

    /// `retry_delay * 2^attempt`, saturating instead of overflowing for large attempt counts.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.settings
            .retry_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = self.settings.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|_| {
                GradeError::InvalidConfigValueError {
                    field: "llm.api_key".to_string(),
                    value: "<redacted>".to_string(),
                    reason: "API key contains characters not allowed in a header".to_string(),
                }
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    async fn send_once(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.settings.model,
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("LLM response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GradeError::LlmError {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatCompletionResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GradeError::model_response("completion has no choices"))
    }
}

#[async_trait]
impl GradingModel for OpenAiChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let attempts = self.settings.max_retries.max(1);
        let mut attempt = 0;

        loop {
            match self.send_once(messages).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    let backoff = self.backoff_delay(attempt);
                    tracing::warn!(
                        "🔄 LLM request failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempt + 1,
                        attempts,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
