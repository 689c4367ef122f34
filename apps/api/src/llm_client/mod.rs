/// LLM Client: the single point of entry for all provider calls.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// All LLM interactions MUST go through a `CompletionProvider`.
///
/// Model identifiers are fixed per provider (see `openai::MODEL`, `gemini::MODEL`).
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::config::{Config, ProviderKind};

pub mod gemini;
#[cfg(test)]
pub mod mock;
pub mod openai;
pub mod prompts;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Authentication failed (status {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Unexpected response envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// A hosted text-generation API that turns a prompt into a text reply.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Human-readable provider name used in logs and error payloads.
    fn display_name(&self) -> &str;

    /// Sends one prompt and returns the model's raw text reply.
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

/// Transport settings shared by every provider client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub temperature: f32,
    pub max_attempts: u32,
    /// Base delay for exponential backoff between attempts.
    pub backoff_base: Duration,
}

impl ClientOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: Duration::from_secs(config.request_timeout_secs),
            temperature: config.temperature,
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(1000),
        }
    }

    pub(crate) fn http_client(&self) -> Result<Client, LlmError> {
        Ok(Client::builder().timeout(self.timeout).build()?)
    }
}

/// Builds the provider selected by configuration.
pub fn build_provider(config: &Config) -> Result<Arc<dyn CompletionProvider>, LlmError> {
    let options = ClientOptions::from_config(config);
    let base_url = config.api_base_url.clone();

    let provider: Arc<dyn CompletionProvider> = match config.provider {
        ProviderKind::OpenAi => Arc::new(OpenAiClient::new(
            config.api_key.clone(),
            base_url,
            options,
        )?),
        ProviderKind::Gemini => Arc::new(GeminiClient::new(
            config.api_key.clone(),
            base_url,
            options,
        )?),
    };
    Ok(provider)
}

/// Error body shape shared by the OpenAI and Gemini APIs.
#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Sends a request built by `make_request`, retrying on 429 and 5xx with exponential
/// backoff until `options.max_attempts` is exhausted. Returns the raw success body.
pub(crate) async fn send_with_retry<F>(
    options: &ClientOptions,
    make_request: F,
) -> Result<String, LlmError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..options.max_attempts {
        if attempt > 0 {
            let delay = backoff_delay(options.backoff_base, attempt);
            warn!(
                "LLM call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let response = match make_request().send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Err(LlmError::Timeout),
            Err(e) => {
                last_error = Some(LlmError::Http(e));
                continue;
            }
        };

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            last_error = Some(if status.as_u16() == 429 {
                LlmError::RateLimited {
                    attempts: attempt + 1,
                }
            } else {
                LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                }
            });
            continue;
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(body);
            return Err(match status.as_u16() {
                401 | 403 => LlmError::Auth {
                    status: status.as_u16(),
                    message,
                },
                code => LlmError::Api {
                    status: code,
                    message,
                },
            });
        }

        return match response.text().await {
            Ok(body) => Ok(body),
            Err(e) if e.is_timeout() => Err(LlmError::Timeout),
            Err(e) => Err(LlmError::Http(e)),
        };
    }

    Err(last_error.unwrap_or(LlmError::RateLimited {
        attempts: options.max_attempts,
    }))
}

/// Delay before retry number `attempt` (1-based): base, 2x, 4x ... capped at 2^16 x base.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    base.saturating_mul(1u32 << exponent)
}

fn error_message(body: String) -> String {
    serde_json::from_str::<ProviderError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// A fence that opens and closes the whole reply. Greedy, so fences inside the JSON survive.
static WHOLE_REPLY_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A```(?:json|JSON)?[ \t]*\r?\n?(.*)```\z").expect("Invalid fence regex")
});

/// A fenced block surrounded by model chatter. The fences must sit on their own lines.
static EMBEDDED_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?:\A|\n)```(?:json|JSON)?[ \t]*\r?\n(.*)\n[ \t]*```")
        .expect("Invalid fence regex")
});

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
///
/// A reply that already starts like JSON is only trimmed. Text outside a fenced
/// block (model chatter) is dropped.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(inner) = WHOLE_REPLY_FENCE.captures(text).and_then(|c| c.get(1)) {
        return inner.as_str().trim();
    }
    if text.starts_with('{') || text.starts_with('[') {
        return text;
    }
    if let Some(inner) = EMBEDDED_FENCE.captures(text).and_then(|c| c.get(1)) {
        return inner.as_str().trim();
    }
    // Unterminated fence (reply cut off at max tokens)
    text.strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .map(str::trim)
        .unwrap_or(text)
}

/// Strips code fences and deserializes the remaining text as JSON.
pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_json_fences(text))
}
