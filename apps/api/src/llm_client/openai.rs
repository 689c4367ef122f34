//! OpenAI Chat Completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{send_with_retry, ClientOptions, CompletionProvider, LlmError};

const OPENAI_API_URL: &str = "https://api.openai.com";
/// The model used for every OpenAI extraction call.
pub const MODEL: &str = "gpt-4o";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    endpoint: String,
    options: ClientOptions,
}

impl OpenAiClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        options: ClientOptions,
    ) -> Result<Self, LlmError> {
        let base = base_url.unwrap_or_else(|| OPENAI_API_URL.to_string());
        Ok(Self {
            client: options.http_client()?,
            api_key,
            endpoint: format!("{}/v1/chat/completions", base.trim_end_matches('/')),
            options,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    fn display_name(&self) -> &str {
        "OpenAI"
    }

    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let request_body = ChatRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.options.temperature,
        };

        let body = send_with_retry(&self.options, || {
            self.client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request_body)
        })
        .await?;

        let response: ChatResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &response.usage {
            debug!(
                "OpenAI call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}
