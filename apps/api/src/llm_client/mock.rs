use std::sync::Mutex;

use async_trait::async_trait;

use super::{CompletionProvider, LlmError};

/// Canned provider for tests. Replays one reply (or error) and records the prompts it saw.
pub struct MockProvider {
    name: &'static str,
    reply: Box<dyn Fn() -> Result<String, LlmError> + Send + Sync>,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self {
            name: "OpenAI",
            reply: Box::new(move || Ok(text.clone())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing<F>(make_error: F) -> Self
    where
        F: Fn() -> LlmError + Send + Sync + 'static,
    {
        Self {
            name: "OpenAI",
            reply: Box::new(move || Err(make_error())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Reports a different provider name (defaults to "OpenAI").
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn display_name(&self) -> &str {
        self.name
    }

    async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.reply)()
    }
}
