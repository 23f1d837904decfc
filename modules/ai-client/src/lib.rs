//! OpenAI-compatible chat and embedding client.
//!
//! One wire protocol covers every provider this workspace talks to:
//! OpenAI itself, DeepSeek, and OpenRouter all speak the same
//! `/chat/completions` + `/embeddings` surface, differing only in base URL
//! and model names. Structured output uses `response_format: json_object`
//! (the mode all three support) with fence-tolerant decoding in [`util`].

mod client;
pub mod traits;
pub mod util;

pub(crate) mod types;

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use client::OpenAiClient;
use traits::EmbedAgent;
use types::{ChatRequest, ResponseFormat, WireMessage};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    model: String,
    embedding_model: String,
    base_url: Option<String>,
    timeout: Duration,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            embedding_model: "text-embedding-3-small".to_string(),
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Bound every request made by this client. Defaults to 60s.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn client(&self) -> OpenAiClient {
        let client = OpenAiClient::new(&self.api_key, self.timeout);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    /// Simple chat completion.
    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .message(WireMessage::system(system))
            .message(WireMessage::user(user))
            .max_tokens(4096)
            .temperature(0.0);

        let response = self.client().chat(&request).await?;

        response
            .text()
            .ok_or_else(|| anyhow!("No response from LLM"))
    }

    /// Simple text completion.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        self.chat_completion("You are a helpful assistant.", prompt)
            .await
    }

    /// Chat completion with the provider's JSON-object mode enabled.
    /// Returns the raw text; callers decode it with [`util::decode_json`],
    /// which also tolerates fence-wrapped output from providers that
    /// ignore the mode hint.
    pub async fn chat_completion_json(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .message(WireMessage::system(system))
            .message(WireMessage::user(user))
            .temperature(0.0)
            .response_format(ResponseFormat::json_object());

        let response = self.client().chat(&request).await?;

        response
            .text()
            .ok_or_else(|| anyhow!("No response from LLM"))
    }
}

#[async_trait]
impl EmbedAgent for OpenAi {
    async fn embed(&self, text: impl Into<String> + Send) -> Result<Vec<f32>> {
        self.client()
            .embed(&self.embedding_model, &text.into())
            .await
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.client()
            .embed_batch(&self.embedding_model, &texts)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_new() {
        let ai = OpenAi::new("sk-test", "deepseek-chat");
        assert_eq!(ai.model, "deepseek-chat");
        assert_eq!(ai.api_key, "sk-test");
        assert_eq!(ai.embedding_model, "text-embedding-3-small");
    }

    #[test]
    fn test_openai_with_base_url() {
        let ai = OpenAi::new("sk-test", "deepseek-chat")
            .with_base_url("https://api.deepseek.com/v1");
        assert_eq!(ai.base_url, Some("https://api.deepseek.com/v1".to_string()));
    }

    #[test]
    fn test_openai_with_embedding_model() {
        let ai = OpenAi::new("sk-test", "deepseek-chat")
            .with_embedding_model("text-embedding-3-large");
        assert_eq!(ai.embedding_model, "text-embedding-3-large");
    }
}
