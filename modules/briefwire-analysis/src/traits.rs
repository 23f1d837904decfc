// Trait abstractions for the classification stages' external providers.
//
// ChatModel — one seam for every LLM call (adjudication, themes, fields,
// insight, taxonomy bootstrap). TextEmbedder — the semantic-similarity
// stage's provider. Both are injected explicitly; nothing reads a client
// out of ambient state, and tests swap in deterministic stubs with no
// network.

use anyhow::Result;
use async_trait::async_trait;

use ai_client::traits::EmbedAgent;
use ai_client::OpenAi;

// ---------------------------------------------------------------------------
// ChatModel
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Free-form chat completion.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Completion with the provider's JSON-object mode enabled. Returns the
    /// raw text; callers decode through `ai_client::util::decode_json`.
    async fn complete_json(&self, system: &str, user: &str) -> Result<String>;
}

#[async_trait]
impl ChatModel for OpenAi {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.chat_completion(system, user).await
    }

    async fn complete_json(&self, system: &str, user: &str) -> Result<String> {
        self.chat_completion_json(system, user).await
    }
}

// ---------------------------------------------------------------------------
// TextEmbedder
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a single text into a fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
impl TextEmbedder for OpenAi {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        EmbedAgent::embed(self, text.to_string()).await
    }
}
