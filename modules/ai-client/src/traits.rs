use anyhow::Result;
use async_trait::async_trait;

/// A provider that turns text into fixed-length embedding vectors.
#[async_trait]
pub trait EmbedAgent: Send + Sync {
    async fn embed(&self, text: impl Into<String> + Send) -> Result<Vec<f32>>;
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}
