//! Deterministic providers used in tests and as the safe default when no
//! research API key is configured (`ResearchClientKind::Stub`). None of
//! these make a network call; `StubEmbeddingProvider`'s vectors are a hash
//! of the input text, so the same text always embeds to the same vector.

use crate::{EmbeddingProvider, ResearchClient, SummarizationProvider, SummarizeConfig};
use async_trait::async_trait;
use plasticos_core::{EmbeddingVector, PlasticResult};
use std::hash::{Hash, Hasher};

/// Answers every query with a fixed echo of the prompt, prefixed so callers
/// can tell a stub response from a real one in logs and fixtures.
#[derive(Debug, Clone, Default)]
pub struct StubResearchClient;

#[async_trait]
impl ResearchClient for StubResearchClient {
    async fn run_query(&self, prompt: &str) -> PlasticResult<String> {
        Ok(format!("[stub research response] {prompt}"))
    }

    fn provider_id(&self) -> &str {
        "stub"
    }
}

/// Deterministic, hash-derived embeddings. Not semantically meaningful —
/// good enough for exercising the storage and matching pipeline without a
/// real provider.
#[derive(Debug, Clone)]
pub struct StubEmbeddingProvider {
    dimensions: i32,
}

impl Default for StubEmbeddingProvider {
    fn default() -> Self {
        Self { dimensions: 384 }
    }
}

impl StubEmbeddingProvider {
    pub fn new(dimensions: i32) -> Self {
        Self { dimensions }
    }

    fn hash_embed(&self, text: &str) -> Vec<f32> {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();

        (0..self.dimensions)
            .map(|i| {
                let mixed = seed.wrapping_add(i as u64).wrapping_mul(2_654_435_761);
                ((mixed % 2000) as f32 / 1000.0) - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbeddingProvider {
    async fn embed(&self, text: &str) -> PlasticResult<EmbeddingVector> {
        Ok(EmbeddingVector::new(self.hash_embed(text), self.model_id()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> PlasticResult<Vec<EmbeddingVector>> {
        Ok(texts.iter().map(|t| EmbeddingVector::new(self.hash_embed(t), self.model_id())).collect())
    }

    fn dimensions(&self) -> i32 {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        "stub-embedding-v1"
    }
}

/// Truncates to `max_tokens` characters as a stand-in for a real summary.
#[derive(Debug, Clone, Default)]
pub struct StubSummarizationProvider;

#[async_trait]
impl SummarizationProvider for StubSummarizationProvider {
    async fn summarize(&self, content: &str, config: &SummarizeConfig) -> PlasticResult<String> {
        let limit = (config.max_tokens.max(0) as usize).min(content.len());
        Ok(content[..limit].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_embeds_to_the_same_vector() {
        let provider = StubEmbeddingProvider::default();
        let a = provider.embed("polypropylene resin, Houston").await.unwrap();
        let b = provider.embed("polypropylene resin, Houston").await.unwrap();
        assert_eq!(a.data, b.data);
    }

    #[tokio::test]
    async fn different_text_embeds_to_different_vectors() {
        let provider = StubEmbeddingProvider::default();
        let a = provider.embed("polypropylene").await.unwrap();
        let b = provider.embed("polyethylene").await.unwrap();
        assert_ne!(a.data, b.data);
    }

    #[tokio::test]
    async fn research_client_echoes_the_prompt() {
        let client = StubResearchClient;
        let response = client.run_query("who buys recycled HDPE in Texas?").await.unwrap();
        assert!(response.contains("recycled HDPE"));
    }
}
