//! Pluggable research-client and embedding/summarization provider traits
//! (spec §1, §6). `ResearchClient` is the single-method contract the
//! Research DAG's retrieval stage depends on; `EmbeddingProvider` backs BCP
//! embedding generation (§4.2); `SummarizationProvider` backs the
//! LLM-dependent reasoning blocks (§4.6).
//!
//! Concrete providers live under [`providers`]: `perplexity`, `gemini`,
//! `openai`, and a deterministic `stub` used in tests and as a safe default
//! when no API key is configured.

pub mod providers;

use async_trait::async_trait;
use plasticos_core::{EmbeddingVector, PlasticResult};
use serde::{Deserialize, Serialize};

/// Controls how much structure a summary carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummarizeStyle {
    Brief,
    Detailed,
    Structured,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeConfig {
    pub max_tokens: i32,
    pub style: SummarizeStyle,
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            style: SummarizeStyle::Brief,
        }
    }
}

/// A single free-text research query against an external provider. The
/// retrieval stage of the Research DAG calls this once per superprompt and
/// hands the raw text to extraction.
#[async_trait]
pub trait ResearchClient: Send + Sync {
    async fn run_query(&self, prompt: &str) -> PlasticResult<String>;

    /// Identifies the provider in logs and error messages.
    fn provider_id(&self) -> &str;
}

/// Produces a fixed-dimension embedding for a text blob, used to populate
/// `Hyperedge::embedding` for BCP and SupplierOffering writes.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> PlasticResult<EmbeddingVector>;

    /// Batched embedding. Providers without a batch API may implement this
    /// as sequential calls to [`EmbeddingProvider::embed`].
    async fn embed_batch(&self, texts: &[&str]) -> PlasticResult<Vec<EmbeddingVector>>;

    fn dimensions(&self) -> i32;

    fn model_id(&self) -> &str;
}

/// Condenses free text, used by the `explanation_synthesize` and
/// `ambiguity_resolve` reasoning blocks (spec §4.6).
#[async_trait]
pub trait SummarizationProvider: Send + Sync {
    async fn summarize(&self, content: &str, config: &SummarizeConfig) -> PlasticResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_summarize_config_is_brief() {
        let config = SummarizeConfig::default();
        assert_eq!(config.style, SummarizeStyle::Brief);
        assert_eq!(config.max_tokens, 512);
    }
}
