//! Perplexity research client. Perplexity's `sonar` models run their own
//! web retrieval before answering, which is why it is the default research
//! provider (spec §6) rather than a plain completion model.

use super::client::PerplexityClient;
use super::types::{ChatRequest, ChatResponse, Message};
use crate::providers::invalid_response;
use crate::ResearchClient;
use async_trait::async_trait;
use plasticos_core::PlasticResult;

pub struct PerplexityResearchClient {
    client: PerplexityClient,
    model: String,
}

impl PerplexityResearchClient {
    pub fn new(api_key: impl Into<String>, requests_per_minute: u32) -> Self {
        Self {
            client: PerplexityClient::new(api_key, requests_per_minute),
            model: "sonar".to_string(),
        }
    }

    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: PerplexityClient::new(api_key, 50),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ResearchClient for PerplexityResearchClient {
    async fn run_query(&self, prompt: &str) -> PlasticResult<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: Some(2048),
            temperature: Some(0.2),
        };

        let response: ChatResponse = self.client.request("chat/completions", request).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| invalid_response("perplexity", "no completion in response"))
    }

    fn provider_id(&self) -> &str {
        "perplexity"
    }
}

impl std::fmt::Debug for PerplexityResearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerplexityResearchClient").field("model", &self.model).finish()
    }
}
