//! OpenAI-backed research client: a single free-text chat completion per
//! query, used as a generic `ResearchClient` implementation (spec §6).

use super::client::OpenAIClient;
use super::types::{CompletionRequest, CompletionResponse, Message};
use crate::providers::invalid_response;
use crate::ResearchClient;
use async_trait::async_trait;
use plasticos_core::PlasticResult;

pub struct OpenAIResearchClient {
    client: OpenAIClient,
    model: String,
}

impl OpenAIResearchClient {
    pub fn new(api_key: impl Into<String>, requests_per_minute: u32) -> Self {
        Self {
            client: OpenAIClient::new(api_key, requests_per_minute),
            model: "gpt-4o-mini".to_string(),
        }
    }

    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: OpenAIClient::new(api_key, 60),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ResearchClient for OpenAIResearchClient {
    async fn run_query(&self, prompt: &str) -> PlasticResult<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: Some(2048),
            temperature: Some(0.2),
        };

        let response: CompletionResponse = self.client.request("chat/completions", request).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| invalid_response("openai", "no completion in response"))
    }

    fn provider_id(&self) -> &str {
        "openai"
    }
}

impl std::fmt::Debug for OpenAIResearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIResearchClient").field("model", &self.model).finish()
    }
}
