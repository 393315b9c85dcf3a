//! Gemini research client.

use super::client::GeminiClient;
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};
use crate::providers::invalid_response;
use crate::ResearchClient;
use async_trait::async_trait;
use plasticos_core::PlasticResult;

pub struct GeminiResearchClient {
    client: GeminiClient,
    model: String,
}

impl GeminiResearchClient {
    pub fn new(api_key: impl Into<String>, requests_per_minute: u32) -> Self {
        Self {
            client: GeminiClient::new(api_key, requests_per_minute),
            model: "gemini-1.5-flash".to_string(),
        }
    }

    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: GeminiClient::new(api_key, 60),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ResearchClient for GeminiResearchClient {
    async fn run_query(&self, prompt: &str) -> PlasticResult<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt.to_string() }],
            }],
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(2048),
                temperature: Some(0.2),
            }),
        };

        let response: GenerateContentResponse = self.client.request(&self.model, request).await?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| invalid_response("gemini", "no candidate in response"))
    }

    fn provider_id(&self) -> &str {
        "gemini"
    }
}

impl std::fmt::Debug for GeminiResearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiResearchClient").field("model", &self.model).finish()
    }
}
