//! OpenAI summarization provider.

use super::client::OpenAIClient;
use super::types::{CompletionRequest, CompletionResponse, Message};
use crate::providers::invalid_response;
use crate::{SummarizationProvider, SummarizeConfig, SummarizeStyle};
use async_trait::async_trait;
use plasticos_core::PlasticResult;

pub struct OpenAISummarizationProvider {
    client: OpenAIClient,
    model: String,
}

impl OpenAISummarizationProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: OpenAIClient::new(api_key, 60),
            model: model.into(),
        }
    }

    pub fn with_default_model(api_key: impl Into<String>) -> Self {
        Self::new(api_key, "gpt-4o-mini")
    }

    fn build_system_prompt(&self, style: SummarizeStyle) -> String {
        match style {
            SummarizeStyle::Brief => {
                "You are a helpful assistant that creates concise summaries. \
                 Focus on the key points and main ideas. Keep your response short."
                    .to_string()
            }
            SummarizeStyle::Detailed => {
                "You are a helpful assistant that creates detailed summaries. \
                 Include important context, key points, and supporting details."
                    .to_string()
            }
            SummarizeStyle::Structured => {
                "You are a helpful assistant that creates structured summaries. \
                 Use bullet points organized as: Overview, Key Points, Details, Conclusion."
                    .to_string()
            }
        }
    }
}

#[async_trait]
impl SummarizationProvider for OpenAISummarizationProvider {
    async fn summarize(&self, content: &str, config: &SummarizeConfig) -> PlasticResult<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: self.build_system_prompt(config.style),
                },
                Message {
                    role: "user".to_string(),
                    content: format!("Summarize the following content:\n\n{}", content),
                },
            ],
            max_tokens: Some(config.max_tokens),
            temperature: Some(0.3),
        };

        let response: CompletionResponse = self.client.request("chat/completions", request).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| invalid_response("openai", "no completion in response"))
    }
}

impl std::fmt::Debug for OpenAISummarizationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAISummarizationProvider")
            .field("model", &self.model)
            .finish()
    }
}
