//! Concrete research-client, embedding, and summarization providers.
//!
//! `perplexity`, `gemini`, and `openai` each wrap a rate-limited `reqwest`
//! client in the same shape: a `Semaphore` capping concurrent requests plus
//! a minimum-interval check between them. `stub` is deterministic and never
//! makes a network call, used in tests and as the default when no API key
//! is configured.

pub mod gemini;
pub mod openai;
pub mod perplexity;
pub mod stub;

pub use gemini::GeminiResearchClient;
pub use openai::{OpenAIClient, OpenAIEmbeddingProvider, OpenAIResearchClient};
pub use perplexity::PerplexityResearchClient;
pub use stub::StubResearchClient;

use plasticos_core::{PlasticError, PlasticResult, RetrievalError};

pub(crate) fn invalid_response(provider: &str, reason: impl Into<String>) -> PlasticError {
    RetrievalError::InvalidResponse {
        provider: provider.to_string(),
        reason: reason.into(),
    }
    .into()
}

pub(crate) fn request_failed(provider: &str, status: i32, message: impl Into<String>) -> PlasticError {
    RetrievalError::RequestFailed {
        provider: provider.to_string(),
        status,
        message: message.into(),
    }
    .into()
}

pub(crate) fn rate_limited(provider: &str, retry_after_ms: i64) -> PlasticError {
    RetrievalError::RateLimited {
        provider: provider.to_string(),
        retry_after_ms,
    }
    .into()
}

/// Selects and constructs a [`crate::ResearchClient`] from a
/// `research_client_type` setting. `Stub` never fails and needs no key;
/// the real providers fail fast at startup if `api_key` is `None` rather
/// than surfacing `NotConfigured` on the first query.
pub fn build_research_client(
    kind: plasticos_core::ResearchClientKind,
    api_key: Option<String>,
) -> PlasticResult<Box<dyn crate::ResearchClient>> {
    use plasticos_core::{ConfigurationError, ResearchClientKind};

    match kind {
        ResearchClientKind::Stub => Ok(Box::new(stub::StubResearchClient::default())),
        ResearchClientKind::Perplexity => {
            let key = api_key.ok_or(ConfigurationError::MissingRequired {
                field: "research_api_key".into(),
            })?;
            Ok(Box::new(perplexity::PerplexityResearchClient::new(key, 50)))
        }
        ResearchClientKind::Gemini => {
            let key = api_key.ok_or(ConfigurationError::MissingRequired {
                field: "research_api_key".into(),
            })?;
            Ok(Box::new(gemini::GeminiResearchClient::new(key, 60)))
        }
        ResearchClientKind::Openai => {
            let key = api_key.ok_or(ConfigurationError::MissingRequired {
                field: "research_api_key".into(),
            })?;
            Ok(Box::new(openai::OpenAIResearchClient::new(key, 60)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasticos_core::ResearchClientKind;

    #[test]
    fn stub_kind_never_needs_an_api_key() {
        assert!(build_research_client(ResearchClientKind::Stub, None).is_ok());
    }

    #[test]
    fn real_providers_require_an_api_key() {
        assert!(build_research_client(ResearchClientKind::Openai, None).is_err());
        assert!(build_research_client(ResearchClientKind::Perplexity, None).is_err());
        assert!(build_research_client(ResearchClientKind::Gemini, None).is_err());
    }
}
