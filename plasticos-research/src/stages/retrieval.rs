//! Stage 3: Retrieval (spec §4.4). Executes each schema prompt against a
//! pluggable `ResearchClient`, bounded by a `governor` rate limiter and
//! retried with exponential backoff. Returns raw, unparsed blobs — parsing
//! is `ExtractionStage`'s job.
//!
//! Failure here is per-query: a prompt that exhausts its retries is logged
//! and skipped; other prompts proceed (spec's per-query failure semantics).

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{clock::DefaultClock, Quota, RateLimiter};
use plasticos_llm::ResearchClient;
use tracing::warn;

use crate::context::{RawRetrievalResult, SchemaPrompt};

type DirectRateLimiter = RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, DefaultClock>;

pub struct RetrievalStage {
    client: Arc<dyn ResearchClient>,
    rate_limiter: Arc<DirectRateLimiter>,
    timeout: Duration,
    max_retries: u32,
}

impl RetrievalStage {
    pub fn new(client: Arc<dyn ResearchClient>, requests_per_minute: u32, timeout: Duration, max_retries: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute.max(1)).unwrap_or(NonZeroU32::MIN));
        Self {
            client,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            timeout,
            max_retries,
        }
    }

    /// Runs every prompt, in order, one batch per prompt. Returns the
    /// successful results plus a warning per prompt that never succeeded.
    pub async fn run(&self, prompts: &[SchemaPrompt]) -> (Vec<RawRetrievalResult>, Vec<String>) {
        let mut results = Vec::with_capacity(prompts.len());
        let mut warnings = Vec::new();

        for (batch_index, prompt) in prompts.iter().enumerate() {
            match self.run_one(prompt, batch_index as u32).await {
                Ok(result) => results.push(result),
                Err(reason) => {
                    warn!(query_id = %prompt.query_id, reason = %reason, "retrieval: giving up on query");
                    warnings.push(format!(
                        "retrieval: query {} failed after retries: {reason}",
                        prompt.query_id
                    ));
                }
            }
        }

        (results, warnings)
    }

    async fn run_one(&self, prompt: &SchemaPrompt, batch_index: u32) -> Result<RawRetrievalResult, String> {
        let mut last_reason = String::from("never attempted");

        for attempt in 0..=self.max_retries {
            self.rate_limiter.until_ready().await;

            let call = tokio::time::timeout(self.timeout, self.client.run_query(&prompt.text));
            match call.await {
                Ok(Ok(raw_text)) => {
                    return Ok(RawRetrievalResult {
                        query_id: prompt.query_id,
                        batch_index,
                        raw_text,
                    });
                }
                Ok(Err(e)) => last_reason = e.to_string(),
                Err(_) => last_reason = format!("timed out after {:?}", self.timeout),
            }

            if attempt < self.max_retries {
                let backoff = Duration::from_millis(100u64.saturating_mul(1u64 << attempt));
                tokio::time::sleep(backoff).await;
            }
        }

        Err(last_reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use plasticos_core::{EntityIdType, PlasticResult, QueryId};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyClient {
        failures_before_success: u32,
        attempts: AtomicU32,
    }

    #[async_trait]
    impl ResearchClient for FlakyClient {
        async fn run_query(&self, prompt: &str) -> PlasticResult<String> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures_before_success {
                Err(plasticos_core::RetrievalError::RequestFailed {
                    provider: "flaky".into(),
                    status: 503,
                    message: "temporary".into(),
                }
                .into())
            } else {
                Ok(format!("ok: {prompt}"))
            }
        }

        fn provider_id(&self) -> &str {
            "flaky"
        }
    }

    struct AlwaysFailsClient;

    #[async_trait]
    impl ResearchClient for AlwaysFailsClient {
        async fn run_query(&self, _prompt: &str) -> PlasticResult<String> {
            Err(plasticos_core::RetrievalError::NotConfigured.into())
        }

        fn provider_id(&self) -> &str {
            "broken"
        }
    }

    fn sample_prompt() -> SchemaPrompt {
        SchemaPrompt {
            query_id: QueryId::now_v7(),
            text: "find HDPE buyers".into(),
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let client = Arc::new(FlakyClient { failures_before_success: 2, attempts: AtomicU32::new(0) });
        let stage = RetrievalStage::new(client, 600, Duration::from_secs(1), 3);
        let (results, warnings) = stage.run(&[sample_prompt()]).await;
        assert_eq!(results.len(), 1);
        assert!(warnings.is_empty());
    }

    #[tokio::test]
    async fn gives_up_after_max_retries_and_logs_a_warning() {
        let client = Arc::new(AlwaysFailsClient);
        let stage = RetrievalStage::new(client, 600, Duration::from_secs(1), 2);
        let (results, warnings) = stage.run(&[sample_prompt()]).await;
        assert!(results.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[tokio::test]
    async fn one_failed_prompt_does_not_block_others() {
        let flaky = Arc::new(AlwaysFailsClient);
        let stage = RetrievalStage::new(flaky, 600, Duration::from_secs(1), 0);
        let (results, warnings) = stage.run(&[sample_prompt(), sample_prompt()]).await;
        assert!(results.is_empty());
        assert_eq!(warnings.len(), 2);
    }
}
