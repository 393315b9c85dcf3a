//! Orchestrates the five Research DAG stages into one job run (spec §4.4).
//!
//! `ResearchPipeline` owns the dependencies every stage needs — storage, the
//! World Model, a research client, the Reasoning Block Registry, and a
//! synonym table — injected at construction rather than reached for as
//! global singletons (spec's "global singletons for clients" redesign
//! flag). `run_job` drives the stages strictly in order, builds up a
//! [`ResearchContext`], and halts at the first fatal failure with the
//! failure point labeled.

use std::sync::Arc;
use std::time::{Duration, Instant};

use plasticos_core::Effect;
use plasticos_llm::ResearchClient;
use plasticos_reasoning::BlockRegistry;
use plasticos_schema::SynonymTable;
use plasticos_storage::HypergraphStore;
use plasticos_worldmodel::WorldModelService;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::context::{JobOutcome, JobSpec, JobSummary, ResearchContext, StageOutput};
use crate::stages::{ExtractionStage, IntegrationStage, MetaPlanStage, RetrievalStage, SuperpromptStage};

/// Tunables that would otherwise come from `PlasticConfig` (spec §6):
/// timeouts, retry budgets, and the hard cap on `max_results`.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub job_timeout: Duration,
    pub retrieval_timeout: Duration,
    pub retrieval_requests_per_minute: u32,
    pub max_retrieval_retries: u32,
    pub max_results_cap: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            job_timeout: Duration::from_secs(300),
            retrieval_timeout: Duration::from_secs(30),
            retrieval_requests_per_minute: 60,
            max_retrieval_retries: 3,
            max_results_cap: 500,
        }
    }
}

impl From<&plasticos_core::PlasticConfig> for PipelineConfig {
    fn from(config: &plasticos_core::PlasticConfig) -> Self {
        Self {
            job_timeout: Duration::from_secs(config.job_timeout_seconds),
            retrieval_timeout: Duration::from_secs(config.retrieval_timeout_seconds),
            retrieval_requests_per_minute: 60,
            max_retrieval_retries: 3,
            max_results_cap: config.max_results_cap,
        }
    }
}

/// The five-pass Research DAG, wired up against concrete dependencies.
pub struct ResearchPipeline {
    store: Arc<dyn HypergraphStore>,
    world_model: Arc<WorldModelService>,
    research_client: Arc<dyn ResearchClient>,
    reasoning: Arc<BlockRegistry>,
    synonyms: SynonymTable,
    config: PipelineConfig,
}

impl ResearchPipeline {
    pub fn new(
        store: Arc<dyn HypergraphStore>,
        world_model: Arc<WorldModelService>,
        research_client: Arc<dyn ResearchClient>,
        reasoning: Arc<BlockRegistry>,
        synonyms: SynonymTable,
        config: PipelineConfig,
    ) -> Self {
        Self { store, world_model, research_client, reasoning, synonyms, config }
    }

    /// Runs a single research job to completion (or to its first fatal
    /// failure point). `cancellation` is checked between stages for
    /// cooperative cancellation (spec §5).
    #[instrument(skip(self, cancellation), fields(domain = %spec.domain, polymer = %spec.polymer))]
    pub async fn run_job(&self, spec: JobSpec, cancellation: CancellationToken) -> JobOutcome {
        let started_at = Instant::now();
        let mut context = ResearchContext::new(spec);
        let mut warnings = Vec::new();

        let meta_plan = MetaPlanStage::new(&self.reasoning, self.config.max_results_cap);
        let planned_queries = match meta_plan.run(&context.spec).await {
            Effect::Ok((queries, meta_plan_warnings)) => {
                warnings.extend(meta_plan_warnings);
                queries
            }
            Effect::Err(e) => return self.partial(context, "meta_plan", e.to_string()),
            Effect::Retry { reason, .. } => return self.partial(context, "meta_plan", reason),
        };
        context.push(StageOutput::MetaPlan { planned_queries: planned_queries.clone() });

        if self.deadline_exceeded(started_at) || cancellation.is_cancelled() {
            return self.partial(context, "meta_plan", "job deadline exceeded or cancelled".into());
        }

        let superprompt = SuperpromptStage;
        let (prompts, superprompt_warnings) = superprompt.run(&planned_queries);
        warnings.extend(superprompt_warnings);
        context.push(StageOutput::Superprompt { prompts: prompts.clone() });

        if self.deadline_exceeded(started_at) || cancellation.is_cancelled() {
            return self.partial(context, "superprompt", "job deadline exceeded or cancelled".into());
        }

        let retrieval = RetrievalStage::new(
            self.research_client.clone(),
            self.config.retrieval_requests_per_minute,
            self.config.retrieval_timeout,
            self.config.max_retrieval_retries,
        );
        let (raw_results, retrieval_warnings) = retrieval.run(&prompts).await;
        warnings.extend(retrieval_warnings);
        context.push(StageOutput::Retrieval { results: raw_results.clone() });

        if self.deadline_exceeded(started_at) || cancellation.is_cancelled() {
            return self.partial(context, "retrieval", "job deadline exceeded or cancelled".into());
        }

        let extraction = ExtractionStage::new(&self.synonyms);
        let (records, extraction_warnings) = extraction.run(&raw_results);
        warnings.extend(extraction_warnings);
        context.push(StageOutput::Extraction { records: records.clone() });

        if self.deadline_exceeded(started_at) || cancellation.is_cancelled() {
            return self.partial(context, "extraction", "job deadline exceeded or cancelled".into());
        }

        let integration = IntegrationStage::new(self.store.clone(), self.world_model.clone());
        let (bcps_written, integration_warnings) = integration.run(&records).await;
        warnings.extend(integration_warnings);

        let integration_result = if warnings.is_empty() {
            plasticos_core::JobStatus::Success
        } else if bcps_written > 0 {
            plasticos_core::JobStatus::Partial
        } else {
            plasticos_core::JobStatus::Failed
        };

        let summary = JobSummary {
            job_id: context.job_id,
            planned_queries: planned_queries.len(),
            retrieval_batches: raw_results.len(),
            bcps_written,
            integration_result,
            warnings,
        };
        context.push(StageOutput::Integration { summary: summary.clone() });

        info!(job_id = %summary.job_id, bcps_written, "research job completed");
        JobOutcome::Completed { summary }
    }

    fn deadline_exceeded(&self, started_at: Instant) -> bool {
        started_at.elapsed() >= self.config.job_timeout
    }

    fn partial(&self, context: ResearchContext, failed_stage: &str, reason: String) -> JobOutcome {
        JobOutcome::Partial {
            failed_stage: failed_stage.to_string(),
            reason,
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use plasticos_llm::{ResearchClient, SummarizationProvider, SummarizeConfig};
    use plasticos_storage::InMemoryHypergraphStore;
    use plasticos_worldmodel::WorldModelService;

    struct StubSummarizer;

    #[async_trait]
    impl SummarizationProvider for StubSummarizer {
        async fn summarize(&self, content: &str, _config: &SummarizeConfig) -> plasticos_core::PlasticResult<String> {
            Ok(format!("stub: {content}"))
        }
    }

    struct StubResearchClient;

    #[async_trait]
    impl ResearchClient for StubResearchClient {
        async fn run_query(&self, _prompt: &str) -> plasticos_core::PlasticResult<String> {
            Ok(serde_json::to_string(&serde_json::json!([{
                "company_name": "Globex",
                "buyer_location": "Houston, TX",
                "segments": [],
                "external_ids": [],
                "material": { "polymer": "HDPE", "forms": [], "colors": [], "applications": [], "process": [] },
                "specification": { "mfi_min": null, "mfi_max": null, "density_min": null, "density_max": null, "ash_max": null, "filler_types": [] },
                "contamination": { "max_ppm": null, "banned": [] },
                "certifications": [],
                "pricing_band": { "min": null, "max": null, "currency": null, "incoterm": null },
                "geography": { "countries": [], "states": [], "regions": [], "ports": [] },
                "logistics": { "min_load_lbs": null, "max_lane_distance_miles": null },
                "metadata": { "version": 1, "source": "test", "completeness_score": 0.0 }
            }]))
            .unwrap())
        }

        fn provider_id(&self) -> &str {
            "stub"
        }
    }

    fn sample_spec() -> JobSpec {
        JobSpec {
            domain: "plastics brokerage".into(),
            polymer: "high density polyethylene".into(),
            regions: vec![],
            depth: 1,
            max_results: 50,
        }
    }

    fn build_pipeline() -> ResearchPipeline {
        let store: Arc<dyn HypergraphStore> = Arc::new(InMemoryHypergraphStore::default());
        let world_model = Arc::new(WorldModelService::default());
        let client: Arc<dyn ResearchClient> = Arc::new(StubResearchClient);
        let reasoning = Arc::new(BlockRegistry::with_default_blocks(Arc::new(StubSummarizer)));
        ResearchPipeline::new(store, world_model, client, reasoning, SynonymTable::default(), PipelineConfig::default())
    }

    #[tokio::test]
    async fn a_full_job_writes_a_bcp_and_completes() {
        let pipeline = build_pipeline();
        let outcome = pipeline.run_job(sample_spec(), CancellationToken::new()).await;
        match outcome {
            JobOutcome::Completed { summary } => {
                assert_eq!(summary.bcps_written, 1);
                assert_eq!(summary.planned_queries, 1);
                assert!(summary.warnings.is_empty());
            }
            JobOutcome::Partial { failed_stage, reason, .. } => {
                panic!("expected a completed job, got a partial at {failed_stage}: {reason}");
            }
        }
    }

    #[tokio::test]
    async fn an_already_cancelled_token_halts_after_meta_plan() {
        let pipeline = build_pipeline();
        let token = CancellationToken::new();
        token.cancel();
        let outcome = pipeline.run_job(sample_spec(), token).await;
        match outcome {
            JobOutcome::Partial { failed_stage, .. } => assert_eq!(failed_stage, "meta_plan"),
            JobOutcome::Completed { .. } => panic!("expected a partial outcome for a pre-cancelled job"),
        }
    }

    #[tokio::test]
    async fn a_zero_timeout_produces_a_partial_outcome() {
        let mut config = PipelineConfig::default();
        config.job_timeout = Duration::from_secs(0);
        let store: Arc<dyn HypergraphStore> = Arc::new(InMemoryHypergraphStore::default());
        let world_model = Arc::new(WorldModelService::default());
        let client: Arc<dyn ResearchClient> = Arc::new(StubResearchClient);
        let reasoning = Arc::new(BlockRegistry::with_default_blocks(Arc::new(StubSummarizer)));
        let pipeline = ResearchPipeline::new(store, world_model, client, reasoning, SynonymTable::default(), config);

        let outcome = pipeline.run_job(sample_spec(), CancellationToken::new()).await;
        assert!(matches!(outcome, JobOutcome::Partial { .. }));
    }
}
