//! Stage 1: Meta-Plan (spec §4.4). Interprets the job spec and produces
//! `planned_queries`. Failure here is fatal — the job aborts (spec's
//! idempotence law: re-running with the same spec must produce the same
//! `planned_queries`, so this stage performs no randomized decomposition).

use plasticos_core::{EntityIdType, Effect, PlasticError, QueryId};
use plasticos_reasoning::{BlockRegistry, InvocationContext};

use crate::context::{JobSpec, PlannedQuery, RetrievalParams};

/// Interprets a [`JobSpec`] into a deterministic list of typed query
/// descriptors, optionally invoking the `strategic_decomposition` reasoning
/// block to normalize the polymer term before fanning the goal out across
/// requested regions.
pub struct MetaPlanStage<'a> {
    pub reasoning: &'a BlockRegistry,
    pub max_results_cap: u32,
}

impl<'a> MetaPlanStage<'a> {
    pub fn new(reasoning: &'a BlockRegistry, max_results_cap: u32) -> Self {
        Self { reasoning, max_results_cap }
    }

    pub async fn run(&self, spec: &JobSpec) -> Effect<(Vec<PlannedQuery>, Vec<String>)> {
        let normalized_polymer = match self
            .reasoning
            .invoke(
                "strategic_decomposition",
                serde_json::json!({ "text": spec.polymer }),
                InvocationContext::Strategic,
            )
            .await
        {
            Effect::Ok(output) => output
                .get("normalized")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| spec.polymer.clone()),
            Effect::Err(e) => return Effect::Err(e),
            Effect::Retry { after, attempt, max_attempts, reason } => {
                return Effect::Retry { after, attempt, max_attempts, reason };
            }
        };

        let capped_results = spec.max_results.min(self.max_results_cap);
        let mut warnings = Vec::new();
        if spec.max_results > self.max_results_cap {
            warnings.push(format!(
                "meta_plan: requested max_results {} exceeds cap {}, capping",
                spec.max_results, self.max_results_cap
            ));
        }

        let regions: Vec<Option<String>> = if spec.regions.is_empty() {
            vec![None]
        } else {
            spec.regions.iter().cloned().map(Some).collect()
        };

        let mut planned_queries = Vec::with_capacity(regions.len());
        for region in regions {
            let scope = match &region {
                Some(r) => format!("{} buyers for {normalized_polymer} in {r}", spec.domain),
                None => format!("{} buyers for {normalized_polymer}", spec.domain),
            };
            planned_queries.push(PlannedQuery {
                query_id: QueryId::now_v7(),
                polymer: normalized_polymer.clone(),
                region,
                scope,
                depth: spec.depth,
                retrieval_params: RetrievalParams { max_results: capped_results },
            });
        }

        if planned_queries.is_empty() {
            return Effect::err(PlasticError::Extraction(
                plasticos_core::ExtractionError::Unparseable {
                    reason: "meta-plan produced no planned queries".to_string(),
                },
            ));
        }

        Effect::Ok((planned_queries, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct StubSummarizer;

    #[async_trait::async_trait]
    impl plasticos_llm::SummarizationProvider for StubSummarizer {
        async fn summarize(
            &self,
            content: &str,
            _config: &plasticos_llm::SummarizeConfig,
        ) -> plasticos_core::PlasticResult<String> {
            Ok(format!("stub: {content}"))
        }
    }

    fn sample_spec(regions: Vec<&str>) -> JobSpec {
        JobSpec {
            domain: "plastics brokerage".into(),
            polymer: "high density polyethylene".into(),
            regions: regions.into_iter().map(String::from).collect(),
            depth: 1,
            max_results: 50,
        }
    }

    fn unwrap_ok<T>(effect: Effect<T>) -> T {
        match effect {
            Effect::Ok(v) => v,
            Effect::Err(e) => panic!("expected Ok, got Err: {e}"),
            Effect::Retry { reason, .. } => panic!("expected Ok, got Retry: {reason}"),
        }
    }

    #[tokio::test]
    async fn no_regions_produces_a_single_planned_query() {
        let registry = BlockRegistry::with_default_blocks(Arc::new(StubSummarizer));
        let stage = MetaPlanStage::new(&registry, 500);
        let (planned, warnings) = unwrap_ok(stage.run(&sample_spec(vec![])).await);
        assert_eq!(planned.len(), 1);
        assert!(planned[0].region.is_none());
        assert!(warnings.is_empty());
    }

    #[tokio::test]
    async fn one_planned_query_per_region() {
        let registry = BlockRegistry::with_default_blocks(Arc::new(StubSummarizer));
        let stage = MetaPlanStage::new(&registry, 500);
        let (planned, _) = unwrap_ok(stage.run(&sample_spec(vec!["US Gulf Coast", "EU"])).await);
        assert_eq!(planned.len(), 2);
    }

    #[tokio::test]
    async fn polymer_synonym_is_normalized_through_strategic_decomposition() {
        let registry = BlockRegistry::with_default_blocks(Arc::new(StubSummarizer));
        let stage = MetaPlanStage::new(&registry, 500);
        let (planned, _) = unwrap_ok(stage.run(&sample_spec(vec![])).await);
        assert_eq!(planned[0].polymer, "HDPE");
    }

    #[tokio::test]
    async fn max_results_is_capped() {
        let registry = BlockRegistry::with_default_blocks(Arc::new(StubSummarizer));
        let stage = MetaPlanStage::new(&registry, 10);
        let (planned, warnings) = unwrap_ok(stage.run(&sample_spec(vec![])).await);
        assert_eq!(planned[0].retrieval_params.max_results, 10);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("exceeds cap"));
    }
}
