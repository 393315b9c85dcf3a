//! The Matching Engine itself: wires the six spec §4.5 steps together
//! behind a single `match_offering` entry point.

use std::collections::BTreeMap;
use std::sync::Arc;

use plasticos_core::{Effect, MatchWeights, PlasticConfig, SupplierOffering};
use plasticos_llm::EmbeddingProvider;
use plasticos_reasoning::BlockRegistry;
use plasticos_storage::HypergraphStore;
use plasticos_worldmodel::{lane_key, WorldModelService};
use tracing::{instrument, warn};

use crate::candidates::{self, Candidate};
use crate::enrichment::{self, StructuralSignals};
use crate::explain::{self, MatchExplanation};
use crate::gates::{self, RuleGateReport, ToleranceConfig};
use crate::scoring::{self, ScoreBreakdown};
use crate::{MatchDiagnostics, MatchOutcome, RankedCandidate};

/// Tunables for one matching pass. Defaults mirror `PlasticConfig`'s
/// documented values (spec §6); a caller running multiple passes with
/// different tolerances constructs this directly instead of going through
/// `PlasticConfig`.
#[derive(Debug, Clone)]
pub struct MatchingEngineConfig {
    pub top_k: usize,
    pub tolerance: ToleranceConfig,
    pub weights: MatchWeights,
    /// How many `Transaction` hyperedges `enrich_structural` scans per
    /// candidate (spec §4.5 step 3 has no bound of its own; the in-memory
    /// and hybrid stores both support a `list_by_type` limit, so this keeps
    /// a single candidate's enrichment pass from scanning the whole log).
    pub transaction_scan_limit: usize,
    /// Decay rate applied to the repeat-business ratio over transaction
    /// count (spec §4.5: "historical transaction count, exponentially
    /// decayed").
    pub repeat_business_decay_alpha: f32,
}

impl Default for MatchingEngineConfig {
    fn default() -> Self {
        Self {
            top_k: 20,
            tolerance: ToleranceConfig::default(),
            weights: MatchWeights::default(),
            transaction_scan_limit: 500,
            repeat_business_decay_alpha: 0.25,
        }
    }
}

impl From<&PlasticConfig> for MatchingEngineConfig {
    fn from(config: &PlasticConfig) -> Self {
        Self {
            top_k: config.top_k_default,
            weights: config.match_weights,
            ..Self::default()
        }
    }
}

/// Holds every dependency the six matching steps read from, injected at
/// construction rather than resolved from a global (spec §10's
/// dependency-injection convention, mirrored from the research pipeline).
pub struct MatchingEngine {
    store: Arc<dyn HypergraphStore>,
    world_model: Arc<WorldModelService>,
    embeddings: Arc<dyn EmbeddingProvider>,
    registry: Arc<BlockRegistry>,
    config: MatchingEngineConfig,
}

/// What happened to one candidate while scoring it, kept internal to
/// `match_offering`'s fold over the candidate list.
enum CandidateOutcome {
    Ranked(RankedCandidate),
    DroppedByGates { failed_gates: Vec<String> },
    ScoringFailed { reason: String },
}

impl MatchingEngine {
    pub fn new(
        store: Arc<dyn HypergraphStore>,
        world_model: Arc<WorldModelService>,
        embeddings: Arc<dyn EmbeddingProvider>,
        registry: Arc<BlockRegistry>,
        config: MatchingEngineConfig,
    ) -> Self {
        Self { store, world_model, embeddings, registry, config }
    }

    fn offering_embedding_text(offering: &SupplierOffering) -> String {
        format!(
            "{} {} {} {} {}",
            offering.supplier_name,
            offering.material.polymer,
            offering.material.forms.join(" "),
            offering.material.applications.join(" "),
            offering.origin_location,
        )
    }

    /// Runs all six steps of spec §4.5 for one supplier offering against
    /// every matching-polymer BCP, returning a ranked, explained result set.
    #[instrument(skip(self, offering), fields(supplier = %offering.supplier_name, polymer = %offering.material.polymer))]
    pub async fn match_offering(&self, offering: &SupplierOffering) -> Effect<MatchOutcome> {
        let embedding = match self.embeddings.embed(&Self::offering_embedding_text(offering)).await {
            Ok(embedding) => embedding,
            Err(e) => return Effect::<MatchOutcome>::from(Err(e)),
        };

        let candidates = match candidates::generate_candidates(
            self.store.as_ref(),
            &offering.material.polymer,
            &embedding.data,
            self.config.top_k,
        )
        .await
        {
            Effect::Ok(candidates) => candidates,
            Effect::Err(e) => return Effect::Err(e),
            Effect::Retry { after, attempt, max_attempts, reason } => {
                return Effect::Retry { after, attempt, max_attempts, reason };
            }
        };

        if candidates.is_empty() {
            return Effect::Ok(MatchOutcome {
                ranked: vec![],
                diagnostics: MatchDiagnostics {
                    candidates_considered: 0,
                    dropped_by_gate: BTreeMap::new(),
                    message: format!("no buyer criteria profiles found for polymer {}", offering.material.polymer),
                },
            });
        }

        let candidates_considered = candidates.len();
        let mut ranked = Vec::new();
        let mut dropped_by_gate: BTreeMap<String, usize> = BTreeMap::new();
        let mut scoring_failures = Vec::new();

        for candidate in candidates {
            match self.score_candidate(offering, candidate).await {
                CandidateOutcome::Ranked(r) => ranked.push(r),
                CandidateOutcome::DroppedByGates { failed_gates } => {
                    for name in failed_gates {
                        *dropped_by_gate.entry(name).or_insert(0) += 1;
                    }
                }
                CandidateOutcome::ScoringFailed { reason } => {
                    warn!(reason = %reason, "dropping candidate after a scoring failure");
                    scoring_failures.push(reason);
                }
            }
        }

        ranked.sort_by(|a, b| {
            b.score
                .composite
                .partial_cmp(&a.score.composite)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.score
                        .world_model_buyer_score
                        .partial_cmp(&a.score.world_model_buyer_score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| b.score.rule_fit.partial_cmp(&a.score.rule_fit).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| {
                    a.score
                        .lane_risk_penalty
                        .partial_cmp(&b.score.lane_risk_penalty)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.bcp.company_name.cmp(&b.bcp.company_name))
        });

        let message = if ranked.is_empty() {
            "every candidate was dropped by rule gates or a scoring failure".to_string()
        } else {
            format!("{} of {} candidates ranked", ranked.len(), candidates_considered)
        };

        Effect::Ok(MatchOutcome {
            ranked,
            diagnostics: MatchDiagnostics { candidates_considered, dropped_by_gate, message },
        })
    }

    async fn score_candidate(&self, offering: &SupplierOffering, candidate: Candidate) -> CandidateOutcome {
        let Candidate { bcp, vector_similarity } = candidate;

        let (gate_report, gate_low_confidence) =
            gates::apply_rule_gates(offering, &bcp, &self.config.tolerance, &self.registry).await;

        if !gate_report.all_passed() {
            return CandidateOutcome::DroppedByGates { failed_gates: gate_report.failed_names() };
        }

        let signals = match enrichment::enrich_structural(
            self.store.as_ref(),
            offering,
            &bcp,
            self.config.transaction_scan_limit,
        )
        .await
        {
            Effect::Ok(signals) => signals,
            Effect::Err(e) => return CandidateOutcome::ScoringFailed { reason: e.to_string() },
            Effect::Retry { reason, .. } => return CandidateOutcome::ScoringFailed { reason },
        };

        let buyer_score = match self.world_model.buyer_score(&bcp.hyperedge_key()).await {
            Effect::Ok(score) => score,
            Effect::Err(e) => return CandidateOutcome::ScoringFailed { reason: e.to_string() },
            Effect::Retry { reason, .. } => return CandidateOutcome::ScoringFailed { reason },
        };

        let lane = lane_key(&offering.origin_location, &bcp.buyer_location);
        let lane_risk = match self.world_model.lane_risk(&lane).await {
            Effect::Ok(risk) => risk,
            Effect::Err(e) => return CandidateOutcome::ScoringFailed { reason: e.to_string() },
            Effect::Retry { reason, .. } => return CandidateOutcome::ScoringFailed { reason },
        };

        let rule_fit = scoring::rule_fit_completeness(offering, &bcp, &self.config.tolerance);

        let repeat_business = match scoring::repeat_business_boost(
            &self.registry,
            &signals,
            self.config.repeat_business_decay_alpha,
        )
        .await
        {
            Ok(boost) => boost,
            Err(e) => return CandidateOutcome::ScoringFailed { reason: e.to_string() },
        };

        let score: ScoreBreakdown =
            scoring::score_composite(&self.config.weights, vector_similarity, rule_fit, repeat_business, buyer_score, lane_risk);

        let explanation: MatchExplanation = explain::build_explanation(
            &self.registry,
            &gate_report,
            gate_low_confidence,
            &signals,
            buyer_score,
            lane_risk,
            &score,
            &bcp.company_name,
        )
        .await;

        CandidateOutcome::Ranked(RankedCandidate {
            bcp,
            score,
            low_confidence: gate_low_confidence,
            gate_report,
            structural_signals: signals,
            explanation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use plasticos_core::{
        ContaminationTolerance, EmbeddingVector, EntityIdType, GeographyConstraint, Hyperedge,
        LogisticsConstraint, MaterialDescriptor, PayloadMetadata, PricingBand, SpecificationWindow,
        BuyerCriteriaProfile, EdgeType,
    };
    use plasticos_llm::{SummarizationProvider, SummarizeConfig};
    use plasticos_storage::InMemoryHypergraphStore;
    use plasticos_worldmodel::ScoringPolicy;

    struct StubSummarizer;

    #[async_trait]
    impl SummarizationProvider for StubSummarizer {
        async fn summarize(&self, content: &str, _config: &SummarizeConfig) -> plasticos_core::PlasticResult<String> {
            Ok(format!("stub: {content}"))
        }
    }

    struct IdentityEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for IdentityEmbeddings {
        async fn embed(&self, text: &str) -> plasticos_core::PlasticResult<EmbeddingVector> {
            let hash = text.bytes().fold(0u32, |acc, b| acc.wrapping_add(b as u32));
            Ok(EmbeddingVector::new(vec![(hash % 97) as f32, 1.0, 0.0], "stub-v1"))
        }

        async fn embed_batch(&self, texts: &[&str]) -> plasticos_core::PlasticResult<Vec<EmbeddingVector>> {
            let mut out = Vec::with_capacity(texts.len());
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> i32 {
            3
        }

        fn model_id(&self) -> &str {
            "stub-v1"
        }
    }

    fn sample_bcp(company_name: &str) -> BuyerCriteriaProfile {
        BuyerCriteriaProfile {
            bcp_id: plasticos_core::BcpId::now_v7(),
            company_name: company_name.to_string(),
            buyer_location: "Wyoming, MI".into(),
            segments: vec![],
            external_ids: vec![],
            material: MaterialDescriptor { polymer: "HDPE".into(), forms: vec![], colors: vec![], applications: vec![], process: vec![] },
            specification: SpecificationWindow {
                mfi_min: Some(1.0),
                mfi_max: Some(5.0),
                density_min: Some(0.94),
                density_max: Some(0.97),
                ash_max: None,
                filler_types: vec![],
            },
            contamination: ContaminationTolerance { max_ppm: Some(1500.0), banned: vec![] },
            certifications: vec![],
            pricing_band: PricingBand { min: None, max: None, currency: None, incoterm: None },
            geography: GeographyConstraint { countries: vec![], states: vec![], regions: vec![], ports: vec![] },
            logistics: LogisticsConstraint { min_load_lbs: None, max_lane_distance_miles: None },
            metadata: PayloadMetadata { version: 1, source: "test".into(), completeness_score: 0.8 },
        }
    }

    fn sample_offering() -> SupplierOffering {
        SupplierOffering {
            supplier_offering_id: plasticos_core::SupplierOfferingId::now_v7(),
            supplier_edge_id: "intake-1".into(),
            supplier_name: "Acme".into(),
            material: MaterialDescriptor { polymer: "HDPE".into(), forms: vec![], colors: vec![], applications: vec![], process: vec![] },
            estimated_mfi: Some(3.0),
            estimated_density: Some(0.955),
            estimated_ppm: Some(200.0),
            origin_location: "Detroit, MI".into(),
            intake_at: Utc::now(),
        }
    }

    async fn engine_with(bcps: Vec<BuyerCriteriaProfile>) -> MatchingEngine {
        let store = Arc::new(InMemoryHypergraphStore::default());
        for bcp in bcps {
            let hyperedge = Hyperedge {
                edge_type: EdgeType::Bcp,
                key: bcp.hyperedge_key(),
                payload: serde_json::to_value(&bcp).unwrap(),
                embedding: Some(EmbeddingVector::new(vec![(bcp.hyperedge_key().bytes().fold(0u32, |acc, b| acc.wrapping_add(b as u32)) % 97) as f32, 1.0, 0.0], "stub-v1")),
                version: 1,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            store.write_hyperedge(hyperedge).await;
        }

        MatchingEngine::new(
            store,
            Arc::new(WorldModelService::new(ScoringPolicy::default(), 25)),
            Arc::new(IdentityEmbeddings),
            Arc::new(BlockRegistry::with_default_blocks(Arc::new(StubSummarizer))),
            MatchingEngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn no_candidates_yields_an_empty_outcome_with_a_diagnostic() {
        let engine = engine_with(vec![]).await;
        let outcome = engine.match_offering(&sample_offering()).await.into_result().unwrap();
        assert!(outcome.ranked.is_empty());
        assert_eq!(outcome.diagnostics.candidates_considered, 0);
    }

    #[tokio::test]
    async fn a_matching_bcp_is_ranked_with_full_score_breakdown() {
        let engine = engine_with(vec![sample_bcp("Padnos")]).await;
        let outcome = engine.match_offering(&sample_offering()).await.into_result().unwrap();
        assert_eq!(outcome.ranked.len(), 1);
        assert_eq!(outcome.ranked[0].bcp.company_name, "Padnos");
        assert!(outcome.ranked[0].score.composite > 0.0);
        assert!(outcome.ranked[0].explanation.narrative.is_some());
    }

    #[tokio::test]
    async fn a_gate_failure_drops_the_candidate_and_tallies_the_reason() {
        let mut bcp = sample_bcp("Globex");
        bcp.geography = GeographyConstraint { countries: vec!["CN".into()], states: vec![], regions: vec![], ports: vec![] };
        let engine = engine_with(vec![bcp]).await;
        let outcome = engine.match_offering(&sample_offering()).await.into_result().unwrap();
        assert!(outcome.ranked.is_empty());
        assert_eq!(outcome.diagnostics.dropped_by_gate.get("geography"), Some(&1));
    }

    #[tokio::test]
    async fn multiple_candidates_are_ordered_by_composite_score_descending() {
        let mut weaker = sample_bcp("Weaker Co");
        weaker.specification.mfi_min = Some(2.9);
        weaker.specification.mfi_max = Some(3.1);
        let engine = engine_with(vec![sample_bcp("Padnos"), weaker]).await;
        let outcome = engine.match_offering(&sample_offering()).await.into_result().unwrap();
        assert_eq!(outcome.ranked.len(), 2);
        assert!(outcome.ranked[0].score.composite >= outcome.ranked[1].score.composite);
    }
}
