//! PlasticOS Test Utilities
//!
//! Centralized test infrastructure for the workspace: proptest generators for
//! the canonical entity types, fixture builders for common scenarios, a
//! deterministic in-memory `ResearchClient`/`EmbeddingProvider` pair, and a
//! handful of domain-specific assertions. Every other crate's test suite
//! builds `BuyerCriteriaProfile`/`SupplierOffering`/`TransactionRecord`
//! fixtures from here rather than hand-rolling them per test.

pub use plasticos_core::{
    BcpId, BuyerCriteriaProfile, ContaminationTolerance, EdgeType, EmbeddingVector, EntityIdType,
    GeographyConstraint, Hyperedge, LogisticsConstraint, MaterialDescriptor, PayloadMetadata,
    PlasticError, PlasticResult, PricingBand, SpecificationWindow, SupplierOffering,
    SupplierOfferingId, TransactionId, TransactionOutcome, TransactionRecord, WorldModelEntry,
};
pub use plasticos_llm::{EmbeddingProvider, ResearchClient};
pub use plasticos_storage::InMemoryHypergraphStore;
pub use plasticos_worldmodel::WorldModelService;

use async_trait::async_trait;
use chrono::Utc;

// ============================================================================
// STUB PROVIDERS
// ============================================================================

/// Deterministic research client for tests: returns a fixed JSON array of
/// BCP-shaped objects regardless of the prompt, so extraction tests never
/// depend on network access.
#[derive(Debug, Clone)]
pub struct StubResearchClient {
    pub response: String,
}

impl StubResearchClient {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }

    /// A single-BCP JSON blob shaped like a canonicalizable retrieval result.
    pub fn single_bcp_response(company: &str, polymer: &str) -> Self {
        Self::new(format!(
            r#"[{{"company_name":"{company}","buyer_location":"Wyoming, MI","material":{{"polymer":"{polymer}","forms":["pellet"],"colors":["natural"],"applications":["film"],"process":["blown film"]}},"specification":{{"mfi_min":0.3,"mfi_max":1.2,"density_min":0.94,"density_max":0.97,"ash_max":0.5,"filler_types":[]}},"contamination":{{"max_ppm":500,"banned":[]}},"certifications":["ISO9001"],"pricing_band":{{"min":0.3,"max":0.5,"currency":"USD","incoterm":"FOB"}},"geography":{{"countries":["US"],"states":["MI"],"regions":["Midwest"],"ports":[]}},"logistics":{{"min_load_lbs":40000,"max_lane_distance_miles":800}}}}]"#
        ))
    }

    pub fn empty_response() -> Self {
        Self::new("[]")
    }

    pub fn malformed_response() -> Self {
        Self::new("not json at all {{{")
    }
}

#[async_trait]
impl ResearchClient for StubResearchClient {
    async fn run_query(&self, _prompt: &str) -> PlasticResult<String> {
        Ok(self.response.clone())
    }
}

/// A `ResearchClient` that always fails, for retry/backoff and
/// partial-failure (Scenario E) test coverage.
#[derive(Debug, Clone, Default)]
pub struct FailingResearchClient;

#[async_trait]
impl ResearchClient for FailingResearchClient {
    async fn run_query(&self, _prompt: &str) -> PlasticResult<String> {
        Err(plasticos_core::RetrievalError::RequestFailed {
            provider: "stub".to_string(),
            status: 503,
            message: "stub induced failure".to_string(),
        }
        .into())
    }
}

/// Deterministic embedding provider: hashes input bytes into a fixed-dimension
/// vector so identical text always embeds identically, and near-identical
/// text embeds near-identically (useful for vector-similarity assertions).
#[derive(Debug, Clone)]
pub struct StubEmbeddingProvider {
    pub dimensions: usize,
}

impl StubEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut data = vec![0.0f32; self.dimensions];
        for (i, byte) in text.bytes().enumerate() {
            let idx = i % self.dimensions;
            data[idx] += (byte as f32) / 255.0;
        }
        let norm: f32 = data.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut data {
                *x /= norm;
            }
        }
        data
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbeddingProvider {
    async fn embed(&self, text: &str) -> PlasticResult<EmbeddingVector> {
        Ok(EmbeddingVector::new(self.embed_text(text), "stub-embed-v1"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> PlasticResult<Vec<EmbeddingVector>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).map(|d| EmbeddingVector::new(d, "stub-embed-v1")).collect())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! `proptest::Strategy` implementations for the canonical entity types.
    //! Kept deliberately narrow (bounded string lengths, small numeric
    //! ranges) so property tests stay fast and failures shrink to readable
    //! counter-examples.

    use super::*;
    use proptest::prelude::*;

    pub fn polymer() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("HDPE".to_string()),
            Just("LDPE".to_string()),
            Just("PP".to_string()),
            Just("PET".to_string()),
            Just("PVC".to_string()),
        ]
    }

    pub fn short_ascii() -> impl Strategy<Value = String> {
        "[a-zA-Z ]{3,24}".prop_map(|s| s.trim().to_string())
    }

    pub fn material_descriptor() -> impl Strategy<Value = MaterialDescriptor> {
        (
            polymer(),
            prop::collection::vec(short_ascii(), 0..3),
            prop::collection::vec(short_ascii(), 0..3),
            prop::collection::vec(short_ascii(), 0..3),
            prop::collection::vec(short_ascii(), 0..2),
        )
            .prop_map(|(polymer, forms, colors, applications, process)| MaterialDescriptor {
                polymer,
                forms,
                colors,
                applications,
                process,
            })
    }

    pub fn specification_window() -> impl Strategy<Value = SpecificationWindow> {
        (0.1f32..2.0, 0.8f32..1.1, 0.0f32..2.0).prop_map(|(mfi_min, density_min, ash_max)| {
            SpecificationWindow {
                mfi_min: Some(mfi_min),
                mfi_max: Some(mfi_min + 0.5),
                density_min: Some(density_min),
                density_max: Some(density_min + 0.05),
                ash_max: Some(ash_max),
                filler_types: vec![],
            }
        })
    }

    pub fn contamination_tolerance() -> impl Strategy<Value = ContaminationTolerance> {
        (1.0f32..5000.0).prop_map(|max_ppm| ContaminationTolerance {
            max_ppm: Some(max_ppm),
            banned: vec![],
        })
    }

    pub fn pricing_band() -> impl Strategy<Value = PricingBand> {
        (0.05f32..2.0).prop_map(|min| PricingBand {
            min: Some(min),
            max: Some(min + 0.2),
            currency: Some("USD".to_string()),
            incoterm: Some("FOB".to_string()),
        })
    }

    pub fn geography_constraint() -> impl Strategy<Value = GeographyConstraint> {
        prop::collection::vec(short_ascii(), 1..3).prop_map(|countries| GeographyConstraint {
            countries,
            states: vec![],
            regions: vec![],
            ports: vec![],
        })
    }

    pub fn logistics_constraint() -> impl Strategy<Value = LogisticsConstraint> {
        (1000.0f32..80000.0, 100.0f32..3000.0).prop_map(|(min_load_lbs, max_lane_distance_miles)| {
            LogisticsConstraint {
                min_load_lbs: Some(min_load_lbs),
                max_lane_distance_miles: Some(max_lane_distance_miles),
            }
        })
    }

    pub fn buyer_criteria_profile() -> impl Strategy<Value = BuyerCriteriaProfile> {
        (
            short_ascii(),
            short_ascii(),
            material_descriptor(),
            specification_window(),
            contamination_tolerance(),
            pricing_band(),
            geography_constraint(),
            logistics_constraint(),
            0.0f32..1.0,
        )
            .prop_map(
                |(
                    company_name,
                    buyer_location,
                    material,
                    specification,
                    contamination,
                    pricing_band,
                    geography,
                    logistics,
                    completeness_score,
                )| BuyerCriteriaProfile {
                    bcp_id: BcpId::now_v7(),
                    company_name,
                    buyer_location,
                    segments: vec![],
                    external_ids: vec![],
                    material,
                    specification,
                    contamination,
                    certifications: vec![],
                    pricing_band,
                    geography,
                    logistics,
                    metadata: PayloadMetadata {
                        version: 1,
                        source: "proptest".to_string(),
                        completeness_score,
                    },
                },
            )
    }

    pub fn supplier_offering() -> impl Strategy<Value = SupplierOffering> {
        (
            short_ascii(),
            material_descriptor(),
            0.1f32..2.0,
            0.8f32..1.1,
            0.0f32..5000.0,
            short_ascii(),
        )
            .prop_map(
                |(supplier_name, material, mfi, density, ppm, origin_location)| SupplierOffering {
                    supplier_offering_id: SupplierOfferingId::now_v7(),
                    supplier_edge_id: uuid::Uuid::new_v4().to_string(),
                    supplier_name,
                    material,
                    estimated_mfi: Some(mfi),
                    estimated_density: Some(density),
                    estimated_ppm: Some(ppm),
                    origin_location,
                    intake_at: Utc::now(),
                },
            )
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for the common scenarios in spec.md §8 ("Scenario
    //! A"..."Scenario F").

    use super::*;

    /// A fully-populated BCP: "Padnos" buys HDPE film pellets out of Michigan.
    /// Used as the seed buyer in Scenario C (repeat-business matching).
    pub fn padnos_hdpe_bcp() -> BuyerCriteriaProfile {
        BuyerCriteriaProfile {
            bcp_id: BcpId::now_v7(),
            company_name: "Padnos".to_string(),
            buyer_location: "Wyoming, MI".to_string(),
            segments: vec!["recycler".to_string()],
            external_ids: vec![],
            material: MaterialDescriptor {
                polymer: "HDPE".to_string(),
                forms: vec!["pellet".to_string()],
                colors: vec!["natural".to_string()],
                applications: vec!["film".to_string()],
                process: vec!["blown film".to_string()],
            },
            specification: SpecificationWindow {
                mfi_min: Some(0.3),
                mfi_max: Some(1.2),
                density_min: Some(0.94),
                density_max: Some(0.97),
                ash_max: Some(0.5),
                filler_types: vec![],
            },
            contamination: ContaminationTolerance {
                max_ppm: Some(500.0),
                banned: vec![],
            },
            certifications: vec!["ISO9001".to_string()],
            pricing_band: PricingBand {
                min: Some(0.30),
                max: Some(0.50),
                currency: Some("USD".to_string()),
                incoterm: Some("FOB".to_string()),
            },
            geography: GeographyConstraint {
                countries: vec!["US".to_string()],
                states: vec!["MI".to_string()],
                regions: vec!["Midwest".to_string()],
                ports: vec![],
            },
            logistics: LogisticsConstraint {
                min_load_lbs: Some(40_000.0),
                max_lane_distance_miles: Some(800.0),
            },
            metadata: PayloadMetadata {
                version: 1,
                source: "fixture".to_string(),
                completeness_score: 0.9,
            },
        }
    }

    /// A matching SupplierOffering from "Acme" within Padnos's tolerance
    /// bands. Used as the Scenario C happy-path offering.
    pub fn acme_hdpe_offering() -> SupplierOffering {
        SupplierOffering {
            supplier_offering_id: SupplierOfferingId::now_v7(),
            supplier_edge_id: uuid::Uuid::new_v4().to_string(),
            supplier_name: "Acme".to_string(),
            material: MaterialDescriptor {
                polymer: "HDPE".to_string(),
                forms: vec!["pellet".to_string()],
                colors: vec!["natural".to_string()],
                applications: vec!["film".to_string()],
                process: vec!["blown film".to_string()],
            },
            estimated_mfi: Some(0.5),
            estimated_density: Some(0.96),
            estimated_ppm: Some(200.0),
            origin_location: "Michigan".to_string(),
            intake_at: Utc::now(),
        }
    }

    /// Same offering, but over the contamination gate (Scenario D).
    pub fn contaminated_offering() -> SupplierOffering {
        SupplierOffering {
            estimated_ppm: Some(2000.0),
            ..acme_hdpe_offering()
        }
    }

    /// A closed, completed transaction linking Acme to Padnos for HDPE,
    /// seeding the repeat-business signal in Scenario C.
    pub fn acme_padnos_transaction() -> TransactionRecord {
        TransactionRecord {
            transaction_id: TransactionId::now_v7(),
            supplier_name: "Acme".to_string(),
            buyer_company_name: "Padnos".to_string(),
            buyer_location: "Wyoming, MI".to_string(),
            polymer: "HDPE".to_string(),
            lane_origin: "Michigan".to_string(),
            lane_destination: "Wyoming, MI".to_string(),
            price: 0.42,
            currency: "USD".to_string(),
            outcome: TransactionOutcome::Completed,
            claim_notes: None,
            quality_notes: Some("on-spec".to_string()),
            created_at: Utc::now(),
        }
    }

    pub fn test_embedding(dimensions: usize) -> EmbeddingVector {
        let data: Vec<f32> = (0..dimensions).map(|i| (i as f32) / (dimensions as f32)).collect();
        EmbeddingVector::new(data, "test-model".to_string())
    }

    /// A populated `InMemoryHypergraphStore` holding the Padnos BCP, useful
    /// as a one-line setup for matching-engine tests.
    pub fn store_with_padnos() -> InMemoryHypergraphStore {
        InMemoryHypergraphStore::new()
    }

    /// A fresh `WorldModelService` with default scoring policy, for tests
    /// that need `observe_hyperedge`/`observe_transaction` wiring without a
    /// full pipeline.
    pub fn fresh_world_model() -> WorldModelService {
        WorldModelService::default()
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Domain-specific assertion helpers, kept as plain functions (not
    //! macros) so failure messages carry full `Debug` context.

    use super::*;

    /// Asserts a `PlasticResult` is `Ok` and returns the value, panicking
    /// with the error's `Display` output otherwise.
    #[track_caller]
    pub fn assert_ok<T>(result: PlasticResult<T>) -> T {
        match result {
            Ok(value) => value,
            Err(e) => panic!("expected Ok, got Err({e})"),
        }
    }

    /// Asserts a hyperedge's required BCP fields (invariant 2, spec §3) are
    /// all non-empty.
    #[track_caller]
    pub fn assert_required_bcp_fields(bcp: &BuyerCriteriaProfile) {
        assert!(!bcp.company_name.is_empty(), "company_name must be non-empty");
        assert!(!bcp.buyer_location.is_empty(), "buyer_location must be non-empty");
        assert!(!bcp.material.polymer.is_empty(), "material.polymer must be non-empty");
    }

    /// Asserts a completeness score is in the valid `[0, 1]` range.
    #[track_caller]
    pub fn assert_valid_completeness(score: f32) {
        assert!(
            (0.0..=1.0).contains(&score),
            "completeness score {score} out of [0, 1] range"
        );
    }

    /// Asserts two hyperedges share `(edge_type, key)` identity — the
    /// invariant `write_hyperedge(h); write_hyperedge(h)` upsert idempotence
    /// depends on (invariant 1, spec §3).
    #[track_caller]
    pub fn assert_same_identity(a: &Hyperedge, b: &Hyperedge) {
        assert_eq!(a.edge_type, b.edge_type, "edge_type mismatch");
        assert_eq!(a.key, b.key, "key mismatch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn generated_bcps_satisfy_required_fields(bcp in generators::buyer_criteria_profile()) {
            assertions::assert_required_bcp_fields(&bcp);
            assertions::assert_valid_completeness(bcp.metadata.completeness_score);
        }
    }

    #[test]
    fn fixtures_are_self_consistent() {
        let bcp = fixtures::padnos_hdpe_bcp();
        assertions::assert_required_bcp_fields(&bcp);
        let offering = fixtures::acme_hdpe_offering();
        assert_eq!(offering.material.polymer, bcp.material.polymer);
    }
}
