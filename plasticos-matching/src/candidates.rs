//! Step 1: Candidate generation (spec §4.5). Vector top-K over buyer
//! embeddings, filtered to an exact polymer-family match — the only filter
//! the spec names at this step; rule gates narrow further downstream.

use plasticos_core::{BuyerCriteriaProfile, EdgeType, Effect};
use plasticos_storage::HypergraphStore;

/// A BCP paired with its vector-similarity score, before any gate has run.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub bcp: BuyerCriteriaProfile,
    pub vector_similarity: f32,
}

/// Over-fetches `top_k * OVERFETCH` hyperedges so the post-hoc polymer
/// filter still has `top_k` candidates left after narrowing, without
/// requiring `HypergraphStore::top_k_by_vector` to carry a filter
/// parameter of its own.
const OVERFETCH_FACTOR: usize = 4;

pub async fn generate_candidates(
    store: &dyn HypergraphStore,
    polymer: &str,
    query_vector: &[f32],
    top_k: usize,
) -> Effect<Vec<Candidate>> {
    let fetch_k = top_k.max(1) * OVERFETCH_FACTOR;
    let scored = match store.top_k_by_vector(EdgeType::Bcp, query_vector, fetch_k).await {
        Effect::Ok(scored) => scored,
        Effect::Err(e) => return Effect::Err(e),
        Effect::Retry { after, attempt, max_attempts, reason } => {
            return Effect::Retry { after, attempt, max_attempts, reason };
        }
    };

    let mut candidates = Vec::new();
    for (edge, similarity) in scored {
        let Ok(bcp) = serde_json::from_value::<BuyerCriteriaProfile>(edge.payload.clone()) else {
            continue;
        };
        if !bcp.material.polymer.eq_ignore_ascii_case(polymer) {
            continue;
        }
        candidates.push(Candidate { bcp, vector_similarity: similarity });
        if candidates.len() >= top_k {
            break;
        }
    }
    Effect::Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use plasticos_core::{
        ContaminationTolerance, EmbeddingVector, EntityIdType, GeographyConstraint, Hyperedge,
        LogisticsConstraint, MaterialDescriptor, PayloadMetadata, PricingBand, SpecificationWindow,
    };
    use plasticos_storage::InMemoryHypergraphStore;

    fn sample_bcp(key: &str, polymer: &str, embedding: Vec<f32>) -> Hyperedge {
        let bcp = BuyerCriteriaProfile {
            bcp_id: plasticos_core::BcpId::now_v7(),
            company_name: key.to_string(),
            buyer_location: "Houston, TX".into(),
            segments: vec![],
            external_ids: vec![],
            material: MaterialDescriptor {
                polymer: polymer.to_string(),
                forms: vec![],
                colors: vec![],
                applications: vec![],
                process: vec![],
            },
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
        };
        Hyperedge {
            edge_type: EdgeType::Bcp,
            key: bcp.hyperedge_key(),
            payload: serde_json::to_value(&bcp).unwrap(),
            embedding: Some(EmbeddingVector::new(embedding, "stub-v1")),
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn filters_out_other_polymer_families() {
        let store = InMemoryHypergraphStore::default();
        store.write_hyperedge(sample_bcp("Padnos", "HDPE", vec![1.0, 0.0, 0.0])).await;
        store.write_hyperedge(sample_bcp("Globex", "LDPE", vec![1.0, 0.0, 0.0])).await;

        let candidates = generate_candidates(&store, "HDPE", &[1.0, 0.0, 0.0], 10).await.into_result().unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].bcp.company_name, "Padnos");
    }

    #[tokio::test]
    async fn polymer_match_is_case_insensitive() {
        let store = InMemoryHypergraphStore::default();
        store.write_hyperedge(sample_bcp("Padnos", "hdpe", vec![1.0, 0.0, 0.0])).await;

        let candidates = generate_candidates(&store, "HDPE", &[1.0, 0.0, 0.0], 10).await.into_result().unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[tokio::test]
    async fn empty_store_yields_no_candidates() {
        let store = InMemoryHypergraphStore::default();
        let candidates = generate_candidates(&store, "HDPE", &[1.0, 0.0, 0.0], 10).await.into_result().unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn respects_top_k_after_filtering() {
        let store = InMemoryHypergraphStore::default();
        for i in 0..5 {
            store
                .write_hyperedge(sample_bcp(&format!("Buyer{i}"), "HDPE", vec![1.0, 0.0, 0.0]))
                .await;
        }
        let candidates = generate_candidates(&store, "HDPE", &[1.0, 0.0, 0.0], 3).await.into_result().unwrap();
        assert_eq!(candidates.len(), 3);
    }
}
