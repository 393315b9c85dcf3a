//! Step 3: structural enrichment (spec §4.5). Looks up prior
//! `TransactionRecord` hyperedges for repeat-business and lane-precedent
//! signals. The in-memory/hybrid store's `query_graph_pattern` only
//! projects `(:Buyer)-[:HAS_BCP]->...` patterns (spec §4.2) — transactions
//! have no such structural query defined yet, so this scans
//! `list_by_type(Transaction, ...)` and filters locally, which the
//! `HypergraphStore` contract already supports.

use plasticos_core::{BuyerCriteriaProfile, EdgeType, Effect, SupplierOffering, TransactionOutcome, TransactionRecord};
use plasticos_storage::HypergraphStore;

/// Historical signals gathered for one `(offering, bcp)` pair.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StructuralSignals {
    /// Closed transactions between this exact supplier, buyer, and polymer.
    pub repeat_transaction_count: u64,
    /// Of those, how many completed (vs. disputed/cancelled).
    pub repeat_completed_count: u64,
    /// Closed transactions on the same origin/destination lane, any
    /// supplier/buyer — a precedent signal even with no direct history.
    pub lane_precedent_count: u64,
}

pub async fn enrich_structural(
    store: &dyn HypergraphStore,
    offering: &SupplierOffering,
    bcp: &BuyerCriteriaProfile,
    scan_limit: usize,
) -> Effect<StructuralSignals> {
    let transactions = match store.list_by_type(EdgeType::Transaction, scan_limit).await {
        Effect::Ok(edges) => edges,
        Effect::Err(e) => return Effect::Err(e),
        Effect::Retry { after, attempt, max_attempts, reason } => {
            return Effect::Retry { after, attempt, max_attempts, reason };
        }
    };

    let mut signals = StructuralSignals::default();
    for edge in &transactions {
        let Ok(tx) = serde_json::from_value::<TransactionRecord>(edge.payload.clone()) else {
            continue;
        };
        if is_repeat_business(&tx, offering, bcp) {
            signals.repeat_transaction_count += 1;
            if tx.outcome == TransactionOutcome::Completed {
                signals.repeat_completed_count += 1;
            }
        } else if is_lane_precedent(&tx, offering, bcp) {
            signals.lane_precedent_count += 1;
        }
    }

    Effect::Ok(signals)
}

fn is_repeat_business(tx: &TransactionRecord, offering: &SupplierOffering, bcp: &BuyerCriteriaProfile) -> bool {
    tx.supplier_name.eq_ignore_ascii_case(&offering.supplier_name)
        && tx.buyer_company_name.eq_ignore_ascii_case(&bcp.company_name)
        && tx.polymer.eq_ignore_ascii_case(&bcp.material.polymer)
}

fn is_lane_precedent(tx: &TransactionRecord, offering: &SupplierOffering, bcp: &BuyerCriteriaProfile) -> bool {
    tx.lane_origin.eq_ignore_ascii_case(&offering.origin_location)
        && tx.lane_destination.eq_ignore_ascii_case(&bcp.buyer_location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use plasticos_core::{EntityIdType, EmbeddingVector, Hyperedge, MaterialDescriptor};
    use plasticos_storage::InMemoryHypergraphStore;

    fn tx_hyperedge(tx: &TransactionRecord) -> Hyperedge {
        Hyperedge {
            edge_type: EdgeType::Transaction,
            key: tx.transaction_id.to_string(),
            payload: serde_json::to_value(tx).unwrap(),
            embedding: None::<EmbeddingVector>,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_transaction(outcome: TransactionOutcome) -> TransactionRecord {
        TransactionRecord {
            transaction_id: plasticos_core::TransactionId::now_v7(),
            supplier_name: "Acme".into(),
            buyer_company_name: "Padnos".into(),
            buyer_location: "Wyoming, MI".into(),
            polymer: "HDPE".into(),
            lane_origin: "Detroit, MI".into(),
            lane_destination: "Wyoming, MI".into(),
            price: 850.0,
            currency: "USD".into(),
            outcome,
            claim_notes: None,
            quality_notes: None,
            created_at: Utc::now(),
        }
    }

    fn sample_offering() -> SupplierOffering {
        SupplierOffering {
            supplier_offering_id: plasticos_core::SupplierOfferingId::now_v7(),
            supplier_edge_id: "intake-1".into(),
            supplier_name: "Acme".into(),
            material: MaterialDescriptor { polymer: "HDPE".into(), forms: vec![], colors: vec![], applications: vec![], process: vec![] },
            estimated_mfi: Some(0.5),
            estimated_density: Some(0.96),
            estimated_ppm: Some(1000.0),
            origin_location: "Detroit, MI".into(),
            intake_at: Utc::now(),
        }
    }

    fn sample_bcp() -> BuyerCriteriaProfile {
        BuyerCriteriaProfile {
            bcp_id: plasticos_core::BcpId::now_v7(),
            company_name: "Padnos".into(),
            buyer_location: "Wyoming, MI".into(),
            segments: vec![],
            external_ids: vec![],
            material: MaterialDescriptor { polymer: "HDPE".into(), forms: vec![], colors: vec![], applications: vec![], process: vec![] },
            specification: plasticos_core::SpecificationWindow {
                mfi_min: None,
                mfi_max: None,
                density_min: None,
                density_max: None,
                ash_max: None,
                filler_types: vec![],
            },
            contamination: plasticos_core::ContaminationTolerance { max_ppm: None, banned: vec![] },
            certifications: vec![],
            pricing_band: plasticos_core::PricingBand { min: None, max: None, currency: None, incoterm: None },
            geography: plasticos_core::GeographyConstraint { countries: vec![], states: vec![], regions: vec![], ports: vec![] },
            logistics: plasticos_core::LogisticsConstraint { min_load_lbs: None, max_lane_distance_miles: None },
            metadata: plasticos_core::PayloadMetadata { version: 1, source: "test".into(), completeness_score: 0.5 },
        }
    }

    #[tokio::test]
    async fn counts_repeat_business_for_the_exact_supplier_buyer_polymer_triple() {
        let store = InMemoryHypergraphStore::default();
        store.write_hyperedge(tx_hyperedge(&sample_transaction(TransactionOutcome::Completed))).await;
        store.write_hyperedge(tx_hyperedge(&sample_transaction(TransactionOutcome::Disputed))).await;

        let signals = enrich_structural(&store, &sample_offering(), &sample_bcp(), 100).await.into_result().unwrap();
        assert_eq!(signals.repeat_transaction_count, 2);
        assert_eq!(signals.repeat_completed_count, 1);
    }

    #[tokio::test]
    async fn unrelated_lane_transactions_count_as_precedent_only() {
        let store = InMemoryHypergraphStore::default();
        let mut tx = sample_transaction(TransactionOutcome::Completed);
        tx.supplier_name = "OtherSupplier".into();
        tx.buyer_company_name = "Padnos".into();
        store.write_hyperedge(tx_hyperedge(&tx)).await;

        let signals = enrich_structural(&store, &sample_offering(), &sample_bcp(), 100).await.into_result().unwrap();
        assert_eq!(signals.repeat_transaction_count, 0);
        assert_eq!(signals.lane_precedent_count, 1);
    }

    #[tokio::test]
    async fn no_transactions_yields_zeroed_signals() {
        let store = InMemoryHypergraphStore::default();
        let signals = enrich_structural(&store, &sample_offering(), &sample_bcp(), 100).await.into_result().unwrap();
        assert_eq!(signals, StructuralSignals::default());
    }
}
