//! Stage 5: Integration (spec §4.4). Writes each validated payload as a
//! hyperedge and notifies the World Model. Failure here is per-hyperedge:
//! writes are retried a bounded number of times, persistent failures are
//! reported in the job summary's warnings rather than aborting the stage.

use std::sync::Arc;

use plasticos_core::{Effect, Hyperedge};
use plasticos_storage::HypergraphStore;
use plasticos_worldmodel::WorldModelService;
use tracing::warn;

use crate::context::ExtractedRecord;

const MAX_WRITE_ATTEMPTS: u32 = 3;

pub struct IntegrationStage {
    store: Arc<dyn HypergraphStore>,
    world_model: Arc<WorldModelService>,
}

impl IntegrationStage {
    pub fn new(store: Arc<dyn HypergraphStore>, world_model: Arc<WorldModelService>) -> Self {
        Self { store, world_model }
    }

    /// Writes every extracted record as a hyperedge, bumping the version if
    /// one already exists at the same key, and observes it into the World
    /// Model. Returns the number of BCPs successfully written plus a
    /// warning per record that could not be written after retries.
    pub async fn run(&self, records: &[ExtractedRecord]) -> (usize, Vec<String>) {
        let mut written = 0usize;
        let mut warnings = Vec::new();

        for record in records {
            match self.write_one(record).await {
                Ok(edge) => {
                    written += 1;
                    if let Effect::Err(e) = self.world_model.observe_hyperedge(&edge).await {
                        warn!(key = %edge.key, error = %e, "integration: world model observe failed");
                        warnings.push(format!(
                            "integration: world model observe failed for {}: {e}",
                            edge.key
                        ));
                    }
                }
                Err(reason) => {
                    warn!(query_id = %record.query_id, reason = %reason, "integration: giving up on hyperedge write");
                    warnings.push(format!(
                        "integration: write failed for query {}: {reason}",
                        record.query_id
                    ));
                }
            }
        }

        (written, warnings)
    }

    async fn write_one(&self, record: &ExtractedRecord) -> Result<Hyperedge, String> {
        let previous_version = match self
            .store
            .read_hyperedge(record.payload.edge_type(), &record.payload.hyperedge_key())
            .await
        {
            Effect::Ok(Some(existing)) => Some(existing.version),
            Effect::Ok(None) => None,
            Effect::Err(e) => return Err(e.to_string()),
            Effect::Retry { reason, .. } => return Err(reason),
        };

        let edge = plasticos_schema::to_hyperedge(&record.payload, previous_version)
            .map_err(|e| e.to_string())?;

        let mut last_reason = String::from("never attempted");
        for attempt in 0..MAX_WRITE_ATTEMPTS {
            match self.store.write_hyperedge(edge.clone()).await {
                Effect::Ok(_) => return Ok(edge),
                Effect::Err(e) => last_reason = e.to_string(),
                Effect::Retry { after, reason, .. } => {
                    last_reason = reason;
                    tokio::time::sleep(after).await;
                }
            }
            let _ = attempt;
        }

        Err(last_reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasticos_core::{
        BcpId, BuyerCriteriaProfile, ContaminationTolerance, EntityIdType, GeographyConstraint,
        LogisticsConstraint, MaterialDescriptor, PayloadMetadata, PricingBand, QueryId,
        SpecificationWindow,
    };
    use plasticos_schema::CanonicalPayload;
    use plasticos_storage::InMemoryHypergraphStore;

    fn minimal_bcp() -> BuyerCriteriaProfile {
        BuyerCriteriaProfile {
            bcp_id: BcpId::now_v7(),
            company_name: "Acme".to_string(),
            buyer_location: "Detroit, MI".to_string(),
            segments: vec![],
            external_ids: vec![],
            material: MaterialDescriptor {
                polymer: "PP".to_string(),
                forms: vec![],
                colors: vec![],
                applications: vec![],
                process: vec![],
            },
            specification: SpecificationWindow {
                mfi_min: None,
                mfi_max: None,
                density_min: None,
                density_max: None,
                ash_max: None,
                filler_types: vec![],
            },
            contamination: ContaminationTolerance { max_ppm: None, banned: vec![] },
            certifications: vec![],
            pricing_band: PricingBand { min: None, max: None, currency: None, incoterm: None },
            geography: GeographyConstraint { countries: vec![], states: vec![], regions: vec![], ports: vec![] },
            logistics: LogisticsConstraint { min_load_lbs: None, max_lane_distance_miles: None },
            metadata: PayloadMetadata { version: 1, source: "test".into(), completeness_score: 0.0 },
        }
    }

    fn sample_record() -> ExtractedRecord {
        ExtractedRecord {
            query_id: QueryId::now_v7(),
            payload: CanonicalPayload::Bcp(minimal_bcp()),
            completeness: 0.8,
        }
    }

    #[tokio::test]
    async fn writes_are_counted_and_observed() {
        let store: Arc<dyn HypergraphStore> = Arc::new(InMemoryHypergraphStore::default());
        let world_model = Arc::new(WorldModelService::default());
        let stage = IntegrationStage::new(store.clone(), world_model.clone());

        let (written, warnings) = stage.run(&[sample_record()]).await;
        assert_eq!(written, 1);
        assert!(warnings.is_empty());

        let snapshot = match world_model.snapshot().await {
            Effect::Ok(s) => s,
            other => panic!("expected snapshot, got {other:?}"),
        };
        assert_eq!(snapshot.bcp_count, 1);
    }

    #[tokio::test]
    async fn re_integrating_the_same_record_bumps_the_version() {
        let store: Arc<dyn HypergraphStore> = Arc::new(InMemoryHypergraphStore::default());
        let world_model = Arc::new(WorldModelService::default());
        let stage = IntegrationStage::new(store.clone(), world_model.clone());

        let record = sample_record();
        stage.run(&[record.clone()]).await;
        stage.run(&[record.clone()]).await;

        let edge = match store.read_hyperedge(record.payload.edge_type(), &record.payload.hyperedge_key()).await {
            Effect::Ok(Some(e)) => e,
            other => panic!("expected hyperedge, got {other:?}"),
        };
        assert_eq!(edge.version, 2);
    }
}
