//! World Model Service: the brokerage's running picture of buyers,
//! suppliers, lanes, and products, built from the hyperedge write stream and
//! closed transactions.
//!
//! Two halves: [`aggregates`] holds the raw counters and the smoothed
//! `WorldModelEntry` scores they produce; [`policy`] pins down the scoring
//! formulas (an Open Question in the original sketch, resolved here as an
//! overridable [`policy::ScoringPolicy`]). This module wraps both behind a
//! single-writer-many-readers lock and exposes the service's public
//! contract: `observe_hyperedge`, `observe_transaction`, `snapshot`,
//! `buyer_score`, `lane_risk`, and `rebuild_from_log`.

mod aggregates;
mod policy;

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use plasticos_core::{
    BuyerCriteriaProfile, EdgeType, Effect, Event, EventHeader, EventId, EventKind, Hyperedge,
    PlasticError, SupplierOffering, TransactionRecord, WorldModelError, WorldModelSnapshot,
};
use plasticos_dag::AsyncEventDag;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub use aggregates::lane_key;
pub use policy::ScoringPolicy;

use aggregates::WorldModelState;

/// Payload carried by the append-only log entries this service replays.
/// `plasticos-pg`'s `hyperedge_log` table stores entries in this shape (a
/// hyperedge write, or a closed transaction) so `rebuild_from_log` can
/// reconstruct aggregate state without re-deriving it from `hyperedges`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldModelLogEntry {
    HyperedgeWritten(Hyperedge),
    TransactionClosed(TransactionRecord),
}

impl WorldModelLogEntry {
    /// The `EventKind` this entry must be stamped with on append, so
    /// `rebuild_from_log`'s `find_by_kind` lookups can find it again.
    fn event_kind(&self) -> EventKind {
        match self {
            WorldModelLogEntry::HyperedgeWritten(_) => EventKind::HYPEREDGE_WRITTEN,
            WorldModelLogEntry::TransactionClosed(_) => EventKind::TRANSACTION_CLOSED,
        }
    }
}

/// Appends a log entry to `dag`, stamping the `EventKind` its variant maps
/// to. Writers of the `hyperedge_log` (and tests exercising
/// [`WorldModelService::rebuild_from_log`]) must go through this instead of
/// `EventDagExt::append_root`, which always stamps `EventKind::DATA`.
pub async fn append_log_entry<D>(dag: &D, entry: WorldModelLogEntry) -> Effect<EventId>
where
    D: AsyncEventDag<Payload = WorldModelLogEntry> + Sync,
{
    let kind = entry.event_kind();
    let position = match dag.next_position(None, 0).await {
        Effect::Ok(pos) => pos,
        Effect::Err(e) => return Effect::Err(e),
        Effect::Retry { after, attempt, max_attempts, reason } => {
            return Effect::Retry { after, attempt, max_attempts, reason };
        }
    };
    let event = Event {
        header: EventHeader::new(kind, position),
        payload: entry,
    };
    dag.append(event).await
}

/// How often `observe_*` triggers a smoothed-score recompute: every N
/// observations. A scheduled task may additionally call
/// [`WorldModelService::recompute_now`] on a wall-clock interval
/// (`reconciliation_interval_seconds`).
const DEFAULT_RECOMPUTE_EVERY: u64 = 25;

/// Aggregate scoring service over the hyperedge stream (spec §4.3).
///
/// Incremental counters are updated inline under a brief write lock; the
/// smoothed scores are only recomputed every `recompute_every` observations
/// (or on an explicit [`WorldModelService::recompute_now`] call), so a
/// matching pass reading [`WorldModelService::snapshot`] never pays the cost
/// of a full recompute on the hot path.
pub struct WorldModelService {
    state: RwLock<WorldModelState>,
    policy: ScoringPolicy,
    recompute_every: u64,
    observations: AtomicU64,
}

impl Default for WorldModelService {
    fn default() -> Self {
        Self::new(ScoringPolicy::default(), DEFAULT_RECOMPUTE_EVERY)
    }
}

impl WorldModelService {
    pub fn new(policy: ScoringPolicy, recompute_every: u64) -> Self {
        Self {
            state: RwLock::new(WorldModelState::default()),
            policy,
            recompute_every: recompute_every.max(1),
            observations: AtomicU64::new(0),
        }
    }

    /// Registers a hyperedge write: BCP writes seed a buyer subject and the
    /// polymer/region histograms; SupplierOffering writes seed a supplier
    /// subject. Transaction hyperedges carry no world-model-relevant fields
    /// beyond what `observe_transaction` already captures, so they are a
    /// no-op here.
    pub async fn observe_hyperedge(&self, edge: &Hyperedge) -> Effect<()> {
        match edge.edge_type {
            EdgeType::Bcp => {
                let profile: BuyerCriteriaProfile = match serde_json::from_value(edge.payload.clone()) {
                    Ok(profile) => profile,
                    Err(e) => {
                        return Effect::err(PlasticError::WorldModel(WorldModelError::MalformedPayload {
                            expected: "BuyerCriteriaProfile".to_string(),
                            reason: e.to_string(),
                        }));
                    }
                };
                let mut state = self.state.write().await;
                state.touch_bcp(&edge.key, Some(&profile));
            }
            EdgeType::SupplierOffering => {
                let _offering: SupplierOffering = match serde_json::from_value(edge.payload.clone()) {
                    Ok(offering) => offering,
                    Err(e) => {
                        return Effect::err(PlasticError::WorldModel(WorldModelError::MalformedPayload {
                            expected: "SupplierOffering".to_string(),
                            reason: e.to_string(),
                        }));
                    }
                };
                let mut state = self.state.write().await;
                state.touch_supplier(&edge.key);
            }
            EdgeType::Transaction => {
                debug!(key = %edge.key, "transaction hyperedge observed, deferring to observe_transaction");
            }
        }
        self.maybe_recompute().await;
        Effect::Ok(())
    }

    /// Records a closed transaction against its buyer, supplier, lane, and
    /// product subjects.
    pub async fn observe_transaction(&self, record: &TransactionRecord) -> Effect<()> {
        {
            let mut state = self.state.write().await;
            state.record_transaction(record);
        }
        self.maybe_recompute().await;
        Effect::Ok(())
    }

    /// A cheap, read-only snapshot of the global histograms, suitable for
    /// taking once at the start of a matching pass.
    pub async fn snapshot(&self) -> Effect<WorldModelSnapshot> {
        let state = self.state.read().await;
        Effect::Ok(state.snapshot(Utc::now()))
    }

    /// The smoothed `buyer_score` for a BCP key (`Company|Location|Polymer`),
    /// or the policy's neutral score if the subject has never been observed.
    pub async fn buyer_score(&self, bcp_key: &str) -> Effect<f32> {
        let state = self.state.read().await;
        match state.buyer_entries.get(bcp_key) {
            Some(counters) => Effect::Ok(counters.entry.buyer_score),
            None => Effect::Ok(self.policy.neutral_score),
        }
    }

    /// The smoothed `lane_risk_score` for a lane key (see [`lane_key`]), or
    /// the policy's neutral baseline if the lane has never been observed.
    pub async fn lane_risk(&self, lane: &str) -> Effect<f32> {
        let state = self.state.read().await;
        match state.lane_entries.get(lane) {
            Some(counters) => Effect::Ok(counters.entry.lane_risk_score),
            None => Effect::Ok(self.policy.neutral_score * (1.0 - self.policy.risk_weight)),
        }
    }

    /// Forces an immediate recompute of every subject's smoothed scores,
    /// bypassing the observation-count schedule. Intended for a scheduled
    /// task driven by `reconciliation_interval_seconds`.
    pub async fn recompute_now(&self) {
        let mut state = self.state.write().await;
        let now = Utc::now();
        state.recompute_all(&self.policy, now);
    }

    async fn maybe_recompute(&self) {
        let count = self.observations.fetch_add(1, Ordering::Relaxed) + 1;
        if count % self.recompute_every == 0 {
            self.recompute_now().await;
        }
    }

    /// Rebuilds aggregate state from scratch by replaying every entry in the
    /// append-only event log, in log order. Used after a process restart, or
    /// to repair drift detected by the reconciliation job.
    pub async fn rebuild_from_log<D>(&self, dag: &D) -> Effect<()>
    where
        D: AsyncEventDag<Payload = WorldModelLogEntry> + Sync,
    {
        let mut entries: Vec<Event<WorldModelLogEntry>> = Vec::new();

        match dag.find_by_kind(EventKind::HYPEREDGE_WRITTEN, 0, u32::MAX, usize::MAX).await {
            Effect::Ok(events) => entries.extend(events),
            Effect::Err(e) => return Effect::Err(e),
            Effect::Retry { after, attempt, max_attempts, reason } => {
                return Effect::Retry { after, attempt, max_attempts, reason };
            }
        }

        match dag.find_by_kind(EventKind::TRANSACTION_CLOSED, 0, u32::MAX, usize::MAX).await {
            Effect::Ok(events) => entries.extend(events),
            Effect::Err(e) => return Effect::Err(e),
            Effect::Retry { after, attempt, max_attempts, reason } => {
                return Effect::Retry { after, attempt, max_attempts, reason };
            }
        }

        entries.sort_by_key(|event| event.header.timestamp_micros);

        let mut state = self.state.write().await;
        state.reset();
        for event in entries {
            match event.payload {
                WorldModelLogEntry::HyperedgeWritten(edge) => match edge.edge_type {
                    EdgeType::Bcp => {
                        let profile: Option<BuyerCriteriaProfile> =
                            serde_json::from_value(edge.payload.clone()).ok();
                        if profile.is_none() {
                            warn!(key = %edge.key, "skipping malformed BCP hyperedge during replay");
                        }
                        state.touch_bcp(&edge.key, profile.as_ref());
                    }
                    EdgeType::SupplierOffering => state.touch_supplier(&edge.key),
                    EdgeType::Transaction => {}
                },
                WorldModelLogEntry::TransactionClosed(record) => state.record_transaction(&record),
            }
        }
        let now = Utc::now();
        state.recompute_all(&self.policy, now);
        drop(state);

        self.observations.store(0, Ordering::Relaxed);
        Effect::Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasticos_core::{EntityIdType, TransactionOutcome};
    use plasticos_dag::InMemoryEventDag;

    fn unwrap_ok<T>(effect: Effect<T>) -> T {
        match effect {
            Effect::Ok(v) => v,
            Effect::Err(e) => panic!("expected Ok, got Err: {e}"),
            Effect::Retry { reason, .. } => panic!("expected Ok, got Retry: {reason}"),
        }
    }

    fn sample_transaction(polymer: &str, outcome: TransactionOutcome) -> TransactionRecord {
        TransactionRecord {
            transaction_id: plasticos_core::TransactionId::now_v7(),
            supplier_name: "Acme Recyclers".into(),
            buyer_company_name: "Globex".into(),
            buyer_location: "Houston, TX".into(),
            polymer: polymer.into(),
            lane_origin: "Houston".into(),
            lane_destination: "Rotterdam".into(),
            price: 900.0,
            currency: "USD".into(),
            outcome,
            claim_notes: None,
            quality_notes: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn unobserved_buyer_gets_neutral_score() {
        let service = WorldModelService::default();
        let score = unwrap_ok(service.buyer_score("nobody|nowhere|PP").await);
        assert_eq!(score, service.policy.neutral_score);
    }

    #[tokio::test]
    async fn recompute_schedule_fires_after_n_observations() {
        let service = WorldModelService::new(ScoringPolicy::default(), 2);
        unwrap_ok(service.observe_transaction(&sample_transaction("HDPE", TransactionOutcome::Completed)).await);
        let before = unwrap_ok(service.buyer_score("Globex|Houston, TX|HDPE").await);
        assert_eq!(before, 0.0);

        unwrap_ok(service.observe_transaction(&sample_transaction("HDPE", TransactionOutcome::Completed)).await);
        let after = unwrap_ok(service.buyer_score("Globex|Houston, TX|HDPE").await);
        assert!(after > 0.0);
    }

    #[tokio::test]
    async fn snapshot_reflects_observed_transaction_count() {
        let service = WorldModelService::default();
        unwrap_ok(service.observe_transaction(&sample_transaction("PP", TransactionOutcome::Completed)).await);
        let snapshot = unwrap_ok(service.snapshot().await);
        assert_eq!(snapshot.transaction_count, 1);
    }

    #[tokio::test]
    async fn rebuild_from_log_reproduces_state_from_an_empty_log() {
        let service = WorldModelService::default();
        let dag: InMemoryEventDag<WorldModelLogEntry> = InMemoryEventDag::new();
        unwrap_ok(service.rebuild_from_log(&dag).await);
        let snapshot = unwrap_ok(service.snapshot().await);
        assert_eq!(snapshot.transaction_count, 0);
    }

    #[tokio::test]
    async fn rebuild_from_log_recovers_from_corrupted_aggregates() {
        // The log is the source of truth: two completed HDPE transactions.
        let dag: InMemoryEventDag<WorldModelLogEntry> = InMemoryEventDag::new();
        append_log_entry(
            &dag,
            WorldModelLogEntry::TransactionClosed(sample_transaction("HDPE", TransactionOutcome::Completed)),
        )
        .await
        .into_result()
        .unwrap();
        append_log_entry(
            &dag,
            WorldModelLogEntry::TransactionClosed(sample_transaction("HDPE", TransactionOutcome::Completed)),
        )
        .await
        .into_result()
        .unwrap();

        // Simulate drift: a service that has observed a different history
        // (one disputed PP transaction against an unrelated buyer) ends up
        // with a transaction_count and buyer_score inconsistent with the log.
        let service = WorldModelService::default();
        unwrap_ok(service.observe_transaction(&sample_transaction("PP", TransactionOutcome::Disputed)).await);
        let drifted = unwrap_ok(service.snapshot().await);
        assert_eq!(drifted.transaction_count, 1);

        unwrap_ok(service.rebuild_from_log(&dag).await);
        let recovered = unwrap_ok(service.snapshot().await);
        assert_eq!(recovered.transaction_count, 2);

        let buyer_score = unwrap_ok(service.buyer_score("Globex|Houston, TX|HDPE").await);
        assert!(buyer_score > 0.0, "rebuilt state should reflect two completed HDPE transactions, got {buyer_score}");
    }
}
