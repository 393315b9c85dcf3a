//! Internal aggregate state for the World Model Service.
//!
//! Counters are updated inline on every observation (cheap, lock-held only
//! briefly); the smoothed `WorldModelEntry` scores are only recomputed on
//! `maybe_recompute`'s schedule, splitting raw counter storage from derived,
//! periodically-refreshed statistics.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use plasticos_core::{BuyerCriteriaProfile, TransactionRecord, WorldModelEntry, WorldModelSnapshot};

use crate::policy::{is_completed, is_unfavorable, ScoringPolicy};

/// Raw, incrementally-updated counters for one subject (a buyer BCP key, a
/// supplier name, a lane, or a polymer). `entry` holds the last-recomputed
/// smoothed scores; the other fields feed the next recompute.
#[derive(Debug, Clone, Default)]
pub(crate) struct SubjectCounters {
    pub transaction_count: u64,
    pub completed_count: u64,
    pub disputed_count: u64,
    pub cancelled_count: u64,
    pub repeat_business_count: u64,
    pub counterparts_seen: BTreeSet<String>,
    pub entry: WorldModelEntry,
}

impl SubjectCounters {
    /// Records one observed transaction against this subject, tracking
    /// repeat business against `counterpart` (the other side of the deal:
    /// supplier name for a buyer subject, buyer key for a supplier subject,
    /// empty string for lane/product subjects where repeat business does
    /// not apply).
    fn record(&mut self, outcome: plasticos_core::TransactionOutcome, counterpart: &str) {
        self.transaction_count += 1;
        if is_completed(outcome) {
            self.completed_count += 1;
        }
        match outcome {
            plasticos_core::TransactionOutcome::Disputed => self.disputed_count += 1,
            plasticos_core::TransactionOutcome::Cancelled => self.cancelled_count += 1,
            plasticos_core::TransactionOutcome::Completed => {}
        }
        if !counterpart.is_empty() && !self.counterparts_seen.insert(counterpart.to_string()) {
            self.repeat_business_count += 1;
        }
    }
}

/// Lane key derived from a transaction's origin/destination, used both to
/// index `lane_entries` and as the argument to `WorldModelService::lane_risk`.
pub fn lane_key(origin: &str, destination: &str) -> String {
    format!("{origin}|{destination}")
}

/// The mutable state guarded by `WorldModelService`'s `RwLock`.
#[derive(Debug, Default)]
pub(crate) struct WorldModelState {
    pub buyer_entries: BTreeMap<String, SubjectCounters>,
    pub supplier_entries: BTreeMap<String, SubjectCounters>,
    pub lane_entries: BTreeMap<String, SubjectCounters>,
    pub product_entries: BTreeMap<String, SubjectCounters>,
    pub by_polymer: BTreeMap<String, u64>,
    pub by_region: BTreeMap<String, u64>,
    pub bcp_count: u64,
    pub supplier_offering_count: u64,
    pub transaction_count: u64,
    pub events_since_recompute: u64,
    pub last_recompute_at: Option<DateTime<Utc>>,
}

impl WorldModelState {
    pub fn reset(&mut self) {
        *self = WorldModelState::default();
    }

    /// Registers a BCP's existence and its region/polymer buckets (invoked
    /// from `observe_hyperedge` on a Bcp write; does not itself touch
    /// transaction-derived scores).
    pub fn touch_bcp(&mut self, bcp_key: &str, profile: Option<&BuyerCriteriaProfile>) {
        self.buyer_entries.entry(bcp_key.to_string()).or_default();
        self.bcp_count += 1;
        if let Some(profile) = profile {
            *self.by_polymer.entry(profile.material.polymer.clone()).or_insert(0) += 1;
            let region = profile
                .geography
                .countries
                .first()
                .or_else(|| profile.geography.regions.first())
                .cloned()
                .unwrap_or_else(|| "unknown".to_string());
            *self.by_region.entry(region).or_insert(0) += 1;
        }
        self.events_since_recompute += 1;
    }

    /// Registers a supplier offering's existence (invoked from
    /// `observe_hyperedge` on a SupplierOffering write).
    pub fn touch_supplier(&mut self, supplier_key: &str) {
        self.supplier_entries.entry(supplier_key.to_string()).or_default();
        self.supplier_offering_count += 1;
        self.events_since_recompute += 1;
    }

    /// Records a closed transaction against its buyer, supplier, lane, and
    /// product subjects, updating raw counters inline.
    pub fn record_transaction(&mut self, record: &TransactionRecord) {
        let buyer_key = format!("{}|{}|{}", record.buyer_company_name, record.buyer_location, record.polymer);
        let lane = lane_key(&record.lane_origin, &record.lane_destination);

        self.buyer_entries
            .entry(buyer_key)
            .or_default()
            .record(record.outcome, &record.supplier_name);
        self.supplier_entries
            .entry(record.supplier_name.clone())
            .or_default()
            .record(record.outcome, &record.buyer_company_name);
        self.lane_entries.entry(lane).or_default().record(record.outcome, "");
        self.product_entries
            .entry(record.polymer.clone())
            .or_default()
            .record(record.outcome, "");

        self.transaction_count += 1;
        self.events_since_recompute += 1;
    }

    /// Recomputes every subject's smoothed scores in place, per
    /// `ScoringPolicy`. Called on the observe-count/interval schedule, never
    /// inline with a single observation.
    pub fn recompute_all(&mut self, policy: &ScoringPolicy, now: DateTime<Utc>) {
        for counters in self.buyer_entries.values_mut() {
            recompute_quality(counters, policy);
        }
        for counters in self.supplier_entries.values_mut() {
            recompute_quality(counters, policy);
        }
        for counters in self.lane_entries.values_mut() {
            recompute_risk(counters, policy);
        }
        for counters in self.product_entries.values_mut() {
            recompute_quality(counters, policy);
        }
        self.events_since_recompute = 0;
        self.last_recompute_at = Some(now);
    }

    pub fn snapshot(&self, taken_at: DateTime<Utc>) -> WorldModelSnapshot {
        WorldModelSnapshot {
            by_polymer: self.by_polymer.clone(),
            by_region: self.by_region.clone(),
            bcp_count: self.bcp_count,
            supplier_offering_count: self.supplier_offering_count,
            transaction_count: self.transaction_count,
            taken_at,
        }
    }
}

fn recompute_quality(counters: &mut SubjectCounters, policy: &ScoringPolicy) {
    let target = policy.target_quality_score(
        counters.transaction_count,
        counters.completed_count,
        counters.repeat_business_count,
    );
    counters.entry.buyer_score = policy.smooth(counters.entry.buyer_score, target);
    counters.entry.supplier_score = policy.smooth(counters.entry.supplier_score, target);
    counters.entry.product_stability_score = policy.smooth(counters.entry.product_stability_score, target);
    counters.entry.transaction_count = counters.transaction_count;
    counters.entry.repeat_business_count = counters.repeat_business_count;
}

fn recompute_risk(counters: &mut SubjectCounters, policy: &ScoringPolicy) {
    let target = policy.target_lane_risk(counters.transaction_count, counters.disputed_count, counters.cancelled_count);
    counters.entry.lane_risk_score = policy.smooth(counters.entry.lane_risk_score, target);
    counters.entry.transaction_count = counters.transaction_count;
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasticos_core::{EntityIdType, TransactionOutcome};

    fn sample_transaction(outcome: TransactionOutcome) -> TransactionRecord {
        TransactionRecord {
            transaction_id: plasticos_core::TransactionId::now_v7(),
            supplier_name: "Acme Recyclers".into(),
            buyer_company_name: "Globex".into(),
            buyer_location: "Houston, TX".into(),
            polymer: "HDPE".into(),
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

    #[test]
    fn repeat_transactions_with_same_counterpart_increment_repeat_business() {
        let mut state = WorldModelState::default();
        state.record_transaction(&sample_transaction(TransactionOutcome::Completed));
        state.record_transaction(&sample_transaction(TransactionOutcome::Completed));

        let key = "Globex|Houston, TX|HDPE";
        let counters = &state.buyer_entries[key];
        assert_eq!(counters.transaction_count, 2);
        assert_eq!(counters.repeat_business_count, 1);
    }

    #[test]
    fn recompute_moves_lane_risk_toward_dispute_ratio() {
        let mut state = WorldModelState::default();
        state.record_transaction(&sample_transaction(TransactionOutcome::Disputed));
        let policy = ScoringPolicy::default();
        state.recompute_all(&policy, Utc::now());

        let lane = lane_key("Houston", "Rotterdam");
        let risk = state.lane_entries[&lane].entry.lane_risk_score;
        assert!(risk > 0.0);
    }
}
