//! Watermark and change journal for cache invalidation.
//!
//! The change journal tracks hyperedge mutations, letting the cache
//! determine whether cached data might be stale without re-reading storage.

use async_trait::async_trait;
use plasticos_core::{EdgeType, PlasticError};
use chrono::{DateTime, Utc};

/// A point in the mutation history. Watermarks are monotonically increasing
/// and comparable to determine whether writes occurred between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark {
    pub sequence: i64,
    pub observed_at: DateTime<Utc>,
}

impl Watermark {
    pub fn new(sequence: i64) -> Self {
        Self {
            sequence,
            observed_at: Utc::now(),
        }
    }

    pub fn with_timestamp(sequence: i64, observed_at: DateTime<Utc>) -> Self {
        Self { sequence, observed_at }
    }

    pub fn zero() -> Self {
        Self {
            sequence: 0,
            observed_at: DateTime::UNIX_EPOCH.into(),
        }
    }

    pub fn is_newer_than(&self, other: &Watermark) -> bool {
        self.sequence > other.sequence
    }

    pub fn is_at_least(&self, other: &Watermark) -> bool {
        self.sequence >= other.sequence
    }

    pub fn gap(&self, other: &Watermark) -> i64 {
        (self.sequence - other.sequence).abs()
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Self::zero()
    }
}

/// Tracks mutations across the whole store — there is one tenant, the
/// brokerage's own world model (spec §4); no multi-tenant concept in this
/// system.
#[async_trait]
pub trait ChangeJournal: Send + Sync {
    async fn current_watermark(&self) -> Result<Watermark, PlasticError>;

    async fn watermark_at(&self, at: DateTime<Utc>) -> Result<Option<Watermark>, PlasticError>;

    /// True if any mutation of one of `edge_types` occurred after `watermark`.
    /// An empty slice means "any edge type".
    async fn changes_since(
        &self,
        watermark: &Watermark,
        edge_types: &[EdgeType],
    ) -> Result<bool, PlasticError>;

    async fn record_change(&self, edge_type: EdgeType, key: &str) -> Result<Watermark, PlasticError>;

    async fn prune(&self, before: DateTime<Utc>) -> Result<u64, PlasticError>;
}

/// In-memory change journal, used by `InMemoryHypergraphStore` and tests.
#[derive(Debug, Default)]
pub struct InMemoryChangeJournal {
    state: std::sync::RwLock<JournalState>,
}

#[derive(Debug, Default)]
struct JournalState {
    sequence: i64,
    log: Vec<ChangeEntry>,
}

#[derive(Debug, Clone)]
struct ChangeEntry {
    sequence: i64,
    timestamp: DateTime<Utc>,
    edge_type: EdgeType,
}

impl InMemoryChangeJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChangeJournal for InMemoryChangeJournal {
    async fn current_watermark(&self) -> Result<Watermark, PlasticError> {
        let state = self.state.read().unwrap();
        Ok(Watermark::new(state.sequence))
    }

    async fn watermark_at(&self, at: DateTime<Utc>) -> Result<Option<Watermark>, PlasticError> {
        let state = self.state.read().unwrap();
        let sequence = state
            .log
            .iter()
            .rev()
            .find(|e| e.timestamp <= at)
            .map(|e| e.sequence)
            .unwrap_or(0);
        Ok(Some(Watermark::with_timestamp(sequence, at)))
    }

    async fn changes_since(
        &self,
        watermark: &Watermark,
        edge_types: &[EdgeType],
    ) -> Result<bool, PlasticError> {
        let state = self.state.read().unwrap();
        Ok(state.log.iter().any(|e| {
            e.sequence > watermark.sequence && (edge_types.is_empty() || edge_types.contains(&e.edge_type))
        }))
    }

    async fn record_change(&self, edge_type: EdgeType, _key: &str) -> Result<Watermark, PlasticError> {
        let mut state = self.state.write().unwrap();
        state.sequence += 1;
        let entry = ChangeEntry {
            sequence: state.sequence,
            timestamp: Utc::now(),
            edge_type,
        };
        state.log.push(entry);
        Ok(Watermark::new(state.sequence))
    }

    async fn prune(&self, before: DateTime<Utc>) -> Result<u64, PlasticError> {
        let mut state = self.state.write().unwrap();
        let before_len = state.log.len();
        state.log.retain(|e| e.timestamp >= before);
        Ok((before_len - state.log.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watermark_ordering() {
        let w1 = Watermark::new(1);
        let w2 = Watermark::new(2);
        assert!(w2.is_newer_than(&w1));
        assert!(!w1.is_newer_than(&w2));
        assert!(w2.is_at_least(&w1));
        assert!(!w1.is_at_least(&w2));
    }

    #[test]
    fn watermark_gap_is_symmetric() {
        let w1 = Watermark::new(10);
        let w2 = Watermark::new(15);
        assert_eq!(w1.gap(&w2), 5);
        assert_eq!(w2.gap(&w1), 5);
    }

    #[tokio::test]
    async fn records_changes_and_detects_them() {
        let journal = InMemoryChangeJournal::new();
        let w0 = journal.current_watermark().await.unwrap();
        assert_eq!(w0.sequence, 0);

        let w1 = journal.record_change(EdgeType::Bcp, "acme|houston|hdpe").await.unwrap();
        assert_eq!(w1.sequence, 1);

        assert!(journal.changes_since(&w0, &[]).await.unwrap());
        assert!(!journal.changes_since(&w1, &[]).await.unwrap());
    }

    #[tokio::test]
    async fn filters_changes_by_edge_type() {
        let journal = InMemoryChangeJournal::new();
        let w0 = journal.current_watermark().await.unwrap();
        journal.record_change(EdgeType::Bcp, "k").await.unwrap();

        assert!(journal.changes_since(&w0, &[EdgeType::Bcp]).await.unwrap());
        assert!(!journal
            .changes_since(&w0, &[EdgeType::Transaction])
            .await
            .unwrap());
    }
}
