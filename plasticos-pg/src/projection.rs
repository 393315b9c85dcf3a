//! Async graph-projection worker and reconciliation job (spec §4.2:
//! "Graph projection is asynchronous: a write emits an event consumed by a
//! projection worker; the projection is idempotent (MERGE semantics)"; spec
//! invariant 5: "a reconciliation invariant holds ... within a bounded lag").
//!
//! Uses an exponential-backoff `RetryConfig` over a durable
//! `projection_queue` table so a worker restart never drops a pending
//! projection.

use std::sync::Arc;
use std::time::Duration;

use deadpool_postgres::Pool;
use plasticos_core::{EdgeType, PlasticError};
use tokio::time::sleep;

use crate::graph::GraphProjector;

/// Exponential backoff policy for a failed projection attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

impl RetryConfig {
    fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.saturating_mul(2u32.saturating_pow(attempt.min(16)));
        scaled.min(self.max_delay)
    }
}

struct QueuedProjection {
    id: i64,
    edge_type: EdgeType,
    key: String,
    attempts: i32,
}

fn edge_type_from_i16(value: i16) -> Option<EdgeType> {
    match value {
        0 => Some(EdgeType::Bcp),
        1 => Some(EdgeType::SupplierOffering),
        2 => Some(EdgeType::Transaction),
        _ => None,
    }
}

fn edge_type_to_i16(edge_type: EdgeType) -> i16 {
    match edge_type {
        EdgeType::Bcp => 0,
        EdgeType::SupplierOffering => 1,
        EdgeType::Transaction => 2,
    }
}

/// Drains `projection_queue`, projecting each pending hyperedge onto the
/// property graph. Runs as a long-lived background task; never blocks the
/// JSONB write path (spec §4.2 failure semantics).
pub struct ProjectionWorker {
    pool: Pool,
    graph: Arc<GraphProjector>,
    retry: RetryConfig,
    poll_interval: Duration,
}

impl ProjectionWorker {
    pub fn new(pool: Pool, graph: Arc<GraphProjector>) -> Self {
        Self {
            pool,
            graph,
            retry: RetryConfig::default(),
            poll_interval: Duration::from_millis(500),
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Runs forever, draining the queue on `poll_interval`. Intended to be
    /// spawned as a `tokio::task`.
    pub async fn run(self) {
        loop {
            match self.drain_once().await {
                Ok(0) => sleep(self.poll_interval).await,
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "projection worker poll failed");
                    sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// Processes pending queue entries once; returns the number processed.
    /// Exposed separately from `run` so tests and the reconciliation job can
    /// drive it deterministically.
    pub async fn drain_once(&self) -> Result<usize, PlasticError> {
        let pending = self.fetch_pending(100).await?;
        let count = pending.len();

        for item in pending {
            self.process_one(item).await;
        }

        Ok(count)
    }

    async fn fetch_pending(&self, limit: i64) -> Result<Vec<QueuedProjection>, PlasticError> {
        let conn = self
            .pool
            .get()
            .await
            .map_err(|e| plasticos_core::StorageError::Unavailable { reason: e.to_string() })?;

        let rows = conn
            .query(
                "SELECT id, edge_type, key, attempts FROM projection_queue \
                 WHERE attempts < $1 ORDER BY enqueued_at ASC LIMIT $2",
                &[&(self.retry.max_attempts as i32), &limit],
            )
            .await
            .map_err(|e| plasticos_core::StorageError::Unavailable { reason: e.to_string() })?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let edge_type = edge_type_from_i16(row.get("edge_type"))?;
                Some(QueuedProjection {
                    id: row.get("id"),
                    edge_type,
                    key: row.get("key"),
                    attempts: row.get("attempts"),
                })
            })
            .collect())
    }

    async fn process_one(&self, item: QueuedProjection) {
        let Ok(conn) = self.pool.get().await else { return };

        let hyperedge_row = conn
            .query_opt(
                "SELECT edge_type, key, payload_jsonb, version, created_at, updated_at \
                 FROM hyperedges WHERE edge_type = $1 AND key = $2",
                &[&edge_type_to_i16(item.edge_type), &item.key],
            )
            .await
            .ok()
            .flatten();

        let Some(row) = hyperedge_row else {
            // Hyperedge no longer exists (should not happen — writes are
            // never deleted); drop the stale queue entry.
            let _ = conn.execute("DELETE FROM projection_queue WHERE id = $1", &[&item.id]).await;
            return;
        };

        let hyperedge = plasticos_core::Hyperedge {
            edge_type: item.edge_type,
            key: row.get("key"),
            payload: row.get("payload_jsonb"),
            embedding: None,
            version: row.get::<_, i32>("version") as u32,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        };

        match self.graph.project(&hyperedge).await {
            Ok(()) => {
                let _ = conn.execute("DELETE FROM projection_queue WHERE id = $1", &[&item.id]).await;
            }
            Err(e) => {
                tracing::warn!(
                    edge_type = ?item.edge_type,
                    key = %item.key,
                    attempt = item.attempts,
                    error = %e,
                    "graph projection attempt failed"
                );
                let _ = conn
                    .execute(
                        "UPDATE projection_queue SET attempts = attempts + 1, last_error = $2 WHERE id = $1",
                        &[&item.id, &e.to_string()],
                    )
                    .await;
                sleep(self.retry.delay_for(item.attempts as u32)).await;
            }
        }
    }

    /// Reconciliation pass (invariant 5): scans recent BCP hyperedges for a
    /// missing `Hyperedge_BCP` projection and re-enqueues them. Runs on
    /// `PlasticConfig::reconciliation_interval_seconds`.
    pub async fn reconcile(&self) -> Result<usize, PlasticError> {
        let conn = self
            .pool
            .get()
            .await
            .map_err(|e| plasticos_core::StorageError::Unavailable { reason: e.to_string() })?;

        let rows = conn
            .query(
                "SELECT key FROM hyperedges WHERE edge_type = 0 ORDER BY updated_at DESC LIMIT 1000",
                &[],
            )
            .await
            .map_err(|e| plasticos_core::StorageError::Unavailable { reason: e.to_string() })?;
        let keys: Vec<String> = rows.iter().map(|r| r.get("key")).collect();

        let missing = self
            .graph
            .missing_bcp_projections(&keys)
            .await
            .map_err(|e| plasticos_core::ProjectionError::ReconciliationFailed { reason: e.to_string() })?;

        for key in &missing {
            let _ = conn
                .execute(
                    "INSERT INTO projection_queue (edge_type, key) VALUES (0, $1)",
                    &[key],
                )
                .await;
        }

        Ok(missing.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let retry = RetryConfig {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            max_attempts: 5,
        };
        assert_eq!(retry.delay_for(0), Duration::from_millis(100));
        assert_eq!(retry.delay_for(1), Duration::from_millis(200));
        assert_eq!(retry.delay_for(10), Duration::from_secs(1));
    }
}
