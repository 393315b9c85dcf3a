//! Hot/cold dual-representation hypergraph store (spec §3: "reads try hot
//! cache first, fall back to cold storage").
//!
//! `HybridHypergraphStore` pairs the LMDB-backed read-through cache with a
//! `ColdHypergraphStorage` backend, implemented concretely by `plasticos-pg`
//! against Postgres JSONB + pgvector. Writes go straight to cold storage —
//! it is the system of record — then populate the hot cache and record a
//! change-journal entry so other readers can detect staleness.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use plasticos_core::{EdgeType, Effect, ErrorEffect, GraphMatch, GraphPattern, Hyperedge, PlasticError, StorageError, WriteReceipt};

use crate::cache::{CacheBackend, CacheConfig, ChangeJournal, Freshness, ReadThroughCache, StorageFetcher};
use crate::{HypergraphStore, StorageStatistics};

/// Cold-storage half of the hybrid store: the system of record. Implemented
/// concretely by `plasticos-pg` against Postgres JSONB + pgvector; an
/// in-memory or test double may implement it directly.
#[async_trait]
pub trait ColdHypergraphStorage: Send + Sync {
    async fn write_hyperedge(&self, hyperedge: Hyperedge) -> Result<WriteReceipt, ColdStorageError>;

    async fn read_hyperedge(&self, edge_type: EdgeType, key: &str) -> Result<Option<Hyperedge>, ColdStorageError>;

    async fn top_k_by_vector(
        &self,
        edge_type: EdgeType,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<(Hyperedge, f32)>, ColdStorageError>;

    async fn query_graph_pattern(&self, pattern: &GraphPattern) -> Result<Vec<GraphMatch>, ColdStorageError>;

    async fn list_by_type(&self, edge_type: EdgeType, limit: usize) -> Result<Vec<Hyperedge>, ColdStorageError>;

    async fn statistics(&self) -> Result<StorageStatistics, ColdStorageError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ColdStorageError {
    #[error("cold storage query failed: {0}")]
    Query(String),

    #[error("cold storage write failed for {edge_type}/{key}: {reason}")]
    Write {
        edge_type: EdgeType,
        key: String,
        reason: String,
    },

    #[error("cold storage connection unavailable: {0}")]
    Unavailable(String),
}

impl From<ColdStorageError> for PlasticError {
    fn from(e: ColdStorageError) -> Self {
        match e {
            ColdStorageError::Write { edge_type, key, reason } => {
                StorageError::WriteFailed { edge_type, key, reason }.into()
            }
            ColdStorageError::Query(reason) | ColdStorageError::Unavailable(reason) => {
                StorageError::Unavailable { reason }.into()
            }
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HybridStoreError {
    #[error(transparent)]
    Cold(#[from] ColdStorageError),

    #[error(transparent)]
    Core(#[from] PlasticError),
}

impl From<HybridStoreError> for PlasticError {
    fn from(e: HybridStoreError) -> Self {
        match e {
            HybridStoreError::Cold(c) => c.into(),
            HybridStoreError::Core(c) => c,
        }
    }
}

/// Adapts a `ColdHypergraphStorage` backend to the cache layer's
/// `StorageFetcher<Hyperedge>` trait, so `ReadThroughCache` can fall back to
/// it on a miss or staleness failure.
struct ColdStorageFetcher<S> {
    cold: Arc<S>,
}

#[async_trait]
impl<S: ColdHypergraphStorage> StorageFetcher<Hyperedge> for ColdStorageFetcher<S> {
    async fn fetch(&self, edge_type: EdgeType, key: &str) -> Result<Option<Hyperedge>, PlasticError> {
        self.cold.read_hyperedge(edge_type, key).await.map_err(Into::into)
    }
}

/// Hot/cold hybrid hypergraph store: an LMDB hot cache in front of a
/// `ColdHypergraphStorage` backend. Vector search and graph-pattern
/// projections are answered by cold storage directly — the hot cache only
/// accelerates point reads by `(edge_type, key)`.
pub struct HybridHypergraphStore<C, J, S>
where
    C: CacheBackend,
    J: ChangeJournal,
    S: ColdHypergraphStorage,
{
    hot: ReadThroughCache<C, J>,
    journal: Arc<J>,
    cold: Arc<S>,
    fetcher: ColdStorageFetcher<S>,
    read_freshness: Freshness,
}

impl<C, J, S> HybridHypergraphStore<C, J, S>
where
    C: CacheBackend,
    J: ChangeJournal,
    S: ColdHypergraphStorage,
{
    pub fn new(cache: Arc<C>, journal: Arc<J>, cold: Arc<S>) -> Self {
        Self::with_config(cache, journal, cold, CacheConfig::default())
    }

    pub fn with_config(cache: Arc<C>, journal: Arc<J>, cold: Arc<S>, config: CacheConfig) -> Self {
        let hot = ReadThroughCache::new(Arc::clone(&cache), Arc::clone(&journal), config);
        let fetcher = ColdStorageFetcher { cold: Arc::clone(&cold) };
        Self {
            hot,
            journal,
            cold,
            fetcher,
            read_freshness: Freshness::BestEffort {
                max_staleness: Duration::from_secs(60),
            },
        }
    }

    /// Override the freshness contract used for `read_hyperedge`. Callers
    /// that need read-after-write consistency (e.g. intake confirmation)
    /// should construct a store with `Freshness::Consistent`.
    pub fn with_read_freshness(mut self, freshness: Freshness) -> Self {
        self.read_freshness = freshness;
        self
    }
}

#[async_trait]
impl<C, J, S> HypergraphStore for HybridHypergraphStore<C, J, S>
where
    C: CacheBackend,
    J: ChangeJournal,
    S: ColdHypergraphStorage,
{
    async fn write_hyperedge(&self, hyperedge: Hyperedge) -> Effect<WriteReceipt> {
        let edge_type = hyperedge.edge_type;
        let key = hyperedge.key.clone();

        let receipt = match self.cold.write_hyperedge(hyperedge.clone()).await {
            Ok(r) => r,
            Err(e) => return Effect::Err(ErrorEffect::from(PlasticError::from(e))),
        };

        if let Err(e) = self.hot.put(&hyperedge).await {
            tracing::warn!(edge_type = ?edge_type, key = %key, error = %e, "hot cache population failed after cold write");
        }
        if let Err(e) = self.journal.record_change(edge_type, &key).await {
            tracing::warn!(edge_type = ?edge_type, key = %key, error = %e, "change journal record failed after cold write");
        }

        Effect::Ok(receipt)
    }

    async fn read_hyperedge(&self, edge_type: EdgeType, key: &str) -> Effect<Option<Hyperedge>> {
        let result = self
            .hot
            .get::<Hyperedge, _>(edge_type, key, self.read_freshness.clone(), &self.fetcher)
            .await;

        match result {
            Ok(Some(cache_read)) => Effect::Ok(Some(cache_read.into_value())),
            Ok(None) => Effect::Ok(None),
            Err(e) => Effect::Err(ErrorEffect::from(e)),
        }
    }

    async fn top_k_by_vector(&self, edge_type: EdgeType, query_vector: &[f32], k: usize) -> Effect<Vec<(Hyperedge, f32)>> {
        match self.cold.top_k_by_vector(edge_type, query_vector, k).await {
            Ok(results) => Effect::Ok(results),
            Err(e) => Effect::Err(ErrorEffect::from(PlasticError::from(e))),
        }
    }

    async fn query_graph_pattern(&self, pattern: &GraphPattern) -> Effect<Vec<GraphMatch>> {
        match self.cold.query_graph_pattern(pattern).await {
            Ok(matches) => Effect::Ok(matches),
            Err(e) => Effect::Err(ErrorEffect::from(PlasticError::from(e))),
        }
    }

    async fn list_by_type(&self, edge_type: EdgeType, limit: usize) -> Effect<Vec<Hyperedge>> {
        match self.cold.list_by_type(edge_type, limit).await {
            Ok(edges) => Effect::Ok(edges),
            Err(e) => Effect::Err(ErrorEffect::from(PlasticError::from(e))),
        }
    }

    async fn statistics(&self) -> Effect<StorageStatistics> {
        match self.cold.statistics().await {
            Ok(stats) => Effect::Ok(stats),
            Err(e) => Effect::Err(ErrorEffect::from(PlasticError::from(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryChangeJournal;
    use plasticos_core::EdgeType;
    use std::collections::HashMap;
    use std::sync::RwLock;
    use std::time::Duration as StdDuration;

    #[derive(Default)]
    struct InMemoryCold {
        edges: RwLock<HashMap<(EdgeType, String), Hyperedge>>,
    }

    #[async_trait]
    impl ColdHypergraphStorage for InMemoryCold {
        async fn write_hyperedge(&self, hyperedge: Hyperedge) -> Result<WriteReceipt, ColdStorageError> {
            let receipt = WriteReceipt {
                edge_type: hyperedge.edge_type,
                key: hyperedge.key.clone(),
                version: hyperedge.version,
                embedding_pending: hyperedge.embedding.is_none(),
            };
            self.edges
                .write()
                .unwrap()
                .insert((hyperedge.edge_type, hyperedge.key.clone()), hyperedge);
            Ok(receipt)
        }

        async fn read_hyperedge(&self, edge_type: EdgeType, key: &str) -> Result<Option<Hyperedge>, ColdStorageError> {
            Ok(self.edges.read().unwrap().get(&(edge_type, key.to_string())).cloned())
        }

        async fn top_k_by_vector(
            &self,
            _edge_type: EdgeType,
            _query_vector: &[f32],
            _k: usize,
        ) -> Result<Vec<(Hyperedge, f32)>, ColdStorageError> {
            Ok(Vec::new())
        }

        async fn query_graph_pattern(&self, _pattern: &GraphPattern) -> Result<Vec<GraphMatch>, ColdStorageError> {
            Ok(Vec::new())
        }

        async fn list_by_type(&self, edge_type: EdgeType, limit: usize) -> Result<Vec<Hyperedge>, ColdStorageError> {
            Ok(self
                .edges
                .read()
                .unwrap()
                .values()
                .filter(|e| e.edge_type == edge_type)
                .take(limit)
                .cloned()
                .collect())
        }

        async fn statistics(&self) -> Result<StorageStatistics, ColdStorageError> {
            Ok(StorageStatistics::default())
        }
    }

    fn test_hyperedge(key: &str) -> Hyperedge {
        Hyperedge {
            edge_type: EdgeType::Bcp,
            key: key.to_string(),
            payload: serde_json::json!({"company_name": "Acme"}),
            embedding: None,
            version: 1,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn build_store(
        dir: &tempfile::TempDir,
    ) -> HybridHypergraphStore<crate::cache::LmdbCacheBackend, InMemoryChangeJournal, InMemoryCold> {
        let cache = Arc::new(crate::cache::LmdbCacheBackend::new(dir.path(), 16).unwrap());
        let journal = Arc::new(InMemoryChangeJournal::new());
        let cold = Arc::new(InMemoryCold::default());
        HybridHypergraphStore::new(cache, journal, cold)
    }

    #[tokio::test]
    async fn write_then_read_round_trips_through_cold_storage() {
        let dir = tempfile::tempdir().unwrap();
        let store = build_store(&dir);

        let edge = test_hyperedge("acme|houston|hdpe");
        let receipt = store.write_hyperedge(edge.clone()).await;
        assert!(receipt.is_ok());

        let read = store.read_hyperedge(EdgeType::Bcp, "acme|houston|hdpe").await;
        match read {
            Effect::Ok(Some(found)) => assert_eq!(found.key, "acme|houston|hdpe"),
            other => panic!("expected cached hyperedge, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_miss_returns_none_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = build_store(&dir);

        let read = store.read_hyperedge(EdgeType::Bcp, "missing").await;
        assert!(matches!(read, Effect::Ok(None)));
    }

    #[tokio::test]
    async fn consistent_freshness_revalidates_against_journal() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(crate::cache::LmdbCacheBackend::new(dir.path(), 16).unwrap());
        let journal = Arc::new(InMemoryChangeJournal::new());
        let cold = Arc::new(InMemoryCold::default());
        let store = HybridHypergraphStore::new(cache, journal, cold).with_read_freshness(Freshness::Consistent);

        let edge = test_hyperedge("acme|houston|hdpe");
        store.write_hyperedge(edge).await;

        let read = store.read_hyperedge(EdgeType::Bcp, "acme|houston|hdpe").await;
        assert!(matches!(read, Effect::Ok(Some(_))));
    }

    #[tokio::test]
    async fn best_effort_within_window_serves_from_hot_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(crate::cache::LmdbCacheBackend::new(dir.path(), 16).unwrap());
        let journal = Arc::new(InMemoryChangeJournal::new());
        let cold = Arc::new(InMemoryCold::default());
        let store = HybridHypergraphStore::new(cache, journal, cold).with_read_freshness(Freshness::BestEffort {
            max_staleness: StdDuration::from_secs(3600),
        });

        let edge = test_hyperedge("acme|houston|hdpe");
        store.write_hyperedge(edge).await;

        let first = store.read_hyperedge(EdgeType::Bcp, "acme|houston|hdpe").await;
        let second = store.read_hyperedge(EdgeType::Bcp, "acme|houston|hdpe").await;
        assert!(matches!(first, Effect::Ok(Some(_))));
        assert!(matches!(second, Effect::Ok(Some(_))));
    }
}
