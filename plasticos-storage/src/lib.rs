//! Hypergraph Store (spec §3): the read/write contract for the canonical
//! hyperedge storage, plus an in-memory reference implementation and a
//! hybrid LMDB-hot/Postgres-cold implementation.
//!
//! Hyperedges have a dual representation — JSONB+vector for full-payload and
//! semantic-similarity reads, property graph for structural "buyers with BCPs
//! for polymer X in region Y" queries. `HypergraphStore` is the interface
//! every other crate programs against; `plasticos-pg` supplies the durable
//! Postgres-backed `ColdHypergraphStorage` half of the hybrid implementation.

pub mod cache;
pub mod hybrid_store;
pub mod in_memory;

pub use cache::{CacheConfig, CacheRead, Freshness, ReadThroughCache, Watermark};
pub use hybrid_store::{ColdHypergraphStorage, ColdStorageError, HybridHypergraphStore, HybridStoreError};
pub use in_memory::{HyperedgeLogEntry, InMemoryHypergraphStore};

use async_trait::async_trait;
use plasticos_core::{EdgeType, Effect, GraphMatch, GraphPattern, Hyperedge, WriteReceipt};

/// Contract implemented by every hyperedge storage backend.
///
/// Every method returns an [`Effect<T>`](plasticos_core::Effect) rather than
/// a bare `Result`: callers at crate boundaries (Research DAG stages, the
/// Matching Engine, the API layer) need to distinguish a retryable
/// operational failure (pool exhaustion, connection loss) from a domain
/// rejection (malformed key, dimension mismatch) without downcasting a
/// nested error type.
#[async_trait]
pub trait HypergraphStore: Send + Sync {
    /// Write (insert or update) a hyperedge. Callers are expected to have
    /// already run it through `plasticos_schema::validate`/`to_hyperedge`;
    /// this layer is storage, not validation.
    async fn write_hyperedge(&self, hyperedge: Hyperedge) -> Effect<WriteReceipt>;

    /// Look up a hyperedge by its `(edge_type, key)` identity.
    async fn read_hyperedge(&self, edge_type: EdgeType, key: &str) -> Effect<Option<Hyperedge>>;

    /// Semantic search: the `k` hyperedges of `edge_type` whose embedding is
    /// closest to `query_vector` by cosine similarity, paired with their
    /// score, descending.
    async fn top_k_by_vector(
        &self,
        edge_type: EdgeType,
        query_vector: &[f32],
        k: usize,
    ) -> Effect<Vec<(Hyperedge, f32)>>;

    /// Structural query over the property graph projection (spec §4.2), e.g.
    /// "buyers with BCPs for polymer X in region Y with certifications Z".
    async fn query_graph_pattern(&self, pattern: &GraphPattern) -> Effect<Vec<GraphMatch>>;

    /// All hyperedges of a given type, most recently updated first.
    async fn list_by_type(&self, edge_type: EdgeType, limit: usize) -> Effect<Vec<Hyperedge>>;

    /// Aggregate counts, for health/diagnostics endpoints.
    async fn statistics(&self) -> Effect<StorageStatistics>;
}

/// Storage-wide counts, returned by `HypergraphStore::statistics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStatistics {
    pub bcp_count: u64,
    pub supplier_offering_count: u64,
    pub transaction_count: u64,
    pub embedding_pending_count: u64,
}
