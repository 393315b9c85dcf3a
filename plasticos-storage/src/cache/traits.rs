//! Cache backend traits and the cacheable-entity marker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plasticos_core::{EdgeType, Hyperedge, PlasticError};
use serde::{de::DeserializeOwned, Serialize};

/// Marker trait for types that can live in the hot cache. `Hyperedge` is the
/// only implementor today; the trait exists so the cache layer isn't wired
/// directly to that one type.
pub trait CacheableEntity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn edge_type(&self) -> EdgeType;
    fn key(&self) -> &str;
}

impl CacheableEntity for Hyperedge {
    fn edge_type(&self) -> EdgeType {
        self.edge_type
    }

    fn key(&self) -> &str {
        &self.key
    }
}

/// Cache backend trait for pluggable implementations (LMDB, in-memory, ...).
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a value from the cache. Returns the cached value and when it was
    /// cached, or `None` if not present.
    async fn get<T: CacheableEntity>(
        &self,
        edge_type: EdgeType,
        key: &str,
    ) -> Result<Option<(T, DateTime<Utc>)>, PlasticError>;

    /// Put a value into the cache, alongside the time it was cached.
    async fn put<T: CacheableEntity>(&self, entity: &T, cached_at: DateTime<Utc>) -> Result<(), PlasticError>;

    /// Remove a value from the cache.
    async fn delete(&self, edge_type: EdgeType, key: &str) -> Result<(), PlasticError>;

    /// Invalidate every cached entry of a given edge type.
    async fn invalidate_edge_type(&self, edge_type: EdgeType) -> Result<u64, PlasticError>;

    async fn stats(&self) -> Result<CacheStats, PlasticError>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: u64,
    pub memory_bytes: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_of_empty_stats_is_zero() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_is_hits_over_total() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);
    }

    #[test]
    fn hyperedge_is_cacheable_by_identity() {
        let edge = Hyperedge {
            edge_type: EdgeType::Bcp,
            key: "acme|houston|hdpe".into(),
            payload: serde_json::json!({}),
            embedding: None,
            version: 1,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        assert_eq!(edge.edge_type(), EdgeType::Bcp);
        assert_eq!(edge.key(), "acme|houston|hdpe");
    }
}
