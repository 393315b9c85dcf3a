//! Read-through cache with correctness contracts.
//!
//! Routes reads based on the caller's freshness requirement and uses the
//! change journal to decide whether a cached hyperedge needs revalidating.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use plasticos_core::{EdgeType, PlasticError};

use super::freshness::{CacheRead, Freshness};
use super::traits::{CacheBackend, CacheableEntity};
use super::watermark::{ChangeJournal, Watermark};

/// Configuration for the read-through cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_max_staleness: Duration,
    pub journal_poll_interval: Duration,
    pub entry_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_max_staleness: Duration::from_secs(60),
            journal_poll_interval: Duration::from_millis(100),
            entry_ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_staleness(mut self, duration: Duration) -> Self {
        self.default_max_staleness = duration;
        self
    }

    pub fn with_poll_interval(mut self, duration: Duration) -> Self {
        self.journal_poll_interval = duration;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.entry_ttl = ttl;
        self
    }
}

/// Fetches a hyperedge from the cold store on cache miss. Implemented by
/// `ColdHypergraphStorage` adapters in `plasticos-pg`.
#[async_trait]
pub trait StorageFetcher<T: CacheableEntity>: Send + Sync {
    async fn fetch(&self, edge_type: EdgeType, key: &str) -> Result<Option<T>, PlasticError>;
}

/// Read-through cache with correctness contracts: callers state their
/// freshness tolerance and get back staleness metadata with every read.
pub struct ReadThroughCache<C, J>
where
    C: CacheBackend,
    J: ChangeJournal,
{
    cache: Arc<C>,
    journal: Arc<J>,
    config: CacheConfig,
}

impl<C, J> ReadThroughCache<C, J>
where
    C: CacheBackend,
    J: ChangeJournal,
{
    pub fn new(cache: Arc<C>, journal: Arc<J>, config: CacheConfig) -> Self {
        Self { cache, journal, config }
    }

    pub fn with_defaults(cache: Arc<C>, journal: Arc<J>) -> Self {
        Self::new(cache, journal, CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub async fn get<T, S>(
        &self,
        edge_type: EdgeType,
        key: &str,
        freshness: Freshness,
        storage: &S,
    ) -> Result<Option<CacheRead<T>>, PlasticError>
    where
        T: CacheableEntity,
        S: StorageFetcher<T>,
    {
        match freshness {
            Freshness::BestEffort { max_staleness } => {
                self.get_best_effort(edge_type, key, max_staleness, storage).await
            }
            Freshness::Consistent => self.get_consistent(edge_type, key, storage).await,
        }
    }

    async fn get_best_effort<T, S>(
        &self,
        edge_type: EdgeType,
        key: &str,
        max_staleness: Duration,
        storage: &S,
    ) -> Result<Option<CacheRead<T>>, PlasticError>
    where
        T: CacheableEntity,
        S: StorageFetcher<T>,
    {
        if let Some((entity, cached_at)) = self.cache.get::<T>(edge_type, key).await? {
            let staleness = Utc::now()
                .signed_duration_since(cached_at)
                .to_std()
                .unwrap_or(Duration::ZERO);
            if staleness <= max_staleness {
                return Ok(Some(CacheRead::from_cache(entity, cached_at, None)));
            }
        }
        self.fetch_and_cache(edge_type, key, storage).await
    }

    async fn get_consistent<T, S>(
        &self,
        edge_type: EdgeType,
        key: &str,
        storage: &S,
    ) -> Result<Option<CacheRead<T>>, PlasticError>
    where
        T: CacheableEntity,
        S: StorageFetcher<T>,
    {
        let current_watermark = self.journal.current_watermark().await?;
        if let Some((entity, cached_at)) = self.cache.get::<T>(edge_type, key).await? {
            if let Some(cache_watermark) = self.journal.watermark_at(cached_at).await? {
                let has_changes = self
                    .journal
                    .changes_since(&cache_watermark, &[edge_type])
                    .await?;
                if !has_changes {
                    return Ok(Some(CacheRead::from_cache(entity, cached_at, Some(cache_watermark))));
                }
            }
        }
        self.fetch_and_cache_with_watermark(edge_type, key, storage, current_watermark)
            .await
    }

    async fn fetch_and_cache<T, S>(
        &self,
        edge_type: EdgeType,
        key: &str,
        storage: &S,
    ) -> Result<Option<CacheRead<T>>, PlasticError>
    where
        T: CacheableEntity,
        S: StorageFetcher<T>,
    {
        let watermark = self.journal.current_watermark().await?;
        self.fetch_and_cache_with_watermark(edge_type, key, storage, watermark).await
    }

    async fn fetch_and_cache_with_watermark<T, S>(
        &self,
        edge_type: EdgeType,
        key: &str,
        storage: &S,
        watermark: Watermark,
    ) -> Result<Option<CacheRead<T>>, PlasticError>
    where
        T: CacheableEntity,
        S: StorageFetcher<T>,
    {
        if let Some(entity) = storage.fetch(edge_type, key).await? {
            let cached_at = Utc::now();
            self.cache.put(&entity, cached_at).await?;
            Ok(Some(CacheRead::from_storage(entity, Some(watermark))))
        } else {
            Ok(None)
        }
    }

    pub async fn put<T: CacheableEntity>(&self, entity: &T) -> Result<(), PlasticError> {
        self.cache.put(entity, Utc::now()).await
    }

    pub async fn invalidate(&self, edge_type: EdgeType, key: &str) -> Result<(), PlasticError> {
        self.cache.delete(edge_type, key).await
    }

    pub async fn invalidate_edge_type(&self, edge_type: EdgeType) -> Result<u64, PlasticError> {
        self.cache.invalidate_edge_type(edge_type).await
    }
}

impl<C, J> Clone for ReadThroughCache<C, J>
where
    C: CacheBackend,
    J: ChangeJournal,
{
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            journal: Arc::clone(&self.journal),
            config: self.config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::traits::CacheStats;
    use super::super::watermark::InMemoryChangeJournal;
    use chrono::DateTime;
    use plasticos_core::Hyperedge;
    use std::collections::HashMap;
    use std::sync::RwLock;

    #[derive(Default)]
    struct MockCacheBackend {
        stats: RwLock<CacheStats>,
    }

    #[async_trait]
    impl CacheBackend for MockCacheBackend {
        async fn get<T: CacheableEntity>(
            &self,
            _edge_type: EdgeType,
            _key: &str,
        ) -> Result<Option<(T, DateTime<Utc>)>, PlasticError> {
            self.stats.write().unwrap().misses += 1;
            Ok(None)
        }

        async fn put<T: CacheableEntity>(&self, _entity: &T, _cached_at: DateTime<Utc>) -> Result<(), PlasticError> {
            Ok(())
        }

        async fn delete(&self, _edge_type: EdgeType, _key: &str) -> Result<(), PlasticError> {
            Ok(())
        }

        async fn invalidate_edge_type(&self, _edge_type: EdgeType) -> Result<u64, PlasticError> {
            Ok(0)
        }

        async fn stats(&self) -> Result<CacheStats, PlasticError> {
            Ok(self.stats.read().unwrap().clone())
        }
    }

    struct MockStorageFetcher {
        edges: RwLock<HashMap<String, Hyperedge>>,
    }

    impl MockStorageFetcher {
        fn new() -> Self {
            Self {
                edges: RwLock::new(HashMap::new()),
            }
        }

        fn insert(&self, edge: Hyperedge) {
            self.edges.write().unwrap().insert(edge.key.clone(), edge);
        }
    }

    #[async_trait]
    impl StorageFetcher<Hyperedge> for MockStorageFetcher {
        async fn fetch(&self, _edge_type: EdgeType, key: &str) -> Result<Option<Hyperedge>, PlasticError> {
            Ok(self.edges.read().unwrap().get(key).cloned())
        }
    }

    fn test_hyperedge(key: &str) -> Hyperedge {
        Hyperedge {
            edge_type: EdgeType::Bcp,
            key: key.to_string(),
            payload: serde_json::json!({}),
            embedding: None,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn cache_miss_fetches_from_storage() {
        let cache = Arc::new(MockCacheBackend::default());
        let journal = Arc::new(InMemoryChangeJournal::new());
        let read_through = ReadThroughCache::new(cache, journal, CacheConfig::default());

        let storage = MockStorageFetcher::new();
        let edge = test_hyperedge("acme|houston|hdpe");
        storage.insert(edge.clone());

        let result = read_through
            .get::<Hyperedge, _>(
                EdgeType::Bcp,
                "acme|houston|hdpe",
                Freshness::BestEffort {
                    max_staleness: Duration::from_secs(60),
                },
                &storage,
            )
            .await
            .unwrap();

        assert!(result.is_some());
        let cache_read = result.unwrap();
        assert!(cache_read.was_cache_miss());
        assert_eq!(cache_read.into_value().key, "acme|houston|hdpe");
    }

    #[tokio::test]
    async fn not_found_returns_none() {
        let cache = Arc::new(MockCacheBackend::default());
        let journal = Arc::new(InMemoryChangeJournal::new());
        let read_through = ReadThroughCache::new(cache, journal, CacheConfig::default());
        let storage = MockStorageFetcher::new();

        let result = read_through
            .get::<Hyperedge, _>(EdgeType::Bcp, "missing", Freshness::Consistent, &storage)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn config_builder_sets_fields() {
        let config = CacheConfig::new()
            .with_max_staleness(Duration::from_secs(120))
            .with_poll_interval(Duration::from_millis(50))
            .with_ttl(Duration::from_secs(1800));

        assert_eq!(config.default_max_staleness, Duration::from_secs(120));
        assert_eq!(config.journal_poll_interval, Duration::from_millis(50));
        assert_eq!(config.entry_ttl, Duration::from_secs(1800));
    }
}
