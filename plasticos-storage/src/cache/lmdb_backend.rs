//! LMDB-backed cache implementation: the hot path of `HybridHypergraphStore`.
//!
//! Uses `heed` (Rust bindings for LMDB) for a memory-mapped key-value store
//! of recently-read/written hyperedges.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use plasticos_core::{EdgeType, PlasticError, StorageError};

use super::traits::{CacheBackend, CacheStats, CacheableEntity};

#[derive(Debug, thiserror::Error)]
pub enum LmdbCacheError {
    #[error("failed to open LMDB environment: {0}")]
    EnvOpen(String),
    #[error("failed to open database: {0}")]
    DbOpen(String),
    #[error("transaction error: {0}")]
    Transaction(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("deserialization error: {0}")]
    Deserialization(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbCacheError> for PlasticError {
    fn from(e: LmdbCacheError) -> Self {
        StorageError::Unavailable { reason: e.to_string() }.into()
    }
}

#[derive(Debug, Default)]
struct EdgeTypeStatsInner {
    hits: u64,
    misses: u64,
    entries: u64,
    size_bytes: u64,
}

/// LMDB-backed cache keyed by `(edge_type, key)`.
pub struct LmdbCacheBackend {
    env: Env,
    db: Database<Bytes, Bytes>,
    edge_type_stats: Arc<RwLock<HashMap<EdgeType, EdgeTypeStatsInner>>>,
    global_stats: Arc<RwLock<CacheStats>>,
}

impl LmdbCacheBackend {
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbCacheError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbCacheError::EnvOpen(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbCacheError::DbOpen(e.to_string()))?;
        wtxn.commit().map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        Ok(Self {
            env,
            db,
            edge_type_stats: Arc::new(RwLock::new(HashMap::new())),
            global_stats: Arc::new(RwLock::new(CacheStats::default())),
        })
    }

    fn record_hit(&self, edge_type: EdgeType) {
        if let Ok(mut stats) = self.edge_type_stats.write() {
            stats.entry(edge_type).or_default().hits += 1;
        }
        if let Ok(mut stats) = self.global_stats.write() {
            stats.hits += 1;
        }
    }

    fn record_miss(&self, edge_type: EdgeType) {
        if let Ok(mut stats) = self.edge_type_stats.write() {
            stats.entry(edge_type).or_default().misses += 1;
        }
        if let Ok(mut stats) = self.global_stats.write() {
            stats.misses += 1;
        }
    }

    fn update_entry_stats(&self, edge_type: EdgeType, size_bytes: usize, is_new: bool) {
        if let Ok(mut stats) = self.edge_type_stats.write() {
            let entry = stats.entry(edge_type).or_default();
            if is_new {
                entry.entries += 1;
            }
            entry.size_bytes += size_bytes as u64;
        }
        if is_new {
            if let Ok(mut stats) = self.global_stats.write() {
                stats.entry_count += 1;
            }
        }
    }

    fn encode_key(edge_type: EdgeType, key: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + key.len());
        bytes.push(edge_type_to_byte(edge_type));
        bytes.extend_from_slice(key.as_bytes());
        bytes
    }
}

fn edge_type_to_byte(edge_type: EdgeType) -> u8 {
    match edge_type {
        EdgeType::Bcp => 0,
        EdgeType::SupplierOffering => 1,
        EdgeType::Transaction => 2,
    }
}

#[async_trait]
impl CacheBackend for LmdbCacheBackend {
    async fn get<T: CacheableEntity>(
        &self,
        edge_type: EdgeType,
        key: &str,
    ) -> Result<Option<(T, DateTime<Utc>)>, PlasticError> {
        let encoded_key = Self::encode_key(edge_type, key);
        let rtxn = self.env.read_txn().map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        match self.db.get(&rtxn, &encoded_key) {
            Ok(Some(bytes)) => {
                self.record_hit(edge_type);
                if bytes.len() < 8 {
                    return Ok(None);
                }
                let timestamp_bytes: [u8; 8] = bytes[0..8]
                    .try_into()
                    .map_err(|_| LmdbCacheError::Deserialization("invalid timestamp".into()))?;
                let timestamp_millis = i64::from_le_bytes(timestamp_bytes);
                let cached_at = DateTime::from_timestamp_millis(timestamp_millis).unwrap_or_else(Utc::now);
                let value: T = serde_json::from_slice(&bytes[8..])
                    .map_err(|e| LmdbCacheError::Deserialization(e.to_string()))?;
                Ok(Some((value, cached_at)))
            }
            Ok(None) => {
                self.record_miss(edge_type);
                Ok(None)
            }
            Err(e) => {
                self.record_miss(edge_type);
                Err(LmdbCacheError::Transaction(e.to_string()).into())
            }
        }
    }

    async fn put<T: CacheableEntity>(&self, entity: &T, cached_at: DateTime<Utc>) -> Result<(), PlasticError> {
        let encoded_key = Self::encode_key(entity.edge_type(), entity.key());

        let timestamp_bytes = cached_at.timestamp_millis().to_le_bytes();
        let value_bytes =
            serde_json::to_vec(entity).map_err(|e| LmdbCacheError::Serialization(e.to_string()))?;

        let mut full_bytes = Vec::with_capacity(8 + value_bytes.len());
        full_bytes.extend_from_slice(&timestamp_bytes);
        full_bytes.extend_from_slice(&value_bytes);

        let is_new = {
            let rtxn = self.env.read_txn().map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;
            self.db.get(&rtxn, &encoded_key).ok().flatten().is_none()
        };

        let mut wtxn = self.env.write_txn().map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;
        self.db
            .put(&mut wtxn, &encoded_key, &full_bytes)
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;
        wtxn.commit().map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        self.update_entry_stats(entity.edge_type(), full_bytes.len(), is_new);
        Ok(())
    }

    async fn delete(&self, edge_type: EdgeType, key: &str) -> Result<(), PlasticError> {
        let encoded_key = Self::encode_key(edge_type, key);
        let mut wtxn = self.env.write_txn().map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;
        let deleted = self
            .db
            .delete(&mut wtxn, &encoded_key)
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;
        wtxn.commit().map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        if deleted {
            if let Ok(mut stats) = self.edge_type_stats.write() {
                if let Some(entry) = stats.get_mut(&edge_type) {
                    entry.entries = entry.entries.saturating_sub(1);
                }
            }
            if let Ok(mut stats) = self.global_stats.write() {
                stats.entry_count = stats.entry_count.saturating_sub(1);
            }
        }
        Ok(())
    }

    async fn invalidate_edge_type(&self, edge_type: EdgeType) -> Result<u64, PlasticError> {
        let prefix = [edge_type_to_byte(edge_type)];
        let keys = {
            let rtxn = self.env.read_txn().map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;
            let iter = self.db.iter(&rtxn).map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;
            let mut keys = Vec::new();
            for result in iter.flatten() {
                let (k, _) = result;
                if k.first() == prefix.first() {
                    keys.push(k.to_vec());
                }
            }
            keys
        };

        let mut wtxn = self.env.write_txn().map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;
        let mut count = 0u64;
        for key in &keys {
            if self
                .db
                .delete(&mut wtxn, key.as_slice())
                .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?
            {
                count += 1;
            }
        }
        wtxn.commit().map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        if let Ok(mut stats) = self.edge_type_stats.write() {
            stats.remove(&edge_type);
        }
        if let Ok(mut stats) = self.global_stats.write() {
            stats.entry_count = stats.entry_count.saturating_sub(count);
        }
        Ok(count)
    }

    async fn stats(&self) -> Result<CacheStats, PlasticError> {
        Ok(self.global_stats.read().unwrap().clone())
    }
}
