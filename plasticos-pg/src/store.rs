//! Concrete `ColdHypergraphStorage` over Postgres JSONB + pgvector, with
//! graph-shaped reads delegated to the property graph (`graph.rs`).
//!
//! A `deadpool_postgres::Pool` wrapped in a small struct exposing typed,
//! parameterized query methods, talking plain SQL since this system has no
//! in-process Postgres extension (see DESIGN.md).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use plasticos_core::{EdgeType, EmbeddingVector, GraphMatch, GraphPattern, Hyperedge, WriteReceipt};
use plasticos_storage::hybrid_store::{ColdHypergraphStorage, ColdStorageError};
use plasticos_storage::StorageStatistics;

use crate::graph::GraphProjector;

/// Postgres-backed cold storage: the system of record for hyperedges.
/// Point reads/writes and vector search hit Postgres directly; structural
/// graph queries delegate to the connected property graph.
pub struct PgColdStore {
    pool: Pool,
    graph: Option<Arc<GraphProjector>>,
}

impl PgColdStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool, graph: None }
    }

    pub fn with_graph(mut self, graph: Arc<GraphProjector>) -> Self {
        self.graph = Some(graph);
        self
    }

    async fn conn(&self) -> Result<deadpool_postgres::Object, ColdStorageError> {
        self.pool.get().await.map_err(|e| ColdStorageError::Unavailable(e.to_string()))
    }
}

fn edge_type_to_i16(edge_type: EdgeType) -> i16 {
    match edge_type {
        EdgeType::Bcp => 0,
        EdgeType::SupplierOffering => 1,
        EdgeType::Transaction => 2,
    }
}

fn edge_type_from_i16(value: i16) -> Option<EdgeType> {
    match value {
        0 => Some(EdgeType::Bcp),
        1 => Some(EdgeType::SupplierOffering),
        2 => Some(EdgeType::Transaction),
        _ => None,
    }
}

fn row_to_hyperedge(row: &tokio_postgres::Row) -> Result<Hyperedge, ColdStorageError> {
    let edge_type_raw: i16 = row.get("edge_type");
    let edge_type = edge_type_from_i16(edge_type_raw)
        .ok_or_else(|| ColdStorageError::Query(format!("unknown edge_type discriminant {edge_type_raw}")))?;

    Ok(Hyperedge {
        edge_type,
        key: row.get("key"),
        payload: row.get("payload_jsonb"),
        embedding: None,
        version: row.get::<_, i32>("version") as u32,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl ColdHypergraphStorage for PgColdStore {
    async fn write_hyperedge(&self, hyperedge: Hyperedge) -> Result<WriteReceipt, ColdStorageError> {
        let mut conn = self.conn().await?;
        let txn = conn
            .transaction()
            .await
            .map_err(|e| ColdStorageError::Query(e.to_string()))?;

        let edge_type = edge_type_to_i16(hyperedge.edge_type);
        let now: DateTime<Utc> = Utc::now();

        txn.execute(
            r#"
            INSERT INTO hyperedges (edge_type, key, payload_jsonb, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (edge_type, key) DO UPDATE SET
                payload_jsonb = EXCLUDED.payload_jsonb,
                version = EXCLUDED.version,
                updated_at = EXCLUDED.updated_at
            "#,
            &[&edge_type, &hyperedge.key, &hyperedge.payload, &(hyperedge.version as i32), &now],
        )
        .await
        .map_err(|e| ColdStorageError::Write {
            edge_type: hyperedge.edge_type,
            key: hyperedge.key.clone(),
            reason: e.to_string(),
        })?;

        txn.execute(
            r#"
            INSERT INTO hyperedge_log (edge_type, key, version, payload_jsonb)
            VALUES ($1, $2, $3, $4)
            "#,
            &[&edge_type, &hyperedge.key, &(hyperedge.version as i32), &hyperedge.payload],
        )
        .await
        .map_err(|e| ColdStorageError::Write {
            edge_type: hyperedge.edge_type,
            key: hyperedge.key.clone(),
            reason: e.to_string(),
        })?;

        let embedding_pending = match &hyperedge.embedding {
            Some(embedding) => {
                let vector = pgvector::Vector::from(embedding.data.clone());
                txn.execute(
                    r#"
                    INSERT INTO embeddings (edge_type, key, embedding_vec, model_version)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (edge_type, key) DO UPDATE SET
                        embedding_vec = EXCLUDED.embedding_vec,
                        model_version = EXCLUDED.model_version
                    "#,
                    &[&edge_type, &hyperedge.key, &vector, &embedding.model_id],
                )
                .await
                .map_err(|e| ColdStorageError::Write {
                    edge_type: hyperedge.edge_type,
                    key: hyperedge.key.clone(),
                    reason: e.to_string(),
                })?;
                false
            }
            None => true,
        };

        txn.execute(
            "INSERT INTO projection_queue (edge_type, key) VALUES ($1, $2)",
            &[&edge_type, &hyperedge.key],
        )
        .await
        .map_err(|e| ColdStorageError::Write {
            edge_type: hyperedge.edge_type,
            key: hyperedge.key.clone(),
            reason: e.to_string(),
        })?;

        txn.commit().await.map_err(|e| ColdStorageError::Write {
            edge_type: hyperedge.edge_type,
            key: hyperedge.key.clone(),
            reason: e.to_string(),
        })?;

        Ok(WriteReceipt {
            edge_type: hyperedge.edge_type,
            key: hyperedge.key,
            version: hyperedge.version,
            embedding_pending,
        })
    }

    async fn read_hyperedge(&self, edge_type: EdgeType, key: &str) -> Result<Option<Hyperedge>, ColdStorageError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "SELECT edge_type, key, payload_jsonb, version, created_at, updated_at \
                 FROM hyperedges WHERE edge_type = $1 AND key = $2",
                &[&edge_type_to_i16(edge_type), &key],
            )
            .await
            .map_err(|e| ColdStorageError::Query(e.to_string()))?;

        let Some(row) = row else { return Ok(None) };
        let mut hyperedge = row_to_hyperedge(&row)?;

        let embedding_row = conn
            .query_opt(
                "SELECT embedding_vec, model_version FROM embeddings WHERE edge_type = $1 AND key = $2",
                &[&edge_type_to_i16(edge_type), &key],
            )
            .await
            .map_err(|e| ColdStorageError::Query(e.to_string()))?;

        if let Some(embedding_row) = embedding_row {
            let vector: pgvector::Vector = embedding_row.get("embedding_vec");
            let model_id: String = embedding_row.get("model_version");
            hyperedge.embedding = Some(EmbeddingVector::new(vector.to_vec(), model_id));
        }

        Ok(Some(hyperedge))
    }

    async fn top_k_by_vector(
        &self,
        edge_type: EdgeType,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<(Hyperedge, f32)>, ColdStorageError> {
        let conn = self.conn().await?;
        let vector = pgvector::Vector::from(query_vector.to_vec());

        let rows = conn
            .query(
                r#"
                SELECT h.edge_type, h.key, h.payload_jsonb, h.version, h.created_at, h.updated_at,
                       1 - (e.embedding_vec <=> $2) AS similarity
                FROM embeddings e
                JOIN hyperedges h ON h.edge_type = e.edge_type AND h.key = e.key
                WHERE e.edge_type = $1
                ORDER BY e.embedding_vec <=> $2
                LIMIT $3
                "#,
                &[&edge_type_to_i16(edge_type), &vector, &(k as i64)],
            )
            .await
            .map_err(|e| ColdStorageError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let hyperedge = row_to_hyperedge(row)?;
                let similarity: f32 = row.get("similarity");
                Ok((hyperedge, similarity))
            })
            .collect()
    }

    async fn query_graph_pattern(&self, pattern: &GraphPattern) -> Result<Vec<GraphMatch>, ColdStorageError> {
        match &self.graph {
            Some(graph) => graph
                .query_pattern(pattern)
                .await
                .map_err(|e| ColdStorageError::Query(e.to_string())),
            None => Err(ColdStorageError::Unavailable(
                "no property graph connection configured".into(),
            )),
        }
    }

    async fn list_by_type(&self, edge_type: EdgeType, limit: usize) -> Result<Vec<Hyperedge>, ColdStorageError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT edge_type, key, payload_jsonb, version, created_at, updated_at \
                 FROM hyperedges WHERE edge_type = $1 ORDER BY updated_at DESC LIMIT $2",
                &[&edge_type_to_i16(edge_type), &(limit as i64)],
            )
            .await
            .map_err(|e| ColdStorageError::Query(e.to_string()))?;

        rows.iter().map(row_to_hyperedge).collect()
    }

    async fn statistics(&self) -> Result<StorageStatistics, ColdStorageError> {
        let conn = self.conn().await?;
        let row = conn
            .query_one(
                r#"
                SELECT
                    (SELECT count(*) FROM hyperedges WHERE edge_type = 0) AS bcp_count,
                    (SELECT count(*) FROM hyperedges WHERE edge_type = 1) AS supplier_offering_count,
                    (SELECT count(*) FROM hyperedges WHERE edge_type = 2) AS transaction_count,
                    (SELECT count(*) FROM hyperedges h
                        LEFT JOIN embeddings e ON e.edge_type = h.edge_type AND e.key = h.key
                        WHERE e.key IS NULL) AS embedding_pending_count
                "#,
                &[],
            )
            .await
            .map_err(|e| ColdStorageError::Query(e.to_string()))?;

        Ok(StorageStatistics {
            bcp_count: row.get::<_, i64>("bcp_count") as u64,
            supplier_offering_count: row.get::<_, i64>("supplier_offering_count") as u64,
            transaction_count: row.get::<_, i64>("transaction_count") as u64,
            embedding_pending_count: row.get::<_, i64>("embedding_pending_count") as u64,
        })
    }
}
