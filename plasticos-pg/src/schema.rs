//! Concrete Postgres schema (spec §6 "Persisted State Layout"):
//! `hyperedges`, `embeddings`, `world_model_aggregates`, `hyperedge_log`,
//! `schema_migrations`.
//!
//! Migrations are plain idempotent DDL statements applied in order and
//! recorded in `schema_migrations`, tracking schema version inside Postgres
//! rather than relying on an external migration tool.

use deadpool_postgres::Pool;
use plasticos_core::{ConfigurationError, PlasticError};

/// One migration: a monotonically increasing id and its DDL body.
pub struct Migration {
    pub id: i32,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        name: "schema_migrations",
        sql: r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
        "#,
    },
    Migration {
        id: 2,
        name: "hyperedges",
        sql: r#"
            CREATE TABLE IF NOT EXISTS hyperedges (
                edge_type SMALLINT NOT NULL,
                key TEXT NOT NULL,
                payload_jsonb JSONB NOT NULL,
                version INTEGER NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (edge_type, key)
            )
        "#,
    },
    Migration {
        id: 3,
        name: "embeddings_extension",
        sql: "CREATE EXTENSION IF NOT EXISTS vector",
    },
    Migration {
        id: 4,
        name: "embeddings",
        sql: r#"
            CREATE TABLE IF NOT EXISTS embeddings (
                edge_type SMALLINT NOT NULL,
                key TEXT NOT NULL,
                embedding_vec VECTOR NOT NULL,
                model_version TEXT NOT NULL,
                PRIMARY KEY (edge_type, key),
                FOREIGN KEY (edge_type, key) REFERENCES hyperedges (edge_type, key) ON DELETE CASCADE
            )
        "#,
    },
    Migration {
        id: 5,
        name: "embeddings_hnsw_index",
        sql: r#"
            CREATE INDEX IF NOT EXISTS embeddings_vec_hnsw_idx
                ON embeddings USING hnsw (embedding_vec vector_cosine_ops)
        "#,
    },
    Migration {
        id: 6,
        name: "world_model_aggregates",
        sql: r#"
            CREATE TABLE IF NOT EXISTS world_model_aggregates (
                bcp_key TEXT PRIMARY KEY,
                buyer_score REAL NOT NULL DEFAULT 0,
                supplier_score REAL NOT NULL DEFAULT 0,
                lane_risk_score REAL NOT NULL DEFAULT 0,
                product_stability_score REAL NOT NULL DEFAULT 0,
                transaction_count BIGINT NOT NULL DEFAULT 0,
                repeat_business_count BIGINT NOT NULL DEFAULT 0,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
        "#,
    },
    Migration {
        id: 7,
        name: "hyperedge_log",
        sql: r#"
            CREATE TABLE IF NOT EXISTS hyperedge_log (
                sequence BIGSERIAL PRIMARY KEY,
                edge_type SMALLINT NOT NULL,
                key TEXT NOT NULL,
                version INTEGER NOT NULL,
                payload_jsonb JSONB NOT NULL,
                recorded_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
        "#,
    },
    Migration {
        id: 8,
        name: "hyperedge_log_edge_type_idx",
        sql: "CREATE INDEX IF NOT EXISTS hyperedge_log_edge_type_idx ON hyperedge_log (edge_type, sequence)",
    },
    Migration {
        id: 9,
        name: "projection_queue",
        sql: r#"
            CREATE TABLE IF NOT EXISTS projection_queue (
                id BIGSERIAL PRIMARY KEY,
                edge_type SMALLINT NOT NULL,
                key TEXT NOT NULL,
                enqueued_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                attempts INTEGER NOT NULL DEFAULT 0,
                last_error TEXT
            )
        "#,
    },
];

/// Applies every migration not yet recorded in `schema_migrations`, in id
/// order. Each statement is plain idempotent DDL (`IF NOT EXISTS`), so
/// re-running a partially-applied migration is safe.
pub async fn apply_migrations(pool: &Pool) -> Result<Vec<i32>, PlasticError> {
    let mut conn = pool.get().await.map_err(|e| ConfigurationError::InvalidValue {
        field: "postgres_dsn".into(),
        value: "<redacted>".into(),
        reason: e.to_string(),
    })?;

    conn.execute(MIGRATIONS[0].sql, &[])
        .await
        .map_err(|e| migration_error(MIGRATIONS[0], e))?;

    let mut applied = Vec::new();
    for migration in MIGRATIONS {
        let already_applied = conn
            .query_opt("SELECT 1 FROM schema_migrations WHERE id = $1", &[&migration.id])
            .await
            .map_err(|e| migration_error(migration, e))?
            .is_some();
        if already_applied {
            continue;
        }

        let txn = conn.transaction().await.map_err(|e| migration_error(migration, e))?;
        txn.batch_execute(migration.sql)
            .await
            .map_err(|e| migration_error(migration, e))?;
        txn.execute(
            "INSERT INTO schema_migrations (id, name) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            &[&migration.id, &migration.name],
        )
        .await
        .map_err(|e| migration_error(migration, e))?;
        txn.commit().await.map_err(|e| migration_error(migration, e))?;

        tracing::info!(migration = migration.name, id = migration.id, "applied migration");
        applied.push(migration.id);
    }

    Ok(applied)
}

fn migration_error(migration: &Migration, err: tokio_postgres::Error) -> PlasticError {
    ConfigurationError::InvalidValue {
        field: "schema_migrations".into(),
        value: migration.name.into(),
        reason: err.to_string(),
    }
    .into()
}
