//! PostgreSQL JSONB+pgvector cold storage and Neo4j property-graph
//! projection for the Hypergraph Store (spec §3, §6 "Persisted State
//! Layout"): `plasticos-storage::HybridHypergraphStore`'s cold half.
//!
//! Owns the concrete schema (`hyperedges`, `embeddings`,
//! `world_model_aggregates`, `hyperedge_log`, `schema_migrations`,
//! `projection_queue`) and the async graph-projection worker.

pub mod graph;
pub mod pool;
pub mod projection;
pub mod schema;
pub mod store;

pub use graph::GraphProjector;
pub use pool::PgPoolConfig;
pub use projection::{ProjectionWorker, RetryConfig};
pub use store::PgColdStore;
