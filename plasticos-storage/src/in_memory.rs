//! In-memory `HypergraphStore`, used by tests and by callers that don't need
//! durability (local development, the Research DAG's dry-run mode).

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use plasticos_core::{
    EdgeType, Effect, GraphMatch, GraphPattern, Hyperedge, PlasticError, StorageError,
    WriteReceipt,
};
use plasticos_dag::{EventDagExt, InMemoryEventDag};
use serde_json::Value;

use crate::{HypergraphStore, StorageStatistics};

/// Audit payload appended to the `hyperedge_log` on every write.
#[derive(Debug, Clone)]
pub struct HyperedgeLogEntry {
    pub edge_type: EdgeType,
    pub key: String,
    pub version: u32,
}

/// A single-process `HypergraphStore` backed by a `RwLock<HashMap>`, with a
/// `hyperedge_log` append-only audit trail recorded via `plasticos-dag`'s
/// generic `EventDag`.
pub struct InMemoryHypergraphStore {
    edges: RwLock<HashMap<(EdgeType, String), Hyperedge>>,
    hyperedge_log: InMemoryEventDag<HyperedgeLogEntry>,
}

impl Default for InMemoryHypergraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHypergraphStore {
    pub fn new() -> Self {
        Self {
            edges: RwLock::new(HashMap::new()),
            hyperedge_log: InMemoryEventDag::new(),
        }
    }

    /// The append-only write log backing this store, for callers that need
    /// to replay or audit writes (spec §3 invariant: every write is logged).
    pub fn hyperedge_log(&self) -> &InMemoryEventDag<HyperedgeLogEntry> {
        &self.hyperedge_log
    }

    fn append_log(&self, edge_type: EdgeType, key: &str, version: u32) {
        let entry = HyperedgeLogEntry {
            edge_type,
            key: key.to_string(),
            version,
        };
        let _ = self.hyperedge_log.append_root(entry);
    }
}

#[async_trait]
impl HypergraphStore for InMemoryHypergraphStore {
    async fn write_hyperedge(&self, hyperedge: Hyperedge) -> Effect<WriteReceipt> {
        let identity = (hyperedge.edge_type, hyperedge.key.clone());
        let receipt = WriteReceipt {
            edge_type: hyperedge.edge_type,
            key: hyperedge.key.clone(),
            version: hyperedge.version,
            embedding_pending: hyperedge.embedding.is_none(),
        };
        self.edges
            .write()
            .unwrap()
            .insert(identity, hyperedge.clone());
        self.append_log(hyperedge.edge_type, &hyperedge.key, hyperedge.version);
        Effect::Ok(receipt)
    }

    async fn read_hyperedge(&self, edge_type: EdgeType, key: &str) -> Effect<Option<Hyperedge>> {
        let edges = self.edges.read().unwrap();
        Effect::Ok(edges.get(&(edge_type, key.to_string())).cloned())
    }

    async fn top_k_by_vector(
        &self,
        edge_type: EdgeType,
        query_vector: &[f32],
        k: usize,
    ) -> Effect<Vec<(Hyperedge, f32)>> {
        let edges = self.edges.read().unwrap();
        let query = plasticos_core::EmbeddingVector::new(query_vector.to_vec(), "query");
        let mut scored: Vec<(Hyperedge, f32)> = Vec::new();
        for edge in edges.values().filter(|e| e.edge_type == edge_type) {
            let Some(embedding) = &edge.embedding else {
                continue;
            };
            match embedding.cosine_similarity(&query) {
                Ok(score) => scored.push((edge.clone(), score)),
                Err(err) => {
                    return Effect::err(PlasticError::from(StorageError::WriteFailed {
                        edge_type,
                        key: edge.key.clone(),
                        reason: err.to_string(),
                    }))
                }
            }
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Effect::Ok(scored)
    }

    async fn query_graph_pattern(&self, pattern: &GraphPattern) -> Effect<Vec<GraphMatch>> {
        let edges = self.edges.read().unwrap();
        let mut matches = Vec::new();
        for edge in edges.values().filter(|e| e.edge_type == EdgeType::Bcp) {
            if let Some(bound_keys) = project_pattern(edge, pattern) {
                matches.push(GraphMatch { bound_keys });
                if matches.len() >= pattern.limit {
                    break;
                }
            }
        }
        Effect::Ok(matches)
    }

    async fn list_by_type(&self, edge_type: EdgeType, limit: usize) -> Effect<Vec<Hyperedge>> {
        let edges = self.edges.read().unwrap();
        let mut found: Vec<Hyperedge> = edges
            .values()
            .filter(|e| e.edge_type == edge_type)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        found.truncate(limit);
        Effect::Ok(found)
    }

    async fn statistics(&self) -> Effect<StorageStatistics> {
        let edges = self.edges.read().unwrap();
        let mut stats = StorageStatistics::default();
        for edge in edges.values() {
            match edge.edge_type {
                EdgeType::Bcp => stats.bcp_count += 1,
                EdgeType::SupplierOffering => stats.supplier_offering_count += 1,
                EdgeType::Transaction => stats.transaction_count += 1,
            }
            if edge.embedding.is_none() {
                stats.embedding_pending_count += 1;
            }
        }
        Effect::Ok(stats)
    }
}

/// Projects a `GraphPattern` against a single BCP hyperedge's payload.
///
/// This in-memory store holds one JSON document per hyperedge, so "Buyer",
/// "Material", "Geography" and "Certification" nodes are facets of the same
/// document rather than independently addressable rows (that's what
/// `plasticos-pg`'s actual property-graph projection gives you). Each known
/// label maps to a dot-path into the payload; an unbound label fails the
/// match rather than panicking, so patterns naming nodes this store doesn't
/// understand simply produce no matches.
fn project_pattern(edge: &Hyperedge, pattern: &GraphPattern) -> Option<Vec<String>> {
    let mut bound = Vec::with_capacity(pattern.steps.len() + 1);

    let anchor_path = label_path(&pattern.anchor.label)?;
    let anchor_value = field_at(&edge.payload, anchor_path);
    if !pattern.anchor.filters.iter().all(|f| value_matches(anchor_value, f)) {
        return None;
    }
    bound.push(edge.key.clone());

    for step in &pattern.steps {
        let path = label_path(&step.to.label)?;
        let value = field_at(&edge.payload, path);
        if !step.to.filters.iter().all(|f| value_matches(value, f)) {
            return None;
        }
        bound.push(edge.key.clone());
    }

    Some(bound)
}

fn label_path(label: &str) -> Option<&'static str> {
    match label {
        "Buyer" | "Hyperedge_BCP" => Some(""),
        "Material" => Some("material"),
        "Geography" => Some("geography"),
        "Certification" => Some("certifications"),
        _ => None,
    }
}

fn field_at<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(payload);
    }
    path.split('.').try_fold(payload, |value, segment| value.get(segment))
}

fn value_matches(value: Option<&Value>, filter: &plasticos_core::FilterExpr) -> bool {
    use plasticos_core::FilterOperator::*;
    let Some(root) = value else { return false };
    let target = if filter.field.is_empty() {
        Some(root)
    } else {
        field_at(root, &filter.field)
    };

    match root {
        Value::Array(items) => items.iter().any(|item| {
            let candidate = if filter.field.is_empty() {
                Some(item)
            } else {
                field_at(item, &filter.field)
            };
            scalar_matches(candidate, filter.operator, &filter.value)
        }),
        _ => matches!(filter.operator, Eq | Ne | Gt | Lt | Gte | Lte | Contains | In)
            && scalar_matches(target, filter.operator, &filter.value),
    }
}

fn scalar_matches(
    candidate: Option<&Value>,
    operator: plasticos_core::FilterOperator,
    expected: &Value,
) -> bool {
    use plasticos_core::FilterOperator::*;
    let Some(candidate) = candidate else { return false };
    match operator {
        Eq => candidate == expected,
        Ne => candidate != expected,
        Contains => candidate
            .as_str()
            .zip(expected.as_str())
            .map(|(c, e)| c.contains(e))
            .unwrap_or(false),
        In => expected
            .as_array()
            .map(|items| items.contains(candidate))
            .unwrap_or(false),
        Gt | Lt | Gte | Lte => match (candidate.as_f64(), expected.as_f64()) {
            (Some(c), Some(e)) => match operator {
                Gt => c > e,
                Lt => c < e,
                Gte => c >= e,
                Lte => c <= e,
                _ => unreachable!(),
            },
            _ => false,
        },
        Regex | And | Or | Not => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasticos_core::{EmbeddingVector, NodePattern};

    fn sample_bcp(key: &str, polymer: &str) -> Hyperedge {
        Hyperedge {
            edge_type: EdgeType::Bcp,
            key: key.to_string(),
            payload: serde_json::json!({
                "company_name": "Acme Polymers",
                "material": {"polymer": polymer},
                "geography": {"countries": ["US", "MX"]},
                "certifications": ["ISO9001"],
            }),
            embedding: Some(EmbeddingVector::new(vec![1.0, 0.0, 0.0], "stub-v1")),
            version: 1,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let store = InMemoryHypergraphStore::new();
        let edge = sample_bcp("acme|houston|hdpe", "HDPE");
        let receipt = store.write_hyperedge(edge.clone()).await.into_result().unwrap();
        assert_eq!(receipt.version, 1);
        assert!(!receipt.embedding_pending);

        let read = store
            .read_hyperedge(EdgeType::Bcp, "acme|houston|hdpe")
            .await
            .into_result()
            .unwrap();
        assert_eq!(read, Some(edge));
        assert_eq!(store.hyperedge_log().len(), 1);
    }

    #[tokio::test]
    async fn top_k_by_vector_orders_by_similarity() {
        let store = InMemoryHypergraphStore::new();
        store
            .write_hyperedge(sample_bcp("a", "HDPE"))
            .await
            .into_result()
            .unwrap();
        let mut off_axis = sample_bcp("b", "LDPE");
        off_axis.embedding = Some(EmbeddingVector::new(vec![0.0, 1.0, 0.0], "stub-v1"));
        store.write_hyperedge(off_axis).await.into_result().unwrap();

        let top = store
            .top_k_by_vector(EdgeType::Bcp, &[1.0, 0.0, 0.0], 10)
            .await
            .into_result()
            .unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0.key, "a");
        assert!(top[0].1 > top[1].1);
    }

    #[tokio::test]
    async fn query_graph_pattern_matches_nested_facets() {
        let store = InMemoryHypergraphStore::new();
        store
            .write_hyperedge(sample_bcp("acme|houston|hdpe", "HDPE"))
            .await
            .into_result()
            .unwrap();

        let pattern = GraphPattern::new(NodePattern::new("Buyer")).then(
            "HAS_BCP",
            NodePattern::new("Material").with_filter(plasticos_core::FilterExpr::eq(
                "polymer",
                serde_json::json!("HDPE"),
            )),
        );
        let matches = store.query_graph_pattern(&pattern).await.into_result().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].bound_keys, vec!["acme|houston|hdpe", "acme|houston|hdpe"]);
    }

    #[tokio::test]
    async fn query_graph_pattern_rejects_mismatched_polymer() {
        let store = InMemoryHypergraphStore::new();
        store
            .write_hyperedge(sample_bcp("acme|houston|hdpe", "HDPE"))
            .await
            .into_result()
            .unwrap();

        let pattern = GraphPattern::new(NodePattern::new("Buyer")).then(
            "HAS_BCP",
            NodePattern::new("Material").with_filter(plasticos_core::FilterExpr::eq(
                "polymer",
                serde_json::json!("PP"),
            )),
        );
        let matches = store.query_graph_pattern(&pattern).await.into_result().unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn rewriting_the_same_key_upserts_instead_of_duplicating() {
        let store = InMemoryHypergraphStore::new();
        let first = sample_bcp("acme|houston|hdpe", "HDPE");
        store.write_hyperedge(first.clone()).await.into_result().unwrap();

        let mut second = first.clone();
        second.payload["certifications"] = serde_json::json!(["ISO9001", "ISO14001"]);
        second.version = 2;
        let receipt = store.write_hyperedge(second.clone()).await.into_result().unwrap();
        assert_eq!(receipt.version, 2);

        let listed = store
            .list_by_type(EdgeType::Bcp, 10)
            .await
            .into_result()
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].payload, second.payload);

        // both writes are retained in the append-only audit log, but JSONB
        // storage still holds exactly one row per (edge_type, key).
        assert_eq!(store.hyperedge_log().len(), 2);
    }

    #[tokio::test]
    async fn statistics_counts_by_edge_type() {
        let store = InMemoryHypergraphStore::new();
        store
            .write_hyperedge(sample_bcp("a", "HDPE"))
            .await
            .into_result()
            .unwrap();
        let mut pending = sample_bcp("b", "LDPE");
        pending.embedding = None;
        store.write_hyperedge(pending).await.into_result().unwrap();

        let stats = store.statistics().await.into_result().unwrap();
        assert_eq!(stats.bcp_count, 2);
        assert_eq!(stats.embedding_pending_count, 1);
    }
}
