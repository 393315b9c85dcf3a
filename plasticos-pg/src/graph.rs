//! Property graph projection and querying over Neo4j (spec §4.2, §6
//! "Property graph": `Buyer`, `Supplier`, `Material`, `Geography`,
//! `Certification`, `Hyperedge_BCP`/`Hyperedge_SupplierOffering`/
//! `Hyperedge_Transaction` nodes; `HAS_BCP`, `FOR_MATERIAL`, `IN_GEOGRAPHY`,
//! `REQUIRES_CERT` relationships).
//!
//! A thin `neo4rs::Graph` wrapper executing parameterized Cypher. Projection
//! is MERGE-based so repeated application of the same hyperedge write is a
//! no-op (spec §4.2 "projection is idempotent (MERGE semantics)").

use neo4rs::{query, Graph};
use plasticos_core::{EdgeType, GraphMatch, GraphPattern, Hyperedge, PlasticError, ProjectionError};
use serde_json::Value;

/// Connection to the property graph store.
pub struct GraphProjector {
    graph: Graph,
}

impl GraphProjector {
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, PlasticError> {
        let graph = Graph::new(uri, user, password).await.map_err(|e| ProjectionError::Failed {
            edge_type: EdgeType::Bcp,
            key: String::new(),
            reason: format!("failed to connect to property graph at {uri}: {e}"),
        })?;
        Ok(Self { graph })
    }

    /// Idempotently (re)projects a hyperedge onto the property graph. Only
    /// BCP hyperedges currently have a defined projection shape (spec §4.2);
    /// other edge types are a no-op until the spec defines one.
    pub async fn project(&self, edge: &Hyperedge) -> Result<(), ProjectionError> {
        match edge.edge_type {
            EdgeType::Bcp => self.project_bcp(edge).await,
            EdgeType::SupplierOffering | EdgeType::Transaction => Ok(()),
        }
    }

    async fn project_bcp(&self, edge: &Hyperedge) -> Result<(), ProjectionError> {
        let payload = &edge.payload;
        let company_name = str_field(payload, "company_name");
        let buyer_location = str_field(payload, "buyer_location");
        let polymer = payload
            .get("material")
            .and_then(|m| m.get("polymer"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let countries = array_of_str(payload, &["geography", "countries"]);
        let regions = array_of_str(payload, &["geography", "regions"]);
        let certifications = array_of_str(payload, &["certifications"]);

        let cypher = r#"
            MERGE (hb:Hyperedge_BCP {edge_id: $edge_id})
              SET hb.key = $key, hb.version = $version
            MERGE (buyer:Buyer {company_name: $company_name})
            MERGE (buyer)-[:HAS_BCP]->(hb)
            MERGE (material:Material {polymer: $polymer})
            MERGE (hb)-[:FOR_MATERIAL]->(material)
            MERGE (geography:Geography {location: $buyer_location})
            MERGE (hb)-[:IN_GEOGRAPHY]->(geography)
            WITH hb
            UNWIND $certifications AS cert
              MERGE (c:Certification {name: cert})
              MERGE (hb)-[:REQUIRES_CERT]->(c)
        "#;

        self.graph
            .run(
                query(cypher)
                    .param("edge_id", edge.key.clone())
                    .param("key", edge.key.clone())
                    .param("version", edge.version as i64)
                    .param("company_name", company_name.to_string())
                    .param("polymer", polymer.to_string())
                    .param("buyer_location", buyer_location.to_string())
                    .param("certifications", certifications),
            )
            .await
            .map_err(|e| ProjectionError::Failed {
                edge_type: edge.edge_type,
                key: edge.key.clone(),
                reason: e.to_string(),
            })?;

        // Countries/regions are denormalized onto the same Geography node;
        // a separate statement keeps the MERGE above focused on one node per
        // label.
        if !countries.is_empty() || !regions.is_empty() {
            self.graph
                .run(
                    query(
                        "MATCH (g:Geography {location: $buyer_location}) \
                         SET g.countries = $countries, g.regions = $regions",
                    )
                    .param("buyer_location", buyer_location.to_string())
                    .param("countries", countries)
                    .param("regions", regions),
                )
                .await
                .map_err(|e| ProjectionError::Failed {
                    edge_type: edge.edge_type,
                    key: edge.key.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(())
    }

    /// Translates a `GraphPattern` (spec §4.2 structural query) into a
    /// parameterized Cypher traversal and returns the bound node keys per
    /// match, anchor first — matching `GraphMatch::bound_keys`'s shape from
    /// `InMemoryHypergraphStore::query_graph_pattern`.
    pub async fn query_pattern(&self, pattern: &GraphPattern) -> Result<Vec<GraphMatch>, ProjectionError> {
        let (cypher, params) = translate_pattern(pattern);
        let mut result = self.graph.execute(build_query(&cypher, &params)).await.map_err(|e| {
            ProjectionError::Failed {
                edge_type: EdgeType::Bcp,
                key: String::new(),
                reason: e.to_string(),
            }
        })?;

        let mut matches = Vec::new();
        while let Some(row) = result.next().await.map_err(|e| ProjectionError::Failed {
            edge_type: EdgeType::Bcp,
            key: String::new(),
            reason: e.to_string(),
        })? {
            let mut bound_keys = Vec::new();
            for i in 0..=pattern.steps.len() {
                let column = format!("n{i}");
                if let Ok(key) = row.get::<String>(column.as_str()) {
                    bound_keys.push(key);
                }
            }
            if bound_keys.len() == pattern.steps.len() + 1 {
                matches.push(GraphMatch { bound_keys });
            }
            if matches.len() >= pattern.limit {
                break;
            }
        }
        Ok(matches)
    }

    /// Reconciliation scan (spec invariant 5): returns BCP hyperedge keys
    /// with no `Hyperedge_BCP` node, so the caller can re-enqueue them.
    pub async fn missing_bcp_projections(&self, candidate_keys: &[String]) -> Result<Vec<String>, ProjectionError> {
        let mut result = self
            .graph
            .execute(
                query("UNWIND $keys AS k OPTIONAL MATCH (hb:Hyperedge_BCP {key: k}) WITH k, hb WHERE hb IS NULL RETURN k")
                    .param("keys", candidate_keys.to_vec()),
            )
            .await
            .map_err(|e| ProjectionError::ReconciliationFailed { reason: e.to_string() })?;

        let mut missing = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| ProjectionError::ReconciliationFailed { reason: e.to_string() })?
        {
            if let Ok(key) = row.get::<String>("k") {
                missing.push(key);
            }
        }
        Ok(missing)
    }
}

fn str_field<'a>(payload: &'a Value, field: &str) -> &'a str {
    payload.get(field).and_then(Value::as_str).unwrap_or_default()
}

fn array_of_str(payload: &Value, path: &[&str]) -> Vec<String> {
    let mut current = payload;
    for segment in path {
        match current.get(segment) {
            Some(v) => current = v,
            None => return Vec::new(),
        }
    }
    current
        .as_array()
        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

/// Cypher text plus ordered (name, label, filters) binding info for a
/// `GraphPattern`'s anchor and each relationship step.
fn translate_pattern(pattern: &GraphPattern) -> (String, Vec<(String, Value)>) {
    let mut clauses = Vec::new();
    let mut returns = vec!["n0.key AS n0".to_string()];
    let mut params = Vec::new();

    clauses.push(format!("MATCH (n0:{})", pattern.anchor.label));
    push_filters(&mut clauses, "n0", &pattern.anchor.filters, &mut params);

    for (i, step) in pattern.steps.iter().enumerate() {
        let from = format!("n{i}");
        let to = format!("n{}", i + 1);
        clauses.push(format!(
            "MATCH ({from})-[:{}]->({to}:{})",
            step.relationship_type, step.to.label
        ));
        push_filters(&mut clauses, &to, &step.to.filters, &mut params);
        returns.push(format!("{to}.key AS {to}"));
    }

    clauses.push(format!("RETURN {}", returns.join(", ")));
    clauses.push(format!("LIMIT {}", pattern.limit));
    (clauses.join("\n"), params)
}

fn push_filters(
    clauses: &mut Vec<String>,
    node_var: &str,
    filters: &[plasticos_core::FilterExpr],
    params: &mut Vec<(String, Value)>,
) {
    for (i, filter) in filters.iter().enumerate() {
        let param_name = format!("{node_var}_f{i}");
        let field = if filter.field.is_empty() { "key" } else { &filter.field };
        let op = match filter.operator {
            plasticos_core::FilterOperator::Eq => "=",
            plasticos_core::FilterOperator::Ne => "<>",
            plasticos_core::FilterOperator::Gt => ">",
            plasticos_core::FilterOperator::Lt => "<",
            plasticos_core::FilterOperator::Gte => ">=",
            plasticos_core::FilterOperator::Lte => "<=",
            plasticos_core::FilterOperator::Contains => "CONTAINS",
            plasticos_core::FilterOperator::In => "IN",
        };
        clauses.push(format!("WITH * WHERE {node_var}.{field} {op} ${param_name}"));
        params.push((param_name, filter.value.clone()));
    }
}

fn build_query(cypher: &str, params: &[(String, Value)]) -> neo4rs::Query {
    let mut q = query(cypher);
    for (name, value) in params {
        q = bind_json_param(q, name, value);
    }
    q
}

fn bind_json_param(q: neo4rs::Query, name: &str, value: &Value) -> neo4rs::Query {
    match value {
        Value::String(s) => q.param(name, s.clone()),
        Value::Number(n) if n.is_i64() => q.param(name, n.as_i64().unwrap_or_default()),
        Value::Number(n) => q.param(name, n.as_f64().unwrap_or_default()),
        Value::Bool(b) => q.param(name, *b),
        other => q.param(name, other.to_string()),
    }
}
