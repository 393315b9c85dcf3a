//! Generic hyperedge lookup and BCP semantic search (spec §4.2, §9, domain
//! agent contract): the two read paths exposed over the raw hypergraph.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use plasticos_core::{EdgeType, Hyperedge};
use plasticos_llm::EmbeddingProvider;
use plasticos_storage::HypergraphStore;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /hyperedge/{edge_type}/{key}`.
#[utoipa::path(get, path = "/hyperedge/{edge_type}/{key}", tag = "Hyperedge",
    params(("edge_type" = String, Path), ("key" = String, Path)),
    responses(
        (status = 200, description = "The hyperedge", body = Hyperedge),
        (status = 400, description = "Unknown edge_type"),
        (status = 404, description = "No hyperedge at that identity"),
    ))]
pub async fn read_hyperedge(
    State(store): State<Arc<dyn HypergraphStore>>,
    Path((edge_type, key)): Path<(String, String)>,
) -> ApiResult<Json<Hyperedge>> {
    let edge_type: EdgeType = edge_type
        .parse()
        .map_err(|e| ApiError::invalid_input(format!("invalid edge_type: {e}")))?;

    let edge = store
        .read_hyperedge(edge_type, &key)
        .await
        .into_result()?
        .ok_or_else(|| ApiError::hyperedge_not_found(edge_type, &key))?;

    Ok(Json(edge))
}

#[derive(Debug, Deserialize)]
pub struct BcpTopKQuery {
    pub polymer: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default = "default_top_k")]
    pub k: usize,
}

fn default_top_k() -> usize {
    20
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScoredHyperedge {
    pub hyperedge: Hyperedge,
    pub score: f32,
}

/// `GET /bcp/top_k?polymer=X&region=Y&k=N`: embeds `"{polymer} {region}"`
/// the same way the matching engine embeds an offering, and runs the same
/// vector search the candidate-generation step runs internally.
#[utoipa::path(get, path = "/bcp/top_k", tag = "Hyperedge",
    params(("polymer" = String, Query), ("region" = Option<String>, Query), ("k" = Option<usize>, Query)),
    responses((status = 200, description = "BCPs ranked by relevance", body = [ScoredHyperedge])))]
pub async fn bcp_top_k(
    State(store): State<Arc<dyn HypergraphStore>>,
    State(embeddings): State<Arc<dyn EmbeddingProvider>>,
    Query(query): Query<BcpTopKQuery>,
) -> ApiResult<Json<Vec<ScoredHyperedge>>> {
    if query.polymer.trim().is_empty() {
        return Err(ApiError::missing_field("polymer"));
    }

    let query_text = match &query.region {
        Some(region) => format!("{} {}", query.polymer, region),
        None => query.polymer.clone(),
    };
    let vector = embeddings.embed(&query_text).await?;

    let results = store
        .top_k_by_vector(EdgeType::Bcp, &vector.data, query.k)
        .await
        .into_result()?;

    Ok(Json(
        results.into_iter().map(|(hyperedge, score)| ScoredHyperedge { hyperedge, score }).collect(),
    ))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/hyperedge/{edge_type}/{key}", get(read_hyperedge))
        .route("/bcp/top_k", get(bcp_top_k))
}
