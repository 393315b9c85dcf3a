//! Matching routes (spec §4.5, §9, domain agent contract): `/match/offering`
//! takes a `SupplierOffering` payload directly, while `/match/run` takes a
//! reference to one already registered through `POST /intake/offering` —
//! domain agents never hand the engine an offering body of their own, only
//! a pointer to the one L9 already validated and wrote.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use plasticos_core::{EdgeType, SupplierOffering};
use plasticos_matching::{MatchOutcome, MatchingEngine};
use plasticos_storage::HypergraphStore;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `POST /match/offering`: the caller supplies the offering inline.
#[utoipa::path(post, path = "/match/offering", tag = "Matching",
    request_body = SupplierOffering,
    responses((status = 200, description = "Ranked buyer candidates", body = MatchOutcome)))]
pub async fn match_offering(
    State(matching): State<Arc<MatchingEngine>>,
    Json(offering): Json<SupplierOffering>,
) -> ApiResult<Json<MatchOutcome>> {
    let outcome = matching.match_offering(&offering).await.into_result()?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MatchRunRequest {
    /// The `supplier_edge_id` returned by a prior `POST /intake/offering`.
    pub supplier_edge_id: String,
}

/// `POST /match/run`: the domain agent contract's entry point. Resolves the
/// offering by key rather than trusting a caller-supplied payload, so a
/// domain agent can only trigger matching for offerings L9 itself intook.
#[utoipa::path(post, path = "/match/run", tag = "Matching",
    request_body = MatchRunRequest,
    responses(
        (status = 200, description = "Ranked buyer candidates", body = MatchOutcome),
        (status = 404, description = "No such supplier offering"),
    ))]
pub async fn match_run(
    State(store): State<Arc<dyn HypergraphStore>>,
    State(matching): State<Arc<MatchingEngine>>,
    Json(request): Json<MatchRunRequest>,
) -> ApiResult<Json<MatchOutcome>> {
    let edge = store
        .read_hyperedge(EdgeType::SupplierOffering, &request.supplier_edge_id)
        .await
        .into_result()?
        .ok_or_else(|| ApiError::hyperedge_not_found(EdgeType::SupplierOffering, &request.supplier_edge_id))?;

    let offering: SupplierOffering = serde_json::from_value(edge.payload)
        .map_err(|e| ApiError::internal_error(format!("stored offering payload is malformed: {e}")))?;

    let outcome = matching.match_offering(&offering).await.into_result()?;
    Ok(Json(outcome))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/match/offering", post(match_offering))
        .route("/match/run", post(match_run))
}
