//! `POST /intake/offering` (spec §9, domain agent contract): the only path
//! by which a `SupplierOffering` hyperedge enters the hypergraph. Domain
//! agents never write to storage or the World Model directly.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use plasticos_core::{EdgeType, SupplierOffering};
use plasticos_schema::CanonicalPayload;
use plasticos_storage::HypergraphStore;
use plasticos_worldmodel::WorldModelService;
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IntakeResponse {
    pub supplier_edge_id: String,
    pub version: u32,
}

#[utoipa::path(post, path = "/intake/offering", tag = "Intake",
    request_body = SupplierOffering,
    responses(
        (status = 200, description = "Offering registered", body = IntakeResponse),
        (status = 400, description = "Offering failed validation"),
    ))]
pub async fn intake_offering(
    State(store): State<Arc<dyn HypergraphStore>>,
    State(world_model): State<Arc<WorldModelService>>,
    Json(raw): Json<serde_json::Value>,
) -> ApiResult<Json<IntakeResponse>> {
    let payload = plasticos_schema::validate(raw, EdgeType::SupplierOffering)?;
    let CanonicalPayload::SupplierOffering(_) = &payload else {
        unreachable!("validate(_, EdgeType::SupplierOffering) always yields CanonicalPayload::SupplierOffering");
    };

    let edge = plasticos_schema::to_hyperedge(&payload, None)?;
    let supplier_edge_id = edge.key.clone();

    world_model.observe_hyperedge(&edge).await.into_result()?;
    let receipt = store.write_hyperedge(edge).await.into_result()?;

    Ok(Json(IntakeResponse { supplier_edge_id, version: receipt.version }))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/intake/offering", post(intake_offering))
}
