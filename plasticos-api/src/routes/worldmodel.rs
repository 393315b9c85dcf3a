//! `GET /worldmodel/snapshot` (spec §9): a read-only view of the running
//! buyer/supplier/lane/product picture the matching pass reads from.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use plasticos_core::WorldModelSnapshot;
use plasticos_worldmodel::WorldModelService;

use crate::error::ApiResult;
use crate::state::AppState;

#[utoipa::path(get, path = "/worldmodel/snapshot", tag = "WorldModel",
    responses((status = 200, description = "Current World Model snapshot", body = WorldModelSnapshot)))]
pub async fn snapshot(State(world_model): State<Arc<WorldModelService>>) -> ApiResult<Json<WorldModelSnapshot>> {
    let snapshot = world_model.snapshot().await.into_result()?;
    Ok(Json(snapshot))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/worldmodel/snapshot", get(snapshot))
}
