//! `POST /signal/buyer_update` (spec §9, domain agent contract): a domain
//! agent's best understanding of a buyer's current spec/price, not a
//! trusted rewrite. L9 — not the caller — decides whether the signal is a
//! duplicate, a genuine update worth a version bump, or a contradiction
//! that gets stored anyway with issues attached for operator review.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use plasticos_core::{BuyerCriteriaProfile, EdgeType};
use plasticos_schema::{CanonicalPayload, ValidationIssue, VersionDecision};
use plasticos_storage::HypergraphStore;
use plasticos_worldmodel::WorldModelService;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum SignalOutcome {
    /// Identical to the stored version; nothing written.
    Duplicate,
    /// Stored as a new version of the existing BCP.
    Updated { bcp_key: String, version: u32 },
    /// Stored anyway (invariant: signals are never silently dropped), with
    /// the conflicting fields flagged for operator review.
    Contradiction { bcp_key: String, version: u32, issues: Vec<ValidationIssue> },
}

/// `POST /signal/buyer_update`: body is a full proposed `BuyerCriteriaProfile`
/// at the same `(company, location, polymer)` identity as an existing BCP.
#[utoipa::path(post, path = "/signal/buyer_update", tag = "Signal",
    request_body = BuyerCriteriaProfile,
    responses(
        (status = 200, description = "Signal processed", body = SignalOutcome),
        (status = 404, description = "No existing BCP at that identity"),
    ))]
pub async fn buyer_update(
    State(store): State<Arc<dyn HypergraphStore>>,
    State(world_model): State<Arc<WorldModelService>>,
    Json(incoming): Json<BuyerCriteriaProfile>,
) -> ApiResult<Json<SignalOutcome>> {
    let bcp_key = incoming.hyperedge_key();

    let existing_edge = store
        .read_hyperedge(EdgeType::Bcp, &bcp_key)
        .await
        .into_result()?
        .ok_or_else(|| ApiError::hyperedge_not_found(EdgeType::Bcp, &bcp_key))?;

    let existing: BuyerCriteriaProfile = serde_json::from_value(existing_edge.payload.clone())
        .map_err(|e| ApiError::internal_error(format!("stored BCP payload is malformed: {e}")))?;

    let decision = plasticos_schema::compare_bcp_versions(&existing, &incoming);

    if let VersionDecision::Duplicate = decision {
        return Ok(Json(SignalOutcome::Duplicate));
    }

    let mut promoted = incoming;
    promoted.metadata.version = existing.metadata.version;
    plasticos_schema::bump_version(&mut promoted);

    let payload = CanonicalPayload::Bcp(promoted);
    let edge = plasticos_schema::to_hyperedge(&payload, Some(existing_edge.version))?;
    let version = edge.version;

    world_model.observe_hyperedge(&edge).await.into_result()?;
    store.write_hyperedge(edge).await.into_result()?;

    Ok(Json(match decision {
        VersionDecision::Duplicate => unreachable!("handled above"),
        VersionDecision::Update => SignalOutcome::Updated { bcp_key, version },
        VersionDecision::Contradiction(issues) => SignalOutcome::Contradiction { bcp_key, version, issues },
    }))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/signal/buyer_update", post(buyer_update))
}
