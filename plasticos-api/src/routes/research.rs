//! `POST /research/run` (spec §6, §9): runs one Research DAG job to
//! completion (or its first fatal failure point) and returns the summary
//! inline — the DAG's own timeout bounds how long a caller waits.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use plasticos_research::{JobOutcome, JobSpec, ResearchPipeline};
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `POST /research/run` handler. A job that halts partway through still
/// returns `200` — the response's `outcome` tag distinguishes `completed`
/// from `partial`, mirroring `JobOutcome`'s own shape rather than
/// collapsing a partial run into an HTTP error.
#[utoipa::path(post, path = "/research/run", tag = "Research",
    request_body = JobSpec,
    responses((status = 200, description = "Job ran to completion or to its first failure point", body = JobOutcome)))]
pub async fn run_job(
    State(research): State<Arc<ResearchPipeline>>,
    Json(spec): Json<JobSpec>,
) -> ApiResult<Json<JobOutcome>> {
    if spec.polymer.trim().is_empty() {
        return Err(ApiError::missing_field("polymer"));
    }
    if spec.domain.trim().is_empty() {
        return Err(ApiError::missing_field("domain"));
    }

    let outcome = research.run_job(spec, CancellationToken::new()).await;
    Ok(Json(outcome))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/research/run", post(run_job))
}
