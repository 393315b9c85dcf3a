//! OpenAPI document assembly (feature = "openapi").

use utoipa::OpenApi;

use crate::error::ApiError;
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::hyperedge::ScoredHyperedge;
use crate::routes::intake::IntakeResponse;
use crate::routes::matching::MatchRunRequest;
use crate::routes::signal::SignalOutcome;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::readiness,
        crate::routes::health::liveness,
        crate::routes::research::run_job,
        crate::routes::worldmodel::snapshot,
        crate::routes::matching::match_offering,
        crate::routes::matching::match_run,
        crate::routes::hyperedge::read_hyperedge,
        crate::routes::hyperedge::bcp_top_k,
        crate::routes::intake::intake_offering,
        crate::routes::signal::buyer_update,
    ),
    components(schemas(
        HealthResponse,
        HealthStatus,
        HealthDetails,
        ComponentHealth,
        ScoredHyperedge,
        IntakeResponse,
        MatchRunRequest,
        SignalOutcome,
        ApiError,
    )),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Research", description = "Research DAG job submission"),
        (name = "WorldModel", description = "World Model snapshot reads"),
        (name = "Matching", description = "Matching Engine entry points"),
        (name = "Hyperedge", description = "Raw hypergraph reads"),
        (name = "Intake", description = "Supplier offering intake"),
        (name = "Signal", description = "Domain agent learned-signal submission"),
    ),
)]
pub struct ApiDoc;
