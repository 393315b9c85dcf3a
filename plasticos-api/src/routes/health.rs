//! Health check endpoints (spec §9): `GET /health` plus Kubernetes-style
//! liveness/readiness probes, unauthenticated.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use plasticos_storage::HypergraphStore;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthDetails {
    pub storage: ComponentHealth,
    pub version: String,
    pub uptime_seconds: u64,
    pub bcp_count: u64,
    pub supplier_offering_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /health/live` — process is up, no dependency checks.
#[utoipa::path(get, path = "/health/live", tag = "Health",
    responses((status = 200, description = "Process is alive", body = HealthResponse)))]
pub async fn liveness() -> impl IntoResponse {
    Json(HealthResponse { status: HealthStatus::Healthy, message: Some("alive".to_string()), details: None })
}

/// `GET /health` — readiness: storage round-trips a `statistics()` call.
#[utoipa::path(get, path = "/health", tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse),
        (status = 503, description = "Service is not ready", body = HealthResponse),
    ))]
pub async fn readiness(
    State(store): State<Arc<dyn HypergraphStore>>,
    State(start_time): State<std::time::Instant>,
) -> impl IntoResponse {
    let started = std::time::Instant::now();
    let storage_health = match store.statistics().await {
        plasticos_core::Effect::Ok(stats) => (
            ComponentHealth { status: HealthStatus::Healthy, latency_ms: Some(started.elapsed().as_millis() as u64), error: None },
            stats.bcp_count,
            stats.supplier_offering_count,
        ),
        plasticos_core::Effect::Err(e) => (
            ComponentHealth { status: HealthStatus::Unhealthy, latency_ms: None, error: Some(e.to_string()) },
            0,
            0,
        ),
        plasticos_core::Effect::Retry { reason, .. } => (
            ComponentHealth { status: HealthStatus::Unhealthy, latency_ms: None, error: Some(reason) },
            0,
            0,
        ),
    };
    let (storage, bcp_count, supplier_offering_count) = storage_health;

    let overall = storage.status;
    let response = HealthResponse {
        status: overall,
        message: None,
        details: Some(HealthDetails {
            storage,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: start_time.elapsed().as_secs(),
            bcp_count,
            supplier_offering_count,
        }),
    };

    let status_code = if overall == HealthStatus::Healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(response))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/health", get(readiness)).route("/health/live", get(liveness))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes_lowercase_status() {
        let response = HealthResponse { status: HealthStatus::Healthy, message: None, details: None };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
    }
}
