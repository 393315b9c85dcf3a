//! PlasticOS API - thin Axum HTTP wrapper over the research, matching, and
//! world-model core.
//!
//! Everything here is plumbing: request/response DTOs, structured errors,
//! CORS/rate-limit configuration, and a router merged against one
//! `AppState`. All of the system's actual reasoning lives in the
//! `plasticos-research`, `plasticos-matching`, `plasticos-worldmodel`, and
//! `plasticos-reasoning` crates this one depends on.

pub mod config;
pub mod error;
pub mod macros;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
