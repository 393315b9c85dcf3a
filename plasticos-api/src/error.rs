//! Structured error responses for the API layer.
//!
//! Every handler returns `ApiResult<T>`; `ApiError` serializes as a JSON
//! body with a machine-readable `code` plus a human message, and carries
//! its own HTTP status so handlers never juggle `StatusCode` directly.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use plasticos_core::{ErrorEffect, PlasticError, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationFailed,
    InvalidInput,
    MissingField,

    HyperedgeNotFound,

    InternalError,
    ServiceUnavailable,
    Timeout,
    TooManyRequests,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed | ErrorCode::InvalidInput | ErrorCode::MissingField => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::HyperedgeNotFound => StatusCode::NOT_FOUND,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::MissingField, format!("required field '{field}' is missing"))
    }

    pub fn hyperedge_not_found(edge_type: impl fmt::Display, key: &str) -> Self {
        Self::new(ErrorCode::HyperedgeNotFound, format!("{edge_type} '{key}' not found"))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn timeout(operation: &str) -> Self {
        Self::new(ErrorCode::Timeout, format!("operation '{operation}' timed out"))
    }

    pub fn too_many_requests() -> Self {
        Self::new(ErrorCode::TooManyRequests, "rate limit exceeded")
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

/// `PlasticError` always maps to a 500 here — by the time one reaches the
/// API layer it has already skipped the chance to be handled as a
/// `ValidationError` closer to its source (request DTO validation does
/// that instead).
impl From<PlasticError> for ApiError {
    fn from(err: PlasticError) -> Self {
        tracing::error!(error = %err, "unhandled core error");
        ApiError::internal_error(err.to_string())
    }
}

/// Caught directly at request-DTO validation, ahead of `PlasticError`'s
/// blanket 500 mapping, so a malformed payload reads as a 400.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation_failed(err.to_string())
    }
}

/// `ErrorEffect` only distinguishes domain-vs-operational, having already
/// discarded which `PlasticError` variant it came from — good enough to
/// pick a status code, not to recover the original taxonomy.
impl From<ErrorEffect> for ApiError {
    fn from(err: ErrorEffect) -> Self {
        match err {
            ErrorEffect::Domain { message } => ApiError::validation_failed(message),
            ErrorEffect::Operational { message } => {
                tracing::error!(%message, "operational error reached API layer");
                ApiError::service_unavailable(message)
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ErrorCode::ValidationFailed.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::HyperedgeNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::ServiceUnavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ErrorCode::InternalError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn serializes_as_screaming_snake_case() {
        let err = ApiError::validation_failed("bad polymer");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("VALIDATION_FAILED"));
        assert!(json.contains("bad polymer"));
    }

    #[test]
    fn error_effect_domain_maps_to_validation_failed() {
        let err: ApiError = ErrorEffect::Domain { message: "missing polymer".to_string() }.into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn error_effect_operational_maps_to_service_unavailable() {
        let err: ApiError = ErrorEffect::Operational { message: "pool exhausted".to_string() }.into();
        assert_eq!(err.code, ErrorCode::ServiceUnavailable);
    }
}
