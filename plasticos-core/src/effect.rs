//! "Errors as effects": the wrapper used at crate and stage boundaries so
//! that retries, compensations, and pending states are first-class and
//! serializable for checkpointing (spec §7, §9 "Implicit error propagation").
//!
//! Internal code uses plain `Result<T, PlasticError>`. `Effect<T>` is reserved
//! for boundaries: Research DAG stage outputs, Matching Engine results, and
//! API responses, where a caller needs to distinguish "failed" from "retry
//! this" from "waiting on something else" rather than collapsing everything
//! into one error arm.

use crate::PlasticError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The outcome of a boundary operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Effect<T> {
    /// Successful result.
    Ok(T),
    /// Terminal, non-retryable error.
    Err(ErrorEffect),
    /// Operation should be retried.
    Retry {
        #[serde(with = "duration_millis")]
        after: Duration,
        attempt: u32,
        max_attempts: u32,
        reason: String,
    },
}

impl<T> Effect<T> {
    pub fn ok(value: T) -> Self {
        Effect::Ok(value)
    }

    pub fn err(error: impl Into<ErrorEffect>) -> Self {
        Effect::Err(error.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Effect::Ok(_))
    }

    pub fn is_retry(&self) -> bool {
        matches!(self, Effect::Retry { .. })
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Effect<U> {
        match self {
            Effect::Ok(v) => Effect::Ok(f(v)),
            Effect::Err(e) => Effect::Err(e),
            Effect::Retry {
                after,
                attempt,
                max_attempts,
                reason,
            } => Effect::Retry {
                after,
                attempt,
                max_attempts,
                reason,
            },
        }
    }

    /// Convert into a `Result`, collapsing `Retry` into an error variant —
    /// used when a caller has exhausted its own retry budget.
    pub fn into_result(self) -> Result<T, ErrorEffect> {
        match self {
            Effect::Ok(v) => Ok(v),
            Effect::Err(e) => Err(e),
            Effect::Retry { reason, .. } => Err(ErrorEffect::Operational {
                message: format!("retry budget exhausted: {reason}"),
            }),
        }
    }
}

impl<T> From<Result<T, PlasticError>> for Effect<T> {
    fn from(result: Result<T, PlasticError>) -> Self {
        match result {
            Ok(v) => Effect::Ok(v),
            Err(e) => Effect::Err(ErrorEffect::from(e)),
        }
    }
}

/// An error surfaced at a boundary. `Domain` errors are part of the business
/// logic (validation failures, gate rejections) and are worth persisting and
/// showing the caller; `Operational` errors are infrastructure concerns
/// (pool exhaustion, disk full) that are fatal to the current request but
/// never crash the service (spec §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ErrorEffect {
    Domain { message: String },
    Operational { message: String },
}

impl std::fmt::Display for ErrorEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorEffect::Domain { message } => write!(f, "domain error: {message}"),
            ErrorEffect::Operational { message } => write!(f, "operational error: {message}"),
        }
    }
}

impl From<PlasticError> for ErrorEffect {
    fn from(err: PlasticError) -> Self {
        match &err {
            PlasticError::Storage(crate::StorageError::PoolExhausted)
            | PlasticError::Storage(crate::StorageError::Unavailable { .. })
            | PlasticError::Configuration(_) => ErrorEffect::Operational {
                message: err.to_string(),
            },
            _ => ErrorEffect::Domain {
                message: err.to_string(),
            },
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StorageError, ValidationError};

    #[test]
    fn domain_error_vs_operational_classification() {
        let validation: PlasticError = ValidationError::RequiredFieldMissing {
            field: "company_name".into(),
        }
        .into();
        assert!(matches!(ErrorEffect::from(validation), ErrorEffect::Domain { .. }));

        let pool: PlasticError = StorageError::PoolExhausted.into();
        assert!(matches!(ErrorEffect::from(pool), ErrorEffect::Operational { .. }));
    }

    #[test]
    fn effect_map_preserves_retry() {
        let effect: Effect<i32> = Effect::Retry {
            after: Duration::from_millis(50),
            attempt: 1,
            max_attempts: 3,
            reason: "transient".into(),
        };
        let mapped = effect.map(|n| n + 1);
        assert!(mapped.is_retry());
    }

    #[test]
    fn effect_from_result_round_trips() {
        let ok: Effect<i32> = Ok::<_, PlasticError>(42).into();
        assert!(ok.is_ok());
        assert_eq!(ok.into_result().unwrap(), 42);
    }
}
