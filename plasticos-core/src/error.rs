//! Error taxonomy for PlasticOS operations (spec §7).
//!
//! Each concern gets its own `thiserror` enum; `PlasticError` unifies them at
//! crate boundaries. Per-record errors (extraction, integration, scoring) are
//! collected into job/match summaries rather than propagated — see
//! `crate::effect` for the retry/compensation-aware error wrapper used at
//! stage boundaries.

use crate::EdgeType;
use thiserror::Error;

/// Input fails schema or business rules. Always recoverable, surfaced to caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("field {field} out of range: {reason}")]
    OutOfRange { field: String, reason: String },

    #[error("contradiction between hyperedge versions for key {key}: {reason}")]
    Contradiction { key: String, reason: String },
}

/// Database or vector index failure. Retried with backoff; fatal for the
/// current write after N attempts.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    #[error("hyperedge not found: {edge_type}/{key}")]
    NotFound { edge_type: EdgeType, key: String },

    #[error("write failed for {edge_type}/{key}: {reason}")]
    WriteFailed {
        edge_type: EdgeType,
        key: String,
        reason: String,
    },

    #[error("connection pool exhausted")]
    PoolExhausted,

    #[error("backend unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Graph projection failure. Logged, queued for retry; never blocks the
/// JSONB write path.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProjectionError {
    #[error("projection failed for {edge_type}/{key}: {reason}")]
    Failed {
        edge_type: EdgeType,
        key: String,
        reason: String,
    },

    #[error("reconciliation scan failed: {reason}")]
    ReconciliationFailed { reason: String },
}

/// External research-client failure. Retried per-query; after N attempts the
/// query is skipped and logged.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RetrievalError {
    #[error("request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited { provider: String, retry_after_ms: i64 },

    #[error("invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("no research client configured")]
    NotConfigured,
}

/// Raw response unparseable or fails canonical validation. The offending
/// record is discarded with a logged reason; the stage continues.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractionError {
    #[error("could not parse retrieval blob: {reason}")]
    Unparseable { reason: String },

    #[error("object failed canonical validation: {0}")]
    Invalid(#[from] ValidationError),
}

/// A reasoning block failed. The calling stage decides: retry once, fall
/// back, or fail.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReasoningBlockError {
    #[error("no block registered under name: {name}")]
    NotRegistered { name: String },

    #[error("block {name} is strategic and cannot be invoked by a domain agent")]
    PermissionDenied { name: String },

    #[error("block {name} failed: {reason}")]
    ExecutionFailed { name: String, reason: String },

    #[error("block {name} produced output that did not match its schema: {reason}")]
    SchemaMismatch { name: String, reason: String },
}

/// Per-call or per-job deadline exceeded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimeoutError {
    #[error("call to {operation} exceeded {deadline_ms}ms")]
    CallExceeded { operation: String, deadline_ms: i64 },

    #[error("job exceeded its overall deadline of {deadline_ms}ms")]
    JobExceeded { deadline_ms: i64 },
}

/// Missing or invalid configuration at startup. Fatal; service refuses to start.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("unknown research client type: {kind}")]
    UnknownResearchClient { kind: String },
}

/// Matching Engine scoring/candidate errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MatchingError {
    #[error("candidate scoring failed for key {key}: {reason}")]
    ScoringFailed { key: String, reason: String },
}

/// Embedding vector errors (dimension mismatches, malformed vectors).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmbeddingError {
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: i32, got: i32 },
}

/// World Model Service aggregate/replay errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorldModelError {
    #[error("hyperedge payload could not be interpreted as {expected}: {reason}")]
    MalformedPayload { expected: String, reason: String },

    #[error("log replay failed: {reason}")]
    ReplayFailed { reason: String },

    #[error("no aggregate recorded for key: {key}")]
    UnknownKey { key: String },
}

/// Master error type unifying every concern.
#[derive(Debug, Clone, Error)]
pub enum PlasticError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("reasoning block error: {0}")]
    ReasoningBlock(#[from] ReasoningBlockError),

    #[error("timeout: {0}")]
    Timeout(#[from] TimeoutError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("matching error: {0}")]
    Matching(#[from] MatchingError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("world model error: {0}")]
    WorldModel(#[from] WorldModelError),
}

/// Result alias for PlasticOS operations.
pub type PlasticResult<T> = Result<T, PlasticError>;
