//! Typed stage-handoff context for the Research DAG (spec §4.4).
//!
//! The source pipeline passed an untyped dict between stages; here each
//! stage's output is a distinct [`StageOutput`] variant appended to an
//! ordered `Vec` on [`ResearchContext`]. Downstream stages read prior
//! outputs through the typed accessors rather than indexing into a dict by
//! string key, so a stage's input contract is checked at compile time.

use plasticos_core::{EntityIdType, JobId, JobStatus, QueryId};
use plasticos_schema::CanonicalPayload;
use serde::{Deserialize, Serialize};

/// The research goal handed to `MetaPlanStage`. Mirrors the `POST
/// /research/run` request body (spec §6) field-for-field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JobSpec {
    pub domain: String,
    pub polymer: String,
    pub regions: Vec<String>,
    /// How many sub-queries `MetaPlanStage` may decompose the goal into.
    pub depth: u32,
    pub max_results: u32,
}

/// Retrieval parameters attached to a single planned query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RetrievalParams {
    pub max_results: u32,
}

/// A single typed query descriptor produced by `MetaPlanStage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlannedQuery {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub query_id: QueryId,
    pub polymer: String,
    pub region: Option<String>,
    /// Free-text scope handed to the superprompt stage, e.g. "new buyers for
    /// HDPE film in the US Gulf Coast".
    pub scope: String,
    pub depth: u32,
    pub retrieval_params: RetrievalParams,
}

/// A schema-constrained prompt targeting the canonical BCP shape, ready to
/// send to a `ResearchClient`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SchemaPrompt {
    pub query_id: QueryId,
    pub text: String,
}

/// The unparsed text/JSON blob returned by a `ResearchClient` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RawRetrievalResult {
    pub query_id: QueryId,
    pub batch_index: u32,
    pub raw_text: String,
}

/// A validated, canonicalized payload ready for integration, plus the
/// bookkeeping extraction computed along the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExtractedRecord {
    pub query_id: QueryId,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub payload: CanonicalPayload,
    pub completeness: f32,
}

/// One stage's contribution to the pipeline, appended to
/// [`ResearchContext::outputs`] in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageOutput {
    MetaPlan { planned_queries: Vec<PlannedQuery> },
    Superprompt { prompts: Vec<SchemaPrompt> },
    Retrieval { results: Vec<RawRetrievalResult> },
    Extraction { records: Vec<ExtractedRecord> },
    Integration { summary: JobSummary },
}

/// Immutable, append-only state handoff between stages (spec §4.4 "state
/// handoff"). Each stage receives `&ResearchContext` and returns a new
/// `StageOutput` to be appended; it never mutates prior outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResearchContext {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub job_id: JobId,
    pub spec: JobSpec,
    pub outputs: Vec<StageOutput>,
}

impl ResearchContext {
    pub fn new(spec: JobSpec) -> Self {
        Self {
            job_id: JobId::now_v7(),
            spec,
            outputs: Vec::new(),
        }
    }

    pub fn push(&mut self, output: StageOutput) {
        self.outputs.push(output);
    }

    pub fn planned_queries(&self) -> Option<&[PlannedQuery]> {
        self.outputs.iter().find_map(|o| match o {
            StageOutput::MetaPlan { planned_queries } => Some(planned_queries.as_slice()),
            _ => None,
        })
    }

    pub fn schema_prompts(&self) -> Option<&[SchemaPrompt]> {
        self.outputs.iter().find_map(|o| match o {
            StageOutput::Superprompt { prompts } => Some(prompts.as_slice()),
            _ => None,
        })
    }

    pub fn retrieval_results(&self) -> Option<&[RawRetrievalResult]> {
        self.outputs.iter().find_map(|o| match o {
            StageOutput::Retrieval { results } => Some(results.as_slice()),
            _ => None,
        })
    }

    pub fn extracted_records(&self) -> Option<&[ExtractedRecord]> {
        self.outputs.iter().find_map(|o| match o {
            StageOutput::Extraction { records } => Some(records.as_slice()),
            _ => None,
        })
    }
}

/// Returned by `IntegrationStage`, and surfaced verbatim in the `POST
/// /research/run` response (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JobSummary {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub job_id: JobId,
    pub planned_queries: usize,
    pub retrieval_batches: usize,
    pub bcps_written: usize,
    pub integration_result: JobStatus,
    pub warnings: Vec<String>,
}

/// The outcome of a full job run: either every stage completed, or the
/// pipeline halted at a labeled failure point with whatever context had
/// accumulated so far (spec §4.4 "ordering guarantee").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    Completed { summary: JobSummary },
    Partial {
        failed_stage: String,
        reason: String,
        context: ResearchContext,
    },
}
