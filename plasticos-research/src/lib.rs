//! Research DAG orchestration for PlasticOS (the "Research Factory", spec
//! §4.4): five ordered stages — Meta-Plan, Superprompt, Retrieval,
//! Extraction/Canonicalization, Integration — that turn a free-text research
//! goal into hyperedges written to the hypergraph store and observed by the
//! World Model.
//!
//! Stage handoff is a typed [`context::ResearchContext`] rather than an
//! untyped map: each stage appends a distinct [`context::StageOutput`]
//! variant, so a stage's input contract is enforced by the type system
//! instead of by convention. [`pipeline::ResearchPipeline`] drives the five
//! stages in strict order and enforces the job-level deadline.

pub mod context;
pub mod pipeline;
pub mod stages;

pub use context::{JobOutcome, JobSpec, JobSummary, PlannedQuery, RawRetrievalResult, ResearchContext, SchemaPrompt};
pub use pipeline::{PipelineConfig, ResearchPipeline};
pub use stages::{ExtractionStage, IntegrationStage, MetaPlanStage, RetrievalStage, SuperpromptStage};
