//! Shared application state for Axum routers.

use std::sync::Arc;

use plasticos_llm::EmbeddingProvider;
use plasticos_matching::MatchingEngine;
use plasticos_reasoning::BlockRegistry;
use plasticos_research::ResearchPipeline;
use plasticos_storage::HypergraphStore;
use plasticos_worldmodel::WorldModelService;

/// Application-wide state shared across all routes. Every field is an
/// `Arc`, injected once at startup rather than re-resolved per request
/// (spec's dependency-injection convention, carried from the research
/// pipeline and matching engine into the one crate that wires them up).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn HypergraphStore>,
    pub world_model: Arc<WorldModelService>,
    pub research: Arc<ResearchPipeline>,
    pub matching: Arc<MatchingEngine>,
    pub reasoning: Arc<BlockRegistry>,
    /// Used directly by `GET /bcp/top_k` to embed the query text; the
    /// matching engine holds its own copy for candidate generation.
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub start_time: std::time::Instant,
}

crate::impl_from_ref!(Arc<dyn HypergraphStore>, store);
crate::impl_from_ref!(Arc<WorldModelService>, world_model);
crate::impl_from_ref!(Arc<ResearchPipeline>, research);
crate::impl_from_ref!(Arc<MatchingEngine>, matching);
crate::impl_from_ref!(Arc<BlockRegistry>, reasoning);
crate::impl_from_ref!(Arc<dyn EmbeddingProvider>, embeddings);
crate::impl_from_ref!(std::time::Instant, start_time);
