//! The five stages of the Research DAG (spec §4.4), one module each.

pub mod extraction;
pub mod integration;
pub mod meta_plan;
pub mod retrieval;
pub mod superprompt;

pub use extraction::ExtractionStage;
pub use integration::IntegrationStage;
pub use meta_plan::MetaPlanStage;
pub use retrieval::RetrievalStage;
pub use superprompt::SuperpromptStage;
