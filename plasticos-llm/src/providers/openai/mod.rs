//! OpenAI provider: embeddings, summarization, and a generic research client.

pub mod client;
pub mod embedding;
pub mod research;
pub mod summarization;
pub mod types;

pub use client::OpenAIClient;
pub use embedding::OpenAIEmbeddingProvider;
pub use research::OpenAIResearchClient;
pub use summarization::OpenAISummarizationProvider;
