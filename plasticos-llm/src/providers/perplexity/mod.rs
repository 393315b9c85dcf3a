//! Perplexity research client.

pub mod client;
pub mod research;
pub mod types;

pub use client::PerplexityClient;
pub use research::PerplexityResearchClient;
