//! Gemini research client.

pub mod client;
pub mod research;
pub mod types;

pub use client::GeminiClient;
pub use research::GeminiResearchClient;
