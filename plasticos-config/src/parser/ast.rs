//! AST for the configuration DSL: one node per statement kind.

/// A parsed configuration document: an ordered list of statements. Order is
/// preserved (and round-trips through the pretty-printer) since later
/// `synonym`/`weight`/`tag`/`timeout` statements for the same key are
/// intended to override earlier ones, mirroring how `plasticos-schema`'s
/// `SynonymTable` resolves duplicate keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigDocument {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `synonym "<from>" -> "<to>"` — a single synonym-table entry
    /// (spec.md §4.1: "blown film" → "film").
    Synonym { from: String, to: String },
    /// `weight <name>: <value>` — one entry of `MatchWeights`
    /// (spec.md §4.5's composite scoring weights).
    Weight { name: String, value: f64 },
    /// `tag <block_name>: strategic|domain-safe` — a Reasoning Block
    /// Registry exposure tag (spec.md §4.6).
    Tag { block_name: String, exposure: Exposure },
    /// `timeout <name>: <seconds>` — one of the timeout knobs enumerated in
    /// spec.md §6 (`job_timeout_seconds`, `retrieval_timeout_seconds`,
    /// `llm_timeout_seconds`, `reconciliation_interval_seconds`).
    Timeout { name: String, seconds: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    Strategic,
    DomainSafe,
}
