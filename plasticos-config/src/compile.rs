//! Compiles a parsed [`ConfigDocument`] into the concrete configuration
//! objects the rest of the workspace consumes: `plasticos-schema`'s
//! `SynonymTable`, `plasticos-core`'s `MatchWeights`, the Reasoning Block
//! Registry's exposure tags, and the pipeline's named timeouts. Mirrors the
//! teacher's DSL-to-runtime-config compilation step, retargeted from
//! memory-policy/adapter objects to this domain's four concerns.

use std::collections::BTreeMap;
use std::time::Duration;

use plasticos_core::{BlockExposure, MatchWeights};
use plasticos_schema::SynonymTable;

use crate::parser::{ConfigDocument, Exposure, Statement};

/// A `name -> Duration` timeout table, keyed by the names enumerated in
/// spec.md §6 (`job_timeout_seconds`, `retrieval_timeout_seconds`,
/// `llm_timeout_seconds`, `reconciliation_interval_seconds`).
#[derive(Debug, Clone, Default)]
pub struct TimeoutTable(BTreeMap<String, Duration>);

impl TimeoutTable {
    pub fn get(&self, name: &str) -> Option<Duration> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A `block_name -> BlockExposure` tag table, built from `tag` statements,
/// consumed by `plasticos-reasoning::BlockRegistry` to override a block's
/// compiled-in default exposure.
#[derive(Debug, Clone, Default)]
pub struct TagTable(BTreeMap<String, BlockExposure>);

impl TagTable {
    pub fn get(&self, block_name: &str) -> Option<BlockExposure> {
        self.0.get(block_name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The three runtime objects a [`ConfigDocument`] compiles into, plus the
/// raw weight overrides (partial — missing entries fall back to
/// `MatchWeights::default()`'s corresponding field).
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    pub synonyms: SynonymTable,
    pub match_weights: MatchWeights,
    pub tags: TagTable,
    pub timeouts: TimeoutTable,
}

/// Compilation errors: a `weight`/`tag` statement referenced a name this
/// workspace doesn't recognize. Unlike parse errors, these are caught only
/// after the document is syntactically valid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("unknown match weight \"{0}\" (expected one of: vector_similarity, rule_fit, repeat_business, world_model_buyer_score, lane_risk_penalty)")]
    UnknownWeight(String),
}

pub fn compile(doc: &ConfigDocument) -> Result<CompiledConfig, CompileError> {
    let mut synonyms = Vec::new();
    let mut weights = MatchWeights::default();
    let mut tags = BTreeMap::new();
    let mut timeouts = BTreeMap::new();

    for statement in &doc.statements {
        match statement {
            Statement::Synonym { from, to } => synonyms.push((from.clone(), to.clone())),
            Statement::Weight { name, value } => apply_weight(&mut weights, name, *value)?,
            Statement::Tag { block_name, exposure } => {
                let exposure = match exposure {
                    Exposure::Strategic => BlockExposure::Strategic,
                    Exposure::DomainSafe => BlockExposure::DomainSafe,
                };
                tags.insert(block_name.clone(), exposure);
            }
            Statement::Timeout { name, seconds } => {
                timeouts.insert(name.clone(), Duration::from_secs(*seconds));
            }
        }
    }

    Ok(CompiledConfig {
        synonyms: SynonymTable::new(synonyms),
        match_weights: weights,
        tags: TagTable(tags),
        timeouts: TimeoutTable(timeouts),
    })
}

fn apply_weight(weights: &mut MatchWeights, name: &str, value: f64) -> Result<(), CompileError> {
    let value = value as f32;
    match name {
        "vector_similarity" => weights.vector_similarity = value,
        "rule_fit" => weights.rule_fit = value,
        "repeat_business" => weights.repeat_business = value,
        "world_model_buyer_score" | "world_model" => weights.world_model_buyer_score = value,
        "lane_risk_penalty" | "lane_risk" => weights.lane_risk_penalty = value,
        other => return Err(CompileError::UnknownWeight(other.to_string())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    #[test]
    fn compiles_synonyms_weights_tags_and_timeouts() {
        let src = r#"
            synonym "blown film" -> "film"
            weight vector_similarity: 0.4
            weight rule_fit: 0.3
            tag strategic_decomposition: strategic
            tag rule_gate_check: domain-safe
            timeout job_timeout_seconds: 300
        "#;
        let doc = Parser::parse_str(src).unwrap();
        let compiled = compile(&doc).unwrap();

        assert_eq!(compiled.synonyms.normalize("Blown Film"), "film");
        assert_eq!(compiled.match_weights.vector_similarity, 0.4);
        assert_eq!(compiled.match_weights.rule_fit, 0.3);
        // Untouched weight falls back to the default.
        assert_eq!(compiled.match_weights.repeat_business, MatchWeights::default().repeat_business);
        assert_eq!(compiled.tags.get("strategic_decomposition"), Some(BlockExposure::Strategic));
        assert_eq!(compiled.tags.get("rule_gate_check"), Some(BlockExposure::DomainSafe));
        assert_eq!(compiled.timeouts.get("job_timeout_seconds"), Some(Duration::from_secs(300)));
    }

    #[test]
    fn rejects_unknown_weight_name() {
        let doc = Parser::parse_str("weight not_a_real_weight: 0.5").unwrap();
        assert!(matches!(compile(&doc), Err(CompileError::UnknownWeight(name)) if name == "not_a_real_weight"));
    }
}
