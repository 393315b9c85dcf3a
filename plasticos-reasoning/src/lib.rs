//! Reasoning Block Registry: named, tagged, composable reasoning steps
//! shared by the Research DAG and the Matching Engine (spec §4.6).
//!
//! Three block shapes implement [`ReasoningBlock`]: [`DeterministicBlock`]
//! wraps a pure function, [`LlmBlock`] wraps a [`plasticos_llm::SummarizationProvider`]
//! call behind a typed prompt template, and [`CompositeBlock`] runs an
//! ordered sequence of other blocks, feeding each block's output forward as
//! the next block's input.
//!
//! Every registered block carries a [`BlockExposure`]: `Strategic` blocks
//! may only be invoked by the Research DAG itself; `DomainSafe` blocks may
//! also be invoked on behalf of a domain-facing caller (the Matching
//! Engine, or a future domain-agent surface). This mirrors the
//! permission-scope shape multi-agent systems use to separate "own" access
//! from "global" access, applied here to reasoning-block exposure instead
//! of memory regions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
pub use plasticos_core::BlockExposure;
use plasticos_core::{Effect, PlasticError, ReasoningBlockError};
use plasticos_llm::{SummarizationProvider, SummarizeConfig, SummarizeStyle};
use serde_json::Value;

/// Who is invoking a block. `Strategic` blocks refuse a `DomainCaller`
/// invocation (spec §4.6, §9's Open Question on distinguishing strategic
/// vs domain-safe blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationContext {
    /// The Research DAG itself, or another internal strategic caller.
    Strategic,
    /// The Matching Engine, or any other domain-facing caller.
    DomainCaller,
}

fn exposure_permits(exposure: BlockExposure, context: InvocationContext) -> bool {
    match (exposure, context) {
        (BlockExposure::DomainSafe, _) => true,
        (BlockExposure::Strategic, InvocationContext::Strategic) => true,
        (BlockExposure::Strategic, InvocationContext::DomainCaller) => false,
    }
}

/// A single reasoning step: takes a JSON input, produces a JSON output or a
/// structured failure.
#[async_trait]
pub trait ReasoningBlock: Send + Sync {
    async fn invoke(&self, input: Value) -> Effect<Value>;
}

/// Wraps a pure function. No I/O, no LLM call — synonym tables, gate
/// checks, and scoring formulas all take this shape.
pub struct DeterministicBlock {
    name: String,
    func: Box<dyn Fn(Value) -> Result<Value, PlasticError> + Send + Sync>,
}

impl DeterministicBlock {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(Value) -> Result<Value, PlasticError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

#[async_trait]
impl ReasoningBlock for DeterministicBlock {
    async fn invoke(&self, input: Value) -> Effect<Value> {
        match (self.func)(input) {
            Ok(output) => Effect::Ok(output),
            Err(e) => Effect::err(ReasoningBlockError::ExecutionFailed {
                name: self.name.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Wraps a single LLM call behind a typed prompt template: `prompt_fn`
/// turns the JSON input into the text sent to the provider, `output_key`
/// names the field the provider's response is wrapped under in the output
/// JSON.
pub struct LlmBlock {
    name: String,
    provider: Arc<dyn SummarizationProvider>,
    prompt_fn: Box<dyn Fn(&Value) -> Result<String, PlasticError> + Send + Sync>,
    output_key: String,
    config: SummarizeConfig,
}

impl LlmBlock {
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn SummarizationProvider>,
        output_key: impl Into<String>,
        prompt_fn: impl Fn(&Value) -> Result<String, PlasticError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            prompt_fn: Box::new(prompt_fn),
            output_key: output_key.into(),
            config: SummarizeConfig {
                max_tokens: 256,
                style: SummarizeStyle::Brief,
            },
        }
    }

    pub fn with_config(mut self, config: SummarizeConfig) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl ReasoningBlock for LlmBlock {
    async fn invoke(&self, input: Value) -> Effect<Value> {
        let prompt = match (self.prompt_fn)(&input) {
            Ok(prompt) => prompt,
            Err(e) => {
                return Effect::err(ReasoningBlockError::ExecutionFailed {
                    name: self.name.clone(),
                    reason: e.to_string(),
                });
            }
        };

        match self.provider.summarize(&prompt, &self.config).await {
            Ok(response) => Effect::Ok(serde_json::json!({ self.output_key.clone(): response })),
            Err(e) => Effect::err(ReasoningBlockError::ExecutionFailed {
                name: self.name.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Runs an ordered sequence of other blocks, threading each block's output
/// forward as the next block's input. The composite's own output is the
/// last block's output.
pub struct CompositeBlock {
    name: String,
    steps: Vec<Arc<dyn ReasoningBlock>>,
}

impl CompositeBlock {
    pub fn new(name: impl Into<String>, steps: Vec<Arc<dyn ReasoningBlock>>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }
}

#[async_trait]
impl ReasoningBlock for CompositeBlock {
    async fn invoke(&self, input: Value) -> Effect<Value> {
        let mut current = input;
        for step in &self.steps {
            match step.invoke(current).await {
                Effect::Ok(output) => current = output,
                Effect::Err(e) => return Effect::Err(e),
                Effect::Retry { after, attempt, max_attempts, reason } => {
                    return Effect::Retry { after, attempt, max_attempts, reason };
                }
            }
        }
        Effect::Ok(current)
    }
}

struct RegisteredBlock {
    block: Arc<dyn ReasoningBlock>,
    exposure: BlockExposure,
    tags: Vec<String>,
}

/// Immutable-after-construction map from block name to block. Built once at
/// startup from a static table (see [`BlockRegistry::with_default_blocks`]);
/// concurrent `invoke` calls need no lock since nothing mutates after
/// construction.
pub struct BlockRegistry {
    blocks: HashMap<String, RegisteredBlock>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            blocks: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        block: Arc<dyn ReasoningBlock>,
        exposure: BlockExposure,
        tags: Vec<String>,
    ) {
        self.blocks.insert(
            name.into(),
            RegisteredBlock {
                block,
                exposure,
                tags,
            },
        );
    }

    /// Invokes a registered block by name, enforcing [`BlockExposure`]
    /// against the caller's [`InvocationContext`].
    pub async fn invoke(&self, name: &str, input: Value, context: InvocationContext) -> Effect<Value> {
        let Some(registered) = self.blocks.get(name) else {
            return Effect::err(ReasoningBlockError::NotRegistered { name: name.to_string() });
        };

        if !exposure_permits(registered.exposure, context) {
            return Effect::err(ReasoningBlockError::PermissionDenied { name: name.to_string() });
        }

        registered.block.invoke(input).await
    }

    /// Names of every block carrying `tag`.
    pub fn list(&self, tag: &str) -> Vec<&str> {
        self.blocks
            .iter()
            .filter(|(_, registered)| registered.tags.iter().any(|t| t == tag))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Known plastics synonyms normalized to a canonical polymer abbreviation.
/// A small starter table; `plasticos-config`'s synonym tables extend this
/// at runtime rather than requiring a rebuild.
const POLYMER_SYNONYMS: &[(&str, &str)] = &[
    ("polyethylene terephthalate", "PET"),
    ("high density polyethylene", "HDPE"),
    ("low density polyethylene", "LDPE"),
    ("polyvinyl chloride", "PVC"),
    ("polypropylene", "PP"),
    ("polystyrene", "PS"),
];

fn synonym_normalize_fn(input: Value) -> Result<Value, PlasticError> {
    let text = input
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| ReasoningBlockError::SchemaMismatch {
            name: "synonym_normalize".into(),
            reason: "expected a \"text\" string field".into(),
        })?;

    let lower = text.to_lowercase();
    let normalized = POLYMER_SYNONYMS
        .iter()
        .find(|(alias, _)| lower.contains(alias))
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(text.to_string());

    Ok(serde_json::json!({ "normalized": normalized }))
}

fn completeness_score_fn(input: Value) -> Result<Value, PlasticError> {
    let fields = input
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| ReasoningBlockError::SchemaMismatch {
            name: "completeness_score".into(),
            reason: "expected a \"fields\" object".into(),
        })?;

    if fields.is_empty() {
        return Ok(serde_json::json!({ "completeness_score": 0.0 }));
    }

    let present = fields
        .values()
        .filter(|v| !v.is_null() && v != &&Value::String(String::new()))
        .count();
    let score = present as f32 / fields.len() as f32;

    Ok(serde_json::json!({ "completeness_score": score }))
}

fn rule_gate_check_fn(input: Value) -> Result<Value, PlasticError> {
    let mut reasons = Vec::new();

    if let (Some(mfi), Some(min), Some(max)) = (
        input.get("candidate_mfi").and_then(Value::as_f64),
        input.get("mfi_min").and_then(Value::as_f64),
        input.get("mfi_max").and_then(Value::as_f64),
    ) {
        if mfi < min || mfi > max {
            reasons.push(format!("MFI {mfi} outside [{min}, {max}]"));
        }
    }

    if let (Some(ppm), Some(max_ppm)) = (
        input.get("candidate_ppm").and_then(Value::as_f64),
        input.get("max_ppm").and_then(Value::as_f64),
    ) {
        if ppm > max_ppm {
            reasons.push(format!("contamination {ppm}ppm exceeds {max_ppm}ppm"));
        }
    }

    if let (Some(banned), Some(contaminants)) = (
        input.get("banned").and_then(Value::as_array),
        input.get("candidate_contaminants").and_then(Value::as_array),
    ) {
        for contaminant in contaminants {
            if banned.contains(contaminant) {
                reasons.push(format!("banned contaminant present: {contaminant}"));
            }
        }
    }

    Ok(serde_json::json!({ "passed": reasons.is_empty(), "reasons": reasons }))
}

fn repeat_business_boost_fn(input: Value) -> Result<Value, PlasticError> {
    let transaction_count = input.get("transaction_count").and_then(Value::as_u64).unwrap_or(0);
    let repeat_business_count = input.get("repeat_business_count").and_then(Value::as_u64).unwrap_or(0);

    let boost = if transaction_count == 0 {
        0.0
    } else {
        repeat_business_count as f32 / transaction_count as f32
    };

    Ok(serde_json::json!({ "repeat_business_boost": boost }))
}

fn ambiguity_resolve_prompt(input: &Value) -> Result<String, PlasticError> {
    let a = input.get("option_a").and_then(Value::as_str).unwrap_or_default();
    let b = input.get("option_b").and_then(Value::as_str).unwrap_or_default();
    Ok(format!(
        "Two candidate readings of the same buyer criteria were extracted:\n\
         A: {a}\nB: {b}\n\
         Pick the one more consistent with standard plastics-brokerage usage, \
         and explain briefly why."
    ))
}

fn explanation_synthesize_prompt(input: &Value) -> Result<String, PlasticError> {
    let company = input.get("company_name").and_then(Value::as_str).unwrap_or("the buyer");
    let score = input.get("composite_score").and_then(Value::as_f64).unwrap_or(0.0);
    Ok(format!(
        "Write a one-sentence explanation of why this supplier offering scored \
         {score:.2} as a match for {company}, based on the scoring components provided."
    ))
}

impl BlockRegistry {
    /// Builds the registry's default block table (spec §4.6): the seven
    /// integration points the Research DAG and Matching Engine call by
    /// name.
    pub fn with_default_blocks(llm: Arc<dyn SummarizationProvider>) -> Self {
        let mut registry = Self::new();

        let synonym_normalize: Arc<dyn ReasoningBlock> =
            Arc::new(DeterministicBlock::new("synonym_normalize", synonym_normalize_fn));
        registry.register(
            "synonym_normalize",
            synonym_normalize.clone(),
            BlockExposure::DomainSafe,
            vec!["extraction".into()],
        );

        let completeness_score: Arc<dyn ReasoningBlock> =
            Arc::new(DeterministicBlock::new("completeness_score", completeness_score_fn));
        registry.register(
            "completeness_score",
            completeness_score.clone(),
            BlockExposure::DomainSafe,
            vec!["extraction".into()],
        );

        registry.register(
            "rule_gate_check",
            Arc::new(DeterministicBlock::new("rule_gate_check", rule_gate_check_fn)),
            BlockExposure::DomainSafe,
            vec!["matching".into()],
        );

        registry.register(
            "repeat_business_boost",
            Arc::new(DeterministicBlock::new("repeat_business_boost", repeat_business_boost_fn)),
            BlockExposure::DomainSafe,
            vec!["matching".into()],
        );

        registry.register(
            "ambiguity_resolve",
            Arc::new(LlmBlock::new(
                "ambiguity_resolve",
                llm.clone(),
                "resolution",
                ambiguity_resolve_prompt,
            )),
            BlockExposure::DomainSafe,
            vec!["extraction".into()],
        );

        registry.register(
            "explanation_synthesize",
            Arc::new(LlmBlock::new(
                "explanation_synthesize",
                llm,
                "explanation",
                explanation_synthesize_prompt,
            )),
            BlockExposure::DomainSafe,
            vec!["matching".into()],
        );

        registry.register(
            "strategic_decomposition",
            Arc::new(CompositeBlock::new(
                "strategic_decomposition",
                vec![synonym_normalize, completeness_score],
            )),
            BlockExposure::Strategic,
            vec!["research".into()],
        );

        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubSummarizer;

    #[async_trait]
    impl SummarizationProvider for StubSummarizer {
        async fn summarize(&self, content: &str, _config: &SummarizeConfig) -> plasticos_core::PlasticResult<String> {
            Ok(format!("stub summary of: {content}"))
        }
    }

    fn registry() -> BlockRegistry {
        BlockRegistry::with_default_blocks(Arc::new(StubSummarizer))
    }

    fn unwrap_ok(effect: Effect<Value>) -> Value {
        match effect {
            Effect::Ok(v) => v,
            Effect::Err(e) => panic!("expected Ok, got Err: {e}"),
            Effect::Retry { reason, .. } => panic!("expected Ok, got Retry: {reason}"),
        }
    }

    #[tokio::test]
    async fn unregistered_block_is_rejected() {
        let registry = registry();
        let result = registry
            .invoke("nonexistent", serde_json::json!({}), InvocationContext::Strategic)
            .await;
        assert!(matches!(result, Effect::Err(_)));
    }

    #[tokio::test]
    async fn strategic_block_rejects_domain_caller() {
        let registry = registry();
        let result = registry
            .invoke(
                "strategic_decomposition",
                serde_json::json!({ "text": "polypropylene" }),
                InvocationContext::DomainCaller,
            )
            .await;
        assert!(matches!(result, Effect::Err(_)));
    }

    #[tokio::test]
    async fn strategic_block_permits_strategic_caller() {
        let registry = registry();
        let output = unwrap_ok(
            registry
                .invoke(
                    "strategic_decomposition",
                    serde_json::json!({ "text": "polypropylene resin" }),
                    InvocationContext::Strategic,
                )
                .await,
        );
        assert!(output.get("normalized").is_some());
    }

    #[tokio::test]
    async fn synonym_normalize_maps_known_aliases() {
        let registry = registry();
        let output = unwrap_ok(
            registry
                .invoke(
                    "synonym_normalize",
                    serde_json::json!({ "text": "high density polyethylene pellets" }),
                    InvocationContext::DomainCaller,
                )
                .await,
        );
        assert_eq!(output["normalized"], "HDPE");
    }

    #[tokio::test]
    async fn completeness_score_counts_non_empty_fields() {
        let registry = registry();
        let output = unwrap_ok(
            registry
                .invoke(
                    "completeness_score",
                    serde_json::json!({ "fields": { "a": "x", "b": "", "c": "y" } }),
                    InvocationContext::DomainCaller,
                )
                .await,
        );
        let score = output["completeness_score"].as_f64().unwrap();
        assert!((score - (2.0 / 3.0)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn rule_gate_check_flags_out_of_window_mfi() {
        let registry = registry();
        let output = unwrap_ok(
            registry
                .invoke(
                    "rule_gate_check",
                    serde_json::json!({ "candidate_mfi": 12.0, "mfi_min": 1.0, "mfi_max": 5.0 }),
                    InvocationContext::DomainCaller,
                )
                .await,
        );
        assert_eq!(output["passed"], false);
    }

    #[tokio::test]
    async fn repeat_business_boost_is_zero_with_no_transactions() {
        let registry = registry();
        let output = unwrap_ok(
            registry
                .invoke(
                    "repeat_business_boost",
                    serde_json::json!({ "transaction_count": 0 }),
                    InvocationContext::DomainCaller,
                )
                .await,
        );
        assert_eq!(output["repeat_business_boost"], 0.0);
    }

    #[tokio::test]
    async fn ambiguity_resolve_calls_the_llm_provider() {
        let registry = registry();
        let output = unwrap_ok(
            registry
                .invoke(
                    "ambiguity_resolve",
                    serde_json::json!({ "option_a": "HDPE natural", "option_b": "HDPE colored" }),
                    InvocationContext::DomainCaller,
                )
                .await,
        );
        assert!(output["resolution"].as_str().unwrap().starts_with("stub summary of:"));
    }

    #[test]
    fn list_filters_by_tag() {
        let registry = registry();
        let matching_tags = registry.list("matching");
        assert!(matching_tags.contains(&"rule_gate_check"));
        assert!(matching_tags.contains(&"repeat_business_boost"));
        assert!(!matching_tags.contains(&"synonym_normalize"));
    }
}
