//! Step 6: explanation generation (spec §4.5). Assembles a structured
//! account of why a candidate ranked where it did, then asks the
//! `explanation_synthesize` reasoning block for a one-line narrative on top.

use plasticos_core::Effect;
use plasticos_reasoning::{BlockRegistry, InvocationContext};

use crate::enrichment::StructuralSignals;
use crate::gates::RuleGateReport;
use crate::scoring::ScoreBreakdown;

/// Everything a reader needs to understand why this candidate ranked where
/// it did, without re-deriving the scoring math.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MatchExplanation {
    pub gates_passed: Vec<String>,
    pub gates_low_confidence: bool,
    pub repeat_business_summary: String,
    pub lane_precedent_summary: String,
    pub world_model_summary: String,
    /// `None` when the LLM narrative block could not be reached; the
    /// structured fields above still stand on their own.
    pub narrative: Option<String>,
}

#[allow(clippy::too_many_arguments)]
pub async fn build_explanation(
    registry: &BlockRegistry,
    gate_report: &RuleGateReport,
    low_confidence: bool,
    signals: &StructuralSignals,
    buyer_score: f32,
    lane_risk: f32,
    score: &ScoreBreakdown,
    bcp_company_name: &str,
) -> MatchExplanation {
    let gates_passed = gate_report
        .checks
        .iter()
        .filter(|c| c.result == plasticos_core::GateResult::Passed)
        .map(|c| c.name.clone())
        .collect();

    let repeat_business_summary = if signals.repeat_transaction_count == 0 {
        "no prior transactions between this supplier and buyer".to_string()
    } else {
        format!(
            "{} prior transaction(s), {} completed",
            signals.repeat_transaction_count, signals.repeat_completed_count
        )
    };

    let lane_precedent_summary = if signals.lane_precedent_count == 0 {
        "no precedent on this lane".to_string()
    } else {
        format!("{} prior shipment(s) on this lane", signals.lane_precedent_count)
    };

    let world_model_summary = format!("buyer_score={buyer_score:.2}, lane_risk={lane_risk:.2}");

    let prompt_input = serde_json::json!({
        "buyer_company_name": bcp_company_name,
        "composite_score": score.composite,
        "gates_passed": gates_passed,
        "repeat_business_summary": repeat_business_summary,
        "lane_precedent_summary": lane_precedent_summary,
        "world_model_summary": world_model_summary,
    });

    let narrative = match registry.invoke("explanation_synthesize", prompt_input, InvocationContext::DomainCaller).await {
        Effect::Ok(output) => output.get("explanation").and_then(|v| v.as_str()).map(String::from),
        Effect::Err(e) => {
            tracing::warn!(error = %e, "explanation_synthesize block failed, falling back to structured fields only");
            None
        }
        Effect::Retry { reason, .. } => {
            tracing::warn!(reason = %reason, "explanation_synthesize retry budget exhausted");
            None
        }
    };

    MatchExplanation {
        gates_passed,
        gates_low_confidence: low_confidence,
        repeat_business_summary,
        lane_precedent_summary,
        world_model_summary,
        narrative,
    }
}
