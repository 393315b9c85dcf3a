//! Matching Engine (spec §4.5): ranks `BuyerCriteriaProfile`s against a
//! single `SupplierOffering` through candidate generation, rule gates,
//! structural enrichment, World Model signal lookup, composite scoring, and
//! explanation generation.
//!
//! [`engine::MatchingEngine`] is the public entry point; the individual
//! steps live in their own modules so each can be unit-tested against a
//! bare `HypergraphStore`/`BlockRegistry` without standing up the whole
//! pipeline.

pub mod candidates;
pub mod engine;
pub mod enrichment;
pub mod explain;
pub mod gates;
pub mod scoring;

use std::collections::BTreeMap;

use plasticos_core::BuyerCriteriaProfile;
use serde::{Deserialize, Serialize};

pub use engine::{MatchingEngine, MatchingEngineConfig};

/// One BCP ranked against the offering, with every signal that fed its
/// score kept alongside it for audit and display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RankedCandidate {
    pub bcp: BuyerCriteriaProfile,
    pub score: scoring::ScoreBreakdown,
    /// Set when any gate had to skip a check for missing data (spec §4.5's
    /// "flag low-confidence matches" edge case), never when a gate failed —
    /// a failed gate drops the candidate entirely instead.
    pub low_confidence: bool,
    pub gate_report: gates::RuleGateReport,
    pub structural_signals: enrichment::StructuralSignals,
    pub explanation: explain::MatchExplanation,
}

/// Counts and messages describing the candidates that didn't make it into
/// `ranked`, so a caller can tell "no BCPs for this polymer" apart from
/// "every BCP failed a gate" apart from "27 candidates, 4 ranked".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MatchDiagnostics {
    pub candidates_considered: usize,
    /// Gate name -> number of candidates it dropped. A candidate failing
    /// multiple gates is tallied under each one.
    pub dropped_by_gate: BTreeMap<String, usize>,
    pub message: String,
}

/// Result of one `MatchingEngine::match_offering` call: a ranked list
/// (spec §4.5's tie-break order: composite score desc, buyer_score desc,
/// rule_fit desc, lane_risk asc, company_name asc) plus diagnostics for
/// whatever didn't survive to be ranked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MatchOutcome {
    pub ranked: Vec<RankedCandidate>,
    pub diagnostics: MatchDiagnostics,
}
