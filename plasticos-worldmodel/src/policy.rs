//! Scoring policy for the World Model Service (spec.md §9 Open Question,
//! resolved here): how raw transaction counters turn into the smoothed
//! `buyer_score`/`lane_risk_score`/`product_stability_score` fields of
//! [`plasticos_core::WorldModelEntry`].
//!
//! The policy is a small, documented, overridable struct rather than a
//! hardcoded formula so `plasticos-config` can later expose it as a tunable,
//! in the same configurable-scoring shape as `MatchWeights`.

use plasticos_core::TransactionOutcome;

/// Coefficients for the World Model's smoothed scores. Defaults chosen so
/// that a brand-new subject (no transactions) scores at the neutral
/// midpoint rather than 0, and risk/stability move by the ratio of
/// favorable to unfavorable outcomes rather than raw counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    /// Starting score for a subject with no observed transactions.
    pub neutral_score: f32,
    /// Weight given to the completion ratio (completed / total) when
    /// computing buyer_score and product_stability_score.
    pub completion_weight: f32,
    /// Weight given to repeat-business ratio (repeat / total) when
    /// computing buyer_score.
    pub repeat_business_weight: f32,
    /// Weight given to the dispute+cancellation ratio when computing
    /// lane_risk_score (higher ratio -> higher risk).
    pub risk_weight: f32,
    /// Exponential smoothing factor applied on each scheduled recompute,
    /// so a single bad transaction does not swing a long-lived aggregate.
    pub smoothing_alpha: f32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            neutral_score: 0.5,
            completion_weight: 0.5,
            repeat_business_weight: 0.3,
            risk_weight: 0.6,
            smoothing_alpha: 0.35,
        }
    }
}

impl ScoringPolicy {
    /// `buyer_score`/`supplier_score`/`product_stability_score` target value
    /// for one recompute pass, before smoothing: a weighted mix of
    /// completion ratio and repeat-business ratio, clamped to `[0, 1]`.
    pub fn target_quality_score(&self, transaction_count: u64, completed: u64, repeat_business: u64) -> f32 {
        if transaction_count == 0 {
            return self.neutral_score;
        }
        let completion_ratio = completed as f32 / transaction_count as f32;
        let repeat_ratio = repeat_business as f32 / transaction_count as f32;
        let raw = self.completion_weight * completion_ratio + self.repeat_business_weight * repeat_ratio;
        raw.clamp(0.0, 1.0)
    }

    /// `lane_risk_score` target value for one recompute pass: the ratio of
    /// disputed/cancelled transactions, scaled by `risk_weight`.
    pub fn target_lane_risk(&self, transaction_count: u64, disputed: u64, cancelled: u64) -> f32 {
        if transaction_count == 0 {
            return self.neutral_score * (1.0 - self.risk_weight);
        }
        let unfavorable_ratio = (disputed + cancelled) as f32 / transaction_count as f32;
        (self.risk_weight * unfavorable_ratio).clamp(0.0, 1.0)
    }

    /// Applies exponential smoothing: `current + alpha * (target - current)`.
    pub fn smooth(&self, current: f32, target: f32) -> f32 {
        current + self.smoothing_alpha * (target - current)
    }
}

/// Classifies a [`TransactionOutcome`] as favorable for quality scoring.
pub fn is_completed(outcome: TransactionOutcome) -> bool {
    matches!(outcome, TransactionOutcome::Completed)
}

/// Classifies a [`TransactionOutcome`] as unfavorable for risk scoring.
pub fn is_unfavorable(outcome: TransactionOutcome) -> bool {
    matches!(outcome, TransactionOutcome::Disputed | TransactionOutcome::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_transactions_yields_neutral_quality_score() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.target_quality_score(0, 0, 0), policy.neutral_score);
    }

    #[test]
    fn all_completed_and_repeat_pushes_quality_score_up() {
        let policy = ScoringPolicy::default();
        let score = policy.target_quality_score(10, 10, 10);
        assert!(score > policy.neutral_score);
    }

    #[test]
    fn all_disputed_pushes_lane_risk_to_weight_ceiling() {
        let policy = ScoringPolicy::default();
        let risk = policy.target_lane_risk(10, 10, 0);
        assert_eq!(risk, policy.risk_weight);
    }

    #[test]
    fn smoothing_moves_partway_toward_target() {
        let policy = ScoringPolicy::default();
        let smoothed = policy.smooth(0.5, 1.0);
        assert!(smoothed > 0.5 && smoothed < 1.0);
    }
}
