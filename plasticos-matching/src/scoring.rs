//! Steps 4–5: world-model signal lookup and composite scoring (spec §4.5).

use plasticos_core::{Effect, MatchWeights, SupplierOffering, BuyerCriteriaProfile, PlasticError};
use plasticos_reasoning::{BlockRegistry, InvocationContext};

use crate::enrichment::StructuralSignals;
use crate::gates::ToleranceConfig;

/// Every component feeding the composite score, kept around on the ranked
/// candidate for audit/explanation purposes.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScoreBreakdown {
    pub vector_similarity: f32,
    pub rule_fit: f32,
    pub repeat_business: f32,
    pub world_model_buyer_score: f32,
    pub lane_risk_penalty: f32,
    pub composite: f32,
}

/// How well an offering's specs overlap a BCP's tolerance-widened windows,
/// in `[0, 1]` — 1.0 for dead-center, trailing off toward the edges of the
/// band. Specs absent on either side are excluded from the average rather
/// than penalized (spec §4.5: "use wider tolerance bands" for missing
/// specs, not an automatic low score); an offering with nothing to compare
/// gets the neutral midpoint.
pub fn rule_fit_completeness(offering: &SupplierOffering, bcp: &BuyerCriteriaProfile, tolerance: &ToleranceConfig) -> f32 {
    let mut considered = 0usize;
    let mut total = 0.0f32;

    if let (Some(mfi), Some(min), Some(max)) = (offering.estimated_mfi, bcp.specification.mfi_min, bcp.specification.mfi_max) {
        total += window_closeness(mfi, min - tolerance.mfi_tolerance, max + tolerance.mfi_tolerance);
        considered += 1;
    }
    if let (Some(density), Some(min), Some(max)) =
        (offering.estimated_density, bcp.specification.density_min, bcp.specification.density_max)
    {
        total += window_closeness(density, min - tolerance.density_tolerance, max + tolerance.density_tolerance);
        considered += 1;
    }
    if let (Some(ppm), Some(max_ppm)) = (offering.estimated_ppm, bcp.contamination.max_ppm) {
        total += if ppm <= max_ppm { 1.0 - (ppm / max_ppm.max(1.0)).min(1.0) * 0.5 } else { 0.0 };
        considered += 1;
    }

    if considered == 0 {
        0.5
    } else {
        (total / considered as f32).clamp(0.0, 1.0)
    }
}

fn window_closeness(value: f32, min: f32, max: f32) -> f32 {
    if value < min || value > max {
        return 0.0;
    }
    let span = (max - min).max(f32::EPSILON);
    let center = (min + max) / 2.0;
    1.0 - ((value - center).abs() / (span / 2.0)).min(1.0)
}

/// Repeat-business boost: the `repeat_business_boost` reasoning block gives
/// the raw completed/total ratio; this applies the exponential decay named
/// in spec §4.5 ("historical transaction count, exponentially decayed") on
/// top, so a single old transaction doesn't weigh the same as a long
/// recent history.
pub async fn repeat_business_boost(
    registry: &BlockRegistry,
    signals: &StructuralSignals,
    decay_alpha: f32,
) -> Result<f32, PlasticError> {
    let input = serde_json::json!({
        "transaction_count": signals.repeat_transaction_count,
        "repeat_business_count": signals.repeat_completed_count,
    });

    let ratio = match registry.invoke("repeat_business_boost", input, InvocationContext::DomainCaller).await {
        Effect::Ok(output) => output.get("repeat_business_boost").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32,
        Effect::Err(e) => return Err(e.to_string().into_plastic_error()),
        Effect::Retry { reason, .. } => return Err(reason.into_plastic_error()),
    };

    let decay = 1.0 - (-decay_alpha * signals.repeat_transaction_count as f32).exp();
    Ok((ratio * decay).clamp(0.0, 1.0))
}

/// Weighted sum per spec §4.5 step 5. Lane risk is subtracted, every other
/// term is additive.
pub fn score_composite(
    weights: &MatchWeights,
    vector_similarity: f32,
    rule_fit: f32,
    repeat_business: f32,
    world_model_buyer_score: f32,
    lane_risk: f32,
) -> ScoreBreakdown {
    let composite = weights.vector_similarity * vector_similarity
        + weights.rule_fit * rule_fit
        + weights.repeat_business * repeat_business
        + weights.world_model_buyer_score * world_model_buyer_score
        - weights.lane_risk_penalty * lane_risk;

    ScoreBreakdown {
        vector_similarity,
        rule_fit,
        repeat_business,
        world_model_buyer_score,
        lane_risk_penalty: lane_risk,
        composite,
    }
}

/// Turns a plain string reason into a `PlasticError::Matching` — used when
/// converting an `ErrorEffect`/retry reason surfaced from a reasoning-block
/// invocation back into the `Result` idiom this crate's scoring helpers use
/// internally.
trait IntoPlasticError {
    fn into_plastic_error(self) -> PlasticError;
}

impl IntoPlasticError for String {
    fn into_plastic_error(self) -> PlasticError {
        plasticos_core::MatchingError::ScoringFailed { key: "reasoning_block".into(), reason: self }.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasticos_core::EntityIdType;

    #[test]
    fn window_closeness_peaks_at_the_center() {
        assert!((window_closeness(3.0, 1.0, 5.0) - 1.0).abs() < 1e-6);
        assert!(window_closeness(5.0, 1.0, 5.0) < window_closeness(3.0, 1.0, 5.0));
    }

    #[test]
    fn out_of_window_values_score_zero() {
        assert_eq!(window_closeness(10.0, 1.0, 5.0), 0.0);
    }

    #[test]
    fn rule_fit_with_no_comparable_specs_is_neutral() {
        let offering = SupplierOffering {
            supplier_offering_id: plasticos_core::SupplierOfferingId::now_v7(),
            supplier_edge_id: "i".into(),
            supplier_name: "Acme".into(),
            material: plasticos_core::MaterialDescriptor { polymer: "HDPE".into(), forms: vec![], colors: vec![], applications: vec![], process: vec![] },
            estimated_mfi: None,
            estimated_density: None,
            estimated_ppm: None,
            origin_location: "Detroit, MI".into(),
            intake_at: chrono::Utc::now(),
        };
        let bcp = BuyerCriteriaProfile {
            bcp_id: plasticos_core::BcpId::now_v7(),
            company_name: "Padnos".into(),
            buyer_location: "Wyoming, MI".into(),
            segments: vec![],
            external_ids: vec![],
            material: plasticos_core::MaterialDescriptor { polymer: "HDPE".into(), forms: vec![], colors: vec![], applications: vec![], process: vec![] },
            specification: plasticos_core::SpecificationWindow { mfi_min: None, mfi_max: None, density_min: None, density_max: None, ash_max: None, filler_types: vec![] },
            contamination: plasticos_core::ContaminationTolerance { max_ppm: None, banned: vec![] },
            certifications: vec![],
            pricing_band: plasticos_core::PricingBand { min: None, max: None, currency: None, incoterm: None },
            geography: plasticos_core::GeographyConstraint { countries: vec![], states: vec![], regions: vec![], ports: vec![] },
            logistics: plasticos_core::LogisticsConstraint { min_load_lbs: None, max_lane_distance_miles: None },
            metadata: plasticos_core::PayloadMetadata { version: 1, source: "test".into(), completeness_score: 0.5 },
        };
        assert_eq!(rule_fit_completeness(&offering, &bcp, &ToleranceConfig::default()), 0.5);
    }

    #[test]
    fn score_composite_applies_configured_weights() {
        let weights = MatchWeights {
            vector_similarity: 1.0,
            rule_fit: 0.0,
            repeat_business: 0.0,
            world_model_buyer_score: 0.0,
            lane_risk_penalty: 0.0,
        };
        let breakdown = score_composite(&weights, 0.8, 0.0, 0.0, 0.0, 0.0);
        assert!((breakdown.composite - 0.8).abs() < 1e-6);
    }
}
