//! Step 2: deterministic rule gates (spec §4.5). MFI and contamination are
//! delegated to the `rule_gate_check` reasoning block (spec §4.6's
//! matching integration point); density overlap, certifications, and
//! geography have no registered block counterpart and are checked here
//! directly.

use plasticos_core::{BuyerCriteriaProfile, GateResult, SupplierOffering};
use plasticos_reasoning::{BlockRegistry, InvocationContext};
use serde_json::Value;

/// Tolerance bands widening a BCP's stated spec window before an offering
/// is checked against it (spec §4.5: "MFI range overlap... with tolerance
/// band").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceConfig {
    pub mfi_tolerance: f32,
    pub density_tolerance: f32,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self { mfi_tolerance: 0.5, density_tolerance: 0.02 }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GateCheck {
    pub name: String,
    pub result: GateResult,
    pub detail: String,
}

/// Every gate evaluated for one candidate. A candidate survives only if
/// every check in here passed (spec §8's quantified invariant).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RuleGateReport {
    pub checks: Vec<GateCheck>,
}

impl RuleGateReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.result == GateResult::Passed)
    }

    pub fn failed_names(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|c| c.result == GateResult::Failed)
            .map(|c| c.name.clone())
            .collect()
    }
}

/// Runs every gate for one `(offering, bcp)` pair. The second element of
/// the tuple is `true` when the offering was missing a spec a gate needed
/// to evaluate — those gates are skipped (not failed) with a wider
/// tolerance band, per spec §4.5's edge case: "Offering with missing
/// specs: use wider tolerance bands; flag low-confidence matches."
pub async fn apply_rule_gates(
    offering: &SupplierOffering,
    bcp: &BuyerCriteriaProfile,
    tolerance: &ToleranceConfig,
    registry: &BlockRegistry,
) -> (RuleGateReport, bool) {
    let mut checks = Vec::new();
    let mut low_confidence = false;

    checks.push(mfi_and_contamination_check(offering, bcp, tolerance, registry, &mut low_confidence).await);
    checks.push(density_check(offering, bcp, tolerance, &mut low_confidence));
    checks.push(certification_check(bcp, &mut low_confidence));
    checks.push(geography_check(offering, bcp));

    (RuleGateReport { checks }, low_confidence)
}

async fn mfi_and_contamination_check(
    offering: &SupplierOffering,
    bcp: &BuyerCriteriaProfile,
    tolerance: &ToleranceConfig,
    registry: &BlockRegistry,
    low_confidence: &mut bool,
) -> GateCheck {
    let mut input = serde_json::json!({});
    let mut evaluated_anything = false;

    match (offering.estimated_mfi, bcp.specification.mfi_min, bcp.specification.mfi_max) {
        (Some(mfi), Some(min), Some(max)) => {
            input["candidate_mfi"] = serde_json::json!(mfi);
            input["mfi_min"] = serde_json::json!(min - tolerance.mfi_tolerance);
            input["mfi_max"] = serde_json::json!(max + tolerance.mfi_tolerance);
            evaluated_anything = true;
        }
        _ => *low_confidence = true,
    }

    match (offering.estimated_ppm, bcp.contamination.max_ppm) {
        (Some(ppm), Some(max_ppm)) => {
            input["candidate_ppm"] = serde_json::json!(ppm);
            input["max_ppm"] = serde_json::json!(max_ppm);
            evaluated_anything = true;
        }
        _ => *low_confidence = true,
    }

    if !bcp.contamination.banned.is_empty() {
        input["banned"] = serde_json::json!(bcp.contamination.banned);
        input["candidate_contaminants"] = serde_json::json!(Vec::<String>::new());
    }

    if !evaluated_anything {
        return GateCheck {
            name: "mfi_and_contamination".into(),
            result: GateResult::Passed,
            detail: "nothing to evaluate: offering and/or BCP carry no spec/ppm window".into(),
        };
    }

    match registry.invoke("rule_gate_check", input, InvocationContext::DomainCaller).await {
        plasticos_core::Effect::Ok(output) => {
            let passed = output.get("passed").and_then(Value::as_bool).unwrap_or(true);
            let reasons: Vec<String> = output
                .get("reasons")
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                .unwrap_or_default();
            GateCheck {
                name: "mfi_and_contamination".into(),
                result: if passed { GateResult::Passed } else { GateResult::Failed },
                detail: if reasons.is_empty() { "within tolerance".into() } else { reasons.join("; ") },
            }
        }
        plasticos_core::Effect::Err(e) => GateCheck {
            name: "mfi_and_contamination".into(),
            result: GateResult::Failed,
            detail: format!("rule_gate_check block unavailable: {e}"),
        },
        plasticos_core::Effect::Retry { reason, .. } => GateCheck {
            name: "mfi_and_contamination".into(),
            result: GateResult::Failed,
            detail: format!("rule_gate_check retry budget exhausted: {reason}"),
        },
    }
}

fn density_check(
    offering: &SupplierOffering,
    bcp: &BuyerCriteriaProfile,
    tolerance: &ToleranceConfig,
    low_confidence: &mut bool,
) -> GateCheck {
    let (Some(density), Some(min), Some(max)) = (
        offering.estimated_density,
        bcp.specification.density_min,
        bcp.specification.density_max,
    ) else {
        *low_confidence = true;
        return GateCheck {
            name: "density".into(),
            result: GateResult::Passed,
            detail: "no density window to evaluate against".into(),
        };
    };

    let widened_min = min - tolerance.density_tolerance;
    let widened_max = max + tolerance.density_tolerance;
    if density >= widened_min && density <= widened_max {
        GateCheck {
            name: "density".into(),
            result: GateResult::Passed,
            detail: format!("{density} within [{widened_min}, {widened_max}]"),
        }
    } else {
        GateCheck {
            name: "density".into(),
            result: GateResult::Failed,
            detail: format!("{density} outside [{widened_min}, {widened_max}]"),
        }
    }
}

fn certification_check(bcp: &BuyerCriteriaProfile, low_confidence: &mut bool) -> GateCheck {
    if bcp.certifications.is_empty() {
        return GateCheck {
            name: "certifications".into(),
            result: GateResult::Passed,
            detail: "buyer requires no certifications".into(),
        };
    }
    // SupplierOffering carries no certification data at intake; a required
    // cert can't be confirmed or refuted here, so the gate passes but the
    // match is flagged low-confidence rather than silently dropped.
    *low_confidence = true;
    GateCheck {
        name: "certifications".into(),
        result: GateResult::Passed,
        detail: format!(
            "buyer requires {:?}; not captured at intake, flagged for manual confirmation",
            bcp.certifications
        ),
    }
}

fn geography_check(offering: &SupplierOffering, bcp: &BuyerCriteriaProfile) -> GateCheck {
    let geo = &bcp.geography;
    if geo.countries.is_empty() && geo.states.is_empty() && geo.regions.is_empty() && geo.ports.is_empty() {
        return GateCheck {
            name: "geography".into(),
            result: GateResult::Passed,
            detail: "no geography constraint configured".into(),
        };
    }

    let origin = offering.origin_location.to_lowercase();
    let accepted = geo
        .countries
        .iter()
        .chain(geo.states.iter())
        .chain(geo.regions.iter())
        .chain(geo.ports.iter())
        .any(|loc| origin.contains(&loc.to_lowercase()));

    if accepted {
        GateCheck {
            name: "geography".into(),
            result: GateResult::Passed,
            detail: format!("{} matches accepted geography", offering.origin_location),
        }
    } else {
        GateCheck {
            name: "geography".into(),
            result: GateResult::Failed,
            detail: format!("{} not within accepted geography", offering.origin_location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use plasticos_core::{
        ContaminationTolerance, EntityIdType, GeographyConstraint, LogisticsConstraint,
        MaterialDescriptor, PayloadMetadata, PricingBand, SpecificationWindow,
    };
    use plasticos_llm::{SummarizationProvider, SummarizeConfig};
    use std::sync::Arc;

    struct StubSummarizer;

    #[async_trait]
    impl SummarizationProvider for StubSummarizer {
        async fn summarize(&self, content: &str, _config: &SummarizeConfig) -> plasticos_core::PlasticResult<String> {
            Ok(format!("stub: {content}"))
        }
    }

    fn registry() -> BlockRegistry {
        BlockRegistry::with_default_blocks(Arc::new(StubSummarizer))
    }

    fn sample_bcp() -> BuyerCriteriaProfile {
        BuyerCriteriaProfile {
            bcp_id: plasticos_core::BcpId::now_v7(),
            company_name: "Padnos".into(),
            buyer_location: "Wyoming, MI".into(),
            segments: vec![],
            external_ids: vec![],
            material: MaterialDescriptor {
                polymer: "HDPE".into(),
                forms: vec![],
                colors: vec![],
                applications: vec![],
                process: vec![],
            },
            specification: SpecificationWindow {
                mfi_min: Some(1.0),
                mfi_max: Some(5.0),
                density_min: Some(0.94),
                density_max: Some(0.97),
                ash_max: None,
                filler_types: vec![],
            },
            contamination: ContaminationTolerance { max_ppm: Some(1500.0), banned: vec!["PVC".into()] },
            certifications: vec![],
            pricing_band: PricingBand { min: None, max: None, currency: None, incoterm: None },
            geography: GeographyConstraint {
                countries: vec!["US".into()],
                states: vec!["MI".into()],
                regions: vec![],
                ports: vec![],
            },
            logistics: LogisticsConstraint { min_load_lbs: None, max_lane_distance_miles: None },
            metadata: PayloadMetadata { version: 1, source: "test".into(), completeness_score: 0.8 },
        }
    }

    fn sample_offering(mfi: f32, density: f32, ppm: f32, origin: &str) -> SupplierOffering {
        SupplierOffering {
            supplier_offering_id: plasticos_core::SupplierOfferingId::now_v7(),
            supplier_edge_id: "intake-1".into(),
            supplier_name: "Acme".into(),
            material: MaterialDescriptor {
                polymer: "HDPE".into(),
                forms: vec![],
                colors: vec![],
                applications: vec![],
                process: vec![],
            },
            estimated_mfi: Some(mfi),
            estimated_density: Some(density),
            estimated_ppm: Some(ppm),
            origin_location: origin.to_string(),
            intake_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn an_in_window_offering_passes_every_gate() {
        let registry = registry();
        let (report, low_confidence) =
            apply_rule_gates(&sample_offering(3.0, 0.955, 200.0, "Detroit, MI"), &sample_bcp(), &ToleranceConfig::default(), &registry).await;
        assert!(report.all_passed());
        assert!(!low_confidence);
    }

    #[tokio::test]
    async fn contamination_over_max_ppm_fails_the_gate() {
        let registry = registry();
        let (report, _) =
            apply_rule_gates(&sample_offering(3.0, 0.955, 5000.0, "Detroit, MI"), &sample_bcp(), &ToleranceConfig::default(), &registry).await;
        assert!(!report.all_passed());
        assert!(report.failed_names().contains(&"mfi_and_contamination".to_string()));
    }

    #[tokio::test]
    async fn density_outside_tolerance_band_fails() {
        let registry = registry();
        let (report, _) =
            apply_rule_gates(&sample_offering(3.0, 1.2, 200.0, "Detroit, MI"), &sample_bcp(), &ToleranceConfig::default(), &registry).await;
        assert!(report.failed_names().contains(&"density".to_string()));
    }

    #[tokio::test]
    async fn geography_outside_accepted_regions_fails() {
        let registry = registry();
        let (report, _) =
            apply_rule_gates(&sample_offering(3.0, 0.955, 200.0, "Shanghai, CN"), &sample_bcp(), &ToleranceConfig::default(), &registry).await;
        assert!(report.failed_names().contains(&"geography".to_string()));
    }

    #[tokio::test]
    async fn missing_mfi_is_flagged_low_confidence_not_failed() {
        let registry = registry();
        let mut offering = sample_offering(3.0, 0.955, 200.0, "Detroit, MI");
        offering.estimated_mfi = None;
        let (report, low_confidence) = apply_rule_gates(&offering, &sample_bcp(), &ToleranceConfig::default(), &registry).await;
        assert!(low_confidence);
        assert!(report.all_passed());
    }
}
