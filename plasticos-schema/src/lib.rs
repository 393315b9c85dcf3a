//! Canonical Schema Layer: validation, completeness scoring, hyperedge
//! projection, YAML round-trip, synonym normalization, and duplicate/
//! contradiction detection between `BuyerCriteriaProfile` versions.
//!
//! Raw retrieval blobs and domain-agent intake events become canonical
//! hyperedges only by passing through this crate. Nothing downstream talks
//! to storage directly with unvalidated JSON.

use plasticos_core::{
    compute_content_hash, BcpId, BuyerCriteriaProfile, EdgeType, EntityIdType, Hyperedge,
    PayloadMetadata, Severity, SupplierOffering, TransactionRecord, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// CANONICAL PAYLOAD
// ============================================================================

/// A validated, typed payload ready to become (or already backing) a hyperedge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "edge_type", rename_all = "snake_case")]
pub enum CanonicalPayload {
    Bcp(BuyerCriteriaProfile),
    SupplierOffering(SupplierOffering),
    Transaction(TransactionRecord),
}

impl CanonicalPayload {
    pub fn edge_type(&self) -> EdgeType {
        match self {
            CanonicalPayload::Bcp(_) => EdgeType::Bcp,
            CanonicalPayload::SupplierOffering(_) => EdgeType::SupplierOffering,
            CanonicalPayload::Transaction(_) => EdgeType::Transaction,
        }
    }

    /// Stable key identity, unique within `edge_type` (spec §3).
    pub fn hyperedge_key(&self) -> String {
        match self {
            CanonicalPayload::Bcp(bcp) => bcp.hyperedge_key(),
            CanonicalPayload::SupplierOffering(offering) => offering.supplier_edge_id.clone(),
            CanonicalPayload::Transaction(tx) => tx.transaction_id.to_string(),
        }
    }

    /// Text used to (re)derive an embedding, where applicable. Supplier
    /// offerings and transactions aren't vector-searched so this is mostly
    /// exercised for BCPs.
    pub fn embedding_text(&self) -> String {
        match self {
            CanonicalPayload::Bcp(bcp) => bcp.embedding_text(),
            CanonicalPayload::SupplierOffering(offering) => format!(
                "{} {} {}",
                offering.supplier_name, offering.material.polymer, offering.origin_location
            ),
            CanonicalPayload::Transaction(tx) => {
                format!("{} {} {}", tx.buyer_company_name, tx.supplier_name, tx.polymer)
            }
        }
    }

    pub fn as_bcp(&self) -> Option<&BuyerCriteriaProfile> {
        match self {
            CanonicalPayload::Bcp(bcp) => Some(bcp),
            _ => None,
        }
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Parses and validates a raw JSON blob against the schema for `edge_type`,
/// then runs the business-rule checks beyond what `serde` structural
/// deserialization already enforces (non-empty required strings, ordered
/// ranges). Hard failures reject the record; completeness below 0.5 is
/// never a rejection reason — see [`completeness`].
pub fn validate(raw: serde_json::Value, edge_type: EdgeType) -> Result<CanonicalPayload, ValidationError> {
    match edge_type {
        EdgeType::Bcp => {
            let bcp: BuyerCriteriaProfile = deserialize_field(raw, "bcp")?;
            validate_bcp(&bcp)?;
            Ok(CanonicalPayload::Bcp(bcp))
        }
        EdgeType::SupplierOffering => {
            let offering: SupplierOffering = deserialize_field(raw, "supplier_offering")?;
            validate_offering(&offering)?;
            Ok(CanonicalPayload::SupplierOffering(offering))
        }
        EdgeType::Transaction => {
            let tx: TransactionRecord = deserialize_field(raw, "transaction")?;
            validate_transaction(&tx)?;
            Ok(CanonicalPayload::Transaction(tx))
        }
    }
}

fn deserialize_field<T: serde::de::DeserializeOwned>(
    raw: serde_json::Value,
    what: &str,
) -> Result<T, ValidationError> {
    serde_json::from_value(raw).map_err(|e| ValidationError::InvalidValue {
        field: what.to_string(),
        reason: e.to_string(),
    })
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn require_ordered(field: &str, min: Option<f32>, max: Option<f32>) -> Result<(), ValidationError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                reason: format!("min ({min}) is greater than max ({max})"),
            });
        }
    }
    Ok(())
}

fn validate_bcp(bcp: &BuyerCriteriaProfile) -> Result<(), ValidationError> {
    require_non_empty("company_name", &bcp.company_name)?;
    require_non_empty("buyer_location", &bcp.buyer_location)?;
    require_non_empty("material.polymer", &bcp.material.polymer)?;
    require_ordered(
        "specification.mfi",
        bcp.specification.mfi_min,
        bcp.specification.mfi_max,
    )?;
    require_ordered(
        "specification.density",
        bcp.specification.density_min,
        bcp.specification.density_max,
    )?;
    require_ordered("pricing_band", bcp.pricing_band.min, bcp.pricing_band.max)?;
    Ok(())
}

fn validate_offering(offering: &SupplierOffering) -> Result<(), ValidationError> {
    require_non_empty("supplier_edge_id", &offering.supplier_edge_id)?;
    require_non_empty("supplier_name", &offering.supplier_name)?;
    require_non_empty("material.polymer", &offering.material.polymer)?;
    require_non_empty("origin_location", &offering.origin_location)?;
    if let Some(ppm) = offering.estimated_ppm {
        if ppm < 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "estimated_ppm".to_string(),
                reason: format!("{ppm} is negative"),
            });
        }
    }
    Ok(())
}

fn validate_transaction(tx: &TransactionRecord) -> Result<(), ValidationError> {
    require_non_empty("supplier_name", &tx.supplier_name)?;
    require_non_empty("buyer_company_name", &tx.buyer_company_name)?;
    require_non_empty("polymer", &tx.polymer)?;
    require_non_empty("lane_origin", &tx.lane_origin)?;
    require_non_empty("lane_destination", &tx.lane_destination)?;
    if tx.price < 0.0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            reason: format!("{} is negative", tx.price),
        });
    }
    Ok(())
}

// ============================================================================
// COMPLETENESS SCORING
// ============================================================================

/// Field-group weights for BCP completeness, ordered by operational
/// importance: polymer identity dominates since it drives candidate
/// generation; contamination tolerance matters least since most buyers
/// accept the house default.
const WEIGHT_POLYMER: f32 = 0.30;
const WEIGHT_SPECIFICATION: f32 = 0.25;
const WEIGHT_GEOGRAPHY: f32 = 0.20;
const WEIGHT_PRICING: f32 = 0.15;
const WEIGHT_CONTAMINATION: f32 = 0.10;

/// Weighted completeness in `[0, 1]`. Supplier offerings and transactions
/// arrive fully formed from a single intake event, so they always score 1.0;
/// only BCPs are built incrementally from research and can be partial.
pub fn completeness(payload: &CanonicalPayload) -> f32 {
    match payload {
        CanonicalPayload::Bcp(bcp) => completeness_bcp(bcp),
        CanonicalPayload::SupplierOffering(_) | CanonicalPayload::Transaction(_) => 1.0,
    }
}

fn completeness_bcp(bcp: &BuyerCriteriaProfile) -> f32 {
    let mut score = 0.0;

    if !bcp.material.polymer.trim().is_empty() {
        score += WEIGHT_POLYMER;
    }

    let spec_fields = [
        bcp.specification.mfi_min.is_some(),
        bcp.specification.mfi_max.is_some(),
        bcp.specification.density_min.is_some(),
        bcp.specification.density_max.is_some(),
        bcp.specification.ash_max.is_some(),
    ];
    let spec_ratio = ratio(&spec_fields);
    score += WEIGHT_SPECIFICATION * spec_ratio;

    if !bcp.geography.countries.is_empty()
        || !bcp.geography.regions.is_empty()
        || !bcp.geography.states.is_empty()
    {
        score += WEIGHT_GEOGRAPHY;
    }

    let pricing_fields = [bcp.pricing_band.min.is_some(), bcp.pricing_band.max.is_some()];
    score += WEIGHT_PRICING * ratio(&pricing_fields);

    if bcp.contamination.max_ppm.is_some() || !bcp.contamination.banned.is_empty() {
        score += WEIGHT_CONTAMINATION;
    }

    score.clamp(0.0, 1.0)
}

fn ratio(flags: &[bool]) -> f32 {
    if flags.is_empty() {
        return 0.0;
    }
    flags.iter().filter(|f| **f).count() as f32 / flags.len() as f32
}

/// Below this threshold a BCP is flagged (never rejected) as under-specified.
pub const LOW_COMPLETENESS_THRESHOLD: f32 = 0.5;

// ============================================================================
// HYPEREDGE PROJECTION
// ============================================================================

/// Projects a canonical payload into its hyperedge representation.
/// `previous_version` is `None` for a brand-new identity and `Some(v)` to
/// bump an existing one; the storage layer, not this function, is
/// responsible for carrying `created_at` forward across versions.
pub fn to_hyperedge(
    payload: &CanonicalPayload,
    previous_version: Option<u32>,
) -> Result<Hyperedge, ValidationError> {
    let payload_json = match payload {
        CanonicalPayload::Bcp(bcp) => serde_json::to_value(bcp),
        CanonicalPayload::SupplierOffering(offering) => serde_json::to_value(offering),
        CanonicalPayload::Transaction(tx) => serde_json::to_value(tx),
    }
    .map_err(|e| ValidationError::InvalidValue {
        field: "payload".to_string(),
        reason: e.to_string(),
    })?;

    let now = chrono::Utc::now();
    Ok(Hyperedge {
        edge_type: payload.edge_type(),
        key: payload.hyperedge_key(),
        payload: payload_json,
        embedding: None,
        version: previous_version.map(|v| v + 1).unwrap_or(1),
        created_at: now,
        updated_at: now,
    })
}

/// Deterministic content hash of a payload's identity fields, used when a
/// caller needs a stable fingerprint independent of the hyperedge key string
/// (e.g. deduplication across differently-cased company names).
pub fn content_fingerprint(payload: &CanonicalPayload) -> [u8; 32] {
    compute_content_hash(payload.hyperedge_key().to_lowercase().as_bytes())
}

// ============================================================================
// YAML ROUND-TRIP
// ============================================================================

pub fn to_yaml(payload: &CanonicalPayload) -> Result<String, ValidationError> {
    serde_yaml::to_string(payload).map_err(|e| ValidationError::InvalidValue {
        field: "yaml".to_string(),
        reason: e.to_string(),
    })
}

pub fn from_yaml(yaml: &str) -> Result<CanonicalPayload, ValidationError> {
    serde_yaml::from_str(yaml).map_err(|e| ValidationError::InvalidValue {
        field: "yaml".to_string(),
        reason: e.to_string(),
    })
}

// ============================================================================
// SYNONYM NORMALIZATION
// ============================================================================

/// A lookup table mapping raw research-blob terminology to canonical
/// vocabulary (e.g. `"blown film" -> "film"`). Owned and populated by
/// `plasticos-config`; this crate only knows how to apply one.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable(BTreeMap<String, String>);

impl SynonymTable {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
        )
    }

    pub fn normalize(&self, term: &str) -> String {
        self.0
            .get(&term.to_lowercase())
            .cloned()
            .unwrap_or_else(|| term.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Normalizes a BCP's free-text material descriptors in place (forms,
/// applications, process) via the supplied synonym table.
pub fn normalize_synonyms(bcp: &mut BuyerCriteriaProfile, table: &SynonymTable) {
    for form in bcp.material.forms.iter_mut() {
        *form = table.normalize(form);
    }
    for application in bcp.material.applications.iter_mut() {
        *application = table.normalize(application);
    }
    for process in bcp.material.process.iter_mut() {
        *process = table.normalize(process);
    }
}

// ============================================================================
// DUPLICATE / CONTRADICTION DETECTION
// ============================================================================

/// A flagged inconsistency between two versions of the same BCP identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValidationIssue {
    pub severity: Severity,
    pub field: String,
    pub message: String,
}

/// What a re-canonicalization of an existing BCP identity should do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum VersionDecision {
    /// Field-for-field identical to the existing version (ignoring metadata); no-op.
    Duplicate,
    /// Differs from the existing version with no detected conflicts; bump the version.
    Update,
    /// Differs in a way that can't both be true at once; stored anyway with
    /// `ValidationIssue`s attached for operator review (never silently dropped).
    Contradiction(Vec<ValidationIssue>),
}

/// Decides whether re-extracting a BCP at the same identity is a no-op, a
/// genuine update, or a contradiction that needs flagging (resolves spec.md
/// §9's versioning Open Question: prior versions are always retained in the
/// `hyperedge_log`, never overwritten).
pub fn compare_bcp_versions(
    existing: &BuyerCriteriaProfile,
    incoming: &BuyerCriteriaProfile,
) -> VersionDecision {
    if normalized_for_compare(existing) == normalized_for_compare(incoming) {
        return VersionDecision::Duplicate;
    }

    let mut issues = Vec::new();
    check_disjoint_range(
        "specification.mfi",
        existing.specification.mfi_min,
        existing.specification.mfi_max,
        incoming.specification.mfi_min,
        incoming.specification.mfi_max,
        &mut issues,
    );
    check_disjoint_range(
        "specification.density",
        existing.specification.density_min,
        existing.specification.density_max,
        incoming.specification.density_min,
        incoming.specification.density_max,
        &mut issues,
    );

    if existing.material.polymer != incoming.material.polymer
        && !existing.material.polymer.is_empty()
        && !incoming.material.polymer.is_empty()
    {
        issues.push(ValidationIssue {
            severity: Severity::Error,
            field: "material.polymer".to_string(),
            message: format!(
                "polymer changed from {} to {} under the same BCP identity",
                existing.material.polymer, incoming.material.polymer
            ),
        });
    }

    if issues.is_empty() {
        VersionDecision::Update
    } else {
        VersionDecision::Contradiction(issues)
    }
}

fn normalized_for_compare(bcp: &BuyerCriteriaProfile) -> BuyerCriteriaProfile {
    let mut copy = bcp.clone();
    copy.bcp_id = BcpId::nil();
    copy.metadata = PayloadMetadata {
        version: 0,
        source: String::new(),
        completeness_score: 0.0,
    };
    copy
}

#[allow(clippy::too_many_arguments)]
fn check_disjoint_range(
    field: &str,
    existing_min: Option<f32>,
    existing_max: Option<f32>,
    incoming_min: Option<f32>,
    incoming_max: Option<f32>,
    issues: &mut Vec<ValidationIssue>,
) {
    if let (Some(e_max), Some(i_min)) = (existing_max, incoming_min) {
        if e_max < i_min {
            issues.push(ValidationIssue {
                severity: Severity::Warning,
                field: field.to_string(),
                message: format!(
                    "{field}: existing window tops out at {e_max} but the new version starts at {i_min}"
                ),
            });
        }
    }
    if let (Some(i_max), Some(e_min)) = (incoming_max, existing_min) {
        if i_max < e_min {
            issues.push(ValidationIssue {
                severity: Severity::Warning,
                field: field.to_string(),
                message: format!(
                    "{field}: new window tops out at {i_max} but the existing version starts at {e_min}"
                ),
            });
        }
    }
}

/// Bumps a BCP's metadata version in place. Callers are responsible for
/// persisting the prior version to the `hyperedge_log` before calling this.
pub fn bump_version(bcp: &mut BuyerCriteriaProfile) {
    bcp.metadata.version += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasticos_core::{
        ContaminationTolerance, GeographyConstraint, LogisticsConstraint, MaterialDescriptor,
        PricingBand, SpecificationWindow,
    };

    fn sample_bcp() -> BuyerCriteriaProfile {
        BuyerCriteriaProfile {
            bcp_id: BcpId::now_v7(),
            company_name: "Padnos".to_string(),
            buyer_location: "Wyoming, MI".to_string(),
            segments: vec!["recycler".to_string()],
            external_ids: vec![],
            material: MaterialDescriptor {
                polymer: "HDPE".to_string(),
                forms: vec!["blown film".to_string()],
                colors: vec!["natural".to_string()],
                applications: vec![],
                process: vec![],
            },
            specification: SpecificationWindow {
                mfi_min: Some(0.3),
                mfi_max: Some(0.8),
                density_min: None,
                density_max: None,
                ash_max: None,
                filler_types: vec![],
            },
            contamination: ContaminationTolerance {
                max_ppm: Some(500.0),
                banned: vec![],
            },
            certifications: vec![],
            pricing_band: PricingBand {
                min: Some(0.30),
                max: Some(0.45),
                currency: Some("USD".to_string()),
                incoterm: Some("FOB".to_string()),
            },
            geography: GeographyConstraint {
                countries: vec!["US".to_string()],
                states: vec![],
                regions: vec!["Midwest".to_string()],
                ports: vec![],
            },
            logistics: LogisticsConstraint {
                min_load_lbs: Some(40_000.0),
                max_lane_distance_miles: Some(500.0),
            },
            metadata: PayloadMetadata {
                version: 1,
                source: "research".to_string(),
                completeness_score: 0.0,
            },
        }
    }

    #[test]
    fn validate_rejects_missing_polymer() {
        let mut bcp = sample_bcp();
        bcp.material.polymer = String::new();
        let err = validate_bcp(&bcp).unwrap_err();
        assert!(matches!(err, ValidationError::RequiredFieldMissing { .. }));
    }

    #[test]
    fn validate_rejects_inverted_spec_window() {
        let mut bcp = sample_bcp();
        bcp.specification.mfi_min = Some(2.0);
        bcp.specification.mfi_max = Some(1.0);
        let err = validate_bcp(&bcp).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn validate_accepts_well_formed_bcp() {
        assert!(validate_bcp(&sample_bcp()).is_ok());
    }

    #[test]
    fn completeness_rewards_populated_fields() {
        let full = completeness(&CanonicalPayload::Bcp(sample_bcp()));
        assert!(full > 0.8, "expected high completeness, got {full}");

        let mut sparse = sample_bcp();
        sparse.specification = SpecificationWindow {
            mfi_min: None,
            mfi_max: None,
            density_min: None,
            density_max: None,
            ash_max: None,
            filler_types: vec![],
        };
        sparse.geography = GeographyConstraint {
            countries: vec![],
            states: vec![],
            regions: vec![],
            ports: vec![],
        };
        sparse.pricing_band = PricingBand {
            min: None,
            max: None,
            currency: None,
            incoterm: None,
        };
        sparse.contamination = ContaminationTolerance {
            max_ppm: None,
            banned: vec![],
        };
        let thin = completeness(&CanonicalPayload::Bcp(sparse));
        assert!(thin < LOW_COMPLETENESS_THRESHOLD, "expected low completeness, got {thin}");
    }

    #[test]
    fn to_hyperedge_sets_version_one_for_new_identity() {
        let payload = CanonicalPayload::Bcp(sample_bcp());
        let hyperedge = to_hyperedge(&payload, None).unwrap();
        assert_eq!(hyperedge.version, 1);
        assert_eq!(hyperedge.edge_type, EdgeType::Bcp);
    }

    #[test]
    fn to_hyperedge_bumps_version_for_existing_identity() {
        let payload = CanonicalPayload::Bcp(sample_bcp());
        let hyperedge = to_hyperedge(&payload, Some(3)).unwrap();
        assert_eq!(hyperedge.version, 4);
    }

    #[test]
    fn yaml_round_trips() {
        let payload = CanonicalPayload::Bcp(sample_bcp());
        let yaml = to_yaml(&payload).unwrap();
        let back = from_yaml(&yaml).unwrap();
        assert_eq!(payload, back);
    }

    #[test]
    fn synonym_table_normalizes_known_terms_and_passes_through_unknown() {
        let table = SynonymTable::new([("blown film".to_string(), "film".to_string())]);
        let mut bcp = sample_bcp();
        normalize_synonyms(&mut bcp, &table);
        assert_eq!(bcp.material.forms, vec!["film".to_string()]);

        assert_eq!(table.normalize("pellet"), "pellet");
    }

    #[test]
    fn identical_bcps_are_a_duplicate() {
        let existing = sample_bcp();
        let mut incoming = existing.clone();
        incoming.bcp_id = BcpId::now_v7();
        incoming.metadata.version = 7;
        assert_eq!(compare_bcp_versions(&existing, &incoming), VersionDecision::Duplicate);
    }

    #[test]
    fn widened_spec_window_is_a_plain_update() {
        let existing = sample_bcp();
        let mut incoming = existing.clone();
        incoming.specification.mfi_max = Some(1.2);
        assert_eq!(compare_bcp_versions(&existing, &incoming), VersionDecision::Update);
    }

    #[test]
    fn disjoint_spec_windows_are_flagged_as_contradiction() {
        let existing = sample_bcp();
        let mut incoming = existing.clone();
        incoming.specification.mfi_min = Some(5.0);
        incoming.specification.mfi_max = Some(6.0);
        match compare_bcp_versions(&existing, &incoming) {
            VersionDecision::Contradiction(issues) => assert!(!issues.is_empty()),
            other => panic!("expected Contradiction, got {other:?}"),
        }
    }

    #[test]
    fn polymer_change_is_a_contradiction() {
        let existing = sample_bcp();
        let mut incoming = existing.clone();
        incoming.material.polymer = "PP".to_string();
        match compare_bcp_versions(&existing, &incoming) {
            VersionDecision::Contradiction(_) => {}
            other => panic!("expected Contradiction, got {other:?}"),
        }
    }

    #[test]
    fn bump_version_increments_in_place() {
        let mut bcp = sample_bcp();
        bump_version(&mut bcp);
        assert_eq!(bcp.metadata.version, 2);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn completeness_is_always_in_unit_range(
            has_mfi in any::<bool>(),
            has_geo in any::<bool>(),
            has_pricing in any::<bool>(),
        ) {
            let mut bcp = super::tests_support::minimal_bcp();
            if has_mfi {
                bcp.specification.mfi_min = Some(0.1);
            }
            if has_geo {
                bcp.geography.countries.push("US".to_string());
            }
            if has_pricing {
                bcp.pricing_band.min = Some(0.1);
            }
            let score = completeness(&CanonicalPayload::Bcp(bcp));
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}

#[cfg(test)]
mod tests_support {
    use plasticos_core::{
        BcpId, BuyerCriteriaProfile, ContaminationTolerance, EntityIdType, GeographyConstraint,
        LogisticsConstraint, MaterialDescriptor, PayloadMetadata, PricingBand, SpecificationWindow,
    };

    pub fn minimal_bcp() -> BuyerCriteriaProfile {
        BuyerCriteriaProfile {
            bcp_id: BcpId::now_v7(),
            company_name: "Acme".to_string(),
            buyer_location: "Detroit, MI".to_string(),
            segments: vec![],
            external_ids: vec![],
            material: MaterialDescriptor {
                polymer: "PP".to_string(),
                forms: vec![],
                colors: vec![],
                applications: vec![],
                process: vec![],
            },
            specification: SpecificationWindow {
                mfi_min: None,
                mfi_max: None,
                density_min: None,
                density_max: None,
                ash_max: None,
                filler_types: vec![],
            },
            contamination: ContaminationTolerance {
                max_ppm: None,
                banned: vec![],
            },
            certifications: vec![],
            pricing_band: PricingBand {
                min: None,
                max: None,
                currency: None,
                incoterm: None,
            },
            geography: GeographyConstraint {
                countries: vec![],
                states: vec![],
                regions: vec![],
                ports: vec![],
            },
            logistics: LogisticsConstraint {
                min_load_lbs: None,
                max_lane_distance_miles: None,
            },
            metadata: PayloadMetadata {
                version: 1,
                source: "test".to_string(),
                completeness_score: 0.0,
            },
        }
    }
}
