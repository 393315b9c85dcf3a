//! Core entity structures: the canonical data model shared by every crate.

use crate::*;
use serde::{Deserialize, Serialize};

/// Material descriptors for a BCP: polymer family, accepted forms/colors, applications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MaterialDescriptor {
    /// Required. Exact-match key for candidate generation (e.g. "HDPE").
    pub polymer: String,
    pub forms: Vec<String>,
    pub colors: Vec<String>,
    pub applications: Vec<String>,
    pub process: Vec<String>,
}

/// Specification tolerance window for a BCP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SpecificationWindow {
    pub mfi_min: Option<f32>,
    pub mfi_max: Option<f32>,
    pub density_min: Option<f32>,
    pub density_max: Option<f32>,
    pub ash_max: Option<f32>,
    pub filler_types: Vec<String>,
}

/// Contamination tolerance for a BCP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContaminationTolerance {
    pub max_ppm: Option<f32>,
    pub banned: Vec<String>,
}

/// Price band a buyer is willing to pay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PricingBand {
    pub min: Option<f32>,
    pub max: Option<f32>,
    pub currency: Option<String>,
    pub incoterm: Option<String>,
}

/// Accepted geography for a buyer, and logistics constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GeographyConstraint {
    pub countries: Vec<String>,
    pub states: Vec<String>,
    pub regions: Vec<String>,
    pub ports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LogisticsConstraint {
    pub min_load_lbs: Option<f32>,
    pub max_lane_distance_miles: Option<f32>,
}

/// Bookkeeping metadata shared by every canonical payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PayloadMetadata {
    /// Bumped on every re-canonicalization; never decremented.
    pub version: u32,
    pub source: String,
    /// In `[0, 1]`. Computed once at extraction time, never mutated after.
    pub completeness_score: f32,
}

/// BuyerCriteriaProfile — a canonical buyer fact at `(company, location, polymer_family)`
/// granularity. Owned by the Research Factory; domain agents may only propose changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BuyerCriteriaProfile {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub bcp_id: BcpId,
    pub company_name: String,
    pub buyer_location: String,
    pub segments: Vec<String>,
    pub external_ids: Vec<String>,
    pub material: MaterialDescriptor,
    pub specification: SpecificationWindow,
    pub contamination: ContaminationTolerance,
    pub certifications: Vec<String>,
    pub pricing_band: PricingBand,
    pub geography: GeographyConstraint,
    pub logistics: LogisticsConstraint,
    pub metadata: PayloadMetadata,
}

impl BuyerCriteriaProfile {
    /// Stable key identity for this BCP's hyperedge, per spec §3: `Company|Location|Polymer`.
    pub fn hyperedge_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.company_name, self.buyer_location, self.material.polymer
        )
    }

    /// Text used to (re)derive the embedding. Changes to any of these fields
    /// require embedding regeneration (invariant 4).
    pub fn embedding_text(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.company_name,
            self.buyer_location,
            self.material.polymer,
            self.material.forms.join(" "),
            self.material.applications.join(" "),
        )
    }
}

/// SupplierOffering — a single supplier intake event. One per intake; immutable after write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SupplierOffering {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub supplier_offering_id: SupplierOfferingId,
    /// Unique per intake.
    pub supplier_edge_id: String,
    pub supplier_name: String,
    pub material: MaterialDescriptor,
    pub estimated_mfi: Option<f32>,
    pub estimated_density: Option<f32>,
    pub estimated_ppm: Option<f32>,
    pub origin_location: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub intake_at: Timestamp,
}

/// TransactionRecord — a closed-deal hyperedge. Immutable after creation (invariant 7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TransactionRecord {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub transaction_id: TransactionId,
    pub supplier_name: String,
    pub buyer_company_name: String,
    pub buyer_location: String,
    pub polymer: String,
    pub lane_origin: String,
    pub lane_destination: String,
    pub price: f32,
    pub currency: String,
    pub outcome: TransactionOutcome,
    pub claim_notes: Option<String>,
    pub quality_notes: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum TransactionOutcome {
    Completed,
    Disputed,
    Cancelled,
}

/// The generic hyperedge storage unit (spec §3).
///
/// `key` is a stable string identity, unique per `edge_type`; `payload` is the
/// validated schema object serialized as JSON; `embedding` is derived from the
/// payload's canonical text and may be absent while generation is pending
/// (invariant 4, §4.2 failure semantics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Hyperedge {
    pub edge_type: EdgeType,
    pub key: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub payload: serde_json::Value,
    pub embedding: Option<EmbeddingVector>,
    pub version: u32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Hyperedge {
    pub fn identity(&self) -> (EdgeType, &str) {
        (self.edge_type, self.key.as_str())
    }
}

/// Receipt returned by a successful `write_hyperedge` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WriteReceipt {
    pub edge_type: EdgeType,
    pub key: String,
    pub version: u32,
    pub embedding_pending: bool,
}

/// Aggregate facts maintained by the World Model Service, keyed by BCP identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WorldModelEntry {
    pub buyer_score: f32,
    pub supplier_score: f32,
    pub lane_risk_score: f32,
    pub product_stability_score: f32,
    pub transaction_count: u64,
    pub repeat_business_count: u64,
}

/// Cheap, read-optimized snapshot of the whole World Model, taken at the start
/// of a matching pass (design note §9: snapshots are read-only, updates flow
/// one direction only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WorldModelSnapshot {
    pub by_polymer: std::collections::BTreeMap<String, u64>,
    pub by_region: std::collections::BTreeMap<String, u64>,
    pub bcp_count: u64,
    pub supplier_offering_count: u64,
    pub transaction_count: u64,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub taken_at: Timestamp,
}
