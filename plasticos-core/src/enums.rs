//! Enum types for PlasticOS entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Discriminates the kind of fact a hyperedge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EdgeType {
    /// Buyer Criteria Profile: `(company, location, polymer_family)`.
    Bcp,
    /// A single supplier intake event.
    SupplierOffering,
    /// A closed-deal record. Append-only once written.
    Transaction,
}

/// Severity of a validation finding. Errors block storage; warnings do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// How a field's value was obtained during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ExtractionMethod {
    /// Present verbatim in the retrieved source.
    Direct,
    /// Derived from other fields (e.g. region from state).
    Derived,
    /// Filled from a synonym/default table.
    Normalized,
    /// Supplied by a reasoning block (e.g. ambiguity resolution).
    ReasoningBlock,
}

/// Pluggable research-retrieval backend, selected via configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ResearchClientKind {
    Perplexity,
    Gemini,
    Openai,
    Stub,
}

/// Vector index backend for the embedding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum VectorIndexType {
    Hnsw,
    IvfFlat,
}

/// Terminal status of a Research DAG job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum JobStatus {
    /// All planned queries succeeded.
    Success,
    /// At least one planned query failed but others completed; some BCPs written.
    Partial,
    /// Meta-plan failed; job aborted before any work was done.
    Failed,
    /// The job's overall deadline elapsed; a partial result was returned.
    TimedOut,
}

/// Reasoning Block Registry exposure policy: which blocks domain agents may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum BlockExposure {
    /// Available to L9 only: world model mutation, BCP creation.
    Strategic,
    /// Safe for PlasticOS (domain agents) to invoke inline.
    DomainSafe,
}

/// Outcome of a single rule gate evaluated during matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum GateResult {
    Passed,
    Failed,
}

// ============================================================================
// STRING CONVERSIONS
// ============================================================================

fn normalize_token(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            EdgeType::Bcp => "bcp",
            EdgeType::SupplierOffering => "supplier_offering",
            EdgeType::Transaction => "transaction",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "bcp" => Ok(EdgeType::Bcp),
            "supplieroffering" => Ok(EdgeType::SupplierOffering),
            "transaction" => Ok(EdgeType::Transaction),
            _ => Err(format!("Invalid EdgeType: {}", s)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(format!("Invalid Severity: {}", s)),
        }
    }
}

impl fmt::Display for ResearchClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ResearchClientKind::Perplexity => "perplexity",
            ResearchClientKind::Gemini => "gemini",
            ResearchClientKind::Openai => "openai",
            ResearchClientKind::Stub => "stub",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for ResearchClientKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "perplexity" => Ok(ResearchClientKind::Perplexity),
            "gemini" => Ok(ResearchClientKind::Gemini),
            "openai" => Ok(ResearchClientKind::Openai),
            "stub" => Ok(ResearchClientKind::Stub),
            _ => Err(format!("Invalid ResearchClientKind: {}", s)),
        }
    }
}

impl fmt::Display for VectorIndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            VectorIndexType::Hnsw => "hnsw",
            VectorIndexType::IvfFlat => "ivfflat",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for VectorIndexType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "hnsw" => Ok(VectorIndexType::Hnsw),
            "ivfflat" | "ivf" => Ok(VectorIndexType::IvfFlat),
            _ => Err(format!("Invalid VectorIndexType: {}", s)),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            JobStatus::Success => "success",
            JobStatus::Partial => "partial",
            JobStatus::Failed => "failed",
            JobStatus::TimedOut => "timed_out",
        };
        write!(f, "{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_type_round_trips() {
        for edge_type in [EdgeType::Bcp, EdgeType::SupplierOffering, EdgeType::Transaction] {
            let s = edge_type.to_string();
            assert_eq!(s.parse::<EdgeType>().unwrap(), edge_type);
        }
    }

    #[test]
    fn edge_type_parse_is_case_and_separator_insensitive() {
        assert_eq!(
            "Supplier-Offering".parse::<EdgeType>().unwrap(),
            EdgeType::SupplierOffering
        );
        assert_eq!(
            "supplier_offering".parse::<EdgeType>().unwrap(),
            EdgeType::SupplierOffering
        );
    }

    #[test]
    fn research_client_kind_round_trips() {
        for kind in [
            ResearchClientKind::Perplexity,
            ResearchClientKind::Gemini,
            ResearchClientKind::Openai,
            ResearchClientKind::Stub,
        ] {
            assert_eq!(kind.to_string().parse::<ResearchClientKind>().unwrap(), kind);
        }
    }

    #[test]
    fn invalid_edge_type_is_rejected() {
        assert!("widget".parse::<EdgeType>().is_err());
    }
}
