//! Identity types for PlasticOS entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// ENTITY ID TYPE SYSTEM
// ============================================================================

/// Trait for type-safe entity IDs.
///
/// Provides compile-time safety by ensuring entity IDs cannot be accidentally
/// mixed up. Each entity type gets its own strongly-typed ID.
pub trait EntityIdType:
    Copy
    + Clone
    + Eq
    + PartialEq
    + Hash
    + fmt::Debug
    + fmt::Display
    + FromStr
    + Serialize
    + serde::de::DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// The name of the entity type (e.g., "bcp", "supplier_offering").
    const ENTITY_NAME: &'static str;

    fn new(uuid: Uuid) -> Self;
    fn as_uuid(&self) -> Uuid;

    fn nil() -> Self {
        Self::new(Uuid::nil())
    }

    /// Create a new timestamp-sortable UUIDv7 ID.
    fn now_v7() -> Self {
        Self::new(Uuid::now_v7())
    }

    fn new_v4() -> Self {
        Self::new(Uuid::new_v4())
    }
}

#[derive(Debug, Clone)]
pub struct EntityIdParseError {
    pub entity_name: &'static str,
    pub input: String,
    pub source: uuid::Error,
}

impl fmt::Display for EntityIdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to parse {} ID from '{}': {}",
            self.entity_name, self.input, self.source
        )
    }
}

impl std::error::Error for EntityIdParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

macro_rules! define_entity_id {
    ($name:ident, $entity:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            const ENTITY_NAME: &'static str = $entity;

            fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = EntityIdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::from_str(s)
                    .map(Self::new)
                    .map_err(|e| EntityIdParseError {
                        entity_name: Self::ENTITY_NAME,
                        input: s.to_string(),
                        source: e,
                    })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::nil()
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                self.0.serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                Uuid::deserialize(deserializer).map(Self::new)
            }
        }
    };
}

// ============================================================================
// ENTITY ID TYPES
// ============================================================================

define_entity_id!(BcpId, "bcp", "Type-safe ID for a BuyerCriteriaProfile hyperedge version.");
define_entity_id!(
    SupplierOfferingId,
    "supplier_offering",
    "Type-safe ID for a SupplierOffering hyperedge."
);
define_entity_id!(
    TransactionId,
    "transaction",
    "Type-safe ID for a TransactionRecord hyperedge."
);
define_entity_id!(JobId, "research_job", "Type-safe ID for a Research DAG job run.");
define_entity_id!(QueryId, "planned_query", "Type-safe ID for a planned query within a job.");
define_entity_id!(
    HyperedgeVersionId,
    "hyperedge_version",
    "Type-safe ID for a specific version of a hyperedge, recorded in the hyperedge log."
);
define_entity_id!(
    MatchRunId,
    "match_run",
    "Type-safe ID for a single invocation of the Matching Engine."
);

// ============================================================================
// OTHER IDENTITY TYPES
// ============================================================================

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Duration in milliseconds for timeout values.
pub type DurationMs = i64;

/// SHA-256 content hash, used to derive deterministic hyperedge keys.
pub type ContentHash = [u8; 32];

/// Compute SHA-256 hash of content.
pub fn compute_content_hash(content: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_type_safety() {
        let bcp_id = BcpId::now_v7();
        let tx_id = TransactionId::now_v7();
        assert_ne!(bcp_id.as_uuid(), tx_id.as_uuid());
    }

    #[test]
    fn test_entity_id_display() {
        let id = BcpId::new(Uuid::nil());
        assert_eq!(
            format!("{:?}", id),
            "BcpId(00000000-0000-0000-0000-000000000000)"
        );
        assert_eq!(format!("{}", id), "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn test_entity_id_from_str() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id: BcpId = uuid_str.parse().expect("valid UUID should parse");
        assert_eq!(id.to_string(), uuid_str);
    }

    #[test]
    fn test_entity_id_parse_error() {
        let result: Result<BcpId, _> = "invalid".parse();
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.entity_name, "bcp");
        assert_eq!(err.input, "invalid");
    }

    #[test]
    fn test_entity_id_serde() {
        let id = BcpId::now_v7();
        let json = serde_json::to_string(&id).expect("serialization should succeed");
        assert!(json.starts_with('"'));
        assert!(json.ends_with('"'));

        let deserialized: BcpId =
            serde_json::from_str(&json).expect("deserialization should succeed");
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_entity_id_default() {
        let id = BcpId::default();
        assert_eq!(id, BcpId::nil());
    }

    #[test]
    fn test_all_entity_types() {
        let _bcp = BcpId::now_v7();
        let _offering = SupplierOfferingId::now_v7();
        let _tx = TransactionId::now_v7();
        let _job = JobId::now_v7();
        let _query = QueryId::now_v7();
        let _version = HyperedgeVersionId::now_v7();
        let _match_run = MatchRunId::now_v7();
    }

    #[test]
    fn test_content_hash_deterministic() {
        let a = compute_content_hash(b"Padnos|Wyoming,MI|HDPE");
        let b = compute_content_hash(b"Padnos|Wyoming,MI|HDPE");
        assert_eq!(a, b);
        let c = compute_content_hash(b"Acme|Detroit,MI|PP");
        assert_ne!(a, c);
    }
}
