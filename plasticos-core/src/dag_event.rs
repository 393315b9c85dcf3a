//! Generic event/DAG primitives shared by `plasticos-dag`'s `EventDag` trait.
//!
//! Events flow forward (downstream) through the DAG; `UpstreamSignal`s flow
//! backward for acknowledgment and backpressure (the "tram car tracks"
//! pattern). This is the spine used both for the five-pass Research DAG's
//! stage-to-stage handoff and for the literal append-only `hyperedge_log`.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an event.
pub type EventId = Uuid;

/// Position of an event in the DAG: `depth` from root, parallel `lane`, and a
/// monotonic `sequence` within the lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[repr(C)]
pub struct DagPosition {
    pub depth: u32,
    pub lane: u32,
    pub sequence: u32,
}

impl DagPosition {
    pub const fn new(depth: u32, lane: u32, sequence: u32) -> Self {
        Self {
            depth,
            lane,
            sequence,
        }
    }

    pub const fn root() -> Self {
        Self::new(0, 0, 0)
    }

    pub const fn child(&self, sequence: u32) -> Self {
        Self::new(self.depth + 1, self.lane, sequence)
    }

    pub const fn fork(&self, new_lane: u32, sequence: u32) -> Self {
        Self::new(self.depth + 1, new_lane, sequence)
    }

    pub const fn is_ancestor_of(&self, other: &Self) -> bool {
        self.depth < other.depth && self.lane == other.lane
    }

    pub const fn is_root(&self) -> bool {
        self.depth == 0
    }
}

impl Default for DagPosition {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for DagPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.depth, self.lane, self.sequence)
    }
}

/// Event kind encoded as a 16-bit value: upper 4 bits category, lower 12 bits
/// the specific type within that category.
///
/// Category allocation:
/// - `0x0xxx`: system events
/// - `0x1xxx`: research job / pipeline stage events
/// - `0x2xxx`: hyperedge log events (write, version bump)
/// - `0x3xxx`: world model events (observe, rebuild)
/// - `0x4xxx`: matching run events
/// - `0x5xxx`: reasoning block invocation events
/// - `0xFxxx`: custom/extension events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[repr(transparent)]
pub struct EventKind(pub u16);

impl EventKind {
    pub const DATA: Self = Self(0x0000);

    pub const SYSTEM_INIT: Self = Self(0x0001);
    pub const SYSTEM_SHUTDOWN: Self = Self(0x0002);

    pub const JOB_STARTED: Self = Self(0x1001);
    pub const JOB_STAGE_COMPLETED: Self = Self(0x1002);
    pub const JOB_COMPLETED: Self = Self(0x1003);
    pub const JOB_FAILED: Self = Self(0x1004);

    pub const HYPEREDGE_WRITTEN: Self = Self(0x2001);
    pub const HYPEREDGE_VERSION_BUMPED: Self = Self(0x2002);
    pub const HYPEREDGE_PROJECTION_FAILED: Self = Self(0x2003);

    pub const TRANSACTION_CLOSED: Self = Self(0x3001);
    pub const WORLD_MODEL_REBUILT: Self = Self(0x3002);

    pub const MATCH_RUN_COMPLETED: Self = Self(0x4001);

    pub const REASONING_BLOCK_INVOKED: Self = Self(0x5001);

    pub const fn category(&self) -> u8 {
        (self.0 >> 12) as u8
    }

    pub const fn type_id(&self) -> u16 {
        self.0 & 0x0FFF
    }

    pub const fn custom(category: u8, type_id: u16) -> Self {
        Self(((category as u16) << 12) | (type_id & 0x0FFF))
    }

    pub const fn is_system(&self) -> bool {
        self.category() == 0
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06X}", self.0)
    }
}

bitflags! {
    /// Processing hints for an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventFlags: u8 {
        const REQUIRES_ACK = 0b0000_0001;
        const TRANSACTIONAL = 0b0000_0010;
        const REPLAY        = 0b0000_0100;
        const ACKNOWLEDGED  = 0b0000_1000;
        const CRITICAL      = 0b0001_0000;
    }
}

impl Default for EventFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for EventFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EventFlags {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        Self::from_bits(bits).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid EventFlags bits: {:#04x}", bits))
        })
    }
}

/// Event header: metadata needed to process an event without touching the
/// payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EventHeader {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EventId,
    pub position: DagPosition,
    pub kind: EventKind,
    pub flags: EventFlags,
    /// Microseconds since the Unix epoch.
    pub timestamp_micros: i64,
}

impl EventHeader {
    pub fn new(kind: EventKind, position: DagPosition) -> Self {
        Self {
            id: Uuid::now_v7(),
            position,
            kind,
            flags: EventFlags::empty(),
            timestamp_micros: chrono::Utc::now().timestamp_micros(),
        }
    }

    pub fn requires_ack(&self) -> bool {
        self.flags.contains(EventFlags::REQUIRES_ACK)
    }

    pub fn is_critical(&self) -> bool {
        self.flags.contains(EventFlags::CRITICAL)
    }
}

/// A complete event: header plus a generic payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Event<P> {
    pub header: EventHeader,
    pub payload: P,
}

impl<P> Event<P> {
    pub fn new(header: EventHeader, payload: P) -> Self {
        Self { header, payload }
    }

    pub fn id(&self) -> EventId {
        self.header.id
    }

    pub fn kind(&self) -> EventKind {
        self.header.kind
    }

    pub fn position(&self) -> DagPosition {
        self.header.position
    }

    pub fn map_payload<Q, F: FnOnce(P) -> Q>(self, f: F) -> Event<Q> {
        Event {
            header: self.header,
            payload: f(self.payload),
        }
    }
}

/// Signals sent upstream in the DAG ("tram car tracks"): acknowledgment,
/// backpressure, and cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum UpstreamSignal {
    Ack {
        #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
        event_id: EventId,
    },
    Backpressure {
        until_micros: i64,
    },
    Cancel {
        #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
        correlation_id: EventId,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_category_round_trips() {
        let k = EventKind::custom(0x1, 0x042);
        assert_eq!(k.category(), 0x1);
        assert_eq!(k.type_id(), 0x042);
    }

    #[test]
    fn dag_position_child_advances_depth_only() {
        let root = DagPosition::root();
        let child = root.child(1);
        assert_eq!(child.depth, 1);
        assert_eq!(child.lane, root.lane);
        assert!(root.is_ancestor_of(&child));
    }

    #[test]
    fn event_flags_serde_round_trips() {
        let flags = EventFlags::REQUIRES_ACK | EventFlags::CRITICAL;
        let json = serde_json::to_string(&flags).unwrap();
        let back: EventFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(flags, back);
    }
}
