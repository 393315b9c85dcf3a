//! Generic append-only event DAG trait and operations.
//!
//! This crate defines the `EventDag` trait for persistent event storage and
//! traversal, without providing a concrete storage backend. It is the spine
//! used two ways in PlasticOS: as the stage-to-stage handoff mechanism for
//! the five-pass Research DAG, and as the literal `hyperedge_log` append-only
//! audit trail (spec §3 invariant 7: TransactionRecord hyperedges are
//! append-only; spec §9 "preserve prior hyperedge versions in the log").
//!
//! Events flow forward (downstream) through the DAG; signals can flow
//! backward (upstream) for coordination (the "tram car tracks" pattern):
//!
//! ```text
//! Events:   Root → Event1 → Event2 → Event3
//!                     ↑         ↑        ↑
//! Signals:  ← Ack ← Ack ← Backpressure
//! ```

mod dag;
mod in_memory;

pub use dag::{EventBuilder, EventDag, EventDagExt};
pub use in_memory::InMemoryEventDag;

pub use plasticos_core::{
    DagPosition, Effect, ErrorEffect, Event, EventFlags, EventHeader, EventId, EventKind,
    UpstreamSignal,
};
