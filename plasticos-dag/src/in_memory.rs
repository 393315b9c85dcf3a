//! In-memory `EventDag` implementation, used by tests across the workspace
//! and by `plasticos-storage`'s `InMemoryHypergraphStore` for its
//! `hyperedge_log`.

use crate::dag::{EventDag, EventDagExt};
use plasticos_core::{DagPosition, Effect, ErrorEffect, Event, EventFlags, EventId, EventKind, UpstreamSignal};
use std::collections::HashMap;
use std::sync::Mutex;

struct Inner<P> {
    events: Vec<Event<P>>,
    by_id: HashMap<EventId, usize>,
    next_sequence: HashMap<u32, u32>,
    signals: Vec<(EventId, UpstreamSignal)>,
}

/// An in-memory, single-process `EventDag`. Ancestor/descendant queries are
/// defined purely in terms of `DagPosition` (same lane, lower/higher depth)
/// rather than explicit parent pointers, matching `DagPosition::is_ancestor_of`.
pub struct InMemoryEventDag<P> {
    inner: Mutex<Inner<P>>,
}

impl<P: Clone + Send + Sync> Default for InMemoryEventDag<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Clone + Send + Sync> InMemoryEventDag<P> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                events: Vec::new(),
                by_id: HashMap::new(),
                next_sequence: HashMap::new(),
                signals: Vec::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn signals_for(&self, event_id: EventId) -> Vec<UpstreamSignal> {
        self.inner
            .lock()
            .unwrap()
            .signals
            .iter()
            .filter(|(id, _)| *id == event_id)
            .map(|(_, s)| s.clone())
            .collect()
    }
}

impl<P: Clone + Send + Sync> EventDag for InMemoryEventDag<P> {
    type Payload = P;

    fn append(&self, event: Event<P>) -> Effect<EventId> {
        let mut inner = self.inner.lock().unwrap();
        let id = event.id();
        if inner.by_id.contains_key(&id) {
            return Effect::Err(ErrorEffect::Domain {
                message: format!("event {id} already appended"),
            });
        }
        inner.by_id.insert(id, inner.events.len());
        inner.events.push(event);
        Effect::Ok(id)
    }

    fn read(&self, event_id: EventId) -> Effect<Event<P>> {
        let inner = self.inner.lock().unwrap();
        match inner.by_id.get(&event_id).map(|&idx| inner.events[idx].clone()) {
            Some(event) => Effect::Ok(event),
            None => Effect::Err(ErrorEffect::Domain {
                message: format!("no such event: {event_id}"),
            }),
        }
    }

    fn walk_ancestors(&self, from: EventId, limit: usize) -> Effect<Vec<Event<P>>> {
        let inner = self.inner.lock().unwrap();
        let Some(&idx) = inner.by_id.get(&from) else {
            return Effect::Err(ErrorEffect::Domain {
                message: format!("no such event: {from}"),
            });
        };
        let origin = inner.events[idx].position();
        let mut ancestors: Vec<Event<P>> = inner
            .events
            .iter()
            .filter(|e| e.position().is_ancestor_of(&origin))
            .cloned()
            .collect();
        ancestors.sort_by(|a, b| b.position().depth.cmp(&a.position().depth));
        ancestors.truncate(limit);
        Effect::Ok(ancestors)
    }

    fn walk_descendants(&self, from: EventId, limit: usize) -> Effect<Vec<Event<P>>> {
        let inner = self.inner.lock().unwrap();
        let Some(&idx) = inner.by_id.get(&from) else {
            return Effect::Err(ErrorEffect::Domain {
                message: format!("no such event: {from}"),
            });
        };
        let origin = inner.events[idx].position();
        let mut descendants: Vec<Event<P>> = inner
            .events
            .iter()
            .filter(|e| origin.is_ancestor_of(&e.position()))
            .cloned()
            .collect();
        descendants.sort_by_key(|e| e.position().depth);
        descendants.truncate(limit);
        Effect::Ok(descendants)
    }

    fn signal_upstream(&self, from: EventId, signal: UpstreamSignal) -> Effect<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.by_id.contains_key(&from) {
            return Effect::Err(ErrorEffect::Domain {
                message: format!("no such event: {from}"),
            });
        }
        inner.signals.push((from, signal));
        Effect::Ok(())
    }

    /// Interprets "correlation chain" as every event sharing the anchor
    /// event's lane, ordered by depth — the events belonging to the same
    /// job/pipeline run as `correlation_id`.
    fn find_correlation_chain(&self, correlation_id: EventId) -> Effect<Vec<Event<P>>> {
        let inner = self.inner.lock().unwrap();
        let Some(&idx) = inner.by_id.get(&correlation_id) else {
            return Effect::Err(ErrorEffect::Domain {
                message: format!("no such event: {correlation_id}"),
            });
        };
        let lane = inner.events[idx].position().lane;
        let mut chain: Vec<Event<P>> = inner
            .events
            .iter()
            .filter(|e| e.position().lane == lane)
            .cloned()
            .collect();
        chain.sort_by_key(|e| e.position().depth);
        Effect::Ok(chain)
    }

    fn next_position(&self, parent: Option<EventId>, lane: u32) -> Effect<DagPosition> {
        let mut inner = self.inner.lock().unwrap();
        let depth = match parent {
            None => 0,
            Some(parent_id) => match inner.by_id.get(&parent_id) {
                Some(&idx) => inner.events[idx].position().depth + 1,
                None => {
                    return Effect::Err(ErrorEffect::Domain {
                        message: format!("no such parent event: {parent_id}"),
                    })
                }
            },
        };
        let sequence = inner.next_sequence.entry(lane).or_insert(0);
        let position = DagPosition::new(depth, lane, *sequence);
        *sequence += 1;
        Effect::Ok(position)
    }

    fn find_by_kind(
        &self,
        kind: EventKind,
        min_depth: u32,
        max_depth: u32,
        limit: usize,
    ) -> Effect<Vec<Event<P>>> {
        let inner = self.inner.lock().unwrap();
        let mut found: Vec<Event<P>> = inner
            .events
            .iter()
            .filter(|e| {
                e.kind() == kind && e.position().depth >= min_depth && e.position().depth <= max_depth
            })
            .cloned()
            .collect();
        found.truncate(limit);
        Effect::Ok(found)
    }

    fn acknowledge(&self, event_id: EventId, send_upstream: bool) -> Effect<()> {
        let mut inner = self.inner.lock().unwrap();
        let Some(&idx) = inner.by_id.get(&event_id) else {
            return Effect::Err(ErrorEffect::Domain {
                message: format!("no such event: {event_id}"),
            });
        };
        inner.events[idx].header.flags |= EventFlags::ACKNOWLEDGED;
        if send_upstream {
            inner.signals.push((event_id, UpstreamSignal::Ack { event_id }));
        }
        Effect::Ok(())
    }

    fn unacknowledged(&self, limit: usize) -> Effect<Vec<Event<P>>> {
        let inner = self.inner.lock().unwrap();
        let mut pending: Vec<Event<P>> = inner
            .events
            .iter()
            .filter(|e| e.header.requires_ack() && !e.header.flags.contains(EventFlags::ACKNOWLEDGED))
            .cloned()
            .collect();
        pending.truncate(limit);
        Effect::Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_root_then_child_preserves_ancestry() {
        let dag: InMemoryEventDag<&str> = InMemoryEventDag::new();
        let root = dag.append_root("root").into_result().unwrap();
        let child = dag.append_child(root, "child").into_result().unwrap();

        let ancestors = dag.walk_ancestors(child, 10).into_result().unwrap();
        assert_eq!(ancestors.len(), 1);
        assert_eq!(ancestors[0].id(), root);

        assert!(dag.is_ancestor(root, child).into_result().unwrap());
        assert!(!dag.is_ancestor(child, root).into_result().unwrap());
    }

    #[test]
    fn find_correlation_chain_returns_same_lane_events() {
        let dag: InMemoryEventDag<&str> = InMemoryEventDag::new();
        let root = dag.append_root("root").into_result().unwrap();
        let child = dag.append_child(root, "child").into_result().unwrap();
        let other_lane = dag.fork(root, 1, "forked").into_result().unwrap();

        let chain = dag.find_correlation_chain(root).into_result().unwrap();
        let ids: Vec<_> = chain.iter().map(|e| e.id()).collect();
        assert!(ids.contains(&root));
        assert!(ids.contains(&child));
        assert!(!ids.contains(&other_lane));
    }

    #[test]
    fn acknowledge_marks_event_and_clears_unacknowledged() {
        let dag: InMemoryEventDag<&str> = InMemoryEventDag::new();
        let position = dag.next_position(None, 0).into_result().unwrap();
        let mut header = plasticos_core::EventHeader::new(EventKind::DATA, position);
        header.flags |= EventFlags::REQUIRES_ACK;
        let event = Event::new(header, "needs-ack");
        let id = dag.append(event).into_result().unwrap();

        assert_eq!(dag.unacknowledged(10).into_result().unwrap().len(), 1);
        dag.acknowledge(id, true).into_result().unwrap();
        assert_eq!(dag.unacknowledged(10).into_result().unwrap().len(), 0);
        assert_eq!(dag.signals_for(id).len(), 1);
    }
}
