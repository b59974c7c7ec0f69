//! Events and listener registration
//!
//! Listeners are plain registrations (target, event type, phase). The document
//! computes which registrations an event reaches; whoever owns a `ListenerId`
//! decides what delivery means. This keeps the element tree free of boxed
//! callbacks that would need to borrow their owners.

use slotmap::{new_key_type, SlotMap};

use crate::document::NodeId;

/// Event type names used across the framework
pub mod event_types {
    pub const SCROLL: &str = "scroll";
    pub const MOUSEOVER: &str = "mouseover";
    pub const MOUSEOUT: &str = "mouseout";
    pub const CLICK: &str = "click";
    pub const MOUSEDOWN: &str = "mousedown";
    pub const TOUCHSTART: &str = "touchstart";
    pub const FOCUS: &str = "focus";
    pub const BLUR: &str = "blur";
}

new_key_type! {
    /// Handle to a registered listener
    pub struct ListenerId;
}

/// Phase a listener is registered for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerPhase {
    /// Receives the event on the way down, before the target
    Capture,
    /// Receives the event on the way back up, after the target
    Bubble,
}

/// A dispatched event
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub event_type: String,
    pub target: NodeId,
    pub bubbles: bool,
}

impl Event {
    /// Create an event with the platform's default bubbling behavior for its type
    pub fn new(event_type: impl Into<String>, target: NodeId) -> Self {
        let event_type = event_type.into();
        let bubbles = bubbles_by_default(&event_type);
        Self {
            event_type,
            target,
            bubbles,
        }
    }
}

fn bubbles_by_default(event_type: &str) -> bool {
    !matches!(
        event_type,
        "scroll" | "focus" | "blur" | "load" | "mouseenter" | "mouseleave"
    )
}

#[derive(Clone, Debug)]
struct Listener {
    target: NodeId,
    event_type: String,
    phase: ListenerPhase,
    /// Registration order, slotmap iteration order is not insertion order
    seq: u64,
}

/// Storage for listener registrations
#[derive(Default)]
pub(crate) struct ListenerTable {
    entries: SlotMap<ListenerId, Listener>,
    next_seq: u64,
}

impl ListenerTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(
        &mut self,
        target: NodeId,
        event_type: String,
        phase: ListenerPhase,
    ) -> ListenerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(Listener {
            target,
            event_type,
            phase,
            seq,
        })
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        self.entries.remove(id).is_some()
    }

    pub(crate) fn contains(&self, id: ListenerId) -> bool {
        self.entries.contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Listeners on `target` for `event_type` in registration order
    ///
    /// `phase` of `None` matches both phases (delivery at the target itself).
    pub(crate) fn matching(
        &self,
        target: NodeId,
        event_type: &str,
        phase: Option<ListenerPhase>,
    ) -> Vec<ListenerId> {
        let mut found: Vec<(u64, ListenerId)> = self
            .entries
            .iter()
            .filter(|(_, l)| {
                l.target == target
                    && l.event_type == event_type
                    && phase.map_or(true, |p| l.phase == p)
            })
            .map(|(id, l)| (l.seq, id))
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        found.into_iter().map(|(_, id)| id).collect()
    }
}
