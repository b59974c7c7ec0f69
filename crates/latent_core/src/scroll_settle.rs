//! Scroll settle detection
//!
//! Turns a burst of scroll events into a single "settled" signal per gesture.
//!
//! While [`SettlePhase::Idle`] a capture-phase scroll listener sits on the
//! document node. The first scroll event removes it and starts a recurring
//! poll timer ([`SettlePhase::Settling`]). Each poll compares the scroll
//! container's position with the last snapshot: a changed position is
//! recorded and polling continues; an unchanged one cancels the timer,
//! re-attaches the listener and reports [`PollOutcome::Settled`].
//!
//! ```text
//!          scroll event
//!   Idle ──────────────▶ Settling ──┐ poll, position changed
//!    ▲                      │  ▲────┘
//!    └──────────────────────┘
//!     poll, position unchanged
//! ```

use std::time::Duration;

use latent_dom::{event_types, Document, ListenerId, ListenerPhase, NodeId, TimerId, TimerQueue};

/// Scroll offsets of a container
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollPosition {
    pub left: f32,
    pub top: f32,
}

impl ScrollPosition {
    /// Current scroll offsets of `node`
    pub fn of(document: &Document, node: NodeId) -> Self {
        let (left, top) = document.scroll_offset(node);
        Self { left, top }
    }
}

/// Debouncer phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SettlePhase {
    /// Listening for the next scroll event
    #[default]
    Idle,
    /// Polling until the position stops changing
    Settling,
}

/// Inputs driving [`SettlePhase`] transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettleEvent {
    Scroll,
    PositionChanged,
    PositionUnchanged,
}

impl SettlePhase {
    /// Next phase for `event`, or `None` if the event is ignored here
    pub fn on_event(&self, event: SettleEvent) -> Option<Self> {
        match (self, event) {
            (SettlePhase::Idle, SettleEvent::Scroll) => Some(SettlePhase::Settling),
            (SettlePhase::Settling, SettleEvent::PositionChanged) => Some(SettlePhase::Settling),
            (SettlePhase::Settling, SettleEvent::PositionUnchanged) => Some(SettlePhase::Idle),
            // Scroll while settling cannot normally arrive: the listener is detached
            _ => None,
        }
    }
}

/// Result of one poll tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// Position changed since the last poll; still settling
    Moving,
    /// Position unchanged; the gesture is over
    Settled,
    /// Not settling, nothing was polled
    Ignored,
}

/// Scroll settle state machine bound to a document
#[derive(Debug)]
pub struct ScrollDebouncer {
    phase: SettlePhase,
    listener: Option<ListenerId>,
    timer: Option<TimerId>,
    position: ScrollPosition,
    interval: Duration,
}

impl ScrollDebouncer {
    /// Start idle, listening for scroll on the document node
    pub fn attach(document: &mut Document, interval: Duration) -> Self {
        let listener = Self::listen(document);
        Self {
            phase: SettlePhase::Idle,
            listener: Some(listener),
            timer: None,
            position: ScrollPosition::default(),
            interval,
        }
    }

    fn listen(document: &mut Document) -> ListenerId {
        let root = document.root();
        document.add_event_listener(root, event_types::SCROLL, ListenerPhase::Capture)
    }

    pub fn phase(&self) -> SettlePhase {
        self.phase
    }

    /// Last recorded scroll position
    pub fn position(&self) -> ScrollPosition {
        self.position
    }

    pub fn owns_listener(&self, id: ListenerId) -> bool {
        self.listener == Some(id)
    }

    pub fn owns_timer(&self, id: TimerId) -> bool {
        self.timer == Some(id)
    }

    /// Handle a scroll event, returning whether settling started
    pub fn on_scroll(&mut self, document: &mut Document, timers: &mut TimerQueue) -> bool {
        let Some(next) = self.phase.on_event(SettleEvent::Scroll) else {
            tracing::trace!("Scroll event ignored while {:?}", self.phase);
            return false;
        };

        if let Some(listener) = self.listener.take() {
            document.remove_event_listener(listener);
        }
        self.timer = Some(timers.set_interval(self.interval));
        self.phase = next;

        tracing::trace!("Scroll started, polling every {:?}", self.interval);
        true
    }

    /// Handle a poll tick with the container's `current` position
    pub fn on_poll(
        &mut self,
        document: &mut Document,
        timers: &mut TimerQueue,
        current: ScrollPosition,
    ) -> PollOutcome {
        let event = if current == self.position {
            SettleEvent::PositionUnchanged
        } else {
            SettleEvent::PositionChanged
        };

        let Some(next) = self.phase.on_event(event) else {
            return PollOutcome::Ignored;
        };
        self.phase = next;

        match event {
            SettleEvent::PositionChanged => {
                tracing::trace!("Scroll position moved to {:?}", current);
                self.position = current;
                PollOutcome::Moving
            }
            _ => {
                if let Some(timer) = self.timer.take() {
                    timers.clear(timer);
                }
                self.listener = Some(Self::listen(document));
                tracing::trace!("Scroll settled at {:?}", current);
                PollOutcome::Settled
            }
        }
    }

    /// Remove whatever listener or timer is held
    pub fn detach(mut self, document: &mut Document, timers: &mut TimerQueue) {
        if let Some(listener) = self.listener.take() {
            document.remove_event_listener(listener);
        }
        if let Some(timer) = self.timer.take() {
            timers.clear(timer);
        }
    }
}
