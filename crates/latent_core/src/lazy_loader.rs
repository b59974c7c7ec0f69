//! Lazy-loading controller
//!
//! [`LazyLoader`] ties the pieces together for one root element:
//!
//! - a capture-phase listener on the root per interaction event type, which
//!   activates the event target with the event type as trigger
//! - a [`ScrollDebouncer`] that reports when a scroll gesture has settled,
//!   after which the root is rescanned
//! - one scan immediately on start
//!
//! The controller does not own the document, timers or factory. The host
//! hands them in through a [`LoaderContext`] whenever it delivers a listener
//! or timer that the controller owns.
//!
//! # Example
//!
//! ```rust
//! use latent_core::{LazyLoadOverrides, LazyLoader, LoaderContext, ModuleRegistry};
//! use latent_dom::{Document, TimerQueue};
//!
//! let mut document = Document::new();
//! let mut timers = TimerQueue::new();
//! let mut registry = ModuleRegistry::new();
//! let root = document.body();
//!
//! let mut cx = LoaderContext {
//!     document: &mut document,
//!     timers: &mut timers,
//!     factory: &mut registry,
//! };
//! let mut loader = LazyLoader::start(&mut cx, root, &LazyLoadOverrides::default()).unwrap();
//! assert!(loader.is_active());
//!
//! loader.stop(&mut document, &mut timers);
//! assert_eq!(document.listener_count(), 0);
//! ```

use latent_dom::{Document, Event, ListenerId, ListenerPhase, NodeId, TimerId, TimerQueue};
use smallvec::SmallVec;

use crate::activation::try_activate;
use crate::error::Result;
use crate::module::ModuleFactory;
use crate::options::{LazyLoadOptions, LazyLoadOverrides};
use crate::scanner::{self, ScanReport, ScrollTarget};
use crate::scroll_settle::{PollOutcome, ScrollDebouncer, ScrollPosition, SettlePhase};

/// Host resources a controller works on during one delivery
pub struct LoaderContext<'a> {
    pub document: &'a mut Document,
    pub timers: &'a mut TimerQueue,
    pub factory: &'a mut dyn ModuleFactory,
}

/// Running totals of a controller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Scans performed (initial scan plus one per settled gesture)
    pub scans: usize,
    /// Elements activated by scans or interactions
    pub activations: usize,
    /// Activations whose module creation failed
    pub failures: usize,
}

#[derive(Debug)]
struct ActiveLoader {
    interaction_listeners: SmallVec<[ListenerId; 2]>,
    debouncer: ScrollDebouncer,
    scroll_target: ScrollTarget,
}

#[derive(Debug)]
enum LoaderState {
    Active(Box<ActiveLoader>),
    Disposed,
}

/// What a listener delivery turned out to be
enum Delivery {
    Scroll,
    Interaction,
}

/// Lazy-loading controller for one root element
#[derive(Debug)]
pub struct LazyLoader {
    root: NodeId,
    options: LazyLoadOptions,
    state: LoaderState,
    stats: LoaderStats,
}

impl LazyLoader {
    /// Register listeners on `root` and the document, then scan once
    ///
    /// Options are merged and validated before anything is registered, so a
    /// configuration error leaves the document untouched.
    pub fn start(
        cx: &mut LoaderContext<'_>,
        root: NodeId,
        overrides: &LazyLoadOverrides,
    ) -> Result<Self> {
        let options = LazyLoadOptions::merged(overrides)?;

        let interaction_listeners = options
            .interaction_events
            .iter()
            .map(|event_type| {
                cx.document
                    .add_event_listener(root, event_type.as_str(), ListenerPhase::Capture)
            })
            .collect();
        let debouncer = ScrollDebouncer::attach(cx.document, options.scroll_timeout);
        let scroll_target = ScrollTarget::new(options.scroll_element);

        tracing::debug!(
            "Starting lazy loading on element {} (interaction events {:?})",
            root.to_raw(),
            options.interaction_events
        );

        let mut loader = Self {
            root,
            options,
            state: LoaderState::Active(Box::new(ActiveLoader {
                interaction_listeners,
                debouncer,
                scroll_target,
            })),
            stats: LoaderStats::default(),
        };

        loader.scan(cx);

        // A page still at the top cannot tell <body> from <html> yet
        if let LoaderState::Active(active) = &mut loader.state {
            active.scroll_target.forget_if_unscrolled(cx.document);
        }

        Ok(loader)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, LoaderState::Active(_))
    }

    /// Totals so far; still readable after [`LazyLoader::stop`]
    pub fn stats(&self) -> LoaderStats {
        self.stats
    }

    pub fn options(&self) -> &LazyLoadOptions {
        &self.options
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Settle phase, or `None` once stopped
    pub fn phase(&self) -> Option<SettlePhase> {
        match &self.state {
            LoaderState::Active(active) => Some(active.debouncer.phase()),
            LoaderState::Disposed => None,
        }
    }

    pub fn owns_listener(&self, id: ListenerId) -> bool {
        match &self.state {
            LoaderState::Active(active) => {
                active.debouncer.owns_listener(id) || active.interaction_listeners.contains(&id)
            }
            LoaderState::Disposed => false,
        }
    }

    pub fn owns_timer(&self, id: TimerId) -> bool {
        match &self.state {
            LoaderState::Active(active) => active.debouncer.owns_timer(id),
            LoaderState::Disposed => false,
        }
    }

    /// Deliver a listener invocation
    ///
    /// Returns whether the listener belonged to this controller.
    pub fn handle_event(
        &mut self,
        cx: &mut LoaderContext<'_>,
        listener: ListenerId,
        event: &Event,
    ) -> bool {
        let LoaderState::Active(active) = &mut self.state else {
            return false;
        };

        let delivery = if active.debouncer.owns_listener(listener) {
            Delivery::Scroll
        } else if active.interaction_listeners.contains(&listener) {
            Delivery::Interaction
        } else {
            return false;
        };

        match delivery {
            Delivery::Scroll => {
                active.debouncer.on_scroll(cx.document, cx.timers);
            }
            Delivery::Interaction => self.handle_interaction(cx, event),
        }

        true
    }

    /// Activate the target of a pointer interaction, without scanning
    pub fn handle_interaction(&mut self, cx: &mut LoaderContext<'_>, event: &Event) {
        if !self.is_active() {
            return;
        }

        match try_activate(cx.document, &mut *cx.factory, event.target, &event.event_type) {
            Ok(true) => self.stats.activations += 1,
            Ok(false) => {}
            Err(err) => {
                tracing::error!(
                    "Failed to create lazy modules for element {} on {}: {}",
                    event.target.to_raw(),
                    event.event_type,
                    err
                );
                self.stats.failures += 1;
            }
        }
    }

    /// Deliver a timer tick
    ///
    /// Returns whether the timer belonged to this controller. A tick that
    /// settles the current gesture triggers a scan.
    pub fn handle_timer(&mut self, cx: &mut LoaderContext<'_>, timer: TimerId) -> bool {
        let LoaderState::Active(active) = &mut self.state else {
            return false;
        };
        if !active.debouncer.owns_timer(timer) {
            return false;
        }

        let container = active.scroll_target.resolve(cx.document);
        let position = ScrollPosition::of(cx.document, container);
        if active.debouncer.on_poll(cx.document, cx.timers, position) == PollOutcome::Settled {
            self.scan(cx);
        }

        true
    }

    /// Scan the root now, or return `None` once stopped
    pub fn scan(&mut self, cx: &mut LoaderContext<'_>) -> Option<ScanReport> {
        let LoaderState::Active(active) = &mut self.state else {
            return None;
        };

        let container = active.scroll_target.resolve(cx.document);
        let report = scanner::scan(cx.document, &mut *cx.factory, self.root, container);

        self.stats.scans += 1;
        self.stats.activations += report.activated;
        self.stats.failures += report.failed;

        Some(report)
    }

    /// Remove every listener and timer and dispose the controller
    ///
    /// Stopping twice is a no-op.
    pub fn stop(&mut self, document: &mut Document, timers: &mut TimerQueue) {
        let LoaderState::Active(active) = std::mem::replace(&mut self.state, LoaderState::Disposed)
        else {
            return;
        };

        let ActiveLoader {
            interaction_listeners,
            debouncer,
            ..
        } = *active;

        for listener in interaction_listeners {
            document.remove_event_listener(listener);
        }
        debouncer.detach(document, timers);

        tracing::debug!(
            "Stopped lazy loading on element {} after {} scans",
            self.root.to_raw(),
            self.stats.scans
        );
    }
}
