//! Page event loop
//!
//! [`Page`] is the host side of the scheduler: it owns the document, the
//! virtual clock and the module manager, turns host actions (scrolling,
//! pointer events, time passing) into listener and timer deliveries, and
//! routes each delivery to the manager.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use latent_core::{LazyLoadOverrides, ModuleRegistry, Page};
//! use latent_dom::Geometry;
//!
//! let mut page = Page::new(ModuleRegistry::new());
//! let html = page.document().document_element();
//! page.document_mut()
//!     .set_geometry(html, Geometry::scroller(1024.0, 768.0, 1024.0, 4000.0));
//!
//! let body = page.document().body();
//! page.lazy_load_modules(body, &LazyLoadOverrides::default()).unwrap();
//!
//! page.scroll_to(html, 0.0, 1500.0);
//! page.advance(Duration::from_millis(500));
//! assert_eq!(page.manager().lazy_loader().unwrap().stats().scans, 2);
//! ```

use std::time::Duration;

use latent_dom::{event_types, Document, Event, NodeId, TimerQueue};

use crate::error::Result;
use crate::module::{ModuleManager, ModuleRegistry};
use crate::options::LazyLoadOverrides;

/// Document, clock and modules of one page
#[derive(Debug, Default)]
pub struct Page {
    document: Document,
    timers: TimerQueue,
    manager: ModuleManager,
}

impl Page {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self {
            document: Document::new(),
            timers: TimerQueue::new(),
            manager: ModuleManager::new(registry),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn manager(&self) -> &ModuleManager {
        &self.manager
    }

    pub fn registry(&self) -> &ModuleRegistry {
        self.manager.registry()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// Start lazy loading modules under `root`
    pub fn lazy_load_modules(&mut self, root: NodeId, overrides: &LazyLoadOverrides) -> Result<()> {
        let Self {
            document,
            timers,
            manager,
        } = self;
        manager.lazy_load_modules(document, timers, root, overrides)
    }

    pub fn stop_lazy_loading_modules(&mut self) {
        let Self {
            document,
            timers,
            manager,
        } = self;
        manager.stop_lazy_loading_modules(document, timers);
    }

    /// Dispatch an event of `event_type` at `target`
    ///
    /// Returns the number of listeners the manager handled.
    pub fn dispatch(&mut self, target: NodeId, event_type: &str) -> usize {
        self.dispatch_event(&Event::new(event_type, target))
    }

    /// Deliver `event` to every listener on its path
    ///
    /// The path is fixed before delivery starts. Listeners removed by an
    /// earlier delivery are skipped; listeners added during dispatch wait for
    /// the next event.
    pub fn dispatch_event(&mut self, event: &Event) -> usize {
        let Self {
            document,
            timers,
            manager,
        } = self;

        let path = document.dispatch_path(event);
        let mut handled = 0;
        for listener in path {
            if !document.has_listener(listener) {
                continue;
            }
            if manager.handle_listener(document, timers, listener, event) {
                handled += 1;
            }
        }

        tracing::trace!(
            "Dispatched {} at node {} to {} listeners",
            event.event_type,
            event.target.to_raw(),
            handled
        );
        handled
    }

    /// Scroll `node` to the given offsets and fire a scroll event
    ///
    /// Scrolling `<html>` or `<body>` scrolls the page, so the event targets
    /// the document node.
    pub fn scroll_to(&mut self, node: NodeId, left: f32, top: f32) -> usize {
        self.document.set_scroll_offset(node, left, top);

        let target = if node == self.document.document_element() || node == self.document.body() {
            self.document.root()
        } else {
            node
        };
        self.dispatch(target, event_types::SCROLL)
    }

    /// Let `by` pass, firing every timer that comes due in order
    pub fn advance(&mut self, by: Duration) {
        let until = self.timers.now() + by;
        let Self {
            document,
            timers,
            manager,
        } = self;

        while let Some(timer) = timers.pop_due(until) {
            manager.handle_timer(document, timers, timer);
        }
        timers.advance_to(until);
    }
}
