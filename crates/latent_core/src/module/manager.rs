//! Module manager
//!
//! Owns the module registry and at most one lazy-loading controller, and
//! routes host deliveries to that controller.

use latent_dom::{Document, Event, ListenerId, NodeId, TimerId, TimerQueue};

use super::ModuleRegistry;
use crate::error::Result;
use crate::lazy_loader::{LazyLoader, LoaderContext};
use crate::options::LazyLoadOverrides;

/// Registry plus the current lazy loader
#[derive(Debug, Default)]
pub struct ModuleManager {
    registry: ModuleRegistry,
    lazy_loader: Option<LazyLoader>,
}

impl ModuleManager {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self {
            registry,
            lazy_loader: None,
        }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.registry
    }

    /// The most recent controller, stopped or not
    pub fn lazy_loader(&self) -> Option<&LazyLoader> {
        self.lazy_loader.as_ref()
    }

    /// Start lazy loading modules under `root`
    ///
    /// A controller that is still running is stopped first.
    pub fn lazy_load_modules(
        &mut self,
        document: &mut Document,
        timers: &mut TimerQueue,
        root: NodeId,
        overrides: &LazyLoadOverrides,
    ) -> Result<()> {
        self.stop_lazy_loading_modules(document, timers);

        let mut cx = LoaderContext {
            document,
            timers,
            factory: &mut self.registry,
        };
        self.lazy_loader = Some(LazyLoader::start(&mut cx, root, overrides)?);

        Ok(())
    }

    /// Stop the current controller, keeping it around for its statistics
    pub fn stop_lazy_loading_modules(&mut self, document: &mut Document, timers: &mut TimerQueue) {
        if let Some(loader) = self.lazy_loader.as_mut() {
            loader.stop(document, timers);
        }
    }

    /// Deliver a listener invocation to the controller
    pub fn handle_listener(
        &mut self,
        document: &mut Document,
        timers: &mut TimerQueue,
        listener: ListenerId,
        event: &Event,
    ) -> bool {
        let Self {
            registry,
            lazy_loader,
        } = self;
        let Some(loader) = lazy_loader.as_mut() else {
            return false;
        };

        let mut cx = LoaderContext {
            document,
            timers,
            factory: registry,
        };
        loader.handle_event(&mut cx, listener, event)
    }

    /// Deliver a timer tick to the controller
    pub fn handle_timer(
        &mut self,
        document: &mut Document,
        timers: &mut TimerQueue,
        timer: TimerId,
    ) -> bool {
        let Self {
            registry,
            lazy_loader,
        } = self;
        let Some(loader) = lazy_loader.as_mut() else {
            return false;
        };

        let mut cx = LoaderContext {
            document,
            timers,
            factory: registry,
        };
        loader.handle_timer(&mut cx, timer)
    }
}
