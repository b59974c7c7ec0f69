//! Latent Core
//!
//! Lazy-loading scheduler for markup-declared modules. Elements carrying
//! `data-module-lazyload` get their modules created only once they are needed:
//!
//! - **Viewport**: visible rectangle of a scroll container and element overlap
//! - **Scroll settle**: one "settled" signal per scroll gesture, by polling
//! - **Scanner**: activates visible candidates after start and after each settle
//! - **Activation**: `"any"` or trigger-pattern matching, exactly once per element
//! - **Lazy loader**: start/stop lifecycle with no listeners or timers left behind
//! - **Modules**: metadata, registry, sub-module properties and the manager
//! - **Page**: host event loop driving all of the above on a virtual clock
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use latent_core::prelude::*;
//! use latent_dom::Geometry;
//!
//! struct Gallery;
//!
//! impl Module for Gallery {
//!     fn type_name(&self) -> &str {
//!         "gallery"
//!     }
//! }
//!
//! let mut registry = ModuleRegistry::new();
//! registry.register("gallery", |_: &ModuleSpec<'_>| Gallery);
//!
//! let mut page = Page::new(registry);
//! let html = page.document().document_element();
//! let body = page.document().body();
//! let doc = page.document_mut();
//! doc.set_geometry(html, Geometry::scroller(1024.0, 768.0, 1024.0, 5000.0));
//!
//! // Far below the fold
//! let gallery = doc.append_element(body, "section");
//! doc.set_geometry(gallery, Geometry::offset(3000.0, 0.0, 1024.0, 400.0));
//! doc.set_attribute(gallery, "data-modules", "gallery");
//! doc.set_attribute(gallery, "data-module-lazyload", "any");
//!
//! page.lazy_load_modules(body, &LazyLoadOverrides::default()).unwrap();
//! assert!(page.registry().modules(gallery).is_empty());
//!
//! page.scroll_to(html, 0.0, 2800.0);
//! page.advance(Duration::from_millis(500));
//! assert_eq!(page.registry().modules(gallery).len(), 1);
//! ```

pub mod activation;
pub mod error;
pub mod lazy_loader;
pub mod module;
pub mod options;
pub mod page;
pub mod scanner;
pub mod scroll_settle;
pub mod viewport;


pub use activation::{
    lazy_marker, try_activate, TriggerPattern, ANY_TRIGGER, LAZYLOADED_ATTR, LAZYLOAD_ATTR,
    SCROLL_TO_TRIGGER,
};
pub use error::{ModuleError, Result};
pub use lazy_loader::{LazyLoader, LoaderContext, LoaderStats};
pub use module::{
    MetaData, Module, ModuleConstructor, ModuleFactory, ModuleManager, ModuleOptions,
    ModuleRegistry, ModuleSpec, PropertySlot, SubModuleProperties, MODULES_ATTR,
    MODULES_CREATED_ATTR, OPTIONS_ATTR, PROPERTY_ATTR,
};
pub use options::{
    LazyLoadOptions, LazyLoadOverrides, DEFAULT_SCROLL_STOP_DELAY, DEFAULT_SCROLL_TIMEOUT,
};
pub use page::Page;
pub use scanner::{scan, ScanReport, ScrollTarget};
pub use scroll_settle::{PollOutcome, ScrollDebouncer, ScrollPosition, SettleEvent, SettlePhase};
pub use viewport::{compute_element_rect, compute_viewport, is_visible, ElementRect, ViewportRect};

/// Prelude module - import everything commonly needed
pub mod prelude {
    pub use crate::error::{ModuleError, Result};
    pub use crate::lazy_loader::{LazyLoader, LoaderStats};
    pub use crate::module::{
        Module, ModuleFactory, ModuleManager, ModuleRegistry, ModuleSpec, SubModuleProperties,
    };
    pub use crate::options::{LazyLoadOptions, LazyLoadOverrides};
    pub use crate::page::Page;
}
