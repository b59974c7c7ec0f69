//! Latent host model
//!
//! The pieces of a browser page that the lazy-loading scheduler talks to:
//!
//! - **Document**: element tree with ordered attributes and layout geometry
//!   (offset box, client box, scroll offsets, offset parent chain)
//! - **Events**: listener registrations with capture/target/bubble dispatch paths
//! - **Timers**: interval and timeout scheduling on a virtual clock
//!
//! # Example
//!
//! ```rust
//! use latent_dom::{Document, Event, Geometry, ListenerPhase};
//!
//! let mut doc = Document::new();
//! let card = doc.append_element(doc.body(), "div");
//! doc.set_attribute(card, "data-module-lazyload", "any");
//! doc.set_geometry(card, Geometry::offset(1200.0, 0.0, 300.0, 200.0));
//!
//! let listener = doc.add_event_listener(doc.root(), "scroll", ListenerPhase::Capture);
//! let path = doc.dispatch_path(&Event::new("scroll", doc.document_element()));
//! assert_eq!(path, vec![listener]);
//! ```

pub mod document;
pub mod event;
pub mod timer;

pub use document::{Document, Geometry, NodeId};
pub use event::{event_types, Event, ListenerId, ListenerPhase};
pub use timer::{TimerId, TimerQueue};

/// Prelude module - import everything commonly needed
pub mod prelude {
    pub use crate::document::{Document, Geometry, NodeId};
    pub use crate::event::{event_types, Event, ListenerId, ListenerPhase};
    pub use crate::timer::{TimerId, TimerQueue};
}
