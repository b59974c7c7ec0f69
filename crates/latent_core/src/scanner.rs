//! Element scanner
//!
//! Finds lazy candidates under a root, measures them against one viewport and
//! activates the visible ones with the `scrollto` trigger.

use latent_dom::{Document, NodeId};

use crate::activation::{lazy_marker, try_activate, SCROLL_TO_TRIGGER};
use crate::module::ModuleFactory;
use crate::viewport::{compute_element_rect, compute_viewport, is_visible};

/// Scroll container used to measure the viewport
///
/// A pinned container is used as-is. Otherwise the container is picked between
/// `<body>` and `<html>` and only remembered once the pick has actually been
/// scrolled; at offset zero the two are indistinguishable, so the choice is
/// made again on every access.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollTarget {
    pinned: Option<NodeId>,
    resolved: Option<NodeId>,
}

impl ScrollTarget {
    pub fn new(pinned: Option<NodeId>) -> Self {
        Self {
            pinned,
            resolved: None,
        }
    }

    /// The container to measure against right now
    pub fn resolve(&mut self, document: &Document) -> NodeId {
        if let Some(node) = self.pinned.or(self.resolved) {
            return node;
        }

        let body = document.body();
        let candidate = if scrolled(document, body) {
            body
        } else {
            document.document_element()
        };

        if scrolled(document, candidate) {
            tracing::debug!(
                "Resolved scroll container to <{}>",
                document.tag_name(candidate).unwrap_or_default()
            );
            self.resolved = Some(candidate);
        }

        candidate
    }

    /// Whether a container has been pinned or remembered
    pub fn is_resolved(&self) -> bool {
        self.pinned.is_some() || self.resolved.is_some()
    }

    /// Drop a remembered auto-resolution that sits at offset zero
    ///
    /// Pinned containers are kept.
    pub fn forget_if_unscrolled(&mut self, document: &Document) {
        if let Some(node) = self.resolved {
            if !scrolled(document, node) {
                self.resolved = None;
            }
        }
    }
}

fn scrolled(document: &Document, node: NodeId) -> bool {
    let (left, top) = document.scroll_offset(node);
    left != 0.0 || top != 0.0
}

/// Counters from one scan
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Lazy candidates found under the root
    pub candidates: usize,
    /// Candidates overlapping the viewport
    pub visible: usize,
    /// Candidates activated
    pub activated: usize,
    /// Activations whose module creation failed
    pub failed: usize,
}

/// Activate every visible lazy candidate under `root`
///
/// The candidate list is taken before anything is activated, so module
/// creation that adds or marks elements does not disturb this pass. A failed
/// activation is logged and the scan carries on.
pub fn scan(
    document: &mut Document,
    factory: &mut dyn ModuleFactory,
    root: NodeId,
    container: NodeId,
) -> ScanReport {
    let candidates: Vec<NodeId> = document
        .descendants(root)
        .into_iter()
        .filter(|&id| lazy_marker(document, id).is_some())
        .collect();

    let viewport = compute_viewport(document, container);
    let mut report = ScanReport {
        candidates: candidates.len(),
        ..Default::default()
    };

    for element in candidates {
        // The marker may have been consumed by an earlier activation
        if lazy_marker(document, element).is_none() {
            continue;
        }

        let rect = compute_element_rect(document, element);
        if !is_visible(&viewport, &rect) {
            continue;
        }
        report.visible += 1;

        match try_activate(document, factory, element, SCROLL_TO_TRIGGER) {
            Ok(true) => report.activated += 1,
            Ok(false) => {}
            Err(err) => {
                tracing::error!(
                    "Failed to create lazy modules for element {}: {}",
                    element.to_raw(),
                    err
                );
                report.failed += 1;
            }
        }
    }

    tracing::debug!(
        "Scanned {} candidates: {} visible, {} activated, {} failed",
        report.candidates,
        report.visible,
        report.activated,
        report.failed
    );

    report
}
