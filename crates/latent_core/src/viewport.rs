//! Viewport geometry
//!
//! Pure functions over the document's layout geometry. Both rectangles are in
//! document coordinates: the viewport comes from the scroll container's scroll
//! offsets, and element positions are summed along the offset parent chain.
//! Nothing here can fail; missing nodes read as zero geometry.

use latent_dom::{Document, NodeId};

/// Visible area of a scroll container
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportRect {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
    /// Remaining scrollable distance to the right of the visible area
    pub right: f32,
    /// Remaining scrollable distance below the visible area
    pub bottom: f32,
}

/// Absolute position and size of an element
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementRect {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl ElementRect {
    pub fn new(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// Compute the visible rectangle of `scroll_container`
pub fn compute_viewport(document: &Document, scroll_container: NodeId) -> ViewportRect {
    let g = document.geometry(scroll_container);

    let top = g.scroll_top;
    let left = g.scroll_left;
    let width = g.client_width;
    let height = g.client_height;

    ViewportRect {
        top,
        left,
        width,
        height,
        right: g.offset_width - (left + width),
        bottom: g.offset_height - top - height,
    }
}

/// Compute the document position of `element`
///
/// Offsets are accumulated from the element itself up through every offset
/// parent. The walk is capped at the document size so a cyclic offset chain
/// terminates.
pub fn compute_element_rect(document: &Document, element: NodeId) -> ElementRect {
    let g = document.geometry(element);
    let mut rect = ElementRect::new(g.offset_top, g.offset_left, g.offset_width, g.offset_height);

    let mut current = document.offset_parent(element);
    let mut remaining = document.len();

    while let Some(parent) = current {
        if remaining == 0 {
            tracing::warn!("offset parent chain exceeds document size, stopping");
            break;
        }
        remaining -= 1;

        let pg = document.geometry(parent);
        rect.top += pg.offset_top;
        rect.left += pg.offset_left;
        current = document.offset_parent(parent);
    }

    rect
}

/// Check whether `rect` overlaps `viewport` on both axes
pub fn is_visible(viewport: &ViewportRect, rect: &ElementRect) -> bool {
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return false;
    }

    overlaps(rect.left, rect.width, viewport.left, viewport.width)
        && overlaps(rect.top, rect.height, viewport.top, viewport.height)
}

/// One-axis overlap test
///
/// The near edge counts when it lies in `[view_near, view_far)`, the far edge
/// when it lies in `(view_near, view_far]`, so an element edge sitting exactly
/// on a viewport boundary is counted once. An element spanning the whole
/// viewport overlaps without either edge being inside.
fn overlaps(near: f32, extent: f32, view_near: f32, view_extent: f32) -> bool {
    let far = near + extent;
    let view_far = view_near + view_extent;

    let near_inside = near >= view_near && near < view_far;
    let far_inside = far > view_near && far <= view_far;
    let spans = near < view_near && far > view_far;

    near_inside || far_inside || spans
}
