//! Element tree management
//!
//! The document is a slotmap arena of nodes. Every document starts with the
//! `#document` node, an `html` document element and a `body`, mirroring what a
//! browser hands to scripts. Nodes carry an ordered attribute map and the
//! offset/client/scroll geometry that a layout pass would have produced.

use indexmap::IndexMap;
use slotmap::{new_key_type, Key, SlotMap};
use smallvec::SmallVec;

use crate::event::{Event, ListenerId, ListenerPhase, ListenerTable};

new_key_type! {
    pub struct NodeId;
}

impl NodeId {
    /// Convert to a raw u64 representation
    ///
    /// Useful for diagnostics and for keying nodes in type-erased contexts.
    pub fn to_raw(self) -> u64 {
        self.data().as_ffi()
    }
}

/// Layout-derived geometry of a node
///
/// All values are in CSS pixels. `offset_*` describe the border box relative to
/// the node's offset parent, `client_*` the visible content area, and
/// `scroll_*` the current scroll offsets of the node's own content.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Geometry {
    pub offset_top: f32,
    pub offset_left: f32,
    pub offset_width: f32,
    pub offset_height: f32,
    pub client_width: f32,
    pub client_height: f32,
    pub scroll_top: f32,
    pub scroll_left: f32,
}

impl Geometry {
    /// Geometry of a plain box at the given offset position
    pub fn offset(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self {
            offset_top: top,
            offset_left: left,
            offset_width: width,
            offset_height: height,
            client_width: width,
            client_height: height,
            ..Default::default()
        }
    }

    /// Geometry of a scroll container
    ///
    /// `client_*` is the visible area and `content_*` the total scrollable
    /// extent, reported through `offset_width`/`offset_height`.
    pub fn scroller(
        client_width: f32,
        client_height: f32,
        content_width: f32,
        content_height: f32,
    ) -> Self {
        Self {
            offset_width: content_width,
            offset_height: content_height,
            client_width,
            client_height,
            ..Default::default()
        }
    }
}

struct NodeData {
    tag: String,
    attributes: IndexMap<String, String>,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
    offset_parent: Option<NodeId>,
    geometry: Geometry,
}

impl NodeData {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            parent: None,
            children: SmallVec::new(),
            offset_parent: None,
            geometry: Geometry::default(),
        }
    }
}

/// A document: element tree plus the listeners registered on it
pub struct Document {
    nodes: SlotMap<NodeId, NodeData>,
    root: NodeId,
    document_element: NodeId,
    body: NodeId,
    listeners: ListenerTable,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Document {
    /// Create a document with `html` and `body` in place
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData::new("#document"));
        let document_element = nodes.insert(NodeData::new("html"));
        let body = nodes.insert(NodeData::new("body"));

        let mut doc = Self {
            nodes,
            root,
            document_element,
            body,
            listeners: ListenerTable::new(),
        };
        doc.append_child(root, document_element);
        doc.append_child(document_element, body);
        doc
    }

    /// The `#document` node (root of the tree and target of document listeners)
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `html` element
    pub fn document_element(&self) -> NodeId {
        self.document_element
    }

    /// The `body` element
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.nodes.insert(NodeData::new(tag))
    }

    /// Check if a node exists in this document
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Get the number of nodes in the document
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the document has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tag name of a node
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).map(|n| n.tag.as_str())
    }

    // =========================================================================
    // Tree structure
    // =========================================================================

    /// Append `child` as the last child of `parent`
    ///
    /// A child that already has a parent is moved. Returns false (and leaves
    /// the tree untouched) if either node is missing or if `child` is `parent`
    /// or one of its ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.contains(parent) || !self.contains(child) {
            return false;
        }
        if parent == child || self.ancestors(parent).contains(&child) {
            tracing::warn!("append_child would create a cycle, ignoring");
            return false;
        }

        self.detach(child);

        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
        true
    }

    /// Create an element and append it to `parent` in one step
    pub fn append_element(&mut self, parent: NodeId, tag: impl Into<String>) -> NodeId {
        let id = self.create_element(tag);
        self.append_child(parent, id);
        id
    }

    /// Remove a node from its parent (the node itself stays in the arena)
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|c| *c != id);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
        }
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    /// Children of a node in document order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// All ancestors of a node (from immediate parent to root)
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;

        while let Some(parent) = self.parent(current) {
            result.push(parent);
            current = parent;
        }

        result
    }

    /// Every descendant of `root` in document order (pre-order), excluding `root`
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            result.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }

        result
    }

    /// Descendants of `root` carrying the attribute `name`, in document order
    pub fn query_attribute(&self, root: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.has_attribute(id, name))
            .collect()
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(id)?.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|n| n.attributes.contains_key(name))
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.attributes.insert(name.into(), value.into());
        }
    }

    /// Remove an attribute, returning its previous value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.nodes.get_mut(id)?.attributes.shift_remove(name)
    }

    /// Attributes of a node in insertion order
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(|n| n.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Geometry of a node (zeros for unknown nodes)
    pub fn geometry(&self, id: NodeId) -> Geometry {
        self.nodes.get(id).map(|n| n.geometry).unwrap_or_default()
    }

    /// Replace the geometry of a node, keeping its scroll offsets
    pub fn set_geometry(&mut self, id: NodeId, geometry: Geometry) {
        if let Some(node) = self.nodes.get_mut(id) {
            let scroll_left = node.geometry.scroll_left;
            let scroll_top = node.geometry.scroll_top;
            node.geometry = Geometry {
                scroll_left,
                scroll_top,
                ..geometry
            };
        }
    }

    /// Current scroll offsets as `(left, top)`
    pub fn scroll_offset(&self, id: NodeId) -> (f32, f32) {
        let g = self.geometry(id);
        (g.scroll_left, g.scroll_top)
    }

    pub fn set_scroll_offset(&mut self, id: NodeId, left: f32, top: f32) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.geometry.scroll_left = left;
            node.geometry.scroll_top = top;
        }
    }

    pub fn offset_parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.offset_parent
    }

    pub fn set_offset_parent(&mut self, id: NodeId, offset_parent: Option<NodeId>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.offset_parent = offset_parent;
        }
    }

    // =========================================================================
    // Event listeners
    // =========================================================================

    /// Register a listener for `event_type` on `target`
    pub fn add_event_listener(
        &mut self,
        target: NodeId,
        event_type: impl Into<String>,
        phase: ListenerPhase,
    ) -> ListenerId {
        self.listeners.add(target, event_type.into(), phase)
    }

    /// Remove a listener, returning whether it was registered
    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.listeners.contains(id)
    }

    /// Number of registered listeners across the whole document
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Listeners that receive `event`, in delivery order
    ///
    /// Capture listeners on the ancestors (root first), then every listener on
    /// the target, then bubble listeners on the ancestors (parent first) if the
    /// event bubbles.
    pub fn dispatch_path(&self, event: &Event) -> Vec<ListenerId> {
        let mut path = self.ancestors(event.target);
        path.reverse();

        let mut result = Vec::new();
        for &node in &path {
            result.extend(self.listeners.matching(
                node,
                &event.event_type,
                Some(ListenerPhase::Capture),
            ));
        }
        result.extend(self.listeners.matching(event.target, &event.event_type, None));
        if event.bubbles {
            for &node in path.iter().rev() {
                result.extend(self.listeners.matching(
                    node,
                    &event.event_type,
                    Some(ListenerPhase::Bubble),
                ));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_skeleton() {
        let doc = Document::new();
        assert_eq!(doc.tag_name(doc.root()), Some("#document"));
        assert_eq!(doc.children(doc.root()), &[doc.document_element()]);
        assert_eq!(doc.children(doc.document_element()), &[doc.body()]);
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_descendants_preorder() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.append_element(body, "div");
        let a1 = doc.append_element(a, "span");
        let a2 = doc.append_element(a, "span");
        let b = doc.append_element(body, "div");
        let a1x = doc.append_element(a1, "em");

        assert_eq!(doc.descendants(body), vec![a, a1, a1x, a2, b]);
        assert_eq!(doc.descendants(a1x), Vec::<NodeId>::new());
    }

    #[test]
    fn test_append_moves_and_rejects_cycles() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.append_element(body, "div");
        let b = doc.append_element(a, "div");

        // Moving an ancestor under its descendant is refused
        assert!(!doc.append_child(b, a));
        assert_eq!(doc.parent(a), Some(body));

        // Re-parenting detaches from the old parent
        assert!(doc.append_child(body, b));
        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(body), &[a, b]);
    }

    #[test]
    fn test_attributes() {
        let mut doc = Document::new();
        let el = doc.append_element(doc.body(), "div");

        doc.set_attribute(el, "data-modules", "gallery");
        assert!(doc.has_attribute(el, "data-modules"));
        assert_eq!(doc.attribute(el, "data-modules"), Some("gallery"));
        assert_eq!(doc.remove_attribute(el, "data-modules").as_deref(), Some("gallery"));
        assert!(!doc.has_attribute(el, "data-modules"));
        assert_eq!(doc.remove_attribute(el, "data-modules"), None);
    }

    #[test]
    fn test_query_attribute_document_order() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.append_element(body, "div");
        let b = doc.append_element(a, "div");
        let c = doc.append_element(body, "div");
        doc.set_attribute(c, "data-x", "1");
        doc.set_attribute(b, "data-x", "2");

        assert_eq!(doc.query_attribute(body, "data-x"), vec![b, c]);
    }

    #[test]
    fn test_set_geometry_keeps_scroll() {
        let mut doc = Document::new();
        let html = doc.document_element();
        doc.set_scroll_offset(html, 10.0, 20.0);
        doc.set_geometry(html, Geometry::scroller(800.0, 600.0, 800.0, 2000.0));

        let g = doc.geometry(html);
        assert_eq!(g.client_height, 600.0);
        assert_eq!(g.offset_height, 2000.0);
        assert_eq!(doc.scroll_offset(html), (10.0, 20.0));
    }

    #[test]
    fn test_dispatch_path_order() {
        let mut doc = Document::new();
        let body = doc.body();
        let el = doc.append_element(body, "div");

        let on_target = doc.add_event_listener(el, "click", ListenerPhase::Bubble);
        let bubble_body = doc.add_event_listener(body, "click", ListenerPhase::Bubble);
        let capture_root = doc.add_event_listener(doc.root(), "click", ListenerPhase::Capture);
        let _other_type = doc.add_event_listener(body, "mouseover", ListenerPhase::Capture);

        let path = doc.dispatch_path(&Event::new("click", el));
        assert_eq!(path, vec![capture_root, on_target, bubble_body]);
    }

    #[test]
    fn test_non_bubbling_event_skips_bubble_listeners() {
        let mut doc = Document::new();
        let html = doc.document_element();
        let capture = doc.add_event_listener(doc.root(), "scroll", ListenerPhase::Capture);
        let bubble = doc.add_event_listener(doc.root(), "scroll", ListenerPhase::Bubble);

        let path = doc.dispatch_path(&Event::new("scroll", html));
        assert_eq!(path, vec![capture]);

        assert!(doc.remove_event_listener(bubble));
        assert!(!doc.has_listener(bubble));
        assert_eq!(doc.listener_count(), 1);
    }
}
