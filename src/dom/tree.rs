//! Minimal DOM tree implementation
//!
//! The selection and find engines only need a narrow collaborator surface:
//! node storage, parent/child links, shadow roots, editability queries, and
//! mutation notifications via a document version counter. This arena tree
//! provides exactly that; parsing, style, and layout live elsewhere.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a node within a document arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Node types in the DOM
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node (e.g., <div>)
    Element(ElementData),
    /// Shadow root attached to a host element
    ShadowRoot,
    /// Text node
    Text(String),
}

/// Data for element nodes
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Tag name (e.g., "div", "span")
    pub tag_name: String,
    /// Element attributes
    pub attributes: HashMap<String, String>,
}

impl ElementData {
    /// Create a new element
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: HashMap::new(),
        }
    }

    /// Get an attribute value
    pub fn get_attribute(&self, name: &str) -> Option<&String> {
        self.attributes.get(name)
    }

    /// Set an attribute value
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }
}

/// A node in the arena
#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Shadow root, for host elements; not part of `children`
    shadow_root: Option<NodeId>,
    /// Host element, for shadow roots
    host: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            shadow_root: None,
            host: None,
        }
    }
}

/// Slot distribution, recomputed on demand when the document mutates
#[derive(Debug, Default)]
struct DistributionCache {
    valid: bool,
    version: u64,
    /// slot -> light nodes assigned to it, in host child order
    assignments: HashMap<NodeId, Vec<NodeId>>,
    /// light node -> slot it is assigned to
    assigned_slot: HashMap<NodeId, NodeId>,
}

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// The DOM document
#[derive(Debug)]
pub struct Document {
    id: u64,
    nodes: Vec<NodeData>,
    root: NodeId,
    body: NodeId,
    version: u64,
    focused_element: Option<NodeId>,
    distribution: RefCell<DistributionCache>,
}

impl Document {
    /// Create a new document with an html/body skeleton
    pub fn new() -> Self {
        let mut doc = Self {
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            version: 0,
            focused_element: None,
            distribution: RefCell::new(DistributionCache::default()),
        };
        let root = doc.push_node(NodeData::new(NodeKind::Document));
        doc.root = root;
        let html = doc.create_element("html");
        doc.append_child(root, html);
        let body = doc.create_element("body");
        doc.append_child(html, body);
        doc.body = body;
        doc.version = 0;
        doc
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        id
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    /// Unique identifier of this document
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Document root node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The <body> element
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Mutation counter; bumped on every tree or text change
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Create a detached element node
    pub fn create_element(&mut self, tag_name: impl Into<String>) -> NodeId {
        self.push_node(NodeData::new(NodeKind::Element(ElementData::new(tag_name))))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.push_node(NodeData::new(NodeKind::Text(content.into())))
    }

    /// Append a child to a parent node
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.node(child).parent.is_none(), "child already attached");
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
        self.version += 1;
    }

    /// Remove a node from its parent; the subtree becomes orphaned
    pub fn remove_node(&mut self, node: NodeId) {
        if let Some(parent) = self.node(node).parent {
            self.node_mut(parent).children.retain(|&c| c != node);
            self.node_mut(node).parent = None;
        }
        self.version += 1;
    }

    /// Attach a shadow root to a host element, returning the root's id
    pub fn attach_shadow(&mut self, host: NodeId) -> NodeId {
        debug_assert!(self.node(host).shadow_root.is_none());
        let shadow = self.push_node(NodeData::new(NodeKind::ShadowRoot));
        self.node_mut(shadow).host = Some(host);
        self.node_mut(host).shadow_root = Some(shadow);
        self.version += 1;
        shadow
    }

    /// Replace a text node's content
    pub fn set_text_content(&mut self, node: NodeId, content: impl Into<String>) {
        if let NodeKind::Text(text) = &mut self.node_mut(node).kind {
            *text = content.into();
            self.version += 1;
        }
    }

    /// Set an attribute on an element
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeKind::Element(data) = &mut self.node_mut(node).kind {
            data.set_attribute(name, value);
            self.version += 1;
        }
    }

    /// Get an attribute value from an element
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.node(node).kind {
            NodeKind::Element(data) => data.get_attribute(name).map(|s| s.as_str()),
            _ => None,
        }
    }

    /// Node kind accessor
    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.node(node).kind
    }

    /// Text content, for text nodes
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).kind {
            NodeKind::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Tag name, for elements
    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).kind {
            NodeKind::Element(data) => Some(data.tag_name.as_str()),
            _ => None,
        }
    }

    /// Raw children (light tree; shadow roots are held separately)
    pub fn raw_children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    /// Raw parent link; shadow roots have no raw parent
    pub fn raw_parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    /// Shadow root of a host element, if any
    pub fn shadow_root(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).shadow_root
    }

    /// Host element of a shadow root, if any
    pub fn shadow_host(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).host
    }

    /// Number of children (text nodes report character count)
    pub fn max_offset(&self, node: NodeId) -> usize {
        match &self.node(node).kind {
            NodeKind::Text(text) => text.chars().count(),
            _ => self.node(node).children.len(),
        }
    }

    /// True if the node is still connected to the document root
    pub fn in_document(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            let data = self.node(current);
            current = match data.parent.or(data.host) {
                Some(p) => p,
                None => return false,
            };
        }
    }

    /// True if the node was removed from the document
    pub fn is_orphaned(&self, node: NodeId) -> bool {
        node.0 >= self.nodes.len() || !self.in_document(node)
    }

    /// Elements whose shadow tree behaves as an atomic editing unit
    pub fn is_atomic_shadow_host(&self, node: NodeId) -> bool {
        matches!(self.tag_name(node), Some("input" | "textarea" | "select"))
            && self.node(node).shadow_root.is_some()
    }

    /// The atomic shadow host enclosing a node, if any
    pub fn atomic_host_ancestor(&self, node: NodeId) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if let Some(host) = self.node(n).host {
                if self.is_atomic_shadow_host(host) {
                    return Some(host);
                }
                current = Some(host);
                continue;
            }
            current = self.node(n).parent;
        }
        None
    }

    /// The shadow-tree scope root a node belongs to (a shadow root or the document)
    pub fn tree_scope_root(&self, node: NodeId) -> NodeId {
        let mut current = node;
        loop {
            let data = self.node(current);
            if matches!(data.kind, NodeKind::ShadowRoot) || current == self.root {
                return current;
            }
            current = match data.parent {
                Some(p) => p,
                None => return current,
            };
        }
    }

    /// Whether content at this node is editable
    ///
    /// `contenteditable` inherits through the light tree and stops at shadow
    /// roots; the inside of an atomic host (input/textarea/select) is its
    /// own editable region.
    pub fn is_editable(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            let data = self.node(n);
            if matches!(data.kind, NodeKind::ShadowRoot) {
                return data.host.is_some_and(|h| self.is_atomic_shadow_host(h));
            }
            match self.attribute(n, "contenteditable") {
                Some("false") => return false,
                Some(_) => return true,
                None => {}
            }
            current = data.parent;
        }
        false
    }

    /// The highest node of the editable region containing `node`, if any
    pub fn root_editable_element(&self, node: NodeId) -> Option<NodeId> {
        if !self.is_editable(node) {
            return None;
        }
        let mut current = node;
        let mut root = node;
        loop {
            let data = self.node(current);
            if matches!(data.kind, NodeKind::ShadowRoot) {
                // atomic host internals: the shadow root is the editable root
                return Some(current);
            }
            if self.is_editable(current) {
                root = current;
            } else {
                break;
            }
            current = match data.parent {
                Some(p) => p,
                None => break,
            };
        }
        Some(root)
    }

    /// Highest editable root; identical to [`root_editable_element`] in this model
    pub fn highest_editable_root(&self, node: NodeId) -> Option<NodeId> {
        self.root_editable_element(node)
    }

    /// Set the focused element
    pub fn set_focused_element(&mut self, node: Option<NodeId>) {
        self.focused_element = node;
    }

    /// Currently focused element
    pub fn focused_element(&self) -> Option<NodeId> {
        self.focused_element
    }

    /// Clear document focus
    pub fn clear_focus(&mut self) {
        self.focused_element = None;
    }

    /// Recompute slot distribution if the document changed since last time
    ///
    /// Flat-tree traversal depends on up-to-date distribution, so callers
    /// trigger this before resolving flat-tree positions.
    pub fn update_distribution(&self) {
        let mut cache = self.distribution.borrow_mut();
        if cache.valid && cache.version == self.version {
            return;
        }
        cache.assignments.clear();
        cache.assigned_slot.clear();
        cache.valid = true;
        cache.version = self.version;

        for host in 0..self.nodes.len() {
            let host = NodeId(host);
            let Some(shadow) = self.node(host).shadow_root else {
                continue;
            };
            let slots = self.collect_slots(shadow);
            if slots.is_empty() {
                continue;
            }
            for &child in &self.node(host).children {
                let name = self.attribute(child, "slot").unwrap_or("");
                let slot = slots
                    .iter()
                    .find(|&&s| self.attribute(s, "name").unwrap_or("") == name)
                    .copied();
                if let Some(slot) = slot {
                    cache.assignments.entry(slot).or_default().push(child);
                    cache.assigned_slot.insert(child, slot);
                }
            }
        }
    }

    fn collect_slots(&self, root: NodeId) -> Vec<NodeId> {
        let mut slots = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if self.tag_name(node) == Some("slot") {
                slots.push(node);
            }
            for &child in self.node(node).children.iter().rev() {
                stack.push(child);
            }
        }
        slots.sort_by_key(|s| s.0);
        slots
    }

    /// Light nodes assigned to a slot, in host child order
    pub fn assigned_nodes(&self, slot: NodeId) -> Vec<NodeId> {
        self.update_distribution();
        self.distribution
            .borrow()
            .assignments
            .get(&slot)
            .cloned()
            .unwrap_or_default()
    }

    /// Slot a light node is assigned to, if any
    pub fn assigned_slot(&self, node: NodeId) -> Option<NodeId> {
        self.update_distribution();
        self.distribution.borrow().assigned_slot.get(&node).copied()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Block-level tags, used for paragraph boundaries in rendered text
pub(crate) fn is_block_tag(tag: &str) -> bool {
    matches!(
        tag,
        "html"
            | "body"
            | "div"
            | "p"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "table"
            | "ul"
            | "ol"
            | "li"
            | "blockquote"
            | "pre"
            | "section"
            | "article"
            | "header"
            | "footer"
    )
}

/// Tags whose subtree produces no rendered text
pub(crate) fn is_unrendered_tag(tag: &str) -> bool {
    matches!(
        tag,
        "head" | "script" | "style" | "template" | "title" | "meta" | "link"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_text(text: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let t = doc.create_text(text);
        doc.append_child(body, t);
        (doc, t)
    }

    #[test]
    fn test_document_skeleton() {
        let doc = Document::new();
        assert_eq!(doc.kind(doc.root()), &NodeKind::Document);
        assert_eq!(doc.tag_name(doc.body()), Some("body"));
        assert!(doc.in_document(doc.body()));
    }

    #[test]
    fn test_remove_orphans_subtree() {
        let (mut doc, text) = doc_with_text("hello");
        let div = doc.create_element("div");
        let body = doc.body();
        doc.append_child(body, div);
        assert!(doc.in_document(div));

        doc.remove_node(div);
        assert!(doc.is_orphaned(div));
        assert!(!doc.is_orphaned(text));
    }

    #[test]
    fn test_mutation_bumps_version() {
        let (mut doc, text) = doc_with_text("hello");
        let v = doc.version();
        doc.set_text_content(text, "world");
        assert!(doc.version() > v);
    }

    #[test]
    fn test_editability_inheritance() {
        let mut doc = Document::new();
        let body = doc.body();
        let outer = doc.create_element("div");
        doc.append_child(body, outer);
        doc.set_attribute(outer, "contenteditable", "true");
        let inner = doc.create_element("span");
        doc.append_child(outer, inner);
        let text = doc.create_text("abc");
        doc.append_child(inner, text);

        assert!(doc.is_editable(text));
        assert_eq!(doc.root_editable_element(text), Some(outer));

        // an explicit false stops inheritance
        doc.set_attribute(inner, "contenteditable", "false");
        assert!(!doc.is_editable(text));
    }

    #[test]
    fn test_atomic_shadow_host() {
        let mut doc = Document::new();
        let body = doc.body();
        let input = doc.create_element("input");
        doc.append_child(body, input);
        let shadow = doc.attach_shadow(input);
        let value = doc.create_text("typed");
        doc.append_child(shadow, value);

        assert!(doc.is_atomic_shadow_host(input));
        assert_eq!(doc.atomic_host_ancestor(value), Some(input));
        assert!(doc.is_editable(value));
        assert_eq!(doc.root_editable_element(value), Some(shadow));
    }

    #[test]
    fn test_slot_distribution() {
        let mut doc = Document::new();
        let body = doc.body();
        let host = doc.create_element("x-card");
        doc.append_child(body, host);
        let light = doc.create_text("light content");
        doc.append_child(host, light);
        let shadow = doc.attach_shadow(host);
        let slot = doc.create_element("slot");
        doc.append_child(shadow, slot);

        assert_eq!(doc.assigned_nodes(slot), vec![light]);
        assert_eq!(doc.assigned_slot(light), Some(slot));
    }

    #[test]
    fn test_tree_scope_root() {
        let mut doc = Document::new();
        let body = doc.body();
        let host = doc.create_element("div");
        doc.append_child(body, host);
        let shadow = doc.attach_shadow(host);
        let inner = doc.create_text("inner");
        doc.append_child(shadow, inner);

        assert_eq!(doc.tree_scope_root(body), doc.root());
        assert_eq!(doc.tree_scope_root(inner), shadow);
    }
}
