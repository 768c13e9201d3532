//! Tree traversal strategies
//!
//! The same selection algorithms run over two views of the document: the
//! raw DOM tree (shadow roots invisible) and the flat tree (shadow contents
//! distributed through slots). Each view implements [`TreeStrategy`], and
//! algorithms are generic over it.

use super::tree::{Document, NodeId, NodeKind};

/// A view of the document tree
pub trait TreeStrategy {
    /// Children of a node in this view
    fn children(doc: &Document, node: NodeId) -> Vec<NodeId>;

    /// Parent of a node in this view
    fn parent(doc: &Document, node: NodeId) -> Option<NodeId>;

    /// First child in this view
    fn first_child(doc: &Document, node: NodeId) -> Option<NodeId> {
        Self::children(doc, node).first().copied()
    }

    /// Next sibling in this view
    fn next_sibling(doc: &Document, node: NodeId) -> Option<NodeId> {
        let parent = Self::parent(doc, node)?;
        let siblings = Self::children(doc, parent);
        let idx = siblings.iter().position(|&n| n == node)?;
        siblings.get(idx + 1).copied()
    }

    /// Previous sibling in this view
    fn prev_sibling(doc: &Document, node: NodeId) -> Option<NodeId> {
        let parent = Self::parent(doc, node)?;
        let siblings = Self::children(doc, parent);
        let idx = siblings.iter().position(|&n| n == node)?;
        idx.checked_sub(1).and_then(|i| siblings.get(i).copied())
    }

    /// Whether `node` is a descendant of `ancestor` in this view
    fn is_descendant_of(doc: &Document, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Self::parent(doc, node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = Self::parent(doc, n);
        }
        false
    }

    /// Whether a node is part of this view at all
    fn contains(doc: &Document, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == doc.root() {
                return true;
            }
            match Self::parent(doc, current) {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    /// Index of a node among its siblings in this view
    fn index_in_parent(doc: &Document, node: NodeId) -> Option<usize> {
        let parent = Self::parent(doc, node)?;
        Self::children(doc, parent).iter().position(|&n| n == node)
    }
}

/// The raw document tree: shadow roots and their contents are invisible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DomTreeStrategy;

impl TreeStrategy for DomTreeStrategy {
    fn children(doc: &Document, node: NodeId) -> Vec<NodeId> {
        doc.raw_children(node).to_vec()
    }

    fn parent(doc: &Document, node: NodeId) -> Option<NodeId> {
        // shadow roots (and their contents) are not in the DOM view
        if matches!(doc.kind(node), NodeKind::ShadowRoot) {
            return None;
        }
        doc.raw_parent(node)
    }
}

/// The flat tree: shadow contents replace a host's light children, with
/// light nodes re-parented under their assigned slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlatTreeStrategy;

impl TreeStrategy for FlatTreeStrategy {
    fn children(doc: &Document, node: NodeId) -> Vec<NodeId> {
        doc.update_distribution();
        if let Some(shadow) = doc.shadow_root(node) {
            return doc.raw_children(shadow).to_vec();
        }
        if doc.tag_name(node) == Some("slot") {
            let assigned = doc.assigned_nodes(node);
            if !assigned.is_empty() {
                return assigned;
            }
            // fallback content
            return doc.raw_children(node).to_vec();
        }
        doc.raw_children(node).to_vec()
    }

    fn parent(doc: &Document, node: NodeId) -> Option<NodeId> {
        doc.update_distribution();
        let raw_parent = doc.raw_parent(node)?;
        if matches!(doc.kind(raw_parent), NodeKind::ShadowRoot) {
            // shadow root contents hang directly off the host
            return doc.shadow_host(raw_parent);
        }
        if doc.shadow_root(raw_parent).is_some() {
            // a light child of a shadow host is only present if distributed
            return doc.assigned_slot(node);
        }
        Some(raw_parent)
    }
}

/// Next node in pre-order traversal
pub fn next_in_traversal<S: TreeStrategy>(doc: &Document, node: NodeId) -> Option<NodeId> {
    if let Some(child) = S::first_child(doc, node) {
        return Some(child);
    }
    let mut current = node;
    loop {
        if let Some(sibling) = S::next_sibling(doc, current) {
            return Some(sibling);
        }
        current = S::parent(doc, current)?;
    }
}

/// Previous node in pre-order traversal
pub fn prev_in_traversal<S: TreeStrategy>(doc: &Document, node: NodeId) -> Option<NodeId> {
    if let Some(sibling) = S::prev_sibling(doc, node) {
        // deepest last descendant of the previous sibling
        let mut current = sibling;
        while let Some(last) = S::children(doc, current).last().copied() {
            current = last;
        }
        return Some(current);
    }
    S::parent(doc, node)
}
