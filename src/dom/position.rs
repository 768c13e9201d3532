//! Positions within a document tree view
//!
//! A position is a boundary point: an offset into a text node's characters,
//! or a child index inside a container node. Ordering is tree order within
//! a chosen [`TreeStrategy`] view.

use std::cmp::Ordering;

use super::strategy::TreeStrategy;
use super::tree::{Document, NodeId, NodeKind};

/// Caret affinity at a rendered boundary between two characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Affinity {
    /// Caret associates with the preceding content
    Upstream,
    /// Caret associates with the following content
    #[default]
    Downstream,
}

/// A boundary point in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Anchor node
    pub node: NodeId,
    /// Character offset in text nodes, child index otherwise
    pub offset: usize,
}

impl Position {
    /// Create a new position
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Position before the first child / character of a node
    pub fn first_in(node: NodeId) -> Self {
        Self { node, offset: 0 }
    }

    /// Position after the last child / character of a node
    pub fn last_in(doc: &Document, node: NodeId) -> Self {
        Self {
            node,
            offset: doc.max_offset(node),
        }
    }

    /// Position just before `node` in its parent, in the given view
    pub fn before_node<S: TreeStrategy>(doc: &Document, node: NodeId) -> Option<Self> {
        let parent = S::parent(doc, node)?;
        let index = S::index_in_parent(doc, node)?;
        Some(Self::new(parent, index))
    }

    /// Position just after `node` in its parent, in the given view
    pub fn after_node<S: TreeStrategy>(doc: &Document, node: NodeId) -> Option<Self> {
        let parent = S::parent(doc, node)?;
        let index = S::index_in_parent(doc, node)?;
        Some(Self::new(parent, index + 1))
    }

    /// True if the anchor node has been removed from the document
    pub fn is_orphaned(&self, doc: &Document) -> bool {
        doc.is_orphaned(self.node)
    }

    /// Compare two positions in tree order within a view
    ///
    /// Positions inside different tree scopes compare by their scope's
    /// location in the view; a position is not comparable across documents.
    pub fn cmp_in<S: TreeStrategy>(doc: &Document, a: Position, b: Position) -> Ordering {
        if a.node == b.node {
            return a.offset.cmp(&b.offset);
        }
        let path_a = index_path::<S>(doc, a);
        let path_b = index_path::<S>(doc, b);
        path_a.cmp(&path_b)
    }
}

/// Child-index path from the view root down to a position's boundary point
fn index_path<S: TreeStrategy>(doc: &Document, pos: Position) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = pos.node;
    while let Some(parent) = S::parent(doc, current) {
        if let Some(index) = S::index_in_parent(doc, current) {
            path.push(index);
        }
        current = parent;
    }
    path.reverse();
    path.push(pos.offset);
    path
}

/// A start/end pair of positions with start ≤ end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EphemeralRange {
    pub start: Position,
    pub end: Position,
}

impl EphemeralRange {
    /// Create a range; callers are responsible for ordering
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Collapsed range at a single position
    pub fn collapsed(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// True if start and end are the same boundary point
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// True if either endpoint was removed from the document
    pub fn is_orphaned(&self, doc: &Document) -> bool {
        self.start.is_orphaned(doc) || self.end.is_orphaned(doc)
    }
}

/// True for positions anchored inside text nodes
pub fn is_text_position(doc: &Document, pos: Position) -> bool {
    matches!(doc.kind(pos.node), NodeKind::Text(_))
}
