//! Per-frame selection ownership
//!
//! Each frame owns exactly one authoritative selection, expressed in the DOM
//! view. The flat-view projection that hit testing and the text finder read
//! is derived on demand and cached against the document version, since slot
//! redistribution can change the projection without the authoritative
//! selection moving.

use std::cell::RefCell;

use crate::dom::{
    Affinity, Document, DomTreeStrategy, EphemeralRange, FlatTreeStrategy, Position,
};

use super::adjuster::SelectionAdjuster;
use super::granularity::TextGranularity;
use super::selection::VisibleSelection;

#[derive(Debug, Clone)]
struct FlatCache {
    doc_version: u64,
    selection: VisibleSelection<FlatTreeStrategy>,
}

/// The frame's selection, with a lazily derived flat-view projection
#[derive(Debug, Default)]
pub struct FrameSelection {
    selection: VisibleSelection<DomTreeStrategy>,
    flat_cache: RefCell<Option<FlatCache>>,
}

impl FrameSelection {
    /// A frame selection with nothing selected
    pub fn new() -> Self {
        Self::default()
    }

    /// The authoritative DOM-view selection
    pub fn selection(&self) -> &VisibleSelection<DomTreeStrategy> {
        &self.selection
    }

    /// Replace the selection wholesale
    pub fn set_selection(&mut self, selection: VisibleSelection<DomTreeStrategy>) {
        self.selection = selection;
        self.flat_cache.replace(None);
    }

    /// Select a range, base at its start
    pub fn select_range(&mut self, doc: &Document, range: EphemeralRange) {
        self.set_selection(VisibleSelection::from_range(doc, range));
    }

    /// Collapse the selection to a caret
    pub fn collapse_to(&mut self, doc: &Document, position: Position, affinity: Affinity) {
        self.set_selection(VisibleSelection::from_position(doc, position, affinity));
    }

    /// Re-run granularity expansion on the current selection
    pub fn expand_using_granularity(&mut self, doc: &Document, granularity: TextGranularity) {
        self.selection.expand_using_granularity(doc, granularity);
        self.flat_cache.replace(None);
    }

    /// Drop the selection entirely
    pub fn clear(&mut self) {
        self.set_selection(VisibleSelection::none());
    }

    /// True when nothing is selected
    pub fn is_none(&self) -> bool {
        self.selection.is_none()
    }

    /// Revalidate against the current document state
    ///
    /// Called before any read that follows a possible mutation. A selection
    /// whose nodes were removed degrades to none rather than dangling.
    pub fn update_if_needed(&mut self, doc: &Document) {
        self.selection.update_if_needed(doc);
        self.flat_cache.replace(None);
    }

    /// The flat-view projection of the current selection
    ///
    /// Cached per document version; any mutation (including slot
    /// redistribution) recomputes it on next access.
    pub fn computed_flat_selection(&self, doc: &Document) -> VisibleSelection<FlatTreeStrategy> {
        let version = doc.version();
        if let Some(cache) = self.flat_cache.borrow().as_ref() {
            if cache.doc_version == version {
                return cache.selection.clone();
            }
        }
        let selection = SelectionAdjuster::adjust_in_flat_tree(doc, &self.selection);
        self.flat_cache.replace(Some(FlatCache {
            doc_version: version,
            selection: selection.clone(),
        }));
        selection
    }

    /// Minimal enclosing range of the selection, for editor queries
    pub fn normalized_range(&self, doc: &Document) -> Option<EphemeralRange> {
        self.selection.to_normalized_ephemeral_range(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeId;

    fn doc_with_text(text: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let t = doc.create_text(text);
        doc.append_child(body, t);
        (doc, t)
    }

    #[test]
    fn test_select_and_clear() {
        let (doc, t) = doc_with_text("hello world");
        let mut fs = FrameSelection::new();
        assert!(fs.is_none());

        fs.select_range(
            &doc,
            EphemeralRange::new(Position::new(t, 0), Position::new(t, 5)),
        );
        assert!(fs.selection().is_range());

        fs.clear();
        assert!(fs.is_none());
    }

    #[test]
    fn test_flat_projection_cached_until_mutation() {
        let (mut doc, t) = doc_with_text("hello world");
        let mut fs = FrameSelection::new();
        fs.select_range(
            &doc,
            EphemeralRange::new(Position::new(t, 0), Position::new(t, 5)),
        );

        let first = fs.computed_flat_selection(&doc);
        let second = fs.computed_flat_selection(&doc);
        assert_eq!(first, second);

        // a mutation elsewhere invalidates the cache but not the selection
        let body = doc.body();
        let extra = doc.create_text("tail");
        doc.append_child(body, extra);
        fs.update_if_needed(&doc);
        let third = fs.computed_flat_selection(&doc);
        assert_eq!(third.start(), first.start());
        assert_eq!(third.end(), first.end());
    }

    #[test]
    fn test_selection_degrades_after_node_removal() {
        let (mut doc, t) = doc_with_text("transient");
        let mut fs = FrameSelection::new();
        fs.collapse_to(&doc, Position::new(t, 3), Affinity::Downstream);
        assert!(fs.selection().is_caret());

        doc.remove_node(t);
        fs.update_if_needed(&doc);
        assert!(fs.is_none());
        assert!(fs.computed_flat_selection(&doc).is_none());
    }

    #[test]
    fn test_flat_projection_sees_distributed_text() {
        let mut doc = Document::new();
        let body = doc.body();
        let host = doc.create_element("x-card");
        doc.append_child(body, host);
        let light = doc.create_text("light text");
        doc.append_child(host, light);
        let shadow = doc.attach_shadow(host);
        let slot = doc.create_element("slot");
        doc.append_child(shadow, slot);

        let mut fs = FrameSelection::new();
        fs.select_range(
            &doc,
            EphemeralRange::new(Position::new(light, 0), Position::new(light, 5)),
        );
        let flat = fs.computed_flat_selection(&doc);
        assert!(flat.is_range());
        assert_eq!(flat.end(), Some(Position::new(light, 5)));
    }
}
