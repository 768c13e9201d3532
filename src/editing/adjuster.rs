//! Conversion of a validated selection between tree views
//!
//! The authoritative selection lives in the DOM view; hit testing and the
//! text finder work in the flat view. Converting between them is not a plain
//! position copy: shadow contents exist only in one view, and undistributed
//! light children exist in neither rendered form.

use crate::dom::{Document, DomTreeStrategy, FlatTreeStrategy, Position, TreeStrategy};

use super::granularity::TextGranularity;
use super::selection::VisibleSelection;

/// Maps selections between the DOM and flat tree views
pub struct SelectionAdjuster;

impl SelectionAdjuster {
    /// Project a DOM-view selection into the flat view
    ///
    /// Slot distribution is brought up to date first, so the projection sees
    /// the same flat tree the renderer would. Positions on nodes absent from
    /// the flat view (undistributed light children) collapse to the nearest
    /// containing ancestor that is rendered.
    pub fn adjust_in_flat_tree(
        doc: &Document,
        selection: &VisibleSelection<DomTreeStrategy>,
    ) -> VisibleSelection<FlatTreeStrategy> {
        doc.update_distribution();
        if selection.is_none() {
            return VisibleSelection::none();
        }
        // plain coordinate translation: granularity expansion is not re-run
        let mapped = [
            selection.base(),
            selection.extent(),
            selection.start(),
            selection.end(),
        ]
        .map(|p| p.and_then(|p| map_into_view::<FlatTreeStrategy>(doc, p)));
        if let [Some(base), Some(extent), Some(start), Some(end)] = mapped {
            return VisibleSelection::from_validated_parts(
                Some(base),
                Some(extent),
                Some(start),
                Some(end),
                selection.affinity(),
                selection.granularity(),
                selection.is_base_first(),
                selection.is_directional(),
                selection.selection_type(),
                selection.document_id(),
            );
        }
        let base = mapped[0];
        let extent = mapped[1];
        rebuild(doc, base, extent, selection.affinity(), selection)
    }

    /// Project a flat-view selection back into the DOM view
    ///
    /// When every endpoint already lives in the document tree scope the
    /// validated parts carry over unchanged. Endpoints inside a shadow tree
    /// are hoisted to positions around their host and revalidated.
    pub fn adjust_in_dom_tree(
        doc: &Document,
        selection: &VisibleSelection<FlatTreeStrategy>,
    ) -> VisibleSelection<DomTreeStrategy> {
        if selection.is_none() {
            return VisibleSelection::none();
        }
        let parts = [
            selection.base(),
            selection.extent(),
            selection.start(),
            selection.end(),
        ];
        let document_scope = doc.tree_scope_root(doc.root());
        let same_scope = parts
            .iter()
            .flatten()
            .all(|p| doc.tree_scope_root(p.node) == document_scope);
        if same_scope {
            return VisibleSelection::from_validated_parts(
                selection.base(),
                selection.extent(),
                selection.start(),
                selection.end(),
                selection.affinity(),
                selection.granularity(),
                selection.is_base_first(),
                selection.is_directional(),
                selection.selection_type(),
                selection.document_id(),
            );
        }
        let base = selection
            .base()
            .and_then(|p| map_into_view::<DomTreeStrategy>(doc, p));
        let extent = selection
            .extent()
            .and_then(|p| map_into_view::<DomTreeStrategy>(doc, p));
        rebuild(doc, base, extent, selection.affinity(), selection)
    }
}

/// Validate mapped endpoints in the target view, carrying over granularity
/// and directionality from the source selection.
fn rebuild<S: TreeStrategy, T: TreeStrategy>(
    doc: &Document,
    base: Option<Position>,
    extent: Option<Position>,
    affinity: crate::dom::Affinity,
    source: &VisibleSelection<T>,
) -> VisibleSelection<S> {
    let mut adjusted = VisibleSelection::<S>::new(doc, base, extent, affinity, source.is_directional());
    if source.granularity() != TextGranularity::Character {
        adjusted.expand_using_granularity(doc, source.granularity());
    }
    adjusted
}

/// Nearest position in view `S` for an arbitrary DOM position
fn map_into_view<S: TreeStrategy>(doc: &Document, position: Position) -> Option<Position> {
    if S::contains(doc, position.node) {
        return Some(position);
    }
    let mut node = position.node;
    loop {
        let scope = doc.tree_scope_root(node);
        if let Some(host) = doc.shadow_host(scope) {
            if S::contains(doc, host) {
                // hidden shadow content collapses to just before its host
                return Position::before_node::<S>(doc, host)
                    .or_else(|| Some(Position::new(host, 0)));
            }
            node = host;
            continue;
        }
        let parent = doc.raw_parent(node)?;
        if S::contains(doc, parent) {
            // undistributed light child: snap to its raw parent
            let offset = S::index_in_parent(doc, node).unwrap_or(0);
            return Some(Position::new(parent, offset));
        }
        node = parent;
    }
}
