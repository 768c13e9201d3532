//! Canonical visible selection over a live document
//!
//! A [`VisibleSelection`] holds the user-facing (base, extent) endpoints in
//! drag order and a normalized (start, end) pair in tree order. Every public
//! mutation re-runs the full validation pipeline, so there is no observable
//! partially-valid state: start ≤ end always, affinity is forced to
//! Downstream for non-carets, and endpoints never straddle shadow-host or
//! editing boundaries.

use std::cmp::Ordering;
use std::marker::PhantomData;

use crate::dom::{
    next_in_traversal, prev_in_traversal, Affinity, Bias, Document, DomTreeStrategy,
    EphemeralRange, NodeId, Position, TextIndex, TreeStrategy,
};

use super::granularity::{expand_with_granularity, TextGranularity};

/// Derived selection kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionType {
    /// No selection
    #[default]
    None,
    /// Collapsed selection (start == end)
    Caret,
    /// Non-collapsed selection
    Range,
}

/// A validated selection over one tree view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleSelection<S: TreeStrategy = DomTreeStrategy> {
    base: Option<Position>,
    extent: Option<Position>,
    start: Option<Position>,
    end: Option<Position>,
    affinity: Affinity,
    granularity: TextGranularity,
    base_is_first: bool,
    is_directional: bool,
    has_trailing_whitespace: bool,
    selection_type: SelectionType,
    document_id: u64,
    _strategy: PhantomData<S>,
}

impl<S: TreeStrategy> Default for VisibleSelection<S> {
    fn default() -> Self {
        Self::none()
    }
}

impl<S: TreeStrategy> VisibleSelection<S> {
    /// The empty selection
    pub fn none() -> Self {
        Self {
            base: None,
            extent: None,
            start: None,
            end: None,
            affinity: Affinity::Downstream,
            granularity: TextGranularity::Character,
            base_is_first: true,
            is_directional: false,
            has_trailing_whitespace: false,
            selection_type: SelectionType::None,
            document_id: 0,
            _strategy: PhantomData,
        }
    }

    /// Construct and validate from user-intent endpoints
    ///
    /// Falls silently to `None` when both endpoints are null.
    pub fn new(
        doc: &Document,
        base: Option<Position>,
        extent: Option<Position>,
        affinity: Affinity,
        is_directional: bool,
    ) -> Self {
        let mut selection = Self {
            base,
            extent,
            affinity,
            is_directional,
            ..Self::none()
        };
        selection.validate(doc);
        selection
    }

    /// Collapsed selection at a single position
    pub fn from_position(doc: &Document, position: Position, affinity: Affinity) -> Self {
        Self::new(doc, Some(position), Some(position), affinity, false)
    }

    /// Selection covering a range, base at the start
    pub fn from_range(doc: &Document, range: EphemeralRange) -> Self {
        Self::new(
            doc,
            Some(range.start),
            Some(range.end),
            Affinity::Downstream,
            false,
        )
    }

    /// User-intent endpoint the drag started from
    pub fn base(&self) -> Option<Position> {
        self.base
    }

    /// User-intent endpoint the drag ended at
    pub fn extent(&self) -> Option<Position> {
        self.extent
    }

    /// Normalized start (tree order)
    pub fn start(&self) -> Option<Position> {
        self.start
    }

    /// Normalized end (tree order)
    pub fn end(&self) -> Option<Position> {
        self.end
    }

    /// Caret affinity; meaningful only for carets
    pub fn affinity(&self) -> Affinity {
        self.affinity
    }

    /// Current expansion granularity
    pub fn granularity(&self) -> TextGranularity {
        self.granularity
    }

    /// Derived selection kind
    pub fn selection_type(&self) -> SelectionType {
        self.selection_type
    }

    /// Whether base precedes extent in tree order
    pub fn is_base_first(&self) -> bool {
        self.base_is_first
    }

    /// Whether shift+arrow extends from a fixed base
    pub fn is_directional(&self) -> bool {
        self.is_directional
    }

    /// Set directionality without revalidating (does not affect endpoints)
    pub fn set_is_directional(&mut self, directional: bool) {
        self.is_directional = directional;
    }

    /// Word-granularity trailing-whitespace artifact
    pub fn has_trailing_whitespace(&self) -> bool {
        self.has_trailing_whitespace
    }

    /// True for the empty selection
    pub fn is_none(&self) -> bool {
        self.selection_type == SelectionType::None
    }

    /// True for a collapsed selection
    pub fn is_caret(&self) -> bool {
        self.selection_type == SelectionType::Caret
    }

    /// True for a non-collapsed selection
    pub fn is_range(&self) -> bool {
        self.selection_type == SelectionType::Range
    }

    /// Move the base endpoint and revalidate
    pub fn set_base(&mut self, doc: &Document, base: Option<Position>) {
        self.base = base;
        self.validate(doc);
    }

    /// Move the extent endpoint and revalidate
    pub fn set_extent(&mut self, doc: &Document, extent: Option<Position>) {
        self.extent = extent;
        self.validate(doc);
    }

    /// Re-run validation with a new granularity; no-op when `None`
    pub fn expand_using_granularity(&mut self, doc: &Document, granularity: TextGranularity) {
        if self.is_none() {
            return;
        }
        self.granularity = granularity;
        self.validate(doc);
    }

    /// Extend the end over intra-line whitespace (double-click word drag)
    pub fn append_trailing_whitespace(&mut self, doc: &Document) {
        let Some(end) = self.end else {
            return;
        };
        let index = TextIndex::<S>::build(doc);
        let mut offset = index.offset_for_position(doc, end);
        while matches!(index.char_at(offset), Some(' ' | '\t')) {
            offset += 1;
        }
        if let Some(new_end) = index.most_backward_caret_position(offset) {
            self.end = Some(new_end);
            self.has_trailing_whitespace = true;
            self.refresh_type(doc);
        }
    }

    /// True iff both endpoints belong to `doc` and none is detached
    pub fn is_valid_for(&self, doc: &Document) -> bool {
        if self.is_none() {
            return true;
        }
        if self.document_id != doc.id() {
            return false;
        }
        [self.base, self.extent, self.start, self.end]
            .iter()
            .flatten()
            .all(|p| !p.is_orphaned(doc))
    }

    /// Revalidate after a possible document mutation
    ///
    /// Idempotent and cheap to call defensively before every read. Reapplies
    /// trailing-whitespace expansion when it was in effect.
    pub fn update_if_needed(&mut self, doc: &Document) {
        if self.is_none() {
            return;
        }
        if !self.is_valid_for(doc) {
            *self = Self::none();
            return;
        }
        let reapply = self.has_trailing_whitespace;
        self.validate(doc);
        if reapply && !self.is_none() {
            self.append_trailing_whitespace(doc);
        }
    }

    /// Minimal enclosing range for editor queries
    ///
    /// Carets snap to the most-backward equivalent (editors look at the
    /// character before the caret); ranges are already canonicalized to the
    /// minimal node span.
    pub fn to_normalized_ephemeral_range(&self, doc: &Document) -> Option<EphemeralRange> {
        match self.selection_type {
            SelectionType::None => None,
            SelectionType::Caret => {
                let index = TextIndex::<S>::build(doc);
                let offset = index.offset_for_position(doc, self.start?);
                index
                    .most_backward_caret_position(offset)
                    .map(EphemeralRange::collapsed)
            }
            SelectionType::Range => Some(EphemeralRange::new(self.start?, self.end?)),
        }
    }

    /// Internal constructor used by the tree-view adjuster: accepts already
    /// validated parts and does not re-run granularity expansion.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_validated_parts(
        base: Option<Position>,
        extent: Option<Position>,
        start: Option<Position>,
        end: Option<Position>,
        affinity: Affinity,
        granularity: TextGranularity,
        base_is_first: bool,
        is_directional: bool,
        selection_type: SelectionType,
        document_id: u64,
    ) -> Self {
        Self {
            base,
            extent,
            start,
            end,
            affinity,
            granularity,
            base_is_first,
            is_directional,
            has_trailing_whitespace: false,
            selection_type,
            document_id,
            _strategy: PhantomData,
        }
    }

    pub(crate) fn document_id(&self) -> u64 {
        self.document_id
    }

    fn clear_endpoints(&mut self) {
        self.base = None;
        self.extent = None;
        self.start = None;
        self.end = None;
        self.base_is_first = true;
        self.has_trailing_whitespace = false;
        self.affinity = Affinity::Downstream;
        self.selection_type = SelectionType::None;
    }

    /// The validation pipeline; establishes every invariant in one pass
    pub(crate) fn validate(&mut self, doc: &Document) {
        self.document_id = doc.id();
        self.has_trailing_whitespace = false;

        // null endpoints: one null borrows the other, both null means None
        let (base_raw, extent_raw) = match (self.base, self.extent) {
            (None, None) => {
                self.clear_endpoints();
                return;
            }
            (Some(b), None) => (b, b),
            (None, Some(e)) => (e, e),
            (Some(b), Some(e)) => (b, e),
        };
        if doc.is_orphaned(base_raw.node) || doc.is_orphaned(extent_raw.node) {
            self.clear_endpoints();
            return;
        }

        let index = TextIndex::<S>::build(doc);
        if index.is_empty() {
            self.clear_endpoints();
            return;
        }

        // 1. move endpoints to their nearest rendered equivalents
        let base_off = index.offset_for_position(doc, base_raw);
        let extent_off = index.offset_for_position(doc, extent_raw);

        // 2. tree-order comparison decides orientation (null-safe upstream)
        self.base_is_first = base_off <= extent_off;

        // 3. provisional start/end
        let (s_off, e_off) = if self.base_is_first {
            (base_off, extent_off)
        } else {
            (extent_off, base_off)
        };

        // 4. independent granularity expansion of both sides
        let (s_off, e_off) = expand_with_granularity(doc, &index, s_off, e_off, self.granularity);

        // provisional start/end anchored to the expansion result
        let (start, end) = if s_off == e_off {
            let caret = index.position_for_offset(s_off, Bias::Backward);
            (caret, caret)
        } else {
            (
                index.position_for_offset(s_off, Bias::Forward),
                index.position_for_offset(e_off, Bias::Backward),
            )
        };
        let (Some(start), Some(end)) = (start, end) else {
            self.clear_endpoints();
            return;
        };

        // 5. never straddle an atomic shadow-host boundary asymmetrically
        let (start, end) = adjust_for_shadow_boundary::<S>(doc, start, end, self.base_is_first);

        // 6. never cross an editing boundary
        let Some((start, end)) =
            adjust_for_editing_boundary::<S>(doc, start, end, self.base_is_first)
        else {
            // walking off the document means the caller produced endpoints in
            // disjoint editing contexts; that is a precondition violation
            log::error!("selection endpoints span disjoint editing contexts");
            debug_assert!(false, "selection endpoints span disjoint editing contexts");
            self.clear_endpoints();
            return;
        };

        // 8. canonical shrink: most-forward start, most-backward end, so
        // logically identical selections compare equal. Caret equivalence
        // stops at the boundaries steps 5 and 6 just enforced.
        let (start, end) = if Position::cmp_in::<S>(doc, start, end) == Ordering::Less {
            (
                canonical_caret_position(doc, &index, start, Bias::Forward),
                canonical_caret_position(doc, &index, end, Bias::Backward),
            )
        } else {
            (start, end)
        };

        // guard: adjustments must not invert the range
        let (start, end) = match Position::cmp_in::<S>(doc, start, end) {
            Ordering::Greater => {
                let base_side = if self.base_is_first { start } else { end };
                (base_side, base_side)
            }
            _ => (start, end),
        };

        self.start = Some(start);
        self.end = Some(end);
        // base/extent keep the user's intent: canonicalized to rendered
        // equivalents but never granularity-expanded, so revalidation after
        // a mutation re-derives the same expansion
        self.base = index.position_for_offset(base_off, Bias::Backward);
        self.extent = index.position_for_offset(extent_off, Bias::Backward);

        // 7. derive type; affinity survives only on carets
        self.refresh_type(doc);
    }

    fn refresh_type(&mut self, doc: &Document) {
        self.selection_type = match (self.start, self.end) {
            (Some(s), Some(e)) => {
                if Position::cmp_in::<S>(doc, s, e) == Ordering::Equal {
                    SelectionType::Caret
                } else {
                    SelectionType::Range
                }
            }
            _ => SelectionType::None,
        };
        if self.selection_type != SelectionType::Caret {
            self.affinity = Affinity::Downstream;
        }
    }
}

/// Caret equivalent of a validated endpoint that refuses to cross the
/// atomic-host and editing boundaries validation has just enforced. A
/// candidate on the far side of either boundary leaves the endpoint in place.
fn canonical_caret_position<S: TreeStrategy>(
    doc: &Document,
    index: &TextIndex<S>,
    pos: Position,
    bias: Bias,
) -> Position {
    let offset = index.offset_for_position(doc, pos);
    let candidate = match bias {
        Bias::Forward => index.most_forward_caret_position(offset),
        Bias::Backward => index.most_backward_caret_position(offset),
    };
    match candidate {
        Some(c)
            if doc.atomic_host_ancestor(c.node) == doc.atomic_host_ancestor(pos.node)
                && doc.root_editable_element(c.node) == doc.root_editable_element(pos.node) =>
        {
            c
        }
        _ => pos,
    }
}

/// Clamp the non-base endpoint so the selection never reaches asymmetrically
/// into (or out of) an atomic shadow host such as `<input>`.
fn adjust_for_shadow_boundary<S: TreeStrategy>(
    doc: &Document,
    start: Position,
    end: Position,
    base_is_first: bool,
) -> (Position, Position) {
    let start_host = doc.atomic_host_ancestor(start.node);
    let end_host = doc.atomic_host_ancestor(end.node);
    if start_host == end_host {
        return (start, end);
    }
    let base_host = if base_is_first { start_host } else { end_host };
    match base_host {
        Some(host) => {
            // base is inside the host: keep the whole selection inside it;
            // the host's container positions bound its distributed content
            if base_is_first {
                let len = S::children(doc, host).len();
                (start, Position::new(host, len))
            } else {
                (Position::first_in(host), end)
            }
        }
        None => {
            // base is outside: the far endpoint stops just before/after the
            // host instead of reaching inside it
            if base_is_first {
                let host = end_host.expect("hosts differ");
                match Position::after_node::<S>(doc, host) {
                    Some(after) => (start, after),
                    None => (start, end),
                }
            } else {
                let host = start_host.expect("hosts differ");
                match Position::before_node::<S>(doc, host) {
                    Some(before) => (before, end),
                    None => (start, end),
                }
            }
        }
    }
}

/// Clamp endpoints to the base's editable region (or out of foreign editable
/// regions when the base is not editable). Returns `None` when a walk runs
/// off the document, which callers treat as a fatal precondition violation.
fn adjust_for_editing_boundary<S: TreeStrategy>(
    doc: &Document,
    start: Position,
    end: Position,
    base_is_first: bool,
) -> Option<(Position, Position)> {
    let base_node = if base_is_first { start.node } else { end.node };
    match doc.root_editable_element(base_node) {
        Some(root) => {
            let new_end = if doc.root_editable_element(end.node) != Some(root) {
                last_editable_position_within::<S>(doc, end.node, root)?
            } else {
                end
            };
            let new_start = if doc.root_editable_element(start.node) != Some(root) {
                first_editable_position_within::<S>(doc, start.node, root)?
            } else {
                start
            };
            Some((new_start, new_end))
        }
        None => {
            let new_end = if doc.root_editable_element(end.node).is_some() {
                push_out_of_editable::<S>(doc, end, Bias::Backward)?
            } else {
                end
            };
            let new_start = if doc.root_editable_element(start.node).is_some() {
                push_out_of_editable::<S>(doc, start, Bias::Forward)?
            } else {
                start
            };
            Some((new_start, new_end))
        }
    }
}

/// Walk backward node by node to the nearest position still inside `root`,
/// escaping any shadow tree via its host.
fn last_editable_position_within<S: TreeStrategy>(
    doc: &Document,
    from: NodeId,
    root: NodeId,
) -> Option<Position> {
    let mut node = Some(from);
    while let Some(n) = node {
        if doc.root_editable_element(n) == Some(root) {
            return Some(Position::last_in(doc, n));
        }
        let scope = doc.tree_scope_root(n);
        if let Some(host) = doc.shadow_host(scope) {
            node = Some(host);
            continue;
        }
        node = prev_in_traversal::<S>(doc, n);
    }
    None
}

/// Forward counterpart of [`last_editable_position_within`]
fn first_editable_position_within<S: TreeStrategy>(
    doc: &Document,
    from: NodeId,
    root: NodeId,
) -> Option<Position> {
    let mut node = Some(from);
    while let Some(n) = node {
        if doc.root_editable_element(n) == Some(root) {
            return Some(Position::first_in(n));
        }
        let scope = doc.tree_scope_root(n);
        if let Some(host) = doc.shadow_host(scope) {
            node = Some(host);
            continue;
        }
        node = next_in_traversal::<S>(doc, n);
    }
    None
}

/// Push a position out of any editable region it landed in, toward the base
fn push_out_of_editable<S: TreeStrategy>(
    doc: &Document,
    from: Position,
    direction: Bias,
) -> Option<Position> {
    let mut position = from;
    loop {
        let Some(root) = doc.root_editable_element(position.node) else {
            return Some(position);
        };
        let hop = match direction {
            Bias::Backward => Position::before_node::<S>(doc, root),
            Bias::Forward => Position::after_node::<S>(doc, root),
        };
        match hop {
            Some(p) => position = p,
            None => {
                // the editable root is a shadow root: exit via its host
                let host = doc.shadow_host(root)?;
                position = match direction {
                    Bias::Backward => Position::before_node::<S>(doc, host)?,
                    Bias::Forward => Position::after_node::<S>(doc, host)?,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTreeStrategy;

    type DomSelection = VisibleSelection<DomTreeStrategy>;

    fn doc_with_text(text: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let t = doc.create_text(text);
        doc.append_child(body, t);
        (doc, t)
    }

    #[test]
    fn test_both_endpoints_null_is_none() {
        let (doc, _) = doc_with_text("abc");
        let sel = DomSelection::new(&doc, None, None, Affinity::Downstream, false);
        assert!(sel.is_none());
        assert_eq!(sel.selection_type(), SelectionType::None);
    }

    #[test]
    fn test_single_null_endpoint_borrows_other() {
        let (doc, t) = doc_with_text("abc");
        let sel = DomSelection::new(
            &doc,
            Some(Position::new(t, 1)),
            None,
            Affinity::Downstream,
            false,
        );
        assert!(sel.is_caret());
    }

    #[test]
    fn test_start_end_ordering_from_reversed_drag() {
        let (doc, t) = doc_with_text("hello world");
        // dragged right-to-left: base after extent
        let sel = DomSelection::new(
            &doc,
            Some(Position::new(t, 8)),
            Some(Position::new(t, 2)),
            Affinity::Downstream,
            false,
        );
        assert!(sel.is_range());
        assert!(!sel.is_base_first());
        assert_eq!(sel.start(), Some(Position::new(t, 2)));
        assert_eq!(sel.end(), Some(Position::new(t, 8)));
    }

    #[test]
    fn test_affinity_forced_downstream_for_ranges() {
        let (doc, t) = doc_with_text("hello");
        let sel = DomSelection::new(
            &doc,
            Some(Position::new(t, 0)),
            Some(Position::new(t, 3)),
            Affinity::Upstream,
            false,
        );
        assert!(sel.is_range());
        assert_eq!(sel.affinity(), Affinity::Downstream);

        let caret = DomSelection::from_position(&doc, Position::new(t, 2), Affinity::Upstream);
        assert!(caret.is_caret());
        assert_eq!(caret.affinity(), Affinity::Upstream);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let (doc, t) = doc_with_text("Lorem ipsum dolor");
        let mut sel = DomSelection::from_position(&doc, Position::new(t, 8), Affinity::Downstream);
        sel.expand_using_granularity(&doc, TextGranularity::Word);
        let first = sel.clone();
        sel.validate(&doc);
        assert_eq!(sel, first);
    }

    #[test]
    fn test_word_granularity_expansion() {
        let (doc, t) = doc_with_text("Lorem ipsum dolor sit amet,");
        let mut sel = DomSelection::from_position(&doc, Position::new(t, 0), Affinity::Downstream);
        sel.expand_using_granularity(&doc, TextGranularity::Word);
        assert_eq!(sel.start(), Some(Position::new(t, 0)));
        assert_eq!(sel.end(), Some(Position::new(t, 5)));

        let mut sel = DomSelection::from_position(&doc, Position::new(t, 26), Affinity::Downstream);
        sel.expand_using_granularity(&doc, TextGranularity::Word);
        assert_eq!(sel.start(), Some(Position::new(t, 26)));
        assert_eq!(sel.end(), Some(Position::new(t, 27)));
    }

    #[test]
    fn test_canonical_shrink_across_text_nodes() {
        let mut doc = Document::new();
        let body = doc.body();
        let t1 = doc.create_text("ab");
        doc.append_child(body, t1);
        let t2 = doc.create_text("cd");
        doc.append_child(body, t2);

        // end expressed as the start of the second node shrinks back into
        // the first node; start expressed at the end of t1 stays put only
        // if the range would otherwise be empty
        let sel = DomSelection::new(
            &doc,
            Some(Position::new(t1, 0)),
            Some(Position::new(t2, 0)),
            Affinity::Downstream,
            false,
        );
        assert_eq!(sel.start(), Some(Position::new(t1, 0)));
        assert_eq!(sel.end(), Some(Position::new(t1, 2)));
    }

    #[test]
    fn test_selection_clamped_out_of_atomic_host() {
        let mut doc = Document::new();
        let body = doc.body();
        let before = doc.create_text("before ");
        doc.append_child(body, before);
        let input = doc.create_element("input");
        doc.append_child(body, input);
        let shadow = doc.attach_shadow(input);
        let value = doc.create_text("typed");
        doc.append_child(shadow, value);
        let after = doc.create_text(" after");
        doc.append_child(body, after);

        // base outside, extent inside the input's shadow value: in the flat
        // view the end clamps to just after the host
        use crate::dom::FlatTreeStrategy;
        let sel = VisibleSelection::<FlatTreeStrategy>::new(
            &doc,
            Some(Position::new(before, 0)),
            Some(Position::new(value, 3)),
            Affinity::Downstream,
            false,
        );
        assert!(sel.is_range());
        let end = sel.end().unwrap();
        assert_ne!(doc.atomic_host_ancestor(end.node), Some(input));
    }

    #[test]
    fn test_clamped_end_is_canonical_and_stable() {
        let mut doc = Document::new();
        let body = doc.body();
        let before = doc.create_text("before ");
        doc.append_child(body, before);
        let input = doc.create_element("input");
        doc.append_child(body, input);
        let shadow = doc.attach_shadow(input);
        let value = doc.create_text("typed");
        doc.append_child(shadow, value);
        let after = doc.create_text(" after");
        doc.append_child(body, after);

        use crate::dom::FlatTreeStrategy;
        let sel = VisibleSelection::<FlatTreeStrategy>::new(
            &doc,
            Some(Position::new(before, 0)),
            Some(Position::new(value, 3)),
            Affinity::Downstream,
            false,
        );
        // the clamped end sits just after the host and must not shrink back
        // into the shadow value it was pushed out of
        let end = sel.end().unwrap();
        assert_eq!(end, Position::new(body, 2));
        assert_eq!(doc.atomic_host_ancestor(end.node), None);

        // the clamped result is a fixed point of validation
        let mut again = sel.clone();
        again.validate(&doc);
        assert_eq!(again, sel);
    }

    #[test]
    fn test_selection_kept_inside_atomic_host() {
        let mut doc = Document::new();
        let body = doc.body();
        let before = doc.create_text("before ");
        doc.append_child(body, before);
        let input = doc.create_element("input");
        doc.append_child(body, input);
        let shadow = doc.attach_shadow(input);
        let value = doc.create_text("typed");
        doc.append_child(shadow, value);

        use crate::dom::FlatTreeStrategy;
        // base inside the host (dragged backward out of the field)
        let sel = VisibleSelection::<FlatTreeStrategy>::new(
            &doc,
            Some(Position::new(value, 3)),
            Some(Position::new(before, 0)),
            Affinity::Downstream,
            false,
        );
        assert!(!sel.is_none());
        let start = sel.start().unwrap();
        assert_eq!(doc.atomic_host_ancestor(start.node).or(Some(input)), Some(input));
    }

    #[test]
    fn test_editable_base_clamps_end_to_editable_root() {
        let mut doc = Document::new();
        let body = doc.body();
        let div = doc.create_element("div");
        doc.set_attribute(div, "contenteditable", "true");
        doc.append_child(body, div);
        let inner = doc.create_text("editable text");
        doc.append_child(div, inner);
        let outside = doc.create_text("outside");
        doc.append_child(body, outside);

        let sel = DomSelection::new(
            &doc,
            Some(Position::new(inner, 0)),
            Some(Position::new(outside, 4)),
            Affinity::Downstream,
            false,
        );
        assert!(!sel.is_none());
        let end = sel.end().unwrap();
        assert_eq!(doc.root_editable_element(end.node), Some(div));
    }

    #[test]
    fn test_non_editable_base_pushes_end_out_of_editable() {
        let mut doc = Document::new();
        let body = doc.body();
        let outside = doc.create_text("outside ");
        doc.append_child(body, outside);
        let div = doc.create_element("div");
        doc.set_attribute(div, "contenteditable", "true");
        doc.append_child(body, div);
        let inner = doc.create_text("editable");
        doc.append_child(div, inner);

        let sel = DomSelection::new(
            &doc,
            Some(Position::new(outside, 0)),
            Some(Position::new(inner, 4)),
            Affinity::Downstream,
            false,
        );
        assert!(!sel.is_none());
        let end = sel.end().unwrap();
        assert_eq!(doc.root_editable_element(end.node), None);
    }

    #[test]
    fn test_update_if_needed_after_removal() {
        let (mut doc, t) = doc_with_text("hello world");
        let mut sel = DomSelection::new(
            &doc,
            Some(Position::new(t, 0)),
            Some(Position::new(t, 5)),
            Affinity::Downstream,
            false,
        );
        assert!(sel.is_range());

        doc.remove_node(t);
        sel.update_if_needed(&doc);
        assert!(sel.is_none());
    }

    #[test]
    fn test_trailing_whitespace_reapplied_on_update() {
        let (mut doc, t) = doc_with_text("word   next");
        let mut sel = DomSelection::from_position(&doc, Position::new(t, 1), Affinity::Downstream);
        sel.expand_using_granularity(&doc, TextGranularity::Word);
        sel.append_trailing_whitespace(&doc);
        assert!(sel.has_trailing_whitespace());
        assert_eq!(sel.end(), Some(Position::new(t, 7)));

        // unrelated mutation elsewhere; revalidation keeps the expansion
        let extra = doc.create_text("tail");
        let body = doc.body();
        doc.append_child(body, extra);
        sel.update_if_needed(&doc);
        assert_eq!(sel.end(), Some(Position::new(t, 7)));
    }

    #[test]
    fn test_normalized_range_for_caret_snaps_backward() {
        let mut doc = Document::new();
        let body = doc.body();
        let t1 = doc.create_text("ab");
        doc.append_child(body, t1);
        let t2 = doc.create_text("cd");
        doc.append_child(body, t2);

        let sel = DomSelection::from_position(&doc, Position::new(t2, 0), Affinity::Downstream);
        let range = sel.to_normalized_ephemeral_range(&doc).unwrap();
        assert!(range.is_collapsed());
        assert_eq!(range.start, Position::new(t1, 2));
    }

    #[test]
    fn test_is_valid_for_other_document() {
        let (doc_a, t) = doc_with_text("one");
        let (doc_b, _) = doc_with_text("two");
        let sel = DomSelection::from_position(&doc_a, Position::new(t, 1), Affinity::Downstream);
        assert!(sel.is_valid_for(&doc_a));
        assert!(!sel.is_valid_for(&doc_b));
    }
}
