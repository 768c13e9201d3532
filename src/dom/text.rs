//! Rendered-text index over a tree view
//!
//! Concatenates the rendered text of a document view and keeps a
//! bidirectional map between global character offsets and tree positions.
//! Block boundaries and `<br>` elements contribute newline characters so
//! that plain-text search cannot match across them, mirroring how rendered
//! text iteration behaves in a real engine.
//!
//! Layout is out of scope, so geometry is synthesized from fixed character
//! cells over the line structure. This keeps rect queries deterministic.

use std::collections::HashMap;
use std::marker::PhantomData;

use super::position::{EphemeralRange, Position};
use super::strategy::TreeStrategy;
use super::tree::{is_block_tag, is_unrendered_tag, Document, NodeId, NodeKind};
use crate::geometry::FloatRect;

/// Width of a synthetic character cell in px
pub const CHAR_WIDTH: f32 = 8.0;
/// Height of a synthetic line box in px
pub const LINE_HEIGHT: f32 = 16.0;

/// Kind of emitted newline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    /// `<br>` line break
    Line,
    /// Block boundary
    Paragraph,
}

/// A run of rendered characters belonging to one text node
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    /// Owning text node
    pub node: NodeId,
    /// Global offset of the first character
    pub start: usize,
    /// Number of characters
    pub len: usize,
}

impl Segment {
    fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Bias when resolving an offset that falls on a boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Prefer the earlier equivalent position
    Backward,
    /// Prefer the later equivalent position
    Forward,
}

/// Rendered-text index for one tree view of a document
#[derive(Debug)]
pub struct TextIndex<S: TreeStrategy> {
    chars: Vec<char>,
    segments: Vec<Segment>,
    segment_of_node: HashMap<NodeId, usize>,
    breaks: Vec<(usize, BreakKind)>,
    line_starts: Vec<usize>,
    doc_version: u64,
    _strategy: PhantomData<S>,
}

struct Builder {
    chars: Vec<char>,
    segments: Vec<Segment>,
    breaks: Vec<(usize, BreakKind)>,
    pending_paragraph_break: bool,
}

impl Builder {
    fn emit_pending(&mut self) {
        if self.pending_paragraph_break && !self.chars.is_empty() {
            let offset = self.chars.len();
            self.chars.push('\n');
            self.breaks.push((offset, BreakKind::Paragraph));
        }
        self.pending_paragraph_break = false;
    }
}

impl<S: TreeStrategy> TextIndex<S> {
    /// Build the index for the current document state
    pub fn build(doc: &Document) -> Self {
        let mut builder = Builder {
            chars: Vec::new(),
            segments: Vec::new(),
            breaks: Vec::new(),
            pending_paragraph_break: false,
        };
        Self::walk(doc, doc.root(), &mut builder);

        let mut line_starts = vec![0];
        for &(offset, _) in &builder.breaks {
            line_starts.push(offset + 1);
        }

        let segment_of_node = builder
            .segments
            .iter()
            .enumerate()
            .map(|(i, seg)| (seg.node, i))
            .collect();

        Self {
            chars: builder.chars,
            segments: builder.segments,
            segment_of_node,
            breaks: builder.breaks,
            line_starts,
            doc_version: doc.version(),
            _strategy: PhantomData,
        }
    }

    fn walk(doc: &Document, node: NodeId, builder: &mut Builder) {
        match doc.kind(node) {
            NodeKind::Text(text) => {
                if !text.is_empty() {
                    builder.emit_pending();
                    let start = builder.chars.len();
                    builder.chars.extend(text.chars());
                    builder.segments.push(Segment {
                        node,
                        start,
                        len: builder.chars.len() - start,
                    });
                }
                return;
            }
            NodeKind::Element(data) => {
                if is_unrendered_tag(&data.tag_name) || data.get_attribute("hidden").is_some() {
                    return;
                }
                if data.tag_name == "br" {
                    builder.emit_pending();
                    let offset = builder.chars.len();
                    builder.chars.push('\n');
                    builder.breaks.push((offset, BreakKind::Line));
                    return;
                }
                if is_block_tag(&data.tag_name) && !builder.chars.is_empty() {
                    builder.pending_paragraph_break = true;
                }
            }
            NodeKind::Document | NodeKind::ShadowRoot => {}
        }

        for child in S::children(doc, node) {
            Self::walk(doc, child, builder);
        }

        if let NodeKind::Element(data) = doc.kind(node) {
            if is_block_tag(&data.tag_name) && !builder.chars.is_empty() {
                builder.pending_paragraph_break = true;
            }
        }
    }

    /// Document version this index was built against
    pub fn doc_version(&self) -> u64 {
        self.doc_version
    }

    /// Total rendered character count, including break characters
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// True if the view renders no text
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Rendered characters
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Character at an offset
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.chars.get(offset).copied()
    }

    /// True if the text node contributes rendered text in this view
    pub fn is_rendered(&self, node: NodeId) -> bool {
        self.segment_of_node.contains_key(&node)
    }

    /// Global offset for a position; positions outside rendered content
    /// clamp to the nearest rendered boundary
    pub fn offset_for_position(&self, doc: &Document, pos: Position) -> usize {
        if let Some(&i) = self.segment_of_node.get(&pos.node) {
            let seg = &self.segments[i];
            return seg.start + pos.offset.min(seg.len);
        }
        // container or unrendered anchor: first rendered segment at or
        // after the boundary point
        let i = self.segments.partition_point(|seg| {
            Position::cmp_in::<S>(doc, Position::first_in(seg.node), pos) == std::cmp::Ordering::Less
        });
        match self.segments.get(i) {
            Some(seg) => seg.start,
            None => self.len(),
        }
    }

    /// Position for a global offset, honoring the given bias at boundaries
    pub fn position_for_offset(&self, offset: usize, bias: Bias) -> Option<Position> {
        if self.segments.is_empty() {
            return None;
        }
        if let Some(seg) = self
            .segments
            .iter()
            .find(|seg| seg.start < offset && offset < seg.end())
        {
            return Some(Position::new(seg.node, offset - seg.start));
        }
        let next = self.segments.iter().find(|seg| seg.start >= offset);
        let prev = self.segments.iter().rev().find(|seg| seg.end() <= offset);
        let (first, second) = match bias {
            Bias::Backward => (
                prev.map(|s| Position::new(s.node, s.len)),
                next.map(|s| Position::first_in(s.node)),
            ),
            Bias::Forward => (
                next.map(|s| Position::first_in(s.node)),
                prev.map(|s| Position::new(s.node, s.len)),
            ),
        };
        first.or(second)
    }

    /// Most-backward caret equivalent of an offset
    pub fn most_backward_caret_position(&self, offset: usize) -> Option<Position> {
        self.position_for_offset(offset, Bias::Backward)
    }

    /// Most-forward caret equivalent of an offset
    pub fn most_forward_caret_position(&self, offset: usize) -> Option<Position> {
        self.position_for_offset(offset, Bias::Forward)
    }

    /// Nearest rendered position for an arbitrary anchor
    pub fn closest_rendered_position(
        &self,
        doc: &Document,
        pos: Position,
        bias: Bias,
    ) -> Option<Position> {
        let offset = self.offset_for_position(doc, pos);
        self.position_for_offset(offset, bias)
    }

    /// Range of positions covering `[start, end)` in global offsets
    pub fn range_for(&self, start: usize, end: usize) -> Option<EphemeralRange> {
        let start_pos = self.position_for_offset(start, Bias::Forward)?;
        let end_pos = self.position_for_offset(end, Bias::Backward)?;
        Some(EphemeralRange::new(start_pos, end_pos))
    }

    /// Line breaks of the given kinds strictly before `offset`
    pub fn previous_break(&self, offset: usize, paragraph_only: bool) -> Option<usize> {
        self.breaks
            .iter()
            .rev()
            .find(|&&(o, kind)| o < offset && (!paragraph_only || kind == BreakKind::Paragraph))
            .map(|&(o, _)| o)
    }

    /// Line breaks of the given kinds at or after `offset`
    pub fn next_break(&self, offset: usize, paragraph_only: bool) -> Option<usize> {
        self.breaks
            .iter()
            .find(|&&(o, kind)| o >= offset && (!paragraph_only || kind == BreakKind::Paragraph))
            .map(|&(o, _)| o)
    }

    /// Line and column for an offset in the synthetic line grid
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&s| s <= offset) - 1;
        (line, offset - self.line_starts[line])
    }

    /// Synthetic bounding rect for a global offset range
    pub fn rect_for_range(&self, start: usize, end: usize) -> FloatRect {
        if start >= end {
            return FloatRect::empty();
        }
        let (start_line, start_col) = self.line_col(start);
        let (end_line, end_col) = self.line_col(end);
        let mut rect = FloatRect::empty();
        for line in start_line..=end_line {
            let line_start = self.line_starts[line];
            let line_end = self
                .line_starts
                .get(line + 1)
                .map(|&s| s - 1)
                .unwrap_or(self.len());
            let from = if line == start_line { start_col } else { 0 };
            let to = if line == end_line {
                end_col
            } else {
                line_end - line_start
            };
            if to > from {
                rect = rect.union(&FloatRect::new(
                    from as f32 * CHAR_WIDTH,
                    line as f32 * LINE_HEIGHT,
                    (to - from) as f32 * CHAR_WIDTH,
                    LINE_HEIGHT,
                ));
            }
        }
        rect
    }

    /// Synthetic content size of the rendered text
    pub fn content_size(&self) -> (f32, f32) {
        let mut max_cols = 0;
        for (i, &start) in self.line_starts.iter().enumerate() {
            let end = self
                .line_starts
                .get(i + 1)
                .map(|&s| s - 1)
                .unwrap_or(self.len());
            max_cols = max_cols.max(end - start);
        }
        (
            max_cols as f32 * CHAR_WIDTH,
            self.line_starts.len() as f32 * LINE_HEIGHT,
        )
    }

    /// Rendered text as a `String`, mostly for tests and diagnostics
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }
}
