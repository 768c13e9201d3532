//! Selection granularities and text boundary queries
//!
//! Boundary queries operate on the rendered-text index. Word expansion uses
//! side tie-breaks: a caret already at the end of a line or of editable
//! content expands toward the previous word, so trailing whitespace and
//! line-break context are not selected spuriously.

use crate::dom::{Bias, Document, Position, TextIndex, TreeStrategy};

/// The unit used to snap/expand a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextGranularity {
    /// No expansion
    #[default]
    Character,
    /// Whole words; punctuation is a single-character word
    Word,
    /// Whole sentences, absorbing trailing spaces
    Sentence,
    /// Visual lines (here: `<br>` and block boundaries)
    Line,
    /// Whole paragraphs, absorbing the trailing paragraph break
    Paragraph,
    /// The whole document or enclosing editable region
    Document,
    /// Sentence without trailing-space absorption
    SentenceBoundary,
    /// Line without break absorption
    LineBoundary,
    /// Paragraph without break absorption
    ParagraphBoundary,
    /// Document bounds
    DocumentBoundary,
}

/// Which word to take when the offset sits exactly on a boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordSide {
    Left,
    Right,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_sentence_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Expand `[start, end)` global offsets according to a granularity
pub(crate) fn expand_with_granularity<S: TreeStrategy>(
    doc: &Document,
    index: &TextIndex<S>,
    start: usize,
    end: usize,
    granularity: TextGranularity,
) -> (usize, usize) {
    let (s, e) = match granularity {
        TextGranularity::Character => (start, end),
        TextGranularity::Word => {
            let start_side = word_side_for(doc, index, start);
            let end_side = word_side_for(doc, index, end);
            (
                start_of_word(index, start, start_side),
                end_of_word(index, end, end_side),
            )
        }
        TextGranularity::Sentence => (
            start_of_sentence(index, start),
            absorb_spaces(index, end_of_sentence(index, end)),
        ),
        TextGranularity::SentenceBoundary => {
            (start_of_sentence(index, start), end_of_sentence(index, end))
        }
        TextGranularity::Line | TextGranularity::LineBoundary => {
            (start_of_line(index, start), end_of_line(index, end))
        }
        TextGranularity::Paragraph => {
            let s = start_of_paragraph(index, start);
            let e = end_of_paragraph(index, end);
            // absorb the trailing paragraph break
            let e = match index.next_break(e, true) {
                Some(b) if b == e => e + 1,
                _ => e,
            };
            (s, advance_past_leading_table::<S>(doc, index, end, e))
        }
        TextGranularity::ParagraphBoundary => (
            start_of_paragraph(index, start),
            end_of_paragraph(index, end),
        ),
        TextGranularity::Document | TextGranularity::DocumentBoundary => {
            let s = editable_bounds(doc, index, start).map_or(0, |(lo, _)| lo);
            let e = editable_bounds(doc, index, end).map_or(index.len(), |(_, hi)| hi);
            (s, e)
        }
    };
    if s <= e { (s, e) } else { (start, end) }
}

/// Global offset bounds of the editable region containing `offset`, if any
fn editable_bounds<S: TreeStrategy>(
    doc: &Document,
    index: &TextIndex<S>,
    offset: usize,
) -> Option<(usize, usize)> {
    let pos = index.position_for_offset(offset, Bias::Backward)?;
    let root = doc.root_editable_element(pos.node)?;
    let lo = index.offset_for_position(doc, Position::first_in(root));
    let hi = index.offset_for_position(doc, Position::last_in(doc, root));
    Some((lo, hi))
}

/// Side tie-break: end of line or of editable content forces the left word
fn word_side_for<S: TreeStrategy>(doc: &Document, index: &TextIndex<S>, offset: usize) -> WordSide {
    if offset == index.len() || index.char_at(offset) == Some('\n') {
        return WordSide::Left;
    }
    if let Some((_, hi)) = editable_bounds(doc, index, offset) {
        if offset == hi {
            return WordSide::Left;
        }
    }
    WordSide::Right
}

fn start_of_word<S: TreeStrategy>(index: &TextIndex<S>, offset: usize, side: WordSide) -> usize {
    match side {
        WordSide::Right => {
            match index.char_at(offset) {
                Some(c) if is_word_char(c) => {
                    let mut i = offset;
                    while i > 0 && index.char_at(i - 1).is_some_and(is_word_char) {
                        i -= 1;
                    }
                    i
                }
                // punctuation is its own single-character word
                Some(c) if !c.is_whitespace() => offset,
                _ => offset,
            }
        }
        WordSide::Left => {
            if offset == 0 {
                return 0;
            }
            match index.char_at(offset - 1) {
                Some(c) if is_word_char(c) => {
                    let mut i = offset - 1;
                    while i > 0 && index.char_at(i - 1).is_some_and(is_word_char) {
                        i -= 1;
                    }
                    i
                }
                Some(c) if !c.is_whitespace() => offset - 1,
                _ => offset,
            }
        }
    }
}

fn end_of_word<S: TreeStrategy>(index: &TextIndex<S>, offset: usize, side: WordSide) -> usize {
    match side {
        WordSide::Right => match index.char_at(offset) {
            Some(c) if is_word_char(c) => {
                let mut i = offset;
                while index.char_at(i).is_some_and(is_word_char) {
                    i += 1;
                }
                i
            }
            Some(c) if !c.is_whitespace() => offset + 1,
            _ => offset,
        },
        WordSide::Left => offset,
    }
}

fn start_of_sentence<S: TreeStrategy>(index: &TextIndex<S>, offset: usize) -> usize {
    let mut i = offset;
    while i > 0 {
        let c = index.char_at(i - 1).unwrap_or('\n');
        if c == '\n' || is_sentence_terminator(c) {
            break;
        }
        i -= 1;
    }
    // spaces after a terminator belong to the previous sentence
    while i < offset && index.char_at(i) == Some(' ') {
        i += 1;
    }
    i
}

fn end_of_sentence<S: TreeStrategy>(index: &TextIndex<S>, offset: usize) -> usize {
    let mut i = offset;
    while i < index.len() {
        let c = index.char_at(i).unwrap_or('\n');
        if c == '\n' {
            return i;
        }
        if is_sentence_terminator(c) {
            break;
        }
        i += 1;
    }
    while index.char_at(i).is_some_and(is_sentence_terminator) {
        i += 1;
    }
    i
}

fn absorb_spaces<S: TreeStrategy>(index: &TextIndex<S>, mut offset: usize) -> usize {
    while index.char_at(offset) == Some(' ') {
        offset += 1;
    }
    offset
}

fn start_of_line<S: TreeStrategy>(index: &TextIndex<S>, offset: usize) -> usize {
    index.previous_break(offset, false).map_or(0, |b| b + 1)
}

fn end_of_line<S: TreeStrategy>(index: &TextIndex<S>, offset: usize) -> usize {
    index.next_break(offset, false).unwrap_or(index.len())
}

fn start_of_paragraph<S: TreeStrategy>(index: &TextIndex<S>, offset: usize) -> usize {
    index.previous_break(offset, true).map_or(0, |b| b + 1)
}

fn end_of_paragraph<S: TreeStrategy>(index: &TextIndex<S>, offset: usize) -> usize {
    index.next_break(offset, true).unwrap_or(index.len())
}

/// Paragraph special case: when the absorbed end lands exactly at the first
/// content of a `<table>` block, the selection advances past the table —
/// unless that would cross into a different editable region.
fn advance_past_leading_table<S: TreeStrategy>(
    doc: &Document,
    index: &TextIndex<S>,
    original_end: usize,
    absorbed_end: usize,
) -> usize {
    let Some(pos) = index.position_for_offset(absorbed_end, Bias::Forward) else {
        return absorbed_end;
    };
    let Some(table) = table_ancestor::<S>(doc, pos.node) else {
        return absorbed_end;
    };
    let table_start = index.offset_for_position(doc, Position::first_in(table));
    if table_start != absorbed_end {
        return absorbed_end;
    }
    // respect the editing boundary: never extend into a different region
    let original_root = index
        .position_for_offset(original_end, Bias::Backward)
        .and_then(|p| doc.root_editable_element(p.node));
    if doc.root_editable_element(table) != original_root {
        return absorbed_end;
    }
    match Position::after_node::<S>(doc, table) {
        Some(after) => index.offset_for_position(doc, after),
        None => absorbed_end,
    }
}

fn table_ancestor<S: TreeStrategy>(doc: &Document, node: crate::dom::NodeId) -> Option<crate::dom::NodeId> {
    let mut current = Some(node);
    while let Some(n) = current {
        if doc.tag_name(n) == Some("table") {
            return Some(n);
        }
        current = S::parent(doc, n);
    }
    None
}
