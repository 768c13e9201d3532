//! Cached match entries
//!
//! A scoping pass appends one [`FindMatch`] per counted occurrence. The
//! range and ordinal are fixed at creation; only the bounding rectangle is
//! lazy, since geometry is invalidated whenever a frame's content size
//! changes.

use std::cell::Cell;

use crate::dom::{Document, EphemeralRange};
use crate::geometry::FloatRect;

/// One cached occurrence of the search text
#[derive(Debug, Clone)]
pub struct FindMatch {
    range: EphemeralRange,
    ordinal: usize,
    rect: Cell<Option<FloatRect>>,
}

impl FindMatch {
    pub(crate) fn new(range: EphemeralRange, ordinal: usize) -> Self {
        Self {
            range,
            ordinal,
            rect: Cell::new(None),
        }
    }

    /// The matched text range
    pub fn range(&self) -> EphemeralRange {
        self.range
    }

    /// 1-based rank among the frame's matches, in discovery order
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// True once the range no longer points into the document
    pub fn is_dead(&self, doc: &Document) -> bool {
        self.range.is_orphaned(doc)
    }

    pub(crate) fn cached_rect(&self) -> Option<FloatRect> {
        self.rect.get()
    }

    pub(crate) fn set_cached_rect(&self, rect: FloatRect) {
        self.rect.set(Some(rect));
    }

    pub(crate) fn invalidate_rect(&self) {
        self.rect.set(None);
    }
}
