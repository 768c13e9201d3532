//! Cross-frame match aggregation
//!
//! The top-level frame of a page owns one [`FindMatchCounters`]; every
//! descendant frame's finder mutates it through the controller. Progress is
//! surfaced to the host through [`FindClient`], with the final count
//! notification sent exactly once, when the last frame finishes scoping.

use crate::frame::FrameId;
use crate::geometry::FloatRect;

/// Host-side sink for find-in-page progress
///
/// Implemented by the embedder's UI layer; the controller never calls back
/// into itself through this trait.
#[cfg_attr(test, mockall::automock)]
pub trait FindClient {
    /// Aggregate match count changed; `final_update` is set once no frame
    /// is still scoping
    fn report_find_in_page_match_count(&mut self, identifier: i32, total: usize, final_update: bool);

    /// A new active match was chosen, with its 1-based global ordinal and
    /// its rectangle in page coordinates
    fn report_find_in_page_selection(
        &mut self,
        identifier: i32,
        active_match_ordinal: usize,
        active_match_rect: FloatRect,
    );
}

/// Aggregated find state held by the top-level frame
#[derive(Debug, Default)]
pub struct FindMatchCounters {
    total_match_count: usize,
    frame_scoping_count: usize,
    find_match_markers_version: u64,
    active_match_frame: Option<FrameId>,
}

impl FindMatchCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total matches reported by all frames so far
    pub fn total_match_count(&self) -> usize {
        self.total_match_count
    }

    /// Number of frames still running scoping passes
    pub fn frame_scoping_count(&self) -> usize {
        self.frame_scoping_count
    }

    /// Monotonic version of the cached match data
    ///
    /// Consumers holding match rects compare against this to detect
    /// staleness without re-scanning.
    pub fn find_match_markers_version(&self) -> u64 {
        self.find_match_markers_version
    }

    /// Frame currently owning the active match, if any
    pub fn active_match_frame(&self) -> Option<FrameId> {
        self.active_match_frame
    }

    pub(crate) fn set_active_match_frame(&mut self, frame: Option<FrameId>) {
        self.active_match_frame = frame;
    }

    pub(crate) fn increment_frame_scoping_count(&mut self) {
        self.frame_scoping_count += 1;
    }

    /// One frame finished (or abandoned) scoping; at zero, send the final
    /// aggregate notification
    pub(crate) fn decrement_frame_scoping_count<C: FindClient>(
        &mut self,
        client: &mut C,
        identifier: i32,
    ) {
        debug_assert!(self.frame_scoping_count > 0);
        self.frame_scoping_count = self.frame_scoping_count.saturating_sub(1);
        if self.frame_scoping_count == 0 {
            client.report_find_in_page_match_count(identifier, self.total_match_count, true);
        }
    }

    /// Add a frame's newly found matches to the total
    pub(crate) fn increase_match_count<C: FindClient>(
        &mut self,
        client: &mut C,
        identifier: i32,
        delta: usize,
    ) {
        if delta != 0 {
            self.total_match_count += delta;
            self.find_match_markers_version += 1;
        }
        client.report_find_in_page_match_count(
            identifier,
            self.total_match_count,
            self.frame_scoping_count == 0,
        );
    }

    /// Zero the counters for a fresh search
    pub(crate) fn reset_match_count(&mut self) {
        if self.total_match_count != 0 {
            self.find_match_markers_version += 1;
        }
        self.total_match_count = 0;
        self.frame_scoping_count = 0;
    }

    pub(crate) fn bump_markers_version(&mut self) {
        self.find_match_markers_version += 1;
    }
}
