//! Per-frame incremental text finder
//!
//! Scoping walks the frame's rendered text under a wall-clock budget,
//! building the match cache one bounded pass at a time:
//!
//! `Idle → Scoping → (TimedOut → Scoping)* → Finished`
//!
//! A timed-out pass persists a collapsed resume range and is re-entered
//! through the task queue with zero delay, never by direct recursion. The
//! budget is sampled between matches only, so a pass can overrun by at most
//! one in-flight occurrence lookup.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use crate::dom::{Bias, Document, EphemeralRange, FlatTreeStrategy, Position, TextIndex};
use crate::geometry::{FloatPoint, FloatRect};
use crate::scheduler::TaskHandle;

use super::matches::FindMatch;
use super::search::{find_plain_text, SearchOptions};

/// Wall-clock budget for one scoping pass
pub const SCOPING_BUDGET: Duration = Duration::from_millis(100);

/// Match count a frame must exceed before the first scrollbar redraw
const SCROLLBAR_INVALIDATION_THRESHOLD: usize = 500;
/// First threshold increment; grows by half after every redraw
const NEXT_INVALIDATION_INCREMENT: usize = 750;

/// Options for one find request
#[derive(Debug, Clone, Copy)]
pub struct FindOptions {
    /// Search toward the document end
    pub forward: bool,
    /// Case-sensitive comparison
    pub match_case: bool,
    /// Continuation of the previous search rather than a fresh one
    pub find_next: bool,
    /// Only match at word boundaries
    pub word_start: bool,
    /// Treat camelCase capitals as word boundaries
    pub medial_capital_as_word_start: bool,
    /// Start the first search inside the current selection
    pub start_in_selection: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            forward: true,
            match_case: false,
            find_next: false,
            word_start: false,
            medial_capital_as_word_start: false,
            start_in_selection: false,
        }
    }
}

/// Scoping progress of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopingState {
    /// No active search
    #[default]
    Idle,
    /// A bounded pass is in flight
    Scoping,
    /// The budget expired; a continuation is queued
    TimedOut,
    /// The whole document was scanned
    Finished,
}

/// Result of one bounded scoping pass
#[derive(Debug)]
pub(crate) struct ScopePass {
    /// Matches appended to the cache by this pass
    pub found_this_pass: usize,
    /// Document end was reached
    pub finished: bool,
    /// Active match located by rect comparison: cache index and rect
    pub located_active: Option<(usize, FloatRect)>,
    /// Match volume crossed the throttled-invalidation threshold
    pub needs_invalidate: bool,
}

/// Find-in-page state for a single frame
#[derive(Debug)]
pub struct TextFinder {
    search_text: String,
    options: FindOptions,
    match_cache: Vec<FindMatch>,
    match_count: usize,
    last_match_count: Option<usize>,
    active_match: Option<EphemeralRange>,
    active_match_index: Option<usize>,
    resume_scoping_from: Option<EphemeralRange>,
    state: ScopingState,
    locating_active_rect: bool,
    active_selection_rect: Option<FloatRect>,
    last_find_completed_with_no_matches: bool,
    next_invalidate_after: usize,
    invalidation_increment: usize,
    scrollbar_invalidations: usize,
    cached_content_size: Option<(f32, f32)>,
    scoping_budget: Duration,
    pending_scope_handle: Option<TaskHandle>,
    find_request_identifier: Option<i32>,
}

impl Default for TextFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFinder {
    /// A finder with no active search
    pub fn new() -> Self {
        Self {
            search_text: String::new(),
            options: FindOptions::default(),
            match_cache: Vec::new(),
            match_count: 0,
            last_match_count: None,
            active_match: None,
            active_match_index: None,
            resume_scoping_from: None,
            state: ScopingState::Idle,
            locating_active_rect: false,
            active_selection_rect: None,
            last_find_completed_with_no_matches: false,
            next_invalidate_after: SCROLLBAR_INVALIDATION_THRESHOLD,
            invalidation_increment: NEXT_INVALIDATION_INCREMENT,
            scrollbar_invalidations: 0,
            cached_content_size: None,
            scoping_budget: SCOPING_BUDGET,
            pending_scope_handle: None,
            find_request_identifier: None,
        }
    }

    /// Override the per-pass wall-clock budget
    pub fn set_scoping_budget(&mut self, budget: Duration) {
        self.scoping_budget = budget;
    }

    /// Text of the current search
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Options of the current search
    pub fn options(&self) -> FindOptions {
        self.options
    }

    /// Identifier of the find session that started the current scoping run
    pub fn find_request_identifier(&self) -> Option<i32> {
        self.find_request_identifier
    }

    /// Cached matches in discovery order
    pub fn matches(&self) -> &[FindMatch] {
        &self.match_cache
    }

    /// Matches counted so far in the current search
    pub fn match_count(&self) -> usize {
        self.match_count
    }

    /// Final count of the last completed scoping run
    pub fn last_match_count(&self) -> Option<usize> {
        self.last_match_count
    }

    /// Range of the active match, if one is chosen
    pub fn active_match(&self) -> Option<EphemeralRange> {
        self.active_match
    }

    /// Cache index of the active match once known
    pub fn active_match_index(&self) -> Option<usize> {
        self.active_match_index
    }

    /// Current state of the scoping state machine
    pub fn state(&self) -> ScopingState {
        self.state
    }

    /// True while a scoping run has not completed or been canceled
    pub fn is_scoping(&self) -> bool {
        matches!(self.state, ScopingState::Scoping | ScopingState::TimedOut)
    }

    /// Throttled scrollbar redraws issued during the current search
    pub fn scrollbar_invalidations(&self) -> usize {
        self.scrollbar_invalidations
    }

    /// Whether the last synchronous find came up empty
    pub fn last_find_completed_with_no_matches(&self) -> bool {
        self.last_find_completed_with_no_matches
    }

    pub(crate) fn pending_scope_handle(&self) -> Option<TaskHandle> {
        self.pending_scope_handle
    }

    pub(crate) fn set_pending_scope_handle(&mut self, handle: Option<TaskHandle>) {
        self.pending_scope_handle = handle;
    }

    /// Start a fresh scoping run: clears the match cache and counters and
    /// arms the state machine. The caller owns the cross-frame scoping
    /// counter increment.
    pub(crate) fn begin_scoping(&mut self, identifier: i32, search_text: &str, options: FindOptions) {
        // a rect armed for a different query must never flag a match of the
        // new one, even when their rects coincide
        if self.search_text != search_text {
            self.locating_active_rect = false;
            self.active_selection_rect = None;
        }
        self.find_request_identifier = Some(identifier);
        self.search_text = search_text.to_owned();
        self.options = options;
        self.match_cache.clear();
        self.match_count = 0;
        self.last_match_count = None;
        self.active_match_index = None;
        self.resume_scoping_from = None;
        self.next_invalidate_after = SCROLLBAR_INVALIDATION_THRESHOLD;
        self.invalidation_increment = NEXT_INVALIDATION_INCREMENT;
        self.scrollbar_invalidations = 0;
        self.cached_content_size = None;
        self.state = ScopingState::Scoping;
    }

    /// Run one bounded pass over the document
    ///
    /// Returns `None` when there is no run to continue (canceled or already
    /// finished), which callers treat as benign.
    pub(crate) fn scope_pass(
        &mut self,
        doc: &Document,
        viewport_origin: FloatPoint,
    ) -> Option<ScopePass> {
        if !self.is_scoping() {
            return None;
        }
        self.state = ScopingState::Scoping;

        let index = TextIndex::<FlatTreeStrategy>::build(doc);
        if self.search_text.is_empty() || index.is_empty() {
            self.finish_run();
            return Some(ScopePass {
                found_this_pass: 0,
                finished: true,
                located_active: None,
                needs_invalidate: false,
            });
        }

        let mut cursor = match &self.resume_scoping_from {
            Some(range) if !range.start.is_orphaned(doc) => {
                index.offset_for_position(doc, range.start)
            }
            _ => 0,
        };
        let search_options = SearchOptions {
            backwards: false,
            match_case: self.options.match_case,
            word_start: self.options.word_start,
            medial_capital_as_word_start: self.options.medial_capital_as_word_start,
        };
        let deadline = Instant::now() + self.scoping_budget;
        let mut found_this_pass = 0;
        let mut finished = false;
        let mut located_active = None;

        loop {
            let Some((start, end)) =
                find_plain_text(&index, &self.search_text, cursor, index.len(), search_options)
            else {
                finished = true;
                break;
            };
            // advance past the match start, not its end, so overlapping
            // occurrences from later start offsets are still visited
            cursor = start + 1;

            let range = match index.range_for(start, end) {
                Some(range) => range,
                None => continue,
            };
            // a match whose range collapses (text spanning disjoint tree
            // scopes) is skipped without counting
            if Position::cmp_in::<FlatTreeStrategy>(doc, range.start, range.end) != Ordering::Less {
                continue;
            }

            self.match_count += 1;
            let entry = FindMatch::new(range, self.match_count);
            if self.locating_active_rect {
                let rect = index
                    .rect_for_range(start, end)
                    .translated(viewport_origin.x, viewport_origin.y);
                if self.active_selection_rect == Some(rect) {
                    // found the match the synchronous find() selected; at
                    // most one match per search is flagged this way
                    self.locating_active_rect = false;
                    self.active_match = Some(range);
                    self.active_match_index = Some(self.match_cache.len());
                    located_active = Some((self.match_cache.len(), rect));
                }
            }
            self.match_cache.push(entry);
            found_this_pass += 1;
            self.resume_scoping_from = index
                .position_for_offset(cursor, Bias::Forward)
                .map(EphemeralRange::collapsed);

            if Instant::now() >= deadline {
                break;
            }
        }

        let needs_invalidate = if finished {
            self.finish_run();
            false
        } else {
            self.state = ScopingState::TimedOut;
            found_this_pass > 0 && self.crossed_invalidation_threshold()
        };
        Some(ScopePass {
            found_this_pass,
            finished,
            located_active,
            needs_invalidate,
        })
    }

    fn finish_run(&mut self) {
        self.state = ScopingState::Finished;
        self.resume_scoping_from = None;
        self.last_match_count = Some(self.match_count);
    }

    /// Exponentially backed-off redraw throttle for huge match volumes
    fn crossed_invalidation_threshold(&mut self) -> bool {
        if self.match_count <= self.next_invalidate_after {
            return false;
        }
        self.next_invalidate_after += self.invalidation_increment;
        self.invalidation_increment = self.invalidation_increment * 3 / 2;
        self.scrollbar_invalidations += 1;
        true
    }

    /// Abandon the current scoping run
    ///
    /// Releases the resume cursor; returns true when the run was in flight,
    /// in which case the caller owes a scoping-counter decrement.
    pub(crate) fn cancel_scoping(&mut self) -> bool {
        let was_scoping = self.is_scoping();
        self.resume_scoping_from = None;
        if was_scoping {
            self.state = ScopingState::Idle;
        }
        was_scoping
    }

    /// Remember the text of a synchronous find request
    ///
    /// A text change clears the no-matches latch, since the new query has
    /// not been proven empty.
    pub(crate) fn note_find_text(&mut self, text: &str) {
        if self.search_text != text {
            self.search_text = text.to_owned();
            self.last_find_completed_with_no_matches = false;
        }
    }

    /// Drop the previous query's match highlighting ahead of a fresh search
    ///
    /// The active-match range survives as the seed for the new search; the
    /// cache, counts and ordinal do not. Returns true when there was
    /// highlighting to drop.
    pub(crate) fn clear_match_highlighting(&mut self) -> bool {
        let had_matches = !self.match_cache.is_empty();
        self.match_cache.clear();
        self.match_count = 0;
        self.last_match_count = None;
        self.active_match_index = None;
        had_matches
    }

    /// Record the outcome of a failed synchronous find
    pub(crate) fn record_no_match(&mut self, fresh: bool) {
        if fresh {
            self.match_cache.clear();
            self.active_match = None;
            self.active_match_index = None;
        }
        self.last_find_completed_with_no_matches = true;
    }

    /// Record a successful synchronous find
    ///
    /// When `locate` is set (fresh search or a search seeded from a new user
    /// selection), the exact ordinal is deferred to the next scoping pass by
    /// arming rect location. Otherwise the index advances from the previous
    /// one with wraparound against the last completed match count; the
    /// computed 0-based index is returned when available.
    pub(crate) fn record_active_match(
        &mut self,
        range: EphemeralRange,
        rect: FloatRect,
        locate: bool,
        forward: bool,
    ) -> Option<usize> {
        self.active_match = Some(range);
        self.active_selection_rect = Some(rect);
        self.last_find_completed_with_no_matches = false;
        if locate {
            self.locating_active_rect = true;
            return None;
        }
        match self.last_match_count {
            Some(count) if count > 0 => {
                let current = self.active_match_index.unwrap_or(0);
                let next = if forward {
                    (current + 1) % count
                } else {
                    (current + count - 1) % count
                };
                self.active_match_index = Some(next);
                Some(next)
            }
            _ => {
                self.locating_active_rect = true;
                None
            }
        }
    }

    /// Drop cached matches whose ranges were detached by document mutation
    ///
    /// Ordinals of surviving matches are preserved. Returns the number of
    /// pruned entries.
    pub(crate) fn prune_dead_matches(&mut self, doc: &Document) -> usize {
        let before = self.match_cache.len();
        self.match_cache.retain(|m| !m.is_dead(doc));
        if let Some(active) = self.active_match {
            if active.is_orphaned(doc) {
                self.active_match = None;
                self.active_match_index = None;
            }
        }
        before - self.match_cache.len()
    }

    /// Rects of all cached matches, lazily computed in page coordinates
    ///
    /// A content-size change invalidates every cached rect first.
    pub(crate) fn updated_match_rects(
        &mut self,
        doc: &Document,
        viewport_origin: FloatPoint,
    ) -> Vec<FloatRect> {
        let index = TextIndex::<FlatTreeStrategy>::build(doc);
        let content_size = index.content_size();
        if self.cached_content_size != Some(content_size) {
            for entry in &self.match_cache {
                entry.invalidate_rect();
            }
            self.cached_content_size = Some(content_size);
        }
        self.match_cache
            .iter()
            .map(|entry| match entry.cached_rect() {
                Some(rect) => rect,
                None => {
                    let start = index.offset_for_position(doc, entry.range().start);
                    let end = index.offset_for_position(doc, entry.range().end);
                    let rect = index
                        .rect_for_range(start, end)
                        .translated(viewport_origin.x, viewport_origin.y);
                    entry.set_cached_rect(rect);
                    rect
                }
            })
            .collect()
    }

    /// Page-space rect of the active match
    pub(crate) fn active_match_rect(
        &self,
        doc: &Document,
        viewport_origin: FloatPoint,
    ) -> Option<FloatRect> {
        let active = self.active_match?;
        if active.is_orphaned(doc) {
            return None;
        }
        let index = TextIndex::<FlatTreeStrategy>::build(doc);
        let start = index.offset_for_position(doc, active.start);
        let end = index.offset_for_position(doc, active.end);
        Some(
            index
                .rect_for_range(start, end)
                .translated(viewport_origin.x, viewport_origin.y),
        )
    }

    /// Make a cached match the active one; returns its 0-based cache index
    pub(crate) fn select_match(&mut self, cache_index: usize) -> Option<EphemeralRange> {
        let entry = self.match_cache.get(cache_index)?;
        let range = entry.range();
        self.active_match = Some(range);
        self.active_match_index = Some(cache_index);
        Some(range)
    }

    /// Drop all search state and return to `Idle`
    pub(crate) fn stop(&mut self) {
        *self = Self {
            scoping_budget: self.scoping_budget,
            ..Self::new()
        };
    }
}
