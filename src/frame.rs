//! Frame tree and the find-in-page controller
//!
//! A page is a flat list of frames in document order, the first being the
//! top-level frame. Each frame owns its document, selection and finder; the
//! controller owns the cross-frame pieces: aggregated counters, the task
//! queue carrying scoping continuations, and the host client callbacks.

use crate::dom::{Document, EphemeralRange, FlatTreeStrategy, TextIndex, TreeStrategy};
use crate::editing::{FrameSelection, SelectionAdjuster, VisibleSelection};
use crate::finder::{
    find_plain_text, FindClient, FindMatchCounters, FindOptions, SearchOptions, TextFinder,
};
use crate::geometry::{FloatPoint, FloatRect};
use crate::scheduler::{Task, TaskQueue};
use crate::utils::{Result, TextscopeError};

/// Identifier of a frame within one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub usize);

/// One frame: a document plus its selection and finder state
#[derive(Debug)]
pub struct Frame {
    id: FrameId,
    document: Document,
    selection: FrameSelection,
    finder: TextFinder,
    viewport_origin: FloatPoint,
    detached: bool,
}

impl Frame {
    /// Wrap a document into a frame
    pub fn new(id: FrameId, document: Document) -> Self {
        Self {
            id,
            document,
            selection: FrameSelection::new(),
            finder: TextFinder::new(),
            viewport_origin: FloatPoint::default(),
            detached: false,
        }
    }

    /// This frame's identifier
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// The frame's document
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access to the document
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// The frame's selection
    pub fn selection(&self) -> &FrameSelection {
        &self.selection
    }

    /// Mutable access to the selection
    pub fn selection_mut(&mut self) -> &mut FrameSelection {
        &mut self.selection
    }

    /// The frame's finder state
    pub fn finder(&self) -> &TextFinder {
        &self.finder
    }

    /// Mutable access to the finder state
    pub fn finder_mut(&mut self) -> &mut TextFinder {
        &mut self.finder
    }

    /// Offset of this frame's viewport in page coordinates
    pub fn viewport_origin(&self) -> FloatPoint {
        self.viewport_origin
    }

    /// Place the frame's viewport in page coordinates
    pub fn set_viewport_origin(&mut self, origin: FloatPoint) {
        self.viewport_origin = origin;
    }

    /// True once the frame was torn down by navigation
    pub fn is_detached(&self) -> bool {
        self.detached
    }
}

/// Frames of one page in document order; index 0 is the top-level frame
#[derive(Debug)]
pub struct FrameTree {
    frames: Vec<Frame>,
}

impl FrameTree {
    /// A tree with only the top-level frame
    pub fn new(main_document: Document) -> Self {
        Self {
            frames: vec![Frame::new(FrameId(0), main_document)],
        }
    }

    /// Append a child frame at the end of document order
    pub fn attach(&mut self, document: Document) -> FrameId {
        let id = FrameId(self.frames.len());
        self.frames.push(Frame::new(id, document));
        id
    }

    /// Look up a frame by id
    pub fn frame(&self, id: FrameId) -> Result<&Frame> {
        self.frames.get(id.0).ok_or(TextscopeError::UnknownFrame(id))
    }

    /// Look up a frame by id, mutably
    pub fn frame_mut(&mut self, id: FrameId) -> Result<&mut Frame> {
        self.frames
            .get_mut(id.0)
            .ok_or(TextscopeError::UnknownFrame(id))
    }

    /// Look up a frame that must still be attached
    pub fn attached_frame(&self, id: FrameId) -> Result<&Frame> {
        let frame = self.frame(id)?;
        if frame.detached {
            return Err(TextscopeError::DetachedFrame(id));
        }
        Ok(frame)
    }

    /// The top-level frame
    pub fn main_frame(&self) -> &Frame {
        &self.frames[0]
    }

    /// The top-level frame, mutably
    pub fn main_frame_mut(&mut self) -> &mut Frame {
        &mut self.frames[0]
    }

    /// Frames in document order, detached ones included
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    /// Mutable iteration in document order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Frame> {
        self.frames.iter_mut()
    }

    /// Ids of all frames in document order
    pub fn ids(&self) -> Vec<FrameId> {
        self.frames.iter().map(|f| f.id).collect()
    }

    /// Number of frames, detached ones included
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Never true; a tree always has its top-level frame
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Find-in-page orchestration across one page's frame tree
#[derive(Debug)]
pub struct FindController<C: FindClient> {
    frames: FrameTree,
    counters: FindMatchCounters,
    queue: TaskQueue,
    client: C,
}

impl<C: FindClient> FindController<C> {
    /// A controller over a fresh page with the given top-level document
    pub fn new(main_document: Document, client: C) -> Self {
        Self {
            frames: FrameTree::new(main_document),
            counters: FindMatchCounters::new(),
            queue: TaskQueue::new(),
            client,
        }
    }

    /// The page's frame tree
    pub fn frames(&self) -> &FrameTree {
        &self.frames
    }

    /// Mutable access to the frame tree
    pub fn frames_mut(&mut self) -> &mut FrameTree {
        &mut self.frames
    }

    /// Cross-frame aggregation state
    pub fn counters(&self) -> &FindMatchCounters {
        &self.counters
    }

    /// The host client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Mutable access to the host client
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Number of queued scoping continuations
    pub fn pending_task_count(&self) -> usize {
        self.queue.len()
    }

    /// Version of the cached match data, for staleness checks
    pub fn find_match_markers_version(&self) -> u64 {
        self.counters.find_match_markers_version()
    }

    /// Attach a child frame at the end of document order
    pub fn attach_frame(&mut self, document: Document) -> FrameId {
        self.frames.attach(document)
    }

    /// Tear a frame down
    ///
    /// Any in-flight scoping for the frame is canceled first so the
    /// cross-frame counters stay consistent.
    pub fn detach_frame(&mut self, frame_id: FrameId) -> Result<()> {
        self.cancel_scoping_for_frame(frame_id);
        let frame = self.frames.frame_mut(frame_id)?;
        frame.detached = true;
        if self.counters.active_match_frame() == Some(frame_id) {
            self.counters.set_active_match_frame(None);
        }
        Ok(())
    }

    /// Synchronous find: move the selection to the next occurrence
    ///
    /// Returns the match rectangle in page coordinates, or `None` when
    /// nothing matched. Seeds from the user's selection when one exists and
    /// is not just the previous active match; otherwise continues from the
    /// active match. A find on a detached frame is a benign no-op.
    pub fn find(
        &mut self,
        frame_id: FrameId,
        identifier: i32,
        search_text: &str,
        options: FindOptions,
        wrap_within_frame: bool,
    ) -> Result<Option<FloatRect>> {
        if search_text.is_empty() {
            return Ok(None);
        }
        let fresh = !options.find_next;
        let (cleared, outcome) = {
            let frame = self.frames.frame_mut(frame_id)?;
            if frame.detached {
                log::debug!("find on detached frame {:?} ignored", frame_id);
                return Ok(None);
            }
            frame.selection.update_if_needed(&frame.document);
            frame.finder.note_find_text(search_text);
            // a fresh search drops the previous query's highlighting;
            // findNext only moves the active marker
            let cleared = fresh && frame.finder.clear_match_highlighting();

            let index = TextIndex::<FlatTreeStrategy>::build(&frame.document);
            let selection_range = frame
                .selection
                .computed_flat_selection(&frame.document)
                .to_normalized_ephemeral_range(&frame.document)
                .filter(|r| !r.is_collapsed());
            let active = frame.finder.active_match();
            let (seed, new_selection) = match selection_range {
                Some(range) if Some(range) != active => (Some(range), true),
                Some(range) => (Some(range), false),
                None => (active, false),
            };
            let (from, to) =
                search_window::<FlatTreeStrategy>(&frame.document, &index, seed, new_selection, options);
            let search_options = SearchOptions {
                backwards: !options.forward,
                match_case: options.match_case,
                word_start: options.word_start,
                medial_capital_as_word_start: options.medial_capital_as_word_start,
            };
            let mut hit = find_plain_text(&index, search_text, from, to, search_options);
            if hit.is_none() && wrap_within_frame {
                hit = find_plain_text(&index, search_text, 0, index.len(), search_options);
            }
            let result = match hit.and_then(|(s, e)| index.range_for(s, e).map(|r| (s, e, r))) {
                None => {
                    frame.finder.record_no_match(fresh);
                    None
                }
                Some((start, end, range)) => {
                    let rect = index
                        .rect_for_range(start, end)
                        .translated(frame.viewport_origin.x, frame.viewport_origin.y);
                    let flat =
                        VisibleSelection::<FlatTreeStrategy>::from_range(&frame.document, range);
                    let dom = SelectionAdjuster::adjust_in_dom_tree(&frame.document, &flat);
                    frame.selection.set_selection(dom);
                    // a focus ring would fight the match highlight
                    frame.document.clear_focus();
                    let locate = fresh || new_selection;
                    let active_index =
                        frame
                            .finder
                            .record_active_match(range, rect, locate, options.forward);
                    Some((rect, active_index))
                }
            };
            (cleared, result)
        };
        match outcome {
            None => {
                log::debug!("find({:?}): no match for {:?}", frame_id, search_text);
                if fresh {
                    // repaint so the page reflects the empty result
                    self.counters.bump_markers_version();
                }
                Ok(None)
            }
            Some((rect, active_index)) => {
                if cleared {
                    // the dropped highlighting needs a repaint
                    self.counters.bump_markers_version();
                }
                self.counters.set_active_match_frame(Some(frame_id));
                if let Some(cache_index) = active_index {
                    let ordinal = self.ordinal_of_first_match(frame_id)? + cache_index as i32;
                    self.client
                        .report_find_in_page_selection(identifier, ordinal as usize, rect);
                }
                Ok(Some(rect))
            }
        }
    }

    /// Start or continue scoping matches in one frame
    ///
    /// With `reset` set, any pending continuation is canceled, the frame's
    /// cache is cleared and a new run begins; otherwise the existing run is
    /// resumed. Completion is signaled asynchronously through the client's
    /// count notifications.
    pub fn scope_string_matches(
        &mut self,
        frame_id: FrameId,
        identifier: i32,
        search_text: &str,
        options: FindOptions,
        reset: bool,
    ) -> Result<()> {
        if reset {
            self.cancel_scoping_for_frame(frame_id);
            let frame = self.frames.frame_mut(frame_id)?;
            if frame.detached {
                return Ok(());
            }
            if frame.finder.last_find_completed_with_no_matches()
                && frame.finder.search_text() == search_text
            {
                // the synchronous find already proved the frame is empty
                self.counters
                    .increase_match_count(&mut self.client, identifier, 0);
                return Ok(());
            }
            frame.finder.begin_scoping(identifier, search_text, options);
            self.counters.increment_frame_scoping_count();
        } else {
            self.frames.frame(frame_id)?;
        }
        self.run_scope_pass(frame_id);
        Ok(())
    }

    /// Drain queued scoping continuations until none remain
    pub fn run_pending_tasks(&mut self) {
        while let Some(task) = self.queue.take_next() {
            match task {
                Task::ScopeStringMatches { frame } => {
                    if let Ok(f) = self.frames.frame_mut(frame) {
                        f.finder.set_pending_scope_handle(None);
                    }
                    self.run_scope_pass(frame);
                }
            }
        }
    }

    /// Cancel every queued scoping continuation on every frame
    pub fn cancel_pending_scoping_effort(&mut self) {
        for frame_id in self.frames.ids() {
            self.cancel_scoping_for_frame(frame_id);
        }
    }

    /// Stop find-in-page entirely: cancel scoping, drop caches and
    /// highlighting, clear the selection, zero the aggregate counters
    pub fn stop_finding_and_clear_selection(&mut self) {
        self.cancel_pending_scoping_effort();
        for frame in self.frames.iter_mut() {
            frame.finder.stop();
            frame.selection.clear();
        }
        self.counters.set_active_match_frame(None);
        self.counters.reset_match_count();
    }

    /// Page-space rectangle of the active match; empty when there is none
    pub fn active_find_match_rect(&self) -> FloatRect {
        let Some(frame_id) = self.counters.active_match_frame() else {
            return FloatRect::empty();
        };
        let Ok(frame) = self.frames.frame(frame_id) else {
            return FloatRect::empty();
        };
        if frame.detached {
            return FloatRect::empty();
        }
        frame
            .finder
            .active_match_rect(&frame.document, frame.viewport_origin)
            .unwrap_or_else(FloatRect::empty)
    }

    /// Rectangles of every cached match across the frame tree, in document
    /// order; dead matches are pruned on the way
    pub fn find_match_rects(&mut self) -> Vec<FloatRect> {
        let mut rects = Vec::new();
        let mut pruned = 0;
        for frame in self.frames.iter_mut() {
            if frame.detached {
                continue;
            }
            pruned += frame.finder.prune_dead_matches(&frame.document);
            rects.extend(
                frame
                    .finder
                    .updated_match_rects(&frame.document, frame.viewport_origin),
            );
        }
        if pruned > 0 {
            self.counters.bump_markers_version();
        }
        rects
    }

    /// Activate the cached match nearest to a page-space point
    ///
    /// Distance is squared Euclidean from the point to each rect center;
    /// the first-encountered minimum wins ties, in frame order then cache
    /// order. Returns the 1-based global ordinal, or -1 with no matches.
    pub fn select_nearest_find_match(&mut self, point: FloatPoint, identifier: i32) -> i32 {
        let mut best: Option<(f32, FrameId, usize, FloatRect)> = None;
        for frame in self.frames.iter_mut() {
            if frame.detached {
                continue;
            }
            frame.finder.prune_dead_matches(&frame.document);
            let rects = frame
                .finder
                .updated_match_rects(&frame.document, frame.viewport_origin);
            for (cache_index, rect) in rects.iter().enumerate() {
                let distance = rect.center().distance_squared(&point);
                if best.as_ref().is_none_or(|(d, ..)| distance < *d) {
                    best = Some((distance, frame.id, cache_index, *rect));
                }
            }
        }
        let Some((_, frame_id, cache_index, rect)) = best else {
            return -1;
        };
        self.select_match_in_frame(frame_id, cache_index, identifier, rect)
    }

    /// Activate one frame's cached match by cache index
    ///
    /// Returns the 1-based global ordinal, or -1 when the index is out of
    /// range or the frame is detached.
    pub fn select_find_match(
        &mut self,
        frame_id: FrameId,
        cache_index: usize,
        identifier: i32,
    ) -> Result<i32> {
        let frame = self.frames.frame_mut(frame_id)?;
        if frame.detached {
            return Ok(-1);
        }
        let rects = frame
            .finder
            .updated_match_rects(&frame.document, frame.viewport_origin);
        let Some(rect) = rects.get(cache_index).copied() else {
            return Ok(-1);
        };
        Ok(self.select_match_in_frame(frame_id, cache_index, identifier, rect))
    }

    /// 1-based global ordinal the given frame's first match would have
    pub fn ordinal_of_first_match(&self, frame_id: FrameId) -> Result<i32> {
        let mut ordinal = 1i32;
        for frame in self.frames.iter() {
            if frame.id == frame_id {
                return Ok(ordinal);
            }
            if !frame.detached {
                ordinal += frame.finder.match_count() as i32;
            }
        }
        Err(TextscopeError::UnknownFrame(frame_id))
    }

    fn select_match_in_frame(
        &mut self,
        frame_id: FrameId,
        cache_index: usize,
        identifier: i32,
        rect: FloatRect,
    ) -> i32 {
        let Ok(frame) = self.frames.frame_mut(frame_id) else {
            return -1;
        };
        let Some(range) = frame.finder.select_match(cache_index) else {
            return -1;
        };
        let flat = VisibleSelection::<FlatTreeStrategy>::from_range(&frame.document, range);
        let dom = SelectionAdjuster::adjust_in_dom_tree(&frame.document, &flat);
        frame.selection.set_selection(dom);
        frame.document.clear_focus();
        self.counters.set_active_match_frame(Some(frame_id));
        let Ok(base) = self.ordinal_of_first_match(frame_id) else {
            return -1;
        };
        let ordinal = base + cache_index as i32;
        self.client
            .report_find_in_page_selection(identifier, ordinal as usize, rect);
        ordinal
    }

    /// One bounded scoping pass plus its bookkeeping
    fn run_scope_pass(&mut self, frame_id: FrameId) {
        let (pass, identifier, continuation) = {
            let Ok(frame) = self.frames.frame_mut(frame_id) else {
                return;
            };
            let identifier = frame.finder.find_request_identifier().unwrap_or(0);
            if frame.detached {
                // benign abort, but the cross-frame counter must stay
                // consistent with the work that will never finish
                if frame.finder.cancel_scoping() {
                    self.counters
                        .decrement_frame_scoping_count(&mut self.client, identifier);
                }
                return;
            }
            let Some(pass) = frame.finder.scope_pass(&frame.document, frame.viewport_origin)
            else {
                return;
            };
            let continuation =
                (!pass.finished).then(|| Task::ScopeStringMatches { frame: frame_id });
            (pass, identifier, continuation)
        };

        if pass.needs_invalidate {
            self.counters.bump_markers_version();
        }
        if pass.found_this_pass > 0 {
            self.counters
                .increase_match_count(&mut self.client, identifier, pass.found_this_pass);
        }
        if let Some((cache_index, rect)) = pass.located_active {
            self.counters.set_active_match_frame(Some(frame_id));
            if let Ok(base) = self.ordinal_of_first_match(frame_id) {
                self.client.report_find_in_page_selection(
                    identifier,
                    (base + cache_index as i32) as usize,
                    rect,
                );
            }
        }
        match continuation {
            Some(task) => {
                let handle = self.queue.post(task);
                if let Ok(frame) = self.frames.frame_mut(frame_id) {
                    frame.finder.set_pending_scope_handle(Some(handle));
                }
            }
            None => {
                log::debug!("scoping finished for frame {:?}", frame_id);
                if let Ok(frame) = self.frames.frame_mut(frame_id) {
                    frame.finder.set_pending_scope_handle(None);
                }
                self.counters
                    .decrement_frame_scoping_count(&mut self.client, identifier);
            }
        }
    }

    fn cancel_scoping_for_frame(&mut self, frame_id: FrameId) {
        // cancel the tracked continuation first, then sweep the queue for
        // any reset tasks still targeting the frame
        if let Ok(frame) = self.frames.frame(frame_id) {
            if let Some(handle) = frame.finder.pending_scope_handle() {
                self.queue.cancel(handle);
            }
        }
        self.queue.cancel_for_frame(frame_id);
        let Ok(frame) = self.frames.frame_mut(frame_id) else {
            return;
        };
        frame.finder.set_pending_scope_handle(None);
        let identifier = frame.finder.find_request_identifier().unwrap_or(0);
        if frame.finder.cancel_scoping() {
            // the canceled continuation owed this decrement
            self.counters
                .decrement_frame_scoping_count(&mut self.client, identifier);
        }
    }
}

/// Global offset window a find request should search, derived from its seed
fn search_window<S: TreeStrategy>(
    doc: &Document,
    index: &TextIndex<S>,
    seed: Option<EphemeralRange>,
    in_selection: bool,
    options: FindOptions,
) -> (usize, usize) {
    let Some(range) = seed else {
        return (0, index.len());
    };
    let start = index.offset_for_position(doc, range.start);
    let end = index.offset_for_position(doc, range.end);
    if options.forward {
        let from = if in_selection && options.start_in_selection {
            start
        } else {
            end
        };
        (from, index.len())
    } else {
        let to = if in_selection && options.start_in_selection {
            end
        } else {
            start
        };
        (0, to)
    }
}
