//! Integration tests for the textscope engine
//!
//! These tests drive the public API end to end: selection validation over a
//! live document, tree-view round trips, and the find-in-page controller
//! with time-sliced scoping across frames.

use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use textscope::dom::{
    Affinity, Document, DomTreeStrategy, FlatTreeStrategy, NodeId, Position, TextIndex,
};
use textscope::editing::{SelectionAdjuster, TextGranularity, VisibleSelection};
use textscope::finder::{find_plain_text, FindClient, FindOptions, SearchOptions};
use textscope::frame::{FindController, FrameId};
use textscope::geometry::{FloatPoint, FloatRect};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

#[derive(Debug, Default)]
struct RecordingClient {
    counts: Vec<(i32, usize, bool)>,
    selections: Vec<(i32, usize, FloatRect)>,
}

impl FindClient for RecordingClient {
    fn report_find_in_page_match_count(&mut self, identifier: i32, total: usize, final_update: bool) {
        self.counts.push((identifier, total, final_update));
    }

    fn report_find_in_page_selection(
        &mut self,
        identifier: i32,
        active_match_ordinal: usize,
        active_match_rect: FloatRect,
    ) {
        self.selections
            .push((identifier, active_match_ordinal, active_match_rect));
    }
}

fn doc_with_text(text: &str) -> (Document, NodeId) {
    let mut doc = Document::new();
    let body = doc.body();
    let t = doc.create_text(text);
    doc.append_child(body, t);
    (doc, t)
}

fn case_sensitive() -> FindOptions {
    FindOptions {
        match_case: true,
        ..Default::default()
    }
}

#[test]
fn test_word_granularity_scenario() {
    init_logging();
    let (doc, t) = doc_with_text("Lorem ipsum dolor sit amet, consectetur");

    let mut sel = VisibleSelection::<DomTreeStrategy>::from_position(
        &doc,
        Position::new(t, 0),
        Affinity::Downstream,
    );
    sel.expand_using_granularity(&doc, TextGranularity::Word);
    assert_eq!(sel.start(), Some(Position::new(t, 0)));
    assert_eq!(sel.end(), Some(Position::new(t, 5)));

    let mut sel = VisibleSelection::<DomTreeStrategy>::from_position(
        &doc,
        Position::new(t, 8),
        Affinity::Downstream,
    );
    sel.expand_using_granularity(&doc, TextGranularity::Word);
    assert_eq!(sel.start(), Some(Position::new(t, 6)));
    assert_eq!(sel.end(), Some(Position::new(t, 11)));

    // the comma is a single-character word
    let mut sel = VisibleSelection::<DomTreeStrategy>::from_position(
        &doc,
        Position::new(t, 26),
        Affinity::Downstream,
    );
    sel.expand_using_granularity(&doc, TextGranularity::Word);
    assert_eq!(sel.start(), Some(Position::new(t, 26)));
    assert_eq!(sel.end(), Some(Position::new(t, 27)));
}

#[test]
fn test_caret_affinity_invariant() {
    let (doc, t) = doc_with_text("sample text");
    let range = VisibleSelection::<DomTreeStrategy>::new(
        &doc,
        Some(Position::new(t, 0)),
        Some(Position::new(t, 6)),
        Affinity::Upstream,
        false,
    );
    assert!(range.is_range());
    assert_eq!(range.affinity(), Affinity::Downstream);

    let caret = VisibleSelection::<DomTreeStrategy>::from_position(
        &doc,
        Position::new(t, 3),
        Affinity::Upstream,
    );
    assert!(caret.is_caret());
    assert_eq!(caret.affinity(), Affinity::Upstream);
}

#[test]
fn test_canonical_shrink_to_minimal_node_span() {
    let mut doc = Document::new();
    let body = doc.body();
    let t1 = doc.create_text("alpha");
    doc.append_child(body, t1);
    let t2 = doc.create_text("beta");
    doc.append_child(body, t2);

    // logically identical selections built from endpoints in different
    // nodes compare equal after validation
    let a = VisibleSelection::<DomTreeStrategy>::new(
        &doc,
        Some(Position::new(t1, 2)),
        Some(Position::new(t2, 0)),
        Affinity::Downstream,
        false,
    );
    let b = VisibleSelection::<DomTreeStrategy>::new(
        &doc,
        Some(Position::new(t1, 2)),
        Some(Position::new(t1, 5)),
        Affinity::Downstream,
        false,
    );
    assert_eq!(a.start(), b.start());
    assert_eq!(a.end(), b.end());
    assert_eq!(a.end(), Some(Position::new(t1, 5)));
}

#[test]
fn test_tree_view_round_trip_without_shadow_crossing() {
    let mut doc = Document::new();
    let body = doc.body();
    let host = doc.create_element("x-widget");
    doc.append_child(body, host);
    let light = doc.create_text("distributed content");
    doc.append_child(host, light);
    let shadow = doc.attach_shadow(host);
    let slot = doc.create_element("slot");
    doc.append_child(shadow, slot);

    let dom_sel = VisibleSelection::<DomTreeStrategy>::new(
        &doc,
        Some(Position::new(light, 2)),
        Some(Position::new(light, 13)),
        Affinity::Downstream,
        false,
    );
    let flat = SelectionAdjuster::adjust_in_flat_tree(&doc, &dom_sel);
    let back = SelectionAdjuster::adjust_in_dom_tree(&doc, &flat);
    assert_eq!(back.start(), dom_sel.start());
    assert_eq!(back.end(), dom_sel.end());
    assert_eq!(back.is_base_first(), dom_sel.is_base_first());
}

#[test]
fn test_selection_survives_unrelated_mutation() {
    let (mut doc, t) = doc_with_text("stable text");
    let mut sel = VisibleSelection::<DomTreeStrategy>::new(
        &doc,
        Some(Position::new(t, 0)),
        Some(Position::new(t, 6)),
        Affinity::Downstream,
        false,
    );
    let before = sel.clone();

    let body = doc.body();
    let extra = doc.create_text("appended later");
    doc.append_child(body, extra);
    sel.update_if_needed(&doc);
    assert_eq!(sel.start(), before.start());
    assert_eq!(sel.end(), before.end());
}

#[test]
fn test_end_to_end_find_scenario() {
    init_logging();
    let (doc, t) = doc_with_text("a b a b a");
    let mut controller = FindController::new(doc, RecordingClient::default());
    let main = FrameId(0);

    // first find selects [0,1)
    let rect = controller.find(main, 1, "a", case_sensitive(), false).unwrap();
    assert_eq!(rect, Some(FloatRect::new(0.0, 0.0, 8.0, 16.0)));
    let sel = controller.frames().main_frame().selection().selection();
    assert_eq!(sel.start(), Some(Position::new(t, 0)));
    assert_eq!(sel.end(), Some(Position::new(t, 1)));

    controller
        .scope_string_matches(main, 1, "a", case_sensitive(), true)
        .unwrap();
    controller.run_pending_tasks();
    assert_eq!(controller.counters().total_match_count(), 3);

    // findNext walks [4,5) and [8,9), then fails without wrap
    let next = FindOptions {
        find_next: true,
        ..case_sensitive()
    };
    controller.find(main, 1, "a", next, false).unwrap();
    let sel = controller.frames().main_frame().selection().selection();
    assert_eq!(sel.start(), Some(Position::new(t, 4)));

    controller.find(main, 1, "a", next, false).unwrap();
    let sel = controller.frames().main_frame().selection().selection();
    assert_eq!(sel.start(), Some(Position::new(t, 8)));

    assert_eq!(controller.find(main, 1, "a", next, false).unwrap(), None);

    // with wrap enabled the next call re-selects [0,1)
    let rect = controller.find(main, 1, "a", next, true).unwrap();
    assert_eq!(rect, Some(FloatRect::new(0.0, 0.0, 8.0, 16.0)));
    let sel = controller.frames().main_frame().selection().selection();
    assert_eq!(sel.start(), Some(Position::new(t, 0)));
}

#[test]
fn test_time_sliced_scoping_is_bounded_per_pass() {
    init_logging();
    let (doc, _) = doc_with_text("hit hit hit hit hit");
    let mut controller = FindController::new(doc, RecordingClient::default());
    let main = FrameId(0);
    controller
        .frames_mut()
        .main_frame_mut()
        .finder_mut()
        .set_scoping_budget(Duration::ZERO);

    controller
        .scope_string_matches(main, 2, "hit", FindOptions::default(), true)
        .unwrap();
    // with a zero budget only the in-flight match may complete per pass
    assert_eq!(controller.frames().main_frame().finder().match_count(), 1);
    assert_eq!(controller.pending_task_count(), 1);

    controller.run_pending_tasks();
    assert_eq!(
        controller.frames().main_frame().finder().last_match_count(),
        Some(5)
    );
    assert_eq!(controller.pending_task_count(), 0);
}

#[test]
fn test_resume_produces_same_cache_as_single_pass() {
    let make_controller = || {
        let (doc, _) = doc_with_text("one two one two one and one more");
        FindController::new(doc, RecordingClient::default())
    };
    let main = FrameId(0);

    let mut reference = make_controller();
    reference
        .scope_string_matches(main, 3, "one", FindOptions::default(), true)
        .unwrap();
    reference.run_pending_tasks();

    let mut sliced = make_controller();
    sliced
        .frames_mut()
        .main_frame_mut()
        .finder_mut()
        .set_scoping_budget(Duration::ZERO);
    sliced
        .scope_string_matches(main, 3, "one", FindOptions::default(), true)
        .unwrap();
    sliced.run_pending_tasks();

    // both documents are built identically, so ranges compare directly
    let expected: Vec<_> = reference
        .frames()
        .main_frame()
        .finder()
        .matches()
        .iter()
        .map(|m| (m.ordinal(), m.range()))
        .collect();
    let actual: Vec<_> = sliced
        .frames()
        .main_frame()
        .finder()
        .matches()
        .iter()
        .map(|m| (m.ordinal(), m.range()))
        .collect();
    assert_eq!(actual, expected);
    assert_eq!(
        sliced.counters().total_match_count(),
        reference.counters().total_match_count()
    );
}

#[test]
fn test_match_count_conservation_across_frames() {
    init_logging();
    let (main_doc, _) = doc_with_text("needle in a needle stack");
    let (child_doc, _) = doc_with_text("one more needle");
    let mut controller = FindController::new(main_doc, RecordingClient::default());
    let main = FrameId(0);
    let child = controller.attach_frame(child_doc);

    for id in [main, child] {
        controller
            .scope_string_matches(id, 4, "needle", FindOptions::default(), true)
            .unwrap();
    }
    controller.run_pending_tasks();

    let per_frame_sum: usize = controller
        .frames()
        .iter()
        .map(|f| f.finder().last_match_count().unwrap())
        .sum();
    assert_eq!(per_frame_sum, 3);
    assert_eq!(controller.counters().total_match_count(), per_frame_sum);
    assert_eq!(controller.counters().frame_scoping_count(), 0);
    let &(_, total, final_update) = controller.client().counts.last().unwrap();
    assert_eq!((total, final_update), (3, true));
}

#[test]
fn test_nearest_match_is_deterministic() {
    let (doc, _) = doc_with_text("p p p p");
    let mut controller = FindController::new(doc, RecordingClient::default());
    let main = FrameId(0);
    controller
        .scope_string_matches(main, 5, "p", FindOptions::default(), true)
        .unwrap();
    controller.run_pending_tasks();

    let point = FloatPoint::new(20.0, 8.0);
    let first = controller.select_nearest_find_match(point, 5);
    assert!(first > 0);
    for _ in 0..5 {
        assert_eq!(controller.select_nearest_find_match(point, 5), first);
    }
}

#[test]
fn test_find_match_rects_reflect_document_mutation() {
    let (doc, _) = doc_with_text("m m");
    let mut controller = FindController::new(doc, RecordingClient::default());
    let main = FrameId(0);
    controller
        .scope_string_matches(main, 6, "m", FindOptions::default(), true)
        .unwrap();
    controller.run_pending_tasks();
    assert_eq!(controller.find_match_rects().len(), 2);
    let version = controller.find_match_markers_version();

    // removing the text node kills both cached matches
    let text_node = {
        let doc = controller.frames().main_frame().document();
        doc.raw_children(doc.body())[0]
    };
    controller
        .frames_mut()
        .main_frame_mut()
        .document_mut()
        .remove_node(text_node);

    assert_eq!(controller.find_match_rects().len(), 0);
    assert!(controller.find_match_markers_version() > version);
}

#[test]
fn test_find_in_shadow_content_via_flat_view() {
    let mut doc = Document::new();
    let body = doc.body();
    let host = doc.create_element("x-note");
    doc.append_child(body, host);
    let shadow = doc.attach_shadow(host);
    let inner = doc.create_text("hidden treasure");
    doc.append_child(shadow, inner);

    let mut controller = FindController::new(doc, RecordingClient::default());
    let main = FrameId(0);
    let rect = controller
        .find(main, 7, "treasure", FindOptions::default(), false)
        .unwrap();
    assert!(rect.is_some());
    controller
        .scope_string_matches(main, 7, "treasure", FindOptions::default(), true)
        .unwrap();
    controller.run_pending_tasks();
    assert_eq!(controller.counters().total_match_count(), 1);
}

proptest! {
    #[test]
    fn validation_is_idempotent(
        text in "[ a-z]{1,40}",
        a in 0usize..64,
        b in 0usize..64,
    ) {
        let (doc, t) = doc_with_text(&text);
        let a = a.min(text.len());
        let b = b.min(text.len());
        let first = VisibleSelection::<DomTreeStrategy>::new(
            &doc,
            Some(Position::new(t, a)),
            Some(Position::new(t, b)),
            Affinity::Downstream,
            false,
        );
        // validating a validated selection changes nothing
        let again = VisibleSelection::<DomTreeStrategy>::new(
            &doc,
            first.base(),
            first.extent(),
            Affinity::Downstream,
            false,
        );
        prop_assert_eq!(again, first);
    }

    #[test]
    fn search_results_are_real_occurrences(
        text in "[ab ]{1,30}",
        query in "[ab]{1,3}",
    ) {
        let (doc, _) = doc_with_text(&text);
        let index = TextIndex::<FlatTreeStrategy>::build(&doc);
        let options = SearchOptions { match_case: true, ..Default::default() };
        if let Some((s, e)) = find_plain_text(&index, &query, 0, index.len(), options) {
            let found: String = index.chars()[s..e].iter().collect();
            prop_assert_eq!(found, query);
        }
    }
}
