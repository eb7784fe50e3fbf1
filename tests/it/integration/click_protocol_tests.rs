//! Click-to-click connection workflow.

use crate::helpers::{Clock, TestGraphBuilder, assert_connection_count, assert_quiescent, two_nodes};
use flowboard::constants::{BANNER_PICK_INPUT, BANNER_PICK_OUTPUT};
use flowboard::input::{CancelReason, InteractionOutcome, Key, Modality};
use flowboard::render::Highlight;
use flowboard::{Branch, CanvasError, ConnectionId, Connector, InvalidConnection};
use kurbo::Point;

#[test]
fn test_click_output_then_input_connects() {
    let clock = Clock::new();
    let mut editor = two_nodes();
    let out_a = Connector::output("a");

    let started = editor.connector_click(&out_a, &clock.pointer(100.0, 25.0, 0));
    assert_eq!(started, InteractionOutcome::Started(Modality::Click));
    assert_eq!(editor.interaction_state().origin(), Some(&out_a));
    assert_eq!(editor.scene().highlight(&out_a), Some(Highlight::Origin));
    assert_eq!(editor.scene().banner(), Some(BANNER_PICK_INPUT));

    assert_eq!(
        editor.pointer_move(&clock.pointer(200.0, 60.0, 50)),
        InteractionOutcome::Updated
    );
    let temp = editor.scene().temp().unwrap();
    assert_eq!(temp.start(), Point::new(100.0, 25.0));
    assert_eq!(temp.end(), Point::new(200.0, 60.0));

    let outcome = editor.connector_click(&Connector::input("b"), &clock.pointer(300.0, 25.0, 100));
    assert_eq!(outcome, InteractionOutcome::Committed(ConnectionId::new("a", "b")));
    assert_connection_count(&editor, 1);
    assert_quiescent(&editor);
}

#[test]
fn test_click_input_first_is_normalized() {
    let clock = Clock::new();
    let mut editor = two_nodes();

    let started = editor.connector_click(&Connector::input("b"), &clock.pointer(300.0, 25.0, 0));
    assert_eq!(started, InteractionOutcome::Started(Modality::Click));
    assert_eq!(editor.scene().banner(), Some(BANNER_PICK_OUTPUT));

    editor.pointer_move(&clock.pointer(150.0, 25.0, 30));
    // preview runs output-side first
    assert_eq!(editor.scene().temp().unwrap().end(), Point::new(300.0, 25.0));

    let outcome = editor.connector_click(&Connector::output("a"), &clock.pointer(100.0, 25.0, 60));
    assert_eq!(outcome, InteractionOutcome::Committed(ConnectionId::new("a", "b")));
    assert!(editor.store().contains(&ConnectionId::new("a", "b")));
}

#[test]
fn test_reclicking_origin_cancels() {
    let clock = Clock::new();
    let mut editor = two_nodes();
    let out_a = Connector::output("a");

    editor.connector_click(&out_a, &clock.pointer(100.0, 25.0, 0));
    let outcome = editor.connector_click(&out_a, &clock.pointer(100.0, 25.0, 500));
    assert_eq!(outcome, InteractionOutcome::Cancelled(CancelReason::OriginReactivated));
    assert_connection_count(&editor, 0);
    assert_quiescent(&editor);
}

#[test]
fn test_same_node_pair_cancels() {
    let clock = Clock::new();
    let mut editor = two_nodes();

    editor.connector_click(&Connector::output("a"), &clock.pointer(100.0, 25.0, 0));
    let outcome = editor.connector_click(&Connector::input("a"), &clock.pointer(0.0, 25.0, 100));
    assert_eq!(
        outcome,
        InteractionOutcome::Cancelled(CancelReason::Invalid(CanvasError::InvalidConnection(
            InvalidConnection::SelfLoop
        )))
    );
    assert_connection_count(&editor, 0);
    assert_quiescent(&editor);
}

#[test]
fn test_same_side_pair_cancels() {
    let clock = Clock::new();
    let mut editor = two_nodes();

    editor.connector_click(&Connector::output("a"), &clock.pointer(100.0, 25.0, 0));
    let outcome = editor.connector_click(&Connector::output("b"), &clock.pointer(400.0, 25.0, 100));
    assert_eq!(
        outcome,
        InteractionOutcome::Cancelled(CancelReason::Invalid(CanvasError::InvalidConnection(
            InvalidConnection::SameSide
        )))
    );
    assert_quiescent(&editor);
}

#[test]
fn test_background_click_cancels() {
    let clock = Clock::new();
    let mut editor = two_nodes();

    editor.connector_click(&Connector::output("a"), &clock.pointer(100.0, 25.0, 0));
    editor.pointer_move(&clock.pointer(180.0, 140.0, 20));
    let outcome = editor.background_click(&clock.pointer(180.0, 140.0, 40));
    assert_eq!(outcome, InteractionOutcome::Cancelled(CancelReason::BackgroundClick));
    assert_connection_count(&editor, 0);
    assert_quiescent(&editor);
}

#[test]
fn test_escape_cancels_click_pending() {
    let clock = Clock::new();
    let mut editor = two_nodes();

    editor.connector_click(&Connector::output("a"), &clock.pointer(100.0, 25.0, 0));
    editor.pointer_move(&clock.pointer(180.0, 140.0, 20));
    assert!(editor.scene().temp().is_some());

    assert_eq!(editor.key_down(Key::Escape), InteractionOutcome::Cancelled(CancelReason::Escape));
    assert_connection_count(&editor, 0);
    assert_quiescent(&editor);

    // nothing left to cancel
    assert_eq!(editor.key_down(Key::Escape), InteractionOutcome::Ignored);
}

#[test]
fn test_commit_validates_against_live_nodes() {
    let clock = Clock::new();
    let mut editor = two_nodes();

    editor.connector_click(&Connector::output("a"), &clock.pointer(100.0, 25.0, 0));
    editor.remove_node(&"b".into());

    let outcome = editor.connector_click(&Connector::input("b"), &clock.pointer(300.0, 25.0, 100));
    assert_eq!(
        outcome,
        InteractionOutcome::Cancelled(CancelReason::Invalid(CanvasError::NodeNotFound("b".into())))
    );
    assert_connection_count(&editor, 0);
    assert_quiescent(&editor);
}

#[test]
fn test_commit_evicts_against_live_store() {
    let clock = Clock::new();
    let mut editor = TestGraphBuilder::new()
        .plain("a", (0.0, 0.0))
        .plain("b", (300.0, 0.0))
        .plain("c", (0.0, 200.0))
        .editor();

    editor.connector_click(&Connector::output("a"), &clock.pointer(100.0, 25.0, 0));
    // the graph changes while the click is pending
    editor
        .connect(&Connector::output("c"), &Connector::input("b"))
        .unwrap();
    let outcome = editor.connector_click(&Connector::input("b"), &clock.pointer(300.0, 25.0, 100));

    assert_eq!(outcome, InteractionOutcome::Committed(ConnectionId::new("a", "b")));
    assert_connection_count(&editor, 1);
    assert!(!editor.store().contains(&ConnectionId::new("c", "b")));
}

#[test]
fn test_click_on_branch_output() {
    let clock = Clock::new();
    let mut editor = TestGraphBuilder::new()
        .branching("cond", (0.0, 0.0))
        .plain("yes", (300.0, 0.0))
        .plain("no", (300.0, 200.0))
        .editor();

    editor.connector_click(&Connector::branch("cond", Branch::True), &clock.pointer(100.0, 16.0, 0));
    editor.connector_click(&Connector::input("yes"), &clock.pointer(300.0, 25.0, 50));
    editor.connector_click(&Connector::branch("cond", Branch::False), &clock.pointer(100.0, 33.0, 100));
    editor.connector_click(&Connector::input("no"), &clock.pointer(300.0, 225.0, 150));

    assert_connection_count(&editor, 2);
    assert!(editor.store().is_connected(&Connector::branch("cond", Branch::True)));
    assert!(editor.store().is_connected(&Connector::branch("cond", Branch::False)));
}

#[test]
fn test_click_on_missing_connector_is_ignored() {
    let clock = Clock::new();
    let mut editor = two_nodes();

    // plain nodes have no branch outputs
    let outcome = editor.connector_click(&Connector::branch("a", Branch::True), &clock.pointer(100.0, 16.0, 0));
    assert_eq!(outcome, InteractionOutcome::Ignored);
    assert_quiescent(&editor);
}
