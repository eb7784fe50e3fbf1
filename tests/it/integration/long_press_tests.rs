//! Long-press workflow.

use crate::helpers::{Clock, assert_connection_count, assert_quiescent, two_nodes};
use flowboard::constants::{BANNER_RELEASE, LONG_PRESS_MS};
use flowboard::input::{CancelReason, InteractionOutcome, Key, Modality};
use flowboard::render::Highlight;
use flowboard::{ConnectionId, Connector, EditorSettings};

#[test]
fn test_long_press_then_release_on_candidate() {
    let clock = Clock::new();
    let mut editor = two_nodes();
    let in_b = Connector::input("b");
    let out_a = Connector::output("a");

    let outcome = editor.pointer_down(&clock.pointer(300.0, 25.0, 0), Some(&in_b));
    assert_eq!(outcome, InteractionOutcome::Pressing);
    assert_eq!(editor.scene().highlight(&in_b), Some(Highlight::Pressed));

    // timer not expired yet
    assert_eq!(editor.frame(clock.at(100)).interaction, InteractionOutcome::Ignored);
    assert!(editor.interaction_state().is_pressing());

    let report = editor.frame(clock.at(LONG_PRESS_MS + 50));
    assert_eq!(report.interaction, InteractionOutcome::Started(Modality::LongPress));
    assert_eq!(editor.interaction_state().origin(), Some(&in_b));
    assert_eq!(editor.scene().highlight(&in_b), Some(Highlight::Origin));
    assert_eq!(editor.scene().banner(), Some(BANNER_RELEASE));

    // the pointer is free to roam; the connector need not stay under it
    editor.pointer_move(&clock.pointer(105.0, 28.0, LONG_PRESS_MS + 70));
    assert_eq!(editor.interaction_state().candidate(), Some(&out_a));

    let outcome = editor.pointer_up(&clock.pointer(105.0, 28.0, LONG_PRESS_MS + 90));
    assert_eq!(outcome, InteractionOutcome::Committed(ConnectionId::new("a", "b")));
    assert_connection_count(&editor, 1);
    assert_quiescent(&editor);
}

#[test]
fn test_short_press_defers_to_click() {
    let clock = Clock::new();
    let mut editor = two_nodes();
    let in_b = Connector::input("b");

    editor.pointer_down(&clock.pointer(300.0, 25.0, 0), Some(&in_b));
    let outcome = editor.pointer_up(&clock.pointer(300.0, 25.0, 100));
    assert_eq!(outcome, InteractionOutcome::Ignored);
    assert_quiescent(&editor);

    let outcome = editor.connector_click(&in_b, &clock.pointer(300.0, 25.0, 101));
    assert_eq!(outcome, InteractionOutcome::Started(Modality::Click));
}

#[test]
fn test_timer_fires_on_pointer_move() {
    let clock = Clock::new();
    let mut editor = two_nodes();

    editor.pointer_down(&clock.pointer(300.0, 25.0, 0), Some(&Connector::input("b")));
    let outcome = editor.pointer_move(&clock.pointer(301.0, 25.0, LONG_PRESS_MS + 10));
    assert_eq!(outcome, InteractionOutcome::Updated);
    assert_eq!(editor.interaction_state().modality(), Some(Modality::LongPress));
    assert!(editor.scene().temp().is_some());
}

#[test]
fn test_moving_away_before_timer_aborts() {
    let clock = Clock::new();
    let mut editor = two_nodes();

    editor.pointer_down(&clock.pointer(300.0, 25.0, 0), Some(&Connector::input("b")));
    let outcome = editor.pointer_move(&clock.pointer(320.0, 25.0, 50));
    assert_eq!(outcome, InteractionOutcome::Cancelled(CancelReason::PressAborted));
    assert_quiescent(&editor);

    // the expired timer has nothing left to fire
    assert_eq!(editor.frame(clock.at(LONG_PRESS_MS * 2)).interaction, InteractionOutcome::Ignored);
    assert!(editor.interaction_state().is_idle());
}

#[test]
fn test_escape_cancels_pressing_and_long_press() {
    let clock = Clock::new();
    let mut editor = two_nodes();
    let in_b = Connector::input("b");

    editor.pointer_down(&clock.pointer(300.0, 25.0, 0), Some(&in_b));
    assert_eq!(editor.key_down(Key::Escape), InteractionOutcome::Cancelled(CancelReason::Escape));
    assert_quiescent(&editor);

    editor.pointer_down(&clock.pointer(300.0, 25.0, 1000), Some(&in_b));
    editor.frame(clock.at(1000 + LONG_PRESS_MS));
    assert!(editor.interaction_state().is_pending());
    assert_eq!(editor.key_down(Key::Escape), InteractionOutcome::Cancelled(CancelReason::Escape));
    assert_connection_count(&editor, 0);
    assert_quiescent(&editor);
}

#[test]
fn test_late_release_without_candidate_cancels() {
    let clock = Clock::new();
    let mut editor = two_nodes();

    editor.pointer_down(&clock.pointer(300.0, 25.0, 0), Some(&Connector::input("b")));
    // no frame in between: the release itself fires the expired timer
    let outcome = editor.pointer_up(&clock.pointer(300.0, 25.0, LONG_PRESS_MS + 100));
    assert_eq!(outcome, InteractionOutcome::Cancelled(CancelReason::NoCandidate));
    assert_connection_count(&editor, 0);
    assert_quiescent(&editor);
}

#[test]
fn test_long_press_disabled() {
    let clock = Clock::new();
    let mut settings = EditorSettings::default();
    settings.connections.long_press_enabled = false;
    let mut editor = two_nodes();
    editor.apply_settings(settings).unwrap();

    let outcome = editor.pointer_down(&clock.pointer(300.0, 25.0, 0), Some(&Connector::input("b")));
    assert_eq!(outcome, InteractionOutcome::Ignored);
    assert!(editor.interaction_state().is_idle());
}
