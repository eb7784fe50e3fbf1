//! Host-neutral input events.
//!
//! Positions are screen points relative to the canvas surface. Every event
//! carries the time it happened so timers (long press, zoom guard, click
//! suppression) are driven by the host clock, not by wall time.

use kurbo::{Point, Vec2};
use std::time::Instant;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub control: bool,
    /// Command on macOS, Windows key elsewhere
    pub platform: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn ctrl() -> Self {
        Self {
            control: true,
            ..Self::default()
        }
    }

    /// Zoom modifier (Control or Command).
    pub fn zooms(&self) -> bool {
        self.control || self.platform
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    pub button: PointerButton,
    pub modifiers: Modifiers,
    pub time: Instant,
}

impl PointerEvent {
    pub fn new(position: Point, time: Instant) -> Self {
        Self {
            position,
            button: PointerButton::Primary,
            modifiers: Modifiers::none(),
            time,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Wheel deltas as reported by the platform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WheelDelta {
    Pixels(Vec2),
    Lines(Vec2),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelEvent {
    pub position: Point,
    pub delta: WheelDelta,
    pub modifiers: Modifiers,
    pub time: Instant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}
