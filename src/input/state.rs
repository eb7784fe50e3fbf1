//! Connection interaction state - the one pending connection in the system.
//!
//! ## State Transitions
//!
//! ```text
//! Idle     -> Pending     (click on a connector, or pointer down on an output)
//! Idle     -> Pressing    (pointer down on a connector, long-press armed)
//! Pressing -> Pending     (long-press timer fires)
//! Pressing -> Idle        (released or moved before the timer fires)
//! Pending  -> Idle        (commit or cancel)
//! ```

use crate::types::Connector;
use kurbo::Point;
use std::time::Instant;

/// How the pending connection was started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Modality {
    Click,
    Drag,
    LongPress,
}

impl Modality {
    /// Drag-style modalities resolve on release and use magnetic snapping.
    pub fn snaps(self) -> bool {
        matches!(self, Modality::Drag | Modality::LongPress)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum InteractionState {
    /// No connector captured
    #[default]
    Idle,

    /// Pointer held on a connector, waiting for the long-press timer
    Pressing {
        connector: Connector,
        pressed_at: Instant,
        press_pos: Point,
    },

    /// A connection is being drawn
    Pending {
        origin: Connector,
        modality: Modality,
        /// Last pointer position (screen)
        cursor: Point,
        /// Where the pointer went down (screen), for drag-slop checks
        press_pos: Point,
        /// Nearest magnetic candidate
        candidate: Option<Connector>,
    },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_pressing(&self) -> bool {
        matches!(self, Self::Pressing { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Origin connector of the pending connection
    pub fn origin(&self) -> Option<&Connector> {
        match self {
            Self::Pending { origin, .. } => Some(origin),
            _ => None,
        }
    }

    pub fn modality(&self) -> Option<Modality> {
        match self {
            Self::Pending { modality, .. } => Some(*modality),
            _ => None,
        }
    }

    pub fn cursor(&self) -> Option<Point> {
        match self {
            Self::Pending { cursor, .. } => Some(*cursor),
            _ => None,
        }
    }

    pub fn candidate(&self) -> Option<&Connector> {
        match self {
            Self::Pending { candidate, .. } => candidate.as_ref(),
            _ => None,
        }
    }

    /// Connector held down while the long-press timer runs
    pub fn pressed(&self) -> Option<&Connector> {
        match self {
            Self::Pressing { connector, .. } => Some(connector),
            _ => None,
        }
    }

    /// Reset to Idle state
    pub fn reset(&mut self) {
        *self = Self::Idle;
    }

    pub fn start_pressing(&mut self, connector: Connector, pressed_at: Instant, press_pos: Point) {
        *self = Self::Pressing {
            connector,
            pressed_at,
            press_pos,
        };
    }

    pub fn start_pending(&mut self, origin: Connector, modality: Modality, cursor: Point, press_pos: Point) {
        *self = Self::Pending {
            origin,
            modality,
            cursor,
            press_pos,
            candidate: None,
        };
    }

    pub fn set_cursor(&mut self, position: Point) {
        if let Self::Pending { cursor, .. } = self {
            *cursor = position;
        }
    }

    pub fn set_candidate(&mut self, next: Option<Connector>) {
        if let Self::Pending { candidate, .. } = self {
            *candidate = next;
        }
    }
}
