//! Pointer, wheel and keyboard input for the canvas.
//!
//! ## Architecture
//!
//! Two independent state machines consume input. [`CanvasController`] owns
//! pan and zoom and is the only writer of the transform.
//! [`ConnectionInteraction`] owns connection drawing; its three gesture
//! protocols (click, drag, long press) all feed one `InteractionState`.
//! The editor routes each event to one or the other; while a pan is active,
//! connection gestures are suppressed.
//!
//! ## Modules
//!
//! - `coords` - Canvas transform and coordinate conversion
//! - `events` - Host-neutral input events
//! - `state` - Connection interaction state enum and helpers
//! - `snapping` - Magnetic candidate search
//! - `connect` - Connection drawing state machine
//! - `transform` - Pan/zoom controller

pub mod coords;
pub mod events;
mod connect;
mod snapping;
mod state;
mod transform;

pub use connect::{CancelReason, ConnectContext, ConnectionInteraction, InteractionOutcome};
pub(crate) use connect::validate_pair;
pub use coords::CanvasTransform;
pub use events::{Key, Modifiers, PointerButton, PointerEvent, WheelDelta, WheelEvent};
pub use snapping::MagneticSnap;
pub use state::{InteractionState, Modality};
pub use transform::{CanvasController, PanGesture};
