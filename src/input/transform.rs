//! Canvas transformations - pan, zoom, reroute requests.
//!
//! The controller is the only writer of the [`CanvasTransform`]. Every
//! committed change raises a reroute request which the editor drains once
//! per frame, so a burst of wheel events costs one reroute.

use super::coords::CanvasTransform;
use super::events::{PointerButton, PointerEvent, WheelDelta, WheelEvent};
use crate::constants::{MIN_WHEEL_ZOOM_FACTOR, MIN_ZOOM_FACTOR_DELTA};
use crate::settings::ZoomSettings;
use kurbo::{Point, Vec2};
use std::time::Instant;
use tracing::{trace, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PanGesture {
    #[default]
    Idle,
    Panning {
        last_pos: Point,
    },
}

#[derive(Debug, Clone, Default)]
pub struct CanvasController {
    transform: CanvasTransform,
    gesture: PanGesture,
    zoom: ZoomSettings,
    /// Pan moves stamped before this are stale and dropped
    zoom_guard_until: Option<Instant>,
    node_drag: bool,
    /// Transform changed while a node drag suppressed rerouting
    stale_during_drag: bool,
    reroute_requested: bool,
}

impl CanvasController {
    pub fn new(zoom: ZoomSettings) -> Self {
        Self {
            zoom,
            ..Self::default()
        }
    }

    pub fn transform(&self) -> CanvasTransform {
        self.transform
    }

    /// Replace the transform wholesale (restoring a saved view).
    ///
    /// A transform with a non-finite offset or a non-positive scale is
    /// rejected and the current one kept.
    pub fn set_transform(&mut self, transform: CanvasTransform) {
        let usable = transform.offset_x.is_finite()
            && transform.offset_y.is_finite()
            && transform.scale.is_finite()
            && transform.scale > 0.0;
        if !usable {
            warn!(?transform, "ignoring unusable canvas transform");
            return;
        }
        let scale = transform.scale.clamp(self.zoom.min, self.zoom.max);
        self.transform = CanvasTransform { scale, ..transform };
        self.changed();
    }

    /// Bounds that are non-finite, non-positive or inverted are rejected.
    pub fn apply_settings(&mut self, zoom: ZoomSettings) {
        let bounded = zoom.min.is_finite() && zoom.max.is_finite() && zoom.min > 0.0 && zoom.min <= zoom.max;
        if !bounded {
            warn!(min = zoom.min, max = zoom.max, "ignoring invalid zoom bounds");
            return;
        }
        self.zoom = zoom;
        let clamped = self.transform.scale.clamp(self.zoom.min, self.zoom.max);
        if clamped != self.transform.scale {
            self.transform.scale = clamped;
            self.changed();
        }
    }

    pub fn zoom_settings(&self) -> &ZoomSettings {
        &self.zoom
    }

    pub fn gesture(&self) -> PanGesture {
        self.gesture
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, PanGesture::Panning { .. })
    }

    pub fn is_zoom_guarded(&self, now: Instant) -> bool {
        self.zoom_guard_until.is_some_and(|until| now < until)
    }

    // ------------------------------------------------------------------------
    // Pointer
    // ------------------------------------------------------------------------

    /// Middle button starts a pan. Returns `true` when the event was consumed.
    pub fn pointer_down(&mut self, event: &PointerEvent) -> bool {
        if event.button != PointerButton::Middle {
            return false;
        }
        self.gesture = PanGesture::Panning {
            last_pos: event.position,
        };
        trace!(x = event.position.x, y = event.position.y, "pan started");
        true
    }

    /// Returns `true` when the transform changed.
    pub fn pointer_move(&mut self, event: &PointerEvent) -> bool {
        let PanGesture::Panning { last_pos } = self.gesture else {
            return false;
        };
        self.gesture = PanGesture::Panning {
            last_pos: event.position,
        };
        // A move in flight across a zoom would undo the zoom's anchoring.
        if self.is_zoom_guarded(event.time) {
            trace!("pan move dropped by zoom guard");
            return false;
        }
        let delta = event.position - last_pos;
        if delta == Vec2::ZERO {
            return false;
        }
        self.pan_by(delta.x, delta.y);
        true
    }

    /// Ends a pan. Returns `true` when the event was consumed.
    pub fn pointer_up(&mut self, event: &PointerEvent) -> bool {
        if !self.is_panning() || event.button != PointerButton::Middle {
            return false;
        }
        self.gesture = PanGesture::Idle;
        true
    }

    pub fn cancel_pan(&mut self) {
        self.gesture = PanGesture::Idle;
    }

    // ------------------------------------------------------------------------
    // Wheel
    // ------------------------------------------------------------------------

    /// Zoom with Control/Command, pan otherwise. Returns `true` when the
    /// transform changed.
    pub fn wheel(&mut self, event: &WheelEvent) -> bool {
        if event.modifiers.zooms() {
            let factor = match event.delta {
                WheelDelta::Pixels(delta) => 1.0 - delta.y / self.zoom.wheel_pixel_divisor,
                WheelDelta::Lines(delta) => 1.0 - delta.y / self.zoom.wheel_line_divisor,
            }
            .max(MIN_WHEEL_ZOOM_FACTOR);
            if (factor - 1.0).abs() <= MIN_ZOOM_FACTOR_DELTA {
                return false;
            }
            let changed = self.zoom_at(event.position, factor);
            if changed {
                self.zoom_guard_until = Some(event.time + self.zoom.guard());
            }
            return changed;
        }

        let delta = match event.delta {
            WheelDelta::Pixels(delta) => delta,
            WheelDelta::Lines(delta) => delta * self.zoom.wheel_line_pixels,
        };
        if delta == Vec2::ZERO {
            return false;
        }
        self.pan_by(delta.x, delta.y);
        true
    }

    // ------------------------------------------------------------------------
    // Direct manipulation
    // ------------------------------------------------------------------------

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.transform.pan(dx, dy);
        self.changed();
    }

    /// Zoom keeping `screen` fixed. Returns `false` at a bound.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) -> bool {
        let changed = self
            .transform
            .zoom_at_within(screen, factor, self.zoom.min, self.zoom.max);
        if changed {
            trace!(scale = self.transform.scale, "zoomed");
            self.changed();
        }
        changed
    }

    // ------------------------------------------------------------------------
    // Node drags and reroute requests
    // ------------------------------------------------------------------------

    pub fn begin_node_drag(&mut self) {
        self.node_drag = true;
    }

    /// Ends a node drag; a full reroute follows if the view moved meanwhile.
    pub fn end_node_drag(&mut self) {
        self.node_drag = false;
        if std::mem::take(&mut self.stale_during_drag) {
            self.reroute_requested = true;
        }
    }

    pub fn is_node_dragging(&self) -> bool {
        self.node_drag
    }

    /// Ask for a full reroute on the next frame (resize, settings change).
    pub fn request_reroute(&mut self) {
        if self.node_drag {
            self.stale_during_drag = true;
        } else {
            self.reroute_requested = true;
        }
    }

    pub fn reroute_pending(&self) -> bool {
        self.reroute_requested
    }

    /// Drain the coalesced request.
    pub fn take_reroute_request(&mut self) -> bool {
        std::mem::take(&mut self.reroute_requested)
    }

    fn changed(&mut self) {
        self.request_reroute();
    }
}
