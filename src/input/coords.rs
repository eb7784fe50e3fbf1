//! Canvas transform and coordinate conversion.
//!
//! Screen points are relative to the canvas surface's top-left corner.
//! Logical points are canvas-content coordinates, independent of pan and zoom:
//!
//! ```text
//! screen  = logical * scale + offset
//! logical = (screen - offset) / scale
//! ```

use crate::constants::{DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM};
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Pan/zoom state of the canvas surface.
///
/// The transform is `Copy`; every routing or geometry operation takes one
/// snapshot and uses it for both endpoints of a curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasTransform {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

impl Default for CanvasTransform {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: DEFAULT_ZOOM,
        }
    }
}

impl CanvasTransform {
    pub fn new(offset_x: f64, offset_y: f64, scale: f64) -> Self {
        Self {
            offset_x,
            offset_y,
            scale,
        }
    }

    #[inline]
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.offset_x, self.offset_y)
    }

    /// Convert a screen position to a logical canvas position
    #[inline]
    pub fn to_logical(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset_x) / self.scale,
            (screen.y - self.offset_y) / self.scale,
        )
    }

    /// Convert a logical canvas position to a screen position
    #[inline]
    pub fn to_screen(&self, logical: Point) -> Point {
        Point::new(
            logical.x * self.scale + self.offset_x,
            logical.y * self.scale + self.offset_y,
        )
    }

    /// Convert a screen-space delta to logical units (for drag operations)
    #[inline]
    pub fn delta_to_logical(&self, delta: Vec2) -> Vec2 {
        delta / self.scale
    }

    /// Convert a logical delta to screen pixels
    #[inline]
    pub fn delta_to_screen(&self, delta: Vec2) -> Vec2 {
        delta * self.scale
    }

    /// The logical -> screen mapping as an affine matrix.
    pub fn affine(&self) -> Affine {
        Affine::new([self.scale, 0.0, 0.0, self.scale, self.offset_x, self.offset_y])
    }

    /// Translate the canvas. Scale is untouched.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Zoom by `factor` keeping `screen` fixed, within the default bounds.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) -> bool {
        self.zoom_at_within(screen, factor, MIN_ZOOM, MAX_ZOOM)
    }

    /// Zoom by `factor` keeping `screen` fixed, clamping scale to `[min, max]`.
    ///
    /// Returns `false` when the scale did not change (already at a bound, or
    /// a degenerate factor).
    pub fn zoom_at_within(&mut self, screen: Point, factor: f64, min: f64, max: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let old = self.scale;
        let new = (old * factor).clamp(min, max);
        if new == old {
            return false;
        }
        let ratio = new / old;
        self.offset_x = screen.x - (screen.x - self.offset_x) * ratio;
        self.offset_y = screen.y - (screen.y - self.offset_y) * ratio;
        self.scale = new;
        true
    }
}
