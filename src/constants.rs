//! Engine-wide constants.
//!
//! Centralizes magic numbers so that settings defaults, geometry fallbacks
//! and gesture thresholds stay in one place.

// ============================================================================
// Zoom & Pan
// ============================================================================

/// Minimum zoom level
pub const MIN_ZOOM: f64 = 0.1;

/// Maximum zoom level
pub const MAX_ZOOM: f64 = 5.0;

/// Default zoom level
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Pixel wheel delta divisor for ctrl+wheel zoom (factor = 1 - dy / divisor)
pub const WHEEL_ZOOM_PIXEL_DIVISOR: f64 = 500.0;

/// Line wheel delta divisor for ctrl+wheel zoom
pub const WHEEL_ZOOM_LINE_DIVISOR: f64 = 50.0;

/// Pixels panned per wheel "line"
pub const WHEEL_LINE_PIXELS: f64 = 20.0;

/// Zoom factors closer to 1.0 than this are ignored
pub const MIN_ZOOM_FACTOR_DELTA: f64 = 0.001;

/// Lower bound for one wheel step's zoom factor, so fast flicks still zoom out
pub const MIN_WHEEL_ZOOM_FACTOR: f64 = 0.5;

/// After a zoom, pan writes older than this window are dropped (ms)
pub const ZOOM_GUARD_MS: u64 = 80;

// ============================================================================
// Connection Gestures
// ============================================================================

/// Magnetic snapping radius, in screen pixels
pub const SNAP_RADIUS_PX: f64 = 35.0;

/// Hold duration before a press on a connector starts drawing (ms)
pub const LONG_PRESS_MS: u64 = 450;

/// Pointer travel (screen pixels) below which a press-release is a click
pub const DRAG_SLOP_PX: f64 = 4.0;

/// Window after a drag/long-press release during which the trailing click is swallowed (ms)
pub const CLICK_SUPPRESS_MS: u64 = 300;

/// Radius used when hit-testing connectors under the pointer, in screen pixels
pub const CONNECTOR_HIT_RADIUS_PX: f64 = 10.0;

/// Consecutive frames a Pending interaction may fail geometry resolution before it is cancelled
pub const MAX_GEOMETRY_RETRIES: u32 = 3;

// ============================================================================
// Routing
// ============================================================================

/// Horizontal control point offset as a fraction of |dx|
pub const BEZIER_CURVATURE: f64 = 0.5;

/// Upper bound of the horizontal control point offset
pub const BEZIER_MAX_OFFSET: f64 = 100.0;

// ============================================================================
// Layout Fallbacks
// ============================================================================

/// Node size assumed when the host reports a zero or non-finite size
pub const DEFAULT_NODE_SIZE: (f64, f64) = (180.0, 60.0);

/// Connector dot size assumed when the host reports none
pub const DEFAULT_CONNECTOR_SIZE: (f64, f64) = (12.0, 12.0);

/// Gap between the node's bottom edge and the bottom connector dot
pub const BOTTOM_CONNECTOR_CLEARANCE: f64 = 6.0;

// ============================================================================
// Instructional Banners
// ============================================================================

/// Banner shown while a click-started connection waits for an input
pub const BANNER_PICK_INPUT: &str = "Click an input connector to connect, Esc to cancel";

/// Banner shown while a click-started connection waits for an output
pub const BANNER_PICK_OUTPUT: &str = "Click an output connector to connect, Esc to cancel";

/// Banner shown while a drag or long-press connection is being drawn
pub const BANNER_RELEASE: &str = "Release over a connector to connect";
