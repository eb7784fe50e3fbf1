//! Routing and the retained scene the host paints from.
//!
//! - `curve` - Bezier routing and the curve descriptor
//! - `scene` - persistent curves, preview curve, highlights, banner

mod curve;
mod scene;

pub use curve::{CurveRouter, CurveStyle, RenderedCurve, path_between};
pub use scene::{Highlight, SceneRenderer};
