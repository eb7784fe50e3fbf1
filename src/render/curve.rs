//! Connection routing - anchor pairs to cubic Bezier curves.
//!
//! Control points sit horizontally off each endpoint by
//! `min(|dx| * curvature, max_offset)`, giving an S-curve for the usual
//! left-to-right layout whatever the vertical relation of the endpoints.

use crate::constants::{BEZIER_CURVATURE, BEZIER_MAX_OFFSET};
use crate::types::Branch;
use kurbo::{BezPath, CubicBez, ParamCurve, PathEl, Point};
use serde::{Deserialize, Serialize};

/// Cubic Bezier between two points using the default heuristic.
pub fn path_between(p1: Point, p2: Point) -> CubicBez {
    CurveRouter::default().route(p1, p2)
}

/// Routing parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveRouter {
    pub curvature: f64,
    pub max_offset: f64,
}

impl Default for CurveRouter {
    fn default() -> Self {
        Self {
            curvature: BEZIER_CURVATURE,
            max_offset: BEZIER_MAX_OFFSET,
        }
    }
}

impl CurveRouter {
    pub fn new(curvature: f64, max_offset: f64) -> Self {
        Self {
            curvature,
            max_offset,
        }
    }

    /// Horizontal control point offset for endpoints `dx` apart.
    #[inline]
    pub fn control_offset(&self, dx: f64) -> f64 {
        (dx.abs() * self.curvature).min(self.max_offset)
    }

    pub fn route(&self, p1: Point, p2: Point) -> CubicBez {
        let offset = self.control_offset(p2.x - p1.x);
        CubicBez::new(
            p1,
            Point::new(p1.x + offset, p1.y),
            Point::new(p2.x - offset, p2.y),
            p2,
        )
    }
}

/// Style selector forwarded to the host painter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CurveStyle {
    Plain,
    BranchTrue,
    BranchFalse,
    Bottom,
    /// The in-progress, dashed preview
    Preview,
}

impl CurveStyle {
    pub fn for_branch(branch: Option<Branch>) -> Self {
        match branch {
            None => CurveStyle::Plain,
            Some(Branch::True) => CurveStyle::BranchTrue,
            Some(Branch::False) => CurveStyle::BranchFalse,
            Some(Branch::Bottom) => CurveStyle::Bottom,
        }
    }
}

/// A routed curve ready for painting, in screen space.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedCurve {
    pub curve: CubicBez,
    pub style: CurveStyle,
    pub dashed: bool,
    /// Whether the host should make it clickable
    pub interactive: bool,
}

impl RenderedCurve {
    pub fn persistent(curve: CubicBez, style: CurveStyle) -> Self {
        Self {
            curve,
            style,
            dashed: false,
            interactive: true,
        }
    }

    pub fn preview(curve: CubicBez) -> Self {
        Self {
            curve,
            style: CurveStyle::Preview,
            dashed: true,
            interactive: false,
        }
    }

    pub fn start(&self) -> Point {
        self.curve.p0
    }

    pub fn end(&self) -> Point {
        self.curve.p3
    }

    /// Point at parameter `t` in `[0, 1]`.
    pub fn point_at(&self, t: f64) -> Point {
        self.curve.eval(t)
    }

    pub fn to_bez_path(&self) -> BezPath {
        BezPath::from_vec(vec![
            PathEl::MoveTo(self.curve.p0),
            PathEl::CurveTo(self.curve.p1, self.curve.p2, self.curve.p3),
        ])
    }

    /// SVG `d` attribute for hosts that paint with SVG.
    pub fn svg_path(&self) -> String {
        self.to_bez_path().to_svg()
    }
}
