//! Retained connection scene.
//!
//! Holds what the host should paint: one persistent curve per connection,
//! at most one dashed preview curve, connector highlights and the current
//! instructional banner. All of it is a projection of store and interaction
//! state; nothing here is read back as a source of truth.

use super::curve::{CurveRouter, CurveStyle, RenderedCurve};
use crate::types::{Connector, ConnectionId, NodeId};
use kurbo::Point;
use std::collections::BTreeMap;
use tracing::trace;

/// Transient per-connector styling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Highlight {
    /// Where the pending connection started
    Origin,
    /// Nearest magnetic candidate
    Candidate,
    /// Held down, long-press timer running
    Pressed,
}

#[derive(Debug, Clone, Default)]
pub struct SceneRenderer {
    router: CurveRouter,
    curves: BTreeMap<ConnectionId, RenderedCurve>,
    temp: Option<RenderedCurve>,
    highlights: BTreeMap<Connector, Highlight>,
    banner: Option<String>,
    /// Bumped on every change so hosts can skip repaints
    revision: u64,
}

impl SceneRenderer {
    pub fn new(router: CurveRouter) -> Self {
        Self {
            router,
            ..Self::default()
        }
    }

    pub fn router(&self) -> CurveRouter {
        self.router
    }

    pub fn set_router(&mut self, router: CurveRouter) {
        self.router = router;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    // ------------------------------------------------------------------------
    // Persistent curves
    // ------------------------------------------------------------------------

    /// Upsert the curve for `id`; any previous curve under that key is dropped first.
    pub fn render(&mut self, id: &ConnectionId, p1: Point, p2: Point, style: CurveStyle) {
        if self.curves.remove(id).is_some() {
            trace!(connection = %id, "replacing rendered curve");
        }
        let curve = RenderedCurve::persistent(self.router.route(p1, p2), style);
        self.curves.insert(id.clone(), curve);
        self.touch();
    }

    pub fn remove(&mut self, id: &ConnectionId) -> bool {
        let removed = self.curves.remove(id).is_some();
        if removed {
            self.touch();
        }
        removed
    }

    /// Drop curves whose id fails `keep`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&ConnectionId) -> bool,
    {
        let before = self.curves.len();
        self.curves.retain(|id, _| keep(id));
        if self.curves.len() != before {
            self.touch();
        }
    }

    pub fn curve(&self, id: &ConnectionId) -> Option<&RenderedCurve> {
        self.curves.get(id)
    }

    pub fn curves(&self) -> impl Iterator<Item = (&ConnectionId, &RenderedCurve)> {
        self.curves.iter()
    }

    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    /// Remove every persistent curve.
    pub fn clear(&mut self) {
        self.curves.clear();
        self.touch();
    }

    // ------------------------------------------------------------------------
    // Preview curve
    // ------------------------------------------------------------------------

    /// Replace the single preview curve.
    pub fn render_temp(&mut self, p1: Point, p2: Point) {
        self.temp = Some(RenderedCurve::preview(self.router.route(p1, p2)));
        self.touch();
    }

    pub fn temp(&self) -> Option<&RenderedCurve> {
        self.temp.as_ref()
    }

    pub fn clear_temp(&mut self) {
        if self.temp.take().is_some() {
            self.touch();
        }
    }

    // ------------------------------------------------------------------------
    // Highlights & banner
    // ------------------------------------------------------------------------

    pub fn set_highlight(&mut self, connector: Connector, highlight: Highlight) {
        if self.highlights.insert(connector, highlight) != Some(highlight) {
            self.touch();
        }
    }

    pub fn clear_highlight(&mut self, connector: &Connector) {
        if self.highlights.remove(connector).is_some() {
            self.touch();
        }
    }

    /// Remove every highlight of one kind.
    pub fn clear_highlights_of(&mut self, highlight: Highlight) {
        let before = self.highlights.len();
        self.highlights.retain(|_, h| *h != highlight);
        if self.highlights.len() != before {
            self.touch();
        }
    }

    pub fn clear_highlights(&mut self) {
        if !self.highlights.is_empty() {
            self.highlights.clear();
            self.touch();
        }
    }

    /// Drop highlights on a node that is going away.
    pub fn forget_node(&mut self, node: &NodeId) {
        let before = self.highlights.len();
        self.highlights.retain(|c, _| &c.node != node);
        if self.highlights.len() != before {
            self.touch();
        }
    }

    pub fn highlight(&self, connector: &Connector) -> Option<Highlight> {
        self.highlights.get(connector).copied()
    }

    pub fn highlights(&self) -> impl Iterator<Item = (&Connector, Highlight)> {
        self.highlights.iter().map(|(c, h)| (c, *h))
    }

    pub fn show_banner(&mut self, text: impl Into<String>) {
        self.banner = Some(text.into());
        self.touch();
    }

    pub fn clear_banner(&mut self) {
        if self.banner.take().is_some() {
            self.touch();
        }
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Nothing transient left on screen.
    pub fn is_quiescent(&self) -> bool {
        self.temp.is_none() && self.highlights.is_empty() && self.banner.is_none()
    }
}
