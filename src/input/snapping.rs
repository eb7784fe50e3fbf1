//! Magnetic snapping for drag-style connection gestures.
//!
//! Candidates are every connector compatible with the origin (opposite side,
//! another node), indexed once when drawing starts. Distances are compared
//! in screen space against a fixed pixel radius.

use crate::connector_index::ConnectorIndex;
use crate::geometry::{GeometryResolver, NodeProvider};
use crate::input::coords::CanvasTransform;
use crate::types::{Connector, NodeId};
use kurbo::Point;

#[derive(Debug, Clone)]
pub struct MagneticSnap {
    origin: Connector,
    index: ConnectorIndex,
    radius_px: f64,
}

impl MagneticSnap {
    pub fn for_origin(
        origin: &Connector,
        nodes: &dyn NodeProvider,
        resolver: &GeometryResolver,
        radius_px: f64,
    ) -> Self {
        Self {
            origin: origin.clone(),
            index: ConnectorIndex::from_nodes(nodes, resolver, |c| origin.is_compatible_with(c)),
            radius_px,
        }
    }

    /// Re-index after nodes moved or appeared.
    pub fn rebuild(&mut self, nodes: &dyn NodeProvider, resolver: &GeometryResolver) {
        let origin = &self.origin;
        self.index = ConnectorIndex::from_nodes(nodes, resolver, |c| origin.is_compatible_with(c));
    }

    pub fn forget_node(&mut self, node: &NodeId) {
        self.index.remove_node(node);
    }

    pub fn candidate_count(&self) -> usize {
        self.index.len()
    }

    /// Nearest compatible connector within the radius of `pointer` (screen).
    pub fn nearest(&self, pointer: Point, transform: CanvasTransform) -> Option<Connector> {
        crate::profile_scope!("magnetic_snap");
        if !(transform.scale.is_finite() && transform.scale > 0.0) {
            return None;
        }
        let logical = transform.to_logical(pointer);
        let (connector, _) = self
            .index
            .nearest_within(logical, self.radius_px / transform.scale, |_| true)?;
        let anchor = self.index.anchor(connector)?;
        let screen_distance = (transform.to_screen(anchor) - pointer).hypot();
        (screen_distance <= self.radius_px).then(|| connector.clone())
    }
}
