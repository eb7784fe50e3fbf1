//! Connector anchor geometry.
//!
//! The resolver maps a [`Connector`] to its anchor point in logical canvas
//! space from the host-reported node layout. It never fails on unlaid-out
//! nodes: a zero or non-finite size falls back to the last size seen for
//! that node, then to the configured default.

use crate::constants::{BOTTOM_CONNECTOR_CLEARANCE, DEFAULT_CONNECTOR_SIZE, DEFAULT_NODE_SIZE};
use crate::error::{CanvasError, CanvasResult};
use crate::types::{Branch, Connector, NodeId, NodeKind, Side};
use kurbo::{Point, Rect, Size};
use std::collections::HashMap;

/// What the engine needs to know about a node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeLayout {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Top-left corner in logical canvas coordinates
    pub position: Point,
    /// Rendered size; may be zero before first layout
    pub size: Size,
    /// Node-local centers of the `true` / `false` sub-elements, when laid out
    pub true_center: Option<Point>,
    pub false_center: Option<Point>,
    /// Rendered size of a connector dot; zero means unknown
    pub connector_size: Size,
}

impl NodeLayout {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, position: Point, size: Size) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            size,
            true_center: None,
            false_center: None,
            connector_size: Size::ZERO,
        }
    }

    pub fn with_branch_centers(mut self, true_center: Point, false_center: Point) -> Self {
        self.true_center = Some(true_center);
        self.false_center = Some(false_center);
        self
    }

    pub fn with_connector_size(mut self, size: Size) -> Self {
        self.connector_size = size;
        self
    }

    pub fn connectors(&self) -> Vec<Connector> {
        self.kind.connectors(&self.id)
    }
}

/// Source of node layouts. Implemented by the host (or [`NodeRegistry`](crate::nodes::NodeRegistry)).
///
/// Calls are synchronous and must not block.
pub trait NodeProvider {
    fn node(&self, id: &NodeId) -> Option<&NodeLayout>;

    fn nodes(&self) -> Box<dyn Iterator<Item = &NodeLayout> + '_>;

    fn contains(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }
}

fn usable(size: Size) -> bool {
    size.width.is_finite() && size.height.is_finite() && size.width > 0.0 && size.height > 0.0
}

/// Resolves connector anchors. Read-only on the hot path.
#[derive(Debug, Clone)]
pub struct GeometryResolver {
    last_known: HashMap<NodeId, Size>,
    default_node_size: Size,
    default_connector_size: Size,
    bottom_clearance: f64,
}

impl Default for GeometryResolver {
    fn default() -> Self {
        Self::new(
            Size::new(DEFAULT_NODE_SIZE.0, DEFAULT_NODE_SIZE.1),
            Size::new(DEFAULT_CONNECTOR_SIZE.0, DEFAULT_CONNECTOR_SIZE.1),
            BOTTOM_CONNECTOR_CLEARANCE,
        )
    }
}

impl GeometryResolver {
    pub fn new(default_node_size: Size, default_connector_size: Size, bottom_clearance: f64) -> Self {
        Self {
            last_known: HashMap::new(),
            default_node_size,
            default_connector_size,
            bottom_clearance,
        }
    }

    /// Update fallback parameters, keeping remembered sizes.
    pub fn configure(&mut self, default_node_size: Size, default_connector_size: Size, bottom_clearance: f64) {
        self.default_node_size = default_node_size;
        self.default_connector_size = default_connector_size;
        self.bottom_clearance = bottom_clearance;
    }

    /// Remember every usable size reported by the provider.
    pub fn observe(&mut self, nodes: &dyn NodeProvider) {
        for layout in nodes.nodes() {
            self.observe_node(layout);
        }
    }

    pub fn observe_node(&mut self, layout: &NodeLayout) {
        if usable(layout.size) {
            self.last_known.insert(layout.id.clone(), layout.size);
        }
    }

    pub fn forget(&mut self, id: &NodeId) {
        self.last_known.remove(id);
    }

    /// Size used for geometry: reported, else last known, else default.
    pub fn effective_size(&self, layout: &NodeLayout) -> Size {
        if usable(layout.size) {
            return layout.size;
        }
        self.last_known
            .get(&layout.id)
            .copied()
            .unwrap_or(self.default_node_size)
    }

    fn effective_connector_size(&self, layout: &NodeLayout) -> Size {
        if usable(layout.connector_size) {
            layout.connector_size
        } else {
            self.default_connector_size
        }
    }

    /// Logical bounds of a node.
    pub fn bounds_of(&self, nodes: &dyn NodeProvider, id: &NodeId) -> CanvasResult<Rect> {
        let layout = nodes
            .node(id)
            .ok_or_else(|| CanvasError::NodeNotFound(id.clone()))?;
        Ok(Rect::from_origin_size(layout.position, self.effective_size(layout)))
    }

    /// Anchor point of `connector` in logical canvas space.
    pub fn anchor_of(&self, nodes: &dyn NodeProvider, connector: &Connector) -> CanvasResult<Point> {
        let layout = nodes
            .node(&connector.node)
            .ok_or_else(|| CanvasError::NodeNotFound(connector.node.clone()))?;
        self.anchor_in(layout, connector.side, connector.branch)
            .ok_or_else(|| CanvasError::ConnectorNotFound(connector.clone()))
    }

    /// Anchor of a connector role on an already-fetched layout.
    pub fn anchor_in(&self, layout: &NodeLayout, side: Side, branch: Option<Branch>) -> Option<Point> {
        if !layout.kind.has_connector(side, branch) {
            return None;
        }
        let size = self.effective_size(layout);
        let Point { x, y } = layout.position;
        let anchor = match (side, branch) {
            (Side::Input, _) => Point::new(x, y + size.height / 2.0),
            (Side::Output, None) => Point::new(x + size.width, y + size.height / 2.0),
            (Side::Output, Some(Branch::True)) => {
                let local = layout
                    .true_center
                    .unwrap_or(Point::new(size.width, size.height / 3.0));
                Point::new(x + local.x, y + local.y)
            }
            (Side::Output, Some(Branch::False)) => {
                let local = layout
                    .false_center
                    .unwrap_or(Point::new(size.width, size.height * 2.0 / 3.0));
                Point::new(x + local.x, y + local.y)
            }
            (Side::Output, Some(Branch::Bottom)) => {
                let dot = self.effective_connector_size(layout);
                Point::new(
                    x + size.width / 2.0,
                    y + size.height + dot.height / 2.0 + self.bottom_clearance,
                )
            }
        };
        Some(anchor)
    }
}
