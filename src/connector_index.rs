//! Connector Index Module
//!
//! R-tree of connector anchors in logical canvas space. Backs magnetic
//! snapping and connector hit testing with O(log n) radius queries.

use crate::geometry::{GeometryResolver, NodeProvider};
use crate::types::{Connector, NodeId};
use kurbo::Point;
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use std::collections::HashMap;

/// A connector anchor stored in the tree.
#[derive(Debug, Clone)]
pub struct ConnectorEntry {
    pub connector: Connector,
    pub x: f64,
    pub y: f64,
}

impl ConnectorEntry {
    pub fn new(connector: Connector, anchor: Point) -> Self {
        Self {
            connector,
            x: anchor.x,
            y: anchor.y,
        }
    }

    #[inline]
    pub fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl RTreeObject for ConnectorEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for ConnectorEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

impl PartialEq for ConnectorEntry {
    fn eq(&self, other: &Self) -> bool {
        self.connector == other.connector
    }
}

/// Spatial index of connector anchors.
#[derive(Debug, Clone, Default)]
pub struct ConnectorIndex {
    tree: RTree<ConnectorEntry>,
    entries: HashMap<Connector, ConnectorEntry>,
}

impl ConnectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from `(connector, logical anchor)` pairs.
    pub fn from_anchors<I>(anchors: I) -> Self
    where
        I: IntoIterator<Item = (Connector, Point)>,
    {
        let entries: Vec<ConnectorEntry> = anchors
            .into_iter()
            .map(|(connector, anchor)| ConnectorEntry::new(connector, anchor))
            .collect();

        let entries_map: HashMap<Connector, ConnectorEntry> = entries
            .iter()
            .map(|e| (e.connector.clone(), e.clone()))
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
            entries: entries_map,
        }
    }

    /// Index every connector of every node accepted by `filter`.
    ///
    /// Connectors whose anchor cannot be resolved are skipped.
    pub fn from_nodes<F>(nodes: &dyn NodeProvider, resolver: &GeometryResolver, filter: F) -> Self
    where
        F: Fn(&Connector) -> bool,
    {
        let mut anchors = Vec::new();
        for layout in nodes.nodes() {
            for connector in layout.connectors() {
                if !filter(&connector) {
                    continue;
                }
                if let Some(anchor) = resolver.anchor_in(layout, connector.side, connector.branch) {
                    anchors.push((connector, anchor));
                }
            }
        }
        Self::from_anchors(anchors)
    }

    pub fn insert(&mut self, connector: Connector, anchor: Point) {
        if let Some(old_entry) = self.entries.remove(&connector) {
            self.tree.remove(&old_entry);
        }

        let entry = ConnectorEntry::new(connector.clone(), anchor);
        self.tree.insert(entry.clone());
        self.entries.insert(connector, entry);
    }

    pub fn remove(&mut self, connector: &Connector) -> bool {
        if let Some(entry) = self.entries.remove(connector) {
            self.tree.remove(&entry);
            true
        } else {
            false
        }
    }

    /// Drop every connector of a node. Returns how many were removed.
    pub fn remove_node(&mut self, node: &NodeId) -> usize {
        let doomed: Vec<Connector> = self
            .entries
            .keys()
            .filter(|c| &c.node == node)
            .cloned()
            .collect();
        for connector in &doomed {
            self.remove(connector);
        }
        doomed.len()
    }

    pub fn anchor(&self, connector: &Connector) -> Option<Point> {
        self.entries.get(connector).map(ConnectorEntry::anchor)
    }

    /// Nearest connector within `radius` of `point` (logical units) accepted by `filter`.
    ///
    /// Ties are broken by connector order so results are deterministic.
    pub fn nearest_within<F>(&self, point: Point, radius: f64, filter: F) -> Option<(&Connector, f64)>
    where
        F: Fn(&Connector) -> bool,
    {
        if !(radius.is_finite() && radius >= 0.0) {
            return None;
        }
        self.tree
            .locate_within_distance([point.x, point.y], radius * radius)
            .filter(|entry| filter(&entry.connector))
            .map(|entry| (&entry.connector, entry.distance_2(&[point.x, point.y]).sqrt()))
            .min_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.cmp(b.0))
            })
    }

    /// Connector under `point`, if any lies within `radius`.
    pub fn hit_test(&self, point: Point, radius: f64) -> Option<&Connector> {
        self.nearest_within(point, radius, |_| true).map(|(c, _)| c)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.entries.clear();
    }
}
