//! In-memory node registry.
//!
//! A ready-made [`NodeProvider`] for hosts that keep node geometry in the
//! engine's process instead of querying a rendering surface.

use crate::geometry::{NodeLayout, NodeProvider};
use crate::types::NodeId;
use kurbo::{Point, Size, Vec2};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: BTreeMap<NodeId, NodeLayout>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node.
    pub fn insert(&mut self, layout: NodeLayout) {
        self.nodes.insert(layout.id.clone(), layout);
    }

    pub fn remove(&mut self, id: &NodeId) -> Option<NodeLayout> {
        self.nodes.remove(id)
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut NodeLayout> {
        self.nodes.get_mut(id)
    }

    pub fn set_position(&mut self, id: &NodeId, position: Point) -> bool {
        match self.nodes.get_mut(id) {
            Some(layout) => {
                layout.position = position;
                true
            }
            None => false,
        }
    }

    pub fn move_by(&mut self, id: &NodeId, delta: Vec2) -> bool {
        match self.nodes.get_mut(id) {
            Some(layout) => {
                layout.position += delta;
                true
            }
            None => false,
        }
    }

    pub fn set_size(&mut self, id: &NodeId, size: Size) -> bool {
        match self.nodes.get_mut(id) {
            Some(layout) => {
                layout.size = size;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl NodeProvider for NodeRegistry {
    fn node(&self, id: &NodeId) -> Option<&NodeLayout> {
        self.nodes.get(id)
    }

    fn nodes(&self) -> Box<dyn Iterator<Item = &NodeLayout> + '_> {
        Box::new(self.nodes.values())
    }
}
