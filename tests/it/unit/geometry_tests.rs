//! Unit tests for the geometry resolver.

use flowboard::constants::DEFAULT_NODE_SIZE;
use flowboard::{Branch, CanvasError, Connector, GeometryResolver, NodeKind, NodeLayout, NodeRegistry};
use kurbo::{Point, Size};

fn registry(layouts: impl IntoIterator<Item = NodeLayout>) -> NodeRegistry {
    let mut nodes = NodeRegistry::new();
    for layout in layouts {
        nodes.insert(layout);
    }
    nodes
}

fn layout(id: &str, kind: NodeKind) -> NodeLayout {
    NodeLayout::new(id, kind, Point::new(10.0, 20.0), Size::new(100.0, 50.0))
}

#[test]
fn test_plain_anchors_on_vertical_center() {
    let nodes = registry([layout("a", NodeKind::Plain)]);
    let resolver = GeometryResolver::default();

    assert_eq!(resolver.anchor_of(&nodes, &Connector::input("a")), Ok(Point::new(10.0, 45.0)));
    assert_eq!(resolver.anchor_of(&nodes, &Connector::output("a")), Ok(Point::new(110.0, 45.0)));
}

#[test]
fn test_branch_anchors_use_sub_element_centers() {
    let nodes = registry([
        layout("cond", NodeKind::Branching).with_branch_centers(Point::new(90.0, 15.0), Point::new(90.0, 35.0)),
    ]);
    let resolver = GeometryResolver::default();

    assert_eq!(
        resolver.anchor_of(&nodes, &Connector::branch("cond", Branch::True)),
        Ok(Point::new(100.0, 35.0))
    );
    assert_eq!(
        resolver.anchor_of(&nodes, &Connector::branch("cond", Branch::False)),
        Ok(Point::new(100.0, 55.0))
    );
}

#[test]
fn test_branch_anchors_fall_back_to_right_edge_thirds() {
    let nodes = registry([layout("cond", NodeKind::Branching)]);
    let resolver = GeometryResolver::default();

    let t = resolver
        .anchor_of(&nodes, &Connector::branch("cond", Branch::True))
        .unwrap();
    let f = resolver
        .anchor_of(&nodes, &Connector::branch("cond", Branch::False))
        .unwrap();
    assert_eq!(t.x, 110.0);
    assert_eq!(f.x, 110.0);
    assert!(t.y < f.y);
}

#[test]
fn test_bottom_anchor_sits_below_node() {
    let nodes = registry([layout("fan", NodeKind::FanOutBottom)]);
    let resolver = GeometryResolver::new(Size::new(180.0, 60.0), Size::new(12.0, 12.0), 6.0);

    // bottom edge 70, half the dot 6, clearance 6
    assert_eq!(
        resolver.anchor_of(&nodes, &Connector::branch("fan", Branch::Bottom)),
        Ok(Point::new(60.0, 82.0))
    );
}

#[test]
fn test_unlaid_out_node_uses_default_size() {
    let nodes = registry([NodeLayout::new("a", NodeKind::Plain, Point::new(0.0, 0.0), Size::ZERO)]);
    let resolver = GeometryResolver::default();

    let anchor = resolver.anchor_of(&nodes, &Connector::output("a")).unwrap();
    assert_eq!(anchor, Point::new(DEFAULT_NODE_SIZE.0, DEFAULT_NODE_SIZE.1 / 2.0));
}

#[test]
fn test_unlaid_out_node_uses_last_known_size() {
    let mut nodes = registry([layout("a", NodeKind::Plain)]);
    let mut resolver = GeometryResolver::default();
    resolver.observe(&nodes);

    nodes.set_size(&"a".into(), Size::new(f64::NAN, 0.0));
    let anchor = resolver.anchor_of(&nodes, &Connector::output("a")).unwrap();
    assert_eq!(anchor, Point::new(110.0, 45.0));
    assert!(anchor.x.is_finite() && anchor.y.is_finite());
}

#[test]
fn test_missing_node_and_connector_errors() {
    let nodes = registry([layout("a", NodeKind::Plain)]);
    let resolver = GeometryResolver::default();

    assert_eq!(
        resolver.anchor_of(&nodes, &Connector::input("ghost")),
        Err(CanvasError::NodeNotFound("ghost".into()))
    );
    let bogus = Connector::branch("a", Branch::True);
    assert_eq!(
        resolver.anchor_of(&nodes, &bogus),
        Err(CanvasError::ConnectorNotFound(bogus.clone()))
    );
}

#[test]
fn test_bounds_follow_effective_size() {
    let nodes = registry([layout("a", NodeKind::Plain)]);
    let resolver = GeometryResolver::default();
    let bounds = resolver.bounds_of(&nodes, &"a".into()).unwrap();
    assert_eq!((bounds.x0, bounds.y0, bounds.x1, bounds.y1), (10.0, 20.0, 110.0, 70.0));
}
