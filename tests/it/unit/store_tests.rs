//! Unit tests for the connection store.

use crate::helpers::TestGraphBuilder;
use flowboard::input::CanvasTransform;
use flowboard::store::records_from_json;
use flowboard::{
    Branch, CanvasError, ConnectionEvent, ConnectionId, ConnectionRecord, ConnectionStore, Connector,
    GeometryResolver, InvalidConnection, NodeId, SceneRenderer, Side,
};
use kurbo::Point;
use std::cell::RefCell;
use std::rc::Rc;

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

fn recorded(store: &mut ConnectionStore) -> Rc<RefCell<Vec<ConnectionEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    store.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    events
}

// ============================================================================
// Cardinality
// ============================================================================

#[test]
fn test_second_connection_into_input_evicts_first() {
    let mut store = ConnectionStore::new();
    store.create(&id("a"), &id("c"), None).unwrap();
    assert_eq!(store.query(&id("c"), Side::Input, None).len(), 1);

    store.create(&id("b"), &id("c"), None).unwrap();
    assert_eq!(store.len(), 1);
    let incoming = store.query(&id("c"), Side::Input, None);
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].from(), &id("b"));
}

#[test]
fn test_plain_output_keeps_only_latest() {
    let mut store = ConnectionStore::new();
    store.create(&id("a"), &id("b"), None).unwrap();
    store.create(&id("a"), &id("c"), None).unwrap();

    assert_eq!(store.len(), 1);
    assert!(store.contains(&ConnectionId::new("a", "c")));
    assert!(!store.contains(&ConnectionId::new("a", "b")));
}

#[test]
fn test_branch_outputs_are_independent() {
    let mut store = ConnectionStore::new();
    store.create(&id("cond"), &id("yes"), Some(Branch::True)).unwrap();
    store.create(&id("cond"), &id("no"), Some(Branch::False)).unwrap();
    assert_eq!(store.len(), 2);

    store.create(&id("cond"), &id("other"), Some(Branch::True)).unwrap();
    assert_eq!(store.len(), 2);
    assert!(store.contains(&ConnectionId::new("cond", "no")));
    assert!(store.contains(&ConnectionId::new("cond", "other")));
    assert!(!store.contains(&ConnectionId::new("cond", "yes")));
}

#[test]
fn test_bottom_output_is_uncapped_and_outside_plain_cap() {
    let mut store = ConnectionStore::new();
    store.create(&id("fan"), &id("b"), None).unwrap();
    store.create(&id("fan"), &id("c"), Some(Branch::Bottom)).unwrap();
    store.create(&id("fan"), &id("d"), Some(Branch::Bottom)).unwrap();
    assert_eq!(store.len(), 3);

    // A new plain connection only displaces the plain one.
    store.create(&id("fan"), &id("e"), None).unwrap();
    assert_eq!(store.len(), 3);
    assert!(!store.contains(&ConnectionId::new("fan", "b")));
    assert_eq!(store.query(&id("fan"), Side::Output, Some(Branch::Bottom)).len(), 2);
}

#[test]
fn test_self_loop_rejected() {
    let mut store = ConnectionStore::new();
    assert_eq!(
        store.create(&id("a"), &id("a"), None),
        Err(CanvasError::InvalidConnection(InvalidConnection::SelfLoop))
    );
    assert!(store.is_empty());
}

#[test]
fn test_create_between_normalizes_direction() {
    let mut store = ConnectionStore::new();
    let created = store
        .create_between(&Connector::input("b"), &Connector::branch("a", Branch::False))
        .unwrap();
    assert_eq!(created, ConnectionId::new("a", "b"));
    assert_eq!(store.get(&created).unwrap().branch, Some(Branch::False));
}

#[test]
fn test_create_between_rejects_same_side() {
    let mut store = ConnectionStore::new();
    assert_eq!(
        store.create_between(&Connector::output("a"), &Connector::output("b")),
        Err(CanvasError::InvalidConnection(InvalidConnection::SameSide))
    );
    assert_eq!(
        store.create_between(&Connector::input("a"), &Connector::input("b")),
        Err(CanvasError::InvalidConnection(InvalidConnection::SameSide))
    );
}

// ============================================================================
// Notifications
// ============================================================================

#[test]
fn test_eviction_is_emitted_before_creation() {
    let mut store = ConnectionStore::new();
    let events = recorded(&mut store);

    store.create(&id("a"), &id("b"), None).unwrap();
    store.create(&id("a"), &id("c"), None).unwrap();

    assert_eq!(
        *events.borrow(),
        vec![
            ConnectionEvent::Created {
                id: ConnectionId::new("a", "b"),
                branch: None
            },
            ConnectionEvent::Deleted {
                id: ConnectionId::new("a", "b")
            },
            ConnectionEvent::Created {
                id: ConnectionId::new("a", "c"),
                branch: None
            },
        ]
    );
}

#[test]
fn test_conflict_on_both_ends_evicts_once() {
    let mut store = ConnectionStore::new();
    store.create(&id("a"), &id("b"), None).unwrap();
    store.create(&id("x"), &id("c"), None).unwrap();
    let events = recorded(&mut store);

    // a -> b blocks the output, x -> c blocks the input; a -> b is also re-created
    store.create(&id("a"), &id("b"), None).unwrap();
    store.create(&id("a"), &id("c"), None).unwrap();

    assert_eq!(store.len(), 1);
    assert!(store.contains(&ConnectionId::new("a", "c")));
    let deleted: Vec<ConnectionId> = events
        .borrow()
        .iter()
        .filter_map(|e| match e {
            ConnectionEvent::Deleted { id } => Some(id.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        deleted,
        vec![
            ConnectionId::new("a", "b"),
            ConnectionId::new("x", "c"),
            ConnectionId::new("a", "b"),
        ]
    );
}

#[test]
fn test_delete_is_idempotent() {
    let mut store = ConnectionStore::new();
    store.create(&id("a"), &id("b"), None).unwrap();
    let events = recorded(&mut store);

    assert!(store.delete(&ConnectionId::new("a", "b")));
    assert!(!store.delete(&ConnectionId::new("a", "b")));
    assert_eq!(events.borrow().len(), 1);
}

#[test]
fn test_delete_all_for_removes_both_directions() {
    let mut store = ConnectionStore::new();
    store.create(&id("a"), &id("b"), None).unwrap();
    store.create(&id("b"), &id("c"), None).unwrap();
    store.create(&id("x"), &id("y"), None).unwrap();

    let mut removed = store.delete_all_for(&id("b"));
    removed.sort();
    assert_eq!(removed, vec![ConnectionId::new("a", "b"), ConnectionId::new("b", "c")]);
    assert_eq!(store.len(), 1);
    assert!(store.delete_all_for(&id("ghost")).is_empty());
}

#[test]
fn test_delete_at_connector() {
    let mut store = ConnectionStore::new();
    store.create(&id("cond"), &id("yes"), Some(Branch::True)).unwrap();
    store.create(&id("cond"), &id("no"), Some(Branch::False)).unwrap();

    let removed = store.delete_at(&Connector::branch("cond", Branch::True));
    assert_eq!(removed, vec![ConnectionId::new("cond", "yes")]);
    assert!(!store.is_connected(&Connector::branch("cond", Branch::True)));
    assert!(store.is_connected(&Connector::branch("cond", Branch::False)));
    assert!(store.is_connected(&Connector::input("no")));
}

#[test]
fn test_query_on_missing_node_is_empty() {
    let store = ConnectionStore::new();
    assert!(store.query(&id("ghost"), Side::Input, None).is_empty());
    assert!(store.query(&id("ghost"), Side::Output, Some(Branch::True)).is_empty());
}

// ============================================================================
// Restore
// ============================================================================

#[test]
fn test_restore_round_trip() {
    let records = vec![
        ConnectionRecord::new("cond", "no", Some(Branch::False)),
        ConnectionRecord::new("cond", "yes", Some(Branch::True)),
        ConnectionRecord::new("fan", "x", Some(Branch::Bottom)),
        ConnectionRecord::new("fan", "z", Some(Branch::Bottom)),
        ConnectionRecord::new("start", "cond", None),
    ];
    let mut store = ConnectionStore::new();
    store.create(&id("old"), &id("gone"), None).unwrap();
    let events = recorded(&mut store);

    assert_eq!(store.restore(records.clone()), 5);
    assert_eq!(store.records(), records);
    assert_eq!(*events.borrow(), vec![ConnectionEvent::Restored { count: 5 }]);
}

#[test]
fn test_restore_normalizes_defensively() {
    let json = r#"[
        {"id": "cond-yes", "from": "cond", "to": "yes", "branch": ["true"]},
        {"from": "cond", "to": "no", "branch": "[\"false\"]"},
        {"from": "loop", "to": "loop"},
        {"from": "a", "to": "target"},
        {"from": "b", "to": "target", "branch": ""}
    ]"#;
    let mut store = ConnectionStore::new();
    let count = store.restore(records_from_json(json).unwrap());

    assert_eq!(count, 3);
    assert_eq!(store.get(&ConnectionId::new("cond", "yes")).unwrap().branch, Some(Branch::True));
    assert_eq!(store.get(&ConnectionId::new("cond", "no")).unwrap().branch, Some(Branch::False));
    // later record wins the input
    assert!(store.contains(&ConnectionId::new("b", "target")));
    assert!(!store.contains(&ConnectionId::new("a", "target")));
}

#[test]
fn test_json_round_trip() {
    let mut store = ConnectionStore::new();
    store.create(&id("cond"), &id("yes"), Some(Branch::True)).unwrap();
    store.create(&id("start"), &id("cond"), None).unwrap();

    let json = store.to_json().unwrap();
    let mut restored = ConnectionStore::new();
    restored.restore(records_from_json(&json).unwrap());
    assert_eq!(restored.records(), store.records());
}

#[test]
fn test_ids_with_separator_do_not_collide() {
    let mut store = ConnectionStore::new();
    store.create(&id("a-b"), &id("c"), None).unwrap();
    store.create(&id("a"), &id("b-c"), None).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(ConnectionId::new("a-b", "c").to_string(), ConnectionId::new("a", "b-c").to_string());
}

// ============================================================================
// Routing
// ============================================================================

#[test]
fn test_reroute_all_uses_one_transform() {
    let nodes = TestGraphBuilder::new()
        .plain("a", (0.0, 0.0))
        .plain("b", (300.0, 0.0))
        .build();
    let resolver = GeometryResolver::default();
    let mut scene = SceneRenderer::default();
    let mut store = ConnectionStore::new();
    store.create(&id("a"), &id("b"), None).unwrap();
    store.create(&id("b"), &id("ghost"), None).unwrap();

    let transform = CanvasTransform::new(10.0, 5.0, 2.0);
    let report = store.reroute_all(&nodes, &resolver, transform, &mut scene);
    assert_eq!((report.routed, report.skipped), (1, 1));

    let curve = scene.curve(&ConnectionId::new("a", "b")).unwrap();
    assert_eq!(curve.start(), Point::new(210.0, 55.0));
    assert_eq!(curve.end(), Point::new(610.0, 55.0));
}

#[test]
fn test_reroute_all_drops_stale_curves() {
    let nodes = TestGraphBuilder::new()
        .plain("a", (0.0, 0.0))
        .plain("b", (300.0, 0.0))
        .build();
    let resolver = GeometryResolver::default();
    let mut scene = SceneRenderer::default();
    let store = ConnectionStore::new();
    scene.render(
        &ConnectionId::new("x", "y"),
        Point::ORIGIN,
        Point::new(10.0, 10.0),
        flowboard::render::CurveStyle::Plain,
    );

    store.reroute_all(&nodes, &resolver, CanvasTransform::default(), &mut scene);
    assert_eq!(scene.curve_count(), 0);
}
