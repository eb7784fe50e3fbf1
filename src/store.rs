//! Connection store - the authoritative set of connections.
//!
//! ## Invariants (hold after every mutation)
//!
//! - An input has at most one incoming connection.
//! - A plain output, and each of a branching node's `true` / `false`
//!   outputs, has at most one outgoing connection.
//! - `bottom` outputs are uncapped.
//! - No self-loops; only `output -> input` is stored.
//!
//! Conflicts are resolved by evicting the older connection. Evictions are
//! emitted as `Deleted` strictly before the `Created` that caused them.

use crate::error::{CanvasError, CanvasResult, InvalidConnection};
use crate::geometry::{GeometryResolver, NodeProvider};
use crate::input::coords::CanvasTransform;
use crate::render::{CurveStyle, SceneRenderer};
use crate::types::{Branch, Connection, ConnectionId, ConnectionRecord, Connector, NodeId, Side};
use std::collections::BTreeMap;
use tracing::{debug, info, trace, warn};

/// Change notifications.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    Created {
        id: ConnectionId,
        branch: Option<Branch>,
    },
    Deleted {
        id: ConnectionId,
    },
    /// The whole set was replaced by `restore`
    Restored {
        count: usize,
    },
}

type Listener = Box<dyn FnMut(&ConnectionEvent)>;

/// Outcome of a full or per-node re-route.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RerouteReport {
    pub routed: usize,
    pub skipped: usize,
}

#[derive(Default)]
pub struct ConnectionStore {
    connections: BTreeMap<ConnectionId, Connection>,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for ConnectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionStore")
            .field("connections", &self.connections)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for created/deleted/restored notifications.
    pub fn subscribe(&mut self, listener: impl FnMut(&ConnectionEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: ConnectionEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    /// Store `from -> to`, evicting whatever would violate cardinality.
    pub fn create(&mut self, from: &NodeId, to: &NodeId, branch: Option<Branch>) -> CanvasResult<ConnectionId> {
        if from == to {
            return Err(InvalidConnection::SelfLoop.into());
        }

        for evicted in self.conflicts_with(from, to, branch) {
            debug!(evicted = %evicted, replacement = %ConnectionId::new(from.clone(), to.clone()), "cardinality eviction");
            self.delete(&evicted);
        }

        let connection = Connection::new(from.clone(), to.clone(), branch);
        let id = connection.id.clone();
        self.connections.insert(id.clone(), connection);
        debug!(connection = %id, branch = ?branch, "connection created");
        self.emit(ConnectionEvent::Created {
            id: id.clone(),
            branch,
        });
        Ok(id)
    }

    /// Store a connection between two connectors given in either order.
    ///
    /// An `input -> output` pair is normalized to `output -> input`.
    pub fn create_between(&mut self, a: &Connector, b: &Connector) -> CanvasResult<ConnectionId> {
        if a.node == b.node {
            return Err(InvalidConnection::SelfLoop.into());
        }
        let (source, target) = match (a.side, b.side) {
            (Side::Output, Side::Input) => (a, b),
            (Side::Input, Side::Output) => (b, a),
            _ => return Err(InvalidConnection::SameSide.into()),
        };
        if target.branch.is_some() {
            return Err(CanvasError::ConnectorNotFound(target.clone()));
        }
        self.create(&source.node, &target.node, source.branch)
    }

    /// Existing connections the new one would displace, evictions on the input first.
    fn conflicts_with(&self, from: &NodeId, to: &NodeId, branch: Option<Branch>) -> Vec<ConnectionId> {
        let mut doomed: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|c| c.to() == to)
            .map(|c| c.id.clone())
            .collect();

        if branch.is_none_or(Branch::is_capped) {
            let on_output: Vec<ConnectionId> = self
                .connections
                .values()
                .filter(|c| c.from() == from && c.branch == branch && !doomed.contains(&c.id))
                .map(|c| c.id.clone())
                .collect();
            doomed.extend(on_output);
        }
        doomed
    }

    /// Remove a connection. Idempotent.
    pub fn delete(&mut self, id: &ConnectionId) -> bool {
        if self.connections.remove(id).is_none() {
            return false;
        }
        debug!(connection = %id, "connection deleted");
        self.emit(ConnectionEvent::Deleted { id: id.clone() });
        true
    }

    /// Remove every connection touching `node`. Call before the node itself goes away.
    pub fn delete_all_for(&mut self, node: &NodeId) -> Vec<ConnectionId> {
        let doomed: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|c| c.touches(node))
            .map(|c| c.id.clone())
            .collect();
        for id in &doomed {
            self.delete(id);
        }
        doomed
    }

    /// Remove every connection attached at `connector` ("delete here").
    pub fn delete_at(&mut self, connector: &Connector) -> Vec<ConnectionId> {
        let doomed: Vec<ConnectionId> = self
            .query(&connector.node, connector.side, connector.branch)
            .into_iter()
            .map(|c| c.id.clone())
            .collect();
        for id in &doomed {
            self.delete(id);
        }
        doomed
    }

    /// Replace the whole set with previously persisted records.
    ///
    /// Ids are re-derived from endpoints; self-loops are dropped and later
    /// records win cardinality conflicts, so the result always satisfies the
    /// store invariants.
    pub fn restore(&mut self, records: impl IntoIterator<Item = ConnectionRecord>) -> usize {
        self.connections.clear();
        for record in records {
            if record.from == record.to {
                warn!(node = %record.from, "skipping self-loop in restored connections");
                continue;
            }
            if let Some(external) = record.id.as_deref() {
                trace!(external, "ignoring external connection id");
            }
            for evicted in self.conflicts_with(&record.from, &record.to, record.branch) {
                warn!(evicted = %evicted, "restored connections violate cardinality, keeping the later one");
                self.connections.remove(&evicted);
            }
            let connection = Connection::new(record.from, record.to, record.branch);
            self.connections.insert(connection.id.clone(), connection);
        }
        let count = self.connections.len();
        info!(count, "connections restored");
        self.emit(ConnectionEvent::Restored { count });
        count
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Connections attached at a connector role.
    ///
    /// Inputs ignore `branch`; outputs match it exactly (`None` is the plain output).
    pub fn query(&self, node: &NodeId, side: Side, branch: Option<Branch>) -> Vec<&Connection> {
        self.connections
            .values()
            .filter(|c| match side {
                Side::Input => c.to() == node,
                Side::Output => c.from() == node && c.branch == branch,
            })
            .collect()
    }

    pub fn is_connected(&self, connector: &Connector) -> bool {
        !self
            .query(&connector.node, connector.side, connector.branch)
            .is_empty()
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// The full set in persisted shape.
    pub fn records(&self) -> Vec<ConnectionRecord> {
        self.connections.values().map(Connection::to_record).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records())
    }

    // ------------------------------------------------------------------------
    // Routing
    // ------------------------------------------------------------------------

    /// Re-route every connection under one transform snapshot.
    pub fn reroute_all(
        &self,
        nodes: &dyn NodeProvider,
        resolver: &GeometryResolver,
        transform: CanvasTransform,
        renderer: &mut SceneRenderer,
    ) -> RerouteReport {
        crate::profile_scope!("reroute_all");
        renderer.retain(|id| self.connections.contains_key(id));
        self.reroute(self.connections.values(), nodes, resolver, transform, renderer)
    }

    /// Re-route only the connections touching `node` (node drags).
    pub fn reroute_node(
        &self,
        node: &NodeId,
        nodes: &dyn NodeProvider,
        resolver: &GeometryResolver,
        transform: CanvasTransform,
        renderer: &mut SceneRenderer,
    ) -> RerouteReport {
        let touching = self.connections.values().filter(|c| c.touches(node));
        self.reroute(touching, nodes, resolver, transform, renderer)
    }

    /// Route a single connection.
    pub fn route_one(
        &self,
        id: &ConnectionId,
        nodes: &dyn NodeProvider,
        resolver: &GeometryResolver,
        transform: CanvasTransform,
        renderer: &mut SceneRenderer,
    ) -> CanvasResult<()> {
        let Some(connection) = self.connections.get(id) else {
            renderer.remove(id);
            return Ok(());
        };
        route_connection(connection, nodes, resolver, transform, renderer)
    }

    fn reroute<'a>(
        &self,
        connections: impl Iterator<Item = &'a Connection>,
        nodes: &dyn NodeProvider,
        resolver: &GeometryResolver,
        transform: CanvasTransform,
        renderer: &mut SceneRenderer,
    ) -> RerouteReport {
        let mut report = RerouteReport::default();
        for connection in connections {
            match route_connection(connection, nodes, resolver, transform, renderer) {
                Ok(()) => report.routed += 1,
                Err(e) => {
                    debug!(connection = %connection.id, error = %e, "skipping unroutable connection");
                    report.skipped += 1;
                }
            }
        }
        report
    }
}

fn route_connection(
    connection: &Connection,
    nodes: &dyn NodeProvider,
    resolver: &GeometryResolver,
    transform: CanvasTransform,
    renderer: &mut SceneRenderer,
) -> CanvasResult<()> {
    let start = resolver.anchor_of(nodes, &connection.source())?;
    let end = resolver.anchor_of(nodes, &connection.target())?;
    renderer.render(
        &connection.id,
        transform.to_screen(start),
        transform.to_screen(end),
        CurveStyle::for_branch(connection.branch),
    );
    Ok(())
}

/// Parse records handed over by the persistence collaborator.
pub fn records_from_json(json: &str) -> serde_json::Result<Vec<ConnectionRecord>> {
    serde_json::from_str(json)
}
