//! The editor - single owner of every canvas service.
//!
//! Input flows in through the handlers below and is dispatched either to
//! the [`CanvasController`] (pan/zoom) or to the [`ConnectionInteraction`]
//! (connection drawing). Store notifications are queued by a listener and
//! drained after each mutating call, which keeps the rendered curves and
//! the persistence callback in step with the store.
//!
//! ## Frame loop
//!
//! Hosts call [`Editor::frame`] once per animation frame. It fires an expired
//! long-press timer, retries deferred geometry, and runs at most one full
//! reroute no matter how many transform changes arrived since the last frame.

use crate::connector_index::ConnectorIndex;
use crate::error::CanvasResult;
use crate::geometry::{GeometryResolver, NodeLayout, NodeProvider};
use crate::input::{
    CancelReason, CanvasController, CanvasTransform, ConnectContext, ConnectionInteraction,
    InteractionOutcome, InteractionState, Key, PointerEvent, WheelEvent, validate_pair,
};
use crate::nodes::NodeRegistry;
use crate::perf::{PerfMonitor, measure};
use crate::render::{CurveRouter, SceneRenderer};
use crate::settings::EditorSettings;
use crate::store::{ConnectionEvent, ConnectionStore, RerouteReport};
use crate::types::{ConnectionId, ConnectionRecord, Connector, NodeId, Side};
use kurbo::{Point, Size, Vec2};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

type SaveCallback = Box<dyn FnMut(&[ConnectionRecord])>;

/// What one call to [`Editor::frame`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameReport {
    pub interaction: InteractionOutcome,
    /// Present when a coalesced full reroute ran
    pub reroute: Option<RerouteReport>,
}

pub struct Editor<P: NodeProvider> {
    nodes: P,
    resolver: GeometryResolver,
    store: ConnectionStore,
    scene: SceneRenderer,
    controller: CanvasController,
    interaction: ConnectionInteraction,
    settings: EditorSettings,
    events: Rc<RefCell<VecDeque<ConnectionEvent>>>,
    save_callback: Option<SaveCallback>,
    /// Every connector, for hit testing; rebuilt lazily
    hit_index: Option<ConnectorIndex>,
    perf: PerfMonitor,
}

/// Borrow the interaction and its context from disjoint editor fields.
macro_rules! with_context {
    ($editor:expr, |$interaction:ident, $ctx:ident| $body:expr) => {{
        let transform = $editor.controller.transform();
        let mut $ctx = ConnectContext {
            nodes: &$editor.nodes,
            resolver: &$editor.resolver,
            store: &mut $editor.store,
            scene: &mut $editor.scene,
            transform,
        };
        let $interaction = &mut $editor.interaction;
        $body
    }};
}

impl<P: NodeProvider> Editor<P> {
    pub fn new(nodes: P) -> Self {
        Self::with_settings(nodes, EditorSettings::default())
    }

    /// Invalid settings are logged and replaced by the defaults.
    pub fn with_settings(nodes: P, settings: EditorSettings) -> Self {
        let settings = match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                warn!(error = %e, "invalid editor settings, using defaults");
                EditorSettings::default()
            }
        };
        let events: Rc<RefCell<VecDeque<ConnectionEvent>>> = Rc::default();
        let mut store = ConnectionStore::new();
        let queue = Rc::clone(&events);
        store.subscribe(move |event| queue.borrow_mut().push_back(event.clone()));

        let mut editor = Self {
            nodes,
            resolver: GeometryResolver::default(),
            store,
            scene: SceneRenderer::default(),
            controller: CanvasController::default(),
            interaction: ConnectionInteraction::default(),
            settings: EditorSettings::default(),
            events,
            save_callback: None,
            hit_index: None,
            perf: PerfMonitor::new(),
        };
        editor.configure(settings);
        editor.resolver.observe(&editor.nodes);
        editor
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn nodes(&self) -> &P {
        &self.nodes
    }

    /// Mutable access to the node provider. Call [`Editor::node_moved`] or
    /// [`Editor::handle_resize`] afterwards so curves follow.
    pub fn nodes_mut(&mut self) -> &mut P {
        self.hit_index = None;
        &mut self.nodes
    }

    pub fn store(&self) -> &ConnectionStore {
        &self.store
    }

    pub fn scene(&self) -> &SceneRenderer {
        &self.scene
    }

    pub fn resolver(&self) -> &GeometryResolver {
        &self.resolver
    }

    pub fn controller(&self) -> &CanvasController {
        &self.controller
    }

    pub fn transform(&self) -> CanvasTransform {
        self.controller.transform()
    }

    pub fn interaction_state(&self) -> &InteractionState {
        self.interaction.state()
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn perf(&self) -> &PerfMonitor {
        &self.perf
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    pub fn pointer_down(&mut self, event: &PointerEvent, hit: Option<&Connector>) -> InteractionOutcome {
        if self.controller.pointer_down(event) || self.controller.is_panning() {
            return InteractionOutcome::Ignored;
        }
        let outcome = with_context!(self, |interaction, ctx| interaction.pointer_down(&mut ctx, event, hit));
        self.process_events();
        outcome
    }

    pub fn pointer_move(&mut self, event: &PointerEvent) -> InteractionOutcome {
        if self.controller.is_panning() {
            self.controller.pointer_move(event);
            return InteractionOutcome::Ignored;
        }
        with_context!(self, |interaction, ctx| interaction.pointer_move(&mut ctx, event))
    }

    pub fn pointer_up(&mut self, event: &PointerEvent) -> InteractionOutcome {
        if self.controller.pointer_up(event) {
            return InteractionOutcome::Ignored;
        }
        let outcome = with_context!(self, |interaction, ctx| interaction.pointer_up(&mut ctx, event));
        self.process_events();
        outcome
    }

    pub fn connector_click(&mut self, connector: &Connector, event: &PointerEvent) -> InteractionOutcome {
        if self.controller.is_panning() {
            return InteractionOutcome::Ignored;
        }
        let outcome =
            with_context!(self, |interaction, ctx| interaction.connector_click(&mut ctx, connector, event));
        self.process_events();
        outcome
    }

    pub fn background_click(&mut self, event: &PointerEvent) -> InteractionOutcome {
        with_context!(self, |interaction, ctx| interaction.background_click(&mut ctx, event))
    }

    /// Returns `true` when the transform changed.
    pub fn wheel(&mut self, event: &WheelEvent) -> bool {
        self.controller.wheel(event)
    }

    pub fn key_down(&mut self, key: Key) -> InteractionOutcome {
        if key == Key::Escape {
            self.controller.cancel_pan();
        }
        self.interaction.key_down(&mut self.scene, key)
    }

    /// Connector under `screen`, within the configured hit radius.
    pub fn connector_at(&mut self, screen: Point) -> Option<Connector> {
        crate::profile_scope!("connector_hit_test");
        let transform = self.controller.transform();
        let radius = self.settings.connections.hit_radius / transform.scale;
        let index = self
            .hit_index
            .get_or_insert_with(|| ConnectorIndex::from_nodes(&self.nodes, &self.resolver, |_| true));
        index.hit_test(transform.to_logical(screen), radius).cloned()
    }

    // ------------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------------

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.controller.pan_by(dx, dy);
    }

    pub fn zoom_at(&mut self, screen: Point, factor: f64) -> bool {
        self.controller.zoom_at(screen, factor)
    }

    pub fn set_transform(&mut self, transform: CanvasTransform) {
        self.controller.set_transform(transform);
    }

    /// The canvas surface or a node's rendered size changed.
    pub fn handle_resize(&mut self) {
        self.resolver.observe(&self.nodes);
        self.hit_index = None;
        self.interaction.nodes_changed(&self.nodes, &self.resolver);
        self.controller.request_reroute();
    }

    /// Advance timers and run the coalesced reroute.
    pub fn frame(&mut self, now: Instant) -> FrameReport {
        self.perf.begin_frame();
        self.resolver.observe(&self.nodes);

        let mut interaction = with_context!(self, |interaction, ctx| interaction.tick(&mut ctx, now));
        if interaction == InteractionOutcome::Ignored {
            interaction = with_context!(self, |interaction, ctx| interaction.retry_deferred(&mut ctx));
        }

        let mut reroute = None;
        if self.controller.take_reroute_request() {
            let transform = self.controller.transform();
            let (store, nodes, resolver, scene) = (&self.store, &self.nodes, &self.resolver, &mut self.scene);
            let (report, elapsed_ms) = measure(|| store.reroute_all(nodes, resolver, transform, scene));
            self.perf.record_operation("reroute_all", elapsed_ms);
            trace!(routed = report.routed, skipped = report.skipped, elapsed_ms, "rerouted");
            with_context!(self, |interaction, ctx| interaction.refresh(&mut ctx));
            reroute = Some(report);
        }

        self.process_events();
        self.perf.end_frame();
        FrameReport { interaction, reroute }
    }

    // ------------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------------

    /// A node moved or resized; re-route just its connections.
    pub fn node_moved(&mut self, id: &NodeId) -> RerouteReport {
        if let Some(layout) = self.nodes.node(id) {
            self.resolver.observe_node(layout);
        }
        self.hit_index = None;
        self.interaction.nodes_changed(&self.nodes, &self.resolver);
        let transform = self.controller.transform();
        self.store
            .reroute_node(id, &self.nodes, &self.resolver, transform, &mut self.scene)
    }

    pub fn begin_node_drag(&mut self) {
        self.controller.begin_node_drag();
    }

    pub fn end_node_drag(&mut self) {
        self.controller.end_node_drag();
    }

    /// Remove a node: its connections go first, then `remove` takes it out
    /// of the provider.
    pub fn remove_node_with<F>(&mut self, id: &NodeId, remove: F) -> Vec<ConnectionId>
    where
        F: FnOnce(&mut P, &NodeId),
    {
        self.interaction.node_removed(&mut self.scene, id);
        let removed = self.store.delete_all_for(id);
        self.process_events();

        remove(&mut self.nodes, id);
        self.resolver.forget(id);
        self.hit_index = None;
        debug!(node = %id, connections = removed.len(), "node removed");
        removed
    }

    // ------------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------------

    /// Connect two connectors directly, in either order.
    pub fn connect(&mut self, a: &Connector, b: &Connector) -> CanvasResult<ConnectionId> {
        validate_pair(&self.nodes, a, b)?;
        let id = self.store.create_between(a, b)?;
        self.process_events();
        Ok(id)
    }

    pub fn delete_connection(&mut self, id: &ConnectionId) -> bool {
        let deleted = self.store.delete(id);
        self.process_events();
        deleted
    }

    /// Delete every connection attached at `connector`.
    pub fn delete_connections_at(&mut self, connector: &Connector) -> Vec<ConnectionId> {
        let removed = self.store.delete_at(connector);
        self.process_events();
        removed
    }

    /// Replace the whole connection set. Does not invoke the save callback.
    ///
    /// Branch tags are checked against the kind of any source node already
    /// known: a branch on a plain output is stripped, a record naming an
    /// output the node lacks is dropped.
    pub fn restore(&mut self, records: impl IntoIterator<Item = ConnectionRecord>) -> usize {
        if !self.interaction.is_idle() {
            self.interaction.cancel(&mut self.scene, CancelReason::GraphReplaced);
        }
        let records: Vec<ConnectionRecord> = records
            .into_iter()
            .filter_map(|record| fit_to_source_kind(&self.nodes, record))
            .collect();
        let count = self.store.restore(records);
        self.process_events();
        count
    }

    pub fn records(&self) -> Vec<ConnectionRecord> {
        self.store.records()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ConnectionEvent) + 'static) {
        self.store.subscribe(listener);
    }

    /// Called with the full record list after every structural change.
    pub fn set_save_callback(&mut self, callback: impl FnMut(&[ConnectionRecord]) + 'static) {
        self.save_callback = Some(Box::new(callback));
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    /// Hot-apply settings. The graph is untouched; curves reroute next frame.
    pub fn apply_settings(&mut self, settings: EditorSettings) -> crate::error::SettingsResult<()> {
        settings.validate()?;
        self.configure(settings);
        self.hit_index = None;
        self.interaction.nodes_changed(&self.nodes, &self.resolver);
        self.controller.request_reroute();
        info!("settings applied");
        Ok(())
    }

    fn configure(&mut self, settings: EditorSettings) {
        let layout = &settings.layout;
        self.resolver.configure(
            Size::new(layout.default_node_width, layout.default_node_height),
            Size::new(layout.default_connector_size, layout.default_connector_size),
            layout.bottom_clearance,
        );
        self.scene
            .set_router(CurveRouter::new(settings.routing.curvature, settings.routing.max_offset));
        self.controller.apply_settings(settings.zoom.clone());
        self.interaction.configure(settings.connections.clone());
        self.settings = settings;
    }

    // ------------------------------------------------------------------------
    // Store notifications
    // ------------------------------------------------------------------------

    fn process_events(&mut self) {
        let mut structural = false;
        loop {
            let Some(event) = self.events.borrow_mut().pop_front() else {
                break;
            };
            let transform = self.controller.transform();
            match event {
                ConnectionEvent::Created { id, .. } => {
                    structural = true;
                    if let Err(e) =
                        self.store
                            .route_one(&id, &self.nodes, &self.resolver, transform, &mut self.scene)
                    {
                        debug!(connection = %id, error = %e, "new connection not routable yet");
                        self.controller.request_reroute();
                    }
                }
                ConnectionEvent::Deleted { id } => {
                    structural = true;
                    self.scene.remove(&id);
                }
                ConnectionEvent::Restored { count } => {
                    self.scene.clear();
                    let report = self
                        .store
                        .reroute_all(&self.nodes, &self.resolver, transform, &mut self.scene);
                    debug!(count, routed = report.routed, "scene rebuilt after restore");
                }
            }
        }

        if structural {
            if let Some(callback) = &mut self.save_callback {
                callback(&self.store.records());
            }
        }
    }
}

impl Editor<NodeRegistry> {
    pub fn add_node(&mut self, layout: NodeLayout) {
        self.resolver.observe_node(&layout);
        self.nodes.insert(layout);
        self.hit_index = None;
        self.interaction.nodes_changed(&self.nodes, &self.resolver);
    }

    /// Remove a node and, strictly before it, its connections.
    pub fn remove_node(&mut self, id: &NodeId) -> Vec<ConnectionId> {
        self.remove_node_with(id, |nodes, id| {
            nodes.remove(id);
        })
    }

    /// Move a node by a logical delta and re-route its connections.
    pub fn move_node(&mut self, id: &NodeId, delta: Vec2) -> bool {
        if !self.nodes.move_by(id, delta) {
            return false;
        }
        self.node_moved(id);
        true
    }
}

/// Align a restored record with the outputs its source node actually has.
fn fit_to_source_kind(nodes: &dyn NodeProvider, mut record: ConnectionRecord) -> Option<ConnectionRecord> {
    let Some(layout) = nodes.node(&record.from) else {
        return Some(record);
    };
    if layout.kind.has_connector(Side::Output, record.branch) {
        return Some(record);
    }
    if layout.kind.has_connector(Side::Output, None) {
        warn!(node = %record.from, branch = ?record.branch, "stripping branch the node does not have");
        record.branch = None;
        return Some(record);
    }
    warn!(node = %record.from, branch = ?record.branch, "dropping restored connection from a missing output");
    None
}
