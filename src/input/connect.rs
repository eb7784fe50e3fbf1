//! Connection drawing - one state machine fed by three gesture protocols.
//!
//! - Click-to-click: click a connector to start, click a compatible one to commit.
//! - Drag: pointer down on an output starts drawing; release commits against
//!   the magnetic candidate or cancels.
//! - Long press: holding any connector starts drawing once the timer fires;
//!   from then on pointer moves anywhere on the canvas drive it.
//!
//! Validation always runs against the live store and node provider at commit
//! time, never against what was true when drawing started.

use super::events::{Key, PointerButton, PointerEvent};
use super::snapping::MagneticSnap;
use super::state::{InteractionState, Modality};
use crate::constants::{BANNER_PICK_INPUT, BANNER_PICK_OUTPUT, BANNER_RELEASE, MAX_GEOMETRY_RETRIES};
use crate::error::{CanvasError, CanvasResult, InvalidConnection};
use crate::geometry::{GeometryResolver, NodeProvider};
use crate::input::coords::CanvasTransform;
use crate::profile_scope;
use crate::render::{Highlight, SceneRenderer};
use crate::settings::ConnectionSettings;
use crate::store::ConnectionStore;
use crate::types::{ConnectionId, Connector, NodeId};
use kurbo::Point;
use std::time::Instant;
use tracing::{debug, trace};

/// Services a gesture needs, borrowed for the duration of one event.
pub struct ConnectContext<'a> {
    pub nodes: &'a dyn NodeProvider,
    pub resolver: &'a GeometryResolver,
    pub store: &'a mut ConnectionStore,
    pub scene: &'a mut SceneRenderer,
    /// Snapshot used for every conversion within the event
    pub transform: CanvasTransform,
}

/// Why a pending or pressing interaction ended without a connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CancelReason {
    Escape,
    BackgroundClick,
    /// The origin connector was activated again
    OriginReactivated,
    /// Released with no magnetic candidate in range
    NoCandidate,
    /// Drag released within the slop; the click protocol takes over
    ShortPress,
    /// Pointer moved away before the long-press timer fired
    PressAborted,
    /// The origin node went away
    OriginRemoved,
    /// Anchors stayed unresolvable for too many frames
    GeometryUnavailable,
    /// The whole connection set was restored
    GraphReplaced,
    Invalid(CanvasError),
}

/// What an event did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionOutcome {
    Ignored,
    Pressing,
    Started(Modality),
    Updated,
    Committed(ConnectionId),
    Cancelled(CancelReason),
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionInteraction {
    state: InteractionState,
    settings: ConnectionSettings,
    snap: Option<MagneticSnap>,
    suppress_click_until: Option<Instant>,
    deferred: bool,
    geometry_retries: u32,
}

impl ConnectionInteraction {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn configure(&mut self, settings: ConnectionSettings) {
        self.settings = settings;
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    /// A geometry failure is waiting for the next frame.
    pub fn has_deferred_update(&self) -> bool {
        self.deferred
    }

    // ------------------------------------------------------------------------
    // Event entry points
    // ------------------------------------------------------------------------

    pub fn pointer_down(
        &mut self,
        ctx: &mut ConnectContext<'_>,
        event: &PointerEvent,
        hit: Option<&Connector>,
    ) -> InteractionOutcome {
        if event.button != PointerButton::Primary {
            return InteractionOutcome::Ignored;
        }
        if self.state.is_pending() {
            return InteractionOutcome::Ignored;
        }
        if self.state.is_pressing() {
            self.clear_transients(ctx.scene);
        }
        let Some(connector) = hit else {
            return InteractionOutcome::Ignored;
        };
        if let Err(e) = connector_exists(ctx.nodes, connector) {
            debug!(connector = %connector, error = %e, "pointer down on unknown connector");
            return InteractionOutcome::Ignored;
        }

        if connector.is_output() && self.settings.drag_from_outputs {
            return self.begin_pending(ctx, connector.clone(), Modality::Drag, event.position);
        }
        if self.settings.long_press_enabled {
            self.state
                .start_pressing(connector.clone(), event.time, event.position);
            ctx.scene.set_highlight(connector.clone(), Highlight::Pressed);
            trace!(connector = %connector, "long press armed");
            return InteractionOutcome::Pressing;
        }
        InteractionOutcome::Ignored
    }

    pub fn pointer_move(&mut self, ctx: &mut ConnectContext<'_>, event: &PointerEvent) -> InteractionOutcome {
        profile_scope!("connection_pointer_move");

        if let InteractionState::Pressing {
            pressed_at,
            press_pos,
            ..
        } = &self.state
        {
            if self.long_press_elapsed(*pressed_at, event.time) {
                let start = self.fire_long_press(ctx);
                if !matches!(start, InteractionOutcome::Started(_)) {
                    return start;
                }
            } else if (event.position - *press_pos).hypot() > self.settings.drag_slop {
                self.clear_transients(ctx.scene);
                return InteractionOutcome::Cancelled(CancelReason::PressAborted);
            } else {
                return InteractionOutcome::Ignored;
            }
        }

        if !self.state.is_pending() {
            return InteractionOutcome::Ignored;
        }
        self.state.set_cursor(event.position);
        self.update_preview(ctx);
        InteractionOutcome::Updated
    }

    pub fn pointer_up(&mut self, ctx: &mut ConnectContext<'_>, event: &PointerEvent) -> InteractionOutcome {
        if event.button != PointerButton::Primary {
            return InteractionOutcome::Ignored;
        }

        match &self.state {
            InteractionState::Idle => InteractionOutcome::Ignored,
            InteractionState::Pressing { pressed_at, .. } => {
                if self.long_press_elapsed(*pressed_at, event.time) {
                    let start = self.fire_long_press(ctx);
                    if !matches!(start, InteractionOutcome::Started(_)) {
                        return start;
                    }
                    self.resolve_release(ctx, event)
                } else {
                    // Short press: the click protocol handles it.
                    self.clear_transients(ctx.scene);
                    InteractionOutcome::Ignored
                }
            }
            InteractionState::Pending {
                modality: Modality::Click,
                ..
            } => InteractionOutcome::Ignored,
            InteractionState::Pending {
                modality: Modality::Drag,
                press_pos,
                ..
            } if (event.position - *press_pos).hypot() <= self.settings.drag_slop => {
                self.cancel(ctx.scene, CancelReason::ShortPress)
            }
            InteractionState::Pending { .. } => self.resolve_release(ctx, event),
        }
    }

    /// Click on a connector.
    pub fn connector_click(
        &mut self,
        ctx: &mut ConnectContext<'_>,
        connector: &Connector,
        event: &PointerEvent,
    ) -> InteractionOutcome {
        if let Some(until) = self.suppress_click_until.take() {
            if event.time <= until {
                trace!(connector = %connector, "swallowing click trailing a drag release");
                return InteractionOutcome::Ignored;
            }
        }
        if self.state.is_pressing() {
            self.clear_transients(ctx.scene);
        }

        let Some(origin) = self.state.origin().cloned() else {
            if let Err(e) = connector_exists(ctx.nodes, connector) {
                debug!(connector = %connector, error = %e, "click on unknown connector");
                return InteractionOutcome::Ignored;
            }
            return self.begin_pending(ctx, connector.clone(), Modality::Click, event.position);
        };

        if &origin == connector {
            return self.cancel(ctx.scene, CancelReason::OriginReactivated);
        }
        self.commit(ctx, &origin, connector)
    }

    /// Click on empty canvas.
    pub fn background_click(&mut self, ctx: &mut ConnectContext<'_>, event: &PointerEvent) -> InteractionOutcome {
        if let Some(until) = self.suppress_click_until.take() {
            if event.time <= until {
                return InteractionOutcome::Ignored;
            }
        }
        if self.state.is_pending() {
            return self.cancel(ctx.scene, CancelReason::BackgroundClick);
        }
        InteractionOutcome::Ignored
    }

    pub fn key_down(&mut self, scene: &mut SceneRenderer, key: Key) -> InteractionOutcome {
        match key {
            Key::Escape if !self.state.is_idle() => self.cancel(scene, CancelReason::Escape),
            _ => InteractionOutcome::Ignored,
        }
    }

    /// Fire an expired long-press timer. Called once per frame.
    pub fn tick(&mut self, ctx: &mut ConnectContext<'_>, now: Instant) -> InteractionOutcome {
        match &self.state {
            InteractionState::Pressing { pressed_at, .. } if self.long_press_elapsed(*pressed_at, now) => {
                self.fire_long_press(ctx)
            }
            _ => InteractionOutcome::Ignored,
        }
    }

    /// Retry a preview update that failed geometry resolution.
    pub fn retry_deferred(&mut self, ctx: &mut ConnectContext<'_>) -> InteractionOutcome {
        if !self.deferred {
            return InteractionOutcome::Ignored;
        }
        if !self.state.is_pending() {
            self.deferred = false;
            self.geometry_retries = 0;
            return InteractionOutcome::Ignored;
        }
        if self.update_preview(ctx) {
            return InteractionOutcome::Updated;
        }
        self.geometry_retries += 1;
        if self.geometry_retries >= MAX_GEOMETRY_RETRIES {
            return self.cancel(ctx.scene, CancelReason::GeometryUnavailable);
        }
        InteractionOutcome::Ignored
    }

    /// Redraw the preview after the transform changed.
    pub fn refresh(&mut self, ctx: &mut ConnectContext<'_>) {
        if self.state.is_pending() {
            self.update_preview(ctx);
        }
    }

    /// Re-index snap candidates after nodes moved or appeared.
    pub fn nodes_changed(&mut self, nodes: &dyn NodeProvider, resolver: &GeometryResolver) {
        if let Some(snap) = &mut self.snap {
            snap.rebuild(nodes, resolver);
        }
    }

    /// A node is about to be removed.
    pub fn node_removed(&mut self, scene: &mut SceneRenderer, node: &NodeId) -> InteractionOutcome {
        let involved = self.state.origin().is_some_and(|c| &c.node == node)
            || self.state.pressed().is_some_and(|c| &c.node == node);
        if involved {
            return self.cancel(scene, CancelReason::OriginRemoved);
        }
        if let Some(snap) = &mut self.snap {
            snap.forget_node(node);
        }
        if self.state.candidate().is_some_and(|c| &c.node == node) {
            if let Some(candidate) = self.state.candidate().cloned() {
                scene.clear_highlight(&candidate);
            }
            self.state.set_candidate(None);
        }
        scene.forget_node(node);
        InteractionOutcome::Ignored
    }

    /// Abandon whatever is in progress and clear every transient visual.
    pub fn cancel(&mut self, scene: &mut SceneRenderer, reason: CancelReason) -> InteractionOutcome {
        debug!(reason = ?reason, origin = ?self.state.origin().map(ToString::to_string), "connection cancelled");
        self.clear_transients(scene);
        InteractionOutcome::Cancelled(reason)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn long_press_elapsed(&self, pressed_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(pressed_at) >= self.settings.long_press()
    }

    fn begin_pending(
        &mut self,
        ctx: &mut ConnectContext<'_>,
        origin: Connector,
        modality: Modality,
        position: Point,
    ) -> InteractionOutcome {
        let anchor = match ctx.resolver.anchor_of(ctx.nodes, &origin) {
            Ok(anchor) => ctx.transform.to_screen(anchor),
            Err(e) => {
                debug!(origin = %origin, error = %e, "cannot start connection");
                return InteractionOutcome::Ignored;
            }
        };

        // Click-started previews begin collapsed on the origin until the pointer moves.
        let cursor = match modality {
            Modality::Click => anchor,
            Modality::Drag | Modality::LongPress => position,
        };
        self.state.start_pending(origin.clone(), modality, cursor, position);
        self.deferred = false;
        self.geometry_retries = 0;

        ctx.scene.set_highlight(origin.clone(), Highlight::Origin);
        let banner = match (modality, origin.is_output()) {
            (Modality::Click, true) => BANNER_PICK_INPUT,
            (Modality::Click, false) => BANNER_PICK_OUTPUT,
            _ => BANNER_RELEASE,
        };
        ctx.scene.show_banner(banner);

        self.snap = modality.snaps().then(|| {
            MagneticSnap::for_origin(&origin, ctx.nodes, ctx.resolver, self.settings.snap_radius)
        });

        if modality.snaps() {
            self.update_preview(ctx);
        }
        debug!(origin = %origin, modality = ?modality, "connection pending");
        InteractionOutcome::Started(modality)
    }

    /// Turn an expired press into a pending long-press connection.
    fn fire_long_press(&mut self, ctx: &mut ConnectContext<'_>) -> InteractionOutcome {
        let InteractionState::Pressing {
            connector,
            press_pos,
            ..
        } = std::mem::take(&mut self.state)
        else {
            return InteractionOutcome::Ignored;
        };
        ctx.scene.clear_highlight(&connector);
        self.begin_pending(ctx, connector, Modality::LongPress, press_pos)
    }

    /// Redraw the preview and, for drag-style gestures, the magnetic candidate.
    ///
    /// Returns `false` and defers to the next frame when the origin anchor
    /// cannot be resolved.
    fn update_preview(&mut self, ctx: &mut ConnectContext<'_>) -> bool {
        let (origin, cursor, modality) = match &self.state {
            InteractionState::Pending {
                origin,
                cursor,
                modality,
                ..
            } => (origin.clone(), *cursor, *modality),
            _ => return false,
        };

        let origin_screen = match ctx.resolver.anchor_of(ctx.nodes, &origin) {
            Ok(anchor) => ctx.transform.to_screen(anchor),
            Err(e) => {
                trace!(origin = %origin, error = %e, "deferring preview update");
                self.deferred = true;
                return false;
            }
        };
        self.deferred = false;
        self.geometry_retries = 0;

        let mut end = cursor;
        if modality.snaps() {
            let candidate = self
                .snap
                .as_ref()
                .and_then(|snap| snap.nearest(cursor, ctx.transform));
            self.set_candidate(ctx.scene, candidate.clone());
            if let Some(candidate) = candidate {
                if let Ok(anchor) = ctx.resolver.anchor_of(ctx.nodes, &candidate) {
                    end = ctx.transform.to_screen(anchor);
                }
            }
        }

        if origin.is_output() {
            ctx.scene.render_temp(origin_screen, end);
        } else {
            ctx.scene.render_temp(end, origin_screen);
        }
        true
    }

    fn set_candidate(&mut self, scene: &mut SceneRenderer, next: Option<Connector>) {
        let previous = self.state.candidate().cloned();
        if previous == next {
            return;
        }
        if let Some(previous) = previous {
            scene.clear_highlight(&previous);
        }
        if let Some(next) = &next {
            scene.set_highlight(next.clone(), Highlight::Candidate);
        }
        self.state.set_candidate(next);
    }

    fn resolve_release(&mut self, ctx: &mut ConnectContext<'_>, event: &PointerEvent) -> InteractionOutcome {
        self.suppress_click_until = Some(event.time + self.settings.click_suppress());
        self.state.set_cursor(event.position);
        let candidate = self
            .snap
            .as_ref()
            .and_then(|snap| snap.nearest(event.position, ctx.transform));

        let Some(origin) = self.state.origin().cloned() else {
            return InteractionOutcome::Ignored;
        };
        match candidate {
            Some(target) => self.commit(ctx, &origin, &target),
            None => self.cancel(ctx.scene, CancelReason::NoCandidate),
        }
    }

    fn commit(&mut self, ctx: &mut ConnectContext<'_>, origin: &Connector, target: &Connector) -> InteractionOutcome {
        let result = validate_pair(ctx.nodes, origin, target)
            .and_then(|()| ctx.store.create_between(origin, target));
        match result {
            Ok(id) => {
                debug!(connection = %id, "connection committed");
                self.clear_transients(ctx.scene);
                InteractionOutcome::Committed(id)
            }
            Err(e) => self.cancel(ctx.scene, CancelReason::Invalid(e)),
        }
    }

    fn clear_transients(&mut self, scene: &mut SceneRenderer) {
        scene.clear_highlights();
        scene.clear_temp();
        scene.clear_banner();
        self.state.reset();
        self.snap = None;
        self.deferred = false;
        self.geometry_retries = 0;
    }
}

fn connector_exists(nodes: &dyn NodeProvider, connector: &Connector) -> CanvasResult<()> {
    let layout = nodes
        .node(&connector.node)
        .ok_or_else(|| CanvasError::NodeNotFound(connector.node.clone()))?;
    if layout.kind.has_connector(connector.side, connector.branch) {
        Ok(())
    } else {
        Err(CanvasError::ConnectorNotFound(connector.clone()))
    }
}

/// Structural checks against the live node set.
pub(crate) fn validate_pair(nodes: &dyn NodeProvider, a: &Connector, b: &Connector) -> CanvasResult<()> {
    if a.node == b.node {
        return Err(InvalidConnection::SelfLoop.into());
    }
    if a.side == b.side {
        return Err(InvalidConnection::SameSide.into());
    }
    for connector in [a, b] {
        match connector_exists(nodes, connector) {
            Err(CanvasError::ConnectorNotFound(_)) => {
                return Err(InvalidConnection::UnknownConnector.into());
            }
            other => other?,
        }
    }
    Ok(())
}
