use crate::constants::{
    DRAFT_LINE_LAYER, DRAFT_LINE_SOURCE, DRAFT_POINTS_LAYER, DRAFT_POINTS_SOURCE, DRAG_PREVIEW_LAYER,
    DRAG_PREVIEW_SOURCE, NODES_SOURCE, SEGMENTS_LAYER, SEGMENTS_SOURCE,
};
use crate::logging::log;
use crate::models::{EditorSettings, NodeCategory, TrailNetwork};
use crate::persistence::Record;
use geojson::FeatureCollection;
use serde_json::json;
use std::collections::VecDeque;
use uuid::Uuid;

use super::auto_route::AutoRouteDirector;
use super::bindings::{BindingRegistry, Handler};
use super::completion::CompletionState;
use super::draft::Draft;
use super::error::{EditorError, TransitionError, UserSequenceError};
use super::events::{EditorEvent, Notice, NodePrefill, SegmentPrefill};
use super::mode::EditorMode;
use super::node_edit::{Interaction, NodeFormState};
use super::snap::{NodeRef, SnapRegistry};
use super::surface::{
    empty_collection, Cursor, FeatureHit, FeatureKind, LayerKind, LayerSpec, ListenerId, MapEvent, MapEventKind,
    MapSurface,
};

/// Identifies an asynchronous request and the mode epoch it was issued in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub id: u64,
    pub epoch: u64,
}

/// A record waiting for the persistence round-trip
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub ticket: Ticket,
    pub record: Record,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentFormRequest {
    pub ticket: Ticket,
    pub prefill: SegmentPrefill,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeFormRequest {
    pub ticket: Ticket,
    pub prefill: NodePrefill,
}

/// Two selected nodes waiting for a computed route
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub ticket: Ticket,
    pub from: NodeRef,
    pub to: NodeRef,
}

/// How a finished save was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Merged and the originating flow was torn down
    Applied,
    /// Failed; the originating state is kept for a retry
    Failed,
    /// The originating flow is gone; a success was still merged into the network
    Stale,
}

/// Result of dispatching one surface event
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// No handler is bound to the listener, or the event does not apply
    Ignored,
    Handled,
    Rejected(UserSequenceError),
    /// The draft became completable: offer confirm or continue
    SegmentCompletable(SegmentPrefill),
    RouteRequested(RouteRequest),
    /// A node was dropped at a new position: open the node form
    NodeMoved(NodeFormRequest),
}

/// Owns the editor mode and every piece of state attached to it.
///
/// All listeners on the surface are installed by mode setup and removed
/// together on the next transition. Asynchronous work is split in a start
/// and a finish call carrying a [`Ticket`]; results for a ticket issued
/// before the latest transition are treated as stale.
pub struct ModeController<S: MapSurface> {
    pub(super) surface: S,
    pub(super) settings: EditorSettings,
    pub(super) network: TrailNetwork,
    pub(super) mode: EditorMode,
    pub(super) epoch: u64,
    next_ticket: u64,
    pub(super) bindings: BindingRegistry,
    pub(super) snap: SnapRegistry,
    pub(super) draft: Option<Draft>,
    pub(super) completion: CompletionState,
    pub(super) director: AutoRouteDirector,
    pub(super) interaction: Interaction,
    pub(super) node_form: Option<NodeFormState>,
    events: VecDeque<EditorEvent>,
}

impl<S: MapSurface> ModeController<S> {
    pub fn new(surface: S, settings: EditorSettings, network: TrailNetwork) -> Self {
        Self {
            surface,
            settings,
            network,
            mode: EditorMode::Normal,
            epoch: 0,
            next_ticket: 0,
            bindings: BindingRegistry::new(),
            snap: SnapRegistry::new(),
            draft: None,
            completion: CompletionState::Idle,
            director: AutoRouteDirector::new(),
            interaction: Interaction::default(),
            node_form: None,
            events: VecDeque::new(),
        }
    }

    /// Create the sources and layers the editor draws on, then set up NORMAL
    pub fn attach(&mut self) {
        let nodes = self.network.nodes_feature_collection();
        let segments = self.network.segments_feature_collection();
        self.ensure_source(NODES_SOURCE, nodes);
        self.ensure_source(SEGMENTS_SOURCE, segments);
        self.ensure_source(DRAFT_LINE_SOURCE, empty_collection());
        self.ensure_source(DRAFT_POINTS_SOURCE, empty_collection());
        self.ensure_source(DRAG_PREVIEW_SOURCE, empty_collection());

        let colors = self.settings.colors.clone();
        let mut layers = vec![LayerSpec::new(SEGMENTS_LAYER, SEGMENTS_SOURCE, LayerKind::Line)
            .with_color(json!(colors.segment))
            .with_paint("line-width", json!(3))];
        for category in NodeCategory::ALL {
            layers.push(
                LayerSpec::new(category.layer_id(), NODES_SOURCE, LayerKind::Circle)
                    .with_filter(json!(["==", ["get", "category"], category.as_str()]))
                    .with_color(json!(colors.node))
                    .with_paint("circle-radius", json!(6)),
            );
        }
        layers.push(
            LayerSpec::new(DRAFT_LINE_LAYER, DRAFT_LINE_SOURCE, LayerKind::Line)
                .with_color(json!(colors.draft_line))
                .with_paint("line-width", json!(3))
                .with_paint("line-dasharray", json!([2, 1])),
        );
        layers.push(
            LayerSpec::new(DRAFT_POINTS_LAYER, DRAFT_POINTS_SOURCE, LayerKind::Circle)
                .with_color(json!(colors.draft_point))
                .with_paint("circle-radius", json!(4)),
        );
        layers.push(
            LayerSpec::new(DRAG_PREVIEW_LAYER, DRAG_PREVIEW_SOURCE, LayerKind::Circle)
                .with_color(json!(colors.node_selected))
                .with_paint("circle-radius", json!(7)),
        );
        for layer in layers {
            if !self.surface.has_layer(&layer.id) {
                self.surface.add_layer(layer);
            }
        }

        self.transition(EditorMode::Normal);
    }

    /// Remove every listener, layer and source the editor created
    pub fn detach(&mut self) {
        let removed = self.bindings.clear(&mut self.surface);
        for layer in [DRAG_PREVIEW_LAYER, DRAFT_POINTS_LAYER, DRAFT_LINE_LAYER, SEGMENTS_LAYER] {
            self.surface.remove_layer(layer);
        }
        for category in NodeCategory::ALL {
            self.surface.remove_layer(category.layer_id());
        }
        for source in [DRAG_PREVIEW_SOURCE, DRAFT_POINTS_SOURCE, DRAFT_LINE_SOURCE, SEGMENTS_SOURCE, NODES_SOURCE] {
            self.surface.remove_source(source);
        }
        log!("Detached editor, removed {} listeners", removed);
    }

    fn ensure_source(&mut self, id: &str, data: FeatureCollection) {
        if self.surface.has_source(id) {
            self.surface.set_data(id, data);
        } else {
            self.surface.add_source(id, data);
        }
    }

    pub fn enter_edit_mode(&mut self) -> Result<(), TransitionError> {
        self.request_mode(EditorMode::Edit)
    }

    pub fn quit_edit_mode(&mut self) -> Result<(), TransitionError> {
        self.leave_mode(EditorMode::Edit)
    }

    pub fn start_auto_segment(&mut self) -> Result<(), TransitionError> {
        self.request_mode(EditorMode::AutoSegment)
    }

    pub fn cancel_auto_segment(&mut self) -> Result<(), TransitionError> {
        self.leave_mode(EditorMode::AutoSegment)
    }

    fn request_mode(&mut self, to: EditorMode) -> Result<(), TransitionError> {
        if !self.mode.can_transition_to(to) {
            let error = TransitionError {
                from: self.mode,
                requested: to,
            };
            self.notify(Notice::warning(format!("Leave {} before switching to {}", self.mode, to)));
            return Err(error);
        }
        self.transition(to);
        Ok(())
    }

    fn leave_mode(&mut self, mode: EditorMode) -> Result<(), TransitionError> {
        if self.mode != mode {
            return Err(TransitionError {
                from: self.mode,
                requested: EditorMode::Normal,
            });
        }
        self.transition(EditorMode::Normal);
        Ok(())
    }

    /// Tear down everything the current mode installed, then set up `to`.
    pub(super) fn transition(&mut self, to: EditorMode) {
        let from = self.mode;
        let removed = self.bindings.clear(&mut self.surface);
        self.reset_transient_state();

        self.epoch += 1;
        self.mode = to;
        match to {
            EditorMode::Normal => self.install_normal(),
            EditorMode::Edit => self.install_edit(),
            EditorMode::AutoSegment => self.install_auto_segment(),
        }

        log!(
            "Mode {} -> {}: removed {} listeners, installed {}",
            from,
            to,
            removed,
            self.bindings.len()
        );
        self.emit(EditorEvent::ModeChanged { from, to });
    }

    fn reset_transient_state(&mut self) {
        self.snap.leave();
        self.draft = None;
        self.completion = CompletionState::Idle;
        self.node_form = None;

        let had_selection = !self.director.selection().is_empty();
        let was_loading = self.director.is_loading();
        self.director.clear();
        let had_hover_label = self.interaction.hovered_segment.is_some() || self.interaction.hovered_node.is_some();
        self.interaction = Interaction::default();

        self.surface.set_data(DRAFT_LINE_SOURCE, empty_collection());
        self.surface.set_data(DRAFT_POINTS_SOURCE, empty_collection());
        self.surface.set_data(DRAG_PREVIEW_SOURCE, empty_collection());
        self.paint_nodes(&[], None);
        self.paint_segment_hover(None);
        self.surface.set_cursor(Cursor::Default);
        self.surface.set_drag_pan(true);

        if had_selection {
            self.emit(EditorEvent::SelectionChanged(Vec::new()));
        }
        if was_loading {
            self.emit(EditorEvent::RouteLoading(false));
        }
        if had_hover_label {
            self.emit(EditorEvent::HoverLabel(None));
        }
    }

    fn install_normal(&mut self) {
        let surface = &mut self.surface;
        let bindings = &mut self.bindings;
        bindings.install(surface, MapEventKind::ContextMenu, None, Handler::OpenContextMenu);
        bindings.install(surface, MapEventKind::TouchStart, None, Handler::LongPressStart);
        bindings.install(surface, MapEventKind::TouchMove, None, Handler::LongPressMove);
        bindings.install(surface, MapEventKind::TouchEnd, None, Handler::LongPressEnd);
        bindings.install(surface, MapEventKind::MouseMove, None, Handler::NodeDragMove);
        bindings.install(surface, MapEventKind::MouseUp, None, Handler::NodeDragEnd);
        bindings.install(surface, MapEventKind::MouseEnter, Some(SEGMENTS_LAYER), Handler::SegmentHoverEnter);
        bindings.install(surface, MapEventKind::MouseLeave, Some(SEGMENTS_LAYER), Handler::SegmentHoverLeave);
        for category in NodeCategory::ALL {
            let layer = Some(category.layer_id());
            bindings.install(surface, MapEventKind::MouseEnter, layer, Handler::NodeHoverEnter);
            bindings.install(surface, MapEventKind::MouseLeave, layer, Handler::NodeHoverLeave);
            bindings.install(surface, MapEventKind::MouseDown, layer, Handler::NodeDragStart);
        }
    }

    fn install_edit(&mut self) {
        self.draft = Some(Draft::new());
        let surface = &mut self.surface;
        let bindings = &mut self.bindings;
        bindings.install(surface, MapEventKind::Click, None, Handler::DrawClick);
        for category in NodeCategory::ALL {
            let layer = Some(category.layer_id());
            bindings.install(surface, MapEventKind::MouseEnter, layer, Handler::SnapEnter);
            bindings.install(surface, MapEventKind::MouseMove, layer, Handler::SnapMove);
            bindings.install(surface, MapEventKind::MouseLeave, layer, Handler::SnapLeave);
        }
        self.surface.set_cursor(Cursor::Crosshair);
    }

    fn install_auto_segment(&mut self) {
        let surface = &mut self.surface;
        let bindings = &mut self.bindings;
        bindings.install(surface, MapEventKind::KeyDown, None, Handler::EscapeKey);
        for category in NodeCategory::ALL.into_iter().filter(|c| c.is_routable()) {
            let layer = Some(category.layer_id());
            bindings.install(surface, MapEventKind::Click, layer, Handler::RouteNodeClick);
            bindings.install(surface, MapEventKind::MouseEnter, layer, Handler::RouteHoverEnter);
            bindings.install(surface, MapEventKind::MouseLeave, layer, Handler::RouteHoverLeave);
        }
    }

    /// Route an event caught by `listener` to the handler bound to it
    pub fn handle(&mut self, listener: ListenerId, event: &MapEvent) -> Dispatch {
        let Some(handler) = self.bindings.handler_for(listener) else {
            return Dispatch::Ignored;
        };
        match handler {
            Handler::OpenContextMenu => self.open_context_menu(event),
            Handler::LongPressStart => self.long_press_start(event),
            Handler::LongPressMove => self.long_press_move(event),
            Handler::LongPressEnd => self.long_press_end(event),
            Handler::SegmentHoverEnter => self.segment_hover_enter(event),
            Handler::SegmentHoverLeave => self.segment_hover_leave(),
            Handler::NodeHoverEnter => self.node_hover_enter(event),
            Handler::NodeHoverLeave => self.node_hover_leave(),
            Handler::NodeDragStart => self.node_drag_start(event),
            Handler::NodeDragMove => self.node_drag_move(event),
            Handler::NodeDragEnd => self.node_drag_end(),
            Handler::DrawClick => self.draw_click(event),
            Handler::SnapEnter => self.snap_enter(event),
            Handler::SnapMove => self.snap_move(event),
            Handler::SnapLeave => self.snap_leave(),
            Handler::RouteNodeClick => self.route_node_click(event),
            Handler::RouteHoverEnter => self.route_hover(true),
            Handler::RouteHoverLeave => self.route_hover(false),
            Handler::EscapeKey => self.escape_key(event),
        }
    }

    fn snap_enter(&mut self, event: &MapEvent) -> Dispatch {
        let Some(node) = event_feature(event).and_then(|hit| self.node_ref_for(hit)) else {
            return Dispatch::Ignored;
        };
        self.snap.enter(node);
        self.surface.set_cursor(Cursor::Pointer);
        Dispatch::Handled
    }

    /// `mouseenter` fires once per layer, so moving from one node to a
    /// neighbour of the same category, or starting over a node, only shows
    /// up as moves
    fn snap_move(&mut self, event: &MapEvent) -> Dispatch {
        let Some(node) = event_feature(event).and_then(|hit| self.node_ref_for(hit)) else {
            return Dispatch::Ignored;
        };
        if self.snap.current().is_some_and(|current| current.node_id == node.node_id) {
            return Dispatch::Ignored;
        }
        self.snap.enter(node);
        self.surface.set_cursor(Cursor::Pointer);
        Dispatch::Handled
    }

    fn snap_leave(&mut self) -> Dispatch {
        self.snap.leave();
        self.surface.set_cursor(Cursor::Crosshair);
        Dispatch::Handled
    }

    /// Node reference for a hit feature, preferring the stored node position
    pub(super) fn node_ref_for(&self, hit: &FeatureHit) -> Option<NodeRef> {
        let FeatureKind::Node(category) = hit.kind else {
            return None;
        };
        let coordinates = self
            .network
            .node(hit.feature_id)
            .map_or(hit.coordinates, |node| node.coordinates);
        Some(NodeRef {
            node_id: hit.feature_id,
            coordinates,
            category,
        })
    }

    /// Color the nodes in `highlighted` with `color`, every other node with
    /// the static node color
    pub(super) fn paint_nodes(&mut self, highlighted: &[Uuid], color: Option<&str>) {
        let normal = self.settings.colors.node.clone();
        let value = match color {
            Some(color) if !highlighted.is_empty() => {
                let ids: Vec<String> = highlighted.iter().map(Uuid::to_string).collect();
                json!(["match", ["get", "id"], ids, color, normal])
            }
            _ => json!(normal),
        };
        for category in NodeCategory::ALL {
            self.surface
                .set_paint_property(category.layer_id(), LayerKind::Circle.color_property(), value.clone());
        }
    }

    pub(super) fn paint_segment_hover(&mut self, hovered: Option<Uuid>) {
        let colors = &self.settings.colors;
        let value = match hovered {
            Some(id) => json!(["match", ["get", "id"], id.to_string(), colors.segment_hover, colors.segment]),
            None => json!(colors.segment),
        };
        self.surface
            .set_paint_property(SEGMENTS_LAYER, LayerKind::Line.color_property(), value);
    }

    pub(super) fn redraw_network(&mut self) {
        let nodes = self.network.nodes_feature_collection();
        let segments = self.network.segments_feature_collection();
        self.surface.set_data(NODES_SOURCE, nodes);
        self.surface.set_data(SEGMENTS_SOURCE, segments);
    }

    /// Merge a saved record into the in-memory network
    pub(super) fn merge_record(&mut self, record: &Record) -> Result<(), EditorError> {
        match record {
            Record::Node(node) => {
                self.network.upsert_node(node.clone());
            }
            Record::Segment(segment) => {
                self.network.upsert_segment(segment.clone())?;
            }
        }
        self.redraw_network();
        self.emit(EditorEvent::NetworkChanged);
        Ok(())
    }

    /// Replace the whole network, e.g. after loading it from the backend
    pub fn replace_network(&mut self, network: TrailNetwork) {
        self.network = network;
        self.redraw_network();
        self.emit(EditorEvent::NetworkChanged);
    }

    pub(super) fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket {
            id: self.next_ticket,
            epoch: self.epoch,
        }
    }

    pub(super) fn emit(&mut self, event: EditorEvent) {
        self.events.push_back(event);
    }

    pub(super) fn notify(&mut self, notice: Notice) {
        self.emit(EditorEvent::Notice(notice));
    }

    /// Surface a rejected action to the user without touching any state
    pub(super) fn reject(&mut self, error: UserSequenceError) -> Dispatch {
        log!("Rejected in {}: {}", self.mode, error);
        self.notify(Notice::warning(error.to_string()));
        Dispatch::Rejected(error)
    }

    /// Notify the user of an error returned by a command
    pub fn report(&mut self, error: &EditorError) {
        let notice = match error {
            EditorError::Sequence(_) | EditorError::Transition(_) | EditorError::Busy => {
                Notice::warning(error.to_string())
            }
            EditorError::Validation(_) | EditorError::Network(_) => Notice::error(error.to_string()),
        };
        self.notify(notice);
    }

    /// Take every event produced since the last call
    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        self.events.drain(..).collect()
    }

    #[must_use]
    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    #[must_use]
    pub fn snap(&self) -> &SnapRegistry {
        &self.snap
    }

    #[must_use]
    pub fn bindings(&self) -> &BindingRegistry {
        &self.bindings
    }

    #[must_use]
    pub fn network(&self) -> &TrailNetwork {
        &self.network
    }

    #[must_use]
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The surface for host-side calls that do not go through the editor,
    /// such as camera movement
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

pub(super) fn event_feature(event: &MapEvent) -> Option<&FeatureHit> {
    event.pointer().and_then(|pointer| pointer.feature.as_ref())
}
