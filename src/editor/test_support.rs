//! In-memory doubles of the map surface and the backend channel.

use crate::constants::SEGMENTS_LAYER;
use crate::geometry::{end_bearing, path_length_meters, start_bearing, LngLat};
use crate::models::{
    Description, EditorSettings, GeofenceRadius, Language, Node, NodeCategory, Segment, SegmentAttributes,
    SegmentCategory, SurfaceCondition, TrailNetwork,
};
use crate::persistence::{PersistenceChannel, Subscription, SubscriptionId, Timer};
use futures::channel::oneshot;
use geojson::{FeatureCollection, Value};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use uuid::Uuid;

use super::controller::{Dispatch, ModeController};
use super::events::SegmentPrefill;
use super::surface::{
    Cursor, FeatureHit, FeatureKind, LayerSpec, ListenerId, MapEvent, MapEventKind, MapSurface, PointerEvent,
    ScreenPoint,
};

/// Map surface that records every call
#[derive(Debug)]
pub struct RecordingSurface {
    next_id: u64,
    listeners: IndexMap<ListenerId, (MapEventKind, Option<String>)>,
    sources: HashMap<String, FeatureCollection>,
    layers: IndexMap<String, LayerSpec>,
    paint: HashMap<(String, String), serde_json::Value>,
    cursor: Cursor,
    drag_pan: bool,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: IndexMap::new(),
            sources: HashMap::new(),
            layers: IndexMap::new(),
            paint: HashMap::new(),
            cursor: Cursor::Default,
            drag_pan: true,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Listeners registered for exactly this kind and layer
    pub fn listeners_for(&self, kind: MapEventKind, layer: Option<&str>) -> Vec<ListenerId> {
        self.listeners
            .iter()
            .filter(|(_, (k, l))| *k == kind && l.as_deref() == layer)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Listeners the map would call for an event of `kind` over `layer`:
    /// every general listener plus those restricted to that layer
    pub fn fire_targets(&self, kind: MapEventKind, layer: Option<&str>) -> Vec<ListenerId> {
        self.listeners
            .iter()
            .filter(|(_, (k, l))| *k == kind && (l.is_none() || l.as_deref() == layer))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn data(&self, source: &str) -> Option<&FeatureCollection> {
        self.sources.get(source)
    }

    pub fn feature_count(&self, source: &str) -> usize {
        self.data(source).map_or(0, |data| data.features.len())
    }

    /// Vertices of the first line feature of a source
    pub fn line_vertex_count(&self, source: &str) -> usize {
        self.data(source)
            .and_then(|data| data.features.first())
            .and_then(|feature| feature.geometry.as_ref())
            .map_or(0, |geometry| match &geometry.value {
                Value::LineString(line) => line.len(),
                _ => 0,
            })
    }

    pub fn paint(&self, layer: &str, property: &str) -> Option<serde_json::Value> {
        self.paint
            .get(&(layer.to_string(), property.to_string()))
            .cloned()
            .or_else(|| self.layers.get(layer).and_then(|spec| spec.paint.get(property).cloned()))
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn drag_pan(&self) -> bool {
        self.drag_pan
    }
}

impl MapSurface for RecordingSurface {
    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }

    fn add_source(&mut self, id: &str, data: FeatureCollection) {
        self.sources.insert(id.to_string(), data);
    }

    fn set_data(&mut self, source_id: &str, data: FeatureCollection) {
        if let Some(slot) = self.sources.get_mut(source_id) {
            *slot = data;
        }
    }

    fn remove_source(&mut self, id: &str) {
        self.sources.remove(id);
    }

    fn add_layer(&mut self, layer: LayerSpec) {
        self.layers.insert(layer.id.clone(), layer);
    }

    fn remove_layer(&mut self, id: &str) {
        self.layers.shift_remove(id);
        self.paint.retain(|(layer, _), _| layer != id);
    }

    fn set_paint_property(&mut self, layer_id: &str, property: &str, value: serde_json::Value) {
        if self.layers.contains_key(layer_id) {
            self.paint.insert((layer_id.to_string(), property.to_string()), value);
        }
    }

    fn on(&mut self, kind: MapEventKind, layer: Option<&str>) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.insert(id, (kind, layer.map(str::to_string)));
        id
    }

    fn off(&mut self, listener: ListenerId) {
        self.listeners.shift_remove(&listener);
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn set_drag_pan(&mut self, enabled: bool) {
        self.drag_pan = enabled;
    }
}

pub struct SampleNodes {
    /// Crossroad
    pub x: Node,
    /// Destination
    pub y: Node,
    /// Crossroad
    pub z: Node,
    /// Point of interest, not routable
    pub poi: Node,
}

fn sample_node(sequence_id: u32, category: NodeCategory, lon: f64, lat: f64, name: &str) -> Node {
    let mut descriptions = IndexMap::new();
    if category.requires_descriptions() {
        for language in Language::ALL {
            descriptions.insert(
                language,
                Description {
                    short_text: "Old mill".to_string(),
                    long_text: "A restored water mill by the creek".to_string(),
                },
            );
        }
    }
    Node {
        id: Uuid::new_v4(),
        sequence_id,
        category,
        coordinates: LngLat::new(lon, lat),
        geofence_radius: GeofenceRadius::default(),
        display_name: name.to_string(),
        descriptions,
    }
}

pub fn sample_nodes() -> SampleNodes {
    SampleNodes {
        x: sample_node(1, NodeCategory::Crossroad, 9.1, 44.9, "Fork"),
        y: sample_node(2, NodeCategory::Destination, 9.12, 44.92, "Summit"),
        z: sample_node(3, NodeCategory::Crossroad, 9.14, 44.9, "Ford"),
        poi: sample_node(4, NodeCategory::PointOfInterest, 9.13, 44.91, "Mill"),
    }
}

/// Controller over a recording surface, attached and in NORMAL
pub fn attached_controller() -> (ModeController<RecordingSurface>, SampleNodes) {
    let nodes = sample_nodes();
    let network = TrailNetwork::from_records(
        vec![nodes.x.clone(), nodes.y.clone(), nodes.z.clone(), nodes.poi.clone()],
        Vec::new(),
    )
    .expect("nodes only");
    let mut controller = ModeController::new(RecordingSurface::new(), EditorSettings::default(), network);
    controller.attach();
    (controller, nodes)
}

/// Segment between two nodes, straight line
pub fn link(from: &Node, to: &Node, name: &str) -> Segment {
    let vertices = vec![from.coordinates, to.coordinates];
    Segment {
        id: Uuid::new_v4(),
        backend_id: 7,
        name: name.to_string(),
        length_meters: path_length_meters(&vertices),
        start_bearing_degrees: start_bearing(&vertices).unwrap_or_default(),
        end_bearing_degrees: end_bearing(&vertices).unwrap_or_default(),
        vertices,
        category: SegmentCategory::Trail,
        surface_condition: SurfaceCondition::Unpaved,
        start_node_id: from.id,
        end_node_id: to.id,
    }
}

pub fn sample_segment() -> Segment {
    let nodes = sample_nodes();
    link(&nodes.x, &nodes.y, "Ridge")
}

pub fn segment_attributes(name: &str) -> SegmentAttributes {
    SegmentAttributes {
        name: name.to_string(),
        category: SegmentCategory::Trail,
        surface_condition: SurfaceCondition::Unpaved,
    }
}

pub fn pointer_event(lng_lat: LngLat, feature: Option<FeatureHit>, time_ms: f64) -> MapEvent {
    MapEvent::Pointer(PointerEvent {
        screen: ScreenPoint { x: 100.0, y: 100.0 },
        lng_lat,
        feature,
        time_ms,
    })
}

pub fn node_hit(node: &Node) -> FeatureHit {
    FeatureHit {
        layer_id: node.category.layer_id().to_string(),
        feature_id: node.id,
        coordinates: node.coordinates,
        kind: FeatureKind::Node(node.category),
    }
}

pub fn node_event(node: &Node) -> MapEvent {
    pointer_event(node.coordinates, Some(node_hit(node)), 0.0)
}

/// Deliver an event the way the map does and collect every dispatch
pub fn fire(
    controller: &mut ModeController<RecordingSurface>,
    kind: MapEventKind,
    layer: Option<&str>,
    event: &MapEvent,
) -> Vec<Dispatch> {
    let targets = controller.surface().fire_targets(kind, layer);
    targets
        .into_iter()
        .map(|listener| controller.handle(listener, event))
        .collect()
}

pub fn click_map(controller: &mut ModeController<RecordingSurface>, at: LngLat) -> Vec<Dispatch> {
    fire(controller, MapEventKind::Click, None, &pointer_event(at, None, 0.0))
}

pub fn click_node(controller: &mut ModeController<RecordingSurface>, node: &Node) -> Vec<Dispatch> {
    fire(controller, MapEventKind::Click, Some(node.category.layer_id()), &node_event(node))
}

pub fn right_click(controller: &mut ModeController<RecordingSurface>, at: LngLat) -> Vec<Dispatch> {
    fire(controller, MapEventKind::ContextMenu, None, &pointer_event(at, None, 0.0))
}

pub fn enter_node(controller: &mut ModeController<RecordingSurface>, node: &Node) -> Vec<Dispatch> {
    fire(controller, MapEventKind::MouseEnter, Some(node.category.layer_id()), &node_event(node))
}

pub fn leave_node(controller: &mut ModeController<RecordingSurface>, node: &Node) -> Vec<Dispatch> {
    let event = pointer_event(node.coordinates, None, 0.0);
    fire(controller, MapEventKind::MouseLeave, Some(node.category.layer_id()), &event)
}

pub fn enter_segment(controller: &mut ModeController<RecordingSurface>, segment: &Segment) -> Vec<Dispatch> {
    let at = segment.first_vertex().unwrap_or(LngLat::new(0.0, 0.0));
    let hit = FeatureHit {
        layer_id: SEGMENTS_LAYER.to_string(),
        feature_id: segment.id,
        coordinates: at,
        kind: FeatureKind::Segment,
    };
    fire(controller, MapEventKind::MouseEnter, Some(SEGMENTS_LAYER), &pointer_event(at, Some(hit), 0.0))
}

pub fn leave_segment(controller: &mut ModeController<RecordingSurface>) -> Vec<Dispatch> {
    let event = pointer_event(LngLat::new(0.0, 0.0), None, 0.0);
    fire(controller, MapEventKind::MouseLeave, Some(SEGMENTS_LAYER), &event)
}

/// Pointer motion over a node, as the node's layer reports it
pub fn move_over_node(controller: &mut ModeController<RecordingSurface>, node: &Node) -> Vec<Dispatch> {
    fire(controller, MapEventKind::MouseMove, Some(node.category.layer_id()), &node_event(node))
}

pub fn mouse_down_on_node(controller: &mut ModeController<RecordingSurface>, node: &Node) -> Vec<Dispatch> {
    fire(controller, MapEventKind::MouseDown, Some(node.category.layer_id()), &node_event(node))
}

pub fn mouse_move(controller: &mut ModeController<RecordingSurface>, at: LngLat) -> Vec<Dispatch> {
    fire(controller, MapEventKind::MouseMove, None, &pointer_event(at, None, 0.0))
}

pub fn mouse_up(controller: &mut ModeController<RecordingSurface>, at: LngLat) -> Vec<Dispatch> {
    fire(controller, MapEventKind::MouseUp, None, &pointer_event(at, None, 0.0))
}

pub struct ScreenOffset {
    pub dx: f64,
    pub dy: f64,
}

pub fn touch_start(controller: &mut ModeController<RecordingSurface>, at: LngLat, time_ms: f64) -> Vec<Dispatch> {
    fire(controller, MapEventKind::TouchStart, None, &pointer_event(at, None, time_ms))
}

pub fn touch_move(controller: &mut ModeController<RecordingSurface>, offset: ScreenOffset) -> Vec<Dispatch> {
    let event = MapEvent::Pointer(PointerEvent {
        screen: ScreenPoint {
            x: 100.0 + offset.dx,
            y: 100.0 + offset.dy,
        },
        lng_lat: LngLat::new(0.0, 0.0),
        feature: None,
        time_ms: 0.0,
    });
    fire(controller, MapEventKind::TouchMove, None, &event)
}

pub fn touch_end(controller: &mut ModeController<RecordingSurface>, time_ms: f64) -> Vec<Dispatch> {
    let event = pointer_event(LngLat::new(0.0, 0.0), None, time_ms);
    fire(controller, MapEventKind::TouchEnd, None, &event)
}

pub fn key(controller: &mut ModeController<RecordingSurface>, key: &str) -> Vec<Dispatch> {
    let event = MapEvent::Key { key: key.to_string() };
    fire(controller, MapEventKind::KeyDown, None, &event)
}

pub fn escape(controller: &mut ModeController<RecordingSurface>) -> Vec<Dispatch> {
    key(controller, "Escape")
}

/// Enter EDIT and draw x -> interior vertex -> y, returning the completion prefill
pub fn draw_x_to_y(controller: &mut ModeController<RecordingSurface>, nodes: &SampleNodes) -> SegmentPrefill {
    controller.enter_edit_mode().expect("enter edit");
    enter_node(controller, &nodes.x);
    click_node(controller, &nodes.x);
    leave_node(controller, &nodes.x);
    click_map(controller, LngLat::new(9.11, 44.91));
    enter_node(controller, &nodes.y);
    let dispatched = click_node(controller, &nodes.y);
    leave_node(controller, &nodes.y);
    match dispatched.as_slice() {
        [Dispatch::SegmentCompletable(prefill)] => prefill.clone(),
        other => panic!("expected a completable draft, got {other:?}"),
    }
}

/// Backend channel that answers every save with a fixed payload, a queue of
/// payloads, or never
pub struct ScriptedChannel {
    reply: Option<serde_json::Value>,
    queued: RefCell<VecDeque<serde_json::Value>>,
    send_error: Option<String>,
    next_id: Cell<u64>,
    listeners: RefCell<IndexMap<SubscriptionId, (String, oneshot::Sender<serde_json::Value>)>>,
    emitted: RefCell<Vec<(String, serde_json::Value)>>,
    subscribed: RefCell<Vec<String>>,
    max_active: Cell<usize>,
}

impl ScriptedChannel {
    fn with(reply: Option<serde_json::Value>, send_error: Option<String>) -> Self {
        Self {
            reply,
            queued: RefCell::new(VecDeque::new()),
            send_error,
            next_id: Cell::new(0),
            listeners: RefCell::new(IndexMap::new()),
            emitted: RefCell::new(Vec::new()),
            subscribed: RefCell::new(Vec::new()),
            max_active: Cell::new(0),
        }
    }

    pub fn acknowledging(payload: serde_json::Value) -> Self {
        Self::with(Some(payload), None)
    }

    /// Deliver `payloads` one at a time, the first on send and each later
    /// one as soon as a new listener subscribes
    pub fn replying(payloads: Vec<serde_json::Value>) -> Self {
        let channel = Self::with(None, None);
        channel.queued.replace(payloads.into());
        channel
    }

    pub fn silent() -> Self {
        Self::with(None, None)
    }

    pub fn failing_send(error: &str) -> Self {
        Self::with(None, Some(error.to_string()))
    }

    pub fn emitted_events(&self) -> Vec<String> {
        self.emitted.borrow().iter().map(|(event, _)| event.clone()).collect()
    }

    pub fn emitted_payloads(&self) -> Vec<serde_json::Value> {
        self.emitted.borrow().iter().map(|(_, payload)| payload.clone()).collect()
    }

    pub fn subscribed_events(&self) -> Vec<String> {
        self.subscribed.borrow().clone()
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn max_active_listeners(&self) -> usize {
        self.max_active.get()
    }
}

impl ScriptedChannel {
    fn deliver(&self, reply: serde_json::Value) {
        if let Some((_, (_, sender))) = self.listeners.borrow_mut().shift_remove_index(0) {
            let _ = sender.send(reply);
        }
    }
}

impl PersistenceChannel for ScriptedChannel {
    fn emit(&self, event: &str, payload: serde_json::Value) -> Result<(), String> {
        if let Some(error) = &self.send_error {
            return Err(error.clone());
        }
        self.emitted.borrow_mut().push((event.to_string(), payload));
        let reply = self.reply.clone().or_else(|| self.queued.borrow_mut().pop_front());
        if let Some(reply) = reply {
            self.deliver(reply);
        }
        Ok(())
    }

    fn once(&self, event: &str) -> Subscription {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let (sender, ack) = oneshot::channel();
        let mut listeners = self.listeners.borrow_mut();
        listeners.insert(id, (event.to_string(), sender));
        self.max_active.set(self.max_active.get().max(listeners.len()));
        drop(listeners);
        self.subscribed.borrow_mut().push(event.to_string());
        if !self.emitted.borrow().is_empty() {
            let next = self.queued.borrow_mut().pop_front();
            if let Some(reply) = next {
                self.deliver(reply);
            }
        }
        Subscription { id, ack }
    }

    fn off(&self, id: SubscriptionId) {
        self.listeners.borrow_mut().shift_remove(&id);
    }
}

/// Timer whose deadline has always already passed
pub struct InstantTimer;

impl Timer for InstantTimer {
    async fn sleep(&self, _duration: Duration) {}
}

/// Timer that never fires
pub struct NeverTimer;

impl Timer for NeverTimer {
    async fn sleep(&self, _duration: Duration) {
        futures::future::pending::<()>().await;
    }
}
