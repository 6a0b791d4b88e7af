//! The map rendering surface as seen by the editor.
//!
//! The controller never holds closures registered on the map. It registers
//! listeners by event kind (and optionally layer) and receives a
//! [`ListenerId`]; the host forwards every fired event to the controller
//! together with the id of the listener that caught it.

use crate::geometry::LngLat;
use crate::models::NodeCategory;
use geojson::FeatureCollection;
use uuid::Uuid;

/// Opaque handle of one registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEventKind {
    MouseDown,
    MouseMove,
    MouseUp,
    Click,
    ContextMenu,
    MouseEnter,
    MouseLeave,
    TouchStart,
    TouchMove,
    TouchEnd,
    KeyDown,
}

impl MapEventKind {
    /// Event name understood by the map library
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MapEventKind::MouseDown => "mousedown",
            MapEventKind::MouseMove => "mousemove",
            MapEventKind::MouseUp => "mouseup",
            MapEventKind::Click => "click",
            MapEventKind::ContextMenu => "contextmenu",
            MapEventKind::MouseEnter => "mouseenter",
            MapEventKind::MouseLeave => "mouseleave",
            MapEventKind::TouchStart => "touchstart",
            MapEventKind::TouchMove => "touchmove",
            MapEventKind::TouchEnd => "touchend",
            MapEventKind::KeyDown => "keydown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// What a hit-tested feature is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureKind {
    Node(NodeCategory),
    Segment,
}

/// Topmost feature under the pointer, as resolved by the surface
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureHit {
    pub layer_id: String,
    pub feature_id: Uuid,
    /// Geometry position for points, pointer position for lines
    pub coordinates: LngLat,
    pub kind: FeatureKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub screen: ScreenPoint,
    pub lng_lat: LngLat,
    pub feature: Option<FeatureHit>,
    pub time_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    Pointer(PointerEvent),
    Key { key: String },
}

impl MapEvent {
    #[must_use]
    pub fn pointer(&self) -> Option<&PointerEvent> {
        match self {
            MapEvent::Pointer(pointer) => Some(pointer),
            MapEvent::Key { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Circle,
    Line,
}

impl LayerKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Circle => "circle",
            LayerKind::Line => "line",
        }
    }

    /// Paint property holding the feature color
    #[must_use]
    pub fn color_property(self) -> &'static str {
        match self {
            LayerKind::Circle => "circle-color",
            LayerKind::Line => "line-color",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub kind: LayerKind,
    pub filter: Option<serde_json::Value>,
    pub paint: serde_json::Map<String, serde_json::Value>,
}

impl LayerSpec {
    #[must_use]
    pub fn new(id: &str, source: &str, kind: LayerKind) -> Self {
        Self {
            id: id.to_string(),
            source: source.to_string(),
            kind,
            filter: None,
            paint: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: serde_json::Value) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_paint(mut self, property: &str, value: serde_json::Value) -> Self {
        self.paint.insert(property.to_string(), value);
        self
    }

    #[must_use]
    pub fn with_color(self, value: serde_json::Value) -> Self {
        let property = self.kind.color_property();
        self.with_paint(property, value)
    }

    /// Layer definition in the map library's style format
    #[must_use]
    pub fn to_style_json(&self) -> serde_json::Value {
        let mut layer = serde_json::json!({
            "id": self.id,
            "type": self.kind.as_str(),
            "source": self.source,
            "paint": self.paint,
        });
        if let Some(filter) = &self.filter {
            layer["filter"] = filter.clone();
        }
        layer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
    Crosshair,
    Grabbing,
    Wait,
}

impl Cursor {
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "",
            Cursor::Pointer => "pointer",
            Cursor::Crosshair => "crosshair",
            Cursor::Grabbing => "grabbing",
            Cursor::Wait => "wait",
        }
    }
}

/// Stateful, queryable, event-emitting map surface driven by the controller.
///
/// Removing a listener, layer or source that does not exist is a no-op.
pub trait MapSurface {
    fn has_source(&self, id: &str) -> bool;
    fn has_layer(&self, id: &str) -> bool;

    fn add_source(&mut self, id: &str, data: FeatureCollection);
    /// Replace the whole data of a source
    fn set_data(&mut self, source_id: &str, data: FeatureCollection);
    fn remove_source(&mut self, id: &str);

    fn add_layer(&mut self, layer: LayerSpec);
    fn remove_layer(&mut self, id: &str);
    fn set_paint_property(&mut self, layer_id: &str, property: &str, value: serde_json::Value);

    /// Register a listener; `layer` restricts it to features of that layer
    fn on(&mut self, kind: MapEventKind, layer: Option<&str>) -> ListenerId;
    fn off(&mut self, listener: ListenerId);

    fn set_cursor(&mut self, cursor: Cursor);
    /// Enable or disable panning the map by dragging
    fn set_drag_pan(&mut self, enabled: bool);
}

/// An empty feature collection, used to clear preview sources
#[must_use]
pub fn empty_collection() -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: Vec::new(),
        foreign_members: None,
    }
}
