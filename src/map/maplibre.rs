use super::feature_hit;
use crate::editor::surface::{LayerSpec, PointerEvent, ScreenPoint};
use crate::editor::{Cursor, ListenerId, MapEvent, MapEventKind, MapSurface};
use crate::geometry::LngLat;
use crate::logging::log;
use geojson::{Feature, FeatureCollection};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = maplibregl, js_name = Map)]
    pub type MapLibreMap;

    #[wasm_bindgen(constructor, js_namespace = maplibregl, js_class = "Map")]
    pub fn new(options: &JsValue) -> MapLibreMap;

    /// Run `listener` the next time `event` fires, e.g. `"load"`
    #[wasm_bindgen(method)]
    pub fn once(this: &MapLibreMap, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = getSource)]
    fn get_source(this: &MapLibreMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, js_name = getLayer)]
    fn get_layer(this: &MapLibreMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, js_name = addSource)]
    fn add_source(this: &MapLibreMap, id: &str, source: &JsValue);

    #[wasm_bindgen(method, js_name = removeSource)]
    fn remove_source(this: &MapLibreMap, id: &str);

    #[wasm_bindgen(method, js_name = addLayer)]
    fn add_layer(this: &MapLibreMap, layer: &JsValue);

    #[wasm_bindgen(method, js_name = removeLayer)]
    fn remove_layer(this: &MapLibreMap, id: &str);

    #[wasm_bindgen(method, js_name = setPaintProperty)]
    fn set_paint_property(this: &MapLibreMap, layer: &str, name: &str, value: &JsValue);

    #[wasm_bindgen(method, js_name = on)]
    fn on_map(this: &MapLibreMap, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = on)]
    fn on_layer(this: &MapLibreMap, event: &str, layer: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = off)]
    fn off_map(this: &MapLibreMap, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = off)]
    fn off_layer(this: &MapLibreMap, event: &str, layer: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = getCanvas)]
    fn get_canvas(this: &MapLibreMap) -> web_sys::HtmlCanvasElement;

    #[wasm_bindgen(method, getter, js_name = dragPan)]
    fn drag_pan(this: &MapLibreMap) -> DragPanHandler;

    type DragPanHandler;

    #[wasm_bindgen(method)]
    fn enable(this: &DragPanHandler);

    #[wasm_bindgen(method)]
    fn disable(this: &DragPanHandler);

    type GeoJsonSource;

    #[wasm_bindgen(method, js_name = setData)]
    fn set_data(this: &GeoJsonSource, data: &JsValue);
}

type Forward = Rc<dyn Fn(ListenerId, MapEvent)>;

enum Callback {
    Map(Closure<dyn FnMut(JsValue)>),
    Document(Closure<dyn FnMut(web_sys::KeyboardEvent)>),
}

struct Registered {
    kind: MapEventKind,
    layer: Option<String>,
    callback: Callback,
}

/// [`MapSurface`] over a MapLibre GL map.
///
/// Every registered listener forwards its events, tagged with its id, to the
/// function installed with [`MapLibreSurface::connect`].
pub struct MapLibreSurface {
    map: MapLibreMap,
    forward: Rc<RefCell<Option<Forward>>>,
    listeners: HashMap<ListenerId, Registered>,
    next_id: u64,
}

impl MapLibreSurface {
    #[must_use]
    pub fn new(map: MapLibreMap) -> Self {
        Self {
            map,
            forward: Rc::new(RefCell::new(None)),
            listeners: HashMap::new(),
            next_id: 0,
        }
    }

    /// Install the receiver of every event caught by this surface's listeners
    pub fn connect(&self, forward: impl Fn(ListenerId, MapEvent) + 'static) {
        *self.forward.borrow_mut() = Some(Rc::new(forward));
    }

    fn forwarder(&self, listener: ListenerId) -> impl Fn(MapEvent) + 'static {
        let forward = self.forward.clone();
        move |event| {
            // released before calling so the receiver may touch the surface
            let receiver = forward.borrow().clone();
            if let Some(receiver) = receiver {
                receiver(listener, event);
            }
        }
    }
}

fn to_js(value: &serde_json::Value) -> Option<JsValue> {
    let text = match serde_json::to_string(value) {
        Ok(text) => text,
        Err(e) => {
            leptos::logging::error!("Failed to encode map value: {}", e);
            return None;
        }
    };
    js_sys::JSON::parse(&text)
        .map_err(|e| leptos::logging::error!("Failed to hand value to the map: {:?}", e))
        .ok()
}

fn collection_to_js(data: &FeatureCollection) -> Option<JsValue> {
    match serde_json::to_value(data) {
        Ok(value) => to_js(&value),
        Err(e) => {
            leptos::logging::error!("Failed to encode features: {}", e);
            None
        }
    }
}

fn field(target: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

fn number(target: &JsValue, key: &str) -> Option<f64> {
    field(target, key)?.as_f64()
}

fn first_feature(event: &JsValue) -> Option<Feature> {
    let features: js_sys::Array = field(event, "features")?.dyn_into().ok()?;
    let text = js_sys::JSON::stringify(&features.get(0)).ok()?.as_string()?;
    serde_json::from_str(&text).ok()
}

/// Convert a MapLibre mouse or touch event
fn pointer_event(event: &JsValue, layer: Option<&str>) -> Option<MapEvent> {
    let point = field(event, "point")?;
    let position = field(event, "lngLat")?;
    let lng_lat = LngLat::new(number(&position, "lng")?, number(&position, "lat")?);
    let time_ms = field(event, "originalEvent")
        .and_then(|original| number(&original, "timeStamp"))
        .unwrap_or_else(js_sys::Date::now);
    let feature = layer.and_then(|layer| feature_hit(layer, &first_feature(event)?, lng_lat));
    Some(MapEvent::Pointer(PointerEvent {
        screen: ScreenPoint {
            x: number(&point, "x")?,
            y: number(&point, "y")?,
        },
        lng_lat,
        feature,
        time_ms,
    }))
}

impl MapSurface for MapLibreSurface {
    fn has_source(&self, id: &str) -> bool {
        !self.map.get_source(id).is_undefined()
    }

    fn has_layer(&self, id: &str) -> bool {
        !self.map.get_layer(id).is_undefined()
    }

    fn add_source(&mut self, id: &str, data: FeatureCollection) {
        let Some(data) = collection_to_js(&data) else {
            return;
        };
        let source = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&source, &"type".into(), &"geojson".into());
        let _ = js_sys::Reflect::set(&source, &"data".into(), &data);
        self.map.add_source(id, &source);
    }

    fn set_data(&mut self, source_id: &str, data: FeatureCollection) {
        let source = self.map.get_source(source_id);
        if source.is_undefined() {
            log!("No source {} to update", source_id);
            return;
        }
        if let Some(data) = collection_to_js(&data) {
            source.unchecked_into::<GeoJsonSource>().set_data(&data);
        }
    }

    fn remove_source(&mut self, id: &str) {
        if self.has_source(id) {
            self.map.remove_source(id);
        }
    }

    fn add_layer(&mut self, layer: LayerSpec) {
        if let Some(style) = to_js(&layer.to_style_json()) {
            self.map.add_layer(&style);
        }
    }

    fn remove_layer(&mut self, id: &str) {
        if self.has_layer(id) {
            self.map.remove_layer(id);
        }
    }

    fn set_paint_property(&mut self, layer_id: &str, property: &str, value: serde_json::Value) {
        if !self.has_layer(layer_id) {
            return;
        }
        if let Some(value) = to_js(&value) {
            self.map.set_paint_property(layer_id, property, &value);
        }
    }

    fn on(&mut self, kind: MapEventKind, layer: Option<&str>) -> ListenerId {
        let listener = ListenerId(self.next_id);
        self.next_id += 1;
        let forward = self.forwarder(listener);

        let callback = if kind == MapEventKind::KeyDown {
            let closure = Closure::wrap(Box::new(move |ev: web_sys::KeyboardEvent| {
                forward(MapEvent::Key { key: ev.key() });
            }) as Box<dyn FnMut(_)>);
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                let _ = document.add_event_listener_with_callback(kind.as_str(), closure.as_ref().unchecked_ref());
            }
            Callback::Document(closure)
        } else {
            let layer_for_event = layer.map(str::to_string);
            let closure = Closure::wrap(Box::new(move |ev: JsValue| {
                if let Some(event) = pointer_event(&ev, layer_for_event.as_deref()) {
                    forward(event);
                }
            }) as Box<dyn FnMut(_)>);
            let function: &js_sys::Function = closure.as_ref().unchecked_ref();
            match layer {
                Some(layer) => self.map.on_layer(kind.as_str(), layer, function),
                None => self.map.on_map(kind.as_str(), function),
            }
            Callback::Map(closure)
        };

        self.listeners.insert(
            listener,
            Registered {
                kind,
                layer: layer.map(str::to_string),
                callback,
            },
        );
        listener
    }

    fn off(&mut self, listener: ListenerId) {
        let Some(registered) = self.listeners.remove(&listener) else {
            return;
        };
        let event = registered.kind.as_str();
        match &registered.callback {
            Callback::Map(closure) => {
                let function: &js_sys::Function = closure.as_ref().unchecked_ref();
                match &registered.layer {
                    Some(layer) => self.map.off_layer(event, layer, function),
                    None => self.map.off_map(event, function),
                }
            }
            Callback::Document(closure) => {
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    let _ = document.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
                }
            }
        }
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        let _ = self.map.get_canvas().style().set_property("cursor", cursor.as_css());
    }

    fn set_drag_pan(&mut self, enabled: bool) {
        let handler = self.map.drag_pan();
        if enabled {
            handler.enable();
        } else {
            handler.disable();
        }
    }
}
