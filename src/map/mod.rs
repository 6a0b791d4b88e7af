//! Browser map adapter.

#[cfg(target_arch = "wasm32")]
mod maplibre;

#[cfg(target_arch = "wasm32")]
pub use maplibre::{MapLibreMap, MapLibreSurface};

use crate::constants::SEGMENTS_LAYER;
use crate::editor::{FeatureHit, FeatureKind};
use crate::geometry::LngLat;
use crate::models::NodeCategory;
use geojson::{Feature, Value};
use uuid::Uuid;

/// Resolve a rendered feature of `layer_id` into what the editor knows about it.
///
/// Points report their own position; lines report the pointer position.
/// Features of layers the editor does not own yield `None`.
#[must_use]
pub fn feature_hit(layer_id: &str, feature: &Feature, pointer: LngLat) -> Option<FeatureHit> {
    let kind = if layer_id == SEGMENTS_LAYER {
        FeatureKind::Segment
    } else {
        FeatureKind::Node(NodeCategory::from_layer_id(layer_id)?)
    };
    let feature_id = feature
        .property("id")
        .and_then(serde_json::Value::as_str)
        .and_then(|id| Uuid::parse_str(id).ok())?;
    let coordinates = match feature.geometry.as_ref().map(|geometry| &geometry.value) {
        Some(Value::Point(position)) if position.len() >= 2 => LngLat::new(position[0], position[1]),
        _ => pointer,
    };
    Some(FeatureHit {
        layer_id: layer_id.to_string(),
        feature_id,
        coordinates,
        kind,
    })
}
