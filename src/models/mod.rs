mod id;
mod network;
mod node;
mod segment;
mod settings;
mod validation;

pub use id::{generate_backend_id, generate_feature_id};
pub use network::{NetworkError, TrailNetwork};
pub use node::{Description, GeofenceRadius, Language, Node, NodeAttributes, NodeCategory};
pub use segment::{DerivedAttributes, Segment, SegmentAttributes, SegmentCategory, SurfaceCondition};
pub use settings::{EditorSettings, PaintColors, RoutingSettings};
pub use validation::ValidationError;

pub use crate::geometry::LngLat;
