use crate::geometry::LngLat;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentCategory {
    #[default]
    Trail,
    Road,
    FieldTrack,
    LivestockTrack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceCondition {
    #[default]
    Unspecified,
    Unpaved,
    Paved,
    SecondaryRoad,
    PrimaryRoad,
}

impl SegmentCategory {
    pub const ALL: [SegmentCategory; 4] = [
        SegmentCategory::Trail,
        SegmentCategory::Road,
        SegmentCategory::FieldTrack,
        SegmentCategory::LivestockTrack,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SegmentCategory::Trail => "Trail",
            SegmentCategory::Road => "Road",
            SegmentCategory::FieldTrack => "Field track",
            SegmentCategory::LivestockTrack => "Livestock track",
        }
    }
}

impl SurfaceCondition {
    pub const ALL: [SurfaceCondition; 5] = [
        SurfaceCondition::Unspecified,
        SurfaceCondition::Unpaved,
        SurfaceCondition::Paved,
        SurfaceCondition::SecondaryRoad,
        SurfaceCondition::PrimaryRoad,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SurfaceCondition::Unspecified => "Unspecified",
            SurfaceCondition::Unpaved => "Unpaved",
            SurfaceCondition::Paved => "Paved",
            SurfaceCondition::SecondaryRoad => "Secondary road",
            SurfaceCondition::PrimaryRoad => "Primary road",
        }
    }
}

/// Attributes collected by the segment form
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentAttributes {
    pub name: String,
    pub category: SegmentCategory,
    pub surface_condition: SurfaceCondition,
}

/// Values computed from a draft's vertex chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedAttributes {
    pub length_meters: f64,
    pub start_bearing_degrees: f64,
    pub end_bearing_degrees: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: Uuid,
    pub backend_id: u64,
    pub name: String,
    pub vertices: Vec<LngLat>,
    pub category: SegmentCategory,
    pub surface_condition: SurfaceCondition,
    pub length_meters: f64,
    pub start_bearing_degrees: f64,
    pub end_bearing_degrees: f64,
    pub start_node_id: Uuid,
    pub end_node_id: Uuid,
}

impl Segment {
    /// Check the shape of a segment before it is persisted
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.vertices.len() < 2 {
            return Err(ValidationError::TooFewVertices {
                count: self.vertices.len(),
            });
        }
        let finite = |v: &LngLat| v.lon.is_finite() && v.lat.is_finite();
        if !self.vertices.iter().all(finite)
            || !self.length_meters.is_finite()
            || !self.start_bearing_degrees.is_finite()
            || !self.end_bearing_degrees.is_finite()
        {
            return Err(ValidationError::NonFiniteCoordinate);
        }
        if self.start_node_id == self.end_node_id && self.vertices.len() == 2 {
            return Err(ValidationError::SameEndpoints);
        }
        Ok(())
    }

    #[must_use]
    pub fn first_vertex(&self) -> Option<LngLat> {
        self.vertices.first().copied()
    }

    #[must_use]
    pub fn last_vertex(&self) -> Option<LngLat> {
        self.vertices.last().copied()
    }
}
