use crate::constants::{LONG_TEXT_MIN_CHARS, SHORT_TEXT_MIN_CHARS};
use crate::geometry::LngLat;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeCategory {
    Crossroad,
    Destination,
    PointOfInterest,
    PointOfInterestDestination,
    Indication,
}

impl NodeCategory {
    pub const ALL: [NodeCategory; 5] = [
        NodeCategory::Crossroad,
        NodeCategory::Destination,
        NodeCategory::PointOfInterest,
        NodeCategory::PointOfInterestDestination,
        NodeCategory::Indication,
    ];

    /// Name used in feature properties and layer filters
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NodeCategory::Crossroad => "crossroad",
            NodeCategory::Destination => "destination",
            NodeCategory::PointOfInterest => "point-of-interest",
            NodeCategory::PointOfInterestDestination => "point-of-interest-destination",
            NodeCategory::Indication => "indication",
        }
    }

    /// Circle layer rendering the nodes of this category
    #[must_use]
    pub fn layer_id(self) -> &'static str {
        match self {
            NodeCategory::Crossroad => "nodes-crossroad",
            NodeCategory::Destination => "nodes-destination",
            NodeCategory::PointOfInterest => "nodes-point-of-interest",
            NodeCategory::PointOfInterestDestination => "nodes-point-of-interest-destination",
            NodeCategory::Indication => "nodes-indication",
        }
    }

    #[must_use]
    pub fn from_layer_id(layer_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.layer_id() == layer_id)
    }

    /// Categories that can be picked as endpoints of an auto-routed segment
    #[must_use]
    pub fn is_routable(self) -> bool {
        matches!(self, NodeCategory::Crossroad | NodeCategory::Destination)
    }

    /// Points of interest must carry a description in every language
    #[must_use]
    pub fn requires_descriptions(self) -> bool {
        matches!(
            self,
            NodeCategory::PointOfInterest | NodeCategory::PointOfInterestDestination
        )
    }
}

/// Radius of the proximity trigger around a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(into = "u32", try_from = "u32")]
pub enum GeofenceRadius {
    Meters10,
    #[default]
    Meters25,
    Meters50,
    Meters100,
}

impl GeofenceRadius {
    pub const ALL: [GeofenceRadius; 4] = [
        GeofenceRadius::Meters10,
        GeofenceRadius::Meters25,
        GeofenceRadius::Meters50,
        GeofenceRadius::Meters100,
    ];

    #[must_use]
    pub fn meters(self) -> u32 {
        match self {
            GeofenceRadius::Meters10 => 10,
            GeofenceRadius::Meters25 => 25,
            GeofenceRadius::Meters50 => 50,
            GeofenceRadius::Meters100 => 100,
        }
    }
}

impl From<GeofenceRadius> for u32 {
    fn from(value: GeofenceRadius) -> Self {
        value.meters()
    }
}

impl TryFrom<u32> for GeofenceRadius {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(GeofenceRadius::Meters10),
            25 => Ok(GeofenceRadius::Meters25),
            50 => Ok(GeofenceRadius::Meters50),
            100 => Ok(GeofenceRadius::Meters100),
            other => Err(format!("unsupported geofence radius: {other} m")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    It,
    En,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::It, Language::En];
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::It => write!(f, "Italian"),
            Language::En => write!(f, "English"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Description {
    pub short_text: String,
    pub long_text: String,
}

/// Attributes collected by the node form
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAttributes {
    pub category: NodeCategory,
    pub display_name: String,
    pub geofence_radius: GeofenceRadius,
    pub descriptions: IndexMap<Language, Description>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: Uuid,
    pub sequence_id: u32,
    pub category: NodeCategory,
    pub coordinates: LngLat,
    #[serde(rename = "geofenceRadiusMeters")]
    pub geofence_radius: GeofenceRadius,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub descriptions: IndexMap<Language, Description>,
}

impl Node {
    /// Build a node from submitted form attributes
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the attributes fail [`Node::validate`]
    pub fn from_attributes(
        id: Uuid,
        sequence_id: u32,
        coordinates: LngLat,
        attributes: NodeAttributes,
    ) -> Result<Self, ValidationError> {
        let node = Self {
            id,
            sequence_id,
            category: attributes.category,
            coordinates,
            geofence_radius: attributes.geofence_radius,
            display_name: attributes.display_name.trim().to_string(),
            descriptions: attributes.descriptions,
        };
        node.validate()?;
        Ok(node)
    }

    /// Check the invariants a node must satisfy before it is persisted
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.display_name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !self.coordinates.lon.is_finite() || !self.coordinates.lat.is_finite() {
            return Err(ValidationError::NonFiniteCoordinate);
        }
        if !self.category.requires_descriptions() {
            return Ok(());
        }

        for language in Language::ALL {
            let Some(description) = self.descriptions.get(&language) else {
                return Err(ValidationError::MissingDescription { language });
            };
            if description.short_text.trim().chars().count() < SHORT_TEXT_MIN_CHARS {
                return Err(ValidationError::ShortTextTooShort {
                    language,
                    min: SHORT_TEXT_MIN_CHARS,
                });
            }
            if description.long_text.trim().chars().count() < LONG_TEXT_MIN_CHARS {
                return Err(ValidationError::LongTextTooShort {
                    language,
                    min: LONG_TEXT_MIN_CHARS,
                });
            }
        }
        Ok(())
    }
}
