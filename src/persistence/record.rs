use crate::constants::{NODE_SAVED_EVENT, SAVE_NODE_EVENT, SAVE_SEGMENT_EVENT, SEGMENT_SAVED_EVENT};
use crate::models::{NetworkError, Node, Segment, TrailNetwork, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed record on its way to the backend
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Node(Node),
    Segment(Segment),
}

impl Record {
    #[must_use]
    pub fn id(&self) -> Uuid {
        match self {
            Record::Node(node) => node.id,
            Record::Segment(segment) => segment.id,
        }
    }

    /// Event carrying the save request
    #[must_use]
    pub fn save_event(&self) -> &'static str {
        match self {
            Record::Node(_) => SAVE_NODE_EVENT,
            Record::Segment(_) => SAVE_SEGMENT_EVENT,
        }
    }

    /// Event carrying the backend acknowledgment
    #[must_use]
    pub fn ack_event(&self) -> &'static str {
        match self {
            Record::Node(_) => NODE_SAVED_EVENT,
            Record::Segment(_) => SEGMENT_SAVED_EVENT,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Node(_) => "node",
            Record::Segment(_) => "segment",
        }
    }

    /// # Errors
    ///
    /// Returns the first violated constraint of the wrapped record
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Record::Node(node) => node.validate(),
            Record::Segment(segment) => segment.validate(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded as JSON
    pub fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Record::Node(node) => serde_json::to_value(node),
            Record::Segment(segment) => serde_json::to_value(segment),
        }
    }
}

/// Every stored record, as the backend lists them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkListing {
    pub nodes: Vec<Node>,
    pub segments: Vec<Segment>,
}

impl NetworkListing {
    /// # Errors
    ///
    /// Returns an error if a segment references a node missing from the listing
    pub fn into_network(self) -> Result<TrailNetwork, NetworkError> {
        TrailNetwork::from_records(self.nodes, self.segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::LngLat;
    use crate::models::{GeofenceRadius, NodeCategory};
    use indexmap::IndexMap;

    fn crossroad() -> Node {
        Node {
            id: Uuid::new_v4(),
            sequence_id: 1,
            category: NodeCategory::Crossroad,
            coordinates: LngLat::new(9.1, 44.9),
            geofence_radius: GeofenceRadius::Meters10,
            display_name: "Fork".to_string(),
            descriptions: IndexMap::new(),
        }
    }

    #[test]
    fn test_node_record_events() {
        let record = Record::Node(crossroad());
        assert_eq!(record.save_event(), "saveCrossRoad");
        assert_eq!(record.ack_event(), "crossRoadSaved");
        assert_eq!(record.kind(), "node");
    }

    #[test]
    fn test_payload_is_the_bare_record() {
        let node = crossroad();
        let payload = Record::Node(node.clone()).to_payload().expect("encode");
        assert_eq!(payload["id"], node.id.to_string());
        assert_eq!(payload["displayName"], "Fork");
    }

    #[test]
    fn test_validate_delegates() {
        let mut node = crossroad();
        node.display_name = String::new();
        assert_eq!(Record::Node(node).validate(), Err(ValidationError::EmptyName));
    }

    #[test]
    fn test_listing_missing_keys_default_to_empty() {
        let listing: NetworkListing = serde_json::from_value(serde_json::json!({ "nodes": [] })).expect("decode");
        assert_eq!(listing, NetworkListing::default());
        assert_eq!(listing.into_network().map(|n| n.node_count()), Ok(0));
    }

    #[test]
    fn test_listing_with_dangling_segment_is_rejected() {
        let node = crossroad();
        let listing = NetworkListing {
            nodes: Vec::new(),
            segments: vec![crate::editor::test_support::link(&node, &node, "Loop")],
        };
        assert_eq!(listing.into_network().map(|n| n.node_count()), Err(NetworkError::UnknownNode(node.id)));
    }
}
