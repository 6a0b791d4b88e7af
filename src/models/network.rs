use crate::geometry::{end_bearing, path_length_meters, start_bearing, LngLat};
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject, Value};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use uuid::Uuid;

use super::node::Node;
use super::segment::Segment;

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    UnknownNode(Uuid),
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "segment references unknown node {id}"),
        }
    }
}

impl std::error::Error for NetworkError {}

/// In-memory trail network: nodes as graph vertices, segments as edges
/// from their start node to their end node.
#[derive(Debug, Clone, Default)]
pub struct TrailNetwork {
    graph: StableDiGraph<Node, Segment>,
    node_index: HashMap<Uuid, NodeIndex>,
    segment_index: HashMap<Uuid, EdgeIndex>,
}

impl TrailNetwork {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a network from previously loaded records
    ///
    /// # Errors
    ///
    /// Returns an error if a segment references a node that is not in `nodes`
    pub fn from_records(
        nodes: impl IntoIterator<Item = Node>,
        segments: impl IntoIterator<Item = Segment>,
    ) -> Result<Self, NetworkError> {
        let mut network = Self::new();
        for node in nodes {
            network.upsert_node(node);
        }
        for segment in segments {
            network.upsert_segment(segment)?;
        }
        Ok(network)
    }

    #[must_use]
    pub fn node(&self, id: Uuid) -> Option<&Node> {
        self.node_index.get(&id).and_then(|&idx| self.graph.node_weight(idx))
    }

    #[must_use]
    pub fn segment(&self, id: Uuid) -> Option<&Segment> {
        self.segment_index.get(&id).and_then(|&idx| self.graph.edge_weight(idx))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx))
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.graph
            .edge_indices()
            .filter_map(|idx| self.graph.edge_weight(idx))
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Sequence id for the next new node
    #[must_use]
    pub fn next_sequence_id(&self) -> u32 {
        self.nodes().map(|n| n.sequence_id).max().map_or(1, |max| max + 1)
    }

    /// Segments attached to a node, in either direction
    #[must_use]
    pub fn segments_at(&self, node_id: Uuid) -> Vec<&Segment> {
        let Some(&idx) = self.node_index.get(&node_id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|edge| edge.weight())
            .collect()
    }

    /// Insert a node, or replace the node with the same id.
    ///
    /// When a node moves, the endpoints of its segments follow it and their
    /// derived length and bearings are recomputed. Returns the replaced node.
    pub fn upsert_node(&mut self, node: Node) -> Option<Node> {
        let Some(&idx) = self.node_index.get(&node.id) else {
            let id = node.id;
            let idx = self.graph.add_node(node);
            self.node_index.insert(id, idx);
            return None;
        };

        let new_position = node.coordinates;
        let node_id = node.id;
        let previous = self.graph.node_weight_mut(idx).map(|slot| std::mem::replace(slot, node));

        if previous.as_ref().is_some_and(|p| p.coordinates != new_position) {
            self.move_segment_endpoints(idx, node_id, new_position);
        }
        previous
    }

    fn move_segment_endpoints(&mut self, idx: NodeIndex, node_id: Uuid, position: LngLat) {
        let attached: Vec<EdgeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|edge| edge.id())
            .collect();

        for edge in attached {
            let Some(segment) = self.graph.edge_weight_mut(edge) else {
                continue;
            };
            if segment.start_node_id == node_id {
                if let Some(first) = segment.vertices.first_mut() {
                    *first = position;
                }
            }
            if segment.end_node_id == node_id {
                if let Some(last) = segment.vertices.last_mut() {
                    *last = position;
                }
            }
            segment.length_meters = path_length_meters(&segment.vertices);
            if let Some(bearing) = start_bearing(&segment.vertices) {
                segment.start_bearing_degrees = bearing;
            }
            if let Some(bearing) = end_bearing(&segment.vertices) {
                segment.end_bearing_degrees = bearing;
            }
        }
    }

    /// Insert a segment, or replace the segment with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint node is not in the network
    pub fn upsert_segment(&mut self, segment: Segment) -> Result<Option<Segment>, NetworkError> {
        let start = *self
            .node_index
            .get(&segment.start_node_id)
            .ok_or(NetworkError::UnknownNode(segment.start_node_id))?;
        let end = *self
            .node_index
            .get(&segment.end_node_id)
            .ok_or(NetworkError::UnknownNode(segment.end_node_id))?;

        let previous = self
            .segment_index
            .remove(&segment.id)
            .and_then(|idx| self.graph.remove_edge(idx));

        let id = segment.id;
        let idx = self.graph.add_edge(start, end, segment);
        self.segment_index.insert(id, idx);
        Ok(previous)
    }

    /// Nodes as point features for the nodes source
    #[must_use]
    pub fn nodes_feature_collection(&self) -> FeatureCollection {
        let features = self
            .nodes()
            .map(|node| {
                let mut properties = JsonObject::new();
                properties.insert("id".to_string(), node.id.to_string().into());
                properties.insert("category".to_string(), node.category.as_str().into());
                properties.insert("name".to_string(), node.display_name.clone().into());
                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Point(node.coordinates.to_position()))),
                    id: Some(Id::String(node.id.to_string())),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    /// Segments as line features for the segments source
    #[must_use]
    pub fn segments_feature_collection(&self) -> FeatureCollection {
        let features = self
            .segments()
            .map(|segment| {
                let mut properties = JsonObject::new();
                properties.insert("id".to_string(), segment.id.to_string().into());
                properties.insert("name".to_string(), segment.name.clone().into());
                let line = segment.vertices.iter().map(|v| v.to_position()).collect();
                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::LineString(line))),
                    id: Some(Id::String(segment.id.to_string())),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}
