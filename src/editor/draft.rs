use crate::geometry::{end_bearing, path_length_meters, start_bearing, LngLat};
use crate::models::{DerivedAttributes, Segment, SegmentAttributes, ValidationError};
use uuid::Uuid;

use super::error::UserSequenceError;
use super::snap::NodeRef;

/// How a draft came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftOrigin {
    /// Clicked vertex by vertex in EDIT mode
    Manual,
    /// Built from a routing result between two selected nodes
    Routed,
}

/// Result of appending a vertex to a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointAdded {
    /// Bound `snap1`
    Start,
    /// Free vertex between the endpoints
    Interior,
    /// Bound `snap2`: the draft is now completable
    End,
}

/// The segment under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    vertices: Vec<LngLat>,
    snap1: Option<NodeRef>,
    snap2: Option<NodeRef>,
    origin: DraftOrigin,
}

impl Default for Draft {
    fn default() -> Self {
        Self::new()
    }
}

impl Draft {
    #[must_use]
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            snap1: None,
            snap2: None,
            origin: DraftOrigin::Manual,
        }
    }

    /// Draft pre-populated from a routed polyline, both ends already bound.
    ///
    /// The polyline is kept verbatim: its ends are where the router placed
    /// them, which may differ slightly from the node positions.
    ///
    /// # Errors
    ///
    /// Returns an error if the polyline has fewer than two vertices or
    /// contains non-finite coordinates
    pub fn from_route(start: NodeRef, end: NodeRef, polyline: Vec<LngLat>) -> Result<Self, ValidationError> {
        if polyline.len() < 2 {
            return Err(ValidationError::TooFewVertices { count: polyline.len() });
        }
        if polyline.iter().any(|v| !v.lon.is_finite() || !v.lat.is_finite()) {
            return Err(ValidationError::NonFiniteCoordinate);
        }
        Ok(Self {
            vertices: polyline,
            snap1: Some(start),
            snap2: Some(end),
            origin: DraftOrigin::Routed,
        })
    }

    #[must_use]
    pub fn vertices(&self) -> &[LngLat] {
        &self.vertices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[must_use]
    pub fn snap1(&self) -> Option<NodeRef> {
        self.snap1
    }

    #[must_use]
    pub fn snap2(&self) -> Option<NodeRef> {
        self.snap2
    }

    #[must_use]
    pub fn origin(&self) -> DraftOrigin {
        self.origin
    }

    /// Both endpoints are bound to nodes
    #[must_use]
    pub fn is_completable(&self) -> bool {
        self.snap1.is_some() && self.snap2.is_some()
    }

    /// Append a vertex for a click at `pointer`, snapping to `snap` if the
    /// pointer is over a node.
    ///
    /// # Errors
    ///
    /// - `DraftConcluded` if both endpoints are already bound
    /// - `MustStartOnNode` if the first click is not on a node
    /// - `DegenerateSegment` if the end snap is the start node with nothing in between
    pub fn add_point(&mut self, snap: Option<NodeRef>, pointer: LngLat) -> Result<PointAdded, UserSequenceError> {
        if self.is_completable() {
            return Err(UserSequenceError::DraftConcluded);
        }

        match (snap, self.snap1) {
            (Some(node), None) => {
                self.snap1 = Some(node);
                self.vertices.push(node.coordinates);
                Ok(PointAdded::Start)
            }
            (Some(node), Some(start)) => {
                if start.node_id == node.node_id && self.vertices.len() < 2 {
                    return Err(UserSequenceError::DegenerateSegment);
                }
                self.snap2 = Some(node);
                self.vertices.push(node.coordinates);
                Ok(PointAdded::End)
            }
            (None, None) => Err(UserSequenceError::MustStartOnNode),
            (None, Some(_)) => {
                self.vertices.push(pointer);
                Ok(PointAdded::Interior)
            }
        }
    }

    /// Remove the most recently added vertex, unbinding the endpoint it
    /// belonged to.
    ///
    /// # Errors
    ///
    /// Returns `NothingToCancel` on an empty draft
    pub fn remove_last_point(&mut self) -> Result<LngLat, UserSequenceError> {
        let removed = self.vertices.pop().ok_or(UserSequenceError::NothingToCancel)?;
        if self.snap2.take().is_none() && self.vertices.is_empty() {
            self.snap1 = None;
        }
        Ok(removed)
    }

    /// Length and bearings of the current vertex chain
    #[must_use]
    pub fn derive(&self) -> Option<DerivedAttributes> {
        Some(DerivedAttributes {
            length_meters: path_length_meters(&self.vertices),
            start_bearing_degrees: start_bearing(&self.vertices)?,
            end_bearing_degrees: end_bearing(&self.vertices)?,
        })
    }

    /// Turn a completable draft into a segment record
    ///
    /// # Errors
    ///
    /// Returns `NotCompletable` if an endpoint is unbound, or a validation
    /// error if the resulting segment is invalid
    pub fn to_segment(
        &self,
        id: Uuid,
        backend_id: u64,
        attributes: SegmentAttributes,
    ) -> Result<Segment, super::error::EditorError> {
        let (Some(start), Some(end)) = (self.snap1, self.snap2) else {
            return Err(UserSequenceError::NotCompletable.into());
        };
        let derived = self.derive().ok_or(ValidationError::TooFewVertices {
            count: self.vertices.len(),
        })?;
        let segment = Segment {
            id,
            backend_id,
            name: attributes.name.trim().to_string(),
            vertices: self.vertices.clone(),
            category: attributes.category,
            surface_condition: attributes.surface_condition,
            length_meters: derived.length_meters,
            start_bearing_degrees: derived.start_bearing_degrees,
            end_bearing_degrees: derived.end_bearing_degrees,
            start_node_id: start.node_id,
            end_node_id: end.node_id,
        };
        segment.validate()?;
        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeCategory, SegmentCategory, SurfaceCondition};

    fn node(lon: f64, lat: f64, category: NodeCategory) -> NodeRef {
        NodeRef {
            node_id: Uuid::new_v4(),
            coordinates: LngLat::new(lon, lat),
            category,
        }
    }

    fn attributes() -> SegmentAttributes {
        SegmentAttributes {
            name: "Ridge".to_string(),
            category: SegmentCategory::Trail,
            surface_condition: SurfaceCondition::Unpaved,
        }
    }

    #[test]
    fn test_first_click_must_snap() {
        let mut draft = Draft::new();
        let result = draft.add_point(None, LngLat::new(9.0, 45.0));
        assert_eq!(result, Err(UserSequenceError::MustStartOnNode));
        assert!(draft.is_empty());
    }

    #[test]
    fn test_snapped_vertex_uses_node_coordinates() {
        let mut draft = Draft::new();
        let start = node(9.1, 44.9, NodeCategory::Crossroad);
        // pointer slightly off the node: the vertex must be the node position
        draft.add_point(Some(start), LngLat::new(9.1001, 44.9002)).expect("snap");
        assert_eq!(draft.vertices(), &[start.coordinates]);
        assert_eq!(draft.snap1(), Some(start));
    }

    #[test]
    fn test_draw_scenario() {
        let mut draft = Draft::new();
        let x = node(9.1, 44.9, NodeCategory::Crossroad);
        let y = node(9.12, 44.92, NodeCategory::Destination);

        assert_eq!(draft.add_point(Some(x), x.coordinates), Ok(PointAdded::Start));
        assert_eq!(draft.add_point(None, LngLat::new(9.11, 44.91)), Ok(PointAdded::Interior));
        assert!(!draft.is_completable());
        assert_eq!(draft.add_point(Some(y), y.coordinates), Ok(PointAdded::End));

        assert!(draft.is_completable());
        assert_eq!(
            draft.vertices(),
            &[LngLat::new(9.1, 44.9), LngLat::new(9.11, 44.91), LngLat::new(9.12, 44.92)]
        );
        assert_eq!(draft.vertices().first(), Some(&x.coordinates));
        assert_eq!(draft.vertices().last(), Some(&y.coordinates));
    }

    #[test]
    fn test_click_after_conclusion_rejected_without_mutation() {
        let mut draft = Draft::new();
        let x = node(9.0, 45.0, NodeCategory::Crossroad);
        let y = node(9.01, 45.0, NodeCategory::Crossroad);
        let z = node(9.02, 45.0, NodeCategory::Destination);
        draft.add_point(Some(x), x.coordinates).expect("start");
        draft.add_point(Some(y), y.coordinates).expect("end");

        let before = draft.clone();
        assert_eq!(draft.add_point(Some(z), z.coordinates), Err(UserSequenceError::DraftConcluded));
        assert_eq!(draft.add_point(None, LngLat::new(1.0, 1.0)), Err(UserSequenceError::DraftConcluded));
        assert_eq!(draft, before);
    }

    #[test]
    fn test_end_on_start_node_needs_interior_vertex() {
        let mut draft = Draft::new();
        let x = node(9.0, 45.0, NodeCategory::Crossroad);
        draft.add_point(Some(x), x.coordinates).expect("start");
        assert_eq!(draft.add_point(Some(x), x.coordinates), Err(UserSequenceError::DegenerateSegment));

        draft.add_point(None, LngLat::new(9.01, 45.01)).expect("interior");
        assert_eq!(draft.add_point(Some(x), x.coordinates), Ok(PointAdded::End));
    }

    #[test]
    fn test_remove_last_point_unbinds_end() {
        let mut draft = Draft::new();
        let x = node(9.0, 45.0, NodeCategory::Crossroad);
        let y = node(9.01, 45.0, NodeCategory::Crossroad);
        draft.add_point(Some(x), x.coordinates).expect("start");
        draft.add_point(None, LngLat::new(9.005, 45.001)).expect("interior");
        draft.add_point(Some(y), y.coordinates).expect("end");

        assert_eq!(draft.remove_last_point(), Ok(y.coordinates));
        assert_eq!(draft.snap2(), None);
        assert_eq!(draft.snap1(), Some(x));
        assert!(!draft.is_completable());

        // drawing resumes
        assert_eq!(draft.add_point(Some(y), y.coordinates), Ok(PointAdded::End));
    }

    #[test]
    fn test_remove_interior_keeps_start() {
        let mut draft = Draft::new();
        let x = node(9.0, 45.0, NodeCategory::Crossroad);
        draft.add_point(Some(x), x.coordinates).expect("start");
        draft.add_point(None, LngLat::new(9.005, 45.001)).expect("interior");

        draft.remove_last_point().expect("interior removed");
        assert_eq!(draft.snap1(), Some(x));
        assert_eq!(draft.len(), 1);
    }

    #[test]
    fn test_remove_start_unbinds_start() {
        let mut draft = Draft::new();
        let x = node(9.0, 45.0, NodeCategory::Crossroad);
        draft.add_point(Some(x), x.coordinates).expect("start");

        draft.remove_last_point().expect("start removed");
        assert_eq!(draft.snap1(), None);
        assert_eq!(draft.remove_last_point(), Err(UserSequenceError::NothingToCancel));
    }

    #[test]
    fn test_route_draft_keeps_polyline() {
        let a = node(9.0, 45.0, NodeCategory::Crossroad);
        let b = node(9.02, 45.01, NodeCategory::Destination);
        let polyline = vec![LngLat::new(9.0001, 45.0), LngLat::new(9.01, 45.005), LngLat::new(9.0199, 45.01)];

        let draft = Draft::from_route(a, b, polyline.clone()).expect("valid route");
        assert_eq!(draft.vertices(), polyline.as_slice());
        assert_eq!(draft.snap1(), Some(a));
        assert_eq!(draft.snap2(), Some(b));
        assert_eq!(draft.origin(), DraftOrigin::Routed);
        assert!(draft.is_completable());
    }

    #[test]
    fn test_route_draft_needs_two_points() {
        let a = node(9.0, 45.0, NodeCategory::Crossroad);
        let b = node(9.02, 45.01, NodeCategory::Destination);
        let result = Draft::from_route(a, b, vec![LngLat::new(9.0, 45.0)]);
        assert_eq!(result, Err(ValidationError::TooFewVertices { count: 1 }));
    }

    #[test]
    fn test_to_segment_carries_derived_values() {
        let mut draft = Draft::new();
        let x = node(9.0, 45.0, NodeCategory::Crossroad);
        let y = node(9.01, 45.0, NodeCategory::Destination);
        draft.add_point(Some(x), x.coordinates).expect("start");
        draft.add_point(Some(y), y.coordinates).expect("end");

        let id = Uuid::new_v4();
        let segment = draft.to_segment(id, 42, attributes()).expect("valid segment");
        let derived = draft.derive().expect("two vertices");

        assert_eq!(segment.id, id);
        assert_eq!(segment.backend_id, 42);
        assert_eq!(segment.start_node_id, x.node_id);
        assert_eq!(segment.end_node_id, y.node_id);
        assert_eq!(segment.length_meters, derived.length_meters);
        assert!((segment.start_bearing_degrees - 90.0).abs() < 0.1);
        assert!((segment.end_bearing_degrees - 270.0).abs() < 0.1);
    }

    #[test]
    fn test_to_segment_requires_completable() {
        let mut draft = Draft::new();
        let x = node(9.0, 45.0, NodeCategory::Crossroad);
        draft.add_point(Some(x), x.coordinates).expect("start");
        let result = draft.to_segment(Uuid::new_v4(), 1, attributes());
        assert_eq!(result, Err(UserSequenceError::NotCompletable.into()));
    }
}
