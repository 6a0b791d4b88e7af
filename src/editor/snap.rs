use crate::geometry::LngLat;
use crate::models::NodeCategory;
use uuid::Uuid;

/// A node the pointer is hovering, or a draft endpoint bound to a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRef {
    pub node_id: Uuid,
    pub coordinates: LngLat,
    pub category: NodeCategory,
}

/// Tracks the node feature currently under the pointer.
///
/// Holds at most one entry; the latest enter event wins. Only pointer
/// enter/leave handlers write to it.
#[derive(Debug, Default)]
pub struct SnapRegistry {
    current: Option<NodeRef>,
}

impl SnapRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Option<NodeRef> {
        self.current
    }

    pub(crate) fn enter(&mut self, node: NodeRef) {
        self.current = Some(node);
    }

    pub(crate) fn leave(&mut self) {
        self.current = None;
    }
}
