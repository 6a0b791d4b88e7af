use crate::geometry::LngLat;
use crate::models::Node;
use uuid::Uuid;

use super::draft::DraftOrigin;
use super::mode::EditorMode;
use super::surface::ScreenPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextMenuRequest {
    pub screen: ScreenPoint,
    pub coordinates: LngLat,
}

/// Values offered to the segment form for a completable draft
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPrefill {
    pub origin: DraftOrigin,
    pub vertex_count: usize,
    pub length_meters: f64,
    pub start_bearing_degrees: f64,
    pub end_bearing_degrees: f64,
    pub start_coordinates: LngLat,
    pub end_coordinates: LngLat,
    pub start_node_id: Uuid,
    pub end_node_id: Uuid,
}

/// Values offered to the node form
#[derive(Debug, Clone, PartialEq)]
pub struct NodePrefill {
    pub coordinates: LngLat,
    /// The node being edited, `None` for a new node
    pub existing: Option<Node>,
}

/// Notifications the controller produces for the surrounding UI
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ModeChanged { from: EditorMode, to: EditorMode },
    ContextMenu(ContextMenuRequest),
    Notice(Notice),
    /// Name of the hovered segment, `None` when the pointer leaves it
    HoverLabel(Option<String>),
    /// Nodes picked so far in AUTO_SEGMENT, in selection order
    SelectionChanged(Vec<Uuid>),
    RouteLoading(bool),
    /// A node or segment was merged into the network
    NetworkChanged,
}
