use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditorMode {
    /// Browsing: context menu, hover highlights, node dragging
    #[default]
    Normal,
    /// Drawing a segment by hand
    Edit,
    /// Picking two nodes to link with a computed route
    AutoSegment,
}

impl std::fmt::Display for EditorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorMode::Normal => write!(f, "NORMAL"),
            EditorMode::Edit => write!(f, "EDIT"),
            EditorMode::AutoSegment => write!(f, "AUTO_SEGMENT"),
        }
    }
}

impl EditorMode {
    /// Whether the controller accepts a transition from `self` to `to`.
    ///
    /// Re-entering the current mode is allowed and rebuilds it from scratch.
    #[must_use]
    pub fn can_transition_to(self, to: EditorMode) -> bool {
        match (self, to) {
            (EditorMode::Normal, _) | (_, EditorMode::Normal) => true,
            (from, to) => from == to,
        }
    }
}
