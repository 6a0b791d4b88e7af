/// Source holding every network node as a point feature
pub const NODES_SOURCE: &str = "trail-nodes";

/// Source holding every network segment as a line feature
pub const SEGMENTS_SOURCE: &str = "trail-segments";

/// Line layer rendering the network segments
pub const SEGMENTS_LAYER: &str = "trail-segments-line";

/// Preview of the draft segment (ordered vertices as a line)
pub const DRAFT_LINE_SOURCE: &str = "draft-line";
pub const DRAFT_LINE_LAYER: &str = "draft-line-layer";

/// Preview of the draft segment vertices (one point per vertex)
pub const DRAFT_POINTS_SOURCE: &str = "draft-points";
pub const DRAFT_POINTS_LAYER: &str = "draft-points-layer";

/// Position of a node while it is being dragged in NORMAL mode
pub const DRAG_PREVIEW_SOURCE: &str = "node-drag-preview";
pub const DRAG_PREVIEW_LAYER: &str = "node-drag-preview-layer";

/// Backend event names: save request and its acknowledgment, per record type
pub const SAVE_NODE_EVENT: &str = "saveCrossRoad";
pub const NODE_SAVED_EVENT: &str = "crossRoadSaved";
pub const SAVE_SEGMENT_EVENT: &str = "saveSegment";
pub const SEGMENT_SAVED_EVENT: &str = "segmentSaved";

/// Request for every stored node and segment, and its reply
pub const LIST_NETWORK_EVENT: &str = "listNetwork";
pub const NETWORK_LISTED_EVENT: &str = "networkListed";

/// Default acknowledgment timeout for a save round-trip
pub const DEFAULT_SAVE_TIMEOUT_MS: u64 = 10_000;

/// Default hold duration before a touch counts as a long press
pub const DEFAULT_LONG_PRESS_MS: u64 = 500;

/// Minimum lengths of point-of-interest descriptions (characters)
pub const SHORT_TEXT_MIN_CHARS: usize = 5;
pub const LONG_TEXT_MIN_CHARS: usize = 20;

/// User-facing message for a click on an already concluded draft
pub const DRAFT_CONCLUDED_MESSAGE: &str =
    "Segment already concluded: save it or cancel a sub-point first";

/// Caveat attached to a save timeout
pub const SAVE_TIMEOUT_CAVEAT: &str =
    "The server did not answer in time. The record may have been saved anyway; reload before retrying.";

/// Finger travel (screen pixels) that turns a press into a pan
pub const LONG_PRESS_TOLERANCE_PX: f64 = 10.0;
