//! Mode-driven editing of the trail network on a map surface.

mod auto_route;
mod bindings;
mod builder;
mod completion;
mod controller;
mod draft;
mod error;
mod events;
mod mode;
mod node_edit;
mod snap;
pub mod surface;

#[cfg(test)]
pub(crate) mod test_support;

pub use auto_route::{AutoRouteDirector, Selection};
pub use bindings::{Binding, BindingRegistry, Handler};
pub use builder::{line_collection, point_collection};
pub use completion::{CompletionChoice, CompletionState};
pub use controller::{
    Dispatch, ModeController, NodeFormRequest, PendingSave, RouteRequest, SaveOutcome, SegmentFormRequest, Ticket,
};
pub use draft::{Draft, DraftOrigin, PointAdded};
pub use error::{EditorError, TransitionError, UserSequenceError};
pub use events::{ContextMenuRequest, EditorEvent, NodePrefill, Notice, NoticeLevel, SegmentPrefill};
pub use mode::EditorMode;
pub use snap::{NodeRef, SnapRegistry};
pub use surface::{Cursor, FeatureHit, FeatureKind, ListenerId, MapEvent, MapEventKind, MapSurface};
