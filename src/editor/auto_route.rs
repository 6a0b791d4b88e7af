use crate::geometry::LngLat;
use crate::logging::log;
use crate::routing::RoutingError;

use super::completion::CompletionState;
use super::controller::{event_feature, Dispatch, ModeController, RouteRequest, SegmentFormRequest, Ticket};
use super::draft::Draft;
use super::error::UserSequenceError;
use super::events::{EditorEvent, Notice};
use super::mode::EditorMode;
use super::snap::NodeRef;
use super::surface::{Cursor, FeatureKind, MapEvent, MapSurface};

/// Effect of picking a node in AUTO_SEGMENT
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    Added,
    /// Repeat pick of a selected node; nothing changes
    AlreadySelected,
    /// The second node was picked: route between the two, in pick order
    Complete(NodeRef, NodeRef),
}

/// Node selection of AUTO_SEGMENT and its pending route request
#[derive(Debug, Default)]
pub struct AutoRouteDirector {
    selection: Vec<NodeRef>,
    pending: Option<Ticket>,
}

impl AutoRouteDirector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn selection(&self) -> &[NodeRef] {
        &self.selection
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn pending(&self) -> Option<Ticket> {
        self.pending
    }

    pub fn clear(&mut self) {
        self.selection.clear();
        self.pending = None;
    }

    /// Add `node` to the selection
    ///
    /// # Errors
    ///
    /// Returns `RouteLoading` while a route is being computed
    pub fn select(&mut self, node: NodeRef) -> Result<Selection, UserSequenceError> {
        if self.pending.is_some() {
            return Err(UserSequenceError::RouteLoading);
        }
        if self.selection.iter().any(|selected| selected.node_id == node.node_id) {
            return Ok(Selection::AlreadySelected);
        }
        self.selection.push(node);
        match self.selection.as_slice() {
            [from, to] => Ok(Selection::Complete(*from, *to)),
            _ => Ok(Selection::Added),
        }
    }

    fn start_loading(&mut self, ticket: Ticket) {
        self.pending = Some(ticket);
    }
}

impl<S: MapSurface> ModeController<S> {
    #[must_use]
    pub fn auto_selection(&self) -> &[NodeRef] {
        self.director.selection()
    }

    #[must_use]
    pub fn is_route_loading(&self) -> bool {
        self.director.is_loading()
    }

    pub(super) fn route_node_click(&mut self, event: &MapEvent) -> Dispatch {
        let Some(node) = event_feature(event)
            .filter(|hit| matches!(hit.kind, FeatureKind::Node(category) if category.is_routable()))
            .and_then(|hit| self.node_ref_for(hit))
        else {
            return Dispatch::Ignored;
        };

        match self.director.select(node) {
            Err(e) => self.reject(e),
            Ok(Selection::AlreadySelected) => Dispatch::Handled,
            Ok(Selection::Added) => {
                self.paint_selection();
                Dispatch::Handled
            }
            Ok(Selection::Complete(from, to)) => {
                self.paint_selection();
                let ticket = self.issue_ticket();
                self.director.start_loading(ticket);
                self.surface.set_cursor(Cursor::Wait);
                self.emit(EditorEvent::RouteLoading(true));
                log!("Routing from {} to {}", from.node_id, to.node_id);
                Dispatch::RouteRequested(RouteRequest { ticket, from, to })
            }
        }
    }

    fn paint_selection(&mut self) {
        let ids: Vec<_> = self.director.selection().iter().map(|node| node.node_id).collect();
        let color = self.settings.colors.node_selected.clone();
        self.paint_nodes(&ids, Some(color.as_str()));
        self.emit(EditorEvent::SelectionChanged(ids));
    }

    pub(super) fn route_hover(&mut self, entering: bool) -> Dispatch {
        if self.director.is_loading() {
            return Dispatch::Ignored;
        }
        self.surface
            .set_cursor(if entering { Cursor::Pointer } else { Cursor::Default });
        Dispatch::Handled
    }

    pub(super) fn escape_key(&mut self, event: &MapEvent) -> Dispatch {
        match event {
            MapEvent::Key { key } if key == "Escape" => {
                self.transition(EditorMode::Normal);
                Dispatch::Handled
            }
            _ => Dispatch::Ignored,
        }
    }

    /// Apply the routing result for `ticket`.
    ///
    /// On success the controller is back in NORMAL with a routed draft
    /// waiting for its attribute form, which is returned. On failure it is
    /// back in NORMAL without a draft. Results for a superseded request are
    /// dropped.
    pub fn finish_route(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<LngLat>, RoutingError>,
    ) -> Option<SegmentFormRequest> {
        let live = self.mode == EditorMode::AutoSegment
            && ticket.epoch == self.epoch
            && self.director.pending() == Some(ticket);
        if !live {
            log!("Dropping route result of superseded request {}", ticket.id);
            return None;
        }
        let (from, to) = match self.director.selection() {
            [from, to] => (*from, *to),
            _ => return None,
        };

        let draft = result.and_then(|polyline| {
            Draft::from_route(from, to, polyline).map_err(RoutingError::InvalidRoute)
        });
        self.transition(EditorMode::Normal);

        match draft {
            Ok(draft) => {
                self.draft = Some(draft);
                self.redraw_preview();
                let prefill = self.segment_prefill()?;
                let ticket = self.issue_ticket();
                self.completion = CompletionState::AwaitingForm(ticket);
                Some(SegmentFormRequest { ticket, prefill })
            }
            Err(e) => {
                leptos::logging::warn!("Routing failed: {}", e);
                self.notify(Notice::error(e.to_string()));
                None
            }
        }
    }
}
