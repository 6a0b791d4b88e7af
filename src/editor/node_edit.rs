use crate::constants::{DRAG_PREVIEW_SOURCE, LONG_PRESS_TOLERANCE_PX};
use crate::geometry::LngLat;
use crate::logging::log;
use crate::models::{generate_feature_id, NodeAttributes, Node};
use crate::persistence::{Record, SaveError};
use uuid::Uuid;

use super::builder::point_collection;
use super::controller::{event_feature, Dispatch, ModeController, NodeFormRequest, PendingSave, SaveOutcome, Ticket};
use super::error::{EditorError, TransitionError, UserSequenceError};
use super::events::{ContextMenuRequest, EditorEvent, NodePrefill, Notice};
use super::mode::EditorMode;
use super::surface::{empty_collection, Cursor, FeatureKind, MapEvent, MapSurface, ScreenPoint};

/// Pointer state of NORMAL mode
#[derive(Debug, Default)]
pub(super) struct Interaction {
    pub drag: Option<NodeDrag>,
    pub touch: Option<TouchPress>,
    pub hovered_segment: Option<Uuid>,
    pub hovered_node: Option<Uuid>,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct NodeDrag {
    node_id: Uuid,
    original: LngLat,
    current: LngLat,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct TouchPress {
    screen: ScreenPoint,
    coordinates: LngLat,
    started_ms: f64,
}

/// An open node form, and whether its record is being saved
#[derive(Debug, Clone)]
pub(super) struct NodeFormState {
    ticket: Ticket,
    prefill: NodePrefill,
    saving: bool,
}

impl<S: MapSurface> ModeController<S> {
    pub(super) fn open_context_menu(&mut self, event: &MapEvent) -> Dispatch {
        let Some(pointer) = event.pointer() else {
            return Dispatch::Ignored;
        };
        if self.interaction.drag.is_some() {
            return Dispatch::Ignored;
        }
        self.emit(EditorEvent::ContextMenu(ContextMenuRequest {
            screen: pointer.screen,
            coordinates: pointer.lng_lat,
        }));
        Dispatch::Handled
    }

    pub(super) fn long_press_start(&mut self, event: &MapEvent) -> Dispatch {
        let Some(pointer) = event.pointer() else {
            return Dispatch::Ignored;
        };
        self.interaction.touch = Some(TouchPress {
            screen: pointer.screen,
            coordinates: pointer.lng_lat,
            started_ms: pointer.time_ms,
        });
        Dispatch::Handled
    }

    pub(super) fn long_press_move(&mut self, event: &MapEvent) -> Dispatch {
        let (Some(pointer), Some(press)) = (event.pointer(), self.interaction.touch) else {
            return Dispatch::Ignored;
        };
        let dx = pointer.screen.x - press.screen.x;
        let dy = pointer.screen.y - press.screen.y;
        if dx.hypot(dy) > LONG_PRESS_TOLERANCE_PX {
            self.interaction.touch = None;
        }
        Dispatch::Handled
    }

    pub(super) fn long_press_end(&mut self, event: &MapEvent) -> Dispatch {
        let (Some(pointer), Some(press)) = (event.pointer(), self.interaction.touch.take()) else {
            return Dispatch::Ignored;
        };
        #[allow(clippy::cast_precision_loss)]
        let threshold = self.settings.long_press_ms as f64;
        if pointer.time_ms - press.started_ms < threshold {
            return Dispatch::Ignored;
        }
        self.emit(EditorEvent::ContextMenu(ContextMenuRequest {
            screen: press.screen,
            coordinates: press.coordinates,
        }));
        Dispatch::Handled
    }

    pub(super) fn segment_hover_enter(&mut self, event: &MapEvent) -> Dispatch {
        let Some(hit) = event_feature(event).filter(|hit| hit.kind == FeatureKind::Segment) else {
            return Dispatch::Ignored;
        };
        let id = hit.feature_id;
        let name = self
            .network
            .segment(id)
            .map(|segment| segment.name.clone())
            .unwrap_or_default();
        self.interaction.hovered_segment = Some(id);
        self.paint_segment_hover(Some(id));
        if self.interaction.drag.is_none() {
            self.surface.set_cursor(Cursor::Pointer);
        }
        self.emit(EditorEvent::HoverLabel(Some(name)));
        Dispatch::Handled
    }

    pub(super) fn segment_hover_leave(&mut self) -> Dispatch {
        if self.interaction.hovered_segment.take().is_none() {
            return Dispatch::Ignored;
        }
        self.paint_segment_hover(None);
        self.restore_normal_cursor();
        self.emit(EditorEvent::HoverLabel(None));
        Dispatch::Handled
    }

    pub(super) fn node_hover_enter(&mut self, event: &MapEvent) -> Dispatch {
        let Some(node) = event_feature(event).and_then(|hit| self.node_ref_for(hit)) else {
            return Dispatch::Ignored;
        };
        self.snap.enter(node);
        self.interaction.hovered_node = Some(node.node_id);
        if self.interaction.drag.is_none() {
            let color = self.settings.colors.node_hover.clone();
            self.paint_nodes(&[node.node_id], Some(color.as_str()));
            self.surface.set_cursor(Cursor::Pointer);
        }
        let label = self.node_label(node.node_id);
        self.emit(EditorEvent::HoverLabel(label));
        Dispatch::Handled
    }

    pub(super) fn node_hover_leave(&mut self) -> Dispatch {
        self.snap.leave();
        if self.interaction.hovered_node.take().is_none() {
            return Dispatch::Ignored;
        }
        if self.interaction.drag.is_none() {
            self.paint_nodes(&[], None);
            self.restore_normal_cursor();
        }
        self.emit(EditorEvent::HoverLabel(None));
        Dispatch::Handled
    }

    /// "Name (n segments)" for a stored node
    fn node_label(&self, node_id: Uuid) -> Option<String> {
        let node = self.network.node(node_id)?;
        let label = match self.network.segments_at(node_id).len() {
            0 => node.display_name.clone(),
            1 => format!("{} (1 segment)", node.display_name),
            n => format!("{} ({n} segments)", node.display_name),
        };
        Some(label)
    }

    fn restore_normal_cursor(&mut self) {
        let cursor = if self.interaction.drag.is_some() {
            Cursor::Grabbing
        } else if self.interaction.hovered_node.is_some() || self.interaction.hovered_segment.is_some() {
            Cursor::Pointer
        } else {
            Cursor::Default
        };
        self.surface.set_cursor(cursor);
    }

    pub(super) fn node_drag_start(&mut self, event: &MapEvent) -> Dispatch {
        if self.node_form.is_some() {
            return Dispatch::Ignored;
        }
        let Some(node) = event_feature(event).and_then(|hit| self.node_ref_for(hit)) else {
            return Dispatch::Ignored;
        };
        self.interaction.drag = Some(NodeDrag {
            node_id: node.node_id,
            original: node.coordinates,
            current: node.coordinates,
        });
        self.surface.set_drag_pan(false);
        self.surface.set_cursor(Cursor::Grabbing);
        Dispatch::Handled
    }

    pub(super) fn node_drag_move(&mut self, event: &MapEvent) -> Dispatch {
        let (Some(pointer), Some(drag)) = (event.pointer(), self.interaction.drag.as_mut()) else {
            return Dispatch::Ignored;
        };
        drag.current = pointer.lng_lat;
        let preview = point_collection(&[pointer.lng_lat]);
        self.surface.set_data(DRAG_PREVIEW_SOURCE, preview);
        Dispatch::Handled
    }

    pub(super) fn node_drag_end(&mut self) -> Dispatch {
        let Some(drag) = self.interaction.drag.take() else {
            return Dispatch::Ignored;
        };
        self.surface.set_drag_pan(true);
        if self.interaction.hovered_node.is_none() {
            self.paint_nodes(&[], None);
        }
        self.restore_normal_cursor();

        // A press without movement is a plain click
        let existing = self.network.node(drag.node_id).cloned();
        let Some(existing) = existing.filter(|_| drag.current != drag.original) else {
            self.surface.set_data(DRAG_PREVIEW_SOURCE, empty_collection());
            return Dispatch::Handled;
        };

        log!("Node {} dropped at {:?}", drag.node_id, drag.current);
        let ticket = self.issue_ticket();
        let prefill = NodePrefill {
            coordinates: drag.current,
            existing: Some(existing),
        };
        self.node_form = Some(NodeFormState {
            ticket,
            prefill: prefill.clone(),
            saving: false,
        });
        Dispatch::NodeMoved(NodeFormRequest { ticket, prefill })
    }

    /// Open the node form for a new node at `coordinates`
    ///
    /// # Errors
    ///
    /// Returns an error outside NORMAL mode or while a node save is in flight
    pub fn request_new_node(&mut self, coordinates: LngLat) -> Result<NodeFormRequest, EditorError> {
        if self.mode != EditorMode::Normal {
            return Err(TransitionError {
                from: self.mode,
                requested: EditorMode::Normal,
            }
            .into());
        }
        if self.node_form.as_ref().is_some_and(|form| form.saving) {
            return Err(UserSequenceError::SaveInProgress.into());
        }
        let ticket = self.issue_ticket();
        let prefill = NodePrefill {
            coordinates,
            existing: None,
        };
        self.node_form = Some(NodeFormState {
            ticket,
            prefill: prefill.clone(),
            saving: false,
        });
        Ok(NodeFormRequest { ticket, prefill })
    }

    /// The form of `ticket`, if it is still open
    #[must_use]
    pub fn node_form_request(&self, ticket: Ticket) -> Option<NodeFormRequest> {
        self.node_form
            .as_ref()
            .filter(|form| form.ticket == ticket && !form.saving)
            .map(|form| NodeFormRequest {
                ticket: form.ticket,
                prefill: form.prefill.clone(),
            })
    }

    /// Build the node record from submitted attributes
    ///
    /// # Errors
    ///
    /// Returns `NoPendingForm` if the form was closed or superseded, or a
    /// validation error; the form stays open on validation errors
    pub fn submit_node_form(&mut self, ticket: Ticket, attributes: NodeAttributes) -> Result<PendingSave, EditorError> {
        let Some(prefill) = self.node_form_request(ticket).map(|request| request.prefill) else {
            return Err(UserSequenceError::NoPendingForm.into());
        };
        let (id, sequence_id) = match &prefill.existing {
            Some(node) => (node.id, node.sequence_id),
            None => (generate_feature_id(), self.network.next_sequence_id()),
        };
        let node = match Node::from_attributes(id, sequence_id, prefill.coordinates, attributes) {
            Ok(node) => node,
            Err(e) => {
                let error = EditorError::from(e);
                self.report(&error);
                return Err(error);
            }
        };
        if let Some(form) = self.node_form.as_mut() {
            form.saving = true;
        }
        Ok(PendingSave {
            ticket,
            record: Record::Node(node),
        })
    }

    pub fn cancel_node_form(&mut self, ticket: Ticket) {
        if self.node_form_request(ticket).is_none() {
            return;
        }
        self.node_form = None;
        self.surface.set_data(DRAG_PREVIEW_SOURCE, empty_collection());
    }

    /// Apply the outcome of a node save.
    ///
    /// On failure the form stays open with its last values so it can be
    /// submitted again.
    pub fn finish_node_save(&mut self, pending: &PendingSave, result: Result<(), SaveError>) -> SaveOutcome {
        let live = pending.ticket.epoch == self.epoch
            && self
                .node_form
                .as_ref()
                .is_some_and(|form| form.ticket == pending.ticket && form.saving);

        match (live, result) {
            (true, Ok(())) => {
                self.node_form = None;
                self.surface.set_data(DRAG_PREVIEW_SOURCE, empty_collection());
                self.apply_saved(pending, "Node saved");
                SaveOutcome::Applied
            }
            (true, Err(e)) => {
                if let Some(form) = self.node_form.as_mut() {
                    form.saving = false;
                }
                self.notify(Notice::error(e.to_string()));
                SaveOutcome::Failed
            }
            (false, Ok(())) => {
                self.apply_saved(pending, "Node saved");
                SaveOutcome::Stale
            }
            (false, Err(e)) => {
                leptos::logging::warn!("Dropping failure of superseded node save: {}", e);
                SaveOutcome::Stale
            }
        }
    }

    /// Merge an acknowledged record and tell the user
    pub(super) fn apply_saved(&mut self, pending: &PendingSave, message: &str) {
        match self.merge_record(&pending.record) {
            Ok(()) => self.notify(Notice::info(message)),
            Err(e) => {
                leptos::logging::error!("Saved {} could not be merged: {}", pending.record.id(), e);
                self.report(&e);
            }
        }
    }
}
