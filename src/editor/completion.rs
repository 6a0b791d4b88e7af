use crate::logging::log;
use crate::models::{generate_backend_id, generate_feature_id, SegmentAttributes};
use crate::persistence::{Record, SaveError};

use super::controller::{Dispatch, ModeController, PendingSave, SaveOutcome, SegmentFormRequest, Ticket};
use super::draft::DraftOrigin;
use super::error::{EditorError, UserSequenceError};
use super::events::{Notice, SegmentPrefill};
use super::mode::EditorMode;
use super::surface::MapSurface;

/// Where the draft is in the completion flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionState {
    #[default]
    Idle,
    /// Waiting for the user to confirm or keep drawing
    AwaitingDecision,
    AwaitingForm(Ticket),
    Saving(Ticket),
}

/// The user's answer when a draft becomes completable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionChoice {
    Confirm,
    Continue,
}

impl<S: MapSurface> ModeController<S> {
    #[must_use]
    pub fn completion_state(&self) -> CompletionState {
        self.completion
    }

    /// Form values for the current draft, if it is completable
    #[must_use]
    pub fn segment_prefill(&self) -> Option<SegmentPrefill> {
        let draft = self.draft.as_ref()?;
        let (start, end) = (draft.snap1()?, draft.snap2()?);
        let derived = draft.derive()?;
        let vertices = draft.vertices();
        Some(SegmentPrefill {
            origin: draft.origin(),
            vertex_count: vertices.len(),
            length_meters: derived.length_meters,
            start_bearing_degrees: derived.start_bearing_degrees,
            end_bearing_degrees: derived.end_bearing_degrees,
            start_coordinates: vertices.first().copied().unwrap_or(start.coordinates),
            end_coordinates: vertices.last().copied().unwrap_or(end.coordinates),
            start_node_id: start.node_id,
            end_node_id: end.node_id,
        })
    }

    pub(super) fn offer_completion(&mut self) -> Dispatch {
        match self.segment_prefill() {
            Some(prefill) => {
                self.completion = CompletionState::AwaitingDecision;
                Dispatch::SegmentCompletable(prefill)
            }
            None => Dispatch::Handled,
        }
    }

    /// Keep the draft as it is; clicks stay rejected until a point is cancelled
    pub fn continue_drawing(&mut self) {
        if self.completion == CompletionState::AwaitingDecision {
            self.completion = CompletionState::Idle;
        }
    }

    /// Open the attribute form for the completable draft
    ///
    /// # Errors
    ///
    /// Returns an error if there is no completable draft or it is being saved
    pub fn confirm_segment(&mut self) -> Result<SegmentFormRequest, EditorError> {
        if matches!(self.completion, CompletionState::Saving(_)) {
            return Err(UserSequenceError::SaveInProgress.into());
        }
        let Some(draft) = self.draft.as_ref() else {
            return Err(UserSequenceError::NoDraft.into());
        };
        if !draft.is_completable() {
            return Err(UserSequenceError::NotCompletable.into());
        }
        let prefill = self.segment_prefill().ok_or(UserSequenceError::NotCompletable)?;
        let ticket = self.issue_ticket();
        self.completion = CompletionState::AwaitingForm(ticket);
        Ok(SegmentFormRequest { ticket, prefill })
    }

    /// Close the form without saving. A routed draft has nothing to go back
    /// to and is discarded.
    pub fn cancel_segment_form(&mut self, ticket: Ticket) {
        if self.completion != CompletionState::AwaitingForm(ticket) {
            log!("Ignoring cancel of closed segment form");
            return;
        }
        self.completion = CompletionState::Idle;
        if self.draft.as_ref().is_some_and(|d| d.origin() == DraftOrigin::Routed) {
            self.discard_routed_draft();
        }
    }

    /// Drop a routed draft waiting in NORMAL mode
    pub(super) fn discard_routed_draft(&mut self) {
        self.draft = None;
        self.completion = CompletionState::Idle;
        self.redraw_preview();
        self.notify(Notice::info("Auto segment discarded"));
    }

    /// Drop a draft that is not being saved. In EDIT the drawing restarts
    /// from an empty draft.
    ///
    /// # Errors
    ///
    /// Returns an error while the draft is being saved
    pub fn discard_draft(&mut self) -> Result<(), EditorError> {
        if matches!(self.completion, CompletionState::Saving(_)) {
            let error = UserSequenceError::SaveInProgress.into();
            self.report(&error);
            return Err(error);
        }
        match self.mode {
            EditorMode::Edit => {
                self.draft = Some(super::draft::Draft::new());
                self.completion = CompletionState::Idle;
                self.redraw_preview();
            }
            _ if self.draft.is_some() => self.discard_routed_draft(),
            _ => return Err(UserSequenceError::NoDraft.into()),
        }
        Ok(())
    }

    /// Build the segment record from the submitted attributes
    ///
    /// # Errors
    ///
    /// Returns `NoPendingForm` if the form was closed or superseded, or a
    /// validation error; the form stays open on validation errors
    pub fn submit_segment_form(
        &mut self,
        ticket: Ticket,
        attributes: SegmentAttributes,
    ) -> Result<PendingSave, EditorError> {
        if self.completion != CompletionState::AwaitingForm(ticket) {
            return Err(UserSequenceError::NoPendingForm.into());
        }
        let draft = self.draft.as_ref().ok_or(UserSequenceError::NoDraft)?;
        let segment = match draft.to_segment(generate_feature_id(), generate_backend_id(), attributes) {
            Ok(segment) => segment,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };
        self.completion = CompletionState::Saving(ticket);
        Ok(PendingSave {
            ticket,
            record: Record::Segment(segment),
        })
    }

    /// Apply the outcome of a segment save.
    ///
    /// Success merges the segment, drops the draft and returns to NORMAL.
    /// Failure keeps the draft so the save can be retried.
    pub fn finish_segment_save(&mut self, pending: &PendingSave, result: Result<(), SaveError>) -> SaveOutcome {
        let live =
            pending.ticket.epoch == self.epoch && self.completion == CompletionState::Saving(pending.ticket);

        match (live, result) {
            (true, Ok(())) => {
                self.apply_saved(pending, "Segment saved");
                self.transition(EditorMode::Normal);
                SaveOutcome::Applied
            }
            (true, Err(e)) => {
                self.completion = CompletionState::Idle;
                self.notify(Notice::error(e.to_string()));
                SaveOutcome::Failed
            }
            (false, Ok(())) => {
                self.apply_saved(pending, "Segment saved");
                SaveOutcome::Stale
            }
            (false, Err(e)) => {
                leptos::logging::warn!("Dropping failure of superseded segment save: {}", e);
                SaveOutcome::Stale
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DRAFT_LINE_SOURCE, DRAFT_POINTS_SOURCE, SAVE_TIMEOUT_CAVEAT};
    use crate::editor::events::{EditorEvent, NoticeLevel};
    use crate::editor::test_support::{attached_controller, draw_x_to_y, segment_attributes};
    use crate::geometry::LngLat;
    use std::time::Duration;

    #[test]
    fn test_completable_draft_offers_decision() {
        let (mut controller, nodes) = attached_controller();
        let prefill = draw_x_to_y(&mut controller, &nodes);

        assert_eq!(controller.completion_state(), CompletionState::AwaitingDecision);
        assert_eq!(prefill.vertex_count, 3);
        assert_eq!(prefill.start_node_id, nodes.x.id);
        assert_eq!(prefill.end_node_id, nodes.y.id);
        assert_eq!(prefill.start_coordinates, nodes.x.coordinates);
        assert_eq!(prefill.end_coordinates, nodes.y.coordinates);
        assert!(prefill.length_meters > 0.0);
    }

    #[test]
    fn test_continue_keeps_draft_and_mode() {
        let (mut controller, nodes) = attached_controller();
        draw_x_to_y(&mut controller, &nodes);
        let before = controller.draft().cloned();

        controller.continue_drawing();
        assert_eq!(controller.completion_state(), CompletionState::Idle);
        assert_eq!(controller.draft().cloned(), before);
        assert_eq!(controller.mode(), EditorMode::Edit);

        // a further click is still rejected
        let dispatched = crate::editor::test_support::click_map(&mut controller, LngLat::new(9.0, 45.0));
        assert_eq!(dispatched, vec![Dispatch::Rejected(UserSequenceError::DraftConcluded)]);
    }

    #[test]
    fn test_confirm_requires_completable_draft() {
        let (mut controller, _) = attached_controller();
        controller.enter_edit_mode().expect("enter edit");
        assert_eq!(controller.confirm_segment(), Err(UserSequenceError::NotCompletable.into()));
    }

    #[test]
    fn test_successful_save_merges_and_returns_to_normal() {
        let (mut controller, nodes) = attached_controller();
        draw_x_to_y(&mut controller, &nodes);
        let request = controller.confirm_segment().expect("completable");
        let pending = controller
            .submit_segment_form(request.ticket, segment_attributes("Ridge"))
            .expect("valid");
        assert_eq!(controller.completion_state(), CompletionState::Saving(request.ticket));

        let Record::Segment(segment) = &pending.record else {
            panic!("expected a segment record");
        };
        assert_eq!(segment.start_node_id, nodes.x.id);
        assert_eq!(segment.end_node_id, nodes.y.id);
        assert_eq!(segment.vertices.len(), 3);

        assert_eq!(controller.finish_segment_save(&pending, Ok(())), SaveOutcome::Applied);
        assert_eq!(controller.mode(), EditorMode::Normal);
        assert!(controller.draft().is_none());
        assert_eq!(controller.snap().current(), None);
        assert!(controller.network().segment(segment.id).is_some());
        assert_eq!(controller.surface().feature_count(DRAFT_LINE_SOURCE), 0);
        assert_eq!(controller.surface().feature_count(DRAFT_POINTS_SOURCE), 0);
    }

    #[test]
    fn test_timeout_keeps_draft_and_mode() {
        let (mut controller, nodes) = attached_controller();
        draw_x_to_y(&mut controller, &nodes);
        let request = controller.confirm_segment().expect("completable");
        let pending = controller
            .submit_segment_form(request.ticket, segment_attributes("Ridge"))
            .expect("valid");
        let draft_before = controller.draft().cloned();
        let segments_before = controller.network().segment_count();
        controller.drain_events();

        let outcome = controller.finish_segment_save(
            &pending,
            Err(SaveError::Timeout {
                after: Duration::from_secs(10),
            }),
        );

        assert_eq!(outcome, SaveOutcome::Failed);
        assert_eq!(controller.mode(), EditorMode::Edit);
        assert_eq!(controller.draft().cloned(), draft_before);
        assert_eq!(controller.network().segment_count(), segments_before);
        let events = controller.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            EditorEvent::Notice(n) if n.level == NoticeLevel::Error && n.message.contains(SAVE_TIMEOUT_CAVEAT)
        )));

        // the user can retry
        let retry = controller.confirm_segment().expect("still completable");
        assert!(controller.submit_segment_form(retry.ticket, segment_attributes("Ridge")).is_ok());
    }

    #[test]
    fn test_clicks_rejected_while_saving() {
        let (mut controller, nodes) = attached_controller();
        draw_x_to_y(&mut controller, &nodes);
        let request = controller.confirm_segment().expect("completable");
        controller
            .submit_segment_form(request.ticket, segment_attributes("Ridge"))
            .expect("valid");

        let dispatched = crate::editor::test_support::click_map(&mut controller, LngLat::new(9.0, 45.0));
        assert_eq!(dispatched, vec![Dispatch::Rejected(UserSequenceError::SaveInProgress)]);
        assert_eq!(controller.cancel_last_point(), Err(UserSequenceError::SaveInProgress.into()));
    }

    #[test]
    fn test_invalid_attributes_keep_form_open() {
        let (mut controller, nodes) = attached_controller();
        draw_x_to_y(&mut controller, &nodes);
        let request = controller.confirm_segment().expect("completable");
        let result = controller.submit_segment_form(request.ticket, segment_attributes("  "));
        assert!(matches!(result, Err(EditorError::Validation(_))));
        assert_eq!(controller.completion_state(), CompletionState::AwaitingForm(request.ticket));
    }

    #[test]
    fn test_superseded_form_rejected() {
        let (mut controller, nodes) = attached_controller();
        draw_x_to_y(&mut controller, &nodes);
        let first = controller.confirm_segment().expect("completable");
        let second = controller.confirm_segment().expect("completable");
        assert_eq!(
            controller.submit_segment_form(first.ticket, segment_attributes("Ridge")),
            Err(UserSequenceError::NoPendingForm.into())
        );
        assert!(controller.submit_segment_form(second.ticket, segment_attributes("Ridge")).is_ok());
    }

    #[test]
    fn test_save_finishing_after_quit_merges_without_touching_mode() {
        let (mut controller, nodes) = attached_controller();
        draw_x_to_y(&mut controller, &nodes);
        let request = controller.confirm_segment().expect("completable");
        let pending = controller
            .submit_segment_form(request.ticket, segment_attributes("Ridge"))
            .expect("valid");

        controller.quit_edit_mode().expect("quit");
        controller.start_auto_segment().expect("auto");

        assert_eq!(controller.finish_segment_save(&pending, Ok(())), SaveOutcome::Stale);
        assert_eq!(controller.mode(), EditorMode::AutoSegment);
        assert_eq!(controller.network().segment_count(), 1);
    }

    #[test]
    fn test_stale_failure_is_dropped() {
        let (mut controller, nodes) = attached_controller();
        draw_x_to_y(&mut controller, &nodes);
        let request = controller.confirm_segment().expect("completable");
        let pending = controller
            .submit_segment_form(request.ticket, segment_attributes("Ridge"))
            .expect("valid");
        controller.quit_edit_mode().expect("quit");
        controller.drain_events();

        let outcome = controller.finish_segment_save(&pending, Err(SaveError::Rejected("nope".to_string())));
        assert_eq!(outcome, SaveOutcome::Stale);
        assert!(controller.drain_events().is_empty());
    }

    #[test]
    fn test_discard_draft_in_edit_restarts() {
        let (mut controller, nodes) = attached_controller();
        draw_x_to_y(&mut controller, &nodes);
        controller.discard_draft().expect("not saving");
        assert_eq!(controller.draft().map(super::super::draft::Draft::len), Some(0));
        assert_eq!(controller.mode(), EditorMode::Edit);
    }
}
