use crate::constants::DRAFT_CONCLUDED_MESSAGE;
use crate::models::{NetworkError, ValidationError};

use super::mode::EditorMode;

/// An action that is not valid in the current editing sequence.
///
/// Rejected synchronously; the draft and mode are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSequenceError {
    DraftConcluded,
    MustStartOnNode,
    DegenerateSegment,
    NothingToCancel,
    NoDraft,
    NotCompletable,
    SaveInProgress,
    RouteLoading,
    NoPendingForm,
}

impl std::fmt::Display for UserSequenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DraftConcluded => write!(f, "{DRAFT_CONCLUDED_MESSAGE}"),
            Self::MustStartOnNode => write!(f, "Start the segment by clicking on an existing node"),
            Self::DegenerateSegment => {
                write!(f, "The segment cannot end on its start node without intermediate points")
            }
            Self::NothingToCancel => write!(f, "There is no point to cancel"),
            Self::NoDraft => write!(f, "There is no segment being drawn"),
            Self::NotCompletable => write!(f, "Bind both ends of the segment to a node before saving"),
            Self::SaveInProgress => write!(f, "A save is already in progress"),
            Self::RouteLoading => write!(f, "The route is still being calculated"),
            Self::NoPendingForm => write!(f, "No form is waiting for input"),
        }
    }
}

impl std::error::Error for UserSequenceError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub from: EditorMode,
    pub requested: EditorMode,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot switch from {} to {}", self.from, self.requested)
    }
}

impl std::error::Error for TransitionError {}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorError {
    Sequence(UserSequenceError),
    Transition(TransitionError),
    Validation(ValidationError),
    Network(NetworkError),
    /// The controller was already borrowed by another call; nothing was done
    Busy,
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequence(e) => write!(f, "{e}"),
            Self::Transition(e) => write!(f, "{e}"),
            Self::Validation(e) => write!(f, "Invalid record: {e}"),
            Self::Network(e) => write!(f, "{e}"),
            Self::Busy => write!(f, "The editor is busy, try again"),
        }
    }
}

impl std::error::Error for EditorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sequence(e) => Some(e),
            Self::Transition(e) => Some(e),
            Self::Validation(e) => Some(e),
            Self::Network(e) => Some(e),
            Self::Busy => None,
        }
    }
}

impl From<UserSequenceError> for EditorError {
    fn from(value: UserSequenceError) -> Self {
        Self::Sequence(value)
    }
}

impl From<TransitionError> for EditorError {
    fn from(value: TransitionError) -> Self {
        Self::Transition(value)
    }
}

impl From<ValidationError> for EditorError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<NetworkError> for EditorError {
    fn from(value: NetworkError) -> Self {
        Self::Network(value)
    }
}
