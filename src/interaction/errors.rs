//! Error types for staff interaction
//!
//! Every failure here is local and recoverable: the controller logs it and
//! reports the event as ignored.

use thiserror::Error;
use crate::interaction::pointers::PointerId;
use crate::models::note_spec::NotePosition;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InteractionError {
    /// A drag is already active for this pointer
    #[error("Pointer {0} already owns an active session")]
    DuplicateSession(PointerId),

    /// No session is registered for this pointer
    #[error("No active session for pointer {0}")]
    UnknownPointer(PointerId),

    /// Another pointer is already dragging this note
    #[error("Note at voice {}, index {} is already being dragged", .0.voice_index, .0.note_index)]
    NoteBusy(NotePosition),

    #[error("No note at voice {}, index {}", .0.voice_index, .0.note_index)]
    NoteNotFound(NotePosition),

    /// Rests carry no pitch to drag
    #[error("Note at voice {}, index {} is a rest", .0.voice_index, .0.note_index)]
    RestNotDraggable(NotePosition),

    /// Pointer position maps to no pitch (no live geometry and no usable metrics)
    #[error("Coordinate ({0}, {1}) cannot be resolved to a pitch")]
    UnresolvableCoordinate(f64, f64),

    #[error("No note is selected")]
    NoSelection,

    #[error("Pointer is outside the staff")]
    OutsideStaff,

    #[error("Note limit of {0} reached")]
    NoteLimitReached(usize),

    /// Quantizer configured with no usable pitch classes
    #[error("Allowed pitch-class set is empty")]
    EmptyPitchClassSet,

    #[error("Invalid MIDI range {0}..={1}")]
    InvalidRange(i32, i32),

    #[error("Render pass failed: {0}")]
    RenderFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type InteractionResult<T> = Result<T, InteractionError>;
