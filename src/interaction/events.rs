//! Typed events in and out of the interaction controller

use serde::{Deserialize, Serialize};
use crate::interaction::pointers::PointerId;
use crate::models::note_spec::{NotePosition, NoteSpec};

/// Pointer and keyboard input routed to the controller.
///
/// Coordinates are screen (client) coordinates; the controller converts them
/// with the current render pass's transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StaffEvent {
    PointerDown {
        pointer: PointerId,
        x: f64,
        y: f64,
        /// Mouse button; anything but the primary button is ignored
        #[serde(default)]
        button: Option<i16>,
        /// Note the host already hit-tested, if any
        #[serde(default)]
        target: Option<NotePosition>,
    },
    PointerMove {
        pointer: PointerId,
        x: f64,
        y: f64,
    },
    PointerUp {
        pointer: PointerId,
        x: f64,
        y: f64,
    },
    PointerCancel {
        pointer: PointerId,
    },
    Wheel {
        delta_y: f64,
    },
    /// Delete the given note, or the selected one
    Delete {
        #[serde(default)]
        position: Option<NotePosition>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputOperation {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputPhase {
    Start,
    Move,
    Commit,
    Cancel,
    Delete,
}

/// Edit notification delivered to the host sequence model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEvent {
    /// Pitch token (`"Eb4"`), absent for deletes and cancels
    pub note: Option<String>,
    pub operation: InputOperation,
    pub phase: InputPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<PointerId>,
}

impl InputEvent {
    pub fn new(note: Option<String>, operation: InputOperation, phase: InputPhase) -> Self {
        Self {
            note,
            operation,
            phase,
            note_index: None,
            insert_index: None,
            pointer: None,
        }
    }

    pub fn at_note(mut self, index: usize) -> Self {
        self.note_index = Some(index);
        self
    }

    pub fn at_insert(mut self, index: usize) -> Self {
        self.insert_index = Some(index);
        self
    }

    pub fn from_pointer(mut self, pointer: PointerId) -> Self {
        self.pointer = Some(pointer);
        self
    }
}

/// What the controller did with one [`StaffEvent`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EventOutcome {
    Ignored,
    DragStarted { position: NotePosition },
    DragMoved { midi: i32 },
    DragCommitted { position: NotePosition, midi: i32 },
    DragCancelled { position: NotePosition },
    InsertStarted { insert_index: usize, midi: i32 },
    InsertMoved { midi: i32 },
    InsertCommitted { position: NotePosition, midi: i32 },
    InsertCancelled,
    Deleted { position: NotePosition },
    Nudged { position: NotePosition, midi: i32 },
}

impl EventOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, EventOutcome::Ignored)
    }
}

/// Transient glyph drawn for an uncommitted drag or insert
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewGlyph {
    pub pointer: PointerId,
    /// Note being dragged, or the insert index for a new note
    pub position: NotePosition,
    pub spec: NoteSpec,
    pub midi: i32,
    /// Status label with the displayed accidental, e.g. `E♭4`
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event: StaffEvent = serde_json::from_str(
            r#"{"type":"pointerDown","pointer":{"pointer":3},"x":10.5,"y":20.0}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            StaffEvent::PointerDown {
                pointer: PointerId::Pointer(3),
                x: 10.5,
                y: 20.0,
                button: None,
                target: None,
            }
        );

        let wheel: StaffEvent = serde_json::from_str(r#"{"type":"wheel","deltaY":-3}"#).unwrap();
        assert_eq!(wheel, StaffEvent::Wheel { delta_y: -3.0 });

        let cancel: StaffEvent = serde_json::from_str(r#"{"type":"pointerCancel","pointer":"mouse"}"#).unwrap();
        assert_eq!(cancel, StaffEvent::PointerCancel { pointer: PointerId::Mouse });
    }

    #[test]
    fn test_input_event_serializes_camel_case() {
        let event = InputEvent::new(Some("Eb4".into()), InputOperation::Insert, InputPhase::Commit).at_insert(2);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["operation"], "insert");
        assert_eq!(json["phase"], "commit");
        assert_eq!(json["insertIndex"], 2);
        assert!(json.get("noteIndex").is_none());
    }

    #[test]
    fn test_outcome_tagged_by_kind() {
        let json = serde_json::to_value(EventOutcome::InsertStarted { insert_index: 1, midi: 64 }).unwrap();
        assert_eq!(json["kind"], "insertStarted");
        assert_eq!(json["insertIndex"], 1);
        assert_eq!(serde_json::to_value(EventOutcome::Ignored).unwrap()["kind"], "ignored");
    }
}
