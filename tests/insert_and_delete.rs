// Insert, delete, wheel nudge and dictation modes through the controller
//
// Mock staff: top line y = 40, bottom line y = 80, spacing 10. On the treble
// staff y = 80 is E4, y = 70 is G4, y = 60 is B4.

mod common;

use common::*;
use ear_staff_wasm::interaction::{
    DictationMode, EventOutcome, InputEvent, InputOperation, InputPhase, InteractionConfig,
    PointerId,
};
use ear_staff_wasm::models::{Accidental, KeySignature, NotePosition};
use ear_staff_wasm::StaffEvent;

fn at(note_index: usize) -> NotePosition {
    NotePosition::new(0, note_index)
}

fn commits(staff: &TestStaff) -> Vec<InputEvent> {
    staff
        .sink()
        .events
        .iter()
        .filter(|e| matches!(e.phase, InputPhase::Commit | InputPhase::Delete))
        .cloned()
        .collect()
}

#[test]
fn test_insert_on_empty_staff() {
    let mut staff = staff(&[]);
    let pointer = PointerId::Mouse;

    assert_eq!(
        staff.handle_event(down(pointer, 100.0, 80.0)),
        EventOutcome::InsertStarted { insert_index: 0, midi: 64 }
    );
    assert_eq!(staff.renderer().previews[&pointer].midi, 64);
    assert_eq!(staff.handle_event(move_to(pointer, 100.0, 70.0)), EventOutcome::InsertMoved { midi: 67 });
    // Same pitch again: no new move event
    assert_eq!(staff.handle_event(move_to(pointer, 101.0, 71.0)), EventOutcome::Ignored);

    assert_eq!(
        staff.handle_event(up(pointer, 100.0, 70.0)),
        EventOutcome::InsertCommitted { position: at(0), midi: 67 }
    );
    assert_eq!(staff.sequence(), vec!["G4".to_string()]);
    assert!(staff.renderer().previews.is_empty());

    let events = &staff.sink().events;
    assert_eq!(events.len(), 3);
    assert_eq!((events[0].operation, events[0].phase), (InputOperation::Insert, InputPhase::Start));
    assert_eq!(events[0].note.as_deref(), Some("E4"));
    assert_eq!(events[0].pointer, Some(pointer));
    assert_eq!((events[1].operation, events[1].phase), (InputOperation::Insert, InputPhase::Move));
    assert_eq!(events[1].note.as_deref(), Some("G4"));
    assert_eq!((events[2].operation, events[2].phase), (InputOperation::Insert, InputPhase::Commit));
    assert_eq!(events[2].note.as_deref(), Some("G4"));
    assert_eq!(events[2].insert_index, Some(0));
}

#[test]
fn test_insert_between_notes() {
    let mut staff = staff(&["C4", "E4", "G4"]);

    // x = 85 falls between the second (x = 70) and third (x = 110) noteheads
    assert_eq!(
        staff.handle_event(down(PointerId::Mouse, 85.0, 60.0)),
        EventOutcome::InsertStarted { insert_index: 2, midi: 71 }
    );
    staff.handle_event(up(PointerId::Mouse, 85.0, 60.0));

    assert_eq!(
        staff.sequence(),
        vec!["C4".to_string(), "E4".to_string(), "B4".to_string(), "G4".to_string()]
    );
    let commits = commits(&staff);
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].operation, InputOperation::Update);
    assert_eq!(commits[0].note_index, Some(2));
    assert_eq!(commits[0].note.as_deref(), Some("B4"));
    assert_eq!(commits[1].operation, InputOperation::Insert);
    assert_eq!(commits[1].insert_index, Some(3));
    assert_eq!(commits[1].note.as_deref(), Some("G4"));

    // The new note is selected once its geometry is back
    assert_eq!(staff.state().selected(), Some(at(2)));
}

#[test]
fn test_insert_after_last_note_appends() {
    let mut staff = staff(&["C4", "E4"]);
    staff.handle_event(down(PointerId::Mouse, 300.0, 60.0));
    staff.handle_event(up(PointerId::Mouse, 300.0, 60.0));
    assert_eq!(staff.sequence(), vec!["C4".to_string(), "E4".to_string(), "B4".to_string()]);
}

#[test]
fn test_insert_is_quantized() {
    let mut staff = staff(&[]);
    staff
        .set_allowed_pitch_class_numbers(&[0, 2, 4, 7, 9], None, None)
        .unwrap();

    // y = 75 is F4, which the pentatonic set rounds down to E4
    assert_eq!(
        staff.handle_event(down(PointerId::Mouse, 100.0, 75.0)),
        EventOutcome::InsertStarted { insert_index: 0, midi: 64 }
    );
    staff.handle_event(up(PointerId::Mouse, 100.0, 75.0));
    assert_eq!(staff.sequence(), vec!["E4".to_string()]);
}

#[test]
fn test_insert_in_key_shows_cancelling_natural() {
    let config = InteractionConfig {
        key_signature: Some(KeySignature::G),
        ..InteractionConfig::default()
    };
    let mut staff = staff_with(config, &[]);

    // y = 75 is the F line; G major sharpens F so the plain F needs a natural
    staff.handle_event(down(PointerId::Mouse, 100.0, 75.0));
    staff.handle_event(up(PointerId::Mouse, 100.0, 75.0));

    let note = staff.state().note(at(0)).unwrap();
    assert_eq!(staff.sequence(), vec!["F4".to_string()]);
    assert_eq!(note.accidentals, vec![Some(Accidental::Natural)]);
}

#[test]
fn test_note_limit_blocks_insert() {
    let mut staff = staff(&["C4"]);
    staff.set_note_limit(Some(1));

    assert_eq!(staff.handle_event(down(PointerId::Mouse, 200.0, 60.0)), EventOutcome::Ignored);
    assert!(staff.pointer_entry(PointerId::Mouse).is_none());
    assert!(staff.sink().events.is_empty());

    staff.set_note_limit(None);
    assert!(!staff.handle_event(down(PointerId::Mouse, 200.0, 60.0)).is_ignored());
}

#[test]
fn test_pointer_outside_staff_is_ignored() {
    let mut staff = staff(&[]);
    assert_eq!(staff.handle_event(down(PointerId::Mouse, 100.0, -100.0)), EventOutcome::Ignored);
    assert_eq!(staff.handle_event(down(PointerId::Mouse, 900.0, 60.0)), EventOutcome::Ignored);
    assert!(staff.sink().events.is_empty());
}

#[test]
fn test_insert_without_geometry_is_ignored() {
    let mut staff = TestStaff::new(
        MockRenderer::new(RenderMode::Pending),
        RecordingSink::default(),
        InteractionConfig::default(),
    )
    .unwrap();
    staff.load_sequence(&[] as &[&str], None);

    assert_eq!(staff.handle_event(down(PointerId::Mouse, 100.0, 60.0)), EventOutcome::Ignored);
    assert!(staff.sink().events.is_empty());
}

#[test]
fn test_insert_cancel_notifies_host() {
    let mut staff = staff(&[]);
    staff.handle_event(down(PointerId::Touch, 100.0, 80.0));

    assert_eq!(staff.handle_event(cancel(PointerId::Touch)), EventOutcome::InsertCancelled);
    assert!(staff.renderer().previews.is_empty());
    assert!(staff.sequence().is_empty());

    let last = staff.sink().events.last().unwrap();
    assert_eq!((last.operation, last.phase), (InputOperation::Insert, InputPhase::Cancel));
    assert_eq!(last.insert_index, Some(0));
    assert_eq!(last.note, None);
}

#[test]
fn test_click_away_from_notes_inserts() {
    let mut staff = staff(&["C4"]);

    // Same height as the only notehead (x = 30) but far to its right
    assert_eq!(
        staff.handle_event(down(PointerId::Mouse, 300.0, 90.0)),
        EventOutcome::InsertStarted { insert_index: 1, midi: 60 }
    );
    assert_eq!(staff.active_drags(), 0);
    staff.handle_event(up(PointerId::Mouse, 300.0, 90.0));
    assert_eq!(staff.sequence(), vec!["C4".to_string(), "C4".to_string()]);
}

#[test]
fn test_insert_index_skips_rests() {
    use ear_staff_wasm::models::{Clef, DurationCode, NoteSpec};

    let mut staff = staff(&["C4", "E4"]);
    let mut voices = staff.state().voices().to_vec();
    voices[0].notes.insert(0, NoteSpec::rest(DurationCode::Quarter, Clef::Treble));
    staff.load_voices(voices);

    // Voice slot 2 sits before E4, which is second in the pitched sequence
    assert_eq!(
        staff.handle_event(down(PointerId::Mouse, 90.0, 60.0)),
        EventOutcome::InsertStarted { insert_index: 1, midi: 71 }
    );
    staff.handle_event(move_to(PointerId::Mouse, 90.0, 70.0));
    let events = &staff.sink().events;
    assert_eq!(events[0].phase, InputPhase::Start);
    assert_eq!(events[0].insert_index, Some(1));
    assert_eq!(events[1].phase, InputPhase::Move);
    assert_eq!(events[1].insert_index, Some(1));

    staff.handle_event(up(PointerId::Mouse, 90.0, 70.0));
    assert_eq!(staff.sequence(), vec!["C4".to_string(), "G4".to_string(), "E4".to_string()]);
    assert!(staff.state().voices()[0].notes[0].is_rest);
}

#[test]
fn test_concurrent_inserts_keep_separate_state() {
    let mut staff = staff(&[]);
    let p1 = PointerId::Pointer(1);
    let p2 = PointerId::Pointer(2);

    staff.handle_event(down(p1, 100.0, 80.0));
    staff.handle_event(down(p2, 200.0, 60.0));
    assert_eq!(staff.pointer_entry(p1).unwrap().note.as_deref(), Some("E4"));
    assert_eq!(staff.pointer_entry(p2).unwrap().note.as_deref(), Some("B4"));

    staff.handle_event(up(p1, 100.0, 80.0));
    // The first commit pushes the second pointer's target right
    assert_eq!(staff.pointer_entry(p2).unwrap().insert_index, 1);
    staff.handle_event(up(p2, 200.0, 60.0));
    assert_eq!(staff.sequence(), vec!["E4".to_string(), "B4".to_string()]);
}

#[test]
fn test_wheel_nudges_selected_note() {
    let mut staff = staff(&[]);
    // Nothing selected yet
    assert_eq!(staff.handle_event(StaffEvent::Wheel { delta_y: -1.0 }), EventOutcome::Ignored);

    staff.handle_event(down(PointerId::Mouse, 100.0, 70.0));
    staff.handle_event(up(PointerId::Mouse, 100.0, 70.0));
    assert_eq!(staff.state().selected(), Some(at(0)));

    assert_eq!(
        staff.handle_event(StaffEvent::Wheel { delta_y: -1.0 }),
        EventOutcome::Nudged { position: at(0), midi: 68 }
    );
    assert_eq!(staff.sequence(), vec!["Ab4".to_string()]);
    assert_eq!(staff.state().note(at(0)).unwrap().accidentals, vec![Some(Accidental::Flat)]);

    staff.handle_event(StaffEvent::Wheel { delta_y: 3.0 });
    staff.handle_event(StaffEvent::Wheel { delta_y: 3.0 });
    assert_eq!(staff.sequence(), vec!["Gb4".to_string()]);
}

#[test]
fn test_delete_reports_shift() {
    let mut staff = staff(&["C4", "E4", "G4"]);

    assert_eq!(
        staff.handle_event(StaffEvent::Delete { position: Some(at(1)) }),
        EventOutcome::Deleted { position: at(1) }
    );
    assert_eq!(staff.sequence(), vec!["C4".to_string(), "G4".to_string()]);

    let commits = commits(&staff);
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].operation, InputOperation::Update);
    assert_eq!(commits[0].note_index, Some(1));
    assert_eq!(commits[0].note.as_deref(), Some("G4"));
    assert_eq!((commits[1].operation, commits[1].phase), (InputOperation::Delete, InputPhase::Delete));
    assert_eq!(commits[1].note_index, Some(2));
}

#[test]
fn test_delete_selected_note() {
    let mut staff = staff(&["C4", "E4"]);
    assert_eq!(staff.handle_event(StaffEvent::Delete { position: None }), EventOutcome::Ignored);

    let (x, y) = note_point(&staff, at(1));
    staff.handle_event(down(PointerId::Mouse, x, y));
    staff.handle_event(up(PointerId::Mouse, x, y));
    assert_eq!(staff.state().selected(), Some(at(1)));

    staff.handle_event(StaffEvent::Delete { position: None });
    assert_eq!(staff.sequence(), vec!["C4".to_string()]);
    assert_eq!(staff.state().selected(), None);
}

#[test]
fn test_delete_shifts_active_drag() {
    let mut staff = staff(&["C4", "E4", "G4"]);
    let pointer = PointerId::Pointer(7);
    let (x, y) = note_point(&staff, at(2));

    assert_eq!(staff.handle_event(down(pointer, x, y)), EventOutcome::DragStarted { position: at(2) });
    staff.handle_event(move_to(pointer, x, y - 7.0));
    staff.handle_event(StaffEvent::Delete { position: Some(at(1)) });
    assert_eq!(staff.drag_session(pointer).unwrap().position, at(1));

    staff.handle_event(up(pointer, x, y - 7.0));
    assert_eq!(staff.sequence(), vec!["C4".to_string(), "A4".to_string()]);
}

#[test]
fn test_deleting_dragged_note_ends_the_drag() {
    let mut staff = staff(&["C4", "E4"]);
    let pointer = PointerId::Pointer(3);
    let (x, y) = note_point(&staff, at(1));

    staff.handle_event(down(pointer, x, y));
    staff.handle_event(StaffEvent::Delete { position: Some(at(1)) });
    assert_eq!(staff.active_drags(), 0);
    assert!(staff.renderer().previews.is_empty());
    assert_eq!(staff.handle_event(up(pointer, x, y)), EventOutcome::Ignored);
    assert_eq!(staff.sequence(), vec!["C4".to_string()]);
}

#[test]
fn test_harmonic_insert_adds_chord_member() {
    let config = InteractionConfig {
        mode: DictationMode::Harmonic,
        ..InteractionConfig::default()
    };
    let mut staff = staff_with(config, &["G4", "C4"]);
    assert_eq!(staff.state().voices()[0].notes.len(), 1);
    assert_eq!(staff.sequence(), vec!["C4".to_string(), "G4".to_string()]);

    staff.handle_event(down(PointerId::Mouse, 200.0, 80.0));
    assert_eq!(
        staff.handle_event(up(PointerId::Mouse, 200.0, 80.0)),
        EventOutcome::InsertCommitted { position: at(0), midi: 64 }
    );
    assert_eq!(staff.sequence(), vec!["C4".to_string(), "E4".to_string(), "G4".to_string()]);
    assert_eq!(
        staff.state().note(at(0)).unwrap().keys,
        vec!["c/4".to_string(), "e/4".to_string(), "g/4".to_string()]
    );

    let commits = commits(&staff);
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].operation, InputOperation::Update);
    assert_eq!(commits[0].note.as_deref(), Some("E4"));
    assert_eq!(commits[1].operation, InputOperation::Insert);
    assert_eq!(commits[1].insert_index, Some(2));

    // A pitch already in the chord is refused
    staff.handle_event(down(PointerId::Mouse, 200.0, 70.0));
    assert_eq!(staff.handle_event(up(PointerId::Mouse, 200.0, 70.0)), EventOutcome::InsertCancelled);
    assert_eq!(staff.sequence().len(), 3);
}

#[test]
fn test_switching_mode_resets_baseline() {
    let mut staff = staff(&["E4", "C4"]);
    staff.set_dictation_mode(DictationMode::Harmonic);

    assert!(staff.sink().events.is_empty());
    assert_eq!(staff.sequence(), vec!["C4".to_string(), "E4".to_string()]);
    assert_eq!(staff.synchronizer().baseline(), staff.sequence().as_slice());
}

#[test]
fn test_key_change_redisplays_accidentals() {
    let mut staff = staff(&["F#4", "F4"]);
    let accidentals = |staff: &TestStaff, index: usize| staff.state().note(at(index)).unwrap().accidentals.clone();
    assert_eq!(accidentals(&staff, 0), vec![Some(Accidental::Sharp)]);
    assert_eq!(accidentals(&staff, 1), vec![None]);

    staff.set_key_signature(Some(KeySignature::G));
    assert_eq!(accidentals(&staff, 0), vec![None]);
    assert_eq!(accidentals(&staff, 1), vec![Some(Accidental::Natural)]);
    assert_eq!(staff.sequence(), vec!["F#4".to_string(), "F4".to_string()]);
    // Pitches did not change, so the host hears nothing
    assert!(staff.sink().events.is_empty());
}

#[test]
fn test_loading_replaces_content_quietly() {
    let mut staff = staff(&["C4"]);
    staff.load_sequence(&["D4", "nonsense", "F#4"], None);
    assert_eq!(staff.sequence(), vec!["D4".to_string(), "F#4".to_string()]);
    assert!(staff.sink().events.is_empty());
}
