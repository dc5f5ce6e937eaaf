//! Drag sessions
//!
//! A `DragSession` owns one pointer's in-progress pitch edit. It reads staff
//! metrics through the caller and never touches the committed note; the
//! snapshot it takes at begin is what cancel restores.
//!
//! State machine: Idle → Active → {Committed, Cancelled}. `DragSessions`
//! holds the Active ones, at most one per pointer.

use std::collections::HashMap;

use crate::interaction::errors::{InteractionError, InteractionResult};
use crate::interaction::pointers::PointerId;
use crate::interaction::quantizer::{PitchQuantizer, QuantizeRequest};
use crate::models::key_signature::{decide_accidental_for_key, KeySignature};
use crate::models::note_spec::{NotePosition, NoteSpec};
use crate::models::pitch::{midi_to_pitch_spec, Accidental, PitchSpec, SpellingPreference};

/// Read-only inputs a move or commit needs from the controller
#[derive(Debug, Clone, Copy)]
pub struct DragContext<'a> {
    pub quantizer: Option<&'a PitchQuantizer>,
    pub midi_min: i32,
    pub midi_max: i32,
    pub preference: SpellingPreference,
    pub key_signature: Option<KeySignature>,
}

/// Preview produced by a move that changed the pitch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragStep {
    pub midi: i32,
    pub spec: PitchSpec,
    pub displayed: Option<Accidental>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub pointer: PointerId,
    pub position: NotePosition,
    pub base_midi: i32,
    /// Spelling of the note at drag start, reused while the delta is zero
    pub base_spec: Option<PitchSpec>,
    pub base_diatonic: Option<i32>,
    /// Sub-semitone vertical travel not yet converted to a step
    pub accum: f64,
    pub last_y: f64,
    pub px_per_semitone: f64,
    pub preview_delta: i32,
    pub quantized_midi: i32,
    pub last_direction: i32,
    pub snapshot: NoteSpec,
    pub original_visible: bool,
    pub preview: Option<DragStep>,
}

impl DragSession {
    /// Start a drag on `note`; rests are rejected
    pub fn begin(
        pointer: PointerId,
        position: NotePosition,
        note: &NoteSpec,
        y: f64,
        px_per_semitone: f64,
        original_visible: bool,
    ) -> InteractionResult<Self> {
        if note.is_rest {
            return Err(InteractionError::RestNotDraggable(position));
        }
        let base_midi = note.primary_midi();
        let base_spec = note.key_pitch(0);
        Ok(Self {
            pointer,
            position,
            base_midi,
            base_spec,
            base_diatonic: base_spec.map(|s| s.diatonic_index),
            accum: 0.0,
            last_y: y,
            px_per_semitone: px_per_semitone.max(f64::EPSILON),
            preview_delta: 0,
            quantized_midi: base_midi,
            last_direction: 0,
            snapshot: note.clone(),
            original_visible,
            preview: None,
        })
    }

    fn spell(&self, midi: i32, ctx: &DragContext<'_>) -> DragStep {
        let spec = match self.base_spec {
            Some(base) if midi == self.base_midi => base,
            _ => midi_to_pitch_spec(midi, ctx.preference),
        };
        DragStep {
            midi,
            spec,
            displayed: decide_accidental_for_key(&spec, ctx.key_signature),
        }
    }

    fn target_midi(&self, direction: i32, ctx: &DragContext<'_>) -> i32 {
        let raw = (self.base_midi + self.preview_delta).clamp(ctx.midi_min, ctx.midi_max);
        match ctx.quantizer {
            Some(quantizer) => quantizer
                .quantize(QuantizeRequest {
                    preview_midi: raw,
                    last_midi: Some(self.quantized_midi),
                    direction,
                    base_midi: self.base_midi,
                })
                .clamp(ctx.midi_min, ctx.midi_max),
            None => raw,
        }
    }

    /// Feed a pointer Y; returns a new preview only when the pitch changed.
    ///
    /// Upward travel (decreasing Y) raises the pitch. A move with no
    /// vertical displacement leaves the session untouched.
    pub fn apply_move(&mut self, y: f64, ctx: &DragContext<'_>) -> Option<DragStep> {
        if !y.is_finite() {
            return None;
        }
        let dy = self.last_y - y;
        if dy == 0.0 {
            return None;
        }
        self.last_y = y;
        self.accum += dy;

        let steps = (self.accum / self.px_per_semitone).trunc() as i32;
        if steps == 0 {
            return None;
        }
        self.accum -= steps as f64 * self.px_per_semitone;
        self.preview_delta += steps;
        self.last_direction = steps.signum();

        let midi = self.target_midi(self.last_direction, ctx);
        log::debug!(
            "[drag] pointer={} steps={} delta={} midi={}",
            self.pointer,
            steps,
            self.preview_delta,
            midi
        );
        if midi == self.quantized_midi {
            return None;
        }
        self.quantized_midi = midi;
        let step = self.spell(midi, ctx);
        self.preview = Some(step);
        Some(step)
    }

    /// Pitch to commit: `base + delta`, re-quantized with the last direction.
    ///
    /// Returns `None` when the note would not change.
    pub fn commit_target(&self, ctx: &DragContext<'_>) -> Option<i32> {
        if self.preview_delta == 0 {
            return None;
        }
        let direction = match self.preview_delta.signum() {
            0 => self.last_direction,
            sign => sign,
        };
        let midi = self.target_midi(direction, ctx);
        (midi != self.base_midi).then_some(midi)
    }
}

/// Active sessions keyed by pointer
#[derive(Debug, Clone, Default)]
pub struct DragSessions {
    sessions: HashMap<PointerId, DragSession>,
}

impl DragSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session; a pointer or note that is already dragging is refused
    pub fn begin(&mut self, session: DragSession) -> InteractionResult<()> {
        if self.sessions.contains_key(&session.pointer) {
            log::warn!("[drag] duplicate session for pointer {} rejected", session.pointer);
            return Err(InteractionError::DuplicateSession(session.pointer));
        }
        if self.sessions.values().any(|s| s.position == session.position) {
            log::warn!("[drag] note {:?} already dragged by another pointer", session.position);
            return Err(InteractionError::NoteBusy(session.position));
        }
        self.sessions.insert(session.pointer, session);
        Ok(())
    }

    pub fn contains(&self, pointer: PointerId) -> bool {
        self.sessions.contains_key(&pointer)
    }

    pub fn get(&self, pointer: PointerId) -> Option<&DragSession> {
        self.sessions.get(&pointer)
    }

    pub fn get_mut(&mut self, pointer: PointerId) -> Option<&mut DragSession> {
        self.sessions.get_mut(&pointer)
    }

    pub fn get_by_note(&self, position: NotePosition) -> Option<&DragSession> {
        self.sessions.values().find(|s| s.position == position)
    }

    pub fn take(&mut self, pointer: PointerId) -> Option<DragSession> {
        self.sessions.remove(&pointer)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove every session targeting `position`
    pub fn take_for_note(&mut self, position: NotePosition) -> Vec<DragSession> {
        let pointers: Vec<PointerId> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.position == position)
            .map(|(p, _)| *p)
            .collect();
        pointers.into_iter().filter_map(|p| self.sessions.remove(&p)).collect()
    }

    /// Keep note addresses valid after an insert (`delta = 1`) or delete (`delta = -1`) at `at`
    pub fn shift_indices(&mut self, voice_index: usize, at: usize, delta: isize) {
        for session in self.sessions.values_mut() {
            let position = &mut session.position;
            if position.voice_index == voice_index && position.note_index >= at {
                position.note_index = position.note_index.saturating_add_signed(delta);
            }
        }
    }

    pub fn drain(&mut self) -> Vec<DragSession> {
        self.sessions.drain().map(|(_, s)| s).collect()
    }
}
