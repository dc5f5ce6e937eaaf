//! Note specifications and voices
//!
//! A `NoteSpec` is the renderer-facing description of one musical event. It
//! carries parallel lists: renderer key strings, the accidental actually
//! displayed for each key (which depends on the key signature), and an
//! optional MIDI cache.

use serde::{Deserialize, Serialize};
use crate::models::clef::Clef;
use crate::models::duration::DurationCode;
use crate::models::key_signature::{decide_accidental_for_key, KeySignature};
use crate::models::pitch::{
    midi_to_pitch_spec, parse_key_string, Accidental, PitchSpec, SpellingPreference,
};

/// MIDI number used when a note carries no readable pitch
pub const FALLBACK_MIDI: i32 = 60;

/// Address of a note inside a staff view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePosition {
    pub voice_index: usize,
    pub note_index: usize,
}

impl NotePosition {
    pub fn new(voice_index: usize, note_index: usize) -> Self {
        Self { voice_index, note_index }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSpec {
    /// Renderer key strings, one per chord member (`"eb/4"`)
    pub keys: Vec<String>,

    /// Displayed accidental per key (`None` = implied by key signature)
    #[serde(default)]
    pub accidentals: Vec<Option<Accidental>>,

    /// Cached MIDI numbers, parallel to `keys`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midis: Option<Vec<i32>>,

    #[serde(default)]
    pub duration: DurationCode,

    #[serde(default)]
    pub dots: u8,

    #[serde(default)]
    pub is_rest: bool,

    #[serde(default)]
    pub clef: Clef,
}

/// Result of writing a new pitch into a note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchUpdate {
    pub midi: i32,
    pub spec: PitchSpec,
    pub accidental: Option<Accidental>,
}

impl NoteSpec {
    /// Single-key note for a spelled pitch
    pub fn from_pitch(
        spec: &PitchSpec,
        displayed: Option<Accidental>,
        duration: DurationCode,
        dots: u8,
        clef: Clef,
    ) -> Self {
        Self {
            keys: vec![spec.key()],
            accidentals: vec![displayed],
            midis: Some(vec![spec.midi()]),
            duration,
            dots,
            is_rest: false,
            clef,
        }
    }

    pub fn rest(duration: DurationCode, clef: Clef) -> Self {
        Self {
            keys: vec!["b/4".to_string()],
            accidentals: vec![None],
            midis: None,
            duration,
            dots: 0,
            is_rest: true,
            clef,
        }
    }

    /// Spelled pitch of key `index`.
    ///
    /// The key string's own accidental wins; a bare key (`"e/4"`) takes its
    /// alteration from the parallel displayed accidental.
    pub fn key_pitch(&self, index: usize) -> Option<PitchSpec> {
        let mut spec = parse_key_string(self.keys.get(index)?)?;
        if spec.accidental.is_none() {
            spec.accidental = self.accidentals.get(index).copied().flatten();
        }
        Some(spec)
    }

    /// MIDI numbers recomputed from keys + accidentals
    pub fn computed_midis(&self) -> Vec<i32> {
        (0..self.keys.len())
            .map(|i| self.key_pitch(i).map(|p| p.midi()).unwrap_or(FALLBACK_MIDI))
            .collect()
    }

    /// Primary (first key) MIDI number: cache first, then keys, then C4
    pub fn primary_midi(&self) -> i32 {
        if let Some(midi) = self.midis.as_ref().and_then(|m| m.first()) {
            return *midi;
        }
        self.key_pitch(0).map(|p| p.midi()).unwrap_or(FALLBACK_MIDI)
    }

    /// Bring the parallel lists back in line.
    ///
    /// Pads or truncates `accidentals` to `keys.len()` and recomputes a MIDI
    /// cache that is the wrong length or disagrees with the keys.
    pub fn normalize(&mut self) {
        self.accidentals.resize(self.keys.len(), None);
        if let Some(cached) = &self.midis {
            let computed = self.computed_midis();
            if *cached != computed {
                self.midis = Some(computed);
            }
        }
    }

    /// Write `midi` into key `index`, spelling it with `preference` and
    /// choosing the displayed accidental for `key`.
    pub fn apply_pitch_update(
        &mut self,
        midi: i32,
        key: Option<KeySignature>,
        preference: SpellingPreference,
        index: usize,
    ) -> PitchUpdate {
        let spec = midi_to_pitch_spec(midi, preference);
        let accidental = decide_accidental_for_key(&spec, key);
        let len = self.keys.len().max(index + 1);
        self.keys.resize(len, "c/4".to_string());
        self.accidentals.resize(len, None);
        self.keys[index] = spec.key();
        self.accidentals[index] = accidental;
        let mut midis = self.computed_midis();
        midis[index] = midi;
        self.midis = Some(midis);
        PitchUpdate { midi, spec, accidental }
    }

    /// Copy of this note redrawn at `pitch`, used for drag previews.
    ///
    /// Only the first key moves; the MIDI cache is dropped because the
    /// preview is never committed.
    pub fn preview_at(&self, pitch: &PitchSpec, displayed: Option<Accidental>) -> NoteSpec {
        let mut preview = self.clone();
        if preview.keys.is_empty() {
            preview.keys.push(pitch.key());
        } else {
            preview.keys[0] = pitch.key();
        }
        preview.accidentals.resize(preview.keys.len(), None);
        preview.accidentals[0] = displayed;
        preview.midis = None;
        preview
    }

    /// Host pitch tokens (`"Eb4"`) for every readable key
    pub fn pitch_tokens(&self) -> Vec<String> {
        (0..self.keys.len())
            .filter_map(|i| self.key_pitch(i))
            .map(|p| p.token())
            .collect()
    }

    /// Rewrite keys with their full spelling and re-decide every displayed
    /// accidental for `key`.
    pub fn respell_for_key(&mut self, key: Option<KeySignature>) {
        if self.is_rest {
            return;
        }
        self.accidentals.resize(self.keys.len(), None);
        for index in 0..self.keys.len() {
            if let Some(pitch) = self.key_pitch(index) {
                self.keys[index] = pitch.key();
                self.accidentals[index] = decide_accidental_for_key(&pitch, key);
            }
        }
        if self.midis.is_some() {
            self.midis = Some(self.computed_midis());
        }
    }

    /// Add a chord member, keeping keys ordered low to high.
    ///
    /// Returns `false` (and leaves the chord alone) when the pitch is
    /// already present.
    pub fn add_key(&mut self, pitch: &PitchSpec, displayed: Option<Accidental>) -> bool {
        let midi = pitch.midi();
        let mut members: Vec<(i32, String, Option<Accidental>)> = (0..self.keys.len())
            .map(|i| {
                let member_midi = self.key_pitch(i).map(|p| p.midi()).unwrap_or(FALLBACK_MIDI);
                (member_midi, self.keys[i].clone(), self.accidentals.get(i).copied().flatten())
            })
            .collect();
        if members.iter().any(|(m, _, _)| *m == midi) {
            return false;
        }
        members.push((midi, pitch.key(), displayed));
        members.sort_by_key(|(m, _, _)| *m);

        self.midis = Some(members.iter().map(|(m, _, _)| *m).collect());
        self.accidentals = members.iter().map(|(_, _, a)| *a).collect();
        self.keys = members.into_iter().map(|(_, k, _)| k).collect();
        true
    }
}

/// An ordered sequence of notes on one staff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    pub clef: Clef,
    pub index: usize,
    #[serde(default)]
    pub notes: Vec<NoteSpec>,
}

impl Voice {
    pub fn new(index: usize, clef: Clef) -> Self {
        Self { clef, index, notes: Vec::new() }
    }

    /// Template for a newly inserted note: last note's duration, dots and clef
    pub fn insertion_template(&self) -> (DurationCode, u8, Clef) {
        self.notes
            .last()
            .map(|n| (n.duration, n.dots, n.clef))
            .unwrap_or((DurationCode::Quarter, 0, self.clef))
    }
}
