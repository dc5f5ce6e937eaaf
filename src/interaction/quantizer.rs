//! Pitch-class quantizer
//!
//! Restricts proposed pitches to an allowed set of pitch classes (usually a
//! scale) inside a MIDI range, searching outward in the direction the pointer
//! is travelling.

use std::fmt;

use serde::{Deserialize, Serialize};
use crate::geometry::resolver::{DEFAULT_MIDI_MAX, DEFAULT_MIDI_MIN};
use crate::interaction::errors::{InteractionError, InteractionResult};
use crate::models::pitch::{accidental_offset, Accidental, Letter};

/// Set of pitch classes (0 = C … 11 = B) as a 12-bit mask
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PitchClassSet(u16);

impl fmt::Debug for PitchClassSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.classes()).finish()
    }
}

impl PitchClassSet {
    pub const CHROMATIC: PitchClassSet = PitchClassSet(0x0fff);

    pub fn empty() -> Self {
        PitchClassSet(0)
    }

    pub fn insert(&mut self, class: i32) {
        self.0 |= 1 << class.rem_euclid(12);
    }

    pub fn contains(&self, class: i32) -> bool {
        self.0 & (1 << class.rem_euclid(12)) != 0
    }

    pub fn contains_midi(&self, midi: i32) -> bool {
        self.contains(midi)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn classes(&self) -> Vec<i32> {
        (0..12).filter(|c| self.contains(*c)).collect()
    }

    /// Classes from integers, taken mod 12
    pub fn from_integers(values: &[i32]) -> Self {
        let mut set = Self::empty();
        for value in values {
            set.insert(*value);
        }
        set
    }

    /// Classes from note-name tokens (`"C"`, `"F#"`, `"Bb"`, `"Eb4"`).
    ///
    /// Octave digits are ignored; unreadable tokens are skipped.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut set = Self::empty();
        for token in tokens {
            match token_pitch_class(token.as_ref()) {
                Some(class) => set.insert(class),
                None => log::warn!("[quantizer] ignoring pitch-class token {:?}", token.as_ref()),
            }
        }
        set
    }
}

/// Pitch class of a letter+accidental token with an optional octave suffix
pub fn token_pitch_class(token: &str) -> Option<i32> {
    let trimmed = token.trim();
    let mut chars = trimmed.chars();
    let letter = Letter::from_char(chars.next()?)?;
    let suffix = chars
        .as_str()
        .trim_end_matches(|c: char| c.is_ascii_digit() || c == '-');
    let accidental = if suffix.is_empty() {
        None
    } else {
        Some(Accidental::from_symbol(suffix)?)
    };
    Some((letter.semitone() + accidental_offset(accidental)).rem_euclid(12))
}

/// Inputs for one quantization step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizeRequest {
    pub preview_midi: i32,
    pub last_midi: Option<i32>,
    /// Recent movement; only the sign matters
    pub direction: i32,
    pub base_midi: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchQuantizer {
    allowed: PitchClassSet,
    midi_min: i32,
    midi_max: i32,
}

impl PitchQuantizer {
    pub fn new(allowed: PitchClassSet, midi_min: i32, midi_max: i32) -> InteractionResult<Self> {
        if allowed.is_empty() {
            return Err(InteractionError::EmptyPitchClassSet);
        }
        if midi_min > midi_max {
            return Err(InteractionError::InvalidRange(midi_min, midi_max));
        }
        Ok(Self { allowed, midi_min, midi_max })
    }

    /// Quantizer over tokens and an optional range (defaults 36..=96)
    pub fn from_tokens<S: AsRef<str>>(
        tokens: &[S],
        midi_min: Option<i32>,
        midi_max: Option<i32>,
    ) -> InteractionResult<Self> {
        Self::new(
            PitchClassSet::from_tokens(tokens),
            midi_min.unwrap_or(DEFAULT_MIDI_MIN),
            midi_max.unwrap_or(DEFAULT_MIDI_MAX),
        )
    }

    pub fn allowed(&self) -> PitchClassSet {
        self.allowed
    }

    pub fn range(&self) -> (i32, i32) {
        (self.midi_min, self.midi_max)
    }

    pub fn clamp(&self, midi: i32) -> i32 {
        midi.clamp(self.midi_min, self.midi_max)
    }

    pub fn is_allowed(&self, midi: i32) -> bool {
        midi >= self.midi_min && midi <= self.midi_max && self.allowed.contains_midi(midi)
    }

    /// First allowed pitch walking from `from` by `step` up to the range bound
    fn search(&self, from: i32, step: i32) -> Option<i32> {
        let mut candidate = from;
        while candidate >= self.midi_min && candidate <= self.midi_max {
            if self.allowed.contains_midi(candidate) {
                return Some(candidate);
            }
            candidate += step;
        }
        None
    }

    /// Nearest allowed pitch either side, ties upward
    fn nearest(&self, from: i32) -> Option<i32> {
        let up = self.search(from, 1);
        let down = self.search(from, -1);
        match (up, down) {
            (Some(u), Some(d)) => Some(if u - from <= from - d { u } else { d }),
            (u, d) => u.or(d),
        }
    }

    /// Snap a proposed pitch to the allowed set.
    ///
    /// An allowed preview is returned clamped; otherwise the search runs in
    /// the hinted direction, then the opposite one, then falls back to
    /// `base_midi` (if allowed) or the clamped preview.
    pub fn quantize(&self, request: QuantizeRequest) -> i32 {
        let clamped = self.clamp(request.preview_midi);
        if self.allowed.contains_midi(clamped) {
            return clamped;
        }

        let hint = match request.direction.signum() {
            0 => request
                .last_midi
                .map(|last| (request.preview_midi - last).signum())
                .unwrap_or(0),
            sign => sign,
        };

        let found = if hint == 0 {
            self.nearest(clamped)
        } else {
            self.search(clamped, hint).or_else(|| self.search(clamped, -hint))
        };

        match found {
            Some(midi) => midi,
            None if self.is_allowed(request.base_midi) => request.base_midi,
            None => clamped,
        }
    }
}
