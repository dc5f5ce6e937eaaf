//! Major key signatures and key-aware accidental display
//!
//! A key signature implies an alteration (-1, 0, +1) for every letter. When a
//! pitch is written on the staff, the accidental shown next to the notehead
//! depends on whether the pitch's own alteration differs from that implied one.

use serde::{Deserialize, Serialize};
use crate::models::pitch::{accidental_offset, normalize_accidental_suffix, Accidental, Letter, PitchSpec};

/// The fifteen major key signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeySignature {
    #[serde(rename = "C")]
    C,
    #[serde(rename = "G")]
    G,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "E")]
    E,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "F#")]
    FSharp,
    #[serde(rename = "C#")]
    CSharp,
    #[serde(rename = "F")]
    F,
    #[serde(rename = "Bb")]
    BFlat,
    #[serde(rename = "Eb")]
    EFlat,
    #[serde(rename = "Ab")]
    AFlat,
    #[serde(rename = "Db")]
    DFlat,
    #[serde(rename = "Gb")]
    GFlat,
    #[serde(rename = "Cb")]
    CFlat,
}

/// Order in which sharps are added to a key signature
const SHARP_ORDER: [Letter; 7] = [
    Letter::F,
    Letter::C,
    Letter::G,
    Letter::D,
    Letter::A,
    Letter::E,
    Letter::B,
];

/// Order in which flats are added to a key signature
const FLAT_ORDER: [Letter; 7] = [
    Letter::B,
    Letter::E,
    Letter::A,
    Letter::D,
    Letter::G,
    Letter::C,
    Letter::F,
];

impl KeySignature {
    pub const ALL: [KeySignature; 15] = [
        KeySignature::C,
        KeySignature::G,
        KeySignature::D,
        KeySignature::A,
        KeySignature::E,
        KeySignature::B,
        KeySignature::FSharp,
        KeySignature::CSharp,
        KeySignature::F,
        KeySignature::BFlat,
        KeySignature::EFlat,
        KeySignature::AFlat,
        KeySignature::DFlat,
        KeySignature::GFlat,
        KeySignature::CFlat,
    ];

    /// Position on the circle of fifths: positive = number of sharps,
    /// negative = number of flats
    pub fn fifths(self) -> i32 {
        match self {
            KeySignature::C => 0,
            KeySignature::G => 1,
            KeySignature::D => 2,
            KeySignature::A => 3,
            KeySignature::E => 4,
            KeySignature::B => 5,
            KeySignature::FSharp => 6,
            KeySignature::CSharp => 7,
            KeySignature::F => -1,
            KeySignature::BFlat => -2,
            KeySignature::EFlat => -3,
            KeySignature::AFlat => -4,
            KeySignature::DFlat => -5,
            KeySignature::GFlat => -6,
            KeySignature::CFlat => -7,
        }
    }

    /// Canonical name (`"C"`, `"F#"`, `"Bb"`, ...)
    pub fn name(self) -> &'static str {
        match self {
            KeySignature::C => "C",
            KeySignature::G => "G",
            KeySignature::D => "D",
            KeySignature::A => "A",
            KeySignature::E => "E",
            KeySignature::B => "B",
            KeySignature::FSharp => "F#",
            KeySignature::CSharp => "C#",
            KeySignature::F => "F",
            KeySignature::BFlat => "Bb",
            KeySignature::EFlat => "Eb",
            KeySignature::AFlat => "Ab",
            KeySignature::DFlat => "Db",
            KeySignature::GFlat => "Gb",
            KeySignature::CFlat => "Cb",
        }
    }

    /// Alteration the signature implies for `letter` (-1 flat, 0 natural, +1 sharp)
    pub fn alteration(self, letter: Letter) -> i32 {
        let fifths = self.fifths();
        if fifths > 0 {
            let count = fifths as usize;
            if SHARP_ORDER[..count].contains(&letter) { 1 } else { 0 }
        } else if fifths < 0 {
            let count = (-fifths) as usize;
            if FLAT_ORDER[..count].contains(&letter) { -1 } else { 0 }
        } else {
            0
        }
    }

    /// Normalize a key-signature token to a supported major key.
    ///
    /// Only the first whitespace-separated word is considered, so
    /// `"D major"` and `"Eb maj"` both work. Returns `None` when the token
    /// does not name one of the fifteen signatures.
    pub fn canonicalize(input: &str) -> Option<KeySignature> {
        let primary = input.split_whitespace().next()?;
        let mut chars = primary.chars();
        let letter = Letter::from_char(chars.next()?)?;
        let suffix: String = chars
            .take_while(|c| matches!(c, '#' | 'b' | '♯' | '♭' | 'x' | '𝄪' | '𝄫'))
            .collect();
        let canonical = format!("{}{}", letter.upper(), normalize_accidental_suffix(&suffix));
        KeySignature::ALL.into_iter().find(|key| key.name() == canonical)
    }
}

/// Decide which accidental to display for a spelled pitch under a key signature.
///
/// - `None` when the pitch's alteration already matches the key signature
/// - `Some(Natural)` when the pitch cancels a key-signature alteration
/// - otherwise the pitch's own accidental
///
/// A missing key signature behaves like C major.
pub fn decide_accidental_for_key(spec: &PitchSpec, key: Option<KeySignature>) -> Option<Accidental> {
    let base_offset = key.map(|k| k.alteration(spec.letter)).unwrap_or(0);
    let derived_offset = accidental_offset(spec.accidental);
    if derived_offset == base_offset {
        return None;
    }
    if derived_offset == 0 {
        return Some(Accidental::Natural);
    }
    spec.accidental
}
