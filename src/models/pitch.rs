//! Pitch spelling and MIDI conversion
//!
//! This module converts between MIDI note numbers and spelled pitches
//! (letter + accidental + octave). Two string forms are used throughout
//! the crate:
//!
//! - **key strings** as the staff renderer expects them: `"c/4"`, `"eb/4"`, `"f#/5"`
//! - **pitch tokens** as the host sequence model expects them: `"C4"`, `"Eb4"`, `"F#5"`
//!
//! MIDI 60 is C4 (middle C).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diatonic letter name, independent of any accidental
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Position within the octave (C = 0 .. B = 6)
    pub fn index(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 1,
            Letter::E => 2,
            Letter::F => 3,
            Letter::G => 4,
            Letter::A => 5,
            Letter::B => 6,
        }
    }

    /// Semitones above C for the natural form of this letter
    pub fn semitone(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    /// Parse a letter name (case-insensitive)
    pub fn from_char(c: char) -> Option<Letter> {
        match c.to_ascii_lowercase() {
            'c' => Some(Letter::C),
            'd' => Some(Letter::D),
            'e' => Some(Letter::E),
            'f' => Some(Letter::F),
            'g' => Some(Letter::G),
            'a' => Some(Letter::A),
            'b' => Some(Letter::B),
            _ => None,
        }
    }

    pub fn lower(self) -> char {
        match self {
            Letter::C => 'c',
            Letter::D => 'd',
            Letter::E => 'e',
            Letter::F => 'f',
            Letter::G => 'g',
            Letter::A => 'a',
            Letter::B => 'b',
        }
    }

    pub fn upper(self) -> char {
        self.lower().to_ascii_uppercase()
    }
}

/// Accidental attached to a spelled pitch or displayed on a notehead
///
/// Serialized as the renderer's accidental symbol (`"#"`, `"b"`, `"n"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Accidental {
    TripleFlat,
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
    TripleSharp,
}

impl Accidental {
    /// Semitone alteration relative to the natural letter
    pub fn offset(self) -> i32 {
        match self {
            Accidental::TripleFlat => -3,
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
            Accidental::TripleSharp => 3,
        }
    }

    /// Renderer symbol for this accidental
    pub fn symbol(self) -> &'static str {
        match self {
            Accidental::TripleFlat => "bbb",
            Accidental::DoubleFlat => "bb",
            Accidental::Flat => "b",
            Accidental::Natural => "n",
            Accidental::Sharp => "#",
            Accidental::DoubleSharp => "##",
            Accidental::TripleSharp => "###",
        }
    }

    /// Unicode glyph used in status labels
    pub fn glyph(self) -> &'static str {
        match self {
            Accidental::TripleFlat => "♭♭♭",
            Accidental::DoubleFlat => "♭♭",
            Accidental::Flat => "♭",
            Accidental::Natural => "♮",
            Accidental::Sharp => "♯",
            Accidental::DoubleSharp => "♯♯",
            Accidental::TripleSharp => "♯♯♯",
        }
    }

    /// Parse an accidental suffix.
    ///
    /// Accepts ASCII symbols (`#`, `b`, `n`), the `x` double-sharp shorthand
    /// and the Unicode glyphs. An empty string is not an accidental.
    pub fn from_symbol(symbol: &str) -> Option<Accidental> {
        let normalized = normalize_accidental_suffix(symbol);
        match normalized.as_str() {
            "bbb" => Some(Accidental::TripleFlat),
            "bb" => Some(Accidental::DoubleFlat),
            "b" => Some(Accidental::Flat),
            "n" => Some(Accidental::Natural),
            "#" => Some(Accidental::Sharp),
            "##" => Some(Accidental::DoubleSharp),
            "###" => Some(Accidental::TripleSharp),
            _ => None,
        }
    }

    /// Accidental with the given semitone alteration, if one exists
    pub fn from_offset(offset: i32) -> Option<Accidental> {
        match offset {
            -3 => Some(Accidental::TripleFlat),
            -2 => Some(Accidental::DoubleFlat),
            -1 => Some(Accidental::Flat),
            0 => Some(Accidental::Natural),
            1 => Some(Accidental::Sharp),
            2 => Some(Accidental::DoubleSharp),
            3 => Some(Accidental::TripleSharp),
            _ => None,
        }
    }
}

impl From<Accidental> for String {
    fn from(value: Accidental) -> Self {
        value.symbol().to_string()
    }
}

impl TryFrom<String> for Accidental {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Accidental::from_symbol(&value).ok_or_else(|| format!("Unsupported accidental \"{}\"", value))
    }
}

/// Semitone offset of an optional accidental (absent = natural)
pub fn accidental_offset(accidental: Option<Accidental>) -> i32 {
    accidental.map(Accidental::offset).unwrap_or(0)
}

/// Rewrite Unicode accidental glyphs and shorthands to ASCII symbols
pub fn normalize_accidental_suffix(input: &str) -> String {
    input
        .replace('♯', "#")
        .replace('♭', "b")
        .replace('𝄪', "##")
        .replace('𝄫', "bb")
        .replace('x', "##")
}

/// Whether black keys are spelled with flats or sharps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpellingPreference {
    #[default]
    Flat,
    Sharp,
}

impl SpellingPreference {
    /// Lenient parse used for host settings; `"natural"` maps to sharp spelling
    pub fn parse(value: &str) -> Option<SpellingPreference> {
        match value.trim().to_ascii_lowercase().as_str() {
            "flat" => Some(SpellingPreference::Flat),
            "sharp" | "natural" => Some(SpellingPreference::Sharp),
            _ => None,
        }
    }
}

const SEMITONE_TO_FLAT: [(Letter, Option<Accidental>); 12] = [
    (Letter::C, None),
    (Letter::D, Some(Accidental::Flat)),
    (Letter::D, None),
    (Letter::E, Some(Accidental::Flat)),
    (Letter::E, None),
    (Letter::F, None),
    (Letter::G, Some(Accidental::Flat)),
    (Letter::G, None),
    (Letter::A, Some(Accidental::Flat)),
    (Letter::A, None),
    (Letter::B, Some(Accidental::Flat)),
    (Letter::B, None),
];

const SEMITONE_TO_SHARP: [(Letter, Option<Accidental>); 12] = [
    (Letter::C, None),
    (Letter::C, Some(Accidental::Sharp)),
    (Letter::D, None),
    (Letter::D, Some(Accidental::Sharp)),
    (Letter::E, None),
    (Letter::F, None),
    (Letter::F, Some(Accidental::Sharp)),
    (Letter::G, None),
    (Letter::G, Some(Accidental::Sharp)),
    (Letter::A, None),
    (Letter::A, Some(Accidental::Sharp)),
    (Letter::B, None),
];

/// A fully spelled pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchSpec {
    pub letter: Letter,
    pub accidental: Option<Accidental>,
    pub octave: i32,
    /// Letter-only staff position (`octave * 7 + letter index`)
    pub diatonic_index: i32,
}

impl PitchSpec {
    pub fn new(letter: Letter, accidental: Option<Accidental>, octave: i32) -> Self {
        Self {
            letter,
            accidental,
            octave,
            diatonic_index: diatonic_index_for_letter(letter, octave),
        }
    }

    /// MIDI number of this spelling
    pub fn midi(&self) -> i32 {
        pitch_key_to_midi(self.letter, self.accidental, self.octave)
    }

    /// Renderer key string, e.g. `"eb/4"`
    pub fn key(&self) -> String {
        let accidental = match self.accidental {
            Some(Accidental::Natural) | None => "",
            Some(acc) => acc.symbol(),
        };
        format!("{}{}/{}", self.letter.lower(), accidental, self.octave)
    }

    /// Host pitch token, e.g. `"Eb4"` (naturals carry no symbol)
    pub fn token(&self) -> String {
        let accidental = match self.accidental {
            Some(Accidental::Natural) | None => "",
            Some(acc) => acc.symbol(),
        };
        format!("{}{}{}", self.letter.upper(), accidental, self.octave)
    }

    /// Whether the spelling needs no accidental at all
    pub fn is_plain(&self) -> bool {
        matches!(self.accidental, None | Some(Accidental::Natural))
    }
}

impl fmt::Display for PitchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

/// Letter-only staff ordinal (C0 = 0, D0 = 1, ... C4 = 28)
pub fn diatonic_index_for_letter(letter: Letter, octave: i32) -> i32 {
    octave * 7 + letter.index()
}

/// Spell a MIDI number.
///
/// Natural pitch classes are always spelled without an accidental; black
/// keys follow `preference`.
pub fn midi_to_pitch_spec(midi: i32, preference: SpellingPreference) -> PitchSpec {
    let semitone = midi.rem_euclid(12) as usize;
    let (letter, accidental) = match preference {
        SpellingPreference::Flat => SEMITONE_TO_FLAT[semitone],
        SpellingPreference::Sharp => SEMITONE_TO_SHARP[semitone],
    };
    let octave = midi.div_euclid(12) - 1;
    PitchSpec::new(letter, accidental, octave)
}

/// MIDI number for any spelling (inverse of [`midi_to_pitch_spec`])
pub fn pitch_key_to_midi(letter: Letter, accidental: Option<Accidental>, octave: i32) -> i32 {
    12 * (octave + 1) + letter.semitone() + accidental_offset(accidental)
}

/// Split `<letter><accidental><octave>` into its parts.
///
/// `separator` is `Some('/')` for renderer key strings and `None` for pitch tokens.
fn split_spelled(input: &str, separator: Option<char>) -> Option<PitchSpec> {
    let trimmed = input.trim();
    let mut chars = trimmed.chars();
    let letter = Letter::from_char(chars.next()?)?;
    let rest = chars.as_str();

    let (accidental_raw, octave_raw) = match separator {
        Some(sep) => rest.split_once(sep)?,
        None => {
            let split_at = rest
                .char_indices()
                .find(|(_, c)| c.is_ascii_digit() || *c == '-')
                .map(|(i, _)| i)?;
            rest.split_at(split_at)
        }
    };

    let accidental = if accidental_raw.is_empty() {
        None
    } else {
        Some(Accidental::from_symbol(accidental_raw)?)
    };
    let octave: i32 = octave_raw.trim().parse().ok()?;
    Some(PitchSpec::new(letter, accidental, octave))
}

/// Parse a renderer key string such as `"eb/4"` or `"F#/5"`
pub fn parse_key_string(key: &str) -> Option<PitchSpec> {
    split_spelled(key, Some('/'))
}

/// Parse a host pitch token such as `"Eb4"`, `"C#5"` or `"B♭3"`
pub fn parse_pitch_token(token: &str) -> Option<PitchSpec> {
    split_spelled(token, None)
}

/// MIDI number of a pitch token, if it parses
pub fn token_to_midi(token: &str) -> Option<i32> {
    parse_pitch_token(token).map(|spec| spec.midi())
}

/// Sort pitch tokens from lowest to highest; unparseable tokens sort first
pub fn sort_tokens_ascending(tokens: &mut [String]) {
    tokens.sort_by_key(|token| token_to_midi(token));
}

/// Status label for a pitch with the accidental actually displayed, e.g. `E♭4`
pub fn format_pitch_label(spec: &PitchSpec, displayed: Option<Accidental>) -> String {
    let glyph = displayed.map(Accidental::glyph).unwrap_or("");
    format!("{}{}{}", spec.letter.upper(), glyph, spec.octave)
}
