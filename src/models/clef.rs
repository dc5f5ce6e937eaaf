//! Clefs and their letter/octave → staff line mapping
//!
//! Staff lines are numbered the way the renderer numbers them: the bottom
//! line of the five-line staff is line 1, the top line is line 5, and each
//! diatonic step moves half a line. For the treble clef C4 sits on line 0
//! (the first ledger line below the staff).

use serde::{Deserialize, Serialize};
use crate::models::pitch::Letter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Clef {
    #[default]
    Treble,
    Bass,
    Alto,
    Tenor,
    Soprano,
    MezzoSoprano,
    BaritoneC,
    BaritoneF,
    Subbass,
    French,
    Percussion,
}

impl Clef {
    /// Line shift relative to the treble clef
    pub fn line_shift(self) -> f64 {
        match self {
            Clef::Treble | Clef::Percussion => 0.0,
            Clef::Bass => 6.0,
            Clef::Alto => 3.0,
            Clef::Tenor => 4.0,
            Clef::Soprano => 1.0,
            Clef::MezzoSoprano => 2.0,
            Clef::BaritoneC | Clef::BaritoneF => 5.0,
            Clef::Subbass => 7.0,
            Clef::French => -1.0,
        }
    }

    /// Staff line (bottom line = 1, top line = 5) for a letter and octave
    pub fn line_for(self, letter: Letter, octave: i32) -> f64 {
        let base_index = octave * 7 - 4 * 7;
        (base_index + letter.index()) as f64 / 2.0 + self.line_shift()
    }

    /// Line counted downward from the top staff line (top line = 0).
    ///
    /// This is the line argument expected by screen-space geometry
    /// (`y = top_y + line * spacing`).
    pub fn line_from_top(self, letter: Letter, octave: i32) -> f64 {
        5.0 - self.line_for(letter, octave)
    }

    pub fn parse(name: &str) -> Option<Clef> {
        match name.trim().to_ascii_lowercase().as_str() {
            "treble" => Some(Clef::Treble),
            "bass" => Some(Clef::Bass),
            "alto" => Some(Clef::Alto),
            "tenor" => Some(Clef::Tenor),
            "soprano" => Some(Clef::Soprano),
            "mezzo-soprano" => Some(Clef::MezzoSoprano),
            "baritone-c" => Some(Clef::BaritoneC),
            "baritone-f" => Some(Clef::BaritoneF),
            "subbass" => Some(Clef::Subbass),
            "french" => Some(Clef::French),
            "percussion" => Some(Clef::Percussion),
            _ => None,
        }
    }

    /// Guess treble or bass from a set of pitches.
    ///
    /// Uses the median MIDI note (robust to outliers): below middle C → bass.
    /// An empty set defaults to treble.
    pub fn guess_from_midis(midis: &[i32]) -> Clef {
        if midis.is_empty() {
            return Clef::Treble;
        }
        let mut sorted = midis.to_vec();
        sorted.sort_unstable();
        let median = sorted[sorted.len() / 2];
        if median < 60 {
            Clef::Bass
        } else {
            Clef::Treble
        }
    }
}
