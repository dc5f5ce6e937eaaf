//! Vertical coordinate → pitch resolution
//!
//! Scans a bounded MIDI range, places every candidate on the staff through
//! the clef's line mapping, and picks the one whose screen Y is closest to the
//! pointer. A live [`StaffGeometryProvider`] is used when the renderer offers
//! one; otherwise the linear metrics formula stands in.

use serde::{Deserialize, Serialize};
use crate::geometry::metrics::{LinearStaffGeometry, StaffGeometryProvider, StaffMetrics};
use crate::models::clef::Clef;
use crate::models::pitch::{midi_to_pitch_spec, PitchSpec, SpellingPreference};

pub const DEFAULT_MIDI_MIN: i32 = 36;
pub const DEFAULT_MIDI_MAX: i32 = 96;

const TIE_EPSILON: f64 = 1e-6;

/// Search parameters for [`find_closest_pitch_for_y`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchSearch {
    pub midi_min: i32,
    pub midi_max: i32,
    /// Break ties toward the spelling without an accidental
    pub prefer_natural: bool,
    pub preference: SpellingPreference,
}

impl Default for PitchSearch {
    fn default() -> Self {
        Self {
            midi_min: DEFAULT_MIDI_MIN,
            midi_max: DEFAULT_MIDI_MAX,
            prefer_natural: true,
            preference: SpellingPreference::Flat,
        }
    }
}

impl PitchSearch {
    /// Range clamped to valid MIDI and put in ascending order
    fn bounds(&self) -> (i32, i32) {
        let lo = self.midi_min.clamp(0, 127);
        let hi = self.midi_max.clamp(0, 127);
        if lo <= hi { (lo, hi) } else { (hi, lo) }
    }
}

/// Closest pitch found for a Y coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPitch {
    pub midi: i32,
    pub spec: PitchSpec,
    /// Line counted from the top staff line
    pub line: f64,
    /// Screen Y of the candidate
    pub y: f64,
    /// `|y - target_y|`
    pub diff: f64,
}

/// Where line positions come from for one resolution
enum LineSource<'a> {
    Live(&'a dyn StaffGeometryProvider),
    Linear(LinearStaffGeometry),
}

impl LineSource<'_> {
    /// Live provider first, then the linear metrics formula
    fn candidates<'a>(
        provider: Option<&'a dyn StaffGeometryProvider>,
        metrics: Option<&StaffMetrics>,
    ) -> impl Iterator<Item = LineSource<'a>> {
        let live = provider.map(LineSource::Live);
        let linear = metrics
            .and_then(LinearStaffGeometry::from_metrics)
            .map(LineSource::Linear);
        live.into_iter().chain(linear)
    }

    fn y_for_line(&self, line: f64) -> f64 {
        match self {
            LineSource::Live(provider) => provider.y_for_line(line),
            LineSource::Linear(linear) => linear.y_for_line(line),
        }
    }

    fn line_for_y(&self, y: f64) -> f64 {
        match self {
            LineSource::Live(provider) => provider.line_for_y(y),
            LineSource::Linear(linear) => linear.line_for_y(y),
        }
    }

    fn closest_pitch(&self, target_y: f64, clef: Clef, search: PitchSearch) -> Option<ResolvedPitch> {
        let (lo, hi) = search.bounds();
        let mut best: Option<ResolvedPitch> = None;
        for midi in lo..=hi {
            let spec = midi_to_pitch_spec(midi, search.preference);
            let line = clef.line_from_top(spec.letter, spec.octave);
            let y = self.y_for_line(line);
            if !y.is_finite() {
                continue;
            }
            let diff = (y - target_y).abs();

            let replace = match &best {
                None => true,
                Some(current) if diff < current.diff - TIE_EPSILON => true,
                Some(current) if (diff - current.diff).abs() <= TIE_EPSILON => {
                    search.prefer_natural && !current.spec.is_plain() && spec.is_plain()
                }
                Some(_) => false,
            };
            if replace {
                best = Some(ResolvedPitch { midi, spec, line, y, diff });
                // Exact hit; a plain spelling cannot be beaten
                if diff == 0.0 && (spec.is_plain() || !search.prefer_natural) {
                    break;
                }
            }
        }
        best
    }
}

/// Resolve a Y coordinate to the nearest pitch for `clef`.
///
/// The live provider is tried first. If it yields no finite positions the
/// linear metrics formula is used instead. Returns `None` when `target_y`
/// is not finite or neither source can place a candidate. Never guesses.
pub fn find_closest_pitch_for_y(
    target_y: f64,
    clef: Clef,
    provider: Option<&dyn StaffGeometryProvider>,
    metrics: Option<&StaffMetrics>,
    search: PitchSearch,
) -> Option<ResolvedPitch> {
    if !target_y.is_finite() {
        return None;
    }
    let best = LineSource::candidates(provider, metrics)
        .find_map(|source| source.closest_pitch(target_y, clef, search));

    log::debug!(
        "[resolver] y={:.2} clef={:?} -> {:?}",
        target_y,
        clef,
        best.map(|b| (b.midi, b.spec.token(), b.diff))
    );
    best
}

/// Fractional staff line (from the top line) under a Y coordinate
pub fn line_for_y(
    y: f64,
    provider: Option<&dyn StaffGeometryProvider>,
    metrics: Option<&StaffMetrics>,
) -> Option<f64> {
    LineSource::candidates(provider, metrics)
        .map(|source| source.line_for_y(y))
        .find(|line| line.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> StaffMetrics {
        StaffMetrics {
            top_y: 40.0,
            bottom_y: 80.0,
            spacing: 10.0,
            x_start: 0.0,
            x_end: 400.0,
            clef: Clef::Treble,
        }
    }

    struct OffsetStaff;

    impl StaffGeometryProvider for OffsetStaff {
        fn y_for_line(&self, line: f64) -> f64 {
            100.0 + line * 20.0
        }
        fn line_for_y(&self, y: f64) -> f64 {
            (y - 100.0) / 20.0
        }
    }

    #[test]
    fn test_top_line_is_f5_in_treble() {
        let hit = find_closest_pitch_for_y(40.0, Clef::Treble, None, Some(&metrics()), PitchSearch::default())
            .expect("metrics are usable");
        assert_eq!(hit.midi, 77);
        assert_eq!(hit.spec.token(), "F5");
        assert_eq!(hit.diff, 0.0);
    }

    #[test]
    fn test_bottom_line_is_e4_and_natural_wins_tie() {
        // Eb4 and E4 share the bottom line; the natural spelling wins
        let hit = find_closest_pitch_for_y(80.0, Clef::Treble, None, Some(&metrics()), PitchSearch::default())
            .unwrap();
        assert_eq!(hit.spec.token(), "E4");
        assert_eq!(hit.midi, 64);
    }

    #[test]
    fn test_flat_spelling_kept_when_not_preferring_natural() {
        let search = PitchSearch { prefer_natural: false, ..PitchSearch::default() };
        let hit = find_closest_pitch_for_y(80.0, Clef::Treble, None, Some(&metrics()), search).unwrap();
        assert_eq!(hit.spec.token(), "Eb4");
    }

    #[test]
    fn test_bass_clef_top_line() {
        let hit = find_closest_pitch_for_y(40.0, Clef::Bass, None, Some(&metrics()), PitchSearch::default())
            .unwrap();
        assert_eq!(hit.spec.token(), "A3");
    }

    #[test]
    fn test_live_provider_takes_precedence() {
        // Live staff: top line at 100 with spacing 20
        let hit = find_closest_pitch_for_y(100.0, Clef::Treble, Some(&OffsetStaff), Some(&metrics()), PitchSearch::default())
            .unwrap();
        assert_eq!(hit.spec.token(), "F5");
    }

    struct BrokenStaff;

    impl StaffGeometryProvider for BrokenStaff {
        fn y_for_line(&self, _line: f64) -> f64 {
            f64::NAN
        }
        fn line_for_y(&self, _y: f64) -> f64 {
            f64::NAN
        }
    }

    #[test]
    fn test_broken_provider_falls_back_to_metrics() {
        let hit = find_closest_pitch_for_y(60.0, Clef::Treble, Some(&BrokenStaff), Some(&metrics()), PitchSearch::default())
            .unwrap();
        assert_eq!(hit.spec.token(), "B4");
        assert_eq!(line_for_y(60.0, Some(&BrokenStaff), Some(&metrics())), Some(2.0));
        assert!(find_closest_pitch_for_y(60.0, Clef::Treble, Some(&BrokenStaff), None, PitchSearch::default()).is_none());
    }

    #[test]
    fn test_far_positions_clamp_to_range() {
        let search = PitchSearch { midi_min: 60, midi_max: 72, ..PitchSearch::default() };
        let hit = find_closest_pitch_for_y(-500.0, Clef::Treble, None, Some(&metrics()), search).unwrap();
        assert_eq!(hit.midi, 72);
        let low = find_closest_pitch_for_y(5000.0, Clef::Treble, None, Some(&metrics()), search).unwrap();
        assert_eq!(low.midi, 60);
    }

    #[test]
    fn test_unresolvable_without_geometry() {
        assert!(find_closest_pitch_for_y(50.0, Clef::Treble, None, None, PitchSearch::default()).is_none());
        let mut broken = metrics();
        broken.spacing = f64::NAN;
        assert!(find_closest_pitch_for_y(50.0, Clef::Treble, None, Some(&broken), PitchSearch::default()).is_none());
        assert!(find_closest_pitch_for_y(f64::NAN, Clef::Treble, None, Some(&metrics()), PitchSearch::default()).is_none());
    }

    #[test]
    fn test_line_for_y_fallback() {
        assert_eq!(line_for_y(60.0, None, Some(&metrics())), Some(2.0));
        assert_eq!(line_for_y(140.0, Some(&OffsetStaff), Some(&metrics())), Some(2.0));
        assert_eq!(line_for_y(60.0, None, None), None);
    }
}
