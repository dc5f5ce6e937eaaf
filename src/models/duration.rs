//! Duration codes and duration quantization
//!
//! Durations are expressed as fractions of a whole note (`1/4` = quarter).
//! Quantization snaps an arbitrary fractional value to the closest
//! representable `(code, dots)` pair.

use num_rational::Ratio;
use serde::{Deserialize, Serialize};

/// Base denominators the renderer can draw
pub const DURATION_DENOMS: [u32; 7] = [1, 2, 4, 8, 16, 32, 64];

/// Maximum augmentation dots
pub const MAX_DOTS: u8 = 3;

/// Distance below which a match counts as exact
pub const DURATION_TOLERANCE: f64 = 1e-6;

/// Renderer duration code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DurationCode {
    #[serde(rename = "w")]
    Whole,
    #[serde(rename = "h")]
    Half,
    #[default]
    #[serde(rename = "q")]
    Quarter,
    #[serde(rename = "8")]
    Eighth,
    #[serde(rename = "16")]
    Sixteenth,
    #[serde(rename = "32")]
    ThirtySecond,
    #[serde(rename = "64")]
    SixtyFourth,
}

impl DurationCode {
    pub fn from_denominator(denom: u32) -> Option<DurationCode> {
        match denom {
            1 => Some(DurationCode::Whole),
            2 => Some(DurationCode::Half),
            4 => Some(DurationCode::Quarter),
            8 => Some(DurationCode::Eighth),
            16 => Some(DurationCode::Sixteenth),
            32 => Some(DurationCode::ThirtySecond),
            64 => Some(DurationCode::SixtyFourth),
            _ => None,
        }
    }

    pub fn denominator(self) -> u32 {
        match self {
            DurationCode::Whole => 1,
            DurationCode::Half => 2,
            DurationCode::Quarter => 4,
            DurationCode::Eighth => 8,
            DurationCode::Sixteenth => 16,
            DurationCode::ThirtySecond => 32,
            DurationCode::SixtyFourth => 64,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            DurationCode::Whole => "w",
            DurationCode::Half => "h",
            DurationCode::Quarter => "q",
            DurationCode::Eighth => "8",
            DurationCode::Sixteenth => "16",
            DurationCode::ThirtySecond => "32",
            DurationCode::SixtyFourth => "64",
        }
    }
}

/// Closest representable duration for a requested value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationMatch {
    pub code: DurationCode,
    pub dots: u8,
    /// Absolute distance between the requested and the matched value
    pub diff: f64,
    /// `diff` is within [`DURATION_TOLERANCE`]
    pub exact: bool,
}

/// Exact length of `1/denom` with `dots` augmentation dots
pub fn duration_from_denom(denom: u32, dots: u8) -> Ratio<u32> {
    let mut value = Ratio::new(1, denom);
    let mut addition = value;
    for _ in 0..dots {
        addition /= 2;
        value += addition;
    }
    value
}

fn ratio_to_f64(value: Ratio<u32>) -> f64 {
    *value.numer() as f64 / *value.denom() as f64
}

/// Snap a whole-note fraction to the closest `(code, dots)` pair.
///
/// Candidates are visited from the longest value down; on equal distance the
/// earlier (longer, fewer dots) candidate wins. Returns `None` for
/// non-finite or non-positive input.
pub fn resolve_duration(value: f64) -> Option<DurationMatch> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    let mut best: Option<DurationMatch> = None;
    for denom in DURATION_DENOMS {
        let Some(code) = DurationCode::from_denominator(denom) else {
            continue;
        };
        for dots in 0..=MAX_DOTS {
            let diff = (ratio_to_f64(duration_from_denom(denom, dots)) - value).abs();
            let exact = diff <= DURATION_TOLERANCE;
            if best.map_or(true, |b| diff < b.diff) {
                best = Some(DurationMatch { code, dots, diff, exact });
            }
            if exact {
                break;
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_values_are_exact() {
        assert_eq!(duration_from_denom(4, 0), Ratio::new(1, 4));
        assert_eq!(duration_from_denom(4, 1), Ratio::new(3, 8));
        assert_eq!(duration_from_denom(2, 2), Ratio::new(7, 8));
        assert_eq!(duration_from_denom(1, 3), Ratio::new(15, 8));
    }

    #[test]
    fn test_resolve_exact_quarter() {
        let m = resolve_duration(0.25).unwrap();
        assert_eq!(m.code, DurationCode::Quarter);
        assert_eq!(m.dots, 0);
        assert!(m.exact);
    }

    #[test]
    fn test_resolve_dotted_half() {
        let m = resolve_duration(0.75).unwrap();
        assert_eq!(m.code, DurationCode::Half);
        assert_eq!(m.dots, 1);
        assert!(m.exact);
    }

    #[test]
    fn test_resolve_inexact_is_flagged() {
        // 0.3 is closest to a quarter (0.25) vs dotted quarter (0.375)
        let m = resolve_duration(0.3).unwrap();
        assert_eq!(m.code, DurationCode::Quarter);
        assert_eq!(m.dots, 0);
        assert!(!m.exact);
        assert!((m.diff - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_rejects_garbage() {
        assert!(resolve_duration(f64::NAN).is_none());
        assert!(resolve_duration(0.0).is_none());
        assert!(resolve_duration(-1.0).is_none());
    }

    #[test]
    fn test_code_serde() {
        assert_eq!(serde_json::to_string(&DurationCode::Eighth).unwrap(), "\"8\"");
        let parsed: DurationCode = serde_json::from_str("\"h\"").unwrap();
        assert_eq!(parsed, DurationCode::Half);
    }
}
