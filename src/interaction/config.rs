//! Interaction configuration
//!
//! Supplied by the host as a plain object, YAML or JSON. Every field has a
//! default so partial configs are accepted.

use serde::{Deserialize, Serialize};
use crate::geometry::resolver::{DEFAULT_MIDI_MAX, DEFAULT_MIDI_MIN};
use crate::interaction::diff::DictationMode;
use crate::interaction::errors::{InteractionError, InteractionResult};
use crate::models::key_signature::KeySignature;
use crate::models::pitch::SpellingPreference;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionConfig {
    pub midi_min: i32,
    pub midi_max: i32,
    pub spelling: SpellingPreference,
    pub key_signature: Option<KeySignature>,
    pub mode: DictationMode,
    /// Maximum pitched notes in the primary voice; `None` = unlimited
    pub max_notes: Option<usize>,
    /// Minimum pixels per semitone while dragging
    pub drag_threshold_floor: f64,
    /// Fraction of half a scaled line spacing that counts as one semitone
    pub drag_threshold_factor: f64,
    /// Minimum hit-test padding around noteheads
    pub hit_padding_min: f64,
    /// Hit-test padding as a fraction of line spacing
    pub hit_padding_factor: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            midi_min: DEFAULT_MIDI_MIN,
            midi_max: DEFAULT_MIDI_MAX,
            spelling: SpellingPreference::Flat,
            key_signature: None,
            mode: DictationMode::Melodic,
            max_notes: None,
            drag_threshold_floor: 2.0,
            drag_threshold_factor: 0.6,
            hit_padding_min: 4.0,
            hit_padding_factor: 0.35,
        }
    }
}

impl InteractionConfig {
    pub fn from_yaml(text: &str) -> InteractionResult<Self> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| InteractionError::InvalidConfig(e.to_string()))?;
        config.validated()
    }

    pub fn from_json(text: &str) -> InteractionResult<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| InteractionError::InvalidConfig(e.to_string()))?;
        config.validated()
    }

    /// Check ranges; MIDI bounds are clamped to 0..=127
    pub fn validated(mut self) -> InteractionResult<Self> {
        self.midi_min = self.midi_min.clamp(0, 127);
        self.midi_max = self.midi_max.clamp(0, 127);
        if self.midi_min > self.midi_max {
            return Err(InteractionError::InvalidRange(self.midi_min, self.midi_max));
        }
        if !(self.drag_threshold_floor.is_finite() && self.drag_threshold_floor > 0.0) {
            return Err(InteractionError::InvalidConfig(format!(
                "dragThresholdFloor must be positive, got {}",
                self.drag_threshold_floor
            )));
        }
        if !(self.drag_threshold_factor.is_finite() && self.drag_threshold_factor > 0.0) {
            return Err(InteractionError::InvalidConfig(format!(
                "dragThresholdFactor must be positive, got {}",
                self.drag_threshold_factor
            )));
        }
        Ok(self)
    }

    /// Pixels of vertical travel per semitone step
    pub fn px_per_semitone(&self, spacing: f64, scale_y: f64) -> f64 {
        let half_step = spacing * scale_y / 2.0;
        (half_step * self.drag_threshold_factor).max(self.drag_threshold_floor)
    }

    pub fn hit_padding(&self, spacing: f64) -> f64 {
        (spacing * self.hit_padding_factor).max(self.hit_padding_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml() {
        let config = InteractionConfig::from_yaml("midiMin: 48\nspelling: sharp\nkeySignature: D\nmaxNotes: 8\n").unwrap();
        assert_eq!(config.midi_min, 48);
        assert_eq!(config.midi_max, DEFAULT_MIDI_MAX);
        assert_eq!(config.spelling, SpellingPreference::Sharp);
        assert_eq!(config.key_signature, Some(KeySignature::D));
        assert_eq!(config.max_notes, Some(8));
    }

    #[test]
    fn test_json_and_validation() {
        let config = InteractionConfig::from_json(r#"{"mode":"harmonic"}"#).unwrap();
        assert_eq!(config.mode, DictationMode::Harmonic);
        assert!(matches!(
            InteractionConfig::from_json(r#"{"midiMin":90,"midiMax":40}"#),
            Err(InteractionError::InvalidRange(90, 40))
        ));
        assert!(InteractionConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_threshold_floor() {
        let config = InteractionConfig::default();
        // 10px spacing at scale 1: 5 * 0.6 = 3
        assert!((config.px_per_semitone(10.0, 1.0) - 3.0).abs() < 1e-9);
        assert_eq!(config.px_per_semitone(2.0, 1.0), 2.0);
        assert!((config.hit_padding(20.0) - 7.0).abs() < 1e-9);
    }
}
