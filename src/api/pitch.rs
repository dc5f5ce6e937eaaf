//! Stateless pitch utilities exported to JavaScript

use wasm_bindgen::prelude::*;

use crate::api::helpers::{deserialize, key_signature_from_str, serialize, spelling_from_str, validation_error};
use crate::interaction::diff::diff_sequences;
use crate::models::duration::resolve_duration;
use crate::models::key_signature::decide_accidental_for_key;
use crate::models::pitch::{format_pitch_label, midi_to_pitch_spec, parse_pitch_token, token_to_midi};

/// Spell a MIDI number: `{letter, accidental, octave, diatonicIndex}`
#[wasm_bindgen(js_name = midiToPitchSpec)]
pub fn midi_to_pitch_spec_js(midi: i32, preference: &str) -> Result<JsValue, JsValue> {
    let preference = spelling_from_str(preference)?;
    serialize(&midi_to_pitch_spec(midi, preference), "midiToPitchSpec")
}

/// MIDI number of a pitch token such as `"Eb4"`
#[wasm_bindgen(js_name = pitchTokenToMidi)]
pub fn pitch_token_to_midi(token: &str) -> Result<i32, JsValue> {
    token_to_midi(token).ok_or_else(|| validation_error(format!("Unreadable pitch token: '{}'", token)))
}

/// Accidental to display for a pitch token under a key (`null` = none shown)
#[wasm_bindgen(js_name = decideAccidentalForKey)]
pub fn decide_accidental_for_key_js(token: &str, key_signature: &str) -> Result<Option<String>, JsValue> {
    let spec = parse_pitch_token(token)
        .ok_or_else(|| validation_error(format!("Unreadable pitch token: '{}'", token)))?;
    let key = key_signature_from_str(key_signature);
    Ok(decide_accidental_for_key(&spec, key).map(|a| a.symbol().to_string()))
}

/// Status label such as `E♭4`, showing only the accidental the key requires
#[wasm_bindgen(js_name = formatPitchLabel)]
pub fn format_pitch_label_js(token: &str, key_signature: &str) -> Result<String, JsValue> {
    let spec = parse_pitch_token(token)
        .ok_or_else(|| validation_error(format!("Unreadable pitch token: '{}'", token)))?;
    let displayed = decide_accidental_for_key(&spec, key_signature_from_str(key_signature));
    Ok(format_pitch_label(&spec, displayed))
}

/// Duration code and dots for a length in whole notes (`0.375` = dotted quarter)
#[wasm_bindgen(js_name = resolveDuration)]
pub fn resolve_duration_js(value: f64) -> Result<JsValue, JsValue> {
    let matched = resolve_duration(value)
        .ok_or_else(|| validation_error(format!("Unrepresentable duration: {}", value)))?;
    serialize(&matched, "resolveDuration")
}

/// Canonical key-signature name (`"bb major"` → `"Bb"`), or `null`
#[wasm_bindgen(js_name = canonicalizeKeySignature)]
pub fn canonicalize_key_signature(name: &str) -> Option<String> {
    key_signature_from_str(name).map(|k| k.name().to_string())
}

/// Positional diff of two token arrays
#[wasm_bindgen(js_name = diffSequences)]
pub fn diff_sequences_js(prev: JsValue, next: JsValue) -> Result<JsValue, JsValue> {
    let prev: Vec<String> = deserialize(prev, "diffSequences: prev")?;
    let next: Vec<String> = deserialize(next, "diffSequences: next")?;
    serialize(&diff_sequences(&prev, &next), "diffSequences")
}
