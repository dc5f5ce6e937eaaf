//! Staff editing WASM API
//!
//! JavaScript-facing surface of the crate.
//!
//! # Module Structure
//!
//! - `helpers`: console logging, serde conversion and argument parsing
//! - `pitch`: stateless pitch/key/duration utilities
//! - `staff`: the `StaffEditor` class wrapping the interaction controller

pub mod helpers;
pub mod pitch;
pub mod staff;

pub use pitch::{
    canonicalize_key_signature, decide_accidental_for_key_js, diff_sequences_js, format_pitch_label_js,
    midi_to_pitch_spec_js, pitch_token_to_midi, resolve_duration_js,
};
pub use staff::StaffEditor;
