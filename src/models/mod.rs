//! Models module for the staff editing engine
//!
//! Pure musical values (pitches, key signatures, durations, clefs, notes)
//! plus the per-view `RenderState` that owns them.

pub mod pitch;
pub mod key_signature;
pub mod duration;
pub mod clef;
pub mod note_spec;
pub mod render_state;

// Re-export commonly used types
pub use pitch::{Accidental, Letter, PitchSpec, SpellingPreference};
pub use key_signature::KeySignature;
pub use duration::{DurationCode, DurationMatch};
pub use clef::Clef;
pub use note_spec::{NotePosition, NoteSpec, PitchUpdate, Voice};
pub use render_state::{RenderState, RenderStateSnapshot};
