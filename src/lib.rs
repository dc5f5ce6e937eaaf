//! Interactive staff note-editing engine (WASM)
//!
//! Turns pointer coordinates on a rendered musical staff into pitch edits
//! (insert, drag, delete), keeps them consistent with the renderer's note
//! list, and reports every committed change to the host sequence model.

pub mod models;
pub mod geometry;
pub mod interaction;
pub mod api;

// Re-export commonly used types
pub use models::{
    Accidental, Clef, KeySignature, Letter, NotePosition, NoteSpec, PitchSpec, RenderState,
    SpellingPreference, Voice,
};
pub use geometry::{ScreenToStaffTransform, StaffGeometryProvider, StaffMetrics};
pub use interaction::{
    EventOutcome, InputEvent, InputSink, InteractionConfig, InteractionError, PointerId,
    StaffEvent, StaffInteraction, StaffRenderer,
};
pub use api::StaffEditor;

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    if let Err(err) = console_log::init_with_level(log::Level::Debug) {
        wasm_warn!("logger already initialized: {}", err);
    }

    log::info!("Staff editing WASM module initialized");
}
