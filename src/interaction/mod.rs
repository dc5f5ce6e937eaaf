//! Pointer interaction on a rendered staff
//!
//! Leaves first: quantizer, pointer registry, drag sessions and the diff
//! engine, then the synchronizer and the controller that ties them together.

pub mod errors;
pub mod events;
pub mod collaborators;
pub mod config;
pub mod quantizer;
pub mod pointers;
pub mod drag;
pub mod diff;
pub mod sync;
pub mod controller;

pub use errors::{InteractionError, InteractionResult};
pub use events::{EventOutcome, InputEvent, InputOperation, InputPhase, PreviewGlyph, StaffEvent};
pub use collaborators::{InputSink, RenderGeometry, RenderOutput, RenderPass, RenderRequest, StaffRenderer};
pub use config::InteractionConfig;
pub use quantizer::{PitchClassSet, PitchQuantizer, QuantizeRequest};
pub use pointers::{PointerEntry, PointerId, PointerRegistry};
pub use drag::{DragSession, DragSessions};
pub use diff::{apply_diff, diff_sequences, extract_sequence, DiffEntry, DiffKind, DictationMode};
pub use sync::RenderSynchronizer;
pub use controller::StaffInteraction;
