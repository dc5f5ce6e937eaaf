//! Per-staff-view render state
//!
//! One `RenderState` belongs to exactly one staff view. Edits mutate the
//! voices; geometry (metrics, transform, selectable registry, live line
//! provider) is only replaced by the render synchronizer after a pass
//! completes.

use std::fmt;

use serde::Serialize;
use crate::geometry::metrics::{ScreenToStaffTransform, StaffGeometryProvider, StaffMetrics};
use crate::geometry::selectable::SelectableRegistry;
use crate::models::clef::Clef;
use crate::models::key_signature::KeySignature;
use crate::models::note_spec::{NotePosition, NoteSpec, Voice};

pub struct RenderState {
    voices: Vec<Voice>,
    key_signature: Option<KeySignature>,
    scale_x: f64,
    scale_y: f64,
    metrics: Option<StaffMetrics>,
    transform: ScreenToStaffTransform,
    selectables: SelectableRegistry,
    provider: Option<Box<dyn StaffGeometryProvider>>,
    pending_selection: Option<NotePosition>,
    selected: Option<NotePosition>,
}

/// Serializable view of a [`RenderState`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderStateSnapshot {
    pub voices: Vec<Voice>,
    pub key_signature: Option<KeySignature>,
    pub scale_x: f64,
    pub scale_y: f64,
    pub metrics: Option<StaffMetrics>,
    pub transform: ScreenToStaffTransform,
    pub selectables: SelectableRegistry,
    pub has_live_geometry: bool,
    pub selected: Option<NotePosition>,
}

impl fmt::Debug for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderState")
            .field("voices", &self.voices.len())
            .field("key_signature", &self.key_signature)
            .field("metrics", &self.metrics)
            .field("selectables", &self.selectables.len())
            .field("live_geometry", &self.provider.is_some())
            .field("selected", &self.selected)
            .finish()
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new(Clef::Treble)
    }
}

impl RenderState {
    /// Fresh state with a single empty voice
    pub fn new(clef: Clef) -> Self {
        Self {
            voices: vec![Voice::new(0, clef)],
            key_signature: None,
            scale_x: 1.0,
            scale_y: 1.0,
            metrics: None,
            transform: ScreenToStaffTransform::identity(),
            selectables: SelectableRegistry::new(),
            provider: None,
            pending_selection: None,
            selected: None,
        }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub fn voice_mut(&mut self, index: usize) -> Option<&mut Voice> {
        self.voices.get_mut(index)
    }

    pub fn note(&self, position: NotePosition) -> Option<&NoteSpec> {
        self.voices.get(position.voice_index)?.notes.get(position.note_index)
    }

    pub fn note_mut(&mut self, position: NotePosition) -> Option<&mut NoteSpec> {
        self.voices
            .get_mut(position.voice_index)?
            .notes
            .get_mut(position.note_index)
    }

    /// Replace every voice; geometry from the previous layout is kept until
    /// the next render completes.
    pub fn set_voices(&mut self, mut voices: Vec<Voice>) {
        for voice in &mut voices {
            for note in &mut voice.notes {
                note.normalize();
            }
        }
        if voices.is_empty() {
            voices.push(Voice::new(0, self.clef()));
        }
        self.voices = voices;
        self.selected = None;
        self.pending_selection = None;
    }

    pub fn key_signature(&self) -> Option<KeySignature> {
        self.key_signature
    }

    pub fn set_key_signature(&mut self, key: Option<KeySignature>) {
        self.key_signature = key;
    }

    /// Tie-break resolver candidates toward natural spellings when no key is set
    pub fn prefer_natural(&self) -> bool {
        self.key_signature.is_none()
    }

    /// Clef of the primary voice
    pub fn clef(&self) -> Clef {
        self.voices.first().map(|v| v.clef).unwrap_or_default()
    }

    /// Clef a given voice renders with
    pub fn clef_for_voice(&self, voice_index: usize) -> Clef {
        self.voices
            .get(voice_index)
            .map(|v| v.clef)
            .unwrap_or_else(|| self.clef())
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    pub fn metrics(&self) -> Option<&StaffMetrics> {
        self.metrics.as_ref()
    }

    pub fn transform(&self) -> &ScreenToStaffTransform {
        &self.transform
    }

    pub fn selectables(&self) -> &SelectableRegistry {
        &self.selectables
    }

    pub fn provider(&self) -> Option<&dyn StaffGeometryProvider> {
        self.provider.as_deref()
    }

    pub fn selected(&self) -> Option<NotePosition> {
        self.selected
    }

    pub fn select(&mut self, position: Option<NotePosition>) {
        self.selected = position;
    }

    pub fn pending_selection(&self) -> Option<NotePosition> {
        self.pending_selection
    }

    /// Select `position` once the next render pass has placed it
    pub fn set_pending_selection(&mut self, position: Option<NotePosition>) {
        self.pending_selection = position;
    }

    /// Install geometry from a completed render pass.
    ///
    /// The registry and provider are replaced wholesale; metrics are only
    /// replaced when the pass reported them.
    pub(crate) fn apply_geometry(
        &mut self,
        metrics: Option<StaffMetrics>,
        transform: ScreenToStaffTransform,
        selectables: SelectableRegistry,
        provider: Option<Box<dyn StaffGeometryProvider>>,
    ) {
        if let Some(metrics) = metrics {
            self.metrics = Some(metrics);
        }
        self.scale_x = transform.scale_x;
        self.scale_y = transform.scale_y;
        self.transform = transform;
        self.selectables = selectables;
        self.provider = provider;

        if let Some(pending) = self.pending_selection.take() {
            if self.note(pending).is_some() {
                self.selected = Some(pending);
            }
        }
        if let Some(selected) = self.selected {
            if self.note(selected).is_none() {
                self.selected = None;
            }
        }
    }

    pub fn snapshot(&self) -> RenderStateSnapshot {
        RenderStateSnapshot {
            voices: self.voices.clone(),
            key_signature: self.key_signature,
            scale_x: self.scale_x,
            scale_y: self.scale_y,
            metrics: self.metrics,
            transform: self.transform,
            selectables: self.selectables.clone(),
            has_live_geometry: self.provider.is_some(),
            selected: self.selected,
        }
    }
}
