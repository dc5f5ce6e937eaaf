//! Interfaces to the renderer and the host sequence model

use serde::{Deserialize, Serialize};
use crate::geometry::metrics::{ScreenToStaffTransform, StaffGeometryProvider, StaffMetrics};
use crate::geometry::selectable::RenderedNotehead;
use crate::interaction::events::{InputEvent, PreviewGlyph};
use crate::interaction::pointers::PointerId;
use crate::models::clef::Clef;
use crate::models::key_signature::KeySignature;
use crate::models::note_spec::{NotePosition, Voice};

/// Everything the renderer needs to draw the staff
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest<'a> {
    pub voices: &'a [Voice],
    pub key_signature: Option<KeySignature>,
    pub clef: Clef,
}

/// Screen-space geometry reported after a render pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderGeometry {
    pub metrics: Option<StaffMetrics>,
    pub noteheads: Vec<RenderedNotehead>,
    pub transform: Option<ScreenToStaffTransform>,
}

impl RenderGeometry {
    pub fn transform_or_identity(&self) -> ScreenToStaffTransform {
        self.transform
            .map(|t| ScreenToStaffTransform::new(t.scale_x, t.scale_y, t.offset_x, t.offset_y))
            .unwrap_or_default()
    }
}

/// Output of one finished render pass
pub struct RenderOutput {
    pub geometry: RenderGeometry,
    /// Live line ↔ Y mapping, when the renderer exposes one
    pub provider: Option<Box<dyn StaffGeometryProvider>>,
}

impl RenderOutput {
    pub fn new(geometry: RenderGeometry) -> Self {
        Self { geometry, provider: None }
    }

    pub fn with_provider(mut self, provider: Box<dyn StaffGeometryProvider>) -> Self {
        self.provider = Some(provider);
        self
    }
}

/// Result of asking the renderer to draw
pub enum RenderPass {
    /// Finished synchronously
    Completed(RenderOutput),
    /// Drawing continues; the host calls back with the result later
    Pending,
    Failed(String),
}

/// Black-box staff renderer
pub trait StaffRenderer {
    fn render_voices(&mut self, request: &RenderRequest<'_>) -> RenderPass;

    /// Draw (or redraw) the transient glyph for one pointer
    fn draw_preview(&mut self, preview: &PreviewGlyph);

    fn clear_preview(&mut self, pointer: PointerId);

    fn set_glyph_visible(&mut self, position: NotePosition, visible: bool);

    fn is_glyph_visible(&self, _position: NotePosition) -> bool {
        true
    }
}

/// Receiver of committed edits
pub trait InputSink {
    fn on_input(&mut self, event: InputEvent);
}
