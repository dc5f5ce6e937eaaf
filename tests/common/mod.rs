// Shared mock renderer and sink for controller integration tests
//
// The mock lays noteheads out left to right (centers at x = 30, 70, 110, ...)
// on a treble staff whose top line is at y = 40 with 10px line spacing.

#![allow(dead_code)]

use std::collections::HashMap;

use ear_staff_wasm::geometry::{BoundingBox, RenderedNotehead, StaffMetrics};
use ear_staff_wasm::interaction::{
    InputEvent, InputSink, InteractionConfig, PointerId, PreviewGlyph, RenderGeometry,
    RenderOutput, RenderPass, RenderRequest, StaffEvent, StaffInteraction, StaffRenderer,
};
use ear_staff_wasm::models::{Clef, NotePosition, Voice};

pub const TOP_Y: f64 = 40.0;
pub const SPACING: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Geometry is returned from `render_voices`
    Sync,
    /// Host finishes later through `complete_render`
    Pending,
    Fail,
}

pub fn note_center_x(index: usize) -> f64 {
    30.0 + 40.0 * index as f64
}

/// Y of a note's primary key on the mock staff
pub fn note_y(voices: &[Voice], position: NotePosition) -> f64 {
    let voice = &voices[position.voice_index];
    let note = &voice.notes[position.note_index];
    let pitch = note.key_pitch(0).expect("readable key");
    TOP_Y + note.clef.line_from_top(pitch.letter, pitch.octave) * SPACING
}

pub fn metrics() -> StaffMetrics {
    StaffMetrics {
        top_y: TOP_Y,
        bottom_y: TOP_Y + 4.0 * SPACING,
        spacing: SPACING,
        x_start: 0.0,
        x_end: 400.0,
        clef: Clef::Treble,
    }
}

pub fn geometry_for(voices: &[Voice]) -> RenderGeometry {
    let mut noteheads = Vec::new();
    for (voice_index, voice) in voices.iter().enumerate() {
        for (note_index, note) in voice.notes.iter().enumerate() {
            if note.is_rest {
                continue;
            }
            let y = note_y(voices, NotePosition::new(voice_index, note_index));
            noteheads.push(RenderedNotehead {
                voice_index,
                note_index,
                bbox: BoundingBox::new(note_center_x(note_index) - 5.0, y - 4.0, 10.0, 8.0),
            });
        }
    }
    RenderGeometry {
        metrics: Some(metrics()),
        noteheads,
        transform: None,
    }
}

pub struct MockRenderer {
    pub mode: RenderMode,
    pub render_count: usize,
    pub last_voices: Vec<Voice>,
    pub previews: HashMap<PointerId, PreviewGlyph>,
    pub cleared: Vec<PointerId>,
    pub visibility: HashMap<NotePosition, bool>,
}

impl MockRenderer {
    pub fn new(mode: RenderMode) -> Self {
        Self {
            mode,
            render_count: 0,
            last_voices: Vec::new(),
            previews: HashMap::new(),
            cleared: Vec::new(),
            visibility: HashMap::new(),
        }
    }

    pub fn visible(&self, position: NotePosition) -> bool {
        self.visibility.get(&position).copied().unwrap_or(true)
    }
}

impl StaffRenderer for MockRenderer {
    fn render_voices(&mut self, request: &RenderRequest<'_>) -> RenderPass {
        self.render_count += 1;
        self.last_voices = request.voices.to_vec();
        match self.mode {
            RenderMode::Sync => RenderPass::Completed(RenderOutput::new(geometry_for(request.voices))),
            RenderMode::Pending => RenderPass::Pending,
            RenderMode::Fail => RenderPass::Failed("renderer exploded".to_string()),
        }
    }

    fn draw_preview(&mut self, preview: &PreviewGlyph) {
        self.previews.insert(preview.pointer, preview.clone());
    }

    fn clear_preview(&mut self, pointer: PointerId) {
        self.previews.remove(&pointer);
        self.cleared.push(pointer);
    }

    fn set_glyph_visible(&mut self, position: NotePosition, visible: bool) {
        self.visibility.insert(position, visible);
    }

    fn is_glyph_visible(&self, position: NotePosition) -> bool {
        self.visible(position)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<InputEvent>,
}

impl InputSink for RecordingSink {
    fn on_input(&mut self, event: InputEvent) {
        self.events.push(event);
    }
}

pub type TestStaff = StaffInteraction<MockRenderer, RecordingSink>;

pub fn staff_with(config: InteractionConfig, tokens: &[&str]) -> TestStaff {
    let mut staff = StaffInteraction::new(MockRenderer::new(RenderMode::Sync), RecordingSink::default(), config)
        .expect("valid config");
    staff.load_sequence(tokens, Some(Clef::Treble));
    staff
}

pub fn staff(tokens: &[&str]) -> TestStaff {
    staff_with(InteractionConfig::default(), tokens)
}

pub fn down(pointer: PointerId, x: f64, y: f64) -> StaffEvent {
    StaffEvent::PointerDown { pointer, x, y, button: None, target: None }
}

pub fn move_to(pointer: PointerId, x: f64, y: f64) -> StaffEvent {
    StaffEvent::PointerMove { pointer, x, y }
}

pub fn up(pointer: PointerId, x: f64, y: f64) -> StaffEvent {
    StaffEvent::PointerUp { pointer, x, y }
}

pub fn cancel(pointer: PointerId) -> StaffEvent {
    StaffEvent::PointerCancel { pointer }
}

/// Screen point of a rendered note's center
pub fn note_point(staff: &TestStaff, position: NotePosition) -> (f64, f64) {
    (note_center_x(position.note_index), note_y(staff.state().voices(), position))
}
