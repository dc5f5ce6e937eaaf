//! Render-state synchronizer
//!
//! Sole writer of staff geometry. After an edit it diffs the rendered
//! sequence against the last baseline, notifies the host, and requests a
//! render; renders never overlap, a request during an in-flight pass is
//! coalesced and replayed on completion.

use crate::geometry::selectable::SelectableRegistry;
use crate::interaction::collaborators::{InputSink, RenderOutput, RenderPass, RenderRequest, StaffRenderer};
use crate::interaction::diff::{diff_sequences, extract_sequence, DiffEntry, DictationMode};
use crate::interaction::errors::InteractionError;
use crate::models::render_state::RenderState;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSynchronizer {
    baseline: Vec<String>,
    in_flight: bool,
    queued: bool,
}

impl RenderSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn baseline(&self) -> &[String] {
        &self.baseline
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_queued(&self) -> bool {
        self.queued
    }

    /// Adopt the current sequence as the baseline without emitting diffs
    pub fn reset_baseline(&mut self, state: &RenderState, mode: DictationMode) {
        self.baseline = extract_sequence(state.voices(), mode);
    }

    /// Diff against the baseline, report every entry to `sink`, then render.
    pub fn request_render<R: StaffRenderer, S: InputSink>(
        &mut self,
        state: &mut RenderState,
        renderer: &mut R,
        sink: &mut S,
        mode: DictationMode,
    ) -> Vec<DiffEntry> {
        let next = extract_sequence(state.voices(), mode);
        let diffs = diff_sequences(&self.baseline, &next);
        self.baseline = next;
        for entry in &diffs {
            sink.on_input(entry.to_input_event());
        }
        self.render(state, renderer);
        diffs
    }

    /// Start a render pass, or queue one if a pass is in flight
    pub fn render<R: StaffRenderer>(&mut self, state: &mut RenderState, renderer: &mut R) {
        if self.in_flight {
            log::debug!("[sync] render in flight, queueing");
            self.queued = true;
            return;
        }
        self.in_flight = true;
        self.queued = false;
        let pass = {
            let request = RenderRequest {
                voices: state.voices(),
                key_signature: state.key_signature(),
                clef: state.clef(),
            };
            renderer.render_voices(&request)
        };
        match pass {
            RenderPass::Completed(output) => self.complete_render(state, renderer, output),
            RenderPass::Failed(message) => self.fail_render(state, renderer, message),
            RenderPass::Pending => {}
        }
    }

    /// Install fresh geometry from a finished pass, then run any queued pass
    pub fn complete_render<R: StaffRenderer>(
        &mut self,
        state: &mut RenderState,
        renderer: &mut R,
        output: RenderOutput,
    ) {
        self.in_flight = false;
        let RenderOutput { geometry, provider } = output;
        let transform = geometry.transform_or_identity();
        let registry = SelectableRegistry::from_noteheads(&geometry.noteheads);
        log::debug!(
            "[sync] render complete: {} noteheads, metrics={}",
            registry.len(),
            geometry.metrics.is_some()
        );
        state.apply_geometry(geometry.metrics, transform, registry, provider);
        self.flush_queue(state, renderer);
    }

    /// Record a failed pass; existing metrics stay in place
    pub fn fail_render<R: StaffRenderer>(&mut self, state: &mut RenderState, renderer: &mut R, message: String) {
        self.in_flight = false;
        let error = InteractionError::RenderFailed(message);
        log::error!("[sync] {}; keeping last metrics", error);
        self.flush_queue(state, renderer);
    }

    fn flush_queue<R: StaffRenderer>(&mut self, state: &mut RenderState, renderer: &mut R) {
        if self.queued {
            self.queued = false;
            self.render(state, renderer);
        }
    }
}
