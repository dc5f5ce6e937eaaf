//! Staff interaction controller
//!
//! Owns one staff view's `RenderState` and routes typed [`StaffEvent`]s
//! through the resolvers, quantizer and drag/insert state machines. Edits
//! are reported to the host through the render synchronizer's diff.
//!
//! Failures never escape `handle_event`: they are logged and the event is
//! reported as [`EventOutcome::Ignored`].

use crate::geometry::insertion::resolve_insert_index;
use crate::geometry::metrics::{ScreenPoint, StaffPoint, DEFAULT_LINE_SPACING};
use crate::geometry::resolver::{find_closest_pitch_for_y, PitchSearch};
use crate::interaction::collaborators::{InputSink, RenderOutput, StaffRenderer};
use crate::interaction::config::InteractionConfig;
use crate::interaction::diff::{extract_sequence, DiffEntry, DictationMode};
use crate::interaction::drag::{DragContext, DragSession, DragSessions};
use crate::interaction::errors::{InteractionError, InteractionResult};
use crate::interaction::events::{
    EventOutcome, InputEvent, InputOperation, InputPhase, PreviewGlyph, StaffEvent,
};
use crate::interaction::pointers::{PointerEntry, PointerId, PointerMove, PointerRegistry};
use crate::interaction::quantizer::{PitchClassSet, PitchQuantizer, QuantizeRequest};
use crate::interaction::sync::RenderSynchronizer;
use crate::models::clef::Clef;
use crate::models::duration::DurationCode;
use crate::models::key_signature::{decide_accidental_for_key, KeySignature};
use crate::models::note_spec::{NotePosition, NoteSpec, Voice};
use crate::models::pitch::{
    format_pitch_label, midi_to_pitch_spec, parse_pitch_token, Accidental, PitchSpec,
    SpellingPreference,
};
use crate::models::render_state::RenderState;

/// Voice that receives inserted notes
const PRIMARY_VOICE: usize = 0;

/// Pitch chosen for a new note under the pointer
#[derive(Debug, Clone, Copy)]
struct InsertPitch {
    midi: i32,
    spec: PitchSpec,
    displayed: Option<Accidental>,
}

fn drag_context<'a>(
    quantizer: Option<&'a PitchQuantizer>,
    config: &InteractionConfig,
    key_signature: Option<KeySignature>,
) -> DragContext<'a> {
    DragContext {
        quantizer,
        midi_min: config.midi_min,
        midi_max: config.midi_max,
        preference: config.spelling,
        key_signature,
    }
}

pub struct StaffInteraction<R: StaffRenderer, S: InputSink> {
    state: RenderState,
    renderer: R,
    sink: S,
    config: InteractionConfig,
    quantizer: Option<PitchQuantizer>,
    pointers: PointerRegistry,
    drags: DragSessions,
    sync: RenderSynchronizer,
    enabled: bool,
}

impl<R: StaffRenderer, S: InputSink> StaffInteraction<R, S> {
    pub fn new(renderer: R, sink: S, config: InteractionConfig) -> InteractionResult<Self> {
        let config = config.validated()?;
        let mut state = RenderState::new(Clef::Treble);
        state.set_key_signature(config.key_signature);
        Ok(Self {
            state,
            renderer,
            sink,
            config,
            quantizer: None,
            pointers: PointerRegistry::new(),
            drags: DragSessions::new(),
            sync: RenderSynchronizer::new(),
            enabled: true,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn quantizer(&self) -> Option<&PitchQuantizer> {
        self.quantizer.as_ref()
    }

    pub fn synchronizer(&self) -> &RenderSynchronizer {
        &self.sync
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn mode(&self) -> DictationMode {
        self.config.mode
    }

    pub fn active_drags(&self) -> usize {
        self.drags.len()
    }

    pub fn drag_session(&self, pointer: PointerId) -> Option<&DragSession> {
        self.drags.get(pointer)
    }

    pub fn pointer_entry(&self, pointer: PointerId) -> Option<&PointerEntry> {
        self.pointers.get(pointer)
    }

    /// Flattened pitch tokens of the primary voice
    pub fn sequence(&self) -> Vec<String> {
        extract_sequence(self.state.voices(), self.config.mode)
    }

    // ========================================================================
    // Host configuration
    // ========================================================================

    /// Restrict dragging and inserting to the given pitch classes.
    ///
    /// A set with no usable tokens is rejected and leaves dragging chromatic.
    pub fn set_allowed_pitch_classes<T: AsRef<str>>(
        &mut self,
        tokens: &[T],
        midi_min: Option<i32>,
        midi_max: Option<i32>,
    ) -> InteractionResult<()> {
        self.install_quantizer(PitchClassSet::from_tokens(tokens), midi_min, midi_max)
    }

    /// Like [`Self::set_allowed_pitch_classes`] with integer classes (mod 12)
    pub fn set_allowed_pitch_class_numbers(
        &mut self,
        classes: &[i32],
        midi_min: Option<i32>,
        midi_max: Option<i32>,
    ) -> InteractionResult<()> {
        self.install_quantizer(PitchClassSet::from_integers(classes), midi_min, midi_max)
    }

    fn install_quantizer(
        &mut self,
        classes: PitchClassSet,
        midi_min: Option<i32>,
        midi_max: Option<i32>,
    ) -> InteractionResult<()> {
        let min = midi_min.unwrap_or(self.config.midi_min);
        let max = midi_max.unwrap_or(self.config.midi_max);
        match PitchQuantizer::new(classes, min, max) {
            Ok(quantizer) => {
                log::info!("[staff] quantizer set: {:?} in {}..={}", classes, min, max);
                self.quantizer = Some(quantizer);
                Ok(())
            }
            Err(err) => {
                log::warn!("[staff] {}; dragging stays chromatic", err);
                self.quantizer = None;
                Err(err)
            }
        }
    }

    pub fn clear_allowed_pitch_classes(&mut self) {
        self.quantizer = None;
    }

    /// Toggle pointer handling; disabling cancels every active gesture
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.cancel_all();
        }
        self.enabled = enabled;
    }

    pub fn set_note_limit(&mut self, limit: Option<usize>) {
        self.config.max_notes = limit;
    }

    pub fn set_spelling_preference(&mut self, preference: SpellingPreference) {
        self.config.spelling = preference;
    }

    /// Change the key signature and redisplay every accidental for it.
    /// Gestures in progress are cancelled first.
    pub fn set_key_signature(&mut self, key: Option<KeySignature>) {
        self.cancel_all();
        self.config.key_signature = key;
        self.state.set_key_signature(key);
        for index in 0..self.state.voices().len() {
            if let Some(voice) = self.state.voice_mut(index) {
                for note in &mut voice.notes {
                    note.respell_for_key(key);
                }
            }
        }
        self.request_render();
    }

    /// Switch melodic/harmonic flattening; the new flattening becomes the baseline
    pub fn set_dictation_mode(&mut self, mode: DictationMode) {
        if self.config.mode == mode {
            return;
        }
        self.config.mode = mode;
        self.sync.reset_baseline(&self.state, mode);
        self.sync.render(&mut self.state, &mut self.renderer);
    }

    /// Replace the staff content with pitch tokens.
    ///
    /// Melodic mode makes one quarter note per token; harmonic mode makes a
    /// single chord. Without an explicit clef one is guessed from the
    /// pitches. The loaded content becomes the diff baseline.
    pub fn load_sequence<T: AsRef<str>>(&mut self, tokens: &[T], clef: Option<Clef>) {
        let specs: Vec<PitchSpec> = tokens
            .iter()
            .filter_map(|token| {
                let parsed = parse_pitch_token(token.as_ref());
                if parsed.is_none() {
                    log::warn!("[staff] skipping unreadable token {:?}", token.as_ref());
                }
                parsed
            })
            .collect();
        let midis: Vec<i32> = specs.iter().map(|s| s.midi()).collect();
        let clef = clef.unwrap_or_else(|| Clef::guess_from_midis(&midis));
        let key = self.state.key_signature();

        let mut voice = Voice::new(PRIMARY_VOICE, clef);
        match self.config.mode {
            DictationMode::Melodic => {
                for spec in &specs {
                    let displayed = decide_accidental_for_key(spec, key);
                    voice.notes.push(NoteSpec::from_pitch(spec, displayed, DurationCode::Quarter, 0, clef));
                }
            }
            DictationMode::Harmonic => {
                if let Some((first, rest)) = specs.split_first() {
                    let mut chord = NoteSpec::from_pitch(
                        first,
                        decide_accidental_for_key(first, key),
                        DurationCode::Whole,
                        0,
                        clef,
                    );
                    for spec in rest {
                        chord.add_key(spec, decide_accidental_for_key(spec, key));
                    }
                    voice.notes.push(chord);
                }
            }
        }
        self.load_voices(vec![voice]);
    }

    /// Replace all voices; the new content becomes the diff baseline
    pub fn load_voices(&mut self, voices: Vec<Voice>) {
        self.cancel_all();
        self.state.set_voices(voices);
        self.sync.reset_baseline(&self.state, self.config.mode);
        self.sync.render(&mut self.state, &mut self.renderer);
    }

    // ========================================================================
    // Render continuation
    // ========================================================================

    /// Diff the current content against the baseline, notify the host and render
    pub fn request_render(&mut self) -> Vec<DiffEntry> {
        let mode = self.config.mode;
        self.sync
            .request_render(&mut self.state, &mut self.renderer, &mut self.sink, mode)
    }

    pub fn complete_render(&mut self, output: RenderOutput) {
        self.sync.complete_render(&mut self.state, &mut self.renderer, output);
    }

    pub fn fail_render(&mut self, message: impl Into<String>) {
        self.sync.fail_render(&mut self.state, &mut self.renderer, message.into());
    }

    // ========================================================================
    // Event routing
    // ========================================================================

    pub fn handle_event(&mut self, event: StaffEvent) -> EventOutcome {
        if !self.enabled {
            log::debug!("[staff] disabled, ignoring {:?}", event);
            return EventOutcome::Ignored;
        }
        let result = match event {
            StaffEvent::PointerDown { pointer, x, y, button, target } => {
                self.pointer_down(pointer, ScreenPoint { x, y }, button, target)
            }
            StaffEvent::PointerMove { pointer, x, y } => self.pointer_move(pointer, ScreenPoint { x, y }),
            StaffEvent::PointerUp { pointer, x, y } => self.pointer_up(pointer, ScreenPoint { x, y }),
            StaffEvent::PointerCancel { pointer } => self.pointer_cancel(pointer),
            StaffEvent::Wheel { delta_y } => self.wheel(delta_y),
            StaffEvent::Delete { position } => self.delete(position),
        };
        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                log::warn!("[staff] event ignored: {}", err);
                EventOutcome::Ignored
            }
        }
    }

    fn spacing(&self) -> f64 {
        self.state
            .metrics()
            .map(|m| m.spacing_or_default())
            .unwrap_or(DEFAULT_LINE_SPACING)
    }

    fn pointer_down(
        &mut self,
        pointer: PointerId,
        screen: ScreenPoint,
        button: Option<i16>,
        target: Option<NotePosition>,
    ) -> InteractionResult<EventOutcome> {
        if button.is_some_and(|b| b != 0) {
            return Ok(EventOutcome::Ignored);
        }
        if self.drags.contains(pointer) || self.pointers.contains(pointer) {
            return Err(InteractionError::DuplicateSession(pointer));
        }
        let point = self.state.transform().to_staff(screen);
        let padding = self.config.hit_padding(self.spacing());
        let hit = target.or_else(|| self.state.selectables().hit_test(point, padding));

        if let Some(position) = hit {
            if self.state.note(position).is_some() {
                return self.begin_drag(pointer, position, screen);
            }
            log::debug!("[staff] stale target {:?}, treating as insert", position);
        }
        self.begin_insert(pointer, point)
    }

    fn pointer_move(&mut self, pointer: PointerId, screen: ScreenPoint) -> InteractionResult<EventOutcome> {
        if self.drags.contains(pointer) {
            return Ok(self.move_drag(pointer, screen.y));
        }
        if self.pointers.contains(pointer) {
            let point = self.state.transform().to_staff(screen);
            return self.move_insert(pointer, point);
        }
        Err(InteractionError::UnknownPointer(pointer))
    }

    fn pointer_up(&mut self, pointer: PointerId, screen: ScreenPoint) -> InteractionResult<EventOutcome> {
        if self.drags.contains(pointer) {
            self.move_drag(pointer, screen.y);
            let session = self
                .drags
                .take(pointer)
                .ok_or(InteractionError::UnknownPointer(pointer))?;
            self.pointers.end(pointer);
            return self.commit_drag(session);
        }
        if let Some(entry) = self.pointers.end(pointer) {
            return self.commit_insert(pointer, entry);
        }
        Err(InteractionError::UnknownPointer(pointer))
    }

    fn pointer_cancel(&mut self, pointer: PointerId) -> InteractionResult<EventOutcome> {
        if let Some(session) = self.drags.take(pointer) {
            self.pointers.end(pointer);
            let position = session.position;
            self.restore_drag(session);
            return Ok(EventOutcome::DragCancelled { position });
        }
        if let Some(entry) = self.pointers.end(pointer) {
            self.renderer.clear_preview(pointer);
            let index = self.sequence_index(entry.staff_index, entry.insert_index);
            self.sink.on_input(
                InputEvent::new(None, InputOperation::Insert, InputPhase::Cancel)
                    .at_insert(index)
                    .from_pointer(pointer),
            );
            return Ok(EventOutcome::InsertCancelled);
        }
        Err(InteractionError::UnknownPointer(pointer))
    }

    /// Cancel every drag and insert in progress
    fn cancel_all(&mut self) {
        for pointer in self.pointers.pointers() {
            if let Err(err) = self.pointer_cancel(pointer) {
                log::debug!("[staff] cancel: {}", err);
            }
        }
        for session in self.drags.drain() {
            self.restore_drag(session);
        }
        self.pointers.clear();
    }

    // ========================================================================
    // Drag
    // ========================================================================

    fn begin_drag(
        &mut self,
        pointer: PointerId,
        position: NotePosition,
        screen: ScreenPoint,
    ) -> InteractionResult<EventOutcome> {
        let note = self
            .state
            .note(position)
            .ok_or(InteractionError::NoteNotFound(position))?;
        let px_per_semitone = self.config.px_per_semitone(self.spacing(), self.state.scale_y());
        let visible = self.renderer.is_glyph_visible(position);
        let session = DragSession::begin(pointer, position, note, screen.y, px_per_semitone, visible)?;
        let base_token = session.base_spec.map(|s| s.token());
        self.drags.begin(session)?;

        self.pointers.start(
            pointer,
            PointerEntry {
                note: base_token,
                staff_index: position.voice_index,
                insert_index: position.note_index,
            },
        );
        self.renderer.set_glyph_visible(position, false);
        self.draw_drag_preview(pointer);
        self.state.select(Some(position));
        log::debug!("[staff] drag start pointer={} at {:?}", pointer, position);
        Ok(EventOutcome::DragStarted { position })
    }

    fn move_drag(&mut self, pointer: PointerId, y: f64) -> EventOutcome {
        let ctx = drag_context(self.quantizer.as_ref(), &self.config, self.state.key_signature());
        let Some(session) = self.drags.get_mut(pointer) else {
            return EventOutcome::Ignored;
        };
        let Some(step) = session.apply_move(y, &ctx) else {
            return EventOutcome::Ignored;
        };
        self.pointers.resolve_move(pointer, Some(step.spec.token()), None);
        self.draw_drag_preview(pointer);
        EventOutcome::DragMoved { midi: step.midi }
    }

    fn draw_drag_preview(&mut self, pointer: PointerId) {
        let Some(session) = self.drags.get(pointer) else {
            return;
        };
        let (midi, spec, displayed) = match session.preview {
            Some(step) => (step.midi, step.spec, step.displayed),
            None => match session.base_spec {
                Some(base) => (session.base_midi, base, session.snapshot.accidentals.first().copied().flatten()),
                None => return,
            },
        };
        let glyph = PreviewGlyph {
            pointer,
            position: session.position,
            spec: session.snapshot.preview_at(&spec, displayed),
            midi,
            label: format_pitch_label(&spec, displayed),
        };
        self.renderer.draw_preview(&glyph);
    }

    fn restore_drag(&mut self, session: DragSession) {
        self.renderer.clear_preview(session.pointer);
        if let Some(note) = self.state.note_mut(session.position) {
            *note = session.snapshot;
        }
        self.renderer.set_glyph_visible(session.position, session.original_visible);
        log::debug!("[staff] drag cancelled pointer={}", session.pointer);
    }

    fn commit_drag(&mut self, session: DragSession) -> InteractionResult<EventOutcome> {
        self.renderer.clear_preview(session.pointer);
        self.renderer.set_glyph_visible(session.position, session.original_visible);
        let position = session.position;

        let key = self.state.key_signature();
        let ctx = drag_context(self.quantizer.as_ref(), &self.config, key);
        let Some(midi) = session.commit_target(&ctx) else {
            return Ok(EventOutcome::DragCommitted { position, midi: session.base_midi });
        };
        let preference = self.config.spelling;
        let note = self
            .state
            .note_mut(position)
            .ok_or(InteractionError::NoteNotFound(position))?;
        let update = note.apply_pitch_update(midi, key, preference, 0);
        log::debug!("[staff] drag commit {:?} -> {}", position, update.spec.token());
        self.state.select(Some(position));
        self.request_render();
        Ok(EventOutcome::DragCommitted { position, midi })
    }

    // ========================================================================
    // Insert
    // ========================================================================

    fn resolve_insert_pitch(&self, point: StaffPoint, last_midi: Option<i32>) -> InteractionResult<InsertPitch> {
        let clef = self.state.clef_for_voice(PRIMARY_VOICE);
        let search = PitchSearch {
            midi_min: self.config.midi_min,
            midi_max: self.config.midi_max,
            prefer_natural: self.state.prefer_natural(),
            preference: self.config.spelling,
        };
        let resolved = find_closest_pitch_for_y(point.y, clef, self.state.provider(), self.state.metrics(), search)
            .ok_or(InteractionError::UnresolvableCoordinate(point.x, point.y))?;

        let (midi, spec) = match &self.quantizer {
            Some(quantizer) => {
                let quantized = quantizer.quantize(QuantizeRequest {
                    preview_midi: resolved.midi,
                    last_midi,
                    direction: 0,
                    base_midi: last_midi.unwrap_or(resolved.midi),
                });
                if quantized == resolved.midi {
                    (resolved.midi, resolved.spec)
                } else {
                    (quantized, midi_to_pitch_spec(quantized, self.config.spelling))
                }
            }
            None => (resolved.midi, resolved.spec),
        };
        let displayed = decide_accidental_for_key(&spec, self.state.key_signature());
        Ok(InsertPitch { midi, spec, displayed })
    }

    fn note_count(&self) -> usize {
        self.sequence().len()
    }

    fn check_note_limit(&self) -> InteractionResult<()> {
        match self.config.max_notes {
            Some(limit) if self.note_count() >= limit => Err(InteractionError::NoteLimitReached(limit)),
            _ => Ok(()),
        }
    }

    /// Position in the host sequence of a voice insertion slot; rests are skipped
    fn sequence_index(&self, voice_index: usize, insert_index: usize) -> usize {
        self.state
            .voice(voice_index)
            .map(|v| v.notes.iter().take(insert_index).filter(|n| !n.is_rest).count())
            .unwrap_or(0)
    }

    fn draw_insert_preview(&mut self, pointer: PointerId, insert_index: usize, pitch: &InsertPitch) {
        let (duration, dots, clef) = self
            .state
            .voice(PRIMARY_VOICE)
            .map(|v| v.insertion_template())
            .unwrap_or((DurationCode::Quarter, 0, self.state.clef()));
        let glyph = PreviewGlyph {
            pointer,
            position: NotePosition::new(PRIMARY_VOICE, insert_index),
            spec: NoteSpec::from_pitch(&pitch.spec, pitch.displayed, duration, dots, clef),
            midi: pitch.midi,
            label: format_pitch_label(&pitch.spec, pitch.displayed),
        };
        self.renderer.draw_preview(&glyph);
    }

    fn begin_insert(&mut self, pointer: PointerId, point: StaffPoint) -> InteractionResult<EventOutcome> {
        if let Some(metrics) = self.state.metrics() {
            if !metrics.within_bounds(point) {
                return Err(InteractionError::OutsideStaff);
            }
        }
        self.check_note_limit()?;
        let pitch = self.resolve_insert_pitch(point, None)?;

        let sequence_len = self.state.voice(PRIMARY_VOICE).map(|v| v.notes.len()).unwrap_or(0);
        let entries = self.state.selectables().for_voice(PRIMARY_VOICE);
        let insert_index = resolve_insert_index(point.x, &entries, sequence_len);
        let token = pitch.spec.token();

        self.pointers.start(
            pointer,
            PointerEntry {
                note: Some(token.clone()),
                staff_index: PRIMARY_VOICE,
                insert_index,
            },
        );
        self.draw_insert_preview(pointer, insert_index, &pitch);
        let index = self.sequence_index(PRIMARY_VOICE, insert_index);
        self.sink.on_input(
            InputEvent::new(Some(token), InputOperation::Insert, InputPhase::Start)
                .at_insert(index)
                .from_pointer(pointer),
        );
        Ok(EventOutcome::InsertStarted { insert_index: index, midi: pitch.midi })
    }

    fn move_insert(&mut self, pointer: PointerId, point: StaffPoint) -> InteractionResult<EventOutcome> {
        let last_midi = self
            .pointers
            .get(pointer)
            .and_then(|e| e.note.as_deref())
            .and_then(parse_pitch_token)
            .map(|s| s.midi());
        let pitch = self.resolve_insert_pitch(point, last_midi)?;

        match self.pointers.resolve_move(pointer, Some(pitch.spec.token()), None) {
            PointerMove::Unknown => Err(InteractionError::UnknownPointer(pointer)),
            PointerMove::Unchanged => Ok(EventOutcome::Ignored),
            PointerMove::Changed(entry) => {
                self.draw_insert_preview(pointer, entry.insert_index, &pitch);
                let index = self.sequence_index(entry.staff_index, entry.insert_index);
                self.sink.on_input(
                    InputEvent::new(entry.note, InputOperation::Insert, InputPhase::Move)
                        .at_insert(index)
                        .from_pointer(pointer),
                );
                Ok(EventOutcome::InsertMoved { midi: pitch.midi })
            }
        }
    }

    fn commit_insert(&mut self, pointer: PointerId, entry: PointerEntry) -> InteractionResult<EventOutcome> {
        self.renderer.clear_preview(pointer);
        let cancel = InputEvent::new(None, InputOperation::Insert, InputPhase::Cancel)
            .at_insert(self.sequence_index(entry.staff_index, entry.insert_index))
            .from_pointer(pointer);

        let Some(spec) = entry.note.as_deref().and_then(parse_pitch_token) else {
            self.sink.on_input(cancel);
            return Ok(EventOutcome::InsertCancelled);
        };
        if let Err(err) = self.check_note_limit() {
            self.sink.on_input(cancel);
            return Err(err);
        }

        let key = self.state.key_signature();
        let displayed = decide_accidental_for_key(&spec, key);
        let midi = spec.midi();
        let voice_index = entry.staff_index;
        let mode = self.config.mode;
        let voice = self
            .state
            .voice_mut(voice_index)
            .ok_or(InteractionError::NoteNotFound(NotePosition::new(voice_index, entry.insert_index)))?;

        let chord_index = match mode {
            DictationMode::Harmonic => voice.notes.iter().position(|n| !n.is_rest),
            DictationMode::Melodic => None,
        };
        let position = match chord_index {
            Some(index) => {
                if !voice.notes[index].add_key(&spec, displayed) {
                    log::debug!("[staff] {} already in chord", spec.token());
                    self.sink.on_input(cancel);
                    return Ok(EventOutcome::InsertCancelled);
                }
                NotePosition::new(voice_index, index)
            }
            None => {
                let (duration, dots, clef) = voice.insertion_template();
                let at = entry.insert_index.min(voice.notes.len());
                voice.notes.insert(at, NoteSpec::from_pitch(&spec, displayed, duration, dots, clef));
                self.drags.shift_indices(voice_index, at, 1);
                self.pointers.shift_indices(voice_index, at, 1);
                NotePosition::new(voice_index, at)
            }
        };

        self.state.set_pending_selection(Some(position));
        self.request_render();
        log::debug!("[staff] insert commit {} at {:?}", spec.token(), position);
        Ok(EventOutcome::InsertCommitted { position, midi })
    }

    // ========================================================================
    // Wheel nudge and delete
    // ========================================================================

    fn wheel(&mut self, delta_y: f64) -> InteractionResult<EventOutcome> {
        if !delta_y.is_finite() || delta_y == 0.0 {
            return Ok(EventOutcome::Ignored);
        }
        let position = self.state.selected().ok_or(InteractionError::NoSelection)?;
        let note = self
            .state
            .note(position)
            .ok_or(InteractionError::NoteNotFound(position))?;
        if note.is_rest {
            return Err(InteractionError::RestNotDraggable(position));
        }
        if self.drags.get_by_note(position).is_some() {
            return Err(InteractionError::NoteBusy(position));
        }

        let step = if delta_y < 0.0 { 1 } else { -1 };
        let base = note.primary_midi();
        let mut midi = (base + step).clamp(self.config.midi_min, self.config.midi_max);
        if let Some(quantizer) = &self.quantizer {
            midi = quantizer.quantize(QuantizeRequest {
                preview_midi: midi,
                last_midi: Some(base),
                direction: step,
                base_midi: base,
            });
        }
        if midi == base {
            return Ok(EventOutcome::Ignored);
        }

        let key = self.state.key_signature();
        let preference = self.config.spelling;
        if let Some(note) = self.state.note_mut(position) {
            note.apply_pitch_update(midi, key, preference, 0);
        }
        self.request_render();
        Ok(EventOutcome::Nudged { position, midi })
    }

    fn delete(&mut self, position: Option<NotePosition>) -> InteractionResult<EventOutcome> {
        let position = position
            .or(self.state.selected())
            .ok_or(InteractionError::NoSelection)?;
        let voice = self
            .state
            .voice_mut(position.voice_index)
            .ok_or(InteractionError::NoteNotFound(position))?;
        if position.note_index >= voice.notes.len() {
            return Err(InteractionError::NoteNotFound(position));
        }
        voice.notes.remove(position.note_index);

        for session in self.drags.take_for_note(position) {
            log::debug!("[staff] note deleted under pointer {}", session.pointer);
            self.pointers.end(session.pointer);
            self.renderer.clear_preview(session.pointer);
        }
        let after = position.note_index + 1;
        self.drags.shift_indices(position.voice_index, after, -1);
        self.pointers.shift_indices(position.voice_index, after, -1);

        match self.state.selected() {
            Some(selected) if selected == position => self.state.select(None),
            Some(selected)
                if selected.voice_index == position.voice_index && selected.note_index > position.note_index =>
            {
                self.state
                    .select(Some(NotePosition::new(selected.voice_index, selected.note_index - 1)));
            }
            _ => {}
        }

        self.request_render();
        Ok(EventOutcome::Deleted { position })
    }
}
