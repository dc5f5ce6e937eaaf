//! `StaffEditor`: the interaction controller exported to JavaScript
//!
//! The host passes a callbacks object:
//!
//! ```js
//! {
//!   renderVoices(request) { ... },   // returns geometry, a Promise, or undefined
//!   drawPreview(glyph) { ... },
//!   clearPreview(pointer) { ... },
//!   setGlyphVisible(position, visible) { ... },
//!   isGlyphVisible(position) { ... }, // optional
//!   onInput(event) { ... },
//! }
//! ```
//!
//! When `renderVoices` does not return geometry synchronously the host must
//! later call `completeRender(geometry)` or `failRender(message)`.

use js_sys::{Function, Reflect};
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::api::helpers::{
    deserialize, deserialize_optional, interaction_error, key_signature_from_str, serialize,
    spelling_from_str, validation_error,
};
use crate::geometry::metrics::StaffGeometryProvider;
use crate::interaction::collaborators::{
    InputSink, RenderGeometry, RenderOutput, RenderPass, RenderRequest, StaffRenderer,
};
use crate::interaction::config::InteractionConfig;
use crate::interaction::controller::StaffInteraction;
use crate::interaction::diff::DictationMode;
use crate::interaction::events::{InputEvent, PreviewGlyph, StaffEvent};
use crate::interaction::pointers::PointerId;
use crate::interaction::quantizer::token_pitch_class;
use crate::models::clef::Clef;
use crate::models::note_spec::NotePosition;
use crate::{wasm_error, wasm_info, wasm_warn};

// ============================================================================
// Callback plumbing
// ============================================================================

fn function_prop(target: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

fn required_function(target: &JsValue, name: &str) -> Result<Function, JsValue> {
    function_prop(target, name)
        .ok_or_else(|| validation_error(format!("Staff callbacks are missing '{}'", name)))
}

fn describe_js_error(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            Reflect::get(err, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", err))
}

/// Live line ↔ Y mapping backed by host functions
struct JsStaffGeometry {
    y_for_line: Function,
    line_for_y: Function,
}

impl JsStaffGeometry {
    /// Both functions must be present; a half-provided mapping is not used
    fn from_object(source: &JsValue) -> Option<Self> {
        Some(Self {
            y_for_line: function_prop(source, "yForLine")?,
            line_for_y: function_prop(source, "lineForY")?,
        })
    }

    fn call(function: &Function, arg: f64) -> f64 {
        function
            .call1(&JsValue::NULL, &JsValue::from_f64(arg))
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(f64::NAN)
    }
}

impl StaffGeometryProvider for JsStaffGeometry {
    fn y_for_line(&self, line: f64) -> f64 {
        Self::call(&self.y_for_line, line)
    }

    fn line_for_y(&self, y: f64) -> f64 {
        Self::call(&self.line_for_y, y)
    }
}

fn render_output_from_js(value: JsValue) -> Result<RenderOutput, JsValue> {
    let provider = JsStaffGeometry::from_object(&value);
    let geometry: RenderGeometry = deserialize(value, "render geometry")?;
    let output = RenderOutput::new(geometry);
    Ok(match provider {
        Some(provider) => output.with_provider(Box::new(provider)),
        None => output,
    })
}

struct JsStaffRenderer {
    render_voices: Function,
    draw_preview: Function,
    clear_preview: Function,
    set_glyph_visible: Function,
    is_glyph_visible: Option<Function>,
}

impl JsStaffRenderer {
    fn from_callbacks(callbacks: &JsValue) -> Result<Self, JsValue> {
        Ok(Self {
            render_voices: required_function(callbacks, "renderVoices")?,
            draw_preview: required_function(callbacks, "drawPreview")?,
            clear_preview: required_function(callbacks, "clearPreview")?,
            set_glyph_visible: required_function(callbacks, "setGlyphVisible")?,
            is_glyph_visible: function_prop(callbacks, "isGlyphVisible"),
        })
    }
}

impl StaffRenderer for JsStaffRenderer {
    fn render_voices(&mut self, request: &RenderRequest<'_>) -> RenderPass {
        let payload = match serialize(request, "renderVoices request") {
            Ok(payload) => payload,
            Err(err) => return RenderPass::Failed(describe_js_error(&err)),
        };
        match self.render_voices.call1(&JsValue::NULL, &payload) {
            Err(err) => RenderPass::Failed(describe_js_error(&err)),
            Ok(value) if value.is_undefined() || value.is_null() => RenderPass::Pending,
            Ok(value) if value.is_instance_of::<js_sys::Promise>() => RenderPass::Pending,
            Ok(value) => match render_output_from_js(value) {
                Ok(output) => RenderPass::Completed(output),
                Err(err) => RenderPass::Failed(describe_js_error(&err)),
            },
        }
    }

    fn draw_preview(&mut self, preview: &PreviewGlyph) {
        let result = serialize(preview, "drawPreview")
            .and_then(|glyph| self.draw_preview.call1(&JsValue::NULL, &glyph));
        if let Err(err) = result {
            wasm_warn!("drawPreview failed: {}", describe_js_error(&err));
        }
    }

    fn clear_preview(&mut self, pointer: PointerId) {
        let result = serialize(&pointer, "clearPreview")
            .and_then(|id| self.clear_preview.call1(&JsValue::NULL, &id));
        if let Err(err) = result {
            wasm_warn!("clearPreview failed: {}", describe_js_error(&err));
        }
    }

    fn set_glyph_visible(&mut self, position: NotePosition, visible: bool) {
        let result = serialize(&position, "setGlyphVisible").and_then(|pos| {
            self.set_glyph_visible
                .call2(&JsValue::NULL, &pos, &JsValue::from_bool(visible))
        });
        if let Err(err) = result {
            wasm_warn!("setGlyphVisible failed: {}", describe_js_error(&err));
        }
    }

    fn is_glyph_visible(&self, position: NotePosition) -> bool {
        let Some(callback) = &self.is_glyph_visible else {
            return true;
        };
        serialize(&position, "isGlyphVisible")
            .and_then(|pos| callback.call1(&JsValue::NULL, &pos))
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }
}

struct JsInputSink {
    on_input: Function,
}

impl InputSink for JsInputSink {
    fn on_input(&mut self, event: InputEvent) {
        let result = serialize(&event, "onInput")
            .and_then(|payload| self.on_input.call1(&JsValue::NULL, &payload));
        if let Err(err) = result {
            wasm_error!("onInput callback threw: {}", describe_js_error(&err));
        }
    }
}

// ============================================================================
// Argument shapes
// ============================================================================

/// Pitch-class entry: a note name (`"F#"`) or an integer class
#[derive(Deserialize)]
#[serde(untagged)]
enum PitchClassArg {
    Number(i32),
    Name(String),
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RangeOptions {
    midi_min: Option<i32>,
    midi_max: Option<i32>,
}

// ============================================================================
// StaffEditor
// ============================================================================

#[wasm_bindgen]
pub struct StaffEditor {
    inner: StaffInteraction<JsStaffRenderer, JsInputSink>,
}

impl StaffEditor {
    fn build(callbacks: &JsValue, config: InteractionConfig) -> Result<StaffEditor, JsValue> {
        let renderer = JsStaffRenderer::from_callbacks(callbacks)?;
        let sink = JsInputSink {
            on_input: required_function(callbacks, "onInput")?,
        };
        let inner = StaffInteraction::new(renderer, sink, config).map_err(interaction_error)?;
        wasm_info!("StaffEditor created");
        Ok(StaffEditor { inner })
    }
}

#[wasm_bindgen]
impl StaffEditor {
    /// Create an editor from host callbacks and an optional config object
    #[wasm_bindgen(constructor)]
    pub fn new(callbacks: JsValue, config: JsValue) -> Result<StaffEditor, JsValue> {
        let config: InteractionConfig = deserialize_optional(config, "Invalid staff config")?.unwrap_or_default();
        Self::build(&callbacks, config)
    }

    /// Create an editor with configuration given as YAML (or JSON) text
    #[wasm_bindgen(js_name = withYamlConfig)]
    pub fn with_yaml_config(callbacks: JsValue, yaml: &str) -> Result<StaffEditor, JsValue> {
        let config = InteractionConfig::from_yaml(yaml).map_err(interaction_error)?;
        Self::build(&callbacks, config)
    }

    /// Route one pointer/keyboard event; returns what the editor did
    #[wasm_bindgen(js_name = handleEvent)]
    pub fn handle_event(&mut self, event: JsValue) -> Result<JsValue, JsValue> {
        let event: StaffEvent = deserialize(event, "Invalid staff event")?;
        let outcome = self.inner.handle_event(event);
        serialize(&outcome, "handleEvent")
    }

    #[wasm_bindgen(js_name = setEnabled)]
    pub fn set_enabled(&mut self, enabled: bool) {
        self.inner.set_enabled(enabled);
    }

    #[wasm_bindgen(js_name = isEnabled)]
    pub fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    /// Restrict pitches to the given classes (`["C", "D", "F#"]` or `[0, 2, 6]`)
    #[wasm_bindgen(js_name = setAllowedPitchClasses)]
    pub fn set_allowed_pitch_classes(&mut self, classes: JsValue, options: JsValue) -> Result<(), JsValue> {
        let classes: Vec<PitchClassArg> = deserialize(classes, "Invalid pitch classes")?;
        let options: RangeOptions = deserialize_optional(options, "Invalid range options")?.unwrap_or_default();

        let mut names = Vec::new();
        let mut numbers = Vec::new();
        for class in classes {
            match class {
                PitchClassArg::Name(name) => names.push(name),
                PitchClassArg::Number(number) => numbers.push(number),
            }
        }
        let result = if numbers.is_empty() {
            self.inner.set_allowed_pitch_classes(&names, options.midi_min, options.midi_max)
        } else {
            numbers.extend(names.iter().filter_map(|n| token_pitch_class(n)));
            self.inner
                .set_allowed_pitch_class_numbers(&numbers, options.midi_min, options.midi_max)
        };
        result.map_err(interaction_error)
    }

    #[wasm_bindgen(js_name = clearAllowedPitchClasses)]
    pub fn clear_allowed_pitch_classes(&mut self) {
        self.inner.clear_allowed_pitch_classes();
    }

    /// Set the key signature by name (`"D"`, `"Bb major"`); empty clears it
    #[wasm_bindgen(js_name = setKeySignature)]
    pub fn set_key_signature(&mut self, name: &str) {
        self.inner.set_key_signature(key_signature_from_str(name));
    }

    /// `"flat"`, `"sharp"` or `"natural"` (spelled like sharp)
    #[wasm_bindgen(js_name = setSpellingPreference)]
    pub fn set_spelling_preference(&mut self, preference: &str) -> Result<(), JsValue> {
        self.inner.set_spelling_preference(spelling_from_str(preference)?);
        Ok(())
    }

    /// `"melodic"` or `"harmonic"`
    #[wasm_bindgen(js_name = setDictationMode)]
    pub fn set_dictation_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode = match mode.trim().to_ascii_lowercase().as_str() {
            "melodic" => DictationMode::Melodic,
            "harmonic" => DictationMode::Harmonic,
            other => return Err(validation_error(format!("Invalid dictation mode: '{}'", other))),
        };
        self.inner.set_dictation_mode(mode);
        Ok(())
    }

    /// Maximum number of pitches the user may enter; `undefined` removes the limit
    #[wasm_bindgen(js_name = setNoteLimit)]
    pub fn set_note_limit(&mut self, limit: Option<u32>) {
        self.inner.set_note_limit(limit.map(|l| l as usize));
    }

    /// Replace the staff with pitch tokens; the clef is guessed when omitted
    #[wasm_bindgen(js_name = loadSequence)]
    pub fn load_sequence(&mut self, tokens: JsValue, clef: Option<String>) -> Result<(), JsValue> {
        let tokens: Vec<String> = deserialize(tokens, "Invalid pitch tokens")?;
        let clef = match clef.as_deref() {
            Some(name) => Some(
                Clef::parse(name).ok_or_else(|| validation_error(format!("Unknown clef: '{}'", name)))?,
            ),
            None => None,
        };
        self.inner.load_sequence(&tokens, clef);
        Ok(())
    }

    /// Finish a pending render with its geometry. Unreadable geometry
    /// fails the pass so later renders are not held behind it.
    #[wasm_bindgen(js_name = completeRender)]
    pub fn complete_render(&mut self, geometry: JsValue) -> Result<(), JsValue> {
        match render_output_from_js(geometry) {
            Ok(output) => {
                self.inner.complete_render(output);
                Ok(())
            }
            Err(err) => {
                self.inner.fail_render(describe_js_error(&err));
                Err(err)
            }
        }
    }

    /// Report a failed render; the last good geometry stays in use
    #[wasm_bindgen(js_name = failRender)]
    pub fn fail_render(&mut self, message: &str) {
        self.inner.fail_render(message);
    }

    /// Flush any pending edits to the host and re-render; returns the diff
    #[wasm_bindgen(js_name = requestRender)]
    pub fn request_render(&mut self) -> Result<JsValue, JsValue> {
        let diffs = self.inner.request_render();
        serialize(&diffs, "requestRender")
    }

    #[wasm_bindgen(js_name = getRenderState)]
    pub fn get_render_state(&self) -> Result<JsValue, JsValue> {
        serialize(&self.inner.state().snapshot(), "getRenderState")
    }

    #[wasm_bindgen(js_name = getSequence)]
    pub fn get_sequence(&self) -> Result<JsValue, JsValue> {
        serialize(&self.inner.sequence(), "getSequence")
    }
}
