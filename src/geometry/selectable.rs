//! Per-render registry of selectable noteheads
//!
//! Maps each rendered notehead's bounding box back to its (voice, note)
//! address. The registry is rebuilt from scratch after every render pass and
//! is never carried across renders.

use serde::{Deserialize, Serialize};
use crate::geometry::metrics::{BoundingBox, StaffPoint};
use crate::models::note_spec::NotePosition;

/// Notehead reported by the renderer for one note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedNotehead {
    pub voice_index: usize,
    pub note_index: usize,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectableEntry {
    pub position: NotePosition,
    pub bbox: BoundingBox,
}

impl SelectableEntry {
    pub fn center_x(&self) -> f64 {
        self.bbox.center().x
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectableRegistry {
    entries: Vec<SelectableEntry>,
}

impl SelectableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a render pass; glyphs with non-finite boxes are skipped
    pub fn from_noteheads(noteheads: &[RenderedNotehead]) -> Self {
        let mut entries: Vec<SelectableEntry> = noteheads
            .iter()
            .filter(|head| head.bbox.is_finite())
            .map(|head| SelectableEntry {
                position: NotePosition::new(head.voice_index, head.note_index),
                bbox: head.bbox,
            })
            .collect();
        entries.sort_by_key(|e| (e.position.voice_index, e.position.note_index));
        entries.dedup_by_key(|e| e.position);
        Self { entries }
    }

    pub fn entries(&self) -> &[SelectableEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, position: NotePosition) -> Option<&SelectableEntry> {
        self.entries.iter().find(|e| e.position == position)
    }

    /// Entries of one voice, ordered by note index
    pub fn for_voice(&self, voice_index: usize) -> Vec<&SelectableEntry> {
        self.entries
            .iter()
            .filter(|e| e.position.voice_index == voice_index)
            .collect()
    }

    /// Find the notehead under a point.
    ///
    /// Only noteheads whose box grown by `padding` contains the point
    /// qualify. Among overlapping boxes the lowest `dx + 0.1 * dy` from the
    /// center wins.
    pub fn hit_test(&self, point: StaffPoint, padding: f64) -> Option<NotePosition> {
        let mut best: Option<(f64, NotePosition)> = None;
        for entry in &self.entries {
            if !entry.bbox.contains_padded(point, padding) {
                continue;
            }
            let center = entry.bbox.center();
            let score = (point.x - center.x).abs() + (point.y - center.y).abs() * 0.1;
            if best.map_or(true, |(s, _)| score < s) {
                best = Some((score, entry.position));
            }
        }
        best.map(|(_, position)| position)
    }
}
