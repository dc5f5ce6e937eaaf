//! Positional diff between pitch-sequence snapshots
//!
//! Compares the rendered sequence against the last synchronized snapshot and
//! emits one entry per changed position. The walk is positional, so exactly
//! one structural edit (insert or delete) may happen between two snapshots.

use serde::{Deserialize, Serialize};
use crate::interaction::events::{InputEvent, InputOperation, InputPhase};
use crate::models::note_spec::Voice;
use crate::models::pitch::sort_tokens_ascending;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    #[serde(rename = "type")]
    pub kind: DiffKind,
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DiffEntry {
    /// Host notification for this entry
    pub fn to_input_event(&self) -> InputEvent {
        match self.kind {
            DiffKind::Insert => InputEvent::new(self.note.clone(), InputOperation::Insert, InputPhase::Commit)
                .at_insert(self.index),
            DiffKind::Update => InputEvent::new(self.note.clone(), InputOperation::Update, InputPhase::Commit)
                .at_note(self.index),
            DiffKind::Delete => InputEvent::new(None, InputOperation::Delete, InputPhase::Delete)
                .at_note(self.index),
        }
    }
}

/// How a voice is flattened into a sequence for diffing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DictationMode {
    /// One token per non-rest note of the first voice
    #[default]
    Melodic,
    /// Every key of every note, sorted low to high
    Harmonic,
}

/// Flat pitch-token sequence of the primary voice
pub fn extract_sequence(voices: &[Voice], mode: DictationMode) -> Vec<String> {
    let Some(voice) = voices.first() else {
        return Vec::new();
    };
    let pitched = voice.notes.iter().filter(|n| !n.is_rest);
    match mode {
        DictationMode::Melodic => pitched
            .filter_map(|note| note.key_pitch(0).map(|p| p.token()))
            .collect(),
        DictationMode::Harmonic => {
            let mut tokens: Vec<String> = pitched.flat_map(|note| note.pitch_tokens()).collect();
            sort_tokens_ascending(&mut tokens);
            tokens
        }
    }
}

/// Position-by-position diff of `prev` against `next`
pub fn diff_sequences(prev: &[String], next: &[String]) -> Vec<DiffEntry> {
    let len = prev.len().max(next.len());
    let mut diffs = Vec::new();
    for index in 0..len {
        match (prev.get(index), next.get(index)) {
            (None, Some(note)) => diffs.push(DiffEntry {
                kind: DiffKind::Insert,
                index,
                note: Some(note.clone()),
            }),
            (Some(_), None) => diffs.push(DiffEntry {
                kind: DiffKind::Delete,
                index,
                note: None,
            }),
            (Some(before), Some(after)) if before != after => diffs.push(DiffEntry {
                kind: DiffKind::Update,
                index,
                note: Some(after.clone()),
            }),
            _ => {}
        }
    }
    diffs
}

/// Replay `diffs` on `prev`.
///
/// Updates and inserts apply in ascending index order, deletes from the
/// tail so earlier deletes do not shift later ones.
pub fn apply_diff(prev: &[String], diffs: &[DiffEntry]) -> Vec<String> {
    let mut sequence = prev.to_vec();

    let mut forward: Vec<&DiffEntry> = diffs.iter().filter(|d| d.kind != DiffKind::Delete).collect();
    forward.sort_by_key(|d| d.index);
    for entry in forward {
        let note = entry.note.clone().unwrap_or_default();
        match entry.kind {
            DiffKind::Update => {
                if let Some(slot) = sequence.get_mut(entry.index) {
                    *slot = note;
                }
            }
            DiffKind::Insert => {
                let at = entry.index.min(sequence.len());
                sequence.insert(at, note);
            }
            DiffKind::Delete => {}
        }
    }

    let mut deletes: Vec<usize> = diffs
        .iter()
        .filter(|d| d.kind == DiffKind::Delete)
        .map(|d| d.index)
        .collect();
    deletes.sort_unstable_by(|a, b| b.cmp(a));
    for index in deletes {
        if index < sequence.len() {
            sequence.remove(index);
        }
    }
    sequence
}
