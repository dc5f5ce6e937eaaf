//! Insertion index from horizontal position

use crate::geometry::selectable::SelectableEntry;

/// Index at which a note inserted at `x` lands in a voice.
///
/// `entries` are the voice's rendered noteheads. The new note goes before the
/// first notehead (by note index) whose center is at or right of `x`; past
/// every notehead it appends at `sequence_len`. A voice with no rendered
/// glyphs inserts at 0.
pub fn resolve_insert_index(x: f64, entries: &[&SelectableEntry], sequence_len: usize) -> usize {
    if entries.is_empty() {
        return 0;
    }
    let mut ordered: Vec<&SelectableEntry> = entries.to_vec();
    ordered.sort_by_key(|e| e.position.note_index);
    ordered
        .iter()
        .find(|e| e.center_x() >= x)
        .map(|e| e.position.note_index.min(sequence_len))
        .unwrap_or(sequence_len)
}
