//! Multi-pointer registry
//!
//! Tracks the insert target of every active pointer so concurrent touches
//! never share state. Note identity is resolved once at pointer-down and
//! reused for the rest of the gesture.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one input pointer.
///
/// Devices that report no id collapse onto a synthetic mouse or touch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerId {
    Pointer(i32),
    Mouse,
    Touch,
}

impl PointerId {
    /// Map a host pointer id (possibly absent) to a registry key
    pub fn from_host(id: Option<i32>, touch: bool) -> PointerId {
        match id {
            Some(id) => PointerId::Pointer(id),
            None if touch => PointerId::Touch,
            None => PointerId::Mouse,
        }
    }
}

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerId::Pointer(id) => write!(f, "#{}", id),
            PointerId::Mouse => write!(f, "mouse"),
            PointerId::Touch => write!(f, "touch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerEntry {
    /// Pitch token currently previewed by this pointer
    pub note: Option<String>,
    pub staff_index: usize,
    pub insert_index: usize,
}

/// What a pointer-move did to an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerMove {
    /// No entry for this pointer
    Unknown,
    /// Same note at the same index; nothing to report
    Unchanged,
    /// Entry updated; carries the stored insert index
    Changed(PointerEntry),
}

#[derive(Debug, Clone, Default)]
pub struct PointerRegistry {
    entries: HashMap<PointerId, PointerEntry>,
}

impl PointerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pointer at gesture start, replacing any stale entry
    pub fn start(&mut self, pointer: PointerId, entry: PointerEntry) {
        if self.entries.insert(pointer, entry).is_some() {
            log::warn!("[pointers] replaced stale entry for pointer {}", pointer);
        }
    }

    /// Record a move to `note`.
    ///
    /// The stored staff and insert indices are kept unless the caller
    /// supplies a fresh insert index.
    pub fn resolve_move(
        &mut self,
        pointer: PointerId,
        note: Option<String>,
        insert_index: Option<usize>,
    ) -> PointerMove {
        let Some(entry) = self.entries.get_mut(&pointer) else {
            return PointerMove::Unknown;
        };
        let index = insert_index.unwrap_or(entry.insert_index);
        if entry.note == note && entry.insert_index == index {
            return PointerMove::Unchanged;
        }
        entry.note = note;
        entry.insert_index = index;
        PointerMove::Changed(entry.clone())
    }

    pub fn get(&self, pointer: PointerId) -> Option<&PointerEntry> {
        self.entries.get(&pointer)
    }

    pub fn end(&mut self, pointer: PointerId) -> Option<PointerEntry> {
        self.entries.remove(&pointer)
    }

    pub fn contains(&self, pointer: PointerId) -> bool {
        self.entries.contains_key(&pointer)
    }

    pub fn active_count(&self) -> usize {
        self.entries.len()
    }

    pub fn pointers(&self) -> Vec<PointerId> {
        self.entries.keys().copied().collect()
    }

    /// Shift stored insert indices at or after `at` on `staff` by `delta`
    pub fn shift_indices(&mut self, staff: usize, at: usize, delta: isize) {
        for entry in self.entries.values_mut() {
            if entry.staff_index == staff && entry.insert_index >= at {
                entry.insert_index = entry.insert_index.saturating_add_signed(delta);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
