//! Promotion of session notes into global memory.
//!
//! Consolidation is a literal copy-all-then-clear: every session note is
//! appended to the global list in its original order and the session list is
//! emptied. No note is judged, merged or dropped.

use serde::Serialize;

use crate::types::{MemoryScope, UserState};

/// Outcome of a consolidation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsolidationReport {
    /// Session notes appended to global memory.
    pub promoted: usize,
    /// Size of the global list afterwards.
    pub global_total: usize,
}

impl ConsolidationReport {
    pub fn is_noop(&self) -> bool {
        self.promoted == 0
    }
}

/// Move all session notes to the end of the global list.
///
/// Existing global notes are left untouched. Calling this with an empty
/// session list changes nothing. The caller persists the state.
pub fn consolidate(state: &mut UserState) -> ConsolidationReport {
    let promoted = std::mem::take(state.notes_mut(MemoryScope::Session));
    let count = promoted.len();

    let global = state.notes_mut(MemoryScope::Global);
    global.extend(promoted);

    ConsolidationReport {
        promoted: count,
        global_total: global.len(),
    }
}
