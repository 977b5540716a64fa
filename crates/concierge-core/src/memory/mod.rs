//! Two-tier preference memory.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      UserState                           │
//! │  ┌───────────────────┐  consolidate  ┌────────────────┐  │
//! │  │  Session notes    │──────────────▶│  Global notes  │  │
//! │  │  (this trip)      │  copy + clear │  (defaults)    │  │
//! │  └───────────────────┘               └────────────────┘  │
//! │            │                                 │           │
//! │            └──────────── render ─────────────┘           │
//! │                 session first, then global               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Notes are never deduplicated. Precedence between conflicting notes is
//! left to the model; this module only orders them in the prompt.

mod consolidation;
mod render;

pub use consolidation::*;
pub use render::*;

use crate::error::{Error, Result};
use crate::types::{MemoryNote, MemoryScope, UserState};

/// Maximum keywords kept on a note.
pub const MAX_KEYWORDS: usize = 3;

/// Today's UTC date as `YYYY-MM-DD`.
pub fn today_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Trim, lowercase and drop empty keywords, keeping the first three.
pub fn normalize_keywords<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .take(MAX_KEYWORDS)
        .collect()
}

/// Append a note to the chosen tier, stamped with today's date.
///
/// Text is trimmed and must not be empty. The caller persists the state.
pub fn add_note<S: AsRef<str>>(
    state: &mut UserState,
    scope: MemoryScope,
    text: &str,
    keywords: impl IntoIterator<Item = S>,
) -> Result<MemoryNote> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::validation("Memory note text must not be empty"));
    }

    let note = MemoryNote::new(text, today_iso(), normalize_keywords(keywords));
    state.notes_mut(scope).push(note.clone());
    Ok(note)
}

/// Delete a note by position in its list.
pub fn remove_note(state: &mut UserState, scope: MemoryScope, index: usize) -> Option<MemoryNote> {
    let notes = state.notes_mut(scope);
    if index < notes.len() {
        Some(notes.remove(index))
    } else {
        None
    }
}

/// Drop every session note without promoting any. Returns how many were dropped.
pub fn clear_session(state: &mut UserState) -> usize {
    let notes = state.notes_mut(MemoryScope::Session);
    let count = notes.len();
    notes.clear();
    count
}
