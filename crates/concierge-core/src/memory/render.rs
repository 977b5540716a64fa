//! Prompt rendering for profile and memory notes.

use serde::Serialize;

use crate::error::Result;
use crate::types::{MemoryNote, Profile, UserState};

const EMPTY_LIST: &str = "- (none)";

/// How many notes of each tier make it into the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLimits {
    /// Most recent global notes by `last_update_date`.
    pub global: usize,
    /// Last session notes by insertion order.
    pub session: usize,
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self {
            global: 6,
            session: 8,
        }
    }
}

/// Global notes, newest date first, at most `limit` of them.
///
/// Notes sharing a date keep their stored order.
pub fn render_global_notes(notes: &[MemoryNote], limit: usize) -> String {
    let mut sorted: Vec<&MemoryNote> = notes.iter().collect();
    sorted.sort_by(|a, b| b.last_update_date.cmp(&a.last_update_date));
    bullet_list(sorted.into_iter().take(limit))
}

/// The last `limit` session notes in insertion order.
pub fn render_session_notes(notes: &[MemoryNote], limit: usize) -> String {
    let start = notes.len().saturating_sub(limit);
    bullet_list(notes[start..].iter())
}

/// Memory block for the system prompt, session tier first.
pub fn render_memories(state: &UserState, limits: &RenderLimits) -> String {
    format!(
        "SESSION memory (temporary; overrides GLOBAL when conflicting):\n{}\n\nGLOBAL memory:\n{}",
        render_session_notes(&state.session_memory.notes, limits.session),
        render_global_notes(&state.global_memory.notes, limits.global),
    )
}

/// Profile as YAML frontmatter (`---` fenced).
pub fn render_profile_frontmatter(profile: &Profile) -> Result<String> {
    #[derive(Serialize)]
    struct Frontmatter<'a> {
        profile: &'a Profile,
    }

    let yaml = serde_yaml::to_string(&Frontmatter { profile })?;
    Ok(format!("---\n{}\n---", yaml.trim()))
}

fn bullet_list<'a>(notes: impl Iterator<Item = &'a MemoryNote>) -> String {
    let lines: Vec<String> = notes.map(|n| format!("- {}", n.text)).collect();
    if lines.is_empty() {
        EMPTY_LIST.to_string()
    } else {
        lines.join("\n")
    }
}
