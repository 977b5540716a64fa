//! Per-turn system instructions.

use chrono::{Datelike, Local, NaiveDate};
use concierge_core::Result;
use concierge_core::memory::{RenderLimits, render_memories, render_profile_frontmatter};
use concierge_core::types::UserState;

const BASE_INSTRUCTIONS: &str = "\
You are a concise, reliable travel concierge.
Help users plan and book flights, hotels, and car/travel insurance.

Today's date is: {current_date}

Guidelines:
- Collect key trip details and confirm understanding.
- Ask only one focused clarifying question at a time.
- Provide a few strong options with brief tradeoffs, then recommend one.
- Respect stable user preferences and constraints; avoid assumptions.
- Before booking, restate all details and get explicit approval.
- Never invent prices, availability, or policies. Use tools or state uncertainty.
- Do not repeat sensitive PII; only request what is required.
- Track multi-step itineraries and unresolved decisions.
- When a date is provided without a year, assume the current year ({current_year}).";

pub const MEMORY_POLICY: &str = "\
<memory_policy>
You may receive two memory lists:
- GLOBAL memory = long-term defaults (\"usually / in general\").
- SESSION memory = trip-specific overrides (\"this trip / this time\").

How to use memory:
- Use memory only when it is relevant to the user's current decision (flight/hotel/insurance choices).
- Apply relevant memory automatically when setting tone, proposing options and making recommendations.
- Do not repeat memory verbatim to the user unless it's necessary to confirm a critical constraint.

Precedence and conflicts:
1) The user's latest message in this conversation overrides everything.
2) SESSION memory overrides GLOBAL memory for this trip when they conflict.
3) Within the same memory list, if two items conflict, prefer the most recent by date.
4) Treat GLOBAL memory as a default, not a hard constraint, unless the user explicitly states it as non-negotiable.

When to ask a clarifying question:
- Ask exactly one focused question only if a memory materially affects booking and the user's intent is ambiguous.

Where memory should influence decisions:
- Flights: seat preference, baggage habits, airline loyalty/status, layover tolerance.
- Hotels: neighborhood/location style, room preferences, brand loyalty IDs/status.
- Insurance: known coverage profile, whether the user wants add-ons.

Memory updates:
- Do NOT treat \"this time\" requests as changes to GLOBAL defaults.
- Only promote a preference into GLOBAL memory if the user indicates it's a lasting rule.
- If a new durable preference/constraint appears, store it via the memory tool.

Safety:
- Never store or echo sensitive PII (passport numbers, payment details, full DOB).
</memory_policy>";

/// System prompt for `state` as of `today`.
pub fn build_instructions(state: &UserState, limits: &RenderLimits, today: NaiveDate) -> Result<String> {
    let base = BASE_INSTRUCTIONS
        .replace("{current_date}", &today.format("%B %d, %Y").to_string())
        .replace("{current_year}", &today.year().to_string());
    let frontmatter = render_profile_frontmatter(&state.profile)?;

    Ok(format!(
        "{base}\n\n<user_profile>\n{frontmatter}\n</user_profile>\n\n<memories>\n{memories}\n</memories>\n\n{MEMORY_POLICY}",
        memories = render_memories(state, limits),
    ))
}

/// System prompt dated with the local calendar day.
pub fn build_instructions_now(state: &UserState, limits: &RenderLimits) -> Result<String> {
    build_instructions(state, limits, Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::memory::add_note;
    use concierge_core::types::MemoryScope;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    #[test]
    fn test_date_and_year_are_filled_in() {
        let prompt = build_instructions(&UserState::default(), &RenderLimits::default(), today()).unwrap();
        assert!(prompt.contains("Today's date is: January 15, 2026"));
        assert!(prompt.contains("assume the current year (2026)"));
        assert!(!prompt.contains("{current_"));
    }

    #[test]
    fn test_sections_in_order() {
        let mut state = UserState::demo();
        add_note(&mut state, MemoryScope::Session, "This trip: window seat", ["seat"]).unwrap();

        let prompt = build_instructions(&state, &RenderLimits::default(), today()).unwrap();

        let profile = prompt.find("<user_profile>\n---\nprofile:").unwrap();
        let session = prompt.find("SESSION memory").unwrap();
        let global = prompt.find("GLOBAL memory:\n").unwrap();
        let policy = prompt.find("<memory_policy>").unwrap();
        assert!(profile < session && session < global && global < policy);
        assert!(prompt.contains("- This trip: window seat"));
    }

    #[test]
    fn test_empty_memories_render_none() {
        let prompt = build_instructions(&UserState::default(), &RenderLimits::default(), today()).unwrap();
        let memories = prompt
            .split("<memories>\n")
            .nth(1)
            .and_then(|rest| rest.split("\n</memories>").next())
            .unwrap();
        assert_eq!(memories.matches("- (none)").count(), 2);
    }
}
