//! Command implementations for the concierge CLI.
//!
//! Each submodule implements the logic for a command group.

pub mod chat;
pub mod logs;
pub mod memory;
pub mod prices;
pub mod profile;
pub mod status;
pub mod trips;
pub mod user;

use anyhow::{Result, bail};
use concierge_core::storage::{JsonStateStore, StateStore, validate_user_id};
use concierge_core::types::UserState;
use dialoguer::Confirm;

/// State for `user`, or the fresh default when the document is missing or unreadable.
pub(crate) fn load_state(store: &JsonStateStore, user: &str) -> Result<UserState> {
    validate_user_id(user)?;
    Ok(store.load(user))
}

/// 1-based position from the command line to a list index.
pub(crate) fn to_index(position: usize) -> Result<usize> {
    if position == 0 {
        bail!("Positions start at 1");
    }
    Ok(position - 1)
}

pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_to_index() {
        assert_eq!(to_index(1).unwrap(), 0);
        assert!(to_index(0).is_err());
    }

    #[test]
    fn test_load_state_rejects_bad_user() {
        let temp = tempdir().unwrap();
        let store = JsonStateStore::new(temp.path());
        assert!(load_state(&store, "../etc").is_err());
        assert_eq!(load_state(&store, "alice").unwrap(), UserState::default());
    }
}
