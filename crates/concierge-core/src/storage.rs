//! JSON document storage for per-user state.
//!
//! One pretty-printed document per user at `<dir>/<user_id>.json`. Every save
//! rewrites the whole document through a temp file and a rename, so a reader
//! never sees a half-written file. There is no cross-process locking.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::UserState;

const MAX_USER_ID_LEN: usize = 128;

/// Load/save contract for user state documents.
pub trait StateStore: Send + Sync {
    /// Read a stored document. `Ok(None)` when the user has none yet;
    /// `Err(StorageCorruption)` when it exists but cannot be parsed.
    fn read(&self, user_id: &str) -> Result<Option<UserState>>;

    /// Overwrite the user's document with `state`.
    fn save(&self, user_id: &str, state: &UserState) -> Result<()>;

    /// User ids that currently have a document.
    fn list_users(&self) -> Result<Vec<String>>;

    /// Remove a user's document. Returns false if there was none.
    fn delete(&self, user_id: &str) -> Result<bool>;

    /// State handed to users without a document.
    fn fresh_state(&self) -> UserState {
        UserState::default()
    }

    /// Load a user's state, never failing. Missing documents yield
    /// [`StateStore::fresh_state`]; unreadable ones are logged and replaced
    /// by the default state.
    fn load(&self, user_id: &str) -> UserState {
        match self.read(user_id) {
            Ok(Some(state)) => state,
            Ok(None) => self.fresh_state(),
            Err(e) => {
                warn!(user_id, error = %e, "Falling back to default state");
                UserState::default()
            }
        }
    }
}

/// File-backed [`StateStore`].
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    dir: PathBuf,
    seed_demo_state: bool,
}

impl JsonStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seed_demo_state: false,
        }
    }

    /// Hand new users the sample traveller instead of an empty state.
    pub fn with_demo_seed(mut self, enabled: bool) -> Self {
        self.seed_demo_state = enabled;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a user's document. Validates the id first.
    pub fn user_path(&self, user_id: &str) -> Result<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.dir.join(format!("{}.json", user_id)))
    }
}

impl StateStore for JsonStateStore {
    fn read(&self, user_id: &str) -> Result<Option<UserState>> {
        let path = self.user_path(user_id)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::corrupt(user_id, e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::corrupt(user_id, e))
    }

    fn save(&self, user_id: &str, state: &UserState) -> Result<()> {
        let path = self.user_path(user_id)?;
        let json = serde_json::to_vec_pretty(state)?;
        write_atomic(&path, &json)?;
        debug!(user_id, bytes = json.len(), "Saved user state");
        Ok(())
    }

    fn list_users(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }

        let mut users = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_user_id(stem).is_ok() {
                    users.push(stem.to_string());
                }
            }
        }
        users.sort();
        Ok(users)
    }

    fn delete(&self, user_id: &str) -> Result<bool> {
        let path = self.user_path(user_id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn fresh_state(&self) -> UserState {
        if self.seed_demo_state {
            UserState::demo()
        } else {
            UserState::default()
        }
    }
}

/// Reject ids that could escape the storage directory.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() || user_id.len() > MAX_USER_ID_LEN {
        return Err(Error::InvalidUserId(user_id.to_string()));
    }
    if user_id.starts_with('.') {
        return Err(Error::InvalidUserId(user_id.to_string()));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');
    if !user_id.chars().all(allowed) {
        return Err(Error::InvalidUserId(user_id.to_string()));
    }
    Ok(())
}

/// Write `bytes` to `path` via a sibling temp file and rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Other(format!("Invalid path: {}", path.display())))?;
    let tmp_path = parent.join(format!(".{}.tmp", file_name));

    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}
