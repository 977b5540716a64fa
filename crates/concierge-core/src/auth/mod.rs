//! Account directory for concierge-core.
//!
//! Provides password accounts for:
//! - Login to the web front end (session tokens, see [`token`])
//! - Selecting whose state the CLI operates on
//!
//! Accounts live in a single `users.json` map keyed by lowercase username.

mod token;

pub use token::SessionToken;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::storage::{validate_user_id, write_atomic};

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 4;

/// Default account created when the directory is empty.
pub const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "admin";

/// Stored account entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub display_name: String,
    /// Hex SHA-256 of `salt + password`
    pub password_hash: String,
    /// Hex salt. Absent on accounts hashed without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl UserRecord {
    fn verify(&self, password: &str) -> bool {
        hash_password(password, self.salt.as_deref()) == self.password_hash
    }
}

/// Compute SHA-256 of an optional salt followed by the password, as hex
pub fn hash_password(password: &str, salt: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    if let Some(salt) = salt {
        hasher.update(salt.as_bytes());
    }
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_salt() -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    hex::encode(salt)
}

/// File-backed account store
#[derive(Debug, Clone)]
pub struct UserDirectory {
    path: PathBuf,
}

impl UserDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, UserRecord>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn store(&self, users: &BTreeMap<String, UserRecord>) -> Result<()> {
        let json = serde_json::to_vec_pretty(users)?;
        write_atomic(&self.path, &json)
    }

    /// Check credentials. Returns the account on success.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<UserRecord> {
        if username.is_empty() || password.is_empty() {
            return Err(Error::InvalidCredentials);
        }

        let users = self.load()?;
        let Some(user) = users.get(&username.to_lowercase()) else {
            warn!(username, "Login attempt for unknown user");
            return Err(Error::InvalidCredentials);
        };

        if user.verify(password) {
            info!(username = %user.username, "User logged in");
            Ok(user.clone())
        } else {
            warn!(username = %user.username, "Failed login attempt");
            Err(Error::InvalidCredentials)
        }
    }

    /// Register a new account. Usernames are stored lowercase.
    pub fn create_user(
        &self,
        username: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<UserRecord> {
        let username = username.trim().to_lowercase();
        if username.len() < MIN_USERNAME_LEN {
            return Err(Error::validation(format!(
                "Username must be at least {} characters",
                MIN_USERNAME_LEN
            )));
        }
        validate_user_id(&username)
            .map_err(|_| Error::validation("Username may only contain letters, digits, '.', '_' and '-'"))?;
        check_password(password)?;

        let mut users = self.load()?;
        if users.contains_key(&username) {
            return Err(Error::UserExists(username));
        }

        let salt = generate_salt();
        let record = UserRecord {
            display_name: display_name
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or(username.as_str())
                .to_string(),
            password_hash: hash_password(password, Some(&salt)),
            salt: Some(salt),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            username: username.clone(),
        };

        users.insert(username.clone(), record.clone());
        self.store(&users)?;
        info!(username = %username, "Created user");
        Ok(record)
    }

    /// Display name, falling back to the username itself.
    pub fn display_name(&self, username: &str) -> String {
        self.load()
            .ok()
            .and_then(|users| users.get(&username.to_lowercase()).map(|u| u.display_name.clone()))
            .unwrap_or_else(|| username.to_string())
    }

    pub fn user_exists(&self, username: &str) -> Result<bool> {
        Ok(self.load()?.contains_key(&username.to_lowercase()))
    }

    /// Replace a password after verifying the current one.
    pub fn change_password(&self, username: &str, old_password: &str, new_password: &str) -> Result<()> {
        self.authenticate(username, old_password)?;
        check_password(new_password)?;

        let username = username.to_lowercase();
        let mut users = self.load()?;
        let user = users
            .get_mut(&username)
            .ok_or_else(|| Error::UserNotFound(username.clone()))?;

        let salt = generate_salt();
        user.password_hash = hash_password(new_password, Some(&salt));
        user.salt = Some(salt);

        self.store(&users)?;
        info!(username = %username, "Password changed");
        Ok(())
    }

    /// Remove an account. Returns false if it did not exist.
    pub fn delete_user(&self, username: &str) -> Result<bool> {
        let mut users = self.load()?;
        if users.remove(&username.to_lowercase()).is_none() {
            return Ok(false);
        }
        self.store(&users)?;
        info!(username, "Deleted user");
        Ok(true)
    }

    pub fn list_users(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }

    /// Create `admin/admin` when no account exists. Returns true if created.
    pub fn ensure_default_user(&self) -> Result<bool> {
        if !self.load()?.is_empty() {
            return Ok(false);
        }
        self.create_user(DEFAULT_USERNAME, DEFAULT_PASSWORD, Some("Administrator"))?;
        warn!("Default admin user created (username: admin, password: admin)");
        Ok(true)
    }
}

fn check_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn directory() -> (tempfile::TempDir, UserDirectory) {
        let temp = tempdir().unwrap();
        let dir = UserDirectory::new(temp.path().join("users.json"));
        (temp, dir)
    }

    #[test]
    fn test_create_and_authenticate() {
        let (_temp, dir) = directory();

        let user = dir.create_user("Alice", "secret", Some("Alice A.")).unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.display_name, "Alice A.");
        assert!(user.salt.is_some());

        assert_eq!(dir.authenticate("ALICE", "secret").unwrap().username, "alice");
        assert!(matches!(dir.authenticate("alice", "wrong"), Err(Error::InvalidCredentials)));
        assert!(matches!(dir.authenticate("nobody", "secret"), Err(Error::InvalidCredentials)));
        assert!(matches!(dir.authenticate("", ""), Err(Error::InvalidCredentials)));
    }

    #[test]
    fn test_create_validation() {
        let (_temp, dir) = directory();

        assert!(matches!(dir.create_user("ab", "secret", None), Err(Error::Validation(_))));
        assert!(matches!(dir.create_user("alice", "abc", None), Err(Error::Validation(_))));
        assert!(matches!(dir.create_user("../evil", "secret", None), Err(Error::Validation(_))));

        dir.create_user("alice", "secret", None).unwrap();
        assert!(matches!(dir.create_user("ALICE", "other1", None), Err(Error::UserExists(_))));
    }

    #[test]
    fn test_display_name_fallback() {
        let (_temp, dir) = directory();
        dir.create_user("bob", "secret", None).unwrap();

        assert_eq!(dir.display_name("bob"), "bob");
        assert_eq!(dir.display_name("ghost"), "ghost");
    }

    #[test]
    fn test_change_password() {
        let (_temp, dir) = directory();
        dir.create_user("carol", "first", None).unwrap();

        assert!(dir.change_password("carol", "nope", "second").is_err());
        assert!(matches!(dir.change_password("carol", "first", "x"), Err(Error::Validation(_))));

        dir.change_password("carol", "first", "second").unwrap();
        assert!(dir.authenticate("carol", "first").is_err());
        assert!(dir.authenticate("carol", "second").is_ok());
    }

    #[test]
    fn test_delete_and_list() {
        let (_temp, dir) = directory();
        dir.create_user("bob", "secret", None).unwrap();
        dir.create_user("alice", "secret", None).unwrap();

        assert_eq!(dir.list_users().unwrap(), vec!["alice", "bob"]);
        assert!(dir.delete_user("Bob").unwrap());
        assert!(!dir.delete_user("bob").unwrap());
        assert_eq!(dir.list_users().unwrap(), vec!["alice"]);
        assert!(!dir.user_exists("bob").unwrap());
    }

    #[test]
    fn test_ensure_default_user_only_when_empty() {
        let (_temp, dir) = directory();

        assert!(dir.ensure_default_user().unwrap());
        assert!(dir.authenticate("admin", "admin").is_ok());
        assert!(!dir.ensure_default_user().unwrap());
    }

    #[test]
    fn test_unsalted_hash_still_verifies() {
        let (_temp, dir) = directory();
        let legacy = serde_json::json!({
            "dave": {
                "username": "dave",
                "display_name": "Dave",
                "password_hash": hash_password("hunter2", None)
            }
        });
        fs::write(dir.path(), legacy.to_string()).unwrap();

        assert!(dir.authenticate("dave", "hunter2").is_ok());
    }

    #[test]
    fn test_known_hash() {
        assert_eq!(
            hash_password("hello", None),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
