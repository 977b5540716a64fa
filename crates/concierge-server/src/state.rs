//! Application state.

use concierge_agent::{Concierge, Conversation};
use concierge_core::auth::{SessionToken, UserDirectory};
use concierge_core::logs::LogFile;
use concierge_core::storage::{JsonStateStore, StateStore};
use concierge_core::types::UserState;
use concierge_core::Config;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// Login token registry
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: RwLock<HashMap<Uuid, SessionToken>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a token for `username`.
    pub async fn issue(&self, username: &str, ttl: Option<Duration>) -> SessionToken {
        let token = SessionToken::generate(username, ttl);
        self.tokens.write().await.insert(token.token_id, token.clone());
        token
    }

    /// Find the token matching raw bytes, expired or not.
    pub async fn lookup(&self, token_bytes: &[u8]) -> Option<SessionToken> {
        let tokens = self.tokens.read().await;
        tokens.values().find(|t| t.verify(token_bytes)).cloned()
    }

    /// Remove expired tokens and return the users they belonged to.
    pub async fn prune_expired(&self) -> Vec<String> {
        let mut tokens = self.tokens.write().await;
        let mut owners = Vec::new();
        tokens.retain(|_, t| {
            if t.is_expired() {
                if !owners.contains(&t.username) {
                    owners.push(t.username.clone());
                }
                return false;
            }
            true
        });
        owners
    }

    pub async fn revoke(&self, token_id: Uuid) -> bool {
        self.tokens.write().await.remove(&token_id).is_some()
    }

    /// Live tokens held by one user.
    pub async fn count_for(&self, username: &str) -> usize {
        self.tokens
            .read()
            .await
            .values()
            .filter(|t| t.username == username && !t.is_expired())
            .count()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }
}

/// Loaded state and running conversation for one signed-in user
#[derive(Debug)]
pub struct UserSession {
    pub state: UserState,
    pub conversation: Conversation,
}

/// Shared application state
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<JsonStateStore>,
    pub users: UserDirectory,
    /// `None` when no model API key is configured
    pub concierge: Option<Concierge>,
    pub tokens: TokenRegistry,
    /// One lock per user serialises turns and edits on that user's state
    sessions: RwLock<HashMap<String, Arc<Mutex<UserSession>>>>,
    pub log_file: LogFile,
    pub start_time: Instant,
}

impl AppState {
    /// Build state from configuration. Chat stays disabled without an API key.
    pub fn new(config: Config) -> Arc<Self> {
        let store = Arc::new(config.state_store());
        let concierge = match Concierge::from_config(&config, store.clone()) {
            Ok(concierge) => Some(concierge),
            Err(e) => {
                warn!(error = %e, "Chat disabled");
                None
            }
        };
        Self::with_concierge(config, store, concierge)
    }

    pub fn with_concierge(
        config: Config,
        store: Arc<JsonStateStore>,
        concierge: Option<Concierge>,
    ) -> Arc<Self> {
        Arc::new(Self {
            users: config.user_directory(),
            log_file: config.log_file(),
            config: Arc::new(config),
            store,
            concierge,
            tokens: TokenRegistry::new(),
            sessions: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        })
    }

    pub fn token_ttl(&self) -> Option<Duration> {
        match self.config.server.token_ttl_hours {
            0 => None,
            hours => Some(Duration::from_secs(hours * 3600)),
        }
    }

    /// Sign `username` in, sweeping expired tokens first.
    pub async fn sign_in(&self, username: &str) -> SessionToken {
        let pruned = self.tokens.prune_expired().await;
        if !pruned.is_empty() {
            debug!(users = pruned.len(), "Pruned expired tokens");
        }
        for owner in &pruned {
            self.release_if_idle(owner).await;
        }
        self.tokens.issue(username, self.token_ttl()).await
    }

    /// Drop the user's session once they hold no live token.
    pub async fn release_if_idle(&self, username: &str) -> bool {
        if self.tokens.count_for(username).await > 0 {
            return false;
        }
        self.drop_session(username).await
    }

    /// Session for `username`, loading its state document on first use.
    pub async fn session(&self, username: &str) -> Arc<Mutex<UserSession>> {
        if let Some(session) = self.sessions.read().await.get(username) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(username.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(UserSession {
                    state: self.store.load(username),
                    conversation: Conversation::new(self.config.memory.max_turns),
                }))
            })
            .clone()
    }

    /// Forget a user's cached session. The next request reloads from disk.
    pub async fn drop_session(&self, username: &str) -> bool {
        self.sessions.write().await.remove(username).is_some()
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}
