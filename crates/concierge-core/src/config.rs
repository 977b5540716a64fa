//! Configuration shared by the concierge CLI and server.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Environment variables (a `.env` file in the working directory is read first)
//! 2. Config file (`$CONCIERGE_CONFIG` or the platform config dir's `config.toml`)
//! 3. Default values

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::auth::UserDirectory;
use crate::error::{Error, Result};
use crate::logs::LogFile;
use crate::memory::RenderLimits;
use crate::storage::JsonStateStore;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Language model provider
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Flight/hotel pricing provider
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Prompt rendering and conversation window
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Turn runner limits
    #[serde(default)]
    pub agent: AgentConfig,

    /// State documents
    #[serde(default)]
    pub storage: StorageConfig,

    /// Paths
    #[serde(default)]
    pub paths: PathsConfig,

    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,

    /// Landing page redirect/embed
    #[serde(default)]
    pub landing: LandingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key (usually from OPENAI_API_KEY)
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL for OpenAI-compatible endpoints
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,

    /// `test` or `production`
    #[serde(default = "default_pricing_hostname")]
    pub hostname: String,

    /// Overrides the hostname-derived URL
    pub base_url: Option<String>,

    #[serde(default = "default_max_results")]
    pub max_results: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Global notes shown in the prompt (newest first)
    #[serde(default = "default_global_render_limit")]
    pub global_render_limit: usize,

    /// Session notes shown in the prompt (latest)
    #[serde(default = "default_session_render_limit")]
    pub session_render_limit: usize,

    /// User turns kept in the conversation window
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model/tool round trips allowed per turn
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Give new users the sample traveller profile
    #[serde(default)]
    pub seed_demo_state: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Base directory for state documents and accounts
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log directory
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Login token lifetime in hours
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandingConfig {
    /// Where `GET /` sends visitors
    pub target_url: Option<String>,

    /// Embed the target in an iframe instead of redirecting
    #[serde(default)]
    pub embed: bool,
}

// Default value functions
fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_pricing_hostname() -> String {
    "test".to_string()
}

fn default_max_results() -> u32 {
    5
}

fn default_global_render_limit() -> usize {
    6
}

fn default_session_render_limit() -> usize {
    8
}

fn default_max_turns() -> usize {
    20
}

fn default_max_tool_rounds() -> usize {
    8
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

fn default_token_ttl_hours() -> u64 {
    24
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "travel-concierge", "concierge")
}

fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = project_dirs() {
        proj_dirs.data_dir().to_path_buf()
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".concierge")
    }
}

fn default_log_dir() -> PathBuf {
    default_data_dir().join("logs")
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_openai_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            hostname: default_pricing_hostname(),
            base_url: None,
            max_results: default_max_results(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            global_render_limit: default_global_render_limit(),
            session_render_limit: default_session_render_limit(),
            max_turns: default_max_turns(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            temperature: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            seed_demo_state: false,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_dir: default_log_dir(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

/// Placeholder values copied from an example `.env` count as unset.
fn is_real_secret(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.starts_with("your_")
}

impl PricingConfig {
    /// Key/secret pair when both are set to real values.
    pub fn credentials(&self) -> Option<(String, String)> {
        let key = self.api_key.as_deref().filter(|k| is_real_secret(k))?;
        let secret = self.api_secret.as_deref().filter(|s| is_real_secret(s))?;
        Some((key.trim().to_string(), secret.trim().to_string()))
    }
}

impl OpenAiConfig {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| is_real_secret(k)).map(str::trim)
    }
}

impl Config {
    /// Load configuration from `.env`, file and environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let config_path = Self::config_path();
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", config_path.display(), e))
            })?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("CONCIERGE_CONFIG") {
            PathBuf::from(path)
        } else if let Some(proj_dirs) = project_dirs() {
            proj_dirs.config_dir().join("config.toml")
        } else {
            default_data_dir().join("config.toml")
        }
    }

    /// Overlay environment values onto the loaded config.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Some(model) = var("OPENAI_MODEL") {
            self.openai.model = model;
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            self.openai.base_url = url;
        }
        if let Some(key) = var("AMADEUS_API_KEY") {
            self.pricing.api_key = Some(key);
        }
        if let Some(secret) = var("AMADEUS_API_SECRET") {
            self.pricing.api_secret = Some(secret);
        }
        if let Some(hostname) = var("AMADEUS_HOSTNAME") {
            self.pricing.hostname = hostname;
        }
        if let Some(dir) = var("CONCIERGE_DATA_DIR") {
            self.paths.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("CONCIERGE_LOG_DIR") {
            self.paths.log_dir = PathBuf::from(dir);
        }
        if let Some(bind) = var("CONCIERGE_BIND") {
            self.server.bind = bind;
        }
    }

    /// Directory holding one JSON document per user.
    pub fn state_dir(&self) -> PathBuf {
        self.paths.data_dir.join("users")
    }

    pub fn state_store(&self) -> JsonStateStore {
        JsonStateStore::new(self.state_dir()).with_demo_seed(self.storage.seed_demo_state)
    }

    pub fn user_directory(&self) -> UserDirectory {
        UserDirectory::new(self.paths.data_dir.join("users.json"))
    }

    pub fn log_file(&self) -> LogFile {
        LogFile::in_dir(&self.paths.log_dir)
    }

    pub fn render_limits(&self) -> RenderLimits {
        RenderLimits {
            global: self.memory.global_render_limit,
            session: self.memory.session_render_limit,
        }
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(self.state_dir())?;
        std::fs::create_dir_all(&self.paths.log_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.pricing.hostname, "test");
        assert_eq!(config.memory.global_render_limit, 6);
        assert_eq!(config.memory.session_render_limit, 8);
        assert_eq!(config.memory.max_turns, 20);
        assert_eq!(config.agent.max_tool_rounds, 8);
        assert!(!config.storage.seed_demo_state);
        assert!(config.landing.target_url.is_none());
        assert!(!config.landing.embed);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [memory]
            max_turns = 5

            [landing]
            target_url = "https://concierge.example.com"
            embed = true
            "#,
        )
        .unwrap();

        assert_eq!(config.memory.max_turns, 5);
        assert_eq!(config.memory.global_render_limit, 6);
        assert_eq!(config.openai.model, "gpt-4o");
        assert!(config.landing.embed);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(env_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("AMADEUS_API_KEY", "key"),
            ("AMADEUS_API_SECRET", "secret"),
            ("CONCIERGE_DATA_DIR", "/tmp/concierge-data"),
        ]));

        assert_eq!(config.openai.api_key(), Some("sk-test"));
        assert_eq!(
            config.pricing.credentials(),
            Some(("key".to_string(), "secret".to_string()))
        );
        assert_eq!(config.paths.data_dir, PathBuf::from("/tmp/concierge-data"));
        assert_eq!(config.state_dir(), PathBuf::from("/tmp/concierge-data/users"));
    }

    #[test]
    fn test_placeholder_credentials_are_ignored() {
        let mut config = Config::default();
        config.apply_env(env_from(&[
            ("OPENAI_API_KEY", "your_openai_key"),
            ("AMADEUS_API_KEY", "your_amadeus_key"),
            ("AMADEUS_API_SECRET", "real"),
        ]));

        assert_eq!(config.openai.api_key(), None);
        assert_eq!(config.pricing.credentials(), None);
    }

    #[test]
    fn test_half_pricing_credentials_disable_pricing() {
        let pricing = PricingConfig {
            api_key: Some("key".to_string()),
            ..PricingConfig::default()
        };
        assert!(pricing.credentials().is_none());
    }

    #[test]
    fn test_ensure_dirs_creates_directories() {
        let temp = tempdir().unwrap();
        let config = Config {
            paths: PathsConfig {
                data_dir: temp.path().join("data"),
                log_dir: temp.path().join("logs"),
            },
            ..Config::default()
        };

        config.ensure_dirs().unwrap();

        assert!(config.state_dir().exists());
        assert!(config.paths.log_dir.exists());
    }
}
