//! Configuration types, defaults, loading, and validation.

use super::secrets::SecretString;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Game rules (durations, roster size, limits)
    #[serde(default)]
    pub game: GameConfig,

    /// Message queue and chaos driver pacing
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Completion service
    #[serde(default)]
    pub llm: LlmConfig,

    /// HTTP surface
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Identity verification policy
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Game rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Chat phase length in seconds (default: 60)
    #[serde(default = "default_chat_duration")]
    pub chat_duration_secs: u64,

    /// Voting phase length in seconds (default: 30)
    #[serde(default = "default_voting_duration")]
    pub voting_duration_secs: u64,

    /// Participants per game, local user included (default: 10)
    #[serde(default = "default_total_players")]
    pub total_players: usize,

    /// Messages the local user may send per game (default: 10)
    #[serde(default = "default_max_user_messages")]
    pub max_user_messages: u32,

    /// Longest accepted local message, in characters (default: 200)
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Simulated speakers stop once the transcript is longer than this
    #[serde(default = "default_max_transcript_len")]
    pub max_transcript_len: usize,

    /// Non-system entries fed back into generation
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Recent speakers excluded from the next turn
    #[serde(default = "default_recent_sender_window")]
    pub recent_sender_window: usize,

    /// Ticket price in wei (default: 0.001 ETH)
    #[serde(default = "default_entry_fee_wei")]
    pub entry_fee_wei: u64,

    /// Fixed RNG seed for reproducible sessions
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_chat_duration() -> u64 {
    60
}

fn default_voting_duration() -> u64 {
    30
}

fn default_total_players() -> usize {
    10
}

fn default_max_user_messages() -> u32 {
    10
}

fn default_max_message_chars() -> usize {
    200
}

fn default_max_transcript_len() -> usize {
    50
}

fn default_history_window() -> usize {
    12
}

fn default_recent_sender_window() -> usize {
    4
}

fn default_entry_fee_wei() -> u64 {
    1_000_000_000_000_000
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            chat_duration_secs: default_chat_duration(),
            voting_duration_secs: default_voting_duration(),
            total_players: default_total_players(),
            max_user_messages: default_max_user_messages(),
            max_message_chars: default_max_message_chars(),
            max_transcript_len: default_max_transcript_len(),
            history_window: default_history_window(),
            recent_sender_window: default_recent_sender_window(),
            entry_fee_wei: default_entry_fee_wei(),
            seed: None,
        }
    }
}

/// Message queue and chaos driver pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Tasks run per drain cycle (default: 2)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Chaos-driven enqueues are dropped at this many pending tasks
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,

    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_chaos_min_delay_ms")]
    pub chaos_min_delay_ms: u64,

    #[serde(default = "default_chaos_max_delay_ms")]
    pub chaos_max_delay_ms: u64,

    /// Minimum quiet time before the chaos driver enqueues again
    #[serde(default = "default_chaos_quiet_ms")]
    pub chaos_quiet_ms: u64,

    #[serde(default = "default_chaos_enqueue_probability")]
    pub chaos_enqueue_probability: f64,

    #[serde(default = "default_chaos_cap")]
    pub chaos_cap: f64,

    #[serde(default = "default_chaos_step")]
    pub chaos_step: f64,

    /// Delay before the opening burst once chat starts
    #[serde(default = "default_opening_delay_ms")]
    pub opening_delay_ms: u64,

    #[serde(default = "default_opening_burst")]
    pub opening_burst: usize,

    /// Delay between a local send and the reply pattern
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
}

fn default_batch_size() -> usize {
    2
}

fn default_max_pending() -> usize {
    10
}

fn default_min_delay_ms() -> u64 {
    300
}

fn default_max_delay_ms() -> u64 {
    1000
}

fn default_chaos_min_delay_ms() -> u64 {
    1000
}

fn default_chaos_max_delay_ms() -> u64 {
    2500
}

fn default_chaos_quiet_ms() -> u64 {
    1000
}

fn default_chaos_enqueue_probability() -> f64 {
    0.6
}

fn default_chaos_cap() -> f64 {
    10.0
}

fn default_chaos_step() -> f64 {
    0.05
}

fn default_opening_delay_ms() -> u64 {
    1000
}

fn default_opening_burst() -> usize {
    3
}

fn default_reply_delay_ms() -> u64 {
    500
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_pending: default_max_pending(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            chaos_min_delay_ms: default_chaos_min_delay_ms(),
            chaos_max_delay_ms: default_chaos_max_delay_ms(),
            chaos_quiet_ms: default_chaos_quiet_ms(),
            chaos_enqueue_probability: default_chaos_enqueue_probability(),
            chaos_cap: default_chaos_cap(),
            chaos_step: default_chaos_step(),
            opening_delay_ms: default_opening_delay_ms(),
            opening_burst: default_opening_burst(),
            reply_delay_ms: default_reply_delay_ms(),
        }
    }
}

/// Completion service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat completions endpoint
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key. Read from config or `OPENAI_API_KEY`, never written back.
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_presence_penalty")]
    pub presence_penalty: f32,

    #[serde(default = "default_frequency_penalty")]
    pub frequency_penalty: f32,

    /// History messages forwarded upstream
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Use the offline placeholder service
    #[serde(default)]
    pub offline: bool,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_llm_max_tokens() -> u32 {
    60
}

fn default_presence_penalty() -> f32 {
    0.3
}

fn default_frequency_penalty() -> f32 {
    0.5
}

fn default_history_limit() -> usize {
    10
}

fn default_llm_timeout() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_llm_max_tokens(),
            presence_penalty: default_presence_penalty(),
            frequency_penalty: default_frequency_penalty(),
            history_limit: default_history_limit(),
            timeout_secs: default_llm_timeout(),
            offline: false,
        }
    }
}

/// HTTP surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: "127.0.0.1")
    #[serde(default = "default_server_bind")]
    pub bind: String,

    /// Port (default: 3000)
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Allowed CORS origins. Empty means no cross-origin requests.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_server_bind(),
            port: default_server_port(),
            allowed_origins: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log to file (daily rotation)
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Identity verification policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Keep a completed verification across page loads (default: false,
    /// i.e. always re-verify)
    #[serde(default)]
    pub persist_verification: bool,
}

/// Base directory: ~/.turing-arena
pub fn arena_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".turing-arena")
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. Default values
    /// 2. System config: ~/.turing-arena/config.toml
    /// 3. Local config: ./turing-arena.toml
    /// 4. Environment variables
    pub fn load() -> Result<Self> {
        tracing::debug!("Loading configuration...");

        let mut config = Self::default();

        if let Some(system_config_path) = Self::system_config_path()
            && system_config_path.exists()
        {
            tracing::debug!("Loading system config from: {:?}", system_config_path);
            config = Self::load_file(&system_config_path)?;
        }

        let local_config_path = Self::local_config_path();
        if local_config_path.exists() {
            tracing::debug!("Loading local config from: {:?}", local_config_path);
            config = Self::load_file(&local_config_path)?;
        }

        config = Self::apply_env_overrides(config)?;

        tracing::debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply env overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from custom path: {:?}", path);

        if !path.exists() {
            anyhow::bail!("Config file not found: {:?}", path);
        }
        let config = Self::load_file(path)?;
        Self::apply_env_overrides(config)
    }

    /// Get the system config path: ~/.turing-arena/config.toml
    pub fn system_config_path() -> Option<PathBuf> {
        Some(arena_home().join("config.toml"))
    }

    /// Get the local config path: ./turing-arena.toml
    fn local_config_path() -> PathBuf {
        PathBuf::from("./turing-arena.toml")
    }

    /// Parse a TOML file. A later file replaces an earlier one section by
    /// section; absent sections fall back to defaults.
    fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        toml::from_str(&contents).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: Self) -> Result<Self> {
        if let Ok(log_level) = std::env::var("TURING_ARENA_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        if let Ok(log_file) = std::env::var("TURING_ARENA_LOG_FILE") {
            config.logging.file = Some(PathBuf::from(log_file));
        }

        if let Ok(bind) = std::env::var("TURING_ARENA_BIND") {
            config.server.bind = bind;
        }

        if let Ok(port) = std::env::var("TURING_ARENA_PORT") {
            config.server.port = port
                .parse()
                .with_context(|| format!("Invalid TURING_ARENA_PORT: {}", port))?;
        }

        if let Ok(url) = std::env::var("TURING_ARENA_LLM_URL") {
            config.llm.base_url = url;
        }

        if let Ok(model) = std::env::var("TURING_ARENA_LLM_MODEL") {
            config.llm.model = model;
        }

        if let Some(key) = SecretString::from_env("OPENAI_API_KEY") {
            config.llm.api_key = Some(key);
        }

        if let Ok(seed) = std::env::var("TURING_ARENA_SEED") {
            config.game.seed = seed.parse().ok();
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        tracing::debug!("Validating configuration...");

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        if self.game.chat_duration_secs == 0 || self.game.voting_duration_secs == 0 {
            anyhow::bail!("Phase durations must be greater than zero");
        }

        if self.game.total_players < 2 {
            anyhow::bail!(
                "total_players must be at least 2 (got {})",
                self.game.total_players
            );
        }

        let s = &self.scheduler;
        if s.batch_size == 0 {
            anyhow::bail!("scheduler.batch_size must be at least 1");
        }
        if s.min_delay_ms > s.max_delay_ms {
            anyhow::bail!(
                "scheduler delay range is inverted: {} > {}",
                s.min_delay_ms,
                s.max_delay_ms
            );
        }
        if s.chaos_min_delay_ms > s.chaos_max_delay_ms {
            anyhow::bail!(
                "chaos delay range is inverted: {} > {}",
                s.chaos_min_delay_ms,
                s.chaos_max_delay_ms
            );
        }
        if !(0.0..=1.0).contains(&s.chaos_enqueue_probability) {
            anyhow::bail!(
                "chaos_enqueue_probability must be within [0, 1] (got {})",
                s.chaos_enqueue_probability
            );
        }

        if self.llm.base_url.is_empty() {
            anyhow::bail!("llm.base_url is empty");
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Configuration saved to: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.game.chat_duration_secs, 60);
        assert_eq!(config.game.voting_duration_secs, 30);
        assert_eq!(config.game.total_players, 10);
        assert_eq!(config.game.max_user_messages, 10);
        assert_eq!(config.scheduler.batch_size, 2);
        assert_eq!(config.scheduler.max_pending, 10);
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert!(config.llm.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_inverted_delay() {
        let mut config = Config::default();
        config.scheduler.min_delay_ms = 2000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_probability_range() {
        let mut config = Config::default();
        config.scheduler.chaos_enqueue_probability = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_roster_size() {
        let mut config = Config::default();
        config.game.total_players = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_content = r#"
[game]
chat_duration_secs = 30

[llm]
api_key = "sk-from-file"
offline = true
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.game.chat_duration_secs, 30);
        assert_eq!(config.game.voting_duration_secs, 30);
        assert_eq!(config.scheduler.max_pending, 10);
        assert!(config.llm.offline);
        assert_eq!(
            config.llm.api_key.as_ref().map(|k| k.expose_secret()),
            Some("sk-from-file")
        );
    }

    #[test]
    fn test_save_never_writes_api_key() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.llm.api_key = Some(SecretString::from_str("sk-do-not-leak"));
        config.game.chat_duration_secs = 45;

        config.save(temp_file.path()).unwrap();

        let contents = fs::read_to_string(temp_file.path()).unwrap();
        assert!(!contents.contains("sk-do-not-leak"));
        assert!(!contents.contains("api_key"));

        let loaded: Config = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.game.chat_duration_secs, 45);
    }

    #[test]
    fn test_load_from_missing_path() {
        let result = Config::load_from_path("/nonexistent/turing-arena.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_system_config_path() {
        let path = Config::system_config_path().unwrap();
        assert!(path.to_string_lossy().contains(".turing-arena"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }
}
