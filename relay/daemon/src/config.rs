//! Relay Configuration
//!
//! Configuration loading for the chat relay, supporting a TOML file at
//! `~/.config/avatar-companion/relay.toml`.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/avatar-companion/relay.toml`
//!   (typically `~/.config/avatar-companion/relay.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 3000
//! static_dir = "dist"
//!
//! [persona]
//! name = "Avatar"
//! system_prompt = "You are a cheerful assistant."
//!
//! [upstream]
//! api_url = "https://api.openai.com/v1/chat/completions"
//! api_key = "sk-..."
//! model = "gpt-4o-mini"
//! max_tokens = 200
//! temperature = 0.8
//! timeout_secs = 60
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Field |
//! |----------|-------|
//! | `RELAY_HOST` | `server.host` |
//! | `RELAY_PORT` (or `PORT`) | `server.port` |
//! | `RELAY_STATIC_DIR` | `server.static_dir` |
//! | `RELAY_API_URL` (or `OPENCLAW_API_URL`) | `upstream.api_url` |
//! | `RELAY_API_KEY` (or `OPENCLAW_API_KEY`) | `upstream.api_key` |
//! | `RELAY_MODEL` (or `OPENCLAW_MODEL`) | `upstream.model` |
//! | `CHARACTER_NAME` | `persona.name` |
//! | `CHARACTER_SYSTEM_PROMPT` | `persona.system_prompt` |

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 3000;

/// Default directory holding the built front end
pub const DEFAULT_STATIC_DIR: &str = "dist";

/// Default persona display name
pub const DEFAULT_PERSONA_NAME: &str = "Avatar";

/// Default persona instruction
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a kind and cheerful avatar assistant. \
Chat with the user in a friendly way. Keep replies short and use emoji sparingly.";

/// Default completion endpoint
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default upstream model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default completion length cap
pub const DEFAULT_MAX_TOKENS: u32 = 200;

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Default upstream request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where the configuration was last overridden from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[server]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerToml {
    /// Bind host
    pub host: Option<String>,
    /// Listen port
    pub port: Option<u16>,
    /// Static front-end directory
    pub static_dir: Option<PathBuf>,
}

/// `[persona]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaToml {
    /// Character display name
    pub name: Option<String>,
    /// System instruction prepended to every request
    pub system_prompt: Option<String>,
}

/// `[upstream]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamToml {
    /// Completion endpoint URL
    pub api_url: Option<String>,
    /// Bearer credential (empty means demo mode)
    pub api_key: Option<String>,
    /// Model identifier
    pub model: Option<String>,
    /// Completion length cap
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Root of `relay.toml`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayToml {
    /// Listener settings
    pub server: ServerToml,
    /// Character settings
    pub persona: PersonaToml,
    /// Completion API settings
    pub upstream: UpstreamToml,
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// The character the relay speaks as
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Persona {
    /// Display name, reported by the health endpoint
    pub name: String,
    /// Instruction sent as the first message of every upstream request
    pub system_prompt: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: DEFAULT_PERSONA_NAME.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Completion API settings
#[derive(Clone, Debug, PartialEq)]
pub struct UpstreamConfig {
    /// Completion endpoint URL
    pub api_url: String,
    /// Bearer credential; `None` selects demo mode
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Completion length cap
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Fully resolved relay configuration
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Bind host
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Directory of static front-end files
    pub static_dir: PathBuf,

    /// Character the relay speaks as
    pub persona: Persona,

    /// Completion API settings
    pub upstream: UpstreamConfig,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            persona: Persona::default(),
            upstream: UpstreamConfig::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl RelayConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the highest-priority source that contributed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// `host:port` string for the listener
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether requests are answered with the canned demo reply
    #[must_use]
    pub fn is_demo_mode(&self) -> bool {
        self.upstream.api_key.is_none()
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be non-zero".to_string(),
            ));
        }
        if self.upstream.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "upstream.max_tokens must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.upstream.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "upstream.temperature must be within 0.0..=2.0, got {}",
                self.upstream.temperature
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/avatar-companion/relay.toml` or
/// `~/.config/avatar-companion/relay.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("avatar-companion").join("relay.toml"))
}

/// Load configuration from the default path and the process environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read, parsed
/// or validated. A missing config file is not an error.
pub fn load_config() -> Result<RelayConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path and the process environment
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<RelayConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup
///
/// `env` is consulted for each variable in the table above; tests pass a
/// map-backed closure instead of mutating the process environment.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = RelayConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: RelayToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            info!(path = %config_path.display(), "Loaded configuration from file");
        } else {
            debug!(path = %config_path.display(), "Config file not found, using defaults");
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

fn apply_toml_config(config: &mut RelayConfig, toml: &RelayToml) {
    if let Some(ref host) = toml.server.host {
        config.host.clone_from(host);
    }
    if let Some(port) = toml.server.port {
        config.port = port;
    }
    if let Some(ref dir) = toml.server.static_dir {
        config.static_dir.clone_from(dir);
    }

    if let Some(ref name) = toml.persona.name {
        config.persona.name.clone_from(name);
    }
    if let Some(ref prompt) = toml.persona.system_prompt {
        config.persona.system_prompt.clone_from(prompt);
    }

    if let Some(ref url) = toml.upstream.api_url {
        config.upstream.api_url.clone_from(url);
    }
    if let Some(ref key) = toml.upstream.api_key {
        config.upstream.api_key = non_empty(key);
    }
    if let Some(ref model) = toml.upstream.model {
        config.upstream.model.clone_from(model);
    }
    if let Some(max_tokens) = toml.upstream.max_tokens {
        config.upstream.max_tokens = max_tokens;
    }
    if let Some(temperature) = toml.upstream.temperature {
        config.upstream.temperature = temperature;
    }
    if let Some(secs) = toml.upstream.timeout_secs {
        config.upstream.timeout = Duration::from_secs(secs);
    }
}

fn apply_env_config<F>(config: &mut RelayConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = env("RELAY_HOST") {
        config.host = host;
        config.source = ConfigSource::Env;
    }
    if let Some(port) = env("RELAY_PORT").or_else(|| env("PORT")) {
        match port.parse::<u16>() {
            Ok(port) => {
                config.port = port;
                config.source = ConfigSource::Env;
            }
            Err(_) => warn!(value = %port, "Ignoring unparsable port from environment"),
        }
    }
    if let Some(dir) = env("RELAY_STATIC_DIR") {
        config.static_dir = PathBuf::from(dir);
        config.source = ConfigSource::Env;
    }

    if let Some(url) = env("RELAY_API_URL").or_else(|| env("OPENCLAW_API_URL")) {
        config.upstream.api_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(key) = env("RELAY_API_KEY").or_else(|| env("OPENCLAW_API_KEY")) {
        config.upstream.api_key = non_empty(&key);
        config.source = ConfigSource::Env;
    }
    if let Some(model) = env("RELAY_MODEL").or_else(|| env("OPENCLAW_MODEL")) {
        config.upstream.model = model;
        config.source = ConfigSource::Env;
    }

    if let Some(name) = env("CHARACTER_NAME") {
        config.persona.name = name;
        config.source = ConfigSource::Env;
    }
    if let Some(prompt) = env("CHARACTER_SYSTEM_PROMPT") {
        config.persona.system_prompt = prompt;
        config.source = ConfigSource::Env;
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Bind host override
    pub host: Option<String>,

    /// Port override
    pub port: Option<u16>,

    /// Static directory override
    pub static_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bind host override
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set port override
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set static directory override
    #[must_use]
    pub fn with_static_dir(mut self, dir: PathBuf) -> Self {
        self.static_dir = Some(dir);
        self
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.port.is_none() && self.static_dir.is_none()
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut RelayConfig) {
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref host) = self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ref dir) = self.static_dir {
            config.static_dir.clone_from(dir);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
