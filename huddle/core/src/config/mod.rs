//! TOML Configuration File Support
//!
//! Centralized configuration loading for the huddle, supporting a TOML file at
//! `~/.config/huddle/huddle.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! The configuration file follows the XDG Base Directory specification:
//! - `$XDG_CONFIG_HOME/huddle/huddle.toml` (typically `~/.config/huddle/huddle.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! base_url = "http://localhost:5000"
//! request_timeout_ms = 30000
//!
//! [playback]
//! typing_min_ms = 500
//! typing_max_ms = 1500
//! inter_block_ms = 800
//! handoff_ms = 1000
//! seed = 42
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendConfig;
use crate::huddle::HuddleConfig;
use crate::scheduler::PlaybackConfig;

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

/// Tracks where a configuration value came from
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

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Base URL of the advisory service
    pub base_url: Option<String>,

    /// Request timeout in milliseconds
    pub request_timeout_ms: Option<u64>,
}

/// Playback section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackToml {
    /// Shortest typing dwell in milliseconds
    pub typing_min_ms: Option<u64>,

    /// Longest typing dwell in milliseconds
    pub typing_max_ms: Option<u64>,

    /// Pause between messages of one turn in milliseconds
    pub inter_block_ms: Option<u64>,

    /// Pause after a hand-off in milliseconds
    pub handoff_ms: Option<u64>,

    /// Jitter seed
    pub seed: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HuddleToml {
    /// Backend configuration section
    pub backend: BackendToml,

    /// Playback configuration section
    pub playback: PlaybackToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved configuration for a huddle
///
/// Consolidates configuration from all sources and tracks where it came from.
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct HuddleSettings {
    /// Backend base URL
    pub backend_url: String,

    /// Bound on one backend request
    pub request_timeout: Duration,

    /// Dwell intervals and jitter seed
    pub playback: PlaybackConfig,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for HuddleSettings {
    fn default() -> Self {
        let backend = BackendConfig::default();
        Self {
            backend_url: backend.base_url,
            request_timeout: backend.request_timeout,
            playback: PlaybackConfig::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl HuddleSettings {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Backend client configuration
    #[must_use]
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig::new(self.backend_url.clone()).with_timeout(self.request_timeout)
    }

    /// Huddle configuration
    #[must_use]
    pub fn huddle_config(&self) -> HuddleConfig {
        HuddleConfig {
            request_timeout: self.request_timeout,
            playback: self.playback.clone(),
        }
    }

    /// Check that the values make sense together
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for an empty backend URL, a
    /// zero request timeout, or a typing window whose minimum exceeds its
    /// maximum.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend base_url must not be empty".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.playback.typing_min > self.playback.typing_max {
            return Err(ConfigError::ValidationError(format!(
                "typing_min_ms ({}) exceeds typing_max_ms ({})",
                self.playback.typing_min.as_millis(),
                self.playback.typing_max.as_millis()
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
/// Returns `$XDG_CONFIG_HOME/huddle/huddle.toml` or
/// `~/.config/huddle/huddle.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("huddle").join("huddle.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if the
/// resulting configuration is invalid. A missing config file is not an error.
pub fn load_config() -> Result<HuddleSettings, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed, or
/// if validation fails.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<HuddleSettings, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration reading environment variables through `env`
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<HuddleSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = HuddleSettings::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: HuddleToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    // Environment overrides file values
    apply_env_config(&mut config, env);

    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut HuddleSettings, toml: &HuddleToml) {
    if let Some(ref url) = toml.backend.base_url {
        config.backend_url = url.clone();
    }
    if let Some(ms) = toml.backend.request_timeout_ms {
        config.request_timeout = Duration::from_millis(ms);
    }

    let playback = &toml.playback;
    if let Some(ms) = playback.typing_min_ms {
        config.playback.typing_min = Duration::from_millis(ms);
    }
    if let Some(ms) = playback.typing_max_ms {
        config.playback.typing_max = Duration::from_millis(ms);
    }
    if let Some(ms) = playback.inter_block_ms {
        config.playback.inter_block = Duration::from_millis(ms);
    }
    if let Some(ms) = playback.handoff_ms {
        config.playback.handoff = Duration::from_millis(ms);
    }
    if let Some(seed) = playback.seed {
        config.playback.seed = Some(seed);
    }
}

/// Apply environment variables to the config struct
///
/// Unparseable numeric values are ignored with a warning.
fn apply_env_config<F>(config: &mut HuddleSettings, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let millis = |key: &str| -> Option<Duration> {
        let raw = env(key)?;
        match raw.trim().parse::<u64>() {
            Ok(ms) => Some(Duration::from_millis(ms)),
            Err(_) => {
                tracing::warn!(key, value = %raw, "Ignoring non-numeric environment value");
                None
            }
        }
    };

    if let Some(url) = env("HUDDLE_BACKEND_URL") {
        config.backend_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = millis("HUDDLE_REQUEST_TIMEOUT_MS") {
        config.request_timeout = timeout;
        config.source = ConfigSource::Env;
    }
    if let Some(dwell) = millis("HUDDLE_TYPING_MIN_MS") {
        config.playback.typing_min = dwell;
        config.source = ConfigSource::Env;
    }
    if let Some(dwell) = millis("HUDDLE_TYPING_MAX_MS") {
        config.playback.typing_max = dwell;
        config.source = ConfigSource::Env;
    }
    if let Some(dwell) = millis("HUDDLE_INTER_BLOCK_MS") {
        config.playback.inter_block = dwell;
        config.source = ConfigSource::Env;
    }
    if let Some(dwell) = millis("HUDDLE_HANDOFF_MS") {
        config.playback.handoff = dwell;
        config.source = ConfigSource::Env;
    }
    if let Some(seed) = env("HUDDLE_SEED") {
        if let Ok(seed) = seed.trim().parse::<u64>() {
            config.playback.seed = Some(seed);
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides,
/// then call [`HuddleSettings::validate`] again.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Backend URL override
    pub backend_url: Option<String>,

    /// Request timeout override (milliseconds)
    pub request_timeout_ms: Option<u64>,

    /// Jitter seed override
    pub seed: Option<u64>,

    /// Zero every dwell
    pub instant: bool,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set backend URL override
    #[must_use]
    pub fn with_backend_url(mut self, url: String) -> Self {
        self.backend_url = Some(url);
        self
    }

    /// Set request timeout override
    #[must_use]
    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = Some(ms);
        self
    }

    /// Set jitter seed override
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Play back without any dwell
    #[must_use]
    pub fn with_instant(mut self, instant: bool) -> Self {
        self.instant = instant;
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut HuddleSettings) {
        if self.backend_url.is_some()
            || self.request_timeout_ms.is_some()
            || self.seed.is_some()
            || self.instant
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.backend_url {
            config.backend_url = url.clone();
        }

        if let Some(ms) = self.request_timeout_ms {
            config.request_timeout = Duration::from_millis(ms);
        }

        if let Some(seed) = self.seed {
            config.playback.seed = Some(seed);
        }

        if self.instant {
            config.playback.typing_min = Duration::ZERO;
            config.playback.typing_max = Duration::ZERO;
            config.playback.inter_block = Duration::ZERO;
            config.playback.handoff = Duration::ZERO;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_key: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn toml_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // =========================================================================
    // Default Configuration Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = HuddleSettings::default();

        assert_eq!(config.backend_url, "http://localhost:5000");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.playback.typing_min, Duration::from_millis(500));
        assert_eq!(config.playback.typing_max, Duration::from_millis(1500));
        assert_eq!(config.playback.inter_block, Duration::from_millis(800));
        assert_eq!(config.playback.handoff, Duration::from_millis(1000));
        assert_eq!(config.playback.seed, None);
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("huddle"));
            assert!(p.to_string_lossy().ends_with("huddle.toml"));
        }
    }

    // =========================================================================
    // TOML Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_valid_toml() {
        let file = toml_file(
            r#"
[backend]
base_url = "http://advisors.internal:8080"
request_timeout_ms = 10000

[playback]
typing_min_ms = 100
typing_max_ms = 200
inter_block_ms = 50
handoff_ms = 75
seed = 42
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.backend_url, "http://advisors.internal:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.playback.typing_min, Duration::from_millis(100));
        assert_eq!(config.playback.typing_max, Duration::from_millis(200));
        assert_eq!(config.playback.inter_block, Duration::from_millis(50));
        assert_eq!(config.playback.handoff, Duration::from_millis(75));
        assert_eq!(config.playback.seed, Some(42));
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path, Some(file.path().to_path_buf()));
    }

    #[test]
    fn test_parse_partial_toml() {
        let file = toml_file("[playback]\nhandoff_ms = 0\n");
        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.playback.handoff, Duration::ZERO);
        assert_eq!(config.playback.typing_min, Duration::from_millis(500));
        assert_eq!(config.backend_url, "http://localhost:5000");
    }

    #[test]
    fn test_parse_invalid_toml() {
        let file = toml_file("[backend\nbase_url = ");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = PathBuf::from("/nonexistent/huddle/huddle.toml");
        let config = load_config_with_env(Some(path), no_env).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
        assert_eq!(config.config_file_path, None);
    }

    // =========================================================================
    // Environment Tests
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let file = toml_file("[backend]\nbase_url = \"http://from-file\"\n");
        let env = env_from(&[
            ("HUDDLE_BACKEND_URL", "http://from-env"),
            ("HUDDLE_TYPING_MAX_MS", "2000"),
            ("HUDDLE_SEED", "7"),
        ]);

        let config = load_config_with_env(Some(file.path().to_path_buf()), env).unwrap();

        assert_eq!(config.backend_url, "http://from-env");
        assert_eq!(config.playback.typing_max, Duration::from_millis(2000));
        assert_eq!(config.playback.seed, Some(7));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_env_ignores_garbage_numbers() {
        let env = env_from(&[("HUDDLE_REQUEST_TIMEOUT_MS", "soon")]);
        let config = load_config_with_env(None, env).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.source(), ConfigSource::Default);
    }

    // =========================================================================
    // Validation Tests
    // =========================================================================

    #[test]
    fn test_inverted_typing_window_rejected() {
        let env = env_from(&[("HUDDLE_TYPING_MIN_MS", "3000")]);
        let result = load_config_with_env(None, env);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let file = toml_file("[backend]\nrequest_timeout_ms = 0\n");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_empty_url_rejected() {
        let env = env_from(&[("HUDDLE_BACKEND_URL", "  ")]);
        let result = load_config_with_env(None, env);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    // =========================================================================
    // CLI Override Tests
    // =========================================================================

    #[test]
    fn test_cli_overrides() {
        let mut config = HuddleSettings::default();
        ConfigOverrides::new()
            .with_backend_url("http://from-cli".to_string())
            .with_request_timeout_ms(5000)
            .with_seed(99)
            .apply(&mut config);

        assert_eq!(config.backend_url, "http://from-cli");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.playback.seed, Some(99));
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_instant_override_zeroes_dwells() {
        let mut config = HuddleSettings::default();
        ConfigOverrides::new().with_instant(true).apply(&mut config);

        assert_eq!(config.playback.typing_min, Duration::ZERO);
        assert_eq!(config.playback.typing_max, Duration::ZERO);
        assert_eq!(config.playback.inter_block, Duration::ZERO);
        assert_eq!(config.playback.handoff, Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_overrides_keep_source() {
        let mut config = HuddleSettings::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_derived_configs() {
        let mut config = HuddleSettings::default();
        config.backend_url = "http://advisors/".to_string();
        config.playback.seed = Some(3);

        assert_eq!(config.backend_config().base_url, "http://advisors");
        assert_eq!(config.huddle_config().playback.seed, Some(3));
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI");
        assert_eq!(ConfigSource::Env.to_string(), "environment");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }
}
