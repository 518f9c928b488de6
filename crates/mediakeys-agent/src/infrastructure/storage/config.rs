//! TOML configuration for the media key agent.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - macOS:    `~/Library/Application Support/MediaKeys/config.toml`
//! - Linux:    `~/.config/mediakeys/config.toml`
//! - Windows:  `%APPDATA%\MediaKeys\config.toml`
//!
//! The agent only reads this file.  Settings UIs that change flags at run
//! time write to `SharedFeatureFlags` instead.
//!
//! # What is TOML? (for beginners)
//!
//! TOML (Tom's Obvious Minimal Language) is a configuration file format
//! designed to be easy to read and write.  A complete file looks like:
//!
//! ```toml
//! [agent]
//! log_level = "debug"
//!
//! [features]
//! hud_replacement_enabled = true
//! fine_step_override_enabled = true
//!
//! [tap]
//! locations = ["session"]
//! startup_timeout_ms = 2000
//! decode_timeout_ms = 250
//! ```
//!
//! # Serde default values
//!
//! Every section and field has a default, so an empty file, a missing file,
//! and a file written for an older version all load.  Unknown tap location
//! names are rejected rather than silently skipped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mediakeys_core::FeatureFlags;
use serde::Deserialize;
use thiserror::Error;

use crate::application::interceptor::DEFAULT_DECODE_TIMEOUT;
use crate::application::tap_manager::{TapSettings, DEFAULT_STARTUP_TIMEOUT};
use crate::infrastructure::event_tap::TapLocation;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The TOML parsed but describes an unusable configuration.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level agent configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub agent: AgentConfig,
    /// Initial flag values; missing flags take their defaults.
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub tap: TapConfig,
}

/// General agent behaviour settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// `tracing` log level or filter directive.  `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Event tap creation settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TapConfig {
    /// Candidate locations in priority order.
    #[serde(default = "default_locations")]
    pub locations: Vec<TapLocation>,
    /// How long `start()` waits for the tap thread to report.
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,
    /// Cap on the primary-thread decode round trip per event.
    #[serde(default = "default_decode_timeout_ms")]
    pub decode_timeout_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_locations() -> Vec<TapLocation> {
    TapLocation::DEFAULT_ORDER.to_vec()
}
fn default_startup_timeout_ms() -> u64 {
    DEFAULT_STARTUP_TIMEOUT.as_millis() as u64
}
fn default_decode_timeout_ms() -> u64 {
    DEFAULT_DECODE_TIMEOUT.as_millis() as u64
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            locations: default_locations(),
            startup_timeout_ms: default_startup_timeout_ms(),
            decode_timeout_ms: default_decode_timeout_ms(),
        }
    }
}

impl TapConfig {
    pub fn settings(&self) -> TapSettings {
        TapSettings {
            locations: self.locations.clone(),
            startup_timeout: Duration::from_millis(self.startup_timeout_ms),
        }
    }

    pub fn decode_timeout(&self) -> Duration {
        Duration::from_millis(self.decode_timeout_ms)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file, returning
/// `AppConfig::default()` if the file does not exist.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning defaults if it does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::Invalid`] if it describes no tap location.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Parses and validates config text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let cfg: AppConfig = toml::from_str(content)?;
    if cfg.tap.locations.is_empty() {
        return Err(ConfigError::Invalid(
            "[tap] locations must name at least one location".to_string(),
        ));
    }
    Ok(cfg)
}

/// Resolves the platform config base directory including the `MediaKeys`
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("MediaKeys"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("mediakeys"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("MediaKeys")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
