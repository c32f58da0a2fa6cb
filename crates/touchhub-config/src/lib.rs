//! Configuration for touchhub.
//!
//! A TOML file in the platform config directory, overridden by
//! `TOUCHHUB_`-prefixed environment variables, translated into a
//! [`touchhub_core::RemoteBinding`]. Also installs the tracing subscriber.
//!
//! ```toml
//! [remote]
//! hub = "Huiskamer"
//! primary_activity = "TV kijken"
//! secondary_activity = "Radio"
//!
//! [commands.north]
//! device = "pvr"
//! action = "channelUp"
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Nested keys are reached from the environment with a double underscore,
//! e.g. `TOUCHHUB_REMOTE__HUB=Keuken`.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use touchhub_core::{CommandHint, RemoteBinding};

const ENV_PREFIX: &str = "TOUCHHUB_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteSection,

    /// Command sent by a short press on each button.
    #[serde(default)]
    pub commands: CommandsSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which hub the remote drives and which activities its holds start.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteSection {
    /// Friendly name, host name or IP of the hub.
    pub hub: String,
    pub primary_activity: String,
    pub secondary_activity: String,
}

impl Default for RemoteSection {
    fn default() -> Self {
        let binding = RemoteBinding::default();
        Self {
            hub: binding.hub,
            primary_activity: binding.primary_activity,
            secondary_activity: binding.secondary_activity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CommandsSection {
    pub north: CommandHint,
    pub east: CommandHint,
    pub south: CommandHint,
    pub west: CommandHint,
}

impl Default for CommandsSection {
    fn default() -> Self {
        let binding = RemoteBinding::default();
        Self {
            north: binding.north,
            east: binding.east,
            south: binding.south,
            west: binding.west,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"touchhub_core=debug"`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    pub ansi: bool,
    /// Include the event target (module path) in each line.
    pub target: bool,
    /// Emit newline-delimited JSON instead of text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            ansi: true,
            target: false,
            json: false,
        }
    }
}

impl Config {
    /// Reject configurations the remote cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_empty("remote.hub", &self.remote.hub)?;
        non_empty("remote.primary_activity", &self.remote.primary_activity)?;
        non_empty("remote.secondary_activity", &self.remote.secondary_activity)?;

        if self.remote.primary_activity.trim().to_lowercase()
            == self.remote.secondary_activity.trim().to_lowercase()
        {
            return Err(ConfigError::Validation {
                field: "remote.secondary_activity".into(),
                reason: "must differ from remote.primary_activity".into(),
            });
        }

        let commands = &self.commands;
        for (direction, hint) in [
            ("north", &commands.north),
            ("east", &commands.east),
            ("south", &commands.south),
            ("west", &commands.west),
        ] {
            non_empty(&format!("commands.{direction}.device"), &hint.device)?;
            non_empty(&format!("commands.{direction}.action"), &hint.action)?;
        }

        EnvFilter::try_new(&self.logging.level).map_err(|e| ConfigError::Validation {
            field: "logging.level".into(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// The runtime binding described by this config.
    pub fn to_binding(&self) -> RemoteBinding {
        RemoteBinding {
            hub: self.remote.hub.clone(),
            primary_activity: self.remote.primary_activity.clone(),
            secondary_activity: self.remote.secondary_activity.clone(),
            north: self.commands.north.clone(),
            east: self.commands.east.clone(),
            south: self.commands.south.clone(),
            west: self.commands.west.clone(),
        }
    }
}

fn non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "touchhub", "touchhub").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("touchhub");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load and validate the config from the default path and environment.
/// A missing file means defaults.
pub fn load_config() -> Result<Config, ConfigError> {
    extract(&config_path())
}

/// Load and validate the config from an explicit file, which must exist.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    extract(path)
}

fn extract(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`, creating parent
/// directories as needed.
pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Logging ─────────────────────────────────────────────────────────

/// Install the global tracing subscriber. Fails if one is already set.
pub fn init_tracing(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(logging.target)
        .with_ansi(logging.ansi);

    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| ConfigError::Logging(e.to_string()))
}
