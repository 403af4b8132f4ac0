//! Configuration for hamirror services.
//!
//! TOML file + `HAMIRROR_` environment overrides layered over defaults,
//! validated and translated to `hamirror_core::EngineConfig`. Also
//! installs the tracing subscriber from the `[logging]` section.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use hamirror_core::{EngineConfig, RecordKind};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("failed to install tracing subscriber: {0}")]
    Tracing(String),

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
    pub engine: EngineSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineSection {
    /// Bounded capacity of each logical node's reconcile queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Seconds a node's reconcile worker may sit idle before it exits.
    #[serde(default = "default_worker_idle_secs")]
    pub worker_idle_secs: u64,

    /// Capacity of the store change broadcast.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Record kinds left out of mirroring, e.g. `["local_mcast_mac"]`.
    #[serde(default)]
    pub disabled_kinds: Vec<RecordKind>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            worker_idle_secs: default_worker_idle_secs(),
            event_capacity: default_event_capacity(),
            disabled_kinds: Vec::new(),
        }
    }
}

fn default_queue_capacity() -> usize {
    64
}
fn default_worker_idle_secs() -> u64 {
    60
}
fn default_event_capacity() -> usize {
    256
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".into()
}

impl Config {
    /// Check values the types alone can't rule out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.queue_capacity == 0 {
            return Err(ConfigError::Validation {
                field: "engine.queue_capacity".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.engine.worker_idle_secs == 0 {
            return Err(ConfigError::Validation {
                field: "engine.worker_idle_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.engine.event_capacity == 0 {
            return Err(ConfigError::Validation {
                field: "engine.event_capacity".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(ConfigError::Validation {
                field: "logging.level".into(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    /// Translate to the core engine configuration.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        self.validate()?;
        Ok(EngineConfig {
            queue_capacity: self.engine.queue_capacity,
            worker_idle: Duration::from_secs(self.engine.worker_idle_secs),
            event_capacity: self.engine.event_capacity,
            disabled_kinds: self.engine.disabled_kinds.clone(),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "hamirror", "hamirror").map_or_else(
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
    p.push("hamirror");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Layered sources: defaults, then the TOML file at `path`, then
/// `HAMIRROR_` variables (`HAMIRROR_ENGINE__QUEUE_CAPACITY=128`).
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HAMIRROR_").split("__"))
}

/// Load and validate the Config at the canonical path.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load and validate the Config from `path`. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    config.validate()?;
    Ok(config)
}

/// Load config, returning a default if it is missing or invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Tracing ─────────────────────────────────────────────────────────

/// Install the global fmt subscriber. `RUST_LOG` overrides `level`.
pub fn init_tracing(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let installed = if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    };
    installed.map_err(|e| ConfigError::Tracing(e.to_string()))?;

    tracing::debug!(level = %logging.level, json = logging.json, "tracing initialized");
    Ok(())
}
