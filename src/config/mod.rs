//! Configuration layer: typed settings with layered precedence (file → env).
//!
//! Hosts either build a [`RenderConfig`] directly, convert a
//! [`RawRenderConfig`] they deserialized themselves, or call [`load`] to read
//! `config/default.*`, `canopy.*`, an optional explicit file and `CANOPY__*`
//! environment variables.

use std::{num::NonZeroUsize, path::Path, str::FromStr};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "canopy";
const ENV_PREFIX: &str = "CANOPY";
pub const DEFAULT_MAX_DEPTH: usize = 100;
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
pub const DEFAULT_YIELD_THRESHOLD: usize = 100;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub render: RenderConfig,
    pub logging: LoggingSettings,
}

/// Validated renderer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Deepest element/component nesting allowed; the root is depth 1.
    pub max_depth: NonZeroUsize,
    /// Run the shallow validator on every node before classifying it.
    pub enable_validation: bool,
    /// Record [`crate::RenderMetrics`] and emit `metrics` series.
    pub enable_monitoring: bool,
    /// Buffered bytes that trigger a chunk in streaming renders.
    pub chunk_size: NonZeroUsize,
    /// Processed nodes that trigger a chunk in streaming renders.
    pub yield_threshold: NonZeroUsize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: NonZeroUsize::new(DEFAULT_MAX_DEPTH).unwrap_or(NonZeroUsize::MIN),
            enable_validation: true,
            enable_monitoring: true,
            chunk_size: NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN),
            yield_threshold: NonZeroUsize::new(DEFAULT_YIELD_THRESHOLD)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl RenderConfig {
    /// Validate raw, possibly user-supplied options.
    pub fn from_raw(raw: RawRenderConfig) -> Result<Self, ConfigError> {
        let RawRenderConfig {
            max_depth,
            enable_validation,
            enable_monitoring,
            chunk_size,
            yield_threshold,
        } = raw;

        Ok(Self {
            max_depth: positive(max_depth, DEFAULT_MAX_DEPTH, "render.max_depth")?,
            enable_validation: enable_validation.unwrap_or(true),
            enable_monitoring: enable_monitoring.unwrap_or(true),
            chunk_size: positive(chunk_size, DEFAULT_CHUNK_SIZE, "render.chunk_size")?,
            yield_threshold: positive(
                yield_threshold,
                DEFAULT_YIELD_THRESHOLD,
                "render.yield_threshold",
            )?,
        })
    }
}

impl TryFrom<RawRenderConfig> for RenderConfig {
    type Error = ConfigError;

    fn try_from(raw: RawRenderConfig) -> Result<Self, Self::Error> {
        Self::from_raw(raw)
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to build configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment).
pub fn load(config_file: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub render: RawRenderConfig,
    pub logging: RawLoggingSettings,
}

/// Unvalidated renderer options as they arrive from files, env or hosts.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawRenderConfig {
    pub max_depth: Option<i64>,
    pub enable_validation: Option<bool>,
    #[serde(alias = "enable_performance_tracking")]
    pub enable_monitoring: Option<bool>,
    pub chunk_size: Option<i64>,
    pub yield_threshold: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLoggingSettings {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl Settings {
    pub fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let RawSettings { render, logging } = raw;

        Ok(Self {
            render: RenderConfig::from_raw(render)?,
            logging: build_logging_settings(logging)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, ConfigError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            ConfigError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn positive(
    value: Option<i64>,
    default: usize,
    key: &'static str,
) -> Result<NonZeroUsize, ConfigError> {
    let Some(value) = value else {
        return NonZeroUsize::new(default)
            .ok_or_else(|| ConfigError::invalid(key, "default must be greater than zero"));
    };
    if value <= 0 {
        return Err(ConfigError::invalid(
            key,
            format!("must be a positive integer, got {value}"),
        ));
    }
    usize::try_from(value)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| ConfigError::invalid(key, "value exceeds supported range for usize"))
}
