//! Sync configuration: parsing, normalization, and loading.
//!
//! The TOML file describes a single instrument:
//! - the pair and bar interval,
//! - what to do with gaps found while bootstrapping the bulk history,
//! - where the bulk, recent and raw bootstrap files live,
//! - how to reach the quote API.
//!
//! Every field has a default, so an empty (or absent) file is a valid
//! configuration.
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_config_str`]
//! - Parse + normalize from a file path: [`load_config_path`]
//! - Resolve flag / env var / defaults: [`load_config`]

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use ohlc_ingestor::{
    Interval,
    models::request_params::MAX_LIMIT,
    providers::bitstamp_rest::{BitstampConfig, provider::DEFAULT_BASE_URL},
};
use serde::{Deserialize, Serialize};
use shared_utils::env::get_env_path;
use thiserror::Error;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV_VAR: &str = "SERIES_SYNC_CONFIG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {}", path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The contents are not a valid configuration document.
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What to do with gaps found while merging the bootstrap exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkGapPolicy {
    /// Keep only the history before the first gap.
    #[default]
    Truncate,
    /// Keep everything and forward-fill the gaps.
    Fill,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SyncConfig {
    /// Instrument code as the quote API spells it.
    ///
    /// Trimmed and lowercased by [`normalize_config`].
    pub pair: String,
    /// Bar width of every dataset.
    pub interval: Interval,
    /// Gap handling for `preprocess`.
    pub bulk_gap_policy: BulkGapPolicy,
    /// Dataset locations.
    pub paths: PathsCfg,
    /// Quote API settings.
    pub provider: ProviderCfg,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            pair: "btcusd".into(),
            interval: Interval::MINUTE,
            bulk_gap_policy: BulkGapPolicy::default(),
            paths: PathsCfg::default(),
            provider: ProviderCfg::default(),
        }
    }
}

/// Dataset locations.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct PathsCfg {
    /// Canonical bulk history, read-only during `update`.
    pub bulk: PathBuf,
    /// Canonical recent tail, rewritten by `update`.
    pub recent: PathBuf,
    /// Raw long-horizon export used by `preprocess`.
    pub raw_bulk: PathBuf,
    /// Raw gap-fill export used by `preprocess`.
    pub raw_gaps: PathBuf,
}

impl Default for PathsCfg {
    fn default() -> Self {
        Self {
            bulk: "data/historical/btcusd_bitstamp_1min_2012-2025.csv".into(),
            recent: "data/recent/btcusd_bitstamp_1min_latest.csv".into(),
            raw_bulk: "data/original/btcusd_1-min_data.csv".into(),
            raw_gaps: "data/original/missing_ohlc_data_all_gaps_as_of_1736148000.csv".into(),
        }
    }
}

/// Quote API settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProviderCfg {
    /// Endpoint root; the pair is appended.
    pub base_url: String,
    /// Most bars one call may return.
    pub max_limit: u32,
    /// Per-call timeout.
    pub timeout_secs: u64,
    /// Client-side pacing.
    pub requests_per_second: u32,
}

impl Default for ProviderCfg {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            max_limit: MAX_LIMIT,
            timeout_secs: 60,
            requests_per_second: 4,
        }
    }
}

impl ProviderCfg {
    /// Connection settings for the Bitstamp client.
    pub fn bitstamp(&self) -> BitstampConfig {
        BitstampConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            requests_per_second: self.requests_per_second,
        }
    }
}

/// Trims and lowercases the pair, then checks value ranges.
pub fn normalize_config(mut cfg: SyncConfig) -> Result<SyncConfig, ConfigError> {
    cfg.pair = cfg.pair.trim().to_lowercase();
    cfg.provider.base_url = cfg.provider.base_url.trim().to_string();

    if cfg.pair.is_empty() {
        return Err(ConfigError::Invalid("pair must not be empty".into()));
    }
    if !(1..=MAX_LIMIT).contains(&cfg.provider.max_limit) {
        return Err(ConfigError::Invalid(format!(
            "provider.max_limit {} outside 1..={MAX_LIMIT}",
            cfg.provider.max_limit
        )));
    }
    if cfg.provider.timeout_secs == 0 {
        return Err(ConfigError::Invalid("provider.timeout_secs must be > 0".into()));
    }
    if cfg.provider.requests_per_second == 0 {
        return Err(ConfigError::Invalid(
            "provider.requests_per_second must be > 0".into(),
        ));
    }
    Ok(cfg)
}

/// Parse and normalize a configuration from a TOML string.
pub fn load_config_str(s: &str) -> Result<SyncConfig, ConfigError> {
    normalize_config(toml::from_str(s)?)
}

/// Read, parse, and normalize a configuration file.
pub fn load_config_path(path: impl AsRef<Path>) -> Result<SyncConfig, ConfigError> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_str(&s)
}

/// The file to load: `flag`, else [`CONFIG_ENV_VAR`], else none.
pub fn resolve_config_path(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| get_env_path(CONFIG_ENV_VAR))
}

/// Loads the resolved config file, or the defaults when there is none.
pub fn load_config(flag: Option<PathBuf>) -> Result<SyncConfig, ConfigError> {
    match resolve_config_path(flag) {
        Some(path) => load_config_path(path),
        None => normalize_config(SyncConfig::default()),
    }
}
