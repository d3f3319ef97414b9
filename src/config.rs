use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;

use crate::trade::ValueMode;

/// Runtime configuration, loaded from a TOML file at startup.
///
/// Every knob here can also be changed at runtime: the main loop owns the
/// `Config` mutably and the scheduler/pipeline read it on each cycle, so no
/// restart is needed for a new interval, threshold, or TTL.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub feed: Feed,
    #[serde(default)]
    pub watch: Watch,
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for persisted cache blobs
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feed {
    /// How often a fetch cycle is due
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: i64,
    /// Rows requested per poll from the trades endpoint
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Watch {
    /// Minimum qualifying value for a trade to be tracked at all
    #[serde(default = "default_min_value")]
    pub min_value: Decimal,
    /// Second, higher threshold: at or above this a trade is a whale
    #[serde(default = "default_whale_value")]
    pub whale_value: Decimal,
    #[serde(default)]
    pub value_mode: ValueMode,
    /// How long an admitted trade stays in the history view
    #[serde(default = "default_retention_ttl_ms")]
    pub retention_ttl_ms: i64,
    /// How long one market-catalog fetch stays valid
    #[serde(default = "default_catalog_ttl_ms")]
    pub catalog_ttl_ms: i64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_storage_dir() -> String {
    "data".to_string()
}

fn default_poll_interval_ms() -> i64 {
    10_000
}

fn default_fetch_limit() -> u32 {
    1000
}

fn default_min_value() -> Decimal {
    Decimal::from(10_000)
}

fn default_whale_value() -> Decimal {
    Decimal::from(50_000)
}

fn default_retention_ttl_ms() -> i64 {
    60 * 60 * 1000
}

fn default_catalog_ttl_ms() -> i64 {
    10 * 60 * 1000
}

impl Default for General {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            storage_dir: default_storage_dir(),
        }
    }
}

impl Default for Feed {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

impl Default for Watch {
    fn default() -> Self {
        Self {
            min_value: default_min_value(),
            whale_value: default_whale_value(),
            value_mode: ValueMode::default(),
            retention_ttl_ms: default_retention_ttl_ms(),
            catalog_ttl_ms: default_catalog_ttl_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: General::default(),
            feed: Feed::default(),
            watch: Watch::default(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }
}
