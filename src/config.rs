//! Configuration management for ansd
//!
//! This module defines the main `Config` struct and its sub-structs. Values
//! are layered with `figment`: built-in defaults, then the TOML file named by
//! `--config`, then `ANSD_`-prefixed environment variables, then command-line
//! overrides.

use crate::bundles::BundleInfo;
use crate::cli::Cli;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Settings of the notification service actor.
    pub service: ServiceConfig,
    /// Do-not-disturb support.
    pub dnd: DndConfig,
    /// Periodic metrics logging.
    pub metrics: MetricsConfig,
    /// Bundles installed at startup.
    #[serde(default)]
    pub bundles: Vec<BundleInfo>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Capacity of the queue between clients and the service actor.
    pub job_queue_capacity: usize,
    /// How many notifications one bundle may hold at once.
    pub max_active_per_bundle: usize,
    /// Reject system removal of notifications marked unremovable.
    pub enforce_unremovable: bool,
    /// Attach a subscriber that logs every event.
    pub log_events: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DndConfig {
    pub supported: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Log a metrics snapshot periodically.
    pub log_metrics: bool,
    /// Seconds between metrics snapshots.
    pub log_aggregation_seconds: u64,
}

impl Config {
    /// Loads the configuration by layering defaults, the file named in `cli`,
    /// the environment and the command-line overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = &cli.config {
            if !path.exists() {
                anyhow::bail!("configuration file not found: {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }
        let config: Config = figment
            // e.g. ANSD_SERVICE__MAX_ACTIVE_PER_BUNDLE=10
            .merge(Env::prefixed("ANSD_").split("__"))
            .merge(cli)
            .extract()
            .context("failed to load configuration")?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            service: ServiceConfig {
                job_queue_capacity: 1024,
                max_active_per_bundle: 1000,
                enforce_unremovable: false,
                log_events: false,
            },
            dnd: DndConfig { supported: true },
            metrics: MetricsConfig {
                log_metrics: false,
                log_aggregation_seconds: 60,
            },
            bundles: Vec::new(),
        }
    }
}
