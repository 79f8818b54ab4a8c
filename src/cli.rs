//! Command-Line Interface (CLI) argument parsing.
//!
//! These arguments are parsed at startup and merged over the configuration
//! file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// An in-process notification service driven by JSON lines on stdin.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level or filter directive (e.g. "debug", "ansd=trace").
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Maximum number of active notifications per bundle.
    #[arg(long, value_name = "COUNT")]
    pub max_active_per_bundle: Option<usize>,

    /// Reject system removal of unremovable notifications.
    #[arg(long)]
    pub enforce_unremovable: bool,

    /// Log every subscriber event.
    #[arg(long)]
    pub log_events: bool,

    /// Log a metrics snapshot periodically.
    #[arg(long)]
    pub log_metrics: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        let mut service = Dict::new();
        if let Some(max) = self.max_active_per_bundle {
            service.insert("max_active_per_bundle".into(), Value::from(max));
        }
        // Flags only ever switch a feature on; absent flags leave lower layers alone.
        if self.enforce_unremovable {
            service.insert("enforce_unremovable".into(), Value::from(true));
        }
        if self.log_events {
            service.insert("log_events".into(), Value::from(true));
        }
        if !service.is_empty() {
            dict.insert("service".into(), Value::from(service));
        }

        if self.log_metrics {
            let mut metrics = Dict::new();
            metrics.insert("log_metrics".into(), Value::from(true));
            dict.insert("metrics".into(), Value::from(metrics));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
