//! Configuration management for HostWatch
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to layer built-in defaults, a `hostwatch.toml` file, environment
//! variables and command-line arguments.

use crate::cli::Cli;
use crate::dashboard::{RefreshInterval, WindowMinutes};
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// The configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "hostwatch.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// The metrics log shared by the collector and the dashboard.
    pub metrics_log: PathBuf,
    /// Configuration for the collector process.
    pub collector: CollectorConfig,
    /// Configuration for the dashboard process.
    pub dashboard: DashboardConfig,
}

/// Configuration for the collector process.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CollectorConfig {
    /// Seconds between two samples.
    pub interval_seconds: u64,
    /// The mount point whose utilization is reported as `disk_percent`.
    pub disk_mount_point: PathBuf,
    /// The persistent diagnostic log file.
    pub diagnostic_log: PathBuf,
}

impl CollectorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

/// Configuration for the dashboard process.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DashboardConfig {
    /// The initial trailing window, in minutes.
    pub window_minutes: WindowMinutes,
    /// The initial refresh mode.
    pub refresh: RefreshInterval,
    /// Most table rows to draw; 0 draws every row in the window.
    pub table_rows: usize,
}

impl Config {
    /// Loads the application configuration.
    ///
    /// Sources are layered lowest to highest: defaults, the TOML file named by
    /// `--config` (or `hostwatch.toml`), `HOSTWATCH_` environment variables,
    /// then command-line arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // e.g. HOSTWATCH_COLLECTOR__INTERVAL_SECONDS=5
            .merge(Env::prefixed("HOSTWATCH_").split("__"))
            .merge(cli.clone())
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.collector.interval_seconds == 0 {
            bail!("collector.interval_seconds must be at least 1");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_log: PathBuf::from("metrics_log.csv"),
            collector: CollectorConfig {
                interval_seconds: 10,
                disk_mount_point: PathBuf::from("/"),
                diagnostic_log: PathBuf::from("monitoring.log"),
            },
            dashboard: DashboardConfig {
                window_minutes: WindowMinutes::default(),
                refresh: RefreshInterval::default(),
                table_rows: 0,
            },
        }
    }
}
