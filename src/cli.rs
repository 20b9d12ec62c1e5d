//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged with
//! the configuration from the `hostwatch.toml` file and environment variables.

use crate::dashboard::RefreshInterval;
use clap::{Args, Parser, Subcommand};
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::{Path, PathBuf};

/// Samples host resource usage into a CSV log and charts it in the terminal.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Path to the shared metrics log.
    #[arg(long, value_name = "FILE", global = true)]
    pub metrics_log: Option<PathBuf>,

    /// Log filter directive, e.g. `debug` or `hostwatch=trace`.
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sample host metrics on a fixed interval and append them to the log.
    Collect(CollectArgs),
    /// Show a refreshing table and charts of recent samples.
    Dashboard(DashboardArgs),
}

impl Default for Command {
    fn default() -> Self {
        Command::Collect(CollectArgs::default())
    }
}

#[derive(Args, Debug, Default, Clone)]
pub struct CollectArgs {
    /// Seconds between samples.
    #[arg(short, long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Mount point whose disk usage is reported.
    #[arg(long, value_name = "PATH")]
    pub disk: Option<PathBuf>,

    /// File receiving the collector's diagnostic log.
    #[arg(long, value_name = "FILE")]
    pub diagnostic_log: Option<PathBuf>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct DashboardArgs {
    /// Show the last N minutes (1-120).
    #[arg(short, long, value_name = "MINUTES")]
    pub window: Option<u32>,

    /// Auto-refresh interval: off, 10s, 30s, 1m or 5m.
    #[arg(short, long, value_name = "INTERVAL")]
    pub refresh: Option<RefreshInterval>,

    /// Show at most N table rows; 0 shows every row in the window.
    #[arg(long, value_name = "N")]
    pub table_rows: Option<u64>,

    /// Render a single frame and exit.
    #[arg(long)]
    pub once: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(path) = &self.metrics_log {
            dict.insert("metrics_log".into(), path_value(path));
        }
        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        match &self.command {
            Command::Collect(args) => {
                let mut collector = Dict::new();
                if let Some(interval) = args.interval {
                    collector.insert("interval_seconds".into(), Value::from(interval));
                }
                if let Some(disk) = &args.disk {
                    collector.insert("disk_mount_point".into(), path_value(disk));
                }
                if let Some(path) = &args.diagnostic_log {
                    collector.insert("diagnostic_log".into(), path_value(path));
                }
                if !collector.is_empty() {
                    dict.insert("collector".into(), Value::from(collector));
                }
            }
            Command::Dashboard(args) => {
                let mut dashboard = Dict::new();
                if let Some(window) = args.window {
                    dashboard.insert("window_minutes".into(), Value::from(window));
                }
                if let Some(refresh) = args.refresh {
                    dashboard.insert("refresh".into(), Value::from(refresh.to_string()));
                }
                if let Some(rows) = args.table_rows {
                    dashboard.insert("table_rows".into(), Value::from(rows));
                }
                if !dashboard.is_empty() {
                    dict.insert("dashboard".into(), Value::from(dashboard));
                }
            }
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}

fn path_value(path: &Path) -> Value {
    Value::from(path.to_string_lossy().into_owned())
}
