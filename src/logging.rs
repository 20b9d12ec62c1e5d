//! Installs the global `tracing` subscriber for each process.
//!
//! `RUST_LOG`, when set, takes precedence over the configured `log_level`.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid log level '{level}'")),
    }
}

/// Collector logging: everything at `level` is appended to the diagnostic
/// log file; warnings and errors are also echoed to stderr.
pub fn init_collector(level: &str, diagnostic_log: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(diagnostic_log)
        .with_context(|| format!("cannot open diagnostic log {}", diagnostic_log.display()))?;

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_filter(env_filter(level)?);
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;
    Ok(())
}

/// Dashboard logging goes to stderr only; stdout belongs to the screen.
pub fn init_dashboard(level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(env_filter(level)?)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}
