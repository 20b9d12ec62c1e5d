//! HostWatch - a host resource monitor
//!
//! The collector samples CPU, memory, disk, network and load figures on a
//! fixed interval and appends them to a CSV metrics log; the dashboard reads
//! that log back and charts a trailing window of it.

pub mod cli;
pub mod collector;
pub mod config;
pub mod core;
pub mod dashboard;
pub mod host;
pub mod logging;
pub mod metrics_log;

// Re-export core types for convenience
pub use core::*;
