//! Core domain types and service traits for HostWatch
//!
//! This module defines the sample record shared by the collector and the
//! dashboard, and the trait contract for the host metrics source.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// The `strftime` format of the `timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One point-in-time observation of the host, i.e. one row of the metrics log.
///
/// Field order is the column order of the log and must not change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricSample {
    /// Local wall-clock time of capture, second precision.
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    /// Cumulative bytes sent since boot.
    pub net_sent: u64,
    /// Cumulative bytes received since boot.
    pub net_recv: u64,
    pub load_avg_1min: f64,
    pub load_avg_5min: f64,
    pub load_avg_15min: f64,
}

impl MetricSample {
    /// Stamps a set of readings with a capture time, dropping sub-second precision.
    pub fn from_readings(timestamp: NaiveDateTime, readings: HostReadings) -> Self {
        Self {
            timestamp: truncate_to_second(timestamp),
            cpu_percent: readings.cpu_percent,
            memory_percent: readings.memory_percent,
            disk_percent: readings.disk_percent,
            net_sent: readings.net_sent,
            net_recv: readings.net_recv,
            load_avg_1min: readings.load_avg.0,
            load_avg_5min: readings.load_avg.1,
            load_avg_15min: readings.load_avg.2,
        }
    }

    /// The timestamp rendered the way it is stored in the log.
    pub fn timestamp_text(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

fn truncate_to_second(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// Serde adapter for the fixed `YYYY-MM-DD HH:MM:SS` timestamp encoding.
pub mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// The raw numbers a host metrics source returns for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HostReadings {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub net_sent: u64,
    pub net_recv: u64,
    /// 1, 5 and 15 minute load averages.
    pub load_avg: (f64, f64, f64),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollectError {
    /// A single reading failed; the tick is skipped.
    #[error("failed to read {metric}: {reason}")]
    Reading { metric: &'static str, reason: String },

    /// The metrics source cannot be used at all.
    #[error("host metrics unavailable: {0}")]
    Unavailable(String),
}

impl CollectError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, CollectError::Unavailable(_))
    }
}

/// A source of live host resource readings.
pub trait HostMetrics: Send {
    /// Reads the current state of the host.
    fn read(&mut self) -> Result<HostReadings, CollectError>;

    /// How long the source needs after construction before its first
    /// reading is meaningful.
    fn warmup(&self) -> Duration {
        Duration::ZERO
    }
}
