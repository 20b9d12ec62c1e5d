//! The sampling loop: one `MetricSample` per tick, appended to the metrics log.

use crate::core::{CollectError, HostMetrics, MetricSample};
use crate::metrics_log::{LogError, MetricsLog};
use chrono::{Local, NaiveDateTime};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

/// What happened during a single tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The sample was taken and persisted.
    Recorded(MetricSample),
    /// A reading failed; nothing was written.
    Skipped,
    /// The sample was taken but could not be written.
    Lost(MetricSample),
}

/// Samples a host on a fixed interval and appends each sample to a log.
pub struct Collector<H> {
    host: H,
    log: MetricsLog,
    interval: Duration,
    clock: Box<dyn Fn() -> NaiveDateTime + Send + Sync>,
}

impl<H: HostMetrics> Collector<H> {
    pub fn new(host: H, log: MetricsLog, interval: Duration) -> Self {
        Self {
            host,
            log,
            interval,
            clock: Box::new(|| Local::now().naive_local()),
        }
    }

    /// Overrides the wall clock used to stamp samples.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Reads the host and stamps the result with the current time.
    pub fn sample(&mut self) -> Result<MetricSample, CollectError> {
        let readings = self.host.read()?;
        Ok(MetricSample::from_readings((self.clock)(), readings))
    }

    /// Appends a sample to the metrics log.
    pub fn append(&self, sample: &MetricSample) -> Result<(), LogError> {
        self.log.append(sample)
    }

    /// Runs one sample-and-append cycle.
    ///
    /// Only a fatal `CollectError` is returned; a failed reading or a failed
    /// write is logged and reported through the outcome.
    pub fn tick(&mut self) -> Result<TickOutcome, CollectError> {
        let sample = match self.sample() {
            Ok(sample) => sample,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, "Skipping tick, sample could not be taken");
                return Ok(TickOutcome::Skipped);
            }
        };

        let outcome = match self.append(&sample) {
            Ok(()) => TickOutcome::Recorded(sample.clone()),
            Err(e) => {
                error!(error = %e, path = %self.log.path().display(), "Failed to save sample");
                TickOutcome::Lost(sample.clone())
            }
        };
        info!(
            timestamp = %sample.timestamp_text(),
            cpu_percent = sample.cpu_percent,
            memory_percent = sample.memory_percent,
            disk_percent = sample.disk_percent,
            net_sent = sample.net_sent,
            net_recv = sample.net_recv,
            load_avg_1min = sample.load_avg_1min,
            load_avg_5min = sample.load_avg_5min,
            load_avg_15min = sample.load_avg_15min,
            saved = matches!(outcome, TickOutcome::Recorded(_)),
            "Metrics sampled"
        );
        Ok(outcome)
    }

    /// Ticks until the shutdown channel fires or a fatal error occurs.
    #[instrument(skip_all)]
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<()>) -> Result<(), CollectError> {
        let warmup = self.host.warmup();
        if !warmup.is_zero() {
            debug!(?warmup, "Waiting for the metrics source to warm up");
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Collector received shutdown signal during warmup.");
                    return Ok(());
                }
                _ = time::sleep(warmup) => {}
            }
        }

        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Collector started.");

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Collector received shutdown signal.");
                    break;
                }
                _ = interval.tick() => {
                    match self.tick() {
                        Ok(outcome) => print_summary(&outcome),
                        Err(e) => {
                            error!(error = %e, "Collector cannot continue sampling");
                            return Err(e);
                        }
                    }
                }
            }
        }

        info!("Collector finished.");
        Ok(())
    }
}

fn print_summary(outcome: &TickOutcome) {
    match outcome {
        TickOutcome::Recorded(s) => println!(
            "[{}] CPU: {}% | RAM: {}%",
            s.timestamp_text(),
            s.cpu_percent,
            s.memory_percent
        ),
        TickOutcome::Lost(s) => println!(
            "[{}] CPU: {}% | RAM: {}% (not saved)",
            s.timestamp_text(),
            s.cpu_percent,
            s.memory_percent
        ),
        TickOutcome::Skipped => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HostReadings, TIMESTAMP_FORMAT};
    use crate::host::test_utils::FakeHost;
    use tempfile::tempdir;

    fn fixed_clock() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-05-01 12:00:00", TIMESTAMP_FORMAT).unwrap()
    }

    fn readings(cpu: f64) -> HostReadings {
        HostReadings {
            cpu_percent: cpu,
            memory_percent: 50.0,
            disk_percent: 60.0,
            net_sent: 10,
            net_recv: 20,
            load_avg: (1.0, 0.5, 0.25),
        }
    }

    #[test]
    fn test_tick_records_sample() {
        let dir = tempdir().unwrap();
        let log = MetricsLog::new(dir.path().join("metrics_log.csv"));
        let host = FakeHost::new();
        host.add_readings(readings(12.5));
        let mut collector =
            Collector::new(host, log.clone(), Duration::from_secs(10)).with_clock(fixed_clock);

        let sample = match collector.tick().unwrap() {
            TickOutcome::Recorded(sample) => sample,
            other => panic!("expected a recorded sample, got {other:?}"),
        };
        assert_eq!(sample.timestamp, fixed_clock());
        assert_eq!(log.load().unwrap(), vec![sample]);
    }

    #[test]
    fn test_failed_reading_skips_tick() {
        let dir = tempdir().unwrap();
        let log = MetricsLog::new(dir.path().join("metrics_log.csv"));
        let host = FakeHost::new();
        host.add_error(CollectError::Reading {
            metric: "disk_percent",
            reason: "no disk mounted at /".into(),
        });
        let mut collector = Collector::new(host, log.clone(), Duration::from_secs(10));

        assert_eq!(collector.tick().unwrap(), TickOutcome::Skipped);
        assert!(!log.path().exists());
    }

    #[test]
    fn test_failed_write_is_contained() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened for appending.
        let log = MetricsLog::new(dir.path());
        let host = FakeHost::new();
        host.add_readings(readings(1.0));
        let mut collector = Collector::new(host, log, Duration::from_secs(10));

        assert!(matches!(collector.tick().unwrap(), TickOutcome::Lost(_)));
    }

    #[test]
    fn test_unavailable_host_is_fatal() {
        let dir = tempdir().unwrap();
        let log = MetricsLog::new(dir.path().join("metrics_log.csv"));
        let host = FakeHost::new();
        host.add_error(CollectError::Unavailable("gone".into()));
        let mut collector = Collector::new(host, log, Duration::from_secs(10));

        assert!(collector.tick().unwrap_err().is_fatal());
    }
}
