//! Turns a metrics log snapshot into what the dashboard shows.
//!
//! `render` is pure: the same snapshot, window and `now` always produce the
//! same `View`, and nothing here touches the log file.

use super::session::WindowMinutes;
use crate::core::MetricSample;
use crate::metrics_log::LogSnapshot;
use chrono::NaiveDateTime;

/// One frame of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// The metrics log does not exist yet.
    NoDataFile,
    /// The log exists but holds no rows.
    NoData,
    /// The log has rows, none of them inside the window.
    NoRecentData { window: WindowMinutes },
    /// The log could not be read or is structurally broken.
    Corrupt(String),
    Dashboard(DashboardView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub window: WindowMinutes,
    pub rendered_at: NaiveDateTime,
    /// Samples inside the window, newest first.
    pub table: Vec<MetricSample>,
    /// Charts with points oldest first.
    pub charts: Vec<Chart>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: &'static str,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: &'static str,
    pub points: Vec<(NaiveDateTime, f64)>,
}

impl Chart {
    fn single(
        title: &'static str,
        name: &'static str,
        samples: &[&MetricSample],
        value: fn(&MetricSample) -> f64,
    ) -> Self {
        Self {
            title,
            series: vec![Series::from_samples(name, samples, value)],
        }
    }
}

impl Series {
    fn from_samples(
        name: &'static str,
        samples: &[&MetricSample],
        value: fn(&MetricSample) -> f64,
    ) -> Self {
        Self {
            name,
            points: samples.iter().map(|s| (s.timestamp, value(s))).collect(),
        }
    }
}

/// Keeps the samples taken at or after `now - window`, in log order.
pub fn filter_window(
    samples: &[MetricSample],
    window: WindowMinutes,
    now: NaiveDateTime,
) -> Vec<&MetricSample> {
    let cutoff = now - window.as_duration();
    samples.iter().filter(|s| s.timestamp >= cutoff).collect()
}

/// Builds the frame for `snapshot` as seen at `now`.
pub fn render(snapshot: &LogSnapshot, window: WindowMinutes, now: NaiveDateTime) -> View {
    let samples = match snapshot {
        LogSnapshot::Missing => return View::NoDataFile,
        LogSnapshot::Present(samples) if samples.is_empty() => return View::NoData,
        LogSnapshot::Present(samples) => samples,
    };

    let mut recent = filter_window(samples, window, now);
    if recent.is_empty() {
        return View::NoRecentData { window };
    }
    // The log is appended in time order, but a clock change on the host can
    // break that; sort so the charts are chronological regardless.
    recent.sort_by_key(|s| s.timestamp);

    let charts = vec![
        Chart::single("CPU usage (%)", "cpu_percent", &recent, |s| s.cpu_percent),
        Chart::single("Memory usage (%)", "memory_percent", &recent, |s| s.memory_percent),
        Chart::single("Load average, 5 min", "load_avg_5min", &recent, |s| s.load_avg_5min),
        Chart::single("Disk usage (%)", "disk_percent", &recent, |s| s.disk_percent),
        Chart {
            title: "Network: sent / received (bytes)",
            series: vec![
                Series::from_samples("net_sent", &recent, |s| s.net_sent as f64),
                Series::from_samples("net_recv", &recent, |s| s.net_recv as f64),
            ],
        },
        Chart::single("Load average, 15 min", "load_avg_15min", &recent, |s| s.load_avg_15min),
    ];

    let table = recent.iter().rev().map(|s| (*s).clone()).collect();

    View::Dashboard(DashboardView {
        window,
        rendered_at: now,
        table,
        charts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TIMESTAMP_FORMAT;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn sample(at: &str) -> MetricSample {
        MetricSample {
            timestamp: ts(at),
            cpu_percent: 1.0,
            memory_percent: 2.0,
            disk_percent: 3.0,
            net_sent: 4,
            net_recv: 5,
            load_avg_1min: 0.1,
            load_avg_5min: 0.2,
            load_avg_15min: 0.3,
        }
    }

    fn window(minutes: u32) -> WindowMinutes {
        WindowMinutes::new(minutes).unwrap()
    }

    #[test]
    fn test_table_newest_first_charts_oldest_first() {
        let snapshot = LogSnapshot::Present(vec![
            sample("2024-05-01 12:00:00"),
            sample("2024-05-01 12:00:10"),
            sample("2024-05-01 12:00:20"),
        ]);

        let View::Dashboard(view) = render(&snapshot, window(1), ts("2024-05-01 12:00:25")) else {
            panic!("expected a dashboard");
        };

        let table: Vec<String> = view.table.iter().map(|s| s.timestamp_text()).collect();
        assert_eq!(
            table,
            ["2024-05-01 12:00:20", "2024-05-01 12:00:10", "2024-05-01 12:00:00"]
        );
        for chart in &view.charts {
            for series in &chart.series {
                let xs: Vec<NaiveDateTime> = series.points.iter().map(|(x, _)| *x).collect();
                assert_eq!(
                    xs,
                    [
                        ts("2024-05-01 12:00:00"),
                        ts("2024-05-01 12:00:10"),
                        ts("2024-05-01 12:00:20"),
                    ]
                );
            }
        }
    }

    #[test]
    fn test_window_excludes_older_rows() {
        let snapshot = LogSnapshot::Present(vec![
            sample("2024-05-01 09:00:00"),
            sample("2024-05-01 10:00:00"),
        ]);

        let View::Dashboard(view) = render(&snapshot, window(30), ts("2024-05-01 10:00:00")) else {
            panic!("expected a dashboard");
        };

        assert_eq!(view.table, vec![sample("2024-05-01 10:00:00")]);
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let samples = vec![sample("2024-05-01 09:30:00")];
        assert_eq!(filter_window(&samples, window(30), ts("2024-05-01 10:00:00")).len(), 1);
    }

    #[test]
    fn test_wider_window_never_drops_rows() {
        let samples: Vec<MetricSample> = (0..120)
            .map(|m| sample(&format!("2024-05-01 {:02}:{:02}:00", 8 + m / 60, m % 60)))
            .collect();
        let now = ts("2024-05-01 10:00:00");

        let mut previous = Vec::new();
        for minutes in WindowMinutes::MIN..=WindowMinutes::MAX {
            let current = filter_window(&samples, window(minutes), now);
            assert!(previous.iter().all(|s| current.contains(s)), "window {minutes} dropped rows");
            previous = current;
        }
    }

    #[test]
    fn test_empty_states() {
        let now = ts("2024-05-01 10:00:00");
        assert_eq!(render(&LogSnapshot::Missing, window(10), now), View::NoDataFile);
        assert_eq!(render(&LogSnapshot::Present(vec![]), window(10), now), View::NoData);
        assert_eq!(
            render(&LogSnapshot::Present(vec![sample("2024-05-01 08:00:00")]), window(10), now),
            View::NoRecentData { window: window(10) }
        );
    }

    #[test]
    fn test_network_chart_overlays_both_counters() {
        let snapshot = LogSnapshot::Present(vec![sample("2024-05-01 12:00:00")]);
        let View::Dashboard(view) = render(&snapshot, window(5), ts("2024-05-01 12:01:00")) else {
            panic!("expected a dashboard");
        };

        assert_eq!(view.charts.len(), 6);
        let net = view.charts.iter().find(|c| c.title.starts_with("Network")).unwrap();
        let names: Vec<&str> = net.series.iter().map(|s| s.name).collect();
        assert_eq!(names, ["net_sent", "net_recv"]);
        assert_eq!(net.series[1].points[0].1, 5.0);
    }
}
