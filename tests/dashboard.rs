use chrono::NaiveDateTime;
use hostwatch::collector::Collector;
use hostwatch::dashboard::{load_view, Screen, Session, TerminalScreen, View, WindowMinutes};
use hostwatch::host::test_utils::FakeHost;
use hostwatch::metrics_log::{MetricsLog, COLUMNS};
use hostwatch::{HostReadings, TIMESTAMP_FORMAT};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
}

/// Collects samples at the given wall-clock times into `log`.
fn collect_at(log: &MetricsLog, times: &[&str]) {
    let host = FakeHost::new();
    let clock = Arc::new(Mutex::new(times.iter().map(|t| ts(t)).collect::<Vec<_>>()));
    for (i, _) in times.iter().enumerate() {
        host.add_readings(HostReadings {
            cpu_percent: 10.0 * (i + 1) as f64,
            memory_percent: 50.0,
            disk_percent: 75.0,
            net_sent: 1_000 * (i as u64 + 1),
            net_recv: 2_000 * (i as u64 + 1),
            load_avg: (0.5, 0.25, 0.125),
        });
    }
    let mut collector = Collector::new(host, log.clone(), Duration::from_secs(10))
        .with_clock(move || clock.lock().unwrap().remove(0));
    for _ in times {
        collector.tick().unwrap();
    }
}

#[test]
fn test_collected_samples_render_newest_first() {
    let dir = tempdir().unwrap();
    let log = MetricsLog::new(dir.path().join("metrics_log.csv"));
    collect_at(&log, &["2024-05-01 12:00:00", "2024-05-01 12:00:10", "2024-05-01 12:00:20"]);
    let session = Session::new(WindowMinutes::new(1).unwrap(), Default::default());

    let View::Dashboard(view) = load_view(&log, &session, ts("2024-05-01 12:00:25")) else {
        panic!("expected a dashboard");
    };

    let table: Vec<f64> = view.table.iter().map(|s| s.cpu_percent).collect();
    assert_eq!(table, [30.0, 20.0, 10.0]);
    let cpu_chart: Vec<f64> = view.charts[0].series[0].points.iter().map(|(_, y)| *y).collect();
    assert_eq!(cpu_chart, [10.0, 20.0, 30.0]);
}

#[test]
fn test_empty_log_renders_no_data_message() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("metrics_log.csv");
    std::fs::write(&path, format!("{}\n", COLUMNS.join(","))).unwrap();
    let log = MetricsLog::new(&path);

    for minutes in [1, 10, 120] {
        let session = Session::new(WindowMinutes::new(minutes).unwrap(), Default::default());
        let view = load_view(&log, &session, ts("2024-05-01 12:00:00"));
        assert_eq!(view, View::NoData);

        let mut screen = TerminalScreen::new(Vec::new()).without_clear();
        screen.show(&view, &session, None).unwrap();
        let text = String::from_utf8(screen.into_inner()).unwrap();
        assert!(text.contains("no samples yet"));
        assert!(!text.contains("CPU usage"));
    }
}

#[test]
fn test_missing_log_and_stale_log_are_distinguished() {
    let dir = tempdir().unwrap();
    let log = MetricsLog::new(dir.path().join("metrics_log.csv"));
    let session = Session::new(WindowMinutes::new(30).unwrap(), Default::default());
    assert_eq!(load_view(&log, &session, ts("2024-05-01 10:00:00")), View::NoDataFile);

    collect_at(&log, &["2024-05-01 09:00:00"]);
    assert_eq!(
        load_view(&log, &session, ts("2024-05-01 10:00:00")),
        View::NoRecentData {
            window: WindowMinutes::new(30).unwrap()
        }
    );

    collect_at(&log, &["2024-05-01 10:00:00"]);
    let View::Dashboard(view) = load_view(&log, &session, ts("2024-05-01 10:00:00")) else {
        panic!("expected a dashboard");
    };
    assert_eq!(view.table.len(), 1);
    assert_eq!(view.table[0].timestamp, ts("2024-05-01 10:00:00"));
}

#[test]
fn test_corrupt_log_is_reported_not_hidden() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("metrics_log.csv");
    std::fs::write(&path, "timestamp,cpu\n2024-05-01 12:00:00,5\n").unwrap();
    let log = MetricsLog::new(&path);
    let session = Session::default();

    let view = load_view(&log, &session, ts("2024-05-01 12:00:05"));
    assert!(matches!(view, View::Corrupt(_)));

    let mut screen = TerminalScreen::new(Vec::new()).without_clear();
    screen.show(&view, &session, None).unwrap();
    let text = String::from_utf8(screen.into_inner()).unwrap();
    assert!(text.contains("ERROR: the metrics log is corrupt"));
}
