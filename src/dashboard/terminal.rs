//! Draws dashboard frames as plain text: a table and ASCII line charts.

use super::session::Session;
use super::view::{Chart, DashboardView, View};
use crate::core::MetricSample;
use crate::metrics_log::COLUMNS;
use itertools::{Itertools, MinMaxResult};
use std::io::{self, Write};

/// Moves the cursor home and clears the screen, so each frame replaces the last.
const CLEAR: &str = "\x1b[H\x1b[2J";
const GLYPHS: [char; 2] = ['*', '+'];
const OVERLAP: char = '#';

/// A sink that presents dashboard frames to the operator.
pub trait Screen {
    /// Replaces whatever is on screen with `view`, followed by the session
    /// controls and an optional status message.
    fn show(&mut self, view: &View, session: &Session, status: Option<&str>) -> io::Result<()>;
}

/// Renders frames to any `Write`, typically stdout.
pub struct TerminalScreen<W> {
    out: W,
    clear: bool,
    max_rows: Option<usize>,
    chart_width: usize,
    chart_height: usize,
}

impl<W: Write> TerminalScreen<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            clear: true,
            max_rows: None,
            chart_width: 60,
            chart_height: 8,
        }
    }

    /// Disables the clear-screen sequence, e.g. when output is not a terminal.
    pub fn without_clear(mut self) -> Self {
        self.clear = false;
        self
    }

    /// Caps the table at `rows` rows, newest first; 0 removes the cap.
    pub fn with_max_rows(mut self, rows: usize) -> Self {
        self.max_rows = (rows > 0).then_some(rows);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn frame(&self, view: &View, session: &Session, status: Option<&str>) -> String {
        let mut frame = String::new();
        if self.clear {
            frame.push_str(CLEAR);
        }
        frame.push_str("HostWatch: system monitor\n\n");

        match view {
            View::NoDataFile => {
                frame.push_str("No data available. Start the collector with `hostwatch collect`.\n")
            }
            View::NoData => frame.push_str("The metrics log has no samples yet.\n"),
            View::NoRecentData { window } => {
                frame.push_str(&format!("No data for the last {window} minutes.\n"))
            }
            View::Corrupt(reason) => {
                frame.push_str(&format!("ERROR: the metrics log is corrupt: {reason}\n"))
            }
            View::Dashboard(dashboard) => self.dashboard(&mut frame, dashboard),
        }

        frame.push('\n');
        frame.push_str(&format!(
            "Window: {} min | Auto-refresh: {}\n",
            session.window, session.refresh
        ));
        frame.push_str("Commands: [Enter]/r refresh | a off|10s|30s|1m|5m | w 1-120 | q quit\n");
        if let Some(status) = status {
            frame.push_str(status);
            frame.push('\n');
        }
        frame
    }

    fn dashboard(&self, frame: &mut String, view: &DashboardView) {
        frame.push_str(&format!(
            "Raw metrics for the last {} minutes\n\n",
            view.window
        ));
        frame.push_str(&table(&view.table, self.max_rows));
        frame.push('\n');
        for chart in &view.charts {
            frame.push_str(&plot(chart, self.chart_width, self.chart_height));
            frame.push('\n');
        }
        frame.push_str(&format!(
            "Last updated: {}\n",
            view.rendered_at.format("%H:%M:%S")
        ));
    }
}

impl<W: Write> Screen for TerminalScreen<W> {
    fn show(&mut self, view: &View, session: &Session, status: Option<&str>) -> io::Result<()> {
        let frame = self.frame(view, session, status);
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()
    }
}

fn row_cells(s: &MetricSample) -> [String; 9] {
    [
        s.timestamp_text(),
        format!("{:.1}", s.cpu_percent),
        format!("{:.1}", s.memory_percent),
        format!("{:.1}", s.disk_percent),
        s.net_sent.to_string(),
        s.net_recv.to_string(),
        format!("{:.2}", s.load_avg_1min),
        format!("{:.2}", s.load_avg_5min),
        format!("{:.2}", s.load_avg_15min),
    ]
}

fn table(rows: &[MetricSample], max_rows: Option<usize>) -> String {
    let max_rows = max_rows.unwrap_or(rows.len());
    let cells: Vec<[String; 9]> = rows.iter().take(max_rows).map(row_cells).collect();
    let widths: Vec<usize> = COLUMNS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let mut out = String::new();
    out.push_str(&COLUMNS.iter().zip(&widths).map(|(c, &w)| format!("{c:>w$}")).join("  "));
    out.push('\n');
    for row in &cells {
        out.push_str(&row.iter().zip(&widths).map(|(c, &w)| format!("{c:>w$}")).join("  "));
        out.push('\n');
    }
    if rows.len() > max_rows {
        out.push_str(&format!("... {} older rows not shown\n", rows.len() - max_rows));
    }
    out
}

/// Short human form of a chart value, e.g. `1.5M`.
fn compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}G", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e4 {
        format!("{:.1}k", value / 1e3)
    } else {
        format!("{value:.1}")
    }
}

/// Draws every series of `chart` on one grid, x by time and y by value.
fn plot(chart: &Chart, width: usize, height: usize) -> String {
    let mut out = format!("{}\n", chart.title);

    let points = chart.series.iter().flat_map(|s| s.points.iter());
    let (min, max) = match points.clone().map(|(_, y)| *y).minmax_by(f64::total_cmp) {
        MinMaxResult::NoElements => {
            out.push_str("  (no points)\n");
            return out;
        }
        MinMaxResult::OneElement(y) => (y - 1.0, y + 1.0),
        MinMaxResult::MinMax(lo, hi) if lo == hi => (lo - 1.0, hi + 1.0),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };
    let first = points.clone().map(|(x, _)| *x).min();
    let last = points.map(|(x, _)| *x).max();
    let (Some(first), Some(last)) = (first, last) else {
        return out;
    };
    let span = (last - first).num_seconds().max(1) as f64;

    let mut grid = vec![vec![' '; width]; height];
    for (idx, series) in chart.series.iter().enumerate() {
        let glyph = GLYPHS[idx % GLYPHS.len()];
        for (x, y) in &series.points {
            let offset = (*x - first).num_seconds() as f64;
            let col = (offset / span * (width - 1) as f64).round() as usize;
            let level = ((y - min) / (max - min) * (height - 1) as f64).round() as usize;
            let cell = &mut grid[height - 1 - level.min(height - 1)][col.min(width - 1)];
            *cell = if *cell == ' ' || *cell == glyph { glyph } else { OVERLAP };
        }
    }

    for (i, line) in grid.iter().enumerate() {
        let label = match i {
            0 => compact(max),
            i if i == height - 1 => compact(min),
            _ => String::new(),
        };
        out.push_str(&format!("{label:>8} |{}\n", line.iter().collect::<String>()));
    }
    out.push_str(&format!("{:>8} +{}\n", "", "-".repeat(width)));
    let start = first.format("%H:%M:%S").to_string();
    let end = last.format("%H:%M:%S").to_string();
    let gap = width.saturating_sub(start.len() + end.len());
    out.push_str(&format!("{:>8}  {start}{}{end}\n", "", " ".repeat(gap)));

    if chart.series.len() > 1 {
        let legend = chart
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{} {}", GLYPHS[i % GLYPHS.len()], s.name))
            .join("  ");
        out.push_str(&format!("{:>8}  {legend}\n", ""));
    }
    out
}
