//! The append-only metrics log shared by the collector and the dashboard.
//!
//! The log is a CSV file with one fixed header row followed by one row per
//! sample, oldest first. The collector only appends to it and the dashboard
//! only reads it; there is no locking between the two, so every append lands
//! as a single write of complete lines and the reader ignores a trailing
//! line that has not been terminated yet.

use crate::core::MetricSample;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// The column names, in order.
pub const COLUMNS: [&str; 9] = [
    "timestamp",
    "cpu_percent",
    "memory_percent",
    "disk_percent",
    "net_sent",
    "net_recv",
    "load_avg_1min",
    "load_avg_5min",
    "load_avg_15min",
];

#[derive(Error, Debug)]
pub enum LogError {
    #[error("I/O error on metrics log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("metrics log header mismatch: expected [{expected}], found [{found}]")]
    Schema { expected: String, found: String },

    #[error("malformed row at line {line}: {reason}")]
    Malformed { line: u64, reason: String },

    #[error("failed to encode sample: {0}")]
    Encode(String),
}

/// What the dashboard found when it looked at the log.
#[derive(Debug, Clone, PartialEq)]
pub enum LogSnapshot {
    /// No log file exists yet.
    Missing,
    /// The file exists; it may hold zero rows.
    Present(Vec<MetricSample>),
}

impl LogSnapshot {
    pub fn samples(&self) -> &[MetricSample] {
        match self {
            LogSnapshot::Missing => &[],
            LogSnapshot::Present(samples) => samples,
        }
    }
}

/// Handle to a metrics log file on disk.
#[derive(Debug, Clone)]
pub struct MetricsLog {
    path: PathBuf,
}

impl MetricsLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one sample, writing the header first if the file is new.
    ///
    /// The header and row are encoded into a single buffer and handed to the
    /// OS in one append, so a reader never observes a partial header. If the
    /// write fails part way, the file is cut back to its previous length so a
    /// torn row never reaches the next append.
    pub fn append(&self, sample: &MetricSample) -> Result<(), LogError> {
        let (mut file, needs_header) = self.open_for_append()?;
        let buf = encode(sample, needs_header)?;
        let original_len = file
            .metadata()
            .map_err(|source| self.io_error(source))?
            .len();

        let written = file
            .write_all(&buf)
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_data());
        if let Err(source) = written {
            if let Err(e) = file.set_len(original_len) {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to roll back partial append"
                );
            }
            return Err(self.io_error(source));
        }

        trace!(
            path = %self.path.display(),
            bytes = buf.len(),
            header = needs_header,
            "Appended sample"
        );
        Ok(())
    }

    /// Reads every sample in the log. A missing file reads as empty.
    pub fn load(&self) -> Result<Vec<MetricSample>, LogError> {
        Ok(self.snapshot()?.samples().to_vec())
    }

    /// Reads the log, keeping "no file" distinct from "no rows".
    pub fn snapshot(&self) -> Result<LogSnapshot, LogError> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LogSnapshot::Missing),
            Err(source) => return Err(self.io_error(source)),
        };
        let samples = parse(complete_lines(&contents))?;
        debug!(path = %self.path.display(), rows = samples.len(), "Loaded metrics log");
        Ok(LogSnapshot::Present(samples))
    }

    /// Opens the log for appending and reports whether a header is needed.
    ///
    /// A torn tail left by an earlier append that died mid-write is cut off
    /// first, so the new row starts on a fresh line.
    fn open_for_append(&self) -> Result<(File, bool), LogError> {
        match OpenOptions::new()
            .append(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => return Ok((file, true)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(source) => return Err(self.io_error(source)),
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        let len = self
            .truncate_torn_tail(&mut file)
            .map_err(|source| self.io_error(source))?;
        Ok((file, len == 0))
    }

    /// Drops an unterminated last line, returning the resulting file length.
    ///
    /// A file without any newline is only cleared when it is a prefix of the
    /// header; anything else is left for the reader to report.
    fn truncate_torn_tail(&self, file: &mut File) -> io::Result<u64> {
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(0);
        }

        let start = len.saturating_sub(TAIL_SCAN_BYTES);
        let mut tail = Vec::with_capacity((len - start) as usize);
        file.seek(SeekFrom::Start(start))?;
        file.read_to_end(&mut tail)?;
        if tail.last() == Some(&b'\n') {
            return Ok(len);
        }

        let keep = match tail.iter().rposition(|&b| b == b'\n') {
            Some(last) => start + last as u64 + 1,
            None if start == 0 && header_line().as_bytes().starts_with(&tail) => 0,
            None => return Ok(len),
        };
        warn!(
            path = %self.path.display(),
            dropped = len - keep,
            "Discarding torn line at the end of the metrics log"
        );
        file.set_len(keep)?;
        Ok(keep)
    }

    fn io_error(&self, source: io::Error) -> LogError {
        LogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// How far back from the end of the log a torn line is searched for.
const TAIL_SCAN_BYTES: u64 = 4096;

fn header_line() -> String {
    COLUMNS.join(",")
}

fn encode(sample: &MetricSample, with_header: bool) -> Result<Vec<u8>, LogError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(with_header)
        .from_writer(Vec::new());
    writer
        .serialize(sample)
        .map_err(|e| LogError::Encode(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| LogError::Encode(e.to_string()))
}

/// Drops a trailing unterminated data line, which belongs to a write in
/// flight. A file with no newline at all is still checked as a header
/// unless it could be the start of one.
fn complete_lines(contents: &[u8]) -> &[u8] {
    match contents.iter().rposition(|&b| b == b'\n') {
        Some(last) => &contents[..=last],
        None if header_line().as_bytes().starts_with(contents) => &[],
        None => contents,
    }
}

fn parse(data: &[u8]) -> Result<Vec<MetricSample>, LogError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(data);

    let headers = reader.headers().map_err(|e| LogError::Malformed {
        line: 1,
        reason: e.to_string(),
    })?;
    if !headers.iter().eq(COLUMNS.iter().copied()) {
        return Err(LogError::Schema {
            expected: COLUMNS.join(","),
            found: headers.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut samples = Vec::new();
    for result in reader.deserialize::<MetricSample>() {
        let sample = result.map_err(|e| LogError::Malformed {
            line: e.position().map(|p| p.line()).unwrap_or_default(),
            reason: e.to_string(),
        })?;
        samples.push(sample);
    }
    Ok(samples)
}
