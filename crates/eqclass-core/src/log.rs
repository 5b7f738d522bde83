//! Structured JSONL run log.
//!
//! One JSON object per line with `timestamp`, `trace_id`, `level` and
//! `event`, plus optional case context. Trace ids are
//! `<run_id>::<seq>` in emission order.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<usize>,
    /// Case values as `x=4 y=48 z=40`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    #[must_use]
    pub fn new(level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: String::new(),
            level,
            event: event.into(),
            suite: None,
            case_id: None,
            inputs: None,
            verdict: None,
            duration_ms: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_suite(mut self, suite: impl Into<String>) -> Self {
        self.suite = Some(suite.into());
        self
    }

    #[must_use]
    pub fn with_case(mut self, case_id: usize, inputs: impl Into<String>) -> Self {
        self.case_id = Some(case_id);
        self.inputs = Some(inputs.into());
        self
    }

    #[must_use]
    pub fn with_verdict(mut self, verdict: impl Into<String>) -> Self {
        self.verdict = Some(verdict.into());
        self
    }

    #[must_use]
    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Thread-safe JSONL writer shared by the executor's workers.
pub struct LogEmitter {
    writer: Mutex<Box<dyn Write + Send>>,
    seq: AtomicU64,
    run_id: String,
    min_level: LogLevel,
}

impl LogEmitter {
    pub fn to_file(path: &Path, run_id: &str) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(std::io::BufWriter::new(file)), run_id))
    }

    pub fn to_stderr(run_id: &str) -> Self {
        Self::new(Box::new(std::io::stderr()), run_id)
    }

    /// In-memory emitter for tests; the returned buffer sees every line.
    pub fn to_buffer(run_id: &str) -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Self::new(Box::new(buffer.clone()), run_id), buffer)
    }

    fn new(writer: Box<dyn Write + Send>, run_id: &str) -> Self {
        Self {
            writer: Mutex::new(writer),
            seq: AtomicU64::new(0),
            run_id: run_id.to_string(),
            min_level: LogLevel::Info,
        }
    }

    #[must_use]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Write `entry` if its level passes the filter. Assigns the next
    /// trace id when the entry has none.
    pub fn emit_entry(&self, mut entry: LogEntry) -> std::io::Result<()> {
        if !self.enabled(entry.level) {
            return Ok(());
        }
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| std::io::Error::other("log writer poisoned"))?;
        if entry.trace_id.is_empty() {
            let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
            entry.trace_id = format!("{}::{:03}", self.run_id, seq);
        }
        let line = entry.to_jsonl().map_err(std::io::Error::other)?;
        writeln!(writer, "{line}")
    }

    pub fn flush(&self) -> std::io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| std::io::Error::other("log writer poisoned"))?;
        writer.flush()
    }
}

/// Cloneable in-memory sink.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        match self.0.lock() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        }
    }

    pub fn lines(&self) -> Vec<serde_json::Value> {
        self.contents()
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| std::io::Error::other("buffer poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn now_utc() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = duration.as_secs();
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year,
        month,
        day,
        (secs % 86_400) / 3600,
        (secs % 3600) / 60,
        secs % 60,
        duration.subsec_millis(),
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian date.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serializes_required_fields_only() {
        let entry = LogEntry::new(LogLevel::Info, "run_start");
        let parsed: serde_json::Value = serde_json::from_str(&entry.to_jsonl().unwrap()).unwrap();
        assert!(parsed["timestamp"].is_string());
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["event"], "run_start");
        assert!(parsed.get("case_id").is_none());
        assert!(parsed.get("verdict").is_none());
    }

    #[test]
    fn test_trace_ids_are_sequential() {
        let (log, buffer) = LogEmitter::to_buffer("run-1");
        log.emit_entry(LogEntry::new(LogLevel::Info, "a")).unwrap();
        log.emit_entry(LogEntry::new(LogLevel::Warn, "b")).unwrap();
        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["trace_id"], "run-1::001");
        assert_eq!(lines[1]["trace_id"], "run-1::002");
    }

    #[test]
    fn test_level_filter() {
        let (log, buffer) = LogEmitter::to_buffer("run");
        let log = log.with_min_level(LogLevel::Warn);
        log.emit_entry(LogEntry::new(LogLevel::Debug, "noise")).unwrap();
        log.emit_entry(LogEntry::new(LogLevel::Info, "noise")).unwrap();
        log.emit_entry(LogEntry::new(LogLevel::Error, "kept")).unwrap();
        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["event"], "kept");
        assert_eq!(lines[0]["trace_id"], "run::001");
    }

    #[test]
    fn test_case_context() {
        let entry = LogEntry::new(LogLevel::Warn, "case_mismatch")
            .with_case(11, "x=4 y=48 z=40")
            .with_verdict("MISMATCH")
            .with_duration_ms(3);
        let parsed: serde_json::Value = serde_json::from_str(&entry.to_jsonl().unwrap()).unwrap();
        assert_eq!(parsed["case_id"], 11);
        assert_eq!(parsed["inputs"], "x=4 y=48 z=40");
        assert_eq!(parsed["verdict"], "MISMATCH");
        assert_eq!(parsed["duration_ms"], 3);
    }

    #[test]
    fn test_civil_dates() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
        assert_eq!(civil_from_days(19_723), (2024, 1, 1));
    }

    #[test]
    fn test_level_parse_and_order() {
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
        assert!(LogLevel::Debug < LogLevel::Info);
    }
}
