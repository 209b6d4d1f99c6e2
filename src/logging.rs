use crate::kafka::TopicPartition;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// Default number of retained log lines before the oldest are dropped.
pub const DEFAULT_LOG_RETENTION: usize = 4_096;

/// Severity levels understood by the flow logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the canonical uppercase representation.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced while serializing log records.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct LogRecord<'a> {
    ts: u64,
    level: &'a str,
    partition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u64>,
    message: &'a str,
}

/// JSON-line logger with deterministic, bounded retention.
///
/// The partition flow records ignored persist failures, revoke-flush
/// failures, recovery summaries, and commit scheduling through this logger so
/// operators and tests can inspect them without an external collector.
#[derive(Debug, Clone)]
pub struct FlowLogger {
    current_level: LogLevel,
    max_lines: usize,
    lines: VecDeque<String>,
}

impl Default for FlowLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_RETENTION)
    }
}

impl FlowLogger {
    /// Creates a logger retaining at most `max_lines` entries.
    pub fn new(max_lines: usize) -> Self {
        Self {
            current_level: LogLevel::Info,
            max_lines: max_lines.max(1),
            lines: VecDeque::new(),
        }
    }

    /// Returns the active severity threshold.
    pub fn level(&self) -> LogLevel {
        self.current_level
    }

    /// Applies a dynamic level override.
    pub fn set_level(&mut self, level: LogLevel) {
        self.current_level = level;
    }

    /// Emits a JSON-line log entry. Entries below the active level are
    /// silently discarded.
    pub fn log(
        &mut self,
        ts_ms: u64,
        level: LogLevel,
        partition: &TopicPartition,
        offset: Option<u64>,
        message: &str,
    ) -> Result<(), LoggingError> {
        if level < self.current_level {
            return Ok(());
        }
        let record = LogRecord {
            ts: ts_ms,
            level: level.as_str(),
            partition: partition.to_string(),
            offset,
            message,
        };
        let line = serde_json::to_string(&record)?;
        if self.lines.len() == self.max_lines {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
        Ok(())
    }

    /// Retained lines, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}
