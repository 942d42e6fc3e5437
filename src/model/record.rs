//! Log record types produced by the frame decoder.
//!
//! A `LogRecord` is immutable once decoded. Buffers wrap it in a
//! `SequencedRecord` that carries its append position.

use crate::model::Sequence;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Producer keys that have a typed slot on [`LogRecord`] or name its timestamp.
///
/// They never appear among a record's extra fields.
pub const RESERVED_FIELDS: [&str; 15] = [
    "levelname",
    "msg",
    "message",
    "time",
    "created",
    "module",
    "funcName",
    "lineno",
    "pathname",
    "process",
    "processName",
    "threadName",
    "taskName",
    "name",
    "status",
];

// ===== LogLevel =====

/// Severity of a log record.
///
/// Producers send the level as an upper-case name. Names outside the known
/// set are kept verbatim in `Other` so nothing is lost.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// `DEBUG`
    Debug,
    /// `INFO`
    Info,
    /// `WARNING`
    Warning,
    /// `ERROR`
    Error,
    /// `CRITICAL`
    Critical,
    /// `SUCCESS`
    Success,
    /// Any other level name, as sent.
    Other(String),
}

impl LogLevel {
    /// Parse a producer level name. Matching is exact (case-sensitive).
    pub fn parse(raw: &str) -> Self {
        match raw {
            "DEBUG" => Self::Debug,
            "INFO" => Self::Info,
            "WARNING" => Self::Warning,
            "ERROR" => Self::Error,
            "CRITICAL" => Self::Critical,
            "SUCCESS" => Self::Success,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire name of the level.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
            Self::Success => "SUCCESS",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== Diagnostics =====

/// Optional source-location and process context attached to a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// Module that emitted the record.
    pub module: Option<String>,
    /// Function that emitted the record.
    pub function: Option<String>,
    /// Source line number.
    pub line: Option<u32>,
    /// Full path of the source file.
    pub source_path: Option<String>,
    /// OS process id.
    pub process_id: Option<u32>,
    /// Process name.
    pub process_name: Option<String>,
    /// Thread name.
    pub thread_name: Option<String>,
    /// Async task name.
    pub task_name: Option<String>,
    /// Name of the producer-side logger.
    pub logger_name: Option<String>,
    /// Free-form status tag attached by the producer.
    pub status: Option<String>,
}

// ===== LogRecord =====

/// One decoded log event.
/// Invariant: level, message and timestamp are always present.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    level: LogLevel,
    message: String,
    timestamp: DateTime<Utc>,
    diagnostics: Diagnostics,
    extra: BTreeMap<String, rmpv::Value>,
}

impl LogRecord {
    /// Create a record with no diagnostics and no extra fields.
    ///
    /// `LogLevel::Other` holding a known name is normalised to that level.
    pub fn new(level: LogLevel, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let level = match level {
            LogLevel::Other(name) => LogLevel::parse(&name),
            known => known,
        };
        Self {
            level,
            message: message.into(),
            timestamp,
            diagnostics: Diagnostics::default(),
            extra: BTreeMap::new(),
        }
    }

    /// Attach diagnostics.
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Attach producer fields that have no typed slot.
    ///
    /// Keys listed in [`RESERVED_FIELDS`] are dropped.
    pub fn with_extra(mut self, mut extra: BTreeMap<String, rmpv::Value>) -> Self {
        extra.retain(|key, _| !RESERVED_FIELDS.contains(&key.as_str()));
        self.extra = extra;
        self
    }

    // ===== Accessors (read-only) =====

    /// Severity.
    pub fn level(&self) -> &LogLevel {
        &self.level
    }

    /// Message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Instant the producer emitted the record.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Source-location and process context.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Unknown producer fields, preserved as sent.
    pub fn extra(&self) -> &BTreeMap<String, rmpv::Value> {
        &self.extra
    }
}

// ===== SequencedRecord =====

/// A record together with its position in a buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedRecord {
    sequence: Sequence,
    record: LogRecord,
}

impl SequencedRecord {
    pub(crate) fn new(sequence: Sequence, record: LogRecord) -> Self {
        Self { sequence, record }
    }

    /// Append position.
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    /// The record.
    pub fn record(&self) -> &LogRecord {
        &self.record
    }
}

// ===== Tests =====
