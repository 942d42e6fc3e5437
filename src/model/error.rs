//! Error types for livelog.
//!
//! This module defines the error taxonomy using `thiserror`. Errors compose via `?` and
//! `From` conversions.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level binary error wrapping startup and terminal failures
//!   - [`ConfigError`](crate::config::ConfigError) - Config file read/parse failures
//!   - [`LoggingError`](crate::logging::LoggingError) - Tracing subscriber setup failures
//!   - [`ConfigurationError`] - Invalid engine or buffer parameters
//!   - `std::io::Error` - Terminal and runtime failures
//! - [`DecodeError`] - One frame could not be turned into a record (non-fatal)
//!   - [`SchemaError`] - The decompressed map did not describe a record
//! - [`TransportError`] - The connection failed or dropped (triggers reconnect)
//!
//! # Error Recovery Strategy
//!
//! Decode errors are **non-fatal**: the frame is dropped, the failure is counted and
//! logged, and the stream continues with the next frame. No partial record is ever
//! appended. Transport errors are never surfaced as fatal either; the session moves to
//! `Disconnected` and reconnects after the policy delay.

use crate::config::ConfigError;
use crate::logging::LoggingError;
use std::fmt;
use thiserror::Error;

/// Top-level application error encompassing all fatal failure modes.
///
/// # Examples
///
/// ```no_run
/// use livelog::model::error::{AppError, ConfigurationError};
///
/// fn run_app() -> Result<(), AppError> {
///     // ConfigurationError converts to AppError via From
///     check_settings()?;
///     Ok(())
/// }
/// # fn check_settings() -> Result<(), ConfigurationError> { Ok(()) }
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to load the configuration file.
    #[error("Configuration file error: {0}")]
    Config(#[from] ConfigError),

    /// Failed to initialize file logging.
    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    /// Engine or buffer parameters were rejected.
    #[error("Invalid settings: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The viewer failed while running.
    #[error("Viewer error: {0}")]
    Viewer(#[from] crate::view::TuiError),

    /// Terminal or runtime I/O error.
    ///
    /// Failures in the crossterm/ratatui layer or while starting the async runtime.
    /// Without a working terminal the viewer cannot function.
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Invalid parameters for the virtualization engine or the log buffer.
///
/// Returned to the caller at construction time (or when a measured height is reported),
/// never swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A row height of zero was supplied as estimate or measurement.
    ///
    /// Zero-height rows would make the prefix-sum search ambiguous: several rows would
    /// share one offset and none of them could ever be reported as visible.
    ///
    /// # Examples
    ///
    /// ```
    /// use livelog::model::error::ConfigurationError;
    ///
    /// let err = ConfigurationError::ZeroRowHeight;
    /// assert!(err.to_string().contains("row height"));
    /// ```
    #[error("row height must be at least 1")]
    ZeroRowHeight,

    /// A bounded buffer was requested with capacity zero.
    #[error("buffer capacity must be at least 1")]
    ZeroCapacity,
}

/// Failure to decode one transport frame into a log record.
///
/// Each variant names the pipeline stage that rejected the frame:
///
/// 1. `Envelope` - outer JSON wrapper or frame framing
/// 2. `Encoding` - base64 transport encoding
/// 3. `Decompression` - zstd payload
/// 4. `Schema` - MessagePack map contents
///
/// # Examples
///
/// ```
/// use livelog::codec;
/// use livelog::model::error::{DecodeError, DecodeErrorKind};
///
/// let err = codec::decode("not json").unwrap_err();
/// assert_eq!(err.kind(), DecodeErrorKind::Envelope);
/// ```
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The JSON wrapper was malformed, or the binary frame was shorter than its token.
    #[error("malformed envelope: {0}")]
    Envelope(String),

    /// `payload.message` was not valid standard base64.
    #[error("invalid base64 payload: {0}")]
    Encoding(#[source] base64::DecodeError),

    /// The payload after the token was not a valid zstd stream.
    #[error("payload decompression failed: {0}")]
    Decompression(#[source] std::io::Error),

    /// The decompressed payload did not describe a log record.
    #[error("record schema mismatch: {0}")]
    Schema(#[from] SchemaError),
}

impl DecodeError {
    /// Stage that rejected the frame.
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            Self::Envelope(_) => DecodeErrorKind::Envelope,
            Self::Encoding(_) => DecodeErrorKind::Encoding,
            Self::Decompression(_) => DecodeErrorKind::Decompression,
            Self::Schema(_) => DecodeErrorKind::Schema,
        }
    }
}

/// Fieldless mirror of [`DecodeError`] for counting and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    /// See [`DecodeError::Envelope`].
    Envelope,
    /// See [`DecodeError::Encoding`].
    Encoding,
    /// See [`DecodeError::Decompression`].
    Decompression,
    /// See [`DecodeError::Schema`].
    Schema,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Envelope => "envelope",
            Self::Encoding => "encoding",
            Self::Decompression => "decompression",
            Self::Schema => "schema",
        };
        f.write_str(name)
    }
}

/// Ways a decompressed MessagePack value can fail to describe a log record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The payload was not valid MessagePack.
    #[error("invalid msgpack: {0}")]
    Msgpack(String),

    /// Bytes remained after the first MessagePack value.
    #[error("trailing bytes after msgpack value")]
    TrailingBytes,

    /// The top-level value was not a map.
    #[error("expected a map, found {found}")]
    NotAMap {
        /// Short name of the value type found instead.
        found: &'static str,
    },

    /// A map key was not a UTF-8 string.
    #[error("map key is not a string")]
    NonStringKey,

    /// A required field was absent (or nil).
    #[error("missing required field '{field}'")]
    MissingField {
        /// Producer-side key name.
        field: &'static str,
    },

    /// A field had a value of the wrong type.
    #[error("field '{field}' should be {expected}")]
    InvalidField {
        /// Producer-side key name.
        field: &'static str,
        /// Description of the accepted types.
        expected: &'static str,
    },

    /// The timestamp field could not be parsed.
    #[error("invalid timestamp '{raw}'")]
    InvalidTimestamp {
        /// The value as received.
        raw: String,
    },
}

/// Failure of the underlying connection.
///
/// Transport errors never end a session. They are logged at warn level and the session
/// reconnects after its policy delay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect {
        /// URL that was dialed.
        endpoint: String,
        /// Transport-specific failure description.
        reason: String,
    },

    /// An established connection failed while reading.
    #[error("receive failed: {0}")]
    Receive(String),

    /// The peer closed the connection.
    #[error("connection closed by peer")]
    Closed,
}
