//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors.

pub mod error;
pub mod frame;
pub mod identifiers;
pub mod key_action;
pub mod record;

// Re-export for convenience
pub use error::{
    AppError, ConfigurationError, DecodeError, DecodeErrorKind, SchemaError, TransportError,
};
pub use frame::{CorrelationToken, FramePayload, RawFrame, WireMessage, CORRELATION_TOKEN_LEN};
pub use identifiers::{ClientId, InvalidClientId, InvalidMessageKind, MessageKind, Sequence};
pub use key_action::KeyAction;
pub use record::{Diagnostics, LogLevel, LogRecord, SequencedRecord, RESERVED_FIELDS};
