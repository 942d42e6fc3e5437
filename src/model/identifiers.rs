//! Identifier newtypes with smart constructors.
//!
//! String identifiers validate non-empty input at construction time.
//! Raw constructors are never exported - use smart constructors only.

use std::fmt;

/// Identifier the server uses to route a stream to one consumer.
///
/// Sent as the `clientId` query parameter when the connection opens and
/// echoed back in every frame's `client_id` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    /// Smart constructor: validates non-empty client ID
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidClientId> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidClientId::Empty);
        }
        Ok(Self(raw))
    }

    /// Fresh random identifier (UUID v4, hyphenated).
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message kind, the `type` discriminator of a wire message.
///
/// Subscribers register against a kind; only frames whose discriminator
/// matches exactly are delivered to them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageKind(String);

impl MessageKind {
    /// Kind carrying live log records.
    pub const LIVE_LOG: &'static str = "live_log";

    /// Smart constructor: validates non-empty kind
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidMessageKind> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidMessageKind::Empty);
        }
        Ok(Self(raw))
    }

    /// The `live_log` kind.
    pub fn live_log() -> Self {
        Self(Self::LIVE_LOG.to_string())
    }

    /// Borrow the kind as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position of a record in the order it was appended to a buffer.
///
/// Sequences start at zero and increase by exactly one per append. They are
/// never reused, not even after the buffer is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Sequence(u64);

impl Sequence {
    /// Wrap a raw sequence number.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw sequence number.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The sequence directly after this one.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ===== Error Types =====

/// Rejected client identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidClientId {
    /// The identifier was the empty string.
    #[error("Client ID cannot be empty")]
    Empty,
}

/// Rejected message kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMessageKind {
    /// The kind was the empty string.
    #[error("Message kind cannot be empty")]
    Empty,
}

// ===== Tests =====
