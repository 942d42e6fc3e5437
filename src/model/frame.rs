//! Wire-level frame types.
//!
//! Every inbound event is a JSON wrapper:
//!
//! ```text
//! { "type": "<kind>", "payload": { "timestamp": <ns>, "client_id": "<id>", "message": "<base64>" } }
//! ```
//!
//! where `message` decodes to `[16-byte correlation token][zstd(msgpack map)]`.

use serde::{Deserialize, Serialize};

/// Length in bytes of the correlation token prefixing every binary frame.
pub const CORRELATION_TOKEN_LEN: usize = 16;

/// Opaque routing token prepended to each binary frame by the producer.
///
/// The token carries no log content; decoders strip it before decompression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationToken([u8; CORRELATION_TOKEN_LEN]);

impl CorrelationToken {
    /// Wrap raw token bytes.
    pub const fn from_bytes(bytes: [u8; CORRELATION_TOKEN_LEN]) -> Self {
        Self(bytes)
    }

    /// Fresh random token (the bytes of a UUID v4).
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().into_bytes())
    }

    /// Raw token bytes.
    pub fn as_bytes(&self) -> &[u8; CORRELATION_TOKEN_LEN] {
        &self.0
    }
}

/// Outer JSON wrapper of a wire message.
///
/// Only the discriminator is interpreted at this level. The payload stays
/// untyped until a decoder for the kind looks at it, so subscribers of other
/// kinds can carry payloads of any shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Message kind (`type` on the wire).
    #[serde(rename = "type")]
    pub kind: String,
    /// Kind-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WireMessage {
    /// Parse a text frame into its wrapper.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Payload of a `live_log` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePayload {
    /// Producer-side emission time, nanoseconds since the Unix epoch.
    pub timestamp: i64,
    /// Client identifier the frame was routed to.
    pub client_id: String,
    /// Base64 of `[token][zstd(msgpack)]`.
    pub message: String,
}

/// A frame after base64 decoding, with the token split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Message kind.
    pub kind: String,
    /// Correlation token (routing metadata only).
    pub correlation_token: CorrelationToken,
    /// Producer-side emission time, nanoseconds since the Unix epoch.
    pub timestamp_nanos: i64,
    /// zstd-compressed MessagePack map.
    pub compressed_payload: Vec<u8>,
}
