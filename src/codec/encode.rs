//! Producer-side frame encoding.
//!
//! The exact inverse of [`decode`](super::decode). Used by the demo feed, the
//! benchmarks and tests so the wire format is defined in one place.

use super::record;
use crate::model::{ClientId, CorrelationToken, LogRecord, MessageKind};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Failure while building a frame.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// MessagePack serialization failed.
    #[error("msgpack encoding failed: {0}")]
    Msgpack(String),

    /// zstd compression failed.
    #[error("compression failed: {0}")]
    Compression(#[source] std::io::Error),
}

/// Routing metadata wrapped around an encoded record.
#[derive(Debug, Clone)]
pub struct FrameMeta {
    /// Message kind (`type`).
    pub kind: MessageKind,
    /// Destination client.
    pub client_id: ClientId,
    /// Token prepended to the compressed payload.
    pub token: CorrelationToken,
    /// Emission time in nanoseconds since the Unix epoch.
    pub timestamp_nanos: i64,
}

impl FrameMeta {
    /// `live_log` metadata for a client with a fresh random token.
    pub fn live_log(client_id: ClientId, timestamp_nanos: i64) -> Self {
        Self {
            kind: MessageKind::live_log(),
            client_id,
            token: CorrelationToken::random(),
            timestamp_nanos,
        }
    }
}

/// Serialize and compress a record: `zstd(msgpack map)`.
pub fn encode_payload(record: &LogRecord) -> Result<Vec<u8>, EncodeError> {
    let mut packed = Vec::new();
    rmpv::encode::write_value(&mut packed, &record::to_value(record))
        .map_err(|e| EncodeError::Msgpack(e.to_string()))?;
    zstd::stream::encode_all(packed.as_slice(), 0).map_err(EncodeError::Compression)
}

/// Wrap an already-compressed payload into the JSON text frame.
///
/// The payload is taken as-is, which lets tests build frames whose envelope is
/// valid while the content is not.
pub fn wrap_payload(compressed: &[u8], meta: &FrameMeta) -> String {
    let mut binary = Vec::with_capacity(meta.token.as_bytes().len() + compressed.len());
    binary.extend_from_slice(meta.token.as_bytes());
    binary.extend_from_slice(compressed);

    serde_json::json!({
        "type": meta.kind.as_str(),
        "payload": {
            "timestamp": meta.timestamp_nanos,
            "client_id": meta.client_id.as_str(),
            "message": STANDARD.encode(&binary),
        }
    })
    .to_string()
}

/// Encode a record into a complete text frame.
pub fn encode_frame(record: &LogRecord, meta: &FrameMeta) -> Result<String, EncodeError> {
    let compressed = encode_payload(record)?;
    Ok(wrap_payload(&compressed, meta))
}
