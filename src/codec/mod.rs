//! Frame decoding: one raw transport frame → one typed log record.
//!
//! Decoding runs in fixed stages, each with its own failure variant:
//!
//! 1. JSON wrapper (`type` + `payload`) → [`DecodeError::Envelope`]
//! 2. base64 of `payload.message` → [`DecodeError::Encoding`]
//! 3. strip the 16-byte correlation token → [`DecodeError::Envelope`] if too short
//! 4. zstd decompression → [`DecodeError::Decompression`]
//! 5. MessagePack map → record → [`DecodeError::Schema`]
//!
//! Every function here is pure. A failure at any stage drops only that frame.

mod encode;
pub mod record;

pub use encode::{encode_frame, encode_payload, wrap_payload, EncodeError, FrameMeta};

use crate::model::{
    CorrelationToken, DecodeError, FramePayload, LogRecord, RawFrame, WireMessage,
    CORRELATION_TOKEN_LEN,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

/// Decode a text frame as received from the transport.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use livelog::codec::{self, FrameMeta};
/// use livelog::model::{ClientId, LogLevel, LogRecord};
///
/// let record = LogRecord::new(LogLevel::Info, "step 10", Utc::now());
/// let meta = FrameMeta::live_log(ClientId::random(), 0);
/// let frame = codec::encode_frame(&record, &meta).unwrap();
///
/// assert_eq!(codec::decode(&frame).unwrap(), record);
/// ```
pub fn decode(raw: &str) -> Result<LogRecord, DecodeError> {
    let message = WireMessage::parse(raw).map_err(|e| DecodeError::Envelope(e.to_string()))?;
    decode_message(&message)
}

/// Decode a frame whose JSON wrapper was already parsed (e.g. for dispatch).
pub fn decode_message(message: &WireMessage) -> Result<LogRecord, DecodeError> {
    let frame = unwrap_frame(message)?;
    decode_frame(&frame)
}

/// Stages 1-3: read the payload object, base64-decode it and split off the token.
pub fn unwrap_frame(message: &WireMessage) -> Result<RawFrame, DecodeError> {
    let payload = FramePayload::deserialize(&message.payload)
        .map_err(|e| DecodeError::Envelope(format!("invalid payload: {e}")))?;

    let bytes = STANDARD
        .decode(payload.message.as_bytes())
        .map_err(DecodeError::Encoding)?;

    if bytes.len() < CORRELATION_TOKEN_LEN {
        return Err(DecodeError::Envelope(format!(
            "frame is {} bytes, shorter than the {CORRELATION_TOKEN_LEN}-byte correlation token",
            bytes.len()
        )));
    }
    let (token, rest) = bytes.split_at(CORRELATION_TOKEN_LEN);
    let token: [u8; CORRELATION_TOKEN_LEN] = token
        .try_into()
        .map_err(|_| DecodeError::Envelope("correlation token has wrong length".into()))?;

    Ok(RawFrame {
        kind: message.kind.clone(),
        correlation_token: CorrelationToken::from_bytes(token),
        timestamp_nanos: payload.timestamp,
        compressed_payload: rest.to_vec(),
    })
}

/// Stages 4-5: decompress and map the MessagePack payload onto a record.
pub fn decode_frame(frame: &RawFrame) -> Result<LogRecord, DecodeError> {
    let packed = zstd::stream::decode_all(frame.compressed_payload.as_slice())
        .map_err(DecodeError::Decompression)?;
    Ok(record::from_msgpack(&packed)?)
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
