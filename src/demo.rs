//! In-process producer for `--demo`.
//!
//! [`DemoTransport`] plugs into a [`ConnectionSession`](crate::session::ConnectionSession)
//! in place of the WebSocket transport and emits properly encoded `live_log`
//! frames, so the whole decode path runs as it would against a server. It
//! also corrupts the occasional frame and closes the connection every so often
//! to exercise drop accounting and reconnect.

use crate::codec::{encode_payload, wrap_payload, FrameMeta};
use crate::model::{ClientId, Diagnostics, LogLevel, LogRecord, TransportError};
use crate::session::{ConnectTarget, Connection, Transport};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Pacing and fault injection for the demo feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoSettings {
    /// Pause before each frame.
    pub interval: Duration,
    /// Frames served before the connection is closed. `None` never closes.
    pub frames_per_connection: Option<u64>,
    /// Every n-th frame has its compressed payload truncated. `None` never corrupts.
    pub corrupt_every: Option<u64>,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(120),
            frames_per_connection: Some(250),
            corrupt_every: Some(41),
        }
    }
}

/// Transport that fabricates a log stream.
#[derive(Debug, Clone, Default)]
pub struct DemoTransport {
    settings: DemoSettings,
    produced: Arc<AtomicU64>,
}

impl DemoTransport {
    /// Demo transport with custom settings.
    pub fn new(settings: DemoSettings) -> Self {
        Self {
            settings,
            produced: Arc::default(),
        }
    }

    /// Frames produced across all connections so far.
    pub fn produced(&self) -> u64 {
        self.produced.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for DemoTransport {
    async fn connect(&self, target: &ConnectTarget) -> Result<Box<dyn Connection>, TransportError> {
        debug!(client_id = %target.client_id, "demo feed connected");
        Ok(Box::new(DemoConnection {
            settings: self.settings,
            client_id: target.client_id.clone(),
            produced: Arc::clone(&self.produced),
            served: 0,
        }))
    }
}

struct DemoConnection {
    settings: DemoSettings,
    client_id: ClientId,
    produced: Arc<AtomicU64>,
    served: u64,
}

#[async_trait]
impl Connection for DemoConnection {
    async fn next_message(&mut self) -> Result<Option<String>, TransportError> {
        if self
            .settings
            .frames_per_connection
            .is_some_and(|limit| self.served >= limit)
        {
            return Ok(None);
        }
        tokio::time::sleep(self.settings.interval).await;

        let n = self.produced.fetch_add(1, Ordering::Relaxed);
        self.served += 1;
        let corrupt = self
            .settings
            .corrupt_every
            .is_some_and(|every| every > 0 && (n + 1) % every == 0);
        demo_frame(n, &self.client_id, corrupt)
            .map(Some)
            .map_err(|e| TransportError::Receive(e.to_string()))
    }
}

/// Build frame `n` of the demo stream.
///
/// A corrupt frame keeps a valid envelope but carries a truncated zstd payload.
pub fn demo_frame(
    n: u64,
    client_id: &ClientId,
    corrupt: bool,
) -> Result<String, crate::codec::EncodeError> {
    let record = demo_record(n);
    let mut compressed = encode_payload(&record)?;
    if corrupt {
        compressed.truncate(compressed.len() / 2);
    }
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    Ok(wrap_payload(
        &compressed,
        &FrameMeta::live_log(client_id.clone(), nanos),
    ))
}

const MODULES: [(&str, &str); 4] = [
    ("ingest.worker", "process_batch"),
    ("api.handlers", "get_status"),
    ("scheduler", "tick"),
    ("storage.compactor", "run_pass"),
];

/// Deterministic record `n`: rotating level, module and message shape.
pub fn demo_record(n: u64) -> LogRecord {
    let level = match n % 11 {
        0 => LogLevel::Debug,
        3 | 7 => LogLevel::Warning,
        5 => LogLevel::Error,
        9 => LogLevel::Success,
        _ => LogLevel::Info,
    };
    let (module, function) = MODULES[(n % MODULES.len() as u64) as usize];

    let message = match n % 13 {
        4 => format!(
            "batch {n} finished with retries; slow partitions: {}",
            (0..12).map(|p| format!("p{p}")).collect::<Vec<_>>().join(", ")
        ),
        8 => format!("traceback for request {n}:\n  at {module}.{function}\n  at runtime.dispatch"),
        _ => format!("{function} handled item {n}"),
    };

    LogRecord::new(level, message, Utc::now()).with_diagnostics(Diagnostics {
        module: Some(module.to_string()),
        function: Some(function.to_string()),
        line: Some(40 + (n % 200) as u32),
        process_id: Some(std::process::id()),
        thread_name: Some("MainThread".to_string()),
        logger_name: Some("demo".to_string()),
        ..Diagnostics::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::model::DecodeErrorKind;

    fn client() -> ClientId {
        ClientId::new("demo-client").expect("valid")
    }

    #[test]
    fn demo_frames_decode() {
        let frame = demo_frame(4, &client(), false).expect("encodes");
        let record = codec::decode(&frame).expect("decodes");
        assert!(record.message().starts_with("batch 4 finished"));
        assert_eq!(record.diagnostics().module.as_deref(), Some("ingest.worker"));
    }

    #[test]
    fn corrupt_demo_frame_fails_decompression() {
        let frame = demo_frame(1, &client(), true).expect("encodes");
        let err = codec::decode(&frame).expect_err("truncated payload");
        assert_eq!(err.kind(), DecodeErrorKind::Decompression);
    }

    #[test]
    fn demo_levels_rotate() {
        assert_eq!(*demo_record(0).level(), LogLevel::Debug);
        assert_eq!(*demo_record(5).level(), LogLevel::Error);
        assert_eq!(*demo_record(1).level(), LogLevel::Info);
    }

    #[tokio::test(start_paused = true)]
    async fn connection_closes_after_limit_and_counts_frames() {
        let transport = DemoTransport::new(DemoSettings {
            interval: Duration::from_millis(10),
            frames_per_connection: Some(3),
            corrupt_every: Some(2),
        });
        let target = ConnectTarget::new("demo://", client());
        let mut connection = transport.connect(&target).await.expect("connects");

        let mut frames = Vec::new();
        while let Some(frame) = connection.next_message().await.expect("no error") {
            frames.push(frame);
        }

        assert_eq!(frames.len(), 3);
        assert_eq!(transport.produced(), 3);
        let failures = frames.iter().filter(|f| codec::decode(f).is_err()).count();
        assert_eq!(failures, 1, "only frame #2 is corrupted");
    }
}
