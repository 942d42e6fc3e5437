//! Off-thread decoding with in-order completion.
//!
//! Decompression and deserialization run on tokio's blocking pool. Results are
//! collected in a single `FuturesOrdered` queue, so they come back in the order
//! frames were submitted no matter which decode finishes first.

use super::LivePipeline;
use crate::codec;
use crate::model::{DecodeError, LogRecord, WireMessage};
use futures::stream::{FuturesOrdered, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Outcome of decoding one frame.
pub type Decoded = Result<LogRecord, DecodeError>;

/// Ordered completion queue for offloaded decodes.
///
/// Must be used from within a tokio runtime.
#[derive(Default)]
pub struct OrderedDecoder {
    pending: FuturesOrdered<JoinHandle<Decoded>>,
}

impl OrderedDecoder {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw text frame for decoding.
    pub fn submit(&mut self, raw: String) {
        self.pending
            .push_back(tokio::task::spawn_blocking(move || codec::decode(&raw)));
    }

    /// Queue an already-parsed message for decoding.
    pub fn submit_message(&mut self, message: WireMessage) {
        self.pending
            .push_back(tokio::task::spawn_blocking(move || {
                codec::decode_message(&message)
            }));
    }

    /// Number of submitted frames not yet returned by [`next`](Self::next).
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Next result in submission order; `None` when nothing is pending.
    ///
    /// A decode that panicked re-raises its panic here.
    pub async fn next(&mut self) -> Option<Decoded> {
        while let Some(joined) = self.pending.next().await {
            match joined {
                Ok(decoded) => return Some(decoded),
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                // Cancelled only while the runtime shuts down.
                Err(_) => continue,
            }
        }
        None
    }

    /// Await every pending decode and apply it to `pipeline`, in order.
    ///
    /// Returns the number of frames applied (appended or dropped).
    pub async fn flush_into(&mut self, pipeline: &mut LivePipeline) -> usize {
        let mut applied = 0;
        while let Some(decoded) = self.next().await {
            pipeline.ingest_decoded(decoded);
            applied += 1;
        }
        applied
    }
}

/// Decode messages from `inbound` off-thread and forward results to `outbound`
/// in arrival order.
///
/// Runs until `cancel` fires, `inbound` closes (after draining what was
/// submitted), or `outbound` is dropped.
pub fn spawn_ordered_decoding(
    mut inbound: mpsc::UnboundedReceiver<WireMessage>,
    outbound: mpsc::UnboundedSender<Decoded>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut decoder = OrderedDecoder::new();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(decoded) = decoder.next(), if decoder.pending() > 0 => {
                    if outbound.send(decoded).is_err() {
                        break;
                    }
                }
                message = inbound.recv() => match message {
                    Some(message) => decoder.submit_message(message),
                    None => {
                        while let Some(decoded) = decoder.next().await {
                            if outbound.send(decoded).is_err() {
                                break;
                            }
                        }
                        break;
                    }
                },
            }
        }
        debug!("decode forwarder stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_frame, wrap_payload, FrameMeta};
    use crate::model::{ClientId, DecodeErrorKind, LogLevel};
    use crate::pipeline::PipelineSettings;
    use chrono::{TimeZone, Utc};

    fn frame(n: usize) -> String {
        let record = LogRecord::new(
            LogLevel::Info,
            format!("record {n}"),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        );
        let meta = FrameMeta::live_log(ClientId::new("c").expect("valid"), n as i64);
        encode_frame(&record, &meta).expect("encode")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn results_come_back_in_submission_order() {
        let mut decoder = OrderedDecoder::new();
        for n in 0..64 {
            decoder.submit(frame(n));
        }
        assert_eq!(decoder.pending(), 64);

        for n in 0..64 {
            let record = decoder.next().await.expect("pending").expect("decodes");
            assert_eq!(record.message(), format!("record {n}"));
        }
        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn flush_into_applies_failures_in_place() {
        let mut decoder = OrderedDecoder::new();
        let mut pipeline = LivePipeline::new(PipelineSettings::default()).expect("valid");
        let meta = FrameMeta::live_log(ClientId::new("c").expect("valid"), 0);

        decoder.submit(frame(0));
        decoder.submit(wrap_payload(b"garbage", &meta));
        decoder.submit(frame(2));

        assert_eq!(decoder.flush_into(&mut pipeline).await, 3);
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.stats().decompression_errors, 1);
        let messages: Vec<_> = pipeline
            .buffer()
            .iter()
            .map(|e| e.record().message().to_string())
            .collect();
        assert_eq!(messages, ["record 0", "record 2"]);
    }

    #[tokio::test]
    async fn forwarder_preserves_order_and_drains_on_close() {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let handle = spawn_ordered_decoding(in_rx, out_tx, CancellationToken::new());

        for n in 0..20 {
            in_tx
                .send(WireMessage::parse(&frame(n)).expect("wrapper"))
                .expect("forwarder alive");
        }
        in_tx
            .send(WireMessage::parse(r#"{"type":"live_log","payload":{}}"#).expect("wrapper"))
            .expect("forwarder alive");
        drop(in_tx);
        handle.await.expect("forwarder task");

        for n in 0..20 {
            let record = out_rx.recv().await.expect("result").expect("decodes");
            assert_eq!(record.message(), format!("record {n}"));
        }
        let last = out_rx.recv().await.expect("result");
        assert_eq!(last.unwrap_err().kind(), DecodeErrorKind::Envelope);
        assert!(out_rx.recv().await.is_none());
    }
}
