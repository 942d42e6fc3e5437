//! Wiring from a session's dispatch to the render loop.
//!
//! The subscription handler runs on the session driver task and only forwards
//! the message. Decoding happens on the blocking pool through the ordered
//! decoder, and results reach the render loop over an unbounded channel in
//! arrival order. The render thread never decompresses anything.

use crate::model::{DecodeError, MessageKind, WireMessage};
use crate::pipeline::{spawn_ordered_decoding, Decoded};
use crate::session::{ConnectionSession, Subscription};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// A live subscription feeding decoded records to the host.
pub struct LiveFeed {
    subscription: Subscription,
    cancel: CancellationToken,
    forwarder: JoinHandle<()>,
}

impl LiveFeed {
    /// Subscribe to `kind` on `session` and start the decode forwarder.
    ///
    /// Envelope failures reported by the session are forwarded too, so the
    /// pipeline counts every dropped frame. Must be called inside a tokio
    /// runtime.
    pub fn attach(
        session: &ConnectionSession,
        kind: &MessageKind,
    ) -> (Self, mpsc::UnboundedReceiver<Decoded>) {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel::<WireMessage>();
        let (decoded_tx, decoded_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let envelope_tx = decoded_tx.clone();
        session.on_envelope_error(move |err| {
            if let DecodeError::Envelope(reason) = err {
                if envelope_tx
                    .send(Err(DecodeError::Envelope(reason.clone())))
                    .is_err()
                {
                    trace!("decoded receiver gone, envelope error discarded");
                }
            }
        });
        let subscription = session.subscribe(kind, move |message| {
            if frames_tx.send(message.clone()).is_err() {
                trace!("decoder gone, frame discarded");
            }
        });
        let forwarder = spawn_ordered_decoding(frames_rx, decoded_tx, cancel.clone());

        (
            Self {
                subscription,
                cancel,
                forwarder,
            },
            decoded_rx,
        )
    }

    /// Unsubscribe and stop the forwarder.
    pub async fn detach(mut self) {
        self.subscription.unsubscribe();
        self.cancel.cancel();
        let _ = (&mut self.forwarder).await;
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
