//! ConnectionSession - persistent stream lifecycle.
//!
//! A session owns one handler registry and drives one connection at a time:
//!
//! ```text
//! Disconnected --start--> Connecting --handshake--> Open
//!      ^                      |                      |
//!      |                 connect error          close / error
//!      |                      v                      v
//!      +---- policy delay -- Disconnected <----------+
//!
//! any state --stop--> Closing --> Disconnected (no further attempts)
//! ```
//!
//! The driver is a single tokio task. It reads one frame at a time and calls the
//! handlers for the frame's kind synchronously, in registration order. Stopping
//! cancels the driver through a `CancellationToken`, which interrupts a pending
//! connect, read or reconnect delay immediately.

mod policy;
mod registry;
mod transport;

pub use policy::ReconnectPolicy;
pub use registry::{Handler, HandlerRegistry, Subscription};
pub use transport::{ConnectTarget, Connection, Transport, WebSocketTransport};

use crate::model::{DecodeError, MessageKind, TransportError, WireMessage};
use crate::pipeline::DecodeErrorObserver;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Connection lifecycle state, as exposed to the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionStatus {
    /// No connection and none in progress (initial state, between retries, after stop).
    #[default]
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Frames are flowing.
    Open,
    /// Stop requested; tearing down.
    Closing,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
        };
        f.write_str(label)
    }
}

/// Session parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Endpoint and client identifier. Reconnects reuse both.
    pub target: ConnectTarget,
    /// Delay between attempts.
    pub policy: ReconnectPolicy,
}

type SharedObserver = Arc<Mutex<Option<DecodeErrorObserver>>>;

/// Persistent connection with kind-keyed dispatch and automatic reconnect.
pub struct ConnectionSession {
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    registry: HandlerRegistry,
    status: Arc<watch::Sender<ConnectionStatus>>,
    envelope_errors: SharedObserver,
    generation: Arc<AtomicU64>,
    cancel: Option<CancellationToken>,
    driver: Option<JoinHandle<()>>,
}

impl ConnectionSession {
    /// Create a stopped session over the WebSocket transport.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_transport(config, WebSocketTransport)
    }

    /// Create a stopped session over any transport.
    pub fn with_transport<T: Transport>(config: SessionConfig, transport: T) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            config,
            transport: Arc::new(transport),
            registry: HandlerRegistry::new(),
            status: Arc::new(status),
            envelope_errors: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
            cancel: None,
            driver: None,
        }
    }

    /// Register a handler for one message kind. Works before and after `start`.
    pub fn subscribe<F>(&self, kind: &MessageKind, handler: F) -> Subscription
    where
        F: FnMut(&WireMessage) + Send + 'static,
    {
        self.registry.subscribe(kind, handler)
    }

    /// Install the hook for frames whose JSON wrapper cannot be parsed.
    pub fn on_envelope_error<F>(&self, observer: F)
    where
        F: FnMut(&DecodeError) + Send + 'static,
    {
        *self
            .envelope_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(observer));
    }

    /// Begin connecting. No-op while already running.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let cancel = CancellationToken::new();
        // Bumped before any status write so a driver still unwinding from an
        // earlier start sees that it no longer owns the signal.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let driver = Driver {
            target: self.config.target.clone(),
            policy: self.config.policy,
            transport: Arc::clone(&self.transport),
            registry: self.registry.clone(),
            status: Arc::clone(&self.status),
            envelope_errors: Arc::clone(&self.envelope_errors),
            generation: Arc::clone(&self.generation),
            owner: generation,
            cancel: cancel.clone(),
        };
        self.status.send_replace(ConnectionStatus::Connecting);
        self.driver = Some(tokio::spawn(driver.run()));
        self.cancel = Some(cancel);
    }

    /// Stop immediately. Pending connects, reads and retry delays are abandoned
    /// and no reconnect happens afterwards.
    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            if !cancel.is_cancelled() {
                self.status.send_replace(ConnectionStatus::Closing);
            }
            cancel.cancel();
        }
    }

    /// Stop and wait for the driver task to finish.
    pub async fn shutdown(&mut self) {
        self.stop();
        if let Some(driver) = self.driver.take() {
            if let Err(err) = driver.await {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
            }
        }
    }

    /// Whether the driver is active.
    pub fn is_running(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| !c.is_cancelled())
            && self.driver.as_ref().is_some_and(|d| !d.is_finished())
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver that observes every status change.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// The session's handler registry.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Connection parameters.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }
}

/// Everything the driver task needs, moved into it at `start`.
struct Driver {
    target: ConnectTarget,
    policy: ReconnectPolicy,
    transport: Arc<dyn Transport>,
    registry: HandlerRegistry,
    status: Arc<watch::Sender<ConnectionStatus>>,
    envelope_errors: SharedObserver,
    generation: Arc<AtomicU64>,
    owner: u64,
    cancel: CancellationToken,
}

enum ReadOutcome {
    Cancelled,
    Dropped(TransportError),
}

impl Driver {
    async fn run(self) {
        let url = self.target.url();
        let mut attempt: u32 = 0;

        loop {
            self.set_status(ConnectionStatus::Connecting);
            debug!(%url, attempt, "connecting");

            let connected = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = self.transport.connect(&self.target) => result,
            };

            match connected {
                Ok(mut connection) => {
                    attempt = 0;
                    self.set_status(ConnectionStatus::Open);
                    info!(%url, "connection open");
                    match self.read_until_drop(connection.as_mut()).await {
                        ReadOutcome::Cancelled => break,
                        ReadOutcome::Dropped(err) => warn!(%url, error = %err, "connection lost"),
                    }
                }
                Err(err) => warn!(%url, error = %err, "connect failed"),
            }

            self.set_status(ConnectionStatus::Disconnected);
            let delay = self.policy.delay_for(attempt);
            attempt = attempt.saturating_add(1);
            debug!(?delay, attempt, "reconnecting after delay");

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        // Checked under the watch lock: a restart that already published a
        // newer status must not be overwritten.
        self.status.send_if_modified(|status| {
            if self.generation.load(Ordering::SeqCst) != self.owner {
                return false;
            }
            *status = ConnectionStatus::Disconnected;
            true
        });
        debug!(%url, "session stopped");
    }

    async fn read_until_drop(&self, connection: &mut dyn Connection) -> ReadOutcome {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return ReadOutcome::Cancelled,
                next = connection.next_message() => next,
            };
            match next {
                Ok(Some(text)) => self.dispatch(&text),
                Ok(None) => return ReadOutcome::Dropped(TransportError::Closed),
                Err(err) => return ReadOutcome::Dropped(err),
            }
        }
    }

    fn dispatch(&self, text: &str) {
        match WireMessage::parse(text) {
            Ok(message) => {
                self.registry.dispatch(&message);
            }
            Err(err) => {
                let err = DecodeError::Envelope(err.to_string());
                warn!(error = %err, "dropping frame with unreadable envelope");
                let mut hook = self
                    .envelope_errors
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                if let Some(hook) = hook.as_mut() {
                    hook(&err);
                }
            }
        }
    }

    /// Status updates stop once cancellation is requested so `Closing` is not
    /// overwritten by a late transition.
    fn set_status(&self, status: ConnectionStatus) {
        if !self.cancel.is_cancelled() {
            self.status.send_replace(status);
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
