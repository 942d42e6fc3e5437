//! Handler registry keyed by message kind.
//!
//! The registry belongs to a session, not to a connection, so subscriptions
//! survive reconnects without being registered again.

use crate::model::{MessageKind, WireMessage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Callback for messages of one kind.
pub type Handler = Box<dyn FnMut(&WireMessage) + Send>;

struct Entry {
    id: u64,
    handler: Arc<Mutex<Handler>>,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    by_kind: HashMap<String, Vec<Entry>>,
}

/// Shared, cloneable table of subscribers.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for messages whose `type` equals `kind`.
    pub fn subscribe<F>(&self, kind: &MessageKind, handler: F) -> Subscription
    where
        F: FnMut(&WireMessage) + Send + 'static,
    {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner
            .by_kind
            .entry(kind.as_str().to_string())
            .or_default()
            .push(Entry {
                id,
                handler: Arc::new(Mutex::new(Box::new(handler))),
            });

        Subscription {
            id,
            kind: kind.clone(),
            registry: Arc::downgrade(&self.inner),
            active: true,
        }
    }

    /// Invoke every handler registered for the message's kind, in registration
    /// order. Returns how many handlers ran.
    ///
    /// Handlers run outside the registry lock, so they may subscribe or
    /// unsubscribe while being called.
    pub fn dispatch(&self, message: &WireMessage) -> usize {
        let handlers: Vec<_> = match lock(&self.inner).by_kind.get(&message.kind) {
            Some(entries) => entries.iter().map(|e| Arc::clone(&e.handler)).collect(),
            None => return 0,
        };
        for handler in &handlers {
            let mut handler = lock(handler);
            (*handler)(message);
        }
        handlers.len()
    }

    /// Number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: &str) -> usize {
        lock(&self.inner).by_kind.get(kind).map_or(0, Vec::len)
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping it leaves the handler registered; call [`unsubscribe`](Self::unsubscribe)
/// to remove it.
pub struct Subscription {
    id: u64,
    kind: MessageKind,
    registry: Weak<Mutex<RegistryInner>>,
    active: bool,
}

impl Subscription {
    /// Remove the handler. Idempotent, and safe after the session is gone.
    ///
    /// Returns true only on the call that actually removed it.
    pub fn unsubscribe(&mut self) -> bool {
        if !std::mem::take(&mut self.active) {
            return false;
        }
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut inner = lock(&registry);
        let Some(entries) = inner.by_kind.get_mut(self.kind.as_str()) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != self.id);
        let removed = entries.len() < before;
        if entries.is_empty() {
            inner.by_kind.remove(self.kind.as_str());
        }
        removed
    }

    /// Kind this subscription listens to.
    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// False once unsubscribed.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("active", &self.active)
            .finish()
    }
}
