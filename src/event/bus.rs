use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::trace;

use crate::shared::sync::lock;

/// Callback invoked with an immutable view of the emitted payload
pub type Listener<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Handle returned by `on`/`once`, used to remove that specific listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration<P> {
    id: ListenerId,
    once: bool,
    listener: Listener<P>,
}

/// Named publish/subscribe bus
///
/// Emission is synchronous: every listener registered for the name at the
/// moment of emission runs, in registration order, before `emit` returns.
/// There is no buffering, so a listener added after an emission never sees it.
pub struct EventBus<P> {
    listeners: Arc<Mutex<HashMap<String, Vec<Registration<P>>>>>,
    next_id: Arc<AtomicU64>,
}

impl<P> EventBus<P> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Registers a persistent listener for `name`
    pub fn on<F>(&self, name: &str, listener: F) -> ListenerId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.register(name, false, Arc::new(listener))
    }

    /// Registers a listener that is removed after its first invocation
    pub fn once<F>(&self, name: &str, listener: F) -> ListenerId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.register(name, true, Arc::new(listener))
    }

    /// Removes one listener. Returns false if it was not registered under `name`.
    pub fn off(&self, name: &str, id: ListenerId) -> bool {
        let mut listeners = lock(&self.listeners);

        let Some(registrations) = listeners.get_mut(name) else {
            return false;
        };

        let before = registrations.len();
        registrations.retain(|registration| registration.id != id);
        let removed = registrations.len() != before;

        if registrations.is_empty() {
            listeners.remove(name);
        }

        removed
    }

    /// Invokes every listener for `name` with `payload`, returning how many ran.
    /// Emitting to a name nobody listens to is a no-op.
    pub fn emit(&self, name: &str, payload: &P) -> usize {
        // Snapshot under the lock, invoke outside it so listeners may
        // register or remove listeners themselves.
        let due: Vec<Listener<P>> = {
            let mut listeners = lock(&self.listeners);

            let Some(registrations) = listeners.get_mut(name) else {
                trace!(event = %name, "Event emitted with no listeners");
                return 0;
            };

            let due = registrations
                .iter()
                .map(|registration| Arc::clone(&registration.listener))
                .collect();

            registrations.retain(|registration| !registration.once);
            if registrations.is_empty() {
                listeners.remove(name);
            }

            due
        };

        for listener in &due {
            listener(payload);
        }

        trace!(event = %name, listeners = due.len(), "Event emitted");
        due.len()
    }

    /// Number of listeners currently registered for `name`
    pub fn listener_count(&self, name: &str) -> usize {
        lock(&self.listeners).get(name).map_or(0, Vec::len)
    }

    /// Drops every registered listener
    pub fn clear(&self) {
        lock(&self.listeners).clear();
    }

    fn register(&self, name: &str, once: bool, listener: Listener<P>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));

        lock(&self.listeners)
            .entry(name.to_string())
            .or_default()
            .push(Registration { id, once, listener });

        id
    }
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for EventBus<P> {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<P> fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = lock(&self.listeners);
        let mut names: Vec<&String> = listeners.keys().collect();
        names.sort();
        f.debug_struct("EventBus").field("events", &names).finish()
    }
}
