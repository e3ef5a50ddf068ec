//! Per-element listener registry.
//!
//! Listeners are called synchronously, in registration order, on the
//! thread that committed the change. The registry lock is released before
//! any listener runs, so a listener may register or remove listeners.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use weft_event::{ListenerId, RenderEvent};

/// Event callback.
pub type Listener = Arc<dyn Fn(&RenderEvent) + Send + Sync>;

/// Registered listeners of one live element.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    entries: Mutex<Vec<(ListenerId, Listener)>>,
}

impl ListenerRegistry {
    /// Registers a listener. Returns its id.
    pub(crate) fn register(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push((id, listener));
        id
    }

    /// Removes a listener. Returns `true` if found and removed.
    pub(crate) fn unregister(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Delivers `event` to every listener.
    pub(crate) fn emit(&self, event: &RenderEvent) {
        let listeners: Vec<Listener> = self
            .entries
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
