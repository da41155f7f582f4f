//! Per-key listener sets and subscription handles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use crate::lock;

/// Zero-argument change callback.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by every `subscribe`.
///
/// Dropping the handle keeps the listener registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[must_use = "dropping a Subscription leaves the listener registered"]
pub struct Subscription {
    cancel: Vec<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: vec![Box::new(cancel)],
        }
    }

    /// A subscription with nothing to cancel.
    pub fn empty() -> Self {
        Self { cancel: Vec::new() }
    }

    /// Combine several subscriptions into one that cancels them all.
    pub fn merge(parts: impl IntoIterator<Item = Subscription>) -> Self {
        Self {
            cancel: parts.into_iter().flat_map(|part| part.cancel).collect(),
        }
    }

    pub fn unsubscribe(self) {
        for cancel in self.cancel {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("parts", &self.cancel.len())
            .finish()
    }
}

#[derive(Default)]
struct RegistryState {
    next_id: u64,
    by_key: HashMap<String, Vec<(u64, Listener)>>,
}

/// Mapping from context key to the callbacks interested in it.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, key: &str, listener: Listener) -> Subscription {
        let id = {
            let mut state = lock(&self.state);
            state.next_id += 1;
            let id = state.next_id;
            state
                .by_key
                .entry(key.to_string())
                .or_default()
                .push((id, listener));
            id
        };

        let state: Weak<Mutex<RegistryState>> = Arc::downgrade(&self.state);
        let key = key.to_string();
        Subscription::new(move || {
            let Some(state) = state.upgrade() else {
                return;
            };
            let mut state = lock(&state);
            if let Some(listeners) = state.by_key.get_mut(&key) {
                listeners.retain(|(existing, _)| *existing != id);
                if listeners.is_empty() {
                    state.by_key.remove(&key);
                }
            }
        })
    }

    /// Invoke every listener registered for `key`.
    ///
    /// Listeners run after the registry lock is released, so they may
    /// subscribe or unsubscribe freely.
    pub fn emit(&self, key: &str) {
        let listeners: Vec<Listener> = lock(&self.state)
            .by_key
            .get(key)
            .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self, key: &str) -> usize {
        lock(&self.state).by_key.get(key).map_or(0, Vec::len)
    }

    pub fn clear(&self) {
        lock(&self.state).by_key.clear();
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("ListenerRegistry")
            .field("keys", &state.by_key.keys().collect::<Vec<_>>())
            .finish()
    }
}
