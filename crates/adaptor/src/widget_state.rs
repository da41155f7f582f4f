//! Locally cached widget state.

use std::sync::Mutex;

use bridge::{ContextSource, Listener, ListenerRegistry, Subscription};
use protocol::key;
use serde_json::Value;

use crate::lock;

type Updater = Box<dyn FnOnce(Option<&Value>) -> Value + Send>;

/// New widget state: either a value or a function of the cached one.
pub enum WidgetStateUpdate {
    Replace(Value),
    Update(Updater),
}

impl WidgetStateUpdate {
    pub fn with(updater: impl FnOnce(Option<&Value>) -> Value + Send + 'static) -> Self {
        Self::Update(Box::new(updater))
    }

    pub(crate) fn resolve(self, current: Option<&Value>) -> Value {
        match self {
            WidgetStateUpdate::Replace(value) => value,
            WidgetStateUpdate::Update(updater) => updater(current),
        }
    }
}

impl From<Value> for WidgetStateUpdate {
    fn from(value: Value) -> Self {
        Self::Replace(value)
    }
}

impl std::fmt::Debug for WidgetStateUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidgetStateUpdate::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            WidgetStateUpdate::Update(_) => f.write_str("Update(..)"),
        }
    }
}

/// Last committed widget state plus its listeners.
///
/// Only values the host has accepted are committed here, so readers never
/// observe a state the host has not stored.
#[derive(Debug, Default)]
pub struct WidgetStateCell {
    value: Mutex<Option<Value>>,
    listeners: ListenerRegistry,
}

impl WidgetStateCell {
    pub fn new(initial: Option<Value>) -> Self {
        Self {
            value: Mutex::new(initial),
            listeners: ListenerRegistry::new(),
        }
    }

    pub fn get(&self) -> Option<Value> {
        lock(&self.value).clone()
    }

    /// Store `value` and notify listeners synchronously.
    pub fn commit(&self, value: Value) {
        *lock(&self.value) = Some(value);
        self.listeners.emit(key::WIDGET_STATE);
    }

    pub fn clear_listeners(&self) {
        self.listeners.clear();
    }
}

impl ContextSource for WidgetStateCell {
    fn read(&self, name: &str) -> Option<Value> {
        (name == key::WIDGET_STATE).then(|| self.get()).flatten()
    }

    fn subscribe(&self, name: &str, listener: Listener) -> Subscription {
        self.listeners.subscribe(name, listener)
    }
}
