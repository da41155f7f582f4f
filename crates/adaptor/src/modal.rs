//! Local modal open/close state.

use std::sync::{Arc, Mutex};

use bridge::{ListenerRegistry, Subscription};
use serde_json::{Map, Value};

use crate::lock;

const MODAL_KEY: &str = "modal";

#[derive(Debug, Clone, PartialEq)]
pub struct ModalState {
    pub is_open: bool,
    pub options: Value,
}

impl Default for ModalState {
    fn default() -> Self {
        Self {
            is_open: false,
            options: Value::Object(Map::new()),
        }
    }
}

/// Open/close state machine that never consults host context.
///
/// Every transition notifies listeners, including `close()` on a modal that
/// is already closed.
#[derive(Debug, Default)]
pub struct ModalController {
    state: Mutex<ModalState>,
    listeners: ListenerRegistry,
}

impl ModalController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, options: Value) {
        *lock(&self.state) = ModalState {
            is_open: true,
            options,
        };
        self.listeners.emit(MODAL_KEY);
    }

    pub fn close(&self) {
        *lock(&self.state) = ModalState::default();
        self.listeners.emit(MODAL_KEY);
    }

    pub fn state(&self) -> ModalState {
        lock(&self.state).clone()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.state).is_open
    }

    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.listeners.subscribe(MODAL_KEY, Arc::new(listener))
    }

    pub fn clear_listeners(&self) {
        self.listeners.clear();
    }
}
