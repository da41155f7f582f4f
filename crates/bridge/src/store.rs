//! Derived stores: memoized, referentially stable projections of host context.
//!
//! Hosts notify coarsely ("something in the context changed"), so recomputing
//! a projection on every notification would hand reactive consumers a fresh
//! value each time even when nothing they care about moved. Each [`Store`]
//! keeps the last projected value and returns the *same* [`Arc`] for as long
//! as the projection stays equal.

use std::sync::{Arc, Mutex};

use protocol::{
    ContainerDimensions, DeviceCapabilities, DisplayMode, Platform, SafeAreaInsets, Theme, key,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::listeners::{Listener, Subscription};
use crate::lock;

/// Something that holds raw context values and announces per-key changes.
pub trait ContextSource: Send + Sync {
    /// Current raw value for `key`, if any.
    fn read(&self, key: &str) -> Option<Value>;

    /// Call `listener` whenever `key` changes.
    fn subscribe(&self, key: &str, listener: Listener) -> Subscription;
}

type Projection<R> = dyn Fn(&[Option<Value>]) -> R + Send + Sync;

/// A `subscribe` / `snapshot` pair over a fixed set of context keys.
pub struct Store<R> {
    source: Arc<dyn ContextSource>,
    keys: Vec<String>,
    project: Box<Projection<R>>,
    cache: Mutex<Option<Arc<R>>>,
}

/// Build a store reading `keys` from `source` and projecting them with
/// `project`. The projection receives the raw values in `keys` order.
pub fn build_store<R, F>(source: Arc<dyn ContextSource>, keys: &[&str], project: F) -> Store<R>
where
    R: PartialEq + Send + Sync + 'static,
    F: Fn(&[Option<Value>]) -> R + Send + Sync + 'static,
{
    Store {
        source,
        keys: keys.iter().map(|k| k.to_string()).collect(),
        project: Box::new(project),
        cache: Mutex::new(None),
    }
}

impl<R: PartialEq> Store<R> {
    /// Register `on_change` against every key; any one changing triggers it.
    pub fn subscribe(&self, on_change: impl Fn() + Send + Sync + 'static) -> Subscription {
        let listener: Listener = Arc::new(on_change);
        Subscription::merge(
            self.keys
                .iter()
                .map(|key| self.source.subscribe(key, Arc::clone(&listener))),
        )
    }

    /// Current projection. Returns the previous `Arc` when the new projection
    /// is equal to it.
    pub fn snapshot(&self) -> Arc<R> {
        let raw: Vec<Option<Value>> = self.keys.iter().map(|k| self.source.read(k)).collect();
        let next = (self.project)(&raw);

        let mut cache = lock(&self.cache);
        match cache.as_ref() {
            Some(previous) if **previous == next => Arc::clone(previous),
            _ => {
                let next = Arc::new(next);
                *cache = Some(Arc::clone(&next));
                next
            }
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl<R> std::fmt::Debug for Store<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("keys", &self.keys).finish()
    }
}

fn decode<T: DeserializeOwned>(raw: &Option<Value>) -> Option<T> {
    raw.as_ref()
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

fn single<T, F>(source: Arc<dyn ContextSource>, key: &str, project: F) -> Store<T>
where
    T: PartialEq + Send + Sync + 'static,
    F: Fn(&Option<Value>) -> T + Send + Sync + 'static,
{
    build_store(source, &[key], move |raw| project(&raw[0]))
}

pub fn theme(source: Arc<dyn ContextSource>) -> Store<Option<Theme>> {
    single(source, key::THEME, decode)
}

pub fn locale(source: Arc<dyn ContextSource>) -> Store<Option<String>> {
    single(source, key::LOCALE, decode)
}

pub fn display_mode(source: Arc<dyn ContextSource>) -> Store<Option<DisplayMode>> {
    single(source, key::DISPLAY_MODE, decode)
}

pub fn safe_area_insets(source: Arc<dyn ContextSource>) -> Store<SafeAreaInsets> {
    single(source, key::SAFE_AREA_INSETS, |raw| {
        decode(raw).unwrap_or_default()
    })
}

pub fn container_dimensions(source: Arc<dyn ContextSource>) -> Store<ContainerDimensions> {
    single(source, key::CONTAINER_DIMENSIONS, |raw| {
        decode(raw).unwrap_or_default()
    })
}

pub fn platform(source: Arc<dyn ContextSource>) -> Store<Option<Platform>> {
    single(source, key::PLATFORM, decode)
}

pub fn device_capabilities(source: Arc<dyn ContextSource>) -> Store<DeviceCapabilities> {
    single(source, key::DEVICE_CAPABILITIES, |raw| {
        decode(raw).unwrap_or_default()
    })
}

pub fn tool_input(source: Arc<dyn ContextSource>) -> Store<Option<Value>> {
    single(source, key::TOOL_INPUT, |raw| raw.clone())
}

pub fn tool_result(source: Arc<dyn ContextSource>) -> Store<Option<Value>> {
    single(source, key::TOOL_RESULT, |raw| raw.clone())
}

pub fn tool_cancelled(source: Arc<dyn ContextSource>) -> Store<Option<Value>> {
    single(source, key::TOOL_CANCELLED, |raw| raw.clone())
}

pub fn widget_state(source: Arc<dyn ContextSource>) -> Store<Option<Value>> {
    single(source, key::WIDGET_STATE, |raw| raw.clone())
}

/// Everything a widget needs to lay itself out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub display_mode: Option<DisplayMode>,
    pub safe_area_insets: SafeAreaInsets,
    pub container: ContainerDimensions,
}

pub fn layout(source: Arc<dyn ContextSource>) -> Store<Layout> {
    build_store(
        source,
        &[
            key::DISPLAY_MODE,
            key::SAFE_AREA_INSETS,
            key::CONTAINER_DIMENSIONS,
        ],
        |raw| Layout {
            display_mode: decode(&raw[0]),
            safe_area_insets: decode(&raw[1]).unwrap_or_default(),
            container: decode(&raw[2]).unwrap_or_default(),
        },
    )
}
