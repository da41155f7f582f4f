//! Strategy for hosts that inject a global object.
//!
//! The host exposes its operations as methods on one injected object and
//! announces context changes through a single event carrying the changed
//! global keys. Some of those keys use host-specific names; they are mapped
//! onto the canonical context keys here.

use std::sync::Arc;

use async_trait::async_trait;
use bridge::{ContextSource, Listener, ListenerRegistry, Subscription};
use protocol::{DisplayMode, key};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::Result;
use crate::host::{FileUpload, HostStrategy, HostType, UploadedFile};

/// Receives the partial map of changed globals.
pub type GlobalsHandler = Arc<dyn Fn(&Map<String, Value>) + Send + Sync>;

/// Global-object names that differ from the canonical keys.
mod global {
    pub const SAFE_AREA: &str = "safeArea";
    pub const TOOL_OUTPUT: &str = "toolOutput";
    pub const MAX_HEIGHT: &str = "maxHeight";
    pub const USER_AGENT: &str = "userAgent";
}

/// The object a direct-call host injects into the widget frame.
#[async_trait]
pub trait HostGlobal: Send + Sync {
    /// Read a global property synchronously.
    fn property(&self, name: &str) -> Option<Value>;

    /// Register the handler for the globals-changed event.
    fn on_globals_changed(&self, handler: GlobalsHandler);

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value>;

    async fn request_display_mode(&self, mode: DisplayMode) -> Result<DisplayMode>;

    async fn send_follow_up_message(&self, prompt: &str) -> Result<()>;

    fn open_external(&self, href: &str) -> Result<()>;

    async fn set_widget_state(&self, state: Value) -> Result<()>;

    async fn upload_file(&self, file: FileUpload) -> Result<UploadedFile>;

    async fn get_file_download_url(&self, file_id: &str) -> Result<String>;

    async fn request_modal(&self, options: &Value) -> Result<()>;
}

/// Context read straight from the injected global.
struct GlobalContext {
    global: Arc<dyn HostGlobal>,
    listeners: ListenerRegistry,
}

impl ContextSource for GlobalContext {
    fn read(&self, name: &str) -> Option<Value> {
        match name {
            key::SAFE_AREA_INSETS => self
                .global
                .property(global::SAFE_AREA)
                .map(|area| area.get("insets").cloned().unwrap_or(area)),
            key::TOOL_RESULT => self.global.property(global::TOOL_OUTPUT),
            key::CONTAINER_DIMENSIONS => self
                .global
                .property(global::MAX_HEIGHT)
                .map(|max_height| json!({ "maxHeight": max_height })),
            key::PLATFORM => self
                .global
                .property(global::USER_AGENT)
                .and_then(|agent| agent.pointer("/device/type").cloned())
                .map(|device| match device.as_str() {
                    Some("mobile" | "tablet") => json!("mobile"),
                    Some("desktop") => json!("desktop"),
                    _ => json!("web"),
                }),
            key::DEVICE_CAPABILITIES => self
                .global
                .property(global::USER_AGENT)
                .and_then(|agent| agent.get("capabilities").cloned()),
            key::TOOL_CANCELLED => None,
            other => self.global.property(other),
        }
    }

    fn subscribe(&self, name: &str, listener: Listener) -> Subscription {
        self.listeners.subscribe(name, listener)
    }
}

/// Canonical keys affected by a change to the global `name`.
fn canonical_keys(name: &str) -> Vec<&str> {
    match name {
        global::SAFE_AREA => vec![key::SAFE_AREA_INSETS],
        global::TOOL_OUTPUT => vec![key::TOOL_RESULT],
        global::MAX_HEIGHT => vec![key::CONTAINER_DIMENSIONS],
        global::USER_AGENT => vec![key::PLATFORM, key::DEVICE_CAPABILITIES],
        other => vec![other],
    }
}

/// Strategy over an injected [`HostGlobal`].
pub struct DirectHost {
    global: Arc<dyn HostGlobal>,
    context: Arc<GlobalContext>,
}

impl DirectHost {
    pub fn new(global: Arc<dyn HostGlobal>) -> Self {
        let listeners = ListenerRegistry::new();
        let handler: GlobalsHandler = {
            let listeners = listeners.clone();
            Arc::new(move |changed: &Map<String, Value>| {
                for name in changed.keys() {
                    for canonical in canonical_keys(name) {
                        listeners.emit(canonical);
                    }
                }
            })
        };
        global.on_globals_changed(handler);

        Self {
            context: Arc::new(GlobalContext {
                global: Arc::clone(&global),
                listeners,
            }),
            global,
        }
    }
}

#[async_trait]
impl HostStrategy for DirectHost {
    fn host_type(&self) -> HostType {
        HostType::Direct
    }

    fn context(&self) -> Arc<dyn ContextSource> {
        Arc::clone(&self.context) as Arc<dyn ContextSource>
    }

    fn initial_widget_state(&self) -> Option<Value> {
        self.global
            .property(key::WIDGET_STATE)
            .filter(|state| !state.is_null())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        self.global.call_tool(name, arguments).await
    }

    async fn request_display_mode(&self, mode: DisplayMode) -> Result<DisplayMode> {
        let granted = self.global.request_display_mode(mode).await?;
        // The global already holds the granted mode once the call resolves.
        self.context.listeners.emit(key::DISPLAY_MODE);
        Ok(granted)
    }

    async fn send_follow_up_message(&self, prompt: &str) -> Result<()> {
        self.global.send_follow_up_message(prompt).await
    }

    fn open_external(&self, href: &str) {
        if let Err(err) = self.global.open_external(href) {
            warn!(%err, href, "failed to open external link");
        }
    }

    async fn persist_widget_state(&self, state: &Value) -> Result<()> {
        self.global.set_widget_state(state.clone()).await
    }

    async fn upload_file(&self, file: FileUpload) -> Result<UploadedFile> {
        self.global.upload_file(file).await
    }

    async fn get_file_download_url(&self, file_id: &str) -> Result<String> {
        self.global.get_file_download_url(file_id).await
    }

    async fn open_modal(&self, options: &Value) -> Result<()> {
        self.global.request_modal(options).await
    }

    fn shutdown(&self) {
        self.context.listeners.clear();
    }
}
