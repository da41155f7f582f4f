//! Host-agnostic operation façade.

use std::sync::Arc;

use bridge::{Bridge, ContextSource, Store, Transport, store};
use protocol::{
    ContainerDimensions, DeviceCapabilities, DisplayMode, Platform, SafeAreaInsets, Theme,
    ToolCallOutcome,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::capability::Capability;
use crate::config::Config;
use crate::direct::{DirectHost, HostGlobal};
use crate::host::{FileUpload, HostStrategy, HostType, UploadedFile};
use crate::message::{MessageHost, ViewportHandle};
use crate::modal::ModalController;
use crate::widget_state::{WidgetStateCell, WidgetStateUpdate};
use crate::{Error, Result};

/// Both halves of a cross-frame message channel.
pub struct MessageChannel {
    pub transport: Arc<dyn Transport>,
    pub inbound: mpsc::UnboundedReceiver<Value>,
}

/// Whatever the embedding page offers; the declared host type picks from it.
#[derive(Default)]
pub struct HostEnvironment {
    pub global: Option<Arc<dyn HostGlobal>>,
    pub channel: Option<MessageChannel>,
    pub viewport: Option<ViewportHandle>,
}

/// Unified access to the host, whichever style it exposes.
pub struct Adaptor {
    host: Arc<dyn HostStrategy>,
    widget_state: Arc<WidgetStateCell>,
    modal: ModalController,
}

impl Adaptor {
    /// Build the adaptor for the host type declared in `config`.
    ///
    /// For a message-passing host this completes the initialize handshake
    /// before returning.
    pub async fn connect(config: &Config, env: HostEnvironment) -> Result<Self> {
        let host: Arc<dyn HostStrategy> = match config.host.host_type {
            HostType::Direct => {
                let global = env
                    .global
                    .ok_or(Error::HostUnavailable(HostType::Direct))?;
                Arc::new(DirectHost::new(global))
            }
            HostType::MessagePassing => {
                let channel = env
                    .channel
                    .ok_or(Error::HostUnavailable(HostType::MessagePassing))?;
                let bridge = Bridge::new(channel.transport, config.bridge_options());
                let receiver = bridge.spawn_receiver(channel.inbound);
                match MessageHost::connect(bridge, config.app_info(), env.viewport).await {
                    Ok(host) => Arc::new(host.with_receiver(receiver)),
                    Err(err) => {
                        receiver.abort();
                        return Err(err);
                    }
                }
            }
        };
        debug!(host = %config.host.host_type, app = %config.app.name, "adaptor connected");
        Ok(Self::with_strategy(host))
    }

    /// Wrap an already-built strategy.
    pub fn with_strategy(host: Arc<dyn HostStrategy>) -> Self {
        let widget_state = Arc::new(WidgetStateCell::new(host.initial_widget_state()));
        Self {
            host,
            widget_state,
            modal: ModalController::new(),
        }
    }

    pub fn host_type(&self) -> HostType {
        self.host.host_type()
    }

    /// Raw host context, for building custom stores.
    pub fn context(&self) -> Arc<dyn ContextSource> {
        self.host.context()
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallOutcome> {
        let raw = self.host.call_tool(name, arguments).await?;
        Ok(ToolCallOutcome::from_raw(raw))
    }

    /// Ask the host for `mode`. Fails without contacting the host when the
    /// host style cannot present that mode.
    pub async fn request_display_mode(&self, mode: DisplayMode) -> Result<DisplayMode> {
        self.host_type().require(Capability::DisplayMode(mode))?;
        self.host.request_display_mode(mode).await
    }

    /// Resolves once the host has accepted the message.
    pub async fn send_follow_up_message(&self, prompt: &str) -> Result<()> {
        self.host.send_follow_up_message(prompt).await
    }

    pub fn open_external(&self, href: &str) {
        self.host.open_external(href);
    }

    /// Persist new widget state.
    ///
    /// The host round trip happens first; only on success is the local cache
    /// updated and are listeners notified. Concurrent calls are not queued:
    /// whichever round trip resolves last determines the cached state.
    pub async fn set_widget_state(&self, update: impl Into<WidgetStateUpdate>) -> Result<Value> {
        let next = update.into().resolve(self.widget_state.get().as_ref());
        self.host.persist_widget_state(&next).await?;
        self.widget_state.commit(next.clone());
        Ok(next)
    }

    /// Last committed widget state.
    pub fn widget_state(&self) -> Option<Value> {
        self.widget_state.get()
    }

    pub async fn upload_file(&self, file: FileUpload) -> Result<UploadedFile> {
        self.host_type().require(Capability::FileUpload)?;
        self.host.upload_file(file).await
    }

    pub async fn get_file_download_url(&self, file_id: &str) -> Result<String> {
        self.host_type().require(Capability::FileDownload)?;
        self.host.get_file_download_url(file_id).await
    }

    pub async fn open_modal(&self, options: Value) -> Result<()> {
        self.host.open_modal(&options).await?;
        self.modal.open(options);
        Ok(())
    }

    pub fn close_modal(&self) {
        self.modal.close();
    }

    pub fn modal(&self) -> &ModalController {
        &self.modal
    }

    pub fn theme(&self) -> Store<Option<Theme>> {
        store::theme(self.context())
    }

    pub fn locale(&self) -> Store<Option<String>> {
        store::locale(self.context())
    }

    pub fn display_mode(&self) -> Store<Option<DisplayMode>> {
        store::display_mode(self.context())
    }

    pub fn safe_area_insets(&self) -> Store<SafeAreaInsets> {
        store::safe_area_insets(self.context())
    }

    pub fn container_dimensions(&self) -> Store<ContainerDimensions> {
        store::container_dimensions(self.context())
    }

    pub fn platform(&self) -> Store<Option<Platform>> {
        store::platform(self.context())
    }

    pub fn device_capabilities(&self) -> Store<DeviceCapabilities> {
        store::device_capabilities(self.context())
    }

    pub fn layout(&self) -> Store<store::Layout> {
        store::layout(self.context())
    }

    pub fn tool_input(&self) -> Store<Option<Value>> {
        store::tool_input(self.context())
    }

    pub fn tool_result(&self) -> Store<Option<Value>> {
        store::tool_result(self.context())
    }

    pub fn tool_cancelled(&self) -> Store<Option<Value>> {
        store::tool_cancelled(self.context())
    }

    pub fn widget_state_store(&self) -> Store<Option<Value>> {
        store::widget_state(Arc::clone(&self.widget_state) as Arc<dyn ContextSource>)
    }

    /// Cancel outstanding requests and drop every listener.
    pub fn shutdown(&self) {
        self.host.shutdown();
        self.widget_state.clear_listeners();
        self.modal.clear_listeners();
    }
}

impl std::fmt::Debug for Adaptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adaptor")
            .field("host", &self.host_type())
            .field("modal_open", &self.modal.is_open())
            .finish()
    }
}
