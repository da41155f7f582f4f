//! Host strategy trait.

use std::sync::Arc;

use async_trait::async_trait;
use bridge::ContextSource;
use protocol::DisplayMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// The two integration styles a host can expose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostType {
    /// Injected global object plus a change event.
    Direct,
    /// JSON-RPC over a cross-frame message channel.
    #[default]
    MessagePassing,
}

impl std::fmt::Display for HostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostType::Direct => f.write_str("direct"),
            HostType::MessagePassing => f.write_str("message-passing"),
        }
    }
}

/// A file handed to the host for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Host-assigned handle for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub file_id: String,
}

/// One concrete way of reaching the host.
///
/// The [`Adaptor`](crate::Adaptor) owns exactly one strategy, chosen at
/// startup, and never branches on host type itself.
#[async_trait]
pub trait HostStrategy: Send + Sync {
    fn host_type(&self) -> HostType;

    /// Raw context values and their change notifications.
    fn context(&self) -> Arc<dyn ContextSource>;

    /// Widget state the host restored for this instance, if any.
    fn initial_widget_state(&self) -> Option<Value>;

    /// Invoke a tool and return the host's raw result.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value>;

    /// Ask for a display mode; returns the mode the host granted.
    async fn request_display_mode(&self, mode: DisplayMode) -> Result<DisplayMode>;

    async fn send_follow_up_message(&self, prompt: &str) -> Result<()>;

    /// One-way; delivery failures are logged, never returned.
    fn open_external(&self, href: &str);

    async fn persist_widget_state(&self, state: &Value) -> Result<()>;

    async fn upload_file(&self, file: FileUpload) -> Result<UploadedFile>;

    async fn get_file_download_url(&self, file_id: &str) -> Result<String>;

    /// Tell the host a modal is opening. Hosts without modal support keep
    /// modals entirely local.
    async fn open_modal(&self, _options: &Value) -> Result<()> {
        Ok(())
    }

    /// Release host resources: timers, listeners, observers.
    fn shutdown(&self);
}
