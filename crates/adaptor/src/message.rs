//! Strategy for hosts reachable only through JSON-RPC messages.

use std::sync::Arc;

use async_trait::async_trait;
use bridge::{Bridge, ContextSource, FrameScheduler, SizeNegotiator, Viewport};
use protocol::{AppInfo, CallToolParams, DisplayMode, DisplayModeGrant, method};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::capability::Capability;
use crate::host::{FileUpload, HostStrategy, HostType, UploadedFile};
use crate::{Error, Result};

/// The document to measure for size negotiation.
#[derive(Clone)]
pub struct ViewportHandle {
    pub viewport: Arc<dyn Viewport>,
    pub frames: Arc<dyn FrameScheduler>,
}

/// Strategy over a [`Bridge`].
pub struct MessageHost {
    bridge: Bridge,
    size: Option<SizeNegotiator>,
    receiver: Option<JoinHandle<()>>,
}

impl MessageHost {
    /// Complete the `ui/initialize` handshake, then start size negotiation
    /// when a viewport is available.
    pub async fn connect(
        bridge: Bridge,
        app: AppInfo,
        viewport: Option<ViewportHandle>,
    ) -> Result<Self> {
        bridge.initialize(app).await?;

        let size = viewport.map(|handle| {
            let negotiator = SizeNegotiator::new(bridge.clone(), handle.viewport, handle.frames);
            negotiator.install();
            negotiator
        });

        Ok(Self {
            bridge,
            size,
            receiver: None,
        })
    }

    /// Abort `receiver` on shutdown.
    pub fn with_receiver(mut self, receiver: JoinHandle<()>) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }
}

#[async_trait]
impl HostStrategy for MessageHost {
    fn host_type(&self) -> HostType {
        HostType::MessagePassing
    }

    fn context(&self) -> Arc<dyn ContextSource> {
        Arc::new(self.bridge.clone())
    }

    fn initial_widget_state(&self) -> Option<Value> {
        None
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        let params = serde_json::to_value(params).map_err(bridge::Error::from)?;
        Ok(self.bridge.request(method::TOOLS_CALL, Some(params)).await?)
    }

    async fn request_display_mode(&self, mode: DisplayMode) -> Result<DisplayMode> {
        let grant: DisplayModeGrant = self
            .bridge
            .request_as(method::REQUEST_DISPLAY_MODE, Some(json!({ "mode": mode })))
            .await?;
        Ok(grant.mode)
    }

    async fn send_follow_up_message(&self, prompt: &str) -> Result<()> {
        let params = json!({
            "role": "user",
            "content": [{ "type": "text", "text": prompt }],
        });
        let result = self.bridge.request(method::MESSAGE, Some(params)).await?;
        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            return Err(Error::InvalidResponse(
                "host rejected the follow-up message".to_string(),
            ));
        }
        Ok(())
    }

    fn open_external(&self, href: &str) {
        if let Err(err) = self
            .bridge
            .notify(method::OPEN_LINK, Some(json!({ "url": href })))
        {
            warn!(%err, href, "failed to open external link");
        }
    }

    async fn persist_widget_state(&self, state: &Value) -> Result<()> {
        self.bridge
            .request(
                method::UPDATE_MODEL_CONTEXT,
                Some(json!({ "structuredContent": state })),
            )
            .await?;
        Ok(())
    }

    async fn upload_file(&self, _file: FileUpload) -> Result<UploadedFile> {
        Err(Capability::FileUpload.unsupported_on(self.host_type()))
    }

    async fn get_file_download_url(&self, _file_id: &str) -> Result<String> {
        Err(Capability::FileDownload.unsupported_on(self.host_type()))
    }

    fn shutdown(&self) {
        if let Some(size) = &self.size {
            size.disconnect();
        }
        if let Some(receiver) = &self.receiver {
            receiver.abort();
        }
        self.bridge.reset();
    }
}
