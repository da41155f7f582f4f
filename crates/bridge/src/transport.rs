//! Outbound message channel to the host.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Posts a message to the host frame.
///
/// Delivery is fire-and-forget with a wildcard target; replies come back
/// through [`Bridge::handle_message`](crate::Bridge::handle_message).
pub trait Transport: Send + Sync {
    fn post(&self, message: Value) -> Result<()>;
}

/// In-process transport backed by an unbounded tokio channel.
///
/// The receiving half plays the host: it sees every message the widget posts.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Value>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn post(&self, message: Value) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| Error::Transport("host channel closed".to_string()))
    }
}
