//! Wire-level connection to a message-passing host.
//!
//! [`Bridge`] plays two roles on top of a [`Transport`]:
//!
//! - **request correlator**: every outbound request gets the next id and a
//!   pending entry with a timeout; the matching response settles it exactly
//!   once.
//! - **notification dispatcher**: id-less inbound messages are routed by
//!   method into the cached host context (or the tool-state slots) and the
//!   affected keys are announced to their listeners.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use protocol::{
    AppInfo, Inbound, InitializeParams, InitializeResult, JsonRpcError, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION, RequestId, key, method,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::listeners::{Listener, ListenerRegistry, Subscription};
use crate::lock;
use crate::store::ContextSource;
use crate::transport::Transport;

/// Default time a request waits for its response.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Bridge settings.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    pub request_timeout: Duration,
    pub protocol_version: String,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_TIMEOUT,
            protocol_version: PROTOCOL_VERSION.to_string(),
        }
    }
}

struct PendingRequest {
    method: String,
    responder: oneshot::Sender<Result<Value>>,
    timer: JoinHandle<()>,
}

/// Point-in-time tool events, kept apart from the durable context.
#[derive(Default)]
struct ToolState {
    input: Option<Value>,
    result: Option<Value>,
    cancelled: Option<Value>,
}

type TeardownHook = Box<dyn FnOnce() + Send>;

struct Inner {
    transport: Arc<dyn Transport>,
    options: BridgeOptions,
    next_id: AtomicI64,
    pending: Mutex<HashMap<i64, PendingRequest>>,
    context: Mutex<Map<String, Value>>,
    tools: Mutex<ToolState>,
    host: Mutex<Option<InitializeResult>>,
    listeners: ListenerRegistry,
    teardown: Mutex<Vec<TeardownHook>>,
}

/// Handle to the host connection. Cheap to clone.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

impl Bridge {
    pub fn new(transport: Arc<dyn Transport>, options: BridgeOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                options,
                next_id: AtomicI64::new(1),
                pending: Mutex::new(HashMap::new()),
                context: Mutex::new(Map::new()),
                tools: Mutex::new(ToolState::default()),
                host: Mutex::new(None),
                listeners: ListenerRegistry::new(),
                teardown: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Perform the `ui/initialize` handshake.
    ///
    /// Seeds the context from the host's snapshot and acknowledges with
    /// `ui/notifications/initialized`.
    pub async fn initialize(&self, app: AppInfo) -> Result<InitializeResult> {
        let params = InitializeParams::new(app, self.inner.options.protocol_version.clone());
        let result: InitializeResult = self.request_as(method::INITIALIZE, Some(params)).await?;

        self.merge_context(&result.host_context);
        *lock(&self.inner.host) = Some(result.clone());

        self.notify(method::INITIALIZED, None)?;
        Ok(result)
    }

    /// Initialize result, once the handshake has completed.
    pub fn host_info(&self) -> Option<InitializeResult> {
        lock(&self.inner.host).clone()
    }

    /// Send a request and wait for its response.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let message = serde_json::to_value(JsonRpcRequest::new(id, method).with_params(params))?;

        let (responder, response) = oneshot::channel();
        let timeout = self.inner.options.request_timeout;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let expiry = tokio::time::sleep(timeout);
        {
            // Held across the spawn so `expire` always finds the entry.
            let mut pending = lock(&self.inner.pending);
            let timer = tokio::spawn(async move {
                expiry.await;
                if let Some(inner) = weak.upgrade() {
                    inner.expire(id);
                }
            });
            pending.insert(
                id,
                PendingRequest {
                    method: method.to_string(),
                    responder,
                    timer,
                },
            );
        }

        trace!(id, method, "sending request");
        if let Err(err) = self.inner.transport.post(message) {
            if let Some(entry) = lock(&self.inner.pending).remove(&id) {
                entry.timer.abort();
            }
            return Err(err);
        }

        response.await.unwrap_or(Err(Error::Reset))
    }

    /// Send a request with typed params and deserialize the result.
    pub async fn request_as<P, R>(&self, method: &str, params: Option<P>) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = params.map(serde_json::to_value).transpose()?;
        let result = self.request(method, params).await?;
        serde_json::from_value(result)
            .map_err(|e| Error::InvalidResponse(format!("{method}: {e}")))
    }

    /// Send a notification. Nothing comes back.
    pub fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let message = serde_json::to_value(JsonRpcNotification::new(method, params))?;
        trace!(method, "sending notification");
        self.inner.transport.post(message)
    }

    /// Feed one inbound message from the host.
    ///
    /// Malformed envelopes, responses with unknown ids, and unknown methods
    /// are dropped.
    pub fn handle_message(&self, message: &Value) {
        let Some(inbound) = Inbound::parse(message) else {
            debug!("dropping malformed message");
            return;
        };

        match inbound {
            Inbound::Response { id, outcome } => self.settle(id, outcome),
            Inbound::Notification { method, params } => self.dispatch(&method, params),
            Inbound::Request { id, method, .. } => self.answer(id, &method),
        }
    }

    /// Pump an inbound channel into [`handle_message`](Self::handle_message)
    /// until it closes.
    pub fn spawn_receiver(&self, mut inbound: mpsc::UnboundedReceiver<Value>) -> JoinHandle<()> {
        let bridge = self.clone();
        tokio::spawn(async move {
            while let Some(message) = inbound.recv().await {
                bridge.handle_message(&message);
            }
        })
    }

    /// Copy of the current host context.
    pub fn context(&self) -> Map<String, Value> {
        lock(&self.inner.context).clone()
    }

    /// Run `hook` when the host tears the resource down, before the bridge
    /// clears itself.
    pub fn on_teardown(&self, hook: impl FnOnce() + Send + 'static) {
        lock(&self.inner.teardown).push(Box::new(hook));
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.inner.pending).len()
    }

    /// Cancel every timer, fail every pending request with [`Error::Reset`],
    /// and clear listeners, context and tool state.
    pub fn reset(&self) {
        let pending: Vec<PendingRequest> = lock(&self.inner.pending)
            .drain()
            .map(|(_, entry)| entry)
            .collect();
        for entry in pending {
            entry.timer.abort();
            let _ = entry.responder.send(Err(Error::Reset));
        }

        self.inner.listeners.clear();
        lock(&self.inner.context).clear();
        *lock(&self.inner.tools) = ToolState::default();
        *lock(&self.inner.host) = None;
        lock(&self.inner.teardown).clear();
    }

    fn settle(&self, id: RequestId, outcome: std::result::Result<Value, JsonRpcError>) {
        let entry = id
            .as_number()
            .and_then(|n| lock(&self.inner.pending).remove(&n));
        let Some(entry) = entry else {
            debug!(?id, "dropping response with no pending request");
            return;
        };

        entry.timer.abort();
        trace!(?id, method = %entry.method, "settling request");
        let _ = entry.responder.send(outcome.map_err(Error::Host));
    }

    fn dispatch(&self, name: &str, params: Option<Value>) {
        match name {
            method::HOST_CONTEXT_CHANGED => {
                let changed = match params {
                    Some(Value::Object(changed)) => changed,
                    _ => return,
                };
                self.merge_context(&changed);
            }
            method::TOOL_INPUT => {
                let input =
                    params.map(|mut p| p.get_mut("arguments").map(Value::take).unwrap_or(p));
                lock(&self.inner.tools).input = input;
                self.inner.listeners.emit(key::TOOL_INPUT);
            }
            method::TOOL_RESULT => {
                lock(&self.inner.tools).result = params;
                self.inner.listeners.emit(key::TOOL_RESULT);
            }
            method::TOOL_CANCELLED => {
                lock(&self.inner.tools).cancelled = Some(params.unwrap_or(Value::Object(Map::new())));
                self.inner.listeners.emit(key::TOOL_CANCELLED);
            }
            other => debug!(method = other, "ignoring unknown notification"),
        }
    }

    fn answer(&self, id: RequestId, name: &str) {
        match name {
            method::PING => self.acknowledge(id),
            method::RESOURCE_TEARDOWN => {
                self.acknowledge(id);
                let hooks: Vec<TeardownHook> = lock(&self.inner.teardown).drain(..).collect();
                for hook in hooks {
                    hook();
                }
                self.reset();
            }
            other => debug!(method = other, "ignoring unknown host request"),
        }
    }

    fn acknowledge(&self, id: RequestId) {
        let ack = JsonRpcResponse::success(id, Value::Object(Map::new()));
        let result = serde_json::to_value(ack)
            .map_err(Error::from)
            .and_then(|message| self.inner.transport.post(message));
        if let Err(err) = result {
            warn!(%err, "failed to acknowledge host request");
        }
    }

    fn merge_context(&self, changed: &Map<String, Value>) {
        {
            let mut context = lock(&self.inner.context);
            for (k, v) in changed {
                context.insert(k.clone(), v.clone());
            }
        }
        for k in changed.keys() {
            self.inner.listeners.emit(k);
        }
    }
}

impl Inner {
    fn expire(&self, id: i64) {
        let Some(entry) = lock(&self.pending).remove(&id) else {
            return;
        };
        debug!(id, method = %entry.method, "request timed out");
        let _ = entry.responder.send(Err(Error::Timeout {
            method: entry.method,
            after: self.options.request_timeout,
        }));
    }
}

impl ContextSource for Bridge {
    fn read(&self, key: &str) -> Option<Value> {
        match key {
            key::TOOL_INPUT => lock(&self.inner.tools).input.clone(),
            key::TOOL_RESULT => lock(&self.inner.tools).result.clone(),
            key::TOOL_CANCELLED => lock(&self.inner.tools).cancelled.clone(),
            other => lock(&self.inner.context).get(other).cloned(),
        }
    }

    fn subscribe(&self, key: &str, listener: Listener) -> Subscription {
        self.inner.listeners.subscribe(key, listener)
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("next_id", &self.inner.next_id.load(Ordering::SeqCst))
            .field("pending", &self.pending_count())
            .finish()
    }
}
