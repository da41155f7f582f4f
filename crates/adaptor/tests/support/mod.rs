//! Fake hosts shared by the adaptor integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adaptor::{
    Adaptor, Config, Error, FileUpload, GlobalsHandler, HostEnvironment, HostGlobal, HostType,
    MessageChannel, UploadedFile, ViewportHandle,
};
use async_trait::async_trait;
use bridge::{ChannelTransport, FrameScheduler, Rect, ResizeCallback, RootSizing, Viewport};
use protocol::DisplayMode;
use serde_json::{Map, Value, json};
use tokio::sync::{mpsc, oneshot};

/// Direct-call host keeping its globals in a map.
#[derive(Default)]
pub struct FakeGlobal {
    props: Mutex<Map<String, Value>>,
    handler: Mutex<Option<GlobalsHandler>>,
    calls: Mutex<Vec<String>>,
    display_gate: Mutex<Option<oneshot::Receiver<()>>>,
    reject_widget_state: AtomicBool,
}

impl FakeGlobal {
    pub fn with_props(props: Value) -> Arc<Self> {
        let global = Self::default();
        if let Value::Object(map) = props {
            *global.props.lock().unwrap() = map;
        }
        Arc::new(global)
    }

    /// Merge `changed` into the globals and fire the globals-changed event.
    pub fn set_globals(&self, changed: Value) {
        let Value::Object(changed) = changed else {
            panic!("globals must be an object");
        };
        self.props
            .lock()
            .unwrap()
            .extend(changed.iter().map(|(k, v)| (k.clone(), v.clone())));
        let handler = self.handler.lock().unwrap().clone();
        if let Some(handler) = handler {
            handler(&changed);
        }
    }

    pub fn prop(&self, name: &str) -> Option<Value> {
        self.props.lock().unwrap().get(name).cloned()
    }

    /// Hold the next display-mode request until the returned sender fires.
    pub fn gate_display_mode(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.display_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn reject_widget_state(&self) {
        self.reject_widget_state.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl HostGlobal for FakeGlobal {
    fn property(&self, name: &str) -> Option<Value> {
        self.prop(name)
    }

    fn on_globals_changed(&self, handler: GlobalsHandler) {
        *self.handler.lock().unwrap() = Some(handler);
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> adaptor::Result<Value> {
        self.record(format!("call_tool:{name}"));
        Ok(json!({
            "content": [
                { "type": "text", "text": format!("called {name}") },
                { "type": "image", "data": "..." },
                { "type": "text", "text": "done" }
            ],
            "structuredContent": arguments,
            "_meta": { "host": "direct" }
        }))
    }

    async fn request_display_mode(&self, mode: DisplayMode) -> adaptor::Result<DisplayMode> {
        self.record(format!("request_display_mode:{mode}"));
        let gate = self.display_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.props
            .lock()
            .unwrap()
            .insert("displayMode".to_string(), json!(mode));
        Ok(mode)
    }

    async fn send_follow_up_message(&self, prompt: &str) -> adaptor::Result<()> {
        self.record(format!("send_follow_up_message:{prompt}"));
        Ok(())
    }

    fn open_external(&self, href: &str) -> adaptor::Result<()> {
        self.record(format!("open_external:{href}"));
        Ok(())
    }

    async fn set_widget_state(&self, state: Value) -> adaptor::Result<()> {
        self.record("set_widget_state");
        if self.reject_widget_state.load(Ordering::SeqCst) {
            return Err(Error::Host("storage full".to_string()));
        }
        self.props
            .lock()
            .unwrap()
            .insert("widgetState".to_string(), state);
        Ok(())
    }

    async fn upload_file(&self, file: FileUpload) -> adaptor::Result<UploadedFile> {
        self.record(format!("upload_file:{}", file.name));
        Ok(UploadedFile {
            file_id: format!("file-{}", file.name),
        })
    }

    async fn get_file_download_url(&self, file_id: &str) -> adaptor::Result<String> {
        Ok(format!("https://files.example/{file_id}"))
    }

    async fn request_modal(&self, _options: &Value) -> adaptor::Result<()> {
        self.record("request_modal");
        Ok(())
    }
}

pub async fn connect_direct(global: Arc<FakeGlobal>) -> Arc<Adaptor> {
    let config = Config::new("test-widget", "1.0.0", HostType::Direct);
    let env = HostEnvironment {
        global: Some(global as Arc<dyn HostGlobal>),
        ..Default::default()
    };
    Arc::new(Adaptor::connect(&config, env).await.unwrap())
}

/// The host side of a message-passing channel.
pub struct HostEnd {
    pub outbound: mpsc::UnboundedReceiver<Value>,
    pub inbound: mpsc::UnboundedSender<Value>,
}

impl HostEnd {
    /// Next message the widget posted.
    pub async fn next(&mut self) -> Value {
        tokio::time::timeout(Duration::from_secs(5), self.outbound.recv())
            .await
            .expect("widget posted nothing")
            .expect("transport closed")
    }

    pub fn reply(&self, request: &Value, result: Value) {
        self.inbound
            .send(json!({ "jsonrpc": "2.0", "id": request["id"], "result": result }))
            .unwrap();
    }

    pub fn reply_error(&self, request: &Value, code: i64, message: &str) {
        self.inbound
            .send(json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "error": { "code": code, "message": message }
            }))
            .unwrap();
    }

    pub fn notify(&self, method: &str, params: Value) {
        self.inbound
            .send(json!({ "jsonrpc": "2.0", "method": method, "params": params }))
            .unwrap();
    }

    pub fn request(&self, id: Value, method: &str) {
        self.inbound
            .send(json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": {} }))
            .unwrap();
    }
}

pub fn message_env(viewport: Option<ViewportHandle>) -> (HostEnvironment, HostEnd) {
    let (transport, outbound) = ChannelTransport::new();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let env = HostEnvironment {
        channel: Some(MessageChannel {
            transport: Arc::new(transport),
            inbound: inbound_rx,
        }),
        viewport,
        ..Default::default()
    };
    let host = HostEnd {
        outbound,
        inbound: inbound_tx,
    };
    (env, host)
}

/// Run `connect` against a scripted host that answers the handshake with
/// `host_context`.
pub async fn handshake<F, Fut, T>(host: &mut HostEnd, host_context: Value, connect: F) -> T
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let connecting = tokio::spawn(connect());

    let init = host.next().await;
    assert_eq!(init["method"], "ui/initialize");
    host.reply(
        &init,
        json!({
            "protocolVersion": "2025-06-18",
            "hostInfo": { "name": "test-host", "version": "1.0" },
            "hostContext": host_context
        }),
    );

    let output = connecting.await.unwrap();
    let initialized = host.next().await;
    assert_eq!(initialized["method"], "ui/notifications/initialized");
    output
}

pub async fn connect_message(host_context: Value) -> (Arc<Adaptor>, HostEnd) {
    connect_message_with(
        Config::new("test-widget", "1.0.0", HostType::MessagePassing),
        host_context,
        None,
    )
    .await
}

pub async fn connect_message_with(
    config: Config,
    host_context: Value,
    viewport: Option<ViewportHandle>,
) -> (Arc<Adaptor>, HostEnd) {
    let (env, mut host) = message_env(viewport);
    let adaptor = handshake(&mut host, host_context, move || async move {
        Adaptor::connect(&config, env).await
    })
    .await
    .unwrap();
    (Arc::new(adaptor), host)
}

/// Counts listener calls and lets a test wait for the next one.
pub struct Signal {
    tx: mpsc::UnboundedSender<()>,
    rx: mpsc::UnboundedReceiver<()>,
}

impl Signal {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn listener(&self) -> impl Fn() + Send + Sync + 'static {
        let tx = self.tx.clone();
        move || {
            let _ = tx.send(());
        }
    }

    pub async fn wait(&mut self) {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("listener never fired");
    }

    pub fn fired(&mut self) -> usize {
        let mut count = 0;
        while self.rx.try_recv().is_ok() {
            count += 1;
        }
        count
    }
}

/// Viewport with a fixed content rectangle.
pub struct FixedViewport {
    rect: Rect,
    sizing: Mutex<RootSizing>,
    resize: Mutex<Option<ResizeCallback>>,
}

impl FixedViewport {
    pub fn new(width: f64, height: f64) -> Arc<Self> {
        Arc::new(Self {
            rect: Rect { width, height },
            sizing: Mutex::new(RootSizing::default()),
            resize: Mutex::new(None),
        })
    }

    pub fn is_observed(&self) -> bool {
        self.resize.lock().unwrap().is_some()
    }
}

impl Viewport for FixedViewport {
    fn observe_resize(&self, callback: ResizeCallback) {
        *self.resize.lock().unwrap() = Some(callback);
    }

    fn root_sizing(&self) -> RootSizing {
        self.sizing.lock().unwrap().clone()
    }

    fn set_root_sizing(&self, sizing: &RootSizing) {
        *self.sizing.lock().unwrap() = sizing.clone();
    }

    fn root_bounding_rect(&self) -> Rect {
        self.rect
    }

    fn inner_width(&self) -> f64 {
        self.rect.width
    }

    fn client_width(&self) -> f64 {
        self.rect.width
    }
}

/// Frames run only when the test says so.
#[derive(Default)]
pub struct ManualFrames {
    queued: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

impl ManualFrames {
    pub fn pending(&self) -> usize {
        self.queued.lock().unwrap().len()
    }

    pub fn run(&self) {
        let queued = std::mem::take(&mut *self.queued.lock().unwrap());
        for frame in queued {
            frame();
        }
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&self, callback: Box<dyn FnOnce() + Send>) {
        self.queued.lock().unwrap().push(callback);
    }
}
