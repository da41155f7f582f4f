//! Content-size negotiation with a message-passing host.
//!
//! The host cannot see inside the frame, so the widget measures its own
//! content and reports `ui/notifications/size-changed`. Measurements are
//! throttled to one per animation frame, and a report is only sent when the
//! size differs from the last one sent: the measurement itself briefly
//! changes the root element's sizing, which would otherwise loop back as a
//! resize.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use protocol::{Size, method};
use tracing::{debug, warn};

use crate::bridge::Bridge;
use crate::lock;

/// Callback invoked when the observed root element resizes.
pub type ResizeCallback = Arc<dyn Fn() + Send + Sync>;

/// Bounding rectangle of the root element, in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub width: f64,
    pub height: f64,
}

/// Inline sizing of the root element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootSizing {
    pub width: String,
    pub height: String,
}

impl RootSizing {
    pub fn fit_content() -> Self {
        Self {
            width: "fit-content".to_string(),
            height: "fit-content".to_string(),
        }
    }
}

/// The document the widget renders into.
pub trait Viewport: Send + Sync {
    /// Start calling `callback` on every resize of the root element.
    fn observe_resize(&self, callback: ResizeCallback);

    fn root_sizing(&self) -> RootSizing;

    fn set_root_sizing(&self, sizing: &RootSizing);

    fn root_bounding_rect(&self) -> Rect;

    /// Window inner width, scrollbar included.
    fn inner_width(&self) -> f64;

    /// Document element client width, scrollbar excluded.
    fn client_width(&self) -> f64;
}

/// Schedules work for the next animation frame.
pub trait FrameScheduler: Send + Sync {
    fn request_frame(&self, callback: Box<dyn FnOnce() + Send>);
}

/// Frame scheduler on the tokio timer, at roughly 60 frames per second.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFrameScheduler;

const FRAME: Duration = Duration::from_millis(16);

impl FrameScheduler for TokioFrameScheduler {
    fn request_frame(&self, callback: Box<dyn FnOnce() + Send>) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(FRAME).await;
                    callback();
                });
            }
            Err(_) => {
                debug!("no runtime for frame scheduling, running inline");
                callback();
            }
        }
    }
}

#[derive(Default)]
struct NegotiatorState {
    scheduled: bool,
    last_sent: Option<Size>,
}

struct Inner {
    bridge: Bridge,
    viewport: Arc<dyn Viewport>,
    frames: Arc<dyn FrameScheduler>,
    state: Mutex<NegotiatorState>,
    active: AtomicBool,
}

/// Frame-throttled size reporter.
#[derive(Clone)]
pub struct SizeNegotiator {
    inner: Arc<Inner>,
}

impl SizeNegotiator {
    pub fn new(
        bridge: Bridge,
        viewport: Arc<dyn Viewport>,
        frames: Arc<dyn FrameScheduler>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                bridge,
                viewport,
                frames,
                state: Mutex::new(NegotiatorState::default()),
                active: AtomicBool::new(true),
            }),
        }
    }

    /// Observe the viewport and schedule the first measurement. Stops on
    /// host teardown.
    pub fn install(&self) {
        let negotiator = self.clone();
        self.inner
            .viewport
            .observe_resize(Arc::new(move || negotiator.on_resize()));

        let negotiator = self.clone();
        self.inner.bridge.on_teardown(move || negotiator.disconnect());

        self.on_resize();
    }

    /// Schedule a measurement unless one is already pending for this frame.
    pub fn on_resize(&self) {
        if !self.inner.active.load(Ordering::SeqCst) {
            return;
        }
        {
            let mut state = lock(&self.inner.state);
            if state.scheduled {
                return;
            }
            state.scheduled = true;
        }

        let negotiator = self.clone();
        self.inner
            .frames
            .request_frame(Box::new(move || negotiator.measure_and_report()));
    }

    /// Stop reacting to resizes.
    pub fn disconnect(&self) {
        self.inner.active.store(false, Ordering::SeqCst);
    }

    pub fn last_sent(&self) -> Option<Size> {
        lock(&self.inner.state).last_sent
    }

    fn measure(&self) -> Size {
        let viewport = &self.inner.viewport;
        let prior = viewport.root_sizing();
        viewport.set_root_sizing(&RootSizing::fit_content());
        let rect = viewport.root_bounding_rect();
        viewport.set_root_sizing(&prior);

        let scrollbar = (viewport.inner_width() - viewport.client_width()).max(0.0);
        Size {
            width: (rect.width + scrollbar).ceil() as u32,
            height: rect.height.ceil() as u32,
        }
    }

    fn measure_and_report(&self) {
        lock(&self.inner.state).scheduled = false;
        if !self.inner.active.load(Ordering::SeqCst) {
            return;
        }

        let size = self.measure();
        if lock(&self.inner.state).last_sent == Some(size) {
            return;
        }

        let params = match serde_json::to_value(size) {
            Ok(params) => params,
            Err(err) => {
                warn!(%err, "failed to encode size");
                return;
            }
        };
        match self.inner.bridge.notify(method::SIZE_CHANGED, Some(params)) {
            Ok(()) => lock(&self.inner.state).last_sent = Some(size),
            Err(err) => warn!(%err, "failed to report size"),
        }
    }
}

impl std::fmt::Debug for SizeNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizeNegotiator")
            .field("last_sent", &self.last_sent())
            .field("active", &self.inner.active.load(Ordering::SeqCst))
            .finish()
    }
}
