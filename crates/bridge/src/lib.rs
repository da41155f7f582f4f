//! Host bridge for widgets embedded in a message-passing host.
//!
//! This crate owns the wire-level connection: it correlates requests with
//! responses, dispatches host notifications into a cached context, exposes
//! that context through memoized derived stores, and reports content size.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bridge::{Bridge, BridgeOptions, ChannelTransport, store};
//! use protocol::AppInfo;
//!
//! # async fn example(inbound: tokio::sync::mpsc::UnboundedReceiver<serde_json::Value>) -> bridge::Result<()> {
//! let (transport, _outbound) = ChannelTransport::new();
//! let bridge = Bridge::new(Arc::new(transport), BridgeOptions::default());
//! bridge.spawn_receiver(inbound);
//!
//! bridge
//!     .initialize(AppInfo { name: "pizza".into(), version: "1.0.0".into() })
//!     .await?;
//!
//! let theme = store::theme(Arc::new(bridge.clone()));
//! let sub = theme.subscribe(|| println!("theme changed"));
//! println!("theme: {:?}", theme.snapshot());
//! sub.unsubscribe();
//! # Ok(())
//! # }
//! ```

mod bridge;
mod error;
mod listeners;
mod size;
pub mod store;
mod transport;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use bridge::{Bridge, BridgeOptions, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use listeners::{Listener, ListenerRegistry, Subscription};
pub use size::{
    FrameScheduler, Rect, ResizeCallback, RootSizing, SizeNegotiator, TokioFrameScheduler,
    Viewport,
};
pub use store::{ContextSource, Store, build_store};
pub use transport::{ChannelTransport, Transport};

/// Lock a mutex, recovering the data if a listener panicked while it was held.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
