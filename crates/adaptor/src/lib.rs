//! Host-agnostic adaptor for widgets embedded in a host application.
//!
//! A widget may run inside one of two kinds of host:
//!
//! - a **direct-call** host that injects a global object ([`HostGlobal`]) and
//!   announces context changes with an event;
//! - a **message-passing** host reachable only through JSON-RPC messages,
//!   handled by the `bridge` crate.
//!
//! [`Adaptor`] hides the difference. It is selected once from the declared
//! host type in [`Config`] and exposes the same operations and the same typed
//! stores either way.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use adaptor::{Config, HostEnvironment, MessageChannel, registry};
//! use bridge::ChannelTransport;
//! use protocol::DisplayMode;
//!
//! # async fn example(inbound: tokio::sync::mpsc::UnboundedReceiver<serde_json::Value>) -> adaptor::Result<()> {
//! let config = Config::load("widget.toml")?;
//! let (transport, _outbound) = ChannelTransport::new();
//! let env = HostEnvironment {
//!     channel: Some(MessageChannel { transport: Arc::new(transport), inbound }),
//!     ..Default::default()
//! };
//!
//! let adaptor = registry::connect(&config, env).await?;
//! let display_mode = adaptor.display_mode();
//! let sub = display_mode.subscribe(|| println!("display mode changed"));
//!
//! adaptor.request_display_mode(DisplayMode::Fullscreen).await?;
//! let outcome = adaptor.call_tool("search", serde_json::json!({"q": "pizza"})).await?;
//! println!("{}", outcome.result);
//!
//! sub.unsubscribe();
//! registry::reset();
//! # Ok(())
//! # }
//! ```

mod adaptor;
mod capability;
mod config;
mod direct;
mod error;
mod host;
mod message;
mod modal;
pub mod registry;
mod widget_state;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use adaptor::{Adaptor, HostEnvironment, MessageChannel};
pub use capability::{Capability, Decision};
pub use config::{AppConfig, Config, ConfigError, HostConfig};
pub use direct::{DirectHost, GlobalsHandler, HostGlobal};
pub use error::{Error, Result};
pub use host::{FileUpload, HostStrategy, HostType, UploadedFile};
pub use message::{MessageHost, ViewportHandle};
pub use modal::{ModalController, ModalState};
pub use widget_state::{WidgetStateCell, WidgetStateUpdate};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
