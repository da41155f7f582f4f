//! Wire types for the widget ↔ host app bridge.
//!
//! Covers the JSON-RPC 2.0 envelopes used by message-passing hosts, the
//! method names and canonical context keys shared by both host styles, and
//! the payload types that flow through them.

mod jsonrpc;
mod methods;
mod tool;
mod types;

pub use jsonrpc::{
    Inbound, JSONRPC_VERSION, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId,
};
pub use methods::{key, method};
pub use tool::{CallToolParams, ToolCallOutcome};
pub use types::{
    AppInfo, ContainerDimensions, DeviceCapabilities, DisplayMode, DisplayModeGrant, HostInfo,
    InitializeParams, InitializeResult, PROTOCOL_VERSION, Platform, SafeAreaInsets, Size, Theme,
};
