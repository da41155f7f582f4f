//! Method names and context keys.

/// JSON-RPC method names used by the message-passing host.
pub mod method {
    pub const INITIALIZE: &str = "ui/initialize";
    pub const INITIALIZED: &str = "ui/notifications/initialized";
    pub const HOST_CONTEXT_CHANGED: &str = "ui/notifications/host-context-changed";
    pub const TOOL_INPUT: &str = "ui/notifications/tool-input";
    pub const TOOL_RESULT: &str = "ui/notifications/tool-result";
    pub const TOOL_CANCELLED: &str = "ui/notifications/tool-cancelled";
    pub const SIZE_CHANGED: &str = "ui/notifications/size-changed";
    pub const REQUEST_DISPLAY_MODE: &str = "ui/request-display-mode";
    pub const MESSAGE: &str = "ui/message";
    pub const OPEN_LINK: &str = "ui/open-link";
    pub const UPDATE_MODEL_CONTEXT: &str = "ui/update-model-context";
    pub const RESOURCE_TEARDOWN: &str = "ui/resource-teardown";
    pub const TOOLS_CALL: &str = "tools/call";
    pub const PING: &str = "ping";
}

/// Canonical context keys shared by both host styles.
pub mod key {
    pub const THEME: &str = "theme";
    pub const LOCALE: &str = "locale";
    pub const DISPLAY_MODE: &str = "displayMode";
    pub const SAFE_AREA_INSETS: &str = "safeAreaInsets";
    pub const CONTAINER_DIMENSIONS: &str = "containerDimensions";
    pub const PLATFORM: &str = "platform";
    pub const DEVICE_CAPABILITIES: &str = "deviceCapabilities";
    pub const TOOL_INPUT: &str = "toolInput";
    pub const TOOL_RESULT: &str = "toolResult";
    pub const TOOL_CANCELLED: &str = "toolCancelled";
    pub const WIDGET_STATE: &str = "widgetState";
}
