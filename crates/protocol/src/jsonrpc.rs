//! JSON-RPC 2.0 envelopes exchanged with a message-passing host.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol tag carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: id.into(),
            method: method.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: Option<Value>) -> Self {
        self.params = params;
        self
    }
}

/// JSON-RPC 2.0 notification (a request without an id).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Successful response, used when acknowledging host-initiated requests.
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Returns the result if successful, or an error.
    ///
    /// Hosts sometimes omit `result` for void methods; a missing result is
    /// treated as `null`.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        if let Some(error) = self.error {
            Err(error)
        } else {
            Ok(self.result.unwrap_or(Value::Null))
        }
    }
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = self.code;
        let message = &self.message;
        write!(f, "[{code}] {message}")
    }
}

impl std::error::Error for JsonRpcError {}

/// Request ID (can be string or number).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

impl RequestId {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            RequestId::Number(n) => Some(*n),
            RequestId::String(_) => None,
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// A classified inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Answer to one of our requests.
    Response {
        id: RequestId,
        outcome: Result<Value, JsonRpcError>,
    },
    /// Host-initiated request expecting an answer.
    Request {
        id: RequestId,
        method: String,
        params: Option<Value>,
    },
    /// Fire-and-forget message from the host.
    Notification {
        method: String,
        params: Option<Value>,
    },
}

impl Inbound {
    /// Classify a raw message. Returns `None` for anything that is not a
    /// well-formed JSON-RPC 2.0 envelope.
    pub fn parse(message: &Value) -> Option<Self> {
        let object = message.as_object()?;
        if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return None;
        }

        let method = object.get("method").and_then(Value::as_str);
        let params = object.get("params").cloned();
        let id = match object.get("id") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(serde_json::from_value::<RequestId>(raw.clone()).ok()?),
        };

        match (id, method) {
            (Some(id), Some(method)) => Some(Inbound::Request {
                id,
                method: method.to_string(),
                params,
            }),
            (Some(_), None) => {
                // A present `"result": null` is a success; only an envelope
                // with neither key is malformed.
                if !object.contains_key("result") && !object.contains_key("error") {
                    return None;
                }
                let response: JsonRpcResponse = serde_json::from_value(message.clone()).ok()?;
                Some(Inbound::Response {
                    id: response.id.clone(),
                    outcome: response.into_result(),
                })
            }
            (None, Some(method)) => Some(Inbound::Notification {
                method: method.to_string(),
                params,
            }),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialize_request() {
        let req = JsonRpcRequest::new(1i64, "ui/initialize").with_params(Some(json!({"a": 1})));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            json!({"jsonrpc": "2.0", "id": 1, "method": "ui/initialize", "params": {"a": 1}})
        );
    }

    #[test]
    fn notification_has_no_id() {
        let note = JsonRpcNotification::new("ui/open-link", None);
        let json = serde_json::to_value(&note).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("params").is_none());
    }

    #[test]
    fn parse_success_response() {
        let msg = json!({"jsonrpc": "2.0", "id": 3, "result": {"ok": true}});
        assert_eq!(
            Inbound::parse(&msg),
            Some(Inbound::Response {
                id: RequestId::Number(3),
                outcome: Ok(json!({"ok": true})),
            })
        );
    }

    #[test]
    fn parse_null_result_as_success() {
        let msg = json!({"jsonrpc": "2.0", "id": 5, "result": null});
        assert_eq!(
            Inbound::parse(&msg),
            Some(Inbound::Response {
                id: RequestId::Number(5),
                outcome: Ok(Value::Null),
            })
        );
    }

    #[test]
    fn parse_error_response() {
        let msg = json!({"jsonrpc": "2.0", "id": 4, "error": {"code": -32000, "message": "denied"}});
        let Some(Inbound::Response { outcome, .. }) = Inbound::parse(&msg) else {
            panic!("expected response");
        };
        let err = outcome.unwrap_err();
        assert_eq!(err.message, "denied");
        assert_eq!(err.to_string(), "[-32000] denied");
    }

    #[test]
    fn parse_host_request_and_notification() {
        let req = json!({"jsonrpc": "2.0", "id": "t1", "method": "ui/resource-teardown", "params": {}});
        assert!(matches!(
            Inbound::parse(&req),
            Some(Inbound::Request { id: RequestId::String(_), .. })
        ));

        let note = json!({"jsonrpc": "2.0", "method": "ui/notifications/tool-input"});
        assert!(matches!(Inbound::parse(&note), Some(Inbound::Notification { params: None, .. })));
    }

    #[test]
    fn parse_rejects_malformed() {
        assert_eq!(Inbound::parse(&json!({"jsonrpc": "1.0", "id": 1, "result": 1})), None);
        assert_eq!(Inbound::parse(&json!({"id": 1, "result": 1})), None);
        assert_eq!(Inbound::parse(&json!({"jsonrpc": "2.0", "id": 1})), None);
        assert_eq!(Inbound::parse(&json!("hello")), None);
        assert_eq!(Inbound::parse(&json!({"jsonrpc": "2.0", "id": [1], "result": 1})), None);
    }
}
