//! Normalized tool-call results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `tools/call` params.
#[derive(Debug, Clone, Serialize)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Value,
}

/// Tool result in one shape regardless of which host produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallOutcome {
    pub content: Vec<Value>,
    pub structured_content: Option<Value>,
    pub is_error: bool,
    /// All `text` content items joined by newline.
    pub result: String,
    pub meta: Option<Value>,
}

impl ToolCallOutcome {
    /// Normalize a raw host result.
    ///
    /// Hosts disagree on shape: `content` may be missing or not an array, and
    /// metadata arrives as `_meta` or `meta`.
    pub fn from_raw(raw: Value) -> Self {
        let Value::Object(mut object) = raw else {
            return Self::default();
        };

        let content = match object.remove("content") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        let structured_content = object
            .remove("structuredContent")
            .filter(|value| !value.is_null());
        let is_error = object
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let meta = object
            .remove("_meta")
            .or_else(|| object.remove("meta"))
            .filter(|value| !value.is_null());

        let result = content
            .iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|item| item.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            content,
            structured_content,
            is_error,
            result,
            meta,
        }
    }
}
