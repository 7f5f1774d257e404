//! Minimal JSON-RPC 2.0 envelope, protocol-agnostic so both the SSE and
//! streamable-HTTP transports can share it.
//!
//! ```
//! use tool_box::mcp::jsonrpc::JsonRpcRequest;
//! let request = JsonRpcRequest::new("tools/list", serde_json::json!({}));
//! assert_eq!(request.method, "tools/list");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Option<Value>,
}

fn default_version() -> String {
    "2.0".to_string()
}

impl JsonRpcRequest {
    pub fn new(method: &str, params: Value) -> Self {
        JsonRpcRequest {
            jsonrpc: default_version(),
            method: method.to_string(),
            params,
            id: Some(Value::from(1)),
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        JsonRpcError {
            code,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        JsonRpcResponse {
            jsonrpc: default_version(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        JsonRpcResponse {
            jsonrpc: default_version(),
            result: None,
            error: Some(error),
            id,
        }
    }
}
