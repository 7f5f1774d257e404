//! Request handling shared by both MCP transports: one JSON-RPC request in,
//! one JSON-RPC response out. Framing (SSE vs. streamable HTTP) lives in
//! [`super::transport`].

use super::jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use super::schema::ToolSchema;
use crate::bootstrap::AppState;
use crate::errors::ErrorCode;
use serde_json::{json, Value};

pub type McpState = AppState;

/// Dispatches one JSON-RPC request against `state`, never returning an
/// `Err` — protocol and tool failures alike are folded into a JSON-RPC
/// error response so the transport layer always has something to frame.
pub async fn handle_request(state: &McpState, request: JsonRpcRequest) -> JsonRpcResponse {
    let id = request.id.clone().unwrap_or(Value::Null);
    match request.method.as_str() {
        "initialize" => JsonRpcResponse::success(id, initialize_result()),
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => match list_tools(state).await {
            Ok(schemas) => JsonRpcResponse::success(id, json!({ "tools": schemas })),
            Err(err) => JsonRpcResponse::failure(id, JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, err.to_string())),
        },
        "tools/call" => match call_tool(state, &request.params).await {
            Ok(result) => JsonRpcResponse::success(id, json!(result)),
            Err(err) => {
                let code = match err.code {
                    ErrorCode::UnknownTool => JsonRpcError::INVALID_PARAMS,
                    ErrorCode::ArgumentError => JsonRpcError::INVALID_PARAMS,
                    _ => JsonRpcError::INTERNAL_ERROR,
                };
                JsonRpcResponse::failure(id, JsonRpcError::new(code, err.message))
            }
        },
        other => JsonRpcResponse::failure(
            id,
            JsonRpcError::new(JsonRpcError::METHOD_NOT_FOUND, format!("unknown method: {other}")),
        ),
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": "2024-11-05",
        "serverInfo": { "name": "tool-box", "version": env!("CARGO_PKG_VERSION") },
        "capabilities": { "tools": { "listChanged": true } },
    })
}

async fn list_tools(state: &McpState) -> crate::errors::AppResult<Vec<ToolSchema>> {
    let tools = state.registry.list().await;
    Ok(tools
        .into_iter()
        .map(|tool| {
            let mut input_schema = tool.descriptor.input_schema.clone();
            input_schema.merge_descriptions(&tool.descriptor.parameter_annotations);
            ToolSchema {
                name: tool.name,
                description: tool.descriptor.description,
                input_schema,
            }
        })
        .collect())
}

async fn call_tool(state: &McpState, params: &Value) -> crate::errors::AppResult<super::schema::ToolCallResult> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| crate::errors::AppError::argument("missing `name` in tools/call params"))?;
    let arguments = params
        .get("arguments")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let tool = state
        .registry
        .get(name)
        .await
        .ok_or_else(|| crate::errors::AppError::unknown_tool(name))?;

    state.executor.execute(&tool, &arguments).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::build_tool;
    use crate::config::Config;

    async fn test_state() -> McpState {
        std::env::set_var("STORE_IN_FILE", "true");
        std::env::set_var("MCP_TOOL_CONFIG_PATH", "/nonexistent/does-not-exist.json");
        let config = std::sync::Arc::new(Config::from_env());
        crate::bootstrap::build_app_state(config).await.unwrap()
    }

    #[tokio::test]
    async fn unknown_method_yields_method_not_found() {
        let state = test_state().await;
        let request = JsonRpcRequest::new("not/a/method", json!({}));
        let response = handle_request(&state, request).await;
        assert_eq!(response.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn calling_unknown_tool_is_invalid_params() {
        let state = test_state().await;
        let request = JsonRpcRequest::new("tools/call", json!({ "name": "missing", "arguments": {} }));
        let response = handle_request(&state, request).await;
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn list_tools_reflects_registry_contents() {
        let state = test_state().await;
        let tool = build_tool(
            "getHostFaultCause",
            "@mcp.tool(description='d')\ndef getHostFaultCause(faultCode: str):\n    pass\n",
        )
        .unwrap();
        state.registry.register(tool).await.unwrap();

        let request = JsonRpcRequest::new("tools/list", json!({}));
        let response = handle_request(&state, request).await;
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "getHostFaultCause");
    }
}
