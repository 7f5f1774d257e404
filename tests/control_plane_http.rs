//! Exercises the control plane's HTTP routes end to end: the exact
//! `{result, error, ...}` envelope, the duplicate/parse-failure result
//! codes, and that a removed tool is unreachable from `tools/call`.

use serial_test::serial;
use std::sync::Arc;
use tool_box::bootstrap::build_app_state;
use tool_box::config::Config;
use tool_box::control_plane::routes;
use tool_box::mcp::handlers::handle_request;
use tool_box::mcp::jsonrpc::JsonRpcRequest;
use warp::test::request;

const HOST_FAULT_SOURCE: &str = r#"
"""
<requirements>
uvicorn>=0.34.3
</requirements>
"""
@mcp.tool(
    description='host fault resolution'
)
def getHostFaultCause(
    faultCode: str,
    severity: int=2
    ):
    pass
"#;

async fn test_state() -> tool_box::bootstrap::AppState {
    std::env::set_var("STORE_IN_FILE", "true");
    std::env::set_var(
        "MCP_TOOL_CONFIG_PATH",
        format!("/nonexistent/control-plane-http-{}.json", uuid::Uuid::new_v4()),
    );
    let config = Arc::new(Config::from_env());
    build_app_state(config).await.unwrap()
}

#[tokio::test]
#[serial]
async fn add_then_duplicate_add_then_remove_then_call_is_unknown() {
    let state = test_state().await;
    let filter = routes(state.clone());

    let first = request()
        .method("POST")
        .path("/add_mcp_tool/?mcp_tool_name=getHostFaultCause")
        .body(HOST_FAULT_SOURCE)
        .reply(&filter)
        .await;
    assert_eq!(first.status(), 200);
    let body: serde_json::Value = serde_json::from_slice(first.body()).unwrap();
    assert_eq!(body["result"], 0);
    assert!(body["mcp_box_url"].as_str().unwrap().contains("/sse"));

    let duplicate = request()
        .method("POST")
        .path("/add_mcp_tool/?mcp_tool_name=getHostFaultCause")
        .body(HOST_FAULT_SOURCE)
        .reply(&filter)
        .await;
    let duplicate_body: serde_json::Value = serde_json::from_slice(duplicate.body()).unwrap();
    assert_eq!(duplicate_body["result"], 1);

    let remove = request()
        .method("POST")
        .path("/remove_mcp_tool/?mcp_tool_name=getHostFaultCause")
        .reply(&filter)
        .await;
    let remove_body: serde_json::Value = serde_json::from_slice(remove.body()).unwrap();
    assert_eq!(remove_body["result"], 0);

    let call = JsonRpcRequest::new(
        "tools/call",
        serde_json::json!({ "name": "getHostFaultCause", "arguments": {} }),
    );
    let response = handle_request(&state, call).await;
    assert!(response.error.is_some());
}

#[tokio::test]
#[serial]
async fn add_without_decorator_yields_result_two_and_registry_unchanged() {
    let state = test_state().await;
    let filter = routes(state.clone());

    let response = request()
        .method("POST")
        .path("/add_mcp_tool/?mcp_tool_name=bare")
        .body("def bare():\n    pass\n")
        .reply(&filter)
        .await;
    let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["result"], 2);
    assert!(!state.registry.contains("bare").await);
}

#[tokio::test]
#[serial]
async fn remove_unknown_tool_yields_result_one() {
    let state = test_state().await;
    let filter = routes(state);

    let response = request()
        .method("POST")
        .path("/remove_mcp_tool/?mcp_tool_name=neverAdded")
        .reply(&filter)
        .await;
    let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["result"], 1);
}
