//! Exercises the sandbox executor against the local process provider.
//! Skipped when no `python3` interpreter is on `PATH`, since this test
//! actually runs generated code rather than mocking the provider.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tool_box::bootstrap::build_tool;
use tool_box::sandbox::{ProcessSandboxProvider, SandboxExecutor};

fn python3_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn executes_tool_body_and_returns_text_content() {
    if !python3_available() {
        eprintln!("skipping: no python3 on PATH");
        return;
    }

    let source = r#"
@mcp.tool(description='host fault resolution')
def getHostFaultCause(faultCode: str, severity: int=2):
    if faultCode == 'F02':
        faultCause = 'disk failure, replace the disk'
    else:
        faultCause = f'unknown fault, code {faultCode}'
    print(faultCause)
"#;
    let tool = build_tool("getHostFaultCause", source).unwrap();
    let provider = Arc::new(ProcessSandboxProvider::default());
    let executor = SandboxExecutor::new(provider, Duration::from_secs(30));

    let mut arguments = serde_json::Map::new();
    arguments.insert("faultCode".to_string(), json!("F02"));

    let result = executor.execute(&tool, &arguments).await.unwrap();
    assert!(!result.is_error);
}

#[tokio::test]
async fn tool_exception_is_reported_as_error_without_aborting_teardown() {
    if !python3_available() {
        eprintln!("skipping: no python3 on PATH");
        return;
    }

    let source = r#"
@mcp.tool(description='always fails')
def alwaysFails():
    raise ValueError("boom")
"#;
    let tool = build_tool("alwaysFails", source).unwrap();
    let provider = Arc::new(ProcessSandboxProvider::default());
    let executor = SandboxExecutor::new(provider, Duration::from_secs(30));

    let result = executor.execute(&tool, &serde_json::Map::new()).await.unwrap();
    assert!(result.is_error);
}

#[tokio::test]
async fn missing_required_argument_is_rejected_before_a_sandbox_is_created() {
    let source = r#"
@mcp.tool(description='requires an argument')
def needsArg(faultCode: str):
    pass
"#;
    let tool = build_tool("needsArg", source).unwrap();
    let provider = Arc::new(ProcessSandboxProvider::default());
    let executor = SandboxExecutor::new(provider, Duration::from_secs(30));

    let err = executor
        .execute(&tool, &serde_json::Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err.code, tool_box::errors::ErrorCode::ArgumentError));
}
