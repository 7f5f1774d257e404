//! Sandbox Executor (C3).
//!
//! A single-use, isolated execution session per call. The provider that
//! actually runs code is abstracted behind [`SandboxProvider`] so the host
//! (this crate) never depends on a specific sandbox backend — only on the
//! capability to install dependencies, run a code blob, and be killed.

mod literal;
mod process;

pub use process::ProcessSandboxProvider;

use crate::errors::{AppError, AppResult};
use crate::mcp::schema::ToolCallResult;
use crate::registry::Tool;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// A handle to one live, single-use sandbox session.
pub struct SandboxSession {
    pub id: Uuid,
    pub working_dir: std::path::PathBuf,
}

/// A structured failure raised by the tool body itself inside the sandbox,
/// as opposed to a failure to prepare or reach the sandbox at all.
#[derive(Debug, Clone)]
pub struct SandboxError {
    pub name: String,
    pub value: String,
    pub traceback: String,
}

/// The outcome of one `run_code` call.
pub struct ExecutionOutcome {
    /// Ordered, non-empty text chunks produced by the call. An empty
    /// sequence is a legitimate success result.
    pub results: Vec<String>,
    pub error: Option<SandboxError>,
}

/// Capability a sandbox backend must provide. Implementations own process
/// or network lifecycle; the executor only ever calls these three methods.
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    async fn create_session(&self) -> AppResult<SandboxSession>;
    async fn run_shell(&self, session: &SandboxSession, command: &str) -> AppResult<()>;
    async fn run_code(&self, session: &SandboxSession, code: &str) -> AppResult<ExecutionOutcome>;
    async fn kill(&self, session: SandboxSession) -> AppResult<()>;
}

/// Drives one tool call end to end: dependency install, call composition,
/// execution, result shaping, and guaranteed teardown.
pub struct SandboxExecutor {
    provider: Arc<dyn SandboxProvider>,
    timeout: Duration,
}

impl SandboxExecutor {
    pub fn new(provider: Arc<dyn SandboxProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Runs `tool` with `arguments`, always tearing the session down before
    /// returning — success, tool-level error, or infrastructure error alike.
    pub async fn execute(&self, tool: &Tool, arguments: &serde_json::Map<String, Value>) -> AppResult<ToolCallResult> {
        validate_arguments(tool, arguments)?;

        let session = self.provider.create_session().await?;
        let outcome = self.run_within_session(&session, tool, arguments).await;
        // Teardown happens on every exit path, including when `run_within_session`
        // itself returned an error.
        if let Err(teardown_err) = self.provider.kill(session).await {
            tracing::warn!(error = %teardown_err, "sandbox teardown failed");
        }

        let outcome = outcome?;
        match outcome.error {
            Some(sandbox_error) => {
                tracing::warn!(
                    tool = %tool.name,
                    name = %sandbox_error.name,
                    traceback = %sandbox_error.traceback,
                    "tool raised inside sandbox"
                );
                Ok(ToolCallResult::error(format!(
                    "{}: {}",
                    sandbox_error.name, sandbox_error.value
                )))
            }
            None => Ok(ToolCallResult::ok(outcome.results)),
        }
    }

    async fn run_within_session(
        &self,
        session: &SandboxSession,
        tool: &Tool,
        arguments: &serde_json::Map<String, Value>,
    ) -> AppResult<ExecutionOutcome> {
        for dependency in &tool.dependencies {
            let install_result = tokio::time::timeout(
                self.timeout,
                self.provider.run_shell(session, &format!("pip install --quiet {dependency}")),
            )
            .await
            .map_err(|_| AppError::timeout(format!("installing {dependency} timed out")))?;
            install_result.map_err(|err| AppError::dependency(format!("{dependency}: {err}")))?;
        }

        let call_expression = literal::build_call_expression(&tool.entry_symbol, arguments)?;
        let code = format!("{}\n{}", tool.source, call_expression);

        tokio::time::timeout(self.timeout, self.provider.run_code(session, &code))
            .await
            .map_err(|_| AppError::timeout(format!("tool {} exceeded its execution deadline", tool.name)))?
    }
}

fn validate_arguments(tool: &Tool, arguments: &serde_json::Map<String, Value>) -> AppResult<()> {
    if let Some(required) = &tool.descriptor.input_schema.required {
        for name in required {
            if !arguments.contains_key(name) {
                return Err(AppError::argument(format!(
                    "missing required argument `{name}` for tool `{}`",
                    tool.name
                )));
            }
        }
    }
    Ok(())
}
