//! A `SandboxProvider` backed by a local subprocess per session.
//!
//! Each call gets its own interpreter process and working directory; both
//! are discarded when `kill` runs. This is the default provider when no
//! `E2B_JUPYTER_HOST` is configured — good enough to exercise the full
//! executor contract without an external sandbox service.

use super::{ExecutionOutcome, SandboxError, SandboxProvider, SandboxSession};
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use tokio::process::Command;
use uuid::Uuid;

pub struct ProcessSandboxProvider {
    interpreter: String,
}

impl ProcessSandboxProvider {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Default for ProcessSandboxProvider {
    fn default() -> Self {
        Self::new("python3")
    }
}

#[async_trait]
impl SandboxProvider for ProcessSandboxProvider {
    async fn create_session(&self) -> AppResult<SandboxSession> {
        let id = Uuid::new_v4();
        let working_dir = std::env::temp_dir().join(format!("tool-box-sandbox-{id}"));
        tokio::fs::create_dir_all(&working_dir)
            .await
            .map_err(|err| AppError::internal(format!("failed to create sandbox working dir: {err}")))?;
        Ok(SandboxSession { id, working_dir })
    }

    async fn run_shell(&self, session: &SandboxSession, command: &str) -> AppResult<()> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&session.working_dir)
            .output()
            .await
            .map_err(|err| AppError::dependency(format!("failed to spawn shell: {err}")))?;
        if !output.status.success() {
            return Err(AppError::dependency(format!(
                "command `{command}` exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }

    async fn run_code(&self, session: &SandboxSession, code: &str) -> AppResult<ExecutionOutcome> {
        let script_path = session.working_dir.join("tool.py");
        tokio::fs::write(&script_path, code)
            .await
            .map_err(|err| AppError::internal(format!("failed to write tool source: {err}")))?;

        let output = Command::new(&self.interpreter)
            .arg(&script_path)
            .current_dir(&session.working_dir)
            .output()
            .await
            .map_err(|err| AppError::internal(format!("failed to spawn sandbox interpreter: {err}")))?;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let results = stdout
                .lines()
                .map(str::to_string)
                .filter(|line| !line.is_empty())
                .collect();
            Ok(ExecutionOutcome { results, error: None })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let (name, value) = split_traceback_summary(&stderr);
            Ok(ExecutionOutcome {
                results: Vec::new(),
                error: Some(SandboxError {
                    name,
                    value,
                    traceback: stderr,
                }),
            })
        }
    }

    async fn kill(&self, session: SandboxSession) -> AppResult<()> {
        tokio::fs::remove_dir_all(&session.working_dir)
            .await
            .map_err(|err| AppError::internal(format!("failed to tear down sandbox session: {err}")))
    }
}

/// The interpreter's final traceback line is conventionally `Name: value`;
/// anything that doesn't match that shape is reported under a generic name
/// with the whole line as the value.
fn split_traceback_summary(stderr: &str) -> (String, String) {
    let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
    match last_line.split_once(':') {
        Some((name, value)) if !name.contains(' ') => (name.trim().to_string(), value.trim().to_string()),
        _ => ("Error".to_string(), last_line.trim().to_string()),
    }
}
