//! Crate-wide error type and the status codes it carries across process boundaries.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use warp::http::StatusCode;

/// Coarse category for an [`AppError`], used to pick an HTTP status and to
/// decide how much detail is safe to hand back to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The posted tool source could not be parsed into a descriptor.
    ParseError,
    /// `add_mcp_tool` was called with a name already present in the registry.
    DuplicateTool,
    /// `call_tool` / `remove_mcp_tool` referenced a name not in the registry.
    UnknownTool,
    /// A declared dependency failed to install in the sandbox.
    DependencyError,
    /// Supplied arguments did not match the tool's input schema.
    ArgumentError,
    /// The sandbox exceeded its execution deadline.
    TimeoutError,
    /// The tool body raised inside the sandbox.
    ToolExecutionError,
    /// The catalog store could not complete a read or write.
    CatalogError,
    /// Anything else.
    InternalError,
}

impl ErrorCode {
    pub const fn http_status(self) -> StatusCode {
        match self {
            ErrorCode::ParseError | ErrorCode::ArgumentError => StatusCode::BAD_REQUEST,
            ErrorCode::DuplicateTool => StatusCode::CONFLICT,
            ErrorCode::UnknownTool => StatusCode::NOT_FOUND,
            ErrorCode::TimeoutError => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::DependencyError | ErrorCode::ToolExecutionError => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::CatalogError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Result code used by the control plane's `{result, error}` envelope.
    ///
    /// `0` is reserved for success and is never produced here.
    pub const fn control_plane_result(self) -> u8 {
        match self {
            ErrorCode::ParseError => 2,
            ErrorCode::DuplicateTool | ErrorCode::UnknownTool => 1,
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ParseError => "parse_error",
            ErrorCode::DuplicateTool => "duplicate_tool",
            ErrorCode::UnknownTool => "unknown_tool",
            ErrorCode::DependencyError => "dependency_error",
            ErrorCode::ArgumentError => "argument_error",
            ErrorCode::TimeoutError => "timeout_error",
            ErrorCode::ToolExecutionError => "tool_execution_error",
            ErrorCode::CatalogError => "catalog_error",
            ErrorCode::InternalError => "internal_error",
        };
        write!(f, "{s}")
    }
}

/// The single error type that crosses module boundaries in this crate.
#[derive(Debug, Clone, Error)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    pub fn duplicate_tool(name: &str) -> Self {
        Self::new(ErrorCode::DuplicateTool, format!("tool already registered: {name}"))
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ErrorCode::UnknownTool, format!("unknown tool: {name}"))
    }

    pub fn dependency(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DependencyError, message)
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ArgumentError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TimeoutError, message)
    }

    pub fn tool_execution(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ToolExecutionError, message)
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CatalogError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::catalog(err.to_string())
    }
}

impl warp::reject::Reject for AppError {}

/// Wire shape for the JSON body returned by failed HTTP responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code.to_string(),
            message: err.message.clone(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
