//! MCP Surface (C5): JSON-RPC `list_tools` / `call_tool` over SSE and
//! streamable-HTTP transports.

pub mod handlers;
pub mod jsonrpc;
pub mod schema;
pub mod transport;

pub use handlers::McpState;
