//! Process-wide configuration, built once from the environment and handed
//! down as an `Arc<Config>` — never read back out of a global.

mod environment;

pub use environment::{CatalogBackend, CatalogConfig, Config, McpTransport, SandboxConfig, ServerConfig};
