use crate::logging::LogLevel;
use std::time::Duration;

/// Which catalog implementation backs the running process.
#[derive(Debug, Clone)]
pub enum CatalogBackend {
    /// `STORE_IN_FILE=true` — read-only JSON file loaded once at start-up.
    File { path: String },
    /// Relational store (SQLite by default, PostgreSQL with `DATABASE_URL`
    /// pointed at one and the `catalog-postgres` feature enabled).
    Relational { database_url: String },
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub backend: CatalogBackend,
}

impl CatalogConfig {
    fn from_env() -> Self {
        let store_in_file = std::env::var("STORE_IN_FILE")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if store_in_file {
            let path = std::env::var("MCP_TOOL_CONFIG_PATH")
                .unwrap_or_else(|_| "./config/mcp-tool.json".to_string());
            CatalogConfig {
                backend: CatalogBackend::File { path },
            }
        } else {
            let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
                let host = std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".into());
                let port = std::env::var("DB_PORT").unwrap_or_else(|_| "5432".into());
                let name = std::env::var("DB_NAME").unwrap_or_else(|_| "mcpbox".into());
                let user = std::env::var("DB_USER").unwrap_or_else(|_| "postgres".into());
                let password = std::env::var("DB_PASSWORD").unwrap_or_default();
                format!("postgres://{user}:{password}@{host}:{port}/{name}")
            });
            CatalogConfig {
                backend: CatalogBackend::Relational { database_url },
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Address of the out-of-process sandbox host, if any. Unset means the
    /// in-process `ProcessSandboxProvider` is used directly.
    pub debug_host: Option<String>,
    pub call_timeout: Duration,
}

impl SandboxConfig {
    fn from_env() -> Self {
        let debug_host = std::env::var("E2B_JUPYTER_HOST").ok();
        let call_timeout = std::env::var("SANDBOX_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(300));
        SandboxConfig {
            debug_host,
            call_timeout,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub mcp_port: u16,
    pub log_level: LogLevel,
    pub json_logs: bool,
    pub transport: McpTransport,
}

/// Which MCP wire transport the control plane advertises as `transport` in
/// its `add_mcp_tool` reply. Both are always routed regardless of this
/// setting — it only picks the URL shape a fresh client is told to dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpTransport {
    Sse,
    StreamableHttp,
}

impl McpTransport {
    pub fn as_str(self) -> &'static str {
        match self {
            McpTransport::Sse => "sse",
            McpTransport::StreamableHttp => "streamable_http",
        }
    }

    fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "streamable_http" | "streamable-http" | "http" => McpTransport::StreamableHttp,
            _ => McpTransport::Sse,
        }
    }
}

impl ServerConfig {
    /// The control plane always binds one port above the MCP surface.
    pub fn control_plane_port(&self) -> u16 {
        self.mcp_port + 1
    }

    /// The URL a caller should connect to for the configured transport.
    pub fn mcp_box_url(&self) -> String {
        match self.transport {
            McpTransport::Sse => format!("http://{}:{}/sse", self.host, self.mcp_port),
            McpTransport::StreamableHttp => format!("http://{}:{}/", self.host, self.mcp_port),
        }
    }

    fn from_env() -> Self {
        let host = std::env::var("MCP_BOX_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let mcp_port = std::env::var("MCP_BOX_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8000);
        let log_level =
            LogLevel::from_str_or_default(&std::env::var("LOG_LEVEL").unwrap_or_default());
        let json_logs = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let transport = McpTransport::from_str_or_default(&std::env::var("MCP_TRANSPORT").unwrap_or_default());
        ServerConfig {
            host,
            mcp_port,
            log_level,
            json_logs,
            transport,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub sandbox: SandboxConfig,
}

impl Config {
    /// Builds the process-wide configuration from environment variables.
    ///
    /// Called exactly once, in `main`; the resulting value is threaded down
    /// through `Arc`, never re-read from the environment afterwards.
    pub fn from_env() -> Self {
        Config {
            server: ServerConfig::from_env(),
            catalog: CatalogConfig::from_env(),
            sandbox: SandboxConfig::from_env(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "host={} mcp_port={} control_plane_port={} catalog={} sandbox_host={}",
            self.server.host,
            self.server.mcp_port,
            self.server.control_plane_port(),
            match &self.catalog.backend {
                CatalogBackend::File { path } => format!("file:{path}"),
                CatalogBackend::Relational { database_url } => {
                    let scheme = database_url.split("://").next().unwrap_or("relational");
                    format!("relational:{scheme}")
                }
            },
            self.sandbox.debug_host.as_deref().unwrap_or("in-process"),
        )
    }
}
