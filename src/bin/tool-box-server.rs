use clap::Parser;
use std::sync::Arc;
use tool_box::bootstrap::build_app_state;
use tool_box::config::{CatalogBackend, Config};
use tool_box::{control_plane, logging, mcp};
use warp::Filter;

#[derive(Parser, Debug)]
#[command(name = "tool-box-server", about = "MCP server with a dynamically mutable sandboxed tool catalog")]
struct Args {
    /// Overrides MCP_BOX_HOST.
    #[arg(long, env = "MCP_BOX_HOST")]
    host: Option<String>,

    /// Overrides MCP_BOX_PORT.
    #[arg(long, env = "MCP_BOX_PORT")]
    port: Option<u16>,

    /// Overrides STORE_IN_FILE, selecting the read-only file catalog.
    #[arg(long)]
    store_in_file: bool,

    /// Overrides MCP_TOOL_CONFIG_PATH, the path read when `--store-in-file` is set.
    #[arg(long)]
    config_path: Option<String>,
}

/// Falls back to environment-only defaults if argument parsing fails,
/// rather than refusing to start the server.
fn parse_args_or_default() -> Args {
    Args::try_parse().unwrap_or_else(|err| {
        eprintln!("failed to parse arguments, falling back to environment defaults: {err}");
        Args {
            host: None,
            port: None,
            store_in_file: false,
            config_path: None,
        }
    })
}

fn apply_overrides(mut config: Config, args: &Args) -> Config {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.mcp_port = port;
    }
    if args.store_in_file {
        let path = args
            .config_path
            .clone()
            .unwrap_or_else(|| "./config/mcp-tool.json".to_string());
        config.catalog.backend = CatalogBackend::File { path };
    } else if let Some(path) = &args.config_path {
        if let CatalogBackend::File { path: existing } = &mut config.catalog.backend {
            *existing = path.clone();
        }
    }
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args_or_default();
    let config = apply_overrides(Config::from_env(), &args);

    logging::init(config.server.log_level, config.json_logs);
    tracing::info!(summary = %config.summary(), "starting tool-box-server");

    let config = Arc::new(config);
    let state = build_app_state(config.clone()).await?;

    let mcp_host: std::net::IpAddr = config.server.host.parse()?;
    let mcp_addr = (mcp_host, config.server.mcp_port);
    let control_plane_addr = (mcp_host, config.server.control_plane_port());

    let mcp_routes = mcp::transport::routes(state.clone());
    let control_plane_routes = control_plane::routes(state);

    let mcp_server = warp::serve(mcp_routes).run(mcp_addr);
    let control_plane_server = warp::serve(control_plane_routes).run(control_plane_addr);

    tracing::info!(?mcp_addr, ?control_plane_addr, "listening");
    tokio::join!(mcp_server, control_plane_server);
    Ok(())
}
