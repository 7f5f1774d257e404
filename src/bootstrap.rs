//! Wires the catalog, registry, sandbox and transports together at
//! start-up. Kept separate from `main` so integration tests can build the
//! same graph against a temporary catalog.

use crate::catalog::Catalog;
use crate::config::{CatalogBackend, Config};
use crate::errors::AppResult;
use crate::parser;
use crate::registry::{Tool, ToolRegistry};
use crate::sandbox::{ProcessSandboxProvider, SandboxExecutor, SandboxProvider};
use std::sync::Arc;

/// Everything a request handler needs, shared across both the MCP surface
/// and the control plane.
#[derive(Clone)]
pub struct AppState {
    pub registry: ToolRegistry,
    pub catalog: Arc<dyn Catalog>,
    pub executor: Arc<SandboxExecutor>,
    pub config: Arc<Config>,
}

/// Builds the catalog implementation selected by `config`.
pub async fn build_catalog(config: &Config) -> AppResult<Arc<dyn Catalog>> {
    match &config.catalog.backend {
        CatalogBackend::File { path } => Ok(Arc::new(crate::catalog::FileCatalog::new(path))),
        CatalogBackend::Relational { database_url } => {
            Ok(Arc::new(crate::catalog::RelationalCatalog::connect(database_url).await?))
        }
    }
}

/// Loads every row from `catalog` into `registry`, parsing each source as
/// it goes. A row that fails to parse is logged and skipped rather than
/// aborting start-up — one malformed tool should not take the whole
/// catalog down.
pub async fn load_catalog_into_registry(catalog: &dyn Catalog, registry: &ToolRegistry) -> AppResult<()> {
    for row in catalog.load_all().await? {
        match build_tool(&row.name, &row.source) {
            Ok(tool) => {
                if let Err(err) = registry.register(tool).await {
                    tracing::warn!(tool = %row.name, error = %err, "skipping catalog row, already registered");
                }
            }
            Err(err) => {
                tracing::warn!(tool = %row.name, error = %err, "skipping unparsable catalog row");
            }
        }
    }
    Ok(())
}

/// Parses `source` into a fully-formed [`Tool`] ready for the registry.
///
/// Enforces that the catalog/control-plane name and the parsed entry symbol
/// agree (I1) — a mismatch means the posted name does not refer to the
/// function the source actually defines, which is a parse-level failure,
/// not a registry one.
pub fn build_tool(name: &str, source: &str) -> AppResult<Tool> {
    let dependencies = parser::parse_requirements(source);
    let entry_symbol = parser::entry_symbol(source)?;
    if entry_symbol != name {
        return Err(crate::errors::AppError::parse(format!(
            "tool name `{name}` does not match entry symbol `{entry_symbol}`"
        )));
    }
    let descriptor = parser::parse_descriptor(source)?;
    let stripped_source = parser::strip_decorator(source)?;
    Ok(Tool {
        name: name.to_string(),
        source: stripped_source,
        descriptor,
        dependencies,
        entry_symbol,
    })
}

/// Builds the default sandbox provider, selecting an out-of-process host if
/// one is configured, otherwise the in-process provider.
pub fn build_sandbox_provider(config: &Config) -> Arc<dyn SandboxProvider> {
    match &config.sandbox.debug_host {
        Some(host) => {
            tracing::info!(host = %host, "sandbox host configured but no remote provider compiled in, falling back to local process sandbox");
            Arc::new(ProcessSandboxProvider::default())
        }
        None => Arc::new(ProcessSandboxProvider::default()),
    }
}

pub async fn build_app_state(config: Arc<Config>) -> AppResult<AppState> {
    let catalog = build_catalog(&config).await?;
    let registry = ToolRegistry::new();
    load_catalog_into_registry(catalog.as_ref(), &registry).await?;
    let provider = build_sandbox_provider(&config);
    let executor = Arc::new(SandboxExecutor::new(provider, config.sandbox.call_timeout));
    Ok(AppState {
        registry,
        catalog,
        executor,
        config,
    })
}
