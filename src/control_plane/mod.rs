//! Control Plane (C6): a side HTTP API, bound one port above the MCP
//! surface, for injecting and retracting tools at runtime.
//!
//! Routes and result codes follow the reference contract exactly:
//!
//! | route | result | meaning |
//! |---|---|---|
//! | `POST /add_mcp_tool/?mcp_tool_name=NAME` | `0` | registered |
//! | | `1` | name already registered |
//! | | `2` | source failed to parse |
//! | `POST /remove_mcp_tool/?mcp_tool_name=NAME` | `0` | removed |
//! | | `1` | name was not registered |

use crate::bootstrap::{build_tool, AppState};
use crate::catalog::CatalogRow;
use crate::parser::normalize_posted_source;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use uuid::Uuid;
use warp::{Filter, Rejection, Reply};

#[derive(Debug, Deserialize)]
struct NameQuery {
    mcp_tool_name: String,
}

#[derive(Debug, Serialize)]
struct ControlPlaneResponse {
    result: u8,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    transport: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mcp_box_url: Option<String>,
}

impl ControlPlaneResponse {
    fn ok(transport: &'static str, mcp_box_url: String) -> Self {
        Self {
            result: 0,
            error: String::new(),
            transport: Some(transport),
            mcp_box_url: Some(mcp_box_url),
        }
    }

    fn failure(result: u8, error: String) -> Self {
        Self {
            result,
            error,
            transport: None,
            mcp_box_url: None,
        }
    }

    /// Success with no transport descriptor to report, used by `remove`.
    fn plain_ok() -> Self {
        Self {
            result: 0,
            error: String::new(),
            transport: None,
            mcp_box_url: None,
        }
    }
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Adds a tool to both the catalog and the registry, in that order, with a
/// best-effort rollback of the catalog write if the registry insert fails.
async fn add_mcp_tool(query: NameQuery, body: bytes::Bytes, state: AppState) -> Result<impl Reply, Infallible> {
    let raw_source = String::from_utf8_lossy(&body).to_string();
    let source = normalize_posted_source(&raw_source);
    let name = query.mcp_tool_name;

    if state.registry.contains(&name).await {
        return Ok(warp::reply::json(&ControlPlaneResponse::failure(
            1,
            format!("tool already registered: {name}"),
        )));
    }

    let tool = match build_tool(&name, &source) {
        Ok(tool) => tool,
        Err(err) => {
            tracing::warn!(tool = %name, error = %err, "rejected unparsable tool source");
            return Ok(warp::reply::json(&ControlPlaneResponse::failure(2, err.message)));
        }
    };

    let row = CatalogRow {
        id: Uuid::new_v4().to_string(),
        owner_id: "control-plane".to_string(),
        name: name.clone(),
        source: source.clone(),
    };
    if let Err(err) = state.catalog.insert(row).await {
        tracing::error!(tool = %name, error = %err, "failed to persist tool to catalog");
        return Ok(warp::reply::json(&ControlPlaneResponse::failure(1, err.message)));
    }

    if let Err(err) = state.registry.register(tool).await {
        tracing::error!(tool = %name, error = %err, "registry rejected tool after catalog write, rolling back");
        if let Err(rollback_err) = state.catalog.delete(&name).await {
            tracing::warn!(tool = %name, error = %rollback_err, "catalog rollback failed");
        }
        return Ok(warp::reply::json(&ControlPlaneResponse::failure(1, err.message)));
    }

    let mcp_box_url = state.config.server.mcp_box_url();
    Ok(warp::reply::json(&ControlPlaneResponse::ok(
        state.config.server.transport.as_str(),
        mcp_box_url,
    )))
}

async fn remove_mcp_tool(query: NameQuery, state: AppState) -> Result<impl Reply, Infallible> {
    let name = query.mcp_tool_name;
    if !state.registry.contains(&name).await {
        return Ok(warp::reply::json(&ControlPlaneResponse::failure(
            1,
            format!("tool not registered: {name}"),
        )));
    }

    if let Err(err) = state.registry.unregister(&name).await {
        return Ok(warp::reply::json(&ControlPlaneResponse::failure(1, err.message)));
    }
    if let Err(err) = state.catalog.delete(&name).await {
        tracing::warn!(tool = %name, error = %err, "catalog delete failed after registry removal");
    }

    Ok(warp::reply::json(&ControlPlaneResponse::plain_ok()))
}

pub fn routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let add = warp::path("add_mcp_tool")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<NameQuery>())
        .and(warp::body::bytes())
        .and(with_state(state.clone()))
        .and_then(add_mcp_tool);

    let remove = warp::path("remove_mcp_tool")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<NameQuery>())
        .and(with_state(state))
        .and_then(remove_mcp_tool);

    add.or(remove)
}
