//! Read-only, file-backed catalog. The file is loaded once at start-up;
//! `insert`/`delete` succeed without mutating it, since the deployment
//! chose `STORE_IN_FILE` precisely to keep the on-disk catalog static.

use super::{Catalog, CatalogRow};
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct FileRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(default = "default_owner")]
    owner_id: String,
    name: String,
    source: String,
}

fn default_owner() -> String {
    "file".to_string()
}

pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Catalog for FileCatalog {
    async fn load_all(&self) -> AppResult<Vec<CatalogRow>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "catalog file not found, starting empty");
                return Ok(Vec::new());
            }
            Err(err) => return Err(AppError::catalog(format!("failed to read catalog file: {err}"))),
        };
        let rows: Vec<FileRow> = serde_json::from_str(&contents)
            .map_err(|err| AppError::catalog(format!("malformed catalog file: {err}")))?;
        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(idx, row)| CatalogRow {
                id: row.id.unwrap_or_else(|| idx.to_string()),
                owner_id: row.owner_id,
                name: row.name,
                source: row.source,
            })
            .collect())
    }

    async fn insert(&self, row: CatalogRow) -> AppResult<()> {
        tracing::info!(tool = %row.name, "file catalog is read-only, not persisting add");
        Ok(())
    }

    async fn delete(&self, name: &str) -> AppResult<()> {
        tracing::info!(tool = name, "file catalog is read-only, not persisting remove");
        Ok(())
    }
}
