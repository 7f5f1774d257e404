//! Catalog Store (C1): the durable `{name -> source}` map tools are loaded
//! from at start-up and written to by the control plane.

mod file;
mod relational;

pub use file::FileCatalog;
pub use relational::RelationalCatalog;

use crate::errors::AppResult;
use async_trait::async_trait;

/// One row as it is stored: `(id, owner_id, name, source)`.
#[derive(Debug, Clone)]
pub struct CatalogRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub source: String,
}

/// Durable persistence for the tool catalog. Implementations are either a
/// read-only file snapshot or a relational store with real writes.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn load_all(&self) -> AppResult<Vec<CatalogRow>>;
    async fn insert(&self, row: CatalogRow) -> AppResult<()>;
    async fn delete(&self, name: &str) -> AppResult<()>;
}
