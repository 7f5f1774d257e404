//! Relational catalog backend. SQLite is always available; PostgreSQL is
//! compiled in behind the `catalog-postgres` feature, following the
//! enum-of-backends shape a dual-database factory uses elsewhere in this
//! codebase's ancestry.

use super::{Catalog, CatalogRow};
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

#[cfg(feature = "catalog-postgres")]
use sqlx::{postgres::PgPoolOptions, PgPool};

const CREATE_TABLE_SQLITE: &str = r#"
CREATE TABLE IF NOT EXISTS agents_mcp_box (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    name TEXT NOT NULL UNIQUE,
    source_text TEXT NOT NULL
)
"#;

enum Backend {
    Sqlite(SqlitePool),
    #[cfg(feature = "catalog-postgres")]
    Postgres(PgPool),
}

pub struct RelationalCatalog {
    backend: Backend,
}

impl RelationalCatalog {
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        #[cfg(feature = "catalog-postgres")]
        if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .map_err(|err| AppError::catalog(format!("failed to connect to postgres: {err}")))?;
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS agents_mcp_box (
                    id TEXT PRIMARY KEY,
                    owner_id TEXT NOT NULL,
                    name TEXT NOT NULL UNIQUE,
                    source_text TEXT NOT NULL
                )
                "#,
            )
            .execute(&pool)
            .await
            .map_err(|err| AppError::catalog(format!("failed to migrate catalog table: {err}")))?;
            return Ok(Self {
                backend: Backend::Postgres(pool),
            });
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|err| AppError::catalog(format!("failed to connect to sqlite: {err}")))?;
        sqlx::query(CREATE_TABLE_SQLITE)
            .execute(&pool)
            .await
            .map_err(|err| AppError::catalog(format!("failed to migrate catalog table: {err}")))?;
        Ok(Self {
            backend: Backend::Sqlite(pool),
        })
    }
}

#[async_trait]
impl Catalog for RelationalCatalog {
    async fn load_all(&self) -> AppResult<Vec<CatalogRow>> {
        match &self.backend {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query("SELECT id, owner_id, name, source_text FROM agents_mcp_box")
                    .fetch_all(pool)
                    .await?;
                Ok(rows
                    .into_iter()
                    .map(|row| CatalogRow {
                        id: row.get("id"),
                        owner_id: row.get("owner_id"),
                        name: row.get("name"),
                        source: row.get("source_text"),
                    })
                    .collect())
            }
            #[cfg(feature = "catalog-postgres")]
            Backend::Postgres(pool) => {
                let rows = sqlx::query("SELECT id, owner_id, name, source_text FROM agents_mcp_box")
                    .fetch_all(pool)
                    .await?;
                Ok(rows
                    .into_iter()
                    .map(|row| CatalogRow {
                        id: row.get("id"),
                        owner_id: row.get("owner_id"),
                        name: row.get("name"),
                        source: row.get("source_text"),
                    })
                    .collect())
            }
        }
    }

    async fn insert(&self, row: CatalogRow) -> AppResult<()> {
        match &self.backend {
            Backend::Sqlite(pool) => {
                sqlx::query("INSERT INTO agents_mcp_box (id, owner_id, name, source_text) VALUES (?, ?, ?, ?)")
                    .bind(&row.id)
                    .bind(&row.owner_id)
                    .bind(&row.name)
                    .bind(&row.source)
                    .execute(pool)
                    .await?;
            }
            #[cfg(feature = "catalog-postgres")]
            Backend::Postgres(pool) => {
                sqlx::query("INSERT INTO agents_mcp_box (id, owner_id, name, source_text) VALUES ($1, $2, $3, $4)")
                    .bind(&row.id)
                    .bind(&row.owner_id)
                    .bind(&row.name)
                    .bind(&row.source)
                    .execute(pool)
                    .await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, name: &str) -> AppResult<()> {
        match &self.backend {
            Backend::Sqlite(pool) => {
                sqlx::query("DELETE FROM agents_mcp_box WHERE name = ?")
                    .bind(name)
                    .execute(pool)
                    .await?;
            }
            #[cfg(feature = "catalog-postgres")]
            Backend::Postgres(pool) => {
                sqlx::query("DELETE FROM agents_mcp_box WHERE name = $1")
                    .bind(name)
                    .execute(pool)
                    .await?;
            }
        }
        Ok(())
    }
}
