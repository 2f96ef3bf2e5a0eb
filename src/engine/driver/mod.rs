//! The Catalog Driver (§4.1): owns the database handle, exposes typed
//! catalog queries and a per-object DDL lookup. Consumed by the rest of the
//! engine only through the [`CatalogDriver`] trait, so a mock can stand in
//! for tests that don't need a live database.

mod definitions;
mod discovery;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::engine::error::EngineError;
use crate::engine::types::ObjectDescriptor;
use crate::engine::types::ObjectType;

/// One row out of a discovery query, before the Planner applies the name
/// regex and deduplicates (§4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDiscoveryRow {
    pub schema: String,
    pub name: String,
    pub owning_table: Option<String>,
    /// Populated eagerly only for `Constraint` (§3: already known via
    /// `pg_get_constraintdef` at discovery time).
    pub definition: Option<String>,
}

/// The narrow capability set the Planner, Fetcher, and Exporter are allowed
/// to depend on (§9: interface over struct).
#[async_trait]
pub trait CatalogDriver: Send + Sync {
    async fn discover(
        &self,
        object_type: ObjectType,
        schema: &str,
    ) -> Result<Vec<RawDiscoveryRow>, EngineError>;

    async fn discover_database_wide(
        &self,
        object_type: ObjectType,
    ) -> Result<Vec<RawDiscoveryRow>, EngineError>;

    /// Non-system schemas, sorted, for resolving the `"ALL"` sentinel.
    async fn list_schemas(&self) -> Result<Vec<String>, EngineError>;

    async fn schema_exists(&self, schema: &str) -> Result<bool, EngineError>;

    async fn fetch_definition(&self, descriptor: &ObjectDescriptor) -> Result<String, EngineError>;
}

/// Production implementation backed by a pooled `sqlx` connection.
pub struct PgCatalogDriver {
    pool: PgPool,
}

impl PgCatalogDriver {
    /// Connects with a small, fixed pool (≈25 open, ≈5 idle per §4.1) and
    /// pings it once to surface connection failures early rather than on
    /// the first query.
    pub async fn connect(database_url: &str) -> Result<Self, EngineError> {
        let pool = PgPoolOptions::new()
            .max_connections(25)
            .min_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(EngineError::Connection)?;

        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(EngineError::Connection)?;

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogDriver for PgCatalogDriver {
    async fn discover(
        &self,
        object_type: ObjectType,
        schema: &str,
    ) -> Result<Vec<RawDiscoveryRow>, EngineError> {
        discovery::discover(&self.pool, object_type, schema).await
    }

    async fn discover_database_wide(
        &self,
        object_type: ObjectType,
    ) -> Result<Vec<RawDiscoveryRow>, EngineError> {
        discovery::discover_database_wide(&self.pool, object_type).await
    }

    async fn list_schemas(&self) -> Result<Vec<String>, EngineError> {
        let rows = sqlx::query(
            r#"
            SELECT schema_name
            FROM information_schema.schemata
            WHERE schema_name NOT LIKE 'pg\_%'
              AND schema_name <> 'information_schema'
            ORDER BY schema_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(EngineError::Query)?;

        Ok(rows.into_iter().map(|r| r.get("schema_name")).collect())
    }

    async fn schema_exists(&self, schema: &str) -> Result<bool, EngineError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM information_schema.schemata WHERE schema_name = $1) AS present",
        )
        .bind(schema)
        .fetch_one(&self.pool)
        .await
        .map_err(EngineError::Query)?;

        Ok(row.get("present"))
    }

    async fn fetch_definition(&self, descriptor: &ObjectDescriptor) -> Result<String, EngineError> {
        definitions::fetch_definition(&self.pool, descriptor).await
    }
}
