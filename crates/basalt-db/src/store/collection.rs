//! SurrealDB implementation of [`SchemaStore`].
//!
//! Mapping documents are stored verbatim as FLEXIBLE objects; the
//! store never looks inside them.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use basalt_core::error::BasaltResult;
use basalt_core::store::SchemaStore;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct MappingRow {
    type_name: String,
    mapping: serde_json::Value,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB-backed collection mapping store.
#[derive(Clone)]
pub struct SurrealSchemaStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSchemaStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SchemaStore for SurrealSchemaStore<C> {
    async fn get_mapping(
        &self,
        tenant: &str,
        type_name: &str,
    ) -> BasaltResult<Option<serde_json::Value>> {
        let mut result = self
            .db
            .query(
                "SELECT type_name, mapping FROM collection_schema \
                 WHERE tenant = $tenant AND type_name = $type_name",
            )
            .bind(("tenant", tenant.to_string()))
            .bind(("type_name", type_name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MappingRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(|row| row.mapping))
    }

    async fn put_mapping(
        &self,
        tenant: &str,
        type_name: &str,
        mapping: serde_json::Value,
    ) -> BasaltResult<()> {
        let mut result = self
            .db
            .query(
                "UPDATE collection_schema SET \
                 mapping = $mapping, updated_at = time::now() \
                 WHERE tenant = $tenant AND type_name = $type_name",
            )
            .bind(("tenant", tenant.to_string()))
            .bind(("type_name", type_name.to_string()))
            .bind(("mapping", mapping.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        let updated: Vec<MappingRow> = result.take(0).map_err(DbError::from)?;
        if !updated.is_empty() {
            return Ok(());
        }

        let id = Uuid::new_v4().to_string();
        self.db
            .query(
                "CREATE type::record('collection_schema', $id) SET \
                 tenant = $tenant, type_name = $type_name, \
                 mapping = $mapping",
            )
            .bind(("id", id))
            .bind(("tenant", tenant.to_string()))
            .bind(("type_name", type_name.to_string()))
            .bind(("mapping", mapping))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_mappings(&self, tenant: &str) -> BasaltResult<Vec<(String, serde_json::Value)>> {
        let mut result = self
            .db
            .query(
                "SELECT type_name, mapping FROM collection_schema \
                 WHERE tenant = $tenant ORDER BY type_name",
            )
            .bind(("tenant", tenant.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MappingRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| (row.type_name, row.mapping))
            .collect())
    }

    async fn delete_mapping(&self, tenant: &str, type_name: &str) -> BasaltResult<()> {
        self.db
            .query(
                "DELETE collection_schema \
                 WHERE tenant = $tenant AND type_name = $type_name",
            )
            .bind(("tenant", tenant.to_string()))
            .bind(("type_name", type_name.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn delete_all(&self, tenant: &str) -> BasaltResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM collection_schema \
                 WHERE tenant = $tenant GROUP ALL",
            )
            .query("DELETE collection_schema WHERE tenant = $tenant")
            .bind(("tenant", tenant.to_string()))
            .await
            .map_err(DbError::from)?;

        let counts: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(counts.first().map(|c| c.total).unwrap_or(0))
    }
}
