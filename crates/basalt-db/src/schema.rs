//! Table definitions and migration runner for SurrealDB.
//!
//! Credential and mapping tables are SCHEMAFULL; mapping documents are
//! stored as FLEXIBLE objects since their shape is tenant-defined.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Credentials (tenant scope)
-- =======================================================================
DEFINE TABLE credential SCHEMAFULL;
DEFINE FIELD tenant ON TABLE credential TYPE string;
DEFINE FIELD name ON TABLE credential TYPE string;
DEFINE FIELD hashed_password ON TABLE credential TYPE option<string>;
DEFINE FIELD roles ON TABLE credential TYPE array DEFAULT [];
DEFINE FIELD roles.* ON TABLE credential TYPE string;
DEFINE FIELD enabled ON TABLE credential TYPE bool DEFAULT true;
DEFINE FIELD access_token ON TABLE credential TYPE option<string>;
DEFINE FIELD access_token_expires_at ON TABLE credential \
    TYPE option<datetime>;
DEFINE FIELD password_reset_code ON TABLE credential \
    TYPE option<string>;
DEFINE FIELD password_reset_expires_at ON TABLE credential \
    TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE credential TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE credential TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_credential_tenant_name ON TABLE credential \
    COLUMNS tenant, name UNIQUE;
DEFINE INDEX idx_credential_tenant_token ON TABLE credential \
    COLUMNS tenant, access_token;

-- =======================================================================
-- Collection mappings (tenant scope)
-- =======================================================================
DEFINE TABLE collection_schema SCHEMAFULL;
DEFINE FIELD tenant ON TABLE collection_schema TYPE string;
DEFINE FIELD type_name ON TABLE collection_schema TYPE string;
DEFINE FIELD mapping ON TABLE collection_schema TYPE object FLEXIBLE;
DEFINE FIELD created_at ON TABLE collection_schema TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE collection_schema TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_collection_schema_tenant_type ON TABLE \
    collection_schema COLUMNS tenant, type_name UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(version = migration.version, "Migration applied");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn schema_defines_uniqueness_on_login_and_type() {
        assert!(SCHEMA_V1.contains("COLUMNS tenant, name UNIQUE"));
        assert!(SCHEMA_V1.contains("COLUMNS tenant, type_name UNIQUE"));
    }
}
