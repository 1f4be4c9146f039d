//! SurrealDB implementation of [`CredentialStore`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use basalt_core::error::{BasaltError, BasaltResult};
use basalt_core::models::credential::Credential;
use basalt_core::store::CredentialStore;

use crate::error::DbError;

/// DB-side row struct, field-for-field with the `credential` table.
#[derive(Debug, SurrealValue)]
struct CredentialRow {
    tenant: String,
    name: String,
    hashed_password: Option<String>,
    roles: Vec<String>,
    enabled: bool,
    access_token: Option<String>,
    access_token_expires_at: Option<DateTime<Utc>>,
    password_reset_code: Option<String>,
    password_reset_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CredentialRow> for Credential {
    fn from(row: CredentialRow) -> Self {
        Credential {
            tenant: row.tenant,
            name: row.name,
            hashed_password: row.hashed_password,
            roles: row.roles,
            enabled: row.enabled,
            access_token: row.access_token,
            access_token_expires_at: row.access_token_expires_at,
            password_reset_code: row.password_reset_code,
            password_reset_expires_at: row.password_reset_expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

const SET_CLAUSE: &str = "\
    tenant = $tenant, \
    name = $name, \
    hashed_password = $hashed_password, \
    roles = $roles, \
    enabled = $enabled, \
    access_token = $access_token, \
    access_token_expires_at = $access_token_expires_at, \
    password_reset_code = $password_reset_code, \
    password_reset_expires_at = $password_reset_expires_at, \
    created_at = $created_at, \
    updated_at = $updated_at";

/// SurrealDB-backed credential store.
#[derive(Clone)]
pub struct SurrealCredentialStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCredentialStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CredentialStore for SurrealCredentialStore<C> {
    async fn find_by_login(&self, tenant: &str, name: &str) -> BasaltResult<Option<Credential>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM credential \
                 WHERE tenant = $tenant AND name = $name",
            )
            .bind(("tenant", tenant.to_string()))
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CredentialRow> = result.take(0).map_err(DbError::from)?;
        if rows.len() > 1 {
            return Err(BasaltError::InternalConsistency {
                detail: format!(
                    "found {} credentials named [{name}] in tenant [{tenant}]",
                    rows.len()
                ),
            });
        }
        Ok(rows.into_iter().next().map(Credential::from))
    }

    async fn find_by_token(&self, tenant: &str, token: &str) -> BasaltResult<Option<Credential>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM credential \
                 WHERE tenant = $tenant AND access_token = $access_token",
            )
            .bind(("tenant", tenant.to_string()))
            .bind(("access_token", token.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CredentialRow> = result.take(0).map_err(DbError::from)?;
        let credential = rows.into_iter().next().map(Credential::from);

        // An expired token is indistinguishable from an unknown one.
        match credential {
            Some(c) if c.access_token_expires_at.is_some_and(|at| at > Utc::now()) => Ok(Some(c)),
            _ => Ok(None),
        }
    }

    async fn save(&self, credential: &Credential) -> BasaltResult<()> {
        // Upsert keyed on (tenant, name): update in place, create with
        // a fresh record id when nothing matched.
        let mut result = self
            .db
            .query(format!(
                "UPDATE credential SET {SET_CLAUSE} \
                 WHERE tenant = $tenant AND name = $name"
            ))
            .bind(("tenant", credential.tenant.clone()))
            .bind(("name", credential.name.clone()))
            .bind(("hashed_password", credential.hashed_password.clone()))
            .bind(("roles", credential.roles.clone()))
            .bind(("enabled", credential.enabled))
            .bind(("access_token", credential.access_token.clone()))
            .bind((
                "access_token_expires_at",
                credential.access_token_expires_at,
            ))
            .bind((
                "password_reset_code",
                credential.password_reset_code.clone(),
            ))
            .bind((
                "password_reset_expires_at",
                credential.password_reset_expires_at,
            ))
            .bind(("created_at", credential.created_at))
            .bind(("updated_at", credential.updated_at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        let updated: Vec<CredentialRow> = result.take(0).map_err(DbError::from)?;
        if !updated.is_empty() {
            return Ok(());
        }

        let id = Uuid::new_v4().to_string();
        self.db
            .query(format!(
                "CREATE type::record('credential', $id) SET {SET_CLAUSE}"
            ))
            .bind(("id", id))
            .bind(("tenant", credential.tenant.clone()))
            .bind(("name", credential.name.clone()))
            .bind(("hashed_password", credential.hashed_password.clone()))
            .bind(("roles", credential.roles.clone()))
            .bind(("enabled", credential.enabled))
            .bind((
                "access_token_expires_at",
                credential.access_token_expires_at,
            ))
            .bind(("access_token", credential.access_token.clone()))
            .bind((
                "password_reset_code",
                credential.password_reset_code.clone(),
            ))
            .bind((
                "password_reset_expires_at",
                credential.password_reset_expires_at,
            ))
            .bind(("created_at", credential.created_at))
            .bind(("updated_at", credential.updated_at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn delete(&self, tenant: &str, name: &str) -> BasaltResult<()> {
        self.db
            .query(
                "DELETE credential \
                 WHERE tenant = $tenant AND name = $name",
            )
            .bind(("tenant", tenant.to_string()))
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn delete_all(&self, tenant: &str) -> BasaltResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM credential WHERE tenant = $tenant GROUP ALL")
            .query("DELETE credential WHERE tenant = $tenant")
            .bind(("tenant", tenant.to_string()))
            .await
            .map_err(DbError::from)?;

        let counts: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(counts.first().map(|c| c.total).unwrap_or(0))
    }
}
