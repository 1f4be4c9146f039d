//! Store trait definitions for the storage collaborator.
//!
//! All store operations are async and tenant-scoped. Lookups return
//! `Option` for absence; only invariant violations (e.g. a duplicate
//! login) surface as errors. Consistency guarantees such as
//! read-after-write and uniqueness enforcement are delegated to the
//! implementation.

use serde_json::Value;

use crate::error::BasaltResult;
use crate::models::credential::Credential;

/// Persistence for credential records: one partition per tenant plus
/// one for the root tenant.
pub trait CredentialStore: Send + Sync {
    /// Exact, case-sensitive lookup by login name. More than one
    /// stored match is an internal-consistency fault.
    fn find_by_login(
        &self,
        tenant: &str,
        name: &str,
    ) -> impl Future<Output = BasaltResult<Option<Credential>>> + Send;

    /// Lookup by bearer access token. Expired tokens are reported as
    /// not found, never as a distinct error.
    fn find_by_token(
        &self,
        tenant: &str,
        token: &str,
    ) -> impl Future<Output = BasaltResult<Option<Credential>>> + Send;

    /// Upsert keyed on `(tenant, name)`; login uniqueness within a
    /// tenant is enforced at write time.
    fn save(&self, credential: &Credential) -> impl Future<Output = BasaltResult<()>> + Send;

    fn delete(&self, tenant: &str, name: &str) -> impl Future<Output = BasaltResult<()>> + Send;

    /// Cascading removal used by tenant deletion. Returns the number
    /// of credentials removed.
    fn delete_all(&self, tenant: &str) -> impl Future<Output = BasaltResult<u64>> + Send;
}

/// Persistence for translated collection mappings: one mapping per
/// declared collection type per tenant. The store reads and writes
/// mapping documents verbatim; it never interprets them.
pub trait SchemaStore: Send + Sync {
    fn get_mapping(
        &self,
        tenant: &str,
        type_name: &str,
    ) -> impl Future<Output = BasaltResult<Option<Value>>> + Send;

    fn put_mapping(
        &self,
        tenant: &str,
        type_name: &str,
        mapping: Value,
    ) -> impl Future<Output = BasaltResult<()>> + Send;

    /// All mappings declared for a tenant, as `(type name, mapping)`
    /// pairs.
    fn list_mappings(
        &self,
        tenant: &str,
    ) -> impl Future<Output = BasaltResult<Vec<(String, Value)>>> + Send;

    fn delete_mapping(
        &self,
        tenant: &str,
        type_name: &str,
    ) -> impl Future<Output = BasaltResult<()>> + Send;

    /// Cascading removal used by tenant deletion. Returns the number
    /// of mappings removed.
    fn delete_all(&self, tenant: &str) -> impl Future<Output = BasaltResult<u64>> + Send;
}
