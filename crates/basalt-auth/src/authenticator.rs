//! Authenticator — turns an `Authorization` header into a resolved
//! [`Credential`] against a tenant's credential store.

use tracing::debug;

use basalt_core::error::{BasaltError, BasaltResult};
use basalt_core::models::credential::Credential;
use basalt_core::models::tenant::ROOT_TENANT;
use basalt_core::store::CredentialStore;

use crate::header::{self, AuthScheme};
use crate::password;

/// Logins with this prefix authenticate against the root tenant's
/// store regardless of the addressed tenant, and are rebound to the
/// addressed tenant on success.
pub const SUPERDOG_PREFIX: &str = "superdog-";

/// Resolves presented credentials. Generic over the store so the auth
/// layer has no dependency on the database crate.
pub struct Authenticator<S> {
    store: S,
}

impl<S: CredentialStore> Authenticator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolves the credential a request acts as.
    ///
    /// No header yields the anonymous key-level credential; callers
    /// that require a minimum level reject it at the guarded-accessor
    /// stage. Every failure mode maps to an authentication error that
    /// never distinguishes an unknown login from a wrong secret.
    pub async fn resolve(
        &self,
        tenant: &str,
        header: Option<&str>,
    ) -> BasaltResult<Credential> {
        let Some(header) = header else {
            return Ok(Credential::key(tenant));
        };

        match header::parse(header)? {
            AuthScheme::Basic { name, secret } => self.check_basic(tenant, &name, &secret).await,
            AuthScheme::Bearer { token } => self.check_bearer(tenant, &token).await,
        }
    }

    async fn check_basic(
        &self,
        tenant: &str,
        name: &str,
        secret: &str,
    ) -> BasaltResult<Credential> {
        let superdog = name.starts_with(SUPERDOG_PREFIX);
        let store_tenant = if superdog { ROOT_TENANT } else { tenant };

        debug!(tenant = %store_tenant, login = %name, "checking basic credentials");

        let found = self.store.find_by_login(store_tenant, name).await?;
        let mut credential = match found {
            Some(credential) if credential.enabled => credential,
            _ => return Err(invalid_login(tenant)),
        };

        let Some(stored_digest) = credential.hashed_password.as_deref() else {
            // credential pending a password reset
            return Err(invalid_login(tenant));
        };
        if !password::verify(secret, stored_digest) {
            return Err(invalid_login(tenant));
        }

        if superdog {
            credential.rebind(tenant);
        }
        Ok(credential)
    }

    async fn check_bearer(&self, tenant: &str, token: &str) -> BasaltResult<Credential> {
        debug!(tenant = %tenant, "checking bearer token");

        match self.store.find_by_token(tenant, token).await? {
            Some(credential) if credential.enabled => Ok(credential),
            _ => Err(BasaltError::authentication(format!(
                "invalid access token for tenant [{tenant}]"
            ))),
        }
    }
}

fn invalid_login(tenant: &str) -> BasaltError {
    BasaltError::authentication(format!(
        "invalid username or password for tenant [{tenant}]"
    ))
}
