//! Per-request scope: resolved tenant, memoized credential, and the
//! guarded accessors every data-access call site goes through.
//!
//! One `RequestContext` is created per inbound request at the
//! transport boundary and threaded explicitly; it is never shared
//! across requests. The credential is resolved at most once per
//! request: the first guarded accessor triggers resolution, later
//! ones reuse the memoized value.

use basalt_core::error::{BasaltError, BasaltResult};
use basalt_core::models::credential::{Credential, Level};
use basalt_core::models::tenant::{ROOT_TENANT, resolve_tenant};
use basalt_core::store::CredentialStore;

use crate::authenticator::Authenticator;

/// Whether a guarded accessor accepts requests addressed to the root
/// tenant. Cross-tenant data operations must target a real tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantRule {
    AnyTenant,
    RealTenant,
}

pub struct RequestContext {
    tenant: String,
    authorization: Option<String>,
    credential: Option<Credential>,
    is_test: bool,
    debug: bool,
}

impl RequestContext {
    /// Builds a context from the request's addressing and
    /// `Authorization` header.
    pub fn new(host: &str, authorization: Option<String>) -> Self {
        Self::with_flags(host, authorization, false, false)
    }

    pub fn with_flags(
        host: &str,
        authorization: Option<String>,
        is_test: bool,
        debug: bool,
    ) -> Self {
        RequestContext {
            tenant: resolve_tenant(host),
            authorization,
            credential: None,
            is_test,
            debug,
        }
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn is_test(&self) -> bool {
        self.is_test
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Resolves the request's credential, memoized for the request
    /// lifetime. At most one store lookup happens per request, no
    /// matter how many guarded accessors are invoked.
    pub async fn credentials<S: CredentialStore>(
        &mut self,
        authenticator: &Authenticator<S>,
    ) -> BasaltResult<&Credential> {
        if self.credential.is_none() {
            let resolved = authenticator
                .resolve(&self.tenant, self.authorization.as_deref())
                .await?;
            self.credential = Some(resolved);
        }
        // just memoized above
        Ok(self.credential.as_ref().expect("memoized credential"))
    }

    /// Generic guarded accessor: resolves the credential and requires
    /// at least `level`, failing closed with an authorization error
    /// otherwise.
    pub async fn require_at_least<S: CredentialStore>(
        &mut self,
        authenticator: &Authenticator<S>,
        level: Level,
        rule: TenantRule,
    ) -> BasaltResult<Credential> {
        if rule == TenantRule::RealTenant && self.tenant == ROOT_TENANT {
            return Err(BasaltError::NoTenant);
        }
        let credential = self.credentials(authenticator).await?;
        if credential.is_at_least(level) {
            Ok(credential.clone())
        } else {
            Err(BasaltError::Authorization { required: level })
        }
    }

    pub async fn require_user<S: CredentialStore>(
        &mut self,
        authenticator: &Authenticator<S>,
    ) -> BasaltResult<Credential> {
        self.require_at_least(authenticator, Level::User, TenantRule::RealTenant)
            .await
    }

    pub async fn require_admin<S: CredentialStore>(
        &mut self,
        authenticator: &Authenticator<S>,
    ) -> BasaltResult<Credential> {
        self.require_at_least(authenticator, Level::Admin, TenantRule::RealTenant)
            .await
    }

    pub async fn require_super_admin<S: CredentialStore>(
        &mut self,
        authenticator: &Authenticator<S>,
    ) -> BasaltResult<Credential> {
        self.require_at_least(authenticator, Level::SuperAdmin, TenantRule::RealTenant)
            .await
    }

    pub async fn require_superdog<S: CredentialStore>(
        &mut self,
        authenticator: &Authenticator<S>,
    ) -> BasaltResult<Credential> {
        self.require_at_least(authenticator, Level::SuperDog, TenantRule::AnyTenant)
            .await
    }

    /// "Act on your own resource or be an admin": the resolved login
    /// must equal `expected_login`, unless the credential is at
    /// admin level or above.
    pub async fn require_user_or<S: CredentialStore>(
        &mut self,
        authenticator: &Authenticator<S>,
        expected_login: &str,
    ) -> BasaltResult<Credential> {
        let credential = self
            .require_at_least(authenticator, Level::User, TenantRule::RealTenant)
            .await?;
        if credential.is_at_least(Level::Admin) || credential.name == expected_login {
            Ok(credential)
        } else {
            Err(BasaltError::Authorization {
                required: Level::Admin,
            })
        }
    }
}
