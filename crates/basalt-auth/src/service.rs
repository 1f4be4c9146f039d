//! Credential lifecycle management: sign-up, token issuance, password
//! resets, role assignment and tenant provisioning.

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use basalt_core::error::{BasaltError, BasaltResult};
use basalt_core::models::credential::{Credential, Level};
use basalt_core::models::tenant::{self, ROOT_TENANT};
use basalt_core::store::{CredentialStore, SchemaStore};

use crate::authenticator::SUPERDOG_PREFIX;
use crate::config::AuthConfig;
use crate::password;
use crate::token;

const MIN_NAME_LENGTH: usize = 3;

/// Outcome of a sign-up: either the credential is immediately usable,
/// or it awaits its first password through the reset flow.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub credential: Credential,
    /// Set when no password was provided at sign-up. The holder of
    /// this code completes the flow with [`CredentialService::reset_password`].
    pub password_reset_code: Option<String>,
}

/// An issued bearer token and its absolute expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in_secs: u64,
}

pub struct CredentialService<S> {
    store: S,
    config: AuthConfig,
}

impl<S: CredentialStore> CredentialService<S> {
    pub fn new(store: S, config: AuthConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a credential in a tenant.
    ///
    /// Without a password, the credential is created with a reset code
    /// instead; it cannot authenticate until the code is redeemed.
    pub async fn sign_up(
        &self,
        tenant_id: &str,
        name: &str,
        pwd: Option<&str>,
        roles: Vec<String>,
    ) -> BasaltResult<SignUp> {
        check_name(name)?;

        if self.store.find_by_login(tenant_id, name).await?.is_some() {
            return Err(BasaltError::validation(format!(
                "credential [{name}] already exists in tenant [{tenant_id}]"
            )));
        }

        let mut credential = Credential::new(tenant_id, name, roles);
        let mut reset_code = None;
        match pwd {
            Some(pwd) => {
                credential.hashed_password =
                    Some(password::check_and_hash(pwd, self.config.min_password_length)?);
            }
            None => {
                let code = Uuid::new_v4().to_string();
                credential.password_reset_code = Some(code.clone());
                credential.password_reset_expires_at = Some(self.reset_code_expiry());
                reset_code = Some(code);
            }
        }

        self.store.save(&credential).await?;
        info!(tenant = %tenant_id, login = %name, "credential created");

        Ok(SignUp {
            credential,
            password_reset_code: reset_code,
        })
    }

    /// Issues a fresh opaque bearer token for an authenticated
    /// credential. Any previously issued token is replaced.
    pub async fn issue_token(&self, credential: &Credential) -> BasaltResult<IssuedToken> {
        let mut stored = self.load(credential).await?;

        let access_token = token::generate_access_token();
        stored.access_token = Some(access_token.clone());
        stored.access_token_expires_at =
            Some(Utc::now() + Duration::seconds(self.config.token_lifetime_secs as i64));
        stored.updated_at = Utc::now();
        self.store.save(&stored).await?;

        Ok(IssuedToken {
            access_token,
            expires_in_secs: self.config.token_lifetime_secs,
        })
    }

    /// Invalidates the credential's current bearer token, if any.
    pub async fn revoke_token(&self, credential: &Credential) -> BasaltResult<()> {
        let mut stored = self.load(credential).await?;
        stored.access_token = None;
        stored.access_token_expires_at = None;
        stored.updated_at = Utc::now();
        self.store.save(&stored).await
    }

    /// Starts a password reset: the stored hash is cleared so the old
    /// password stops working immediately, and a single-use code is
    /// returned for out-of-band delivery.
    pub async fn request_password_reset(
        &self,
        tenant_id: &str,
        name: &str,
    ) -> BasaltResult<String> {
        let mut stored = self.load_by_login(tenant_id, name).await?;

        let code = Uuid::new_v4().to_string();
        stored.hashed_password = None;
        stored.access_token = None;
        stored.access_token_expires_at = None;
        stored.password_reset_code = Some(code.clone());
        stored.password_reset_expires_at = Some(self.reset_code_expiry());
        stored.updated_at = Utc::now();
        self.store.save(&stored).await?;

        info!(tenant = %tenant_id, login = %name, "password reset requested");
        Ok(code)
    }

    /// Redeems a reset code and sets a new password. The code is
    /// consumed whether or not it had expired.
    pub async fn reset_password(
        &self,
        tenant_id: &str,
        name: &str,
        reset_code: &str,
        new_password: &str,
    ) -> BasaltResult<()> {
        let mut stored = self.load_by_login(tenant_id, name).await?;

        let valid = stored.password_reset_code.as_deref() == Some(reset_code)
            && stored
                .password_reset_expires_at
                .is_some_and(|at| at > Utc::now());
        stored.password_reset_code = None;
        stored.password_reset_expires_at = None;

        if !valid {
            stored.updated_at = Utc::now();
            self.store.save(&stored).await?;
            return Err(BasaltError::validation(format!(
                "invalid password reset code for credential [{name}]"
            )));
        }

        stored.hashed_password =
            Some(password::check_and_hash(new_password, self.config.min_password_length)?);
        stored.updated_at = Utc::now();
        self.store.save(&stored).await
    }

    /// Replaces the password of an already authenticated credential.
    /// Outstanding bearer tokens are revoked.
    pub async fn change_password(
        &self,
        tenant_id: &str,
        name: &str,
        new_password: &str,
    ) -> BasaltResult<()> {
        let mut stored = self.load_by_login(tenant_id, name).await?;

        stored.hashed_password =
            Some(password::check_and_hash(new_password, self.config.min_password_length)?);
        stored.access_token = None;
        stored.access_token_expires_at = None;
        stored.password_reset_code = None;
        stored.password_reset_expires_at = None;
        stored.updated_at = Utc::now();
        self.store.save(&stored).await
    }

    /// Replaces the credential's role set wholesale.
    pub async fn set_roles(
        &self,
        tenant_id: &str,
        name: &str,
        roles: Vec<String>,
    ) -> BasaltResult<Credential> {
        let mut stored = self.load_by_login(tenant_id, name).await?;
        stored.roles = roles;
        stored.updated_at = Utc::now();
        self.store.save(&stored).await?;
        Ok(stored)
    }

    /// Enables or disables a credential. Disabled credentials fail
    /// authentication under every scheme.
    pub async fn set_enabled(
        &self,
        tenant_id: &str,
        name: &str,
        enabled: bool,
    ) -> BasaltResult<()> {
        let mut stored = self.load_by_login(tenant_id, name).await?;
        stored.enabled = enabled;
        stored.updated_at = Utc::now();
        self.store.save(&stored).await
    }

    pub async fn delete(&self, tenant_id: &str, name: &str) -> BasaltResult<()> {
        self.store.delete(tenant_id, name).await
    }

    /// Provisions a new tenant: validates the tenant id and creates
    /// its first super-admin credential.
    pub async fn create_tenant(
        &self,
        tenant_id: &str,
        admin_name: &str,
        admin_password: &str,
    ) -> BasaltResult<Credential> {
        tenant::check_id(tenant_id)?;

        let signup = self
            .sign_up(
                tenant_id,
                admin_name,
                Some(admin_password),
                vec!["super_admin".to_string()],
            )
            .await?;

        info!(tenant = %tenant_id, "tenant created");
        Ok(signup.credential)
    }

    /// Deletes a tenant and everything it owns. Credentials go first
    /// so a partial failure never leaves the tenant reachable with
    /// its old privileges. Returns `(credentials, mappings)` removed.
    pub async fn delete_tenant<M: SchemaStore>(
        &self,
        tenant_id: &str,
        schemas: &M,
    ) -> BasaltResult<(u64, u64)> {
        if tenant_id == ROOT_TENANT {
            return Err(BasaltError::validation(
                "the root tenant cannot be deleted",
            ));
        }

        let credentials = self.store.delete_all(tenant_id).await?;
        let mappings = schemas.delete_all(tenant_id).await?;

        info!(
            tenant = %tenant_id,
            credentials, mappings, "tenant deleted"
        );
        Ok((credentials, mappings))
    }

    /// Creates or refreshes a platform-operator credential in the root
    /// tenant. The login must carry the operator prefix so basic
    /// authentication routes it to the root store.
    pub async fn bootstrap_superdog(&self, name: &str, pwd: &str) -> BasaltResult<Credential> {
        if !name.starts_with(SUPERDOG_PREFIX) {
            return Err(BasaltError::validation(format!(
                "operator login must start with [{SUPERDOG_PREFIX}]"
            )));
        }

        let mut credential = match self.store.find_by_login(ROOT_TENANT, name).await? {
            Some(existing) => existing,
            None => Credential::new(ROOT_TENANT, name, vec!["superdog".to_string()]),
        };
        credential.hashed_password =
            Some(password::check_and_hash(pwd, self.config.min_password_length)?);
        credential.enabled = true;
        credential.updated_at = Utc::now();
        self.store.save(&credential).await?;

        info!(login = %name, "operator credential bootstrapped");
        Ok(credential)
    }

    fn reset_code_expiry(&self) -> chrono::DateTime<Utc> {
        Utc::now() + Duration::seconds(self.config.reset_code_lifetime_secs as i64)
    }

    async fn load(&self, credential: &Credential) -> BasaltResult<Credential> {
        self.load_by_login(&credential.tenant, &credential.name)
            .await
    }

    async fn load_by_login(&self, tenant_id: &str, name: &str) -> BasaltResult<Credential> {
        self.store
            .find_by_login(tenant_id, name)
            .await?
            .ok_or_else(|| BasaltError::NotFound {
                entity: "credential".to_string(),
                id: format!("{tenant_id}/{name}"),
            })
    }
}

fn check_name(name: &str) -> BasaltResult<()> {
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(BasaltError::validation(format!(
            "username must be at least {MIN_NAME_LENGTH} characters long"
        )));
    }
    Ok(())
}

/// Bearer token issuance requires an authenticated, non-anonymous
/// caller. Kept next to the service so transports share the check.
pub fn check_can_issue_token(credential: &Credential) -> BasaltResult<()> {
    if credential.is_at_least(Level::User) {
        Ok(())
    } else {
        Err(BasaltError::Authorization {
            required: Level::User,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_are_rejected() {
        assert!(check_name("bo").is_err());
        assert!(check_name("bob").is_ok());
    }

    #[test]
    fn anonymous_cannot_issue_tokens() {
        let cred = Credential::key("acme");
        assert!(check_can_issue_token(&cred).is_err());

        let cred = Credential::new("acme", "vince", vec!["user".into()]);
        assert!(check_can_issue_token(&cred).is_ok());
    }
}
