//! Credential domain model.
//!
//! A credential is an authenticated identity: a tenant-scoped login
//! with a role set, an optional password hash, and an optional bearer
//! access token. The privilege level is derived from role membership,
//! never stored or set independently.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::tenant::ROOT_TENANT;

/// Ordered privilege levels.
///
/// Derived from role membership: a credential holding several
/// level-naming roles gets the highest one; roles that name no level
/// (tenant-defined vocabulary) contribute nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Key,
    User,
    Admin,
    SuperAdmin,
    SuperDog,
}

impl Level {
    /// The role name that grants this level, if any. `Key` is the
    /// floor and needs no role.
    pub fn role_name(self) -> Option<&'static str> {
        match self {
            Level::Key => None,
            Level::User => Some("user"),
            Level::Admin => Some("admin"),
            Level::SuperAdmin => Some("super_admin"),
            Level::SuperDog => Some("superdog"),
        }
    }

    fn from_role(role: &str) -> Option<Level> {
        match role {
            "user" => Some(Level::User),
            "admin" => Some(Level::Admin),
            "super_admin" => Some(Level::SuperAdmin),
            "superdog" => Some(Level::SuperDog),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Key => "key",
            Level::User => "user",
            Level::Admin => "admin",
            Level::SuperAdmin => "super_admin",
            Level::SuperDog => "superdog",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Tenant this credential acts on. Superdog credentials are stored
    /// under the root tenant and rebound to the addressed tenant after
    /// authentication.
    pub tenant: String,
    /// Login name, unique within the tenant.
    pub name: String,
    /// `None` while the credential awaits a password reset.
    pub hashed_password: Option<String>,
    /// Free-form role names; level-granting roles are `user`, `admin`,
    /// `super_admin` and `superdog`.
    pub roles: Vec<String>,
    pub enabled: bool,
    pub access_token: Option<String>,
    pub access_token_expires_at: Option<DateTime<Utc>>,
    pub password_reset_code: Option<String>,
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(tenant: impl Into<String>, name: impl Into<String>, roles: Vec<String>) -> Self {
        let now = Utc::now();
        Credential {
            tenant: tenant.into(),
            name: name.into(),
            hashed_password: None,
            roles,
            enabled: true,
            access_token: None,
            access_token_expires_at: None,
            password_reset_code: None,
            password_reset_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The anonymous credential used when a request carries no
    /// `Authorization` header: key level, no roles.
    pub fn key(tenant: impl Into<String>) -> Self {
        Credential::new(tenant, "default", Vec::new())
    }

    /// Privilege level derived from role membership.
    pub fn level(&self) -> Level {
        self.roles
            .iter()
            .filter_map(|r| Level::from_role(r))
            .max()
            .unwrap_or(Level::Key)
    }

    pub fn is_at_least(&self, level: Level) -> bool {
        self.level() >= level
    }

    pub fn is_superdog(&self) -> bool {
        self.level() == Level::SuperDog
    }

    pub fn is_root_tenant(&self) -> bool {
        self.tenant == ROOT_TENANT
    }

    /// Ownership check: a record is owned by the credential that
    /// created it or to which it is addressed.
    pub fn owns(&self, record_owner: &str) -> bool {
        self.name == record_owner
    }

    /// Rebinds this credential to another tenant. Used after superdog
    /// authentication to act on the addressed tenant.
    pub fn rebind(&mut self, tenant: impl Into<String>) {
        self.tenant = tenant.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(Level::Key < Level::User);
        assert!(Level::User < Level::Admin);
        assert!(Level::Admin < Level::SuperAdmin);
        assert!(Level::SuperAdmin < Level::SuperDog);
    }

    #[test]
    fn level_is_derived_from_roles() {
        let cred = Credential::new("acme", "bob", vec!["user".into()]);
        assert_eq!(cred.level(), Level::User);

        let cred = Credential::new("acme", "ops", vec!["user".into(), "admin".into()]);
        assert_eq!(cred.level(), Level::Admin);
    }

    #[test]
    fn unknown_roles_grant_no_level() {
        let cred = Credential::new("acme", "bob", vec!["platine".into(), "gold".into()]);
        assert_eq!(cred.level(), Level::Key);
    }

    #[test]
    fn anonymous_credential_is_key_level() {
        let cred = Credential::key("acme");
        assert_eq!(cred.level(), Level::Key);
        assert!(cred.roles.is_empty());
        assert!(!cred.is_at_least(Level::User));
    }

    #[test]
    fn superdog_rebind_keeps_level() {
        let mut cred = Credential::new(ROOT_TENANT, "superdog-dave", vec!["superdog".into()]);
        assert!(cred.is_root_tenant());
        cred.rebind("acme");
        assert_eq!(cred.tenant, "acme");
        assert!(cred.is_superdog());
    }

    #[test]
    fn ownership_matches_login_name() {
        let cred = Credential::new("acme", "vince", vec!["user".into()]);
        assert!(cred.owns("vince"));
        assert!(!cred.owns("dave"));
    }
}
