//! Permission model.
//!
//! Every collection type carries a role → permission-set matrix. The
//! `_all` permission variants grant an operation regardless of record
//! ownership; the plain variants only apply to records the credential
//! owns. A credential holding several roles gets the union (most
//! permissive) of its roles' permission sets. Any missing entry
//! (unknown type, role without a grant) denies.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of grantable permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Create,
    Read,
    ReadAll,
    Update,
    UpdateAll,
    Delete,
    DeleteAll,
    Search,
}

impl Permission {
    pub const ALL: [Permission; 8] = [
        Permission::Create,
        Permission::Read,
        Permission::ReadAll,
        Permission::Update,
        Permission::UpdateAll,
        Permission::Delete,
        Permission::DeleteAll,
        Permission::Search,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Create => "create",
            Permission::Read => "read",
            Permission::ReadAll => "read_all",
            Permission::Update => "update",
            Permission::UpdateAll => "update_all",
            Permission::Delete => "delete",
            Permission::DeleteAll => "delete_all",
            Permission::Search => "search",
        }
    }

    pub fn from_name(name: &str) -> Option<Permission> {
        Permission::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data-access operation to be authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOp {
    Create,
    Read,
    Update,
    Delete,
    Search,
}

impl DataOp {
    /// Permission granting this operation on owned records only.
    pub fn owned(self) -> Permission {
        match self {
            DataOp::Create => Permission::Create,
            DataOp::Read => Permission::Read,
            DataOp::Update => Permission::Update,
            DataOp::Delete => Permission::Delete,
            DataOp::Search => Permission::Search,
        }
    }

    /// Permission granting this operation regardless of ownership.
    /// Create and search have no ownership-scoped variant.
    pub fn all(self) -> Option<Permission> {
        match self {
            DataOp::Read => Some(Permission::ReadAll),
            DataOp::Update => Some(Permission::UpdateAll),
            DataOp::Delete => Some(Permission::DeleteAll),
            DataOp::Create | DataOp::Search => None,
        }
    }
}

impl fmt::Display for DataOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataOp::Create => "create",
            DataOp::Read => "read",
            DataOp::Update => "update",
            DataOp::Delete => "delete",
            DataOp::Search => "search",
        };
        f.write_str(name)
    }
}

/// Role → permission-set matrix for one collection type.
pub type RolePermissions = BTreeMap<String, BTreeSet<Permission>>;

/// Collection type → role matrix, the shape of the ACL settings
/// document.
pub type AclSettings = BTreeMap<String, RolePermissions>;

/// The matrix materialized for collections declared without an
/// explicit ACL:
///
/// - `key` (anonymous) may read anything;
/// - `user` may create, search, and read/update/delete its own records;
/// - `admin` may do everything, regardless of ownership.
pub fn default_role_permissions() -> RolePermissions {
    let mut matrix = RolePermissions::new();
    matrix.insert("key".into(), BTreeSet::from([Permission::ReadAll]));
    matrix.insert(
        "user".into(),
        BTreeSet::from([
            Permission::Create,
            Permission::Read,
            Permission::Update,
            Permission::Delete,
            Permission::Search,
        ]),
    );
    matrix.insert(
        "admin".into(),
        BTreeSet::from([
            Permission::Create,
            Permission::ReadAll,
            Permission::UpdateAll,
            Permission::DeleteAll,
            Permission::Search,
        ]),
    );
    matrix
}

/// Decides whether a credential holding `roles` may perform `op` on a
/// record of `type_name`, given the merged ACL `settings` and whether
/// the credential owns the record.
///
/// The union of all held roles' permissions is computed; access is
/// granted if it contains the `_all` variant of the operation, or the
/// owned variant when `is_owner` is true. Every lookup miss denies.
pub fn is_allowed(
    settings: &AclSettings,
    type_name: &str,
    roles: &[String],
    op: DataOp,
    is_owner: bool,
) -> bool {
    let Some(matrix) = settings.get(type_name) else {
        return false;
    };

    let mut union: BTreeSet<Permission> = BTreeSet::new();
    for role in roles {
        if let Some(permissions) = matrix.get(role) {
            union.extend(permissions.iter().copied());
        }
    }

    match op.all() {
        // create/search carry no ownership semantics
        None => union.contains(&op.owned()),
        Some(all) => union.contains(&all) || (is_owner && union.contains(&op.owned())),
    }
}

/// Guard form of [`is_allowed`]: denial becomes the `Forbidden`
/// error, naming the type and operation but never the held roles.
pub fn check_allowed(
    settings: &AclSettings,
    type_name: &str,
    roles: &[String],
    op: DataOp,
    is_owner: bool,
) -> crate::error::BasaltResult<()> {
    if is_allowed(settings, type_name, roles, op, is_owner) {
        Ok(())
    } else {
        Err(crate::error::BasaltError::Forbidden {
            type_name: type_name.to_string(),
            operation: op,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(type_name: &str, matrix: RolePermissions) -> AclSettings {
        let mut settings = AclSettings::new();
        settings.insert(type_name.into(), matrix);
        settings
    }

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn no_matching_role_denies_every_operation() {
        let settings = settings_with("message", default_role_permissions());
        let held = roles(&["platine"]);

        for op in [
            DataOp::Create,
            DataOp::Read,
            DataOp::Update,
            DataOp::Delete,
            DataOp::Search,
        ] {
            assert!(!is_allowed(&settings, "message", &held, op, true));
            assert!(!is_allowed(&settings, "message", &held, op, false));
        }
    }

    #[test]
    fn unknown_type_denies() {
        let settings = settings_with("message", default_role_permissions());
        assert!(!is_allowed(&settings, "invoice", &roles(&["admin"]), DataOp::Read, false));
    }

    #[test]
    fn multiple_roles_grant_the_union() {
        let mut matrix = RolePermissions::new();
        matrix.insert("reader".into(), BTreeSet::from([Permission::ReadAll]));
        matrix.insert("writer".into(), BTreeSet::from([Permission::UpdateAll]));
        let settings = settings_with("doc", matrix);

        let held = roles(&["reader", "writer"]);
        assert!(is_allowed(&settings, "doc", &held, DataOp::Read, false));
        assert!(is_allowed(&settings, "doc", &held, DataOp::Update, false));
        // neither role grants delete
        assert!(!is_allowed(&settings, "doc", &held, DataOp::Delete, false));
    }

    #[test]
    fn owned_permission_requires_ownership() {
        let mut matrix = RolePermissions::new();
        matrix.insert("editor".into(), BTreeSet::from([Permission::Update]));
        let settings = settings_with("doc", matrix);

        let held = roles(&["editor"]);
        assert!(is_allowed(&settings, "doc", &held, DataOp::Update, true));
        assert!(!is_allowed(&settings, "doc", &held, DataOp::Update, false));
    }

    #[test]
    fn all_permission_ignores_ownership() {
        let mut matrix = RolePermissions::new();
        matrix.insert("moderator".into(), BTreeSet::from([Permission::DeleteAll]));
        let settings = settings_with("doc", matrix);

        let held = roles(&["moderator"]);
        assert!(is_allowed(&settings, "doc", &held, DataOp::Delete, false));
    }

    #[test]
    fn default_matrix_shape() {
        let matrix = default_role_permissions();
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix["key"], BTreeSet::from([Permission::ReadAll]));
        assert_eq!(
            matrix["user"],
            BTreeSet::from([
                Permission::Create,
                Permission::Read,
                Permission::Update,
                Permission::Delete,
                Permission::Search,
            ])
        );
        assert_eq!(
            matrix["admin"],
            BTreeSet::from([
                Permission::Create,
                Permission::ReadAll,
                Permission::UpdateAll,
                Permission::DeleteAll,
                Permission::Search,
            ])
        );
    }

    #[test]
    fn default_matrix_semantics() {
        let settings = settings_with("message", default_role_permissions());

        // anonymous key access is read-only
        let key = roles(&["key"]);
        assert!(is_allowed(&settings, "message", &key, DataOp::Read, false));
        assert!(!is_allowed(&settings, "message", &key, DataOp::Create, false));
        assert!(!is_allowed(&settings, "message", &key, DataOp::Update, true));

        // users act on their own records
        let user = roles(&["user"]);
        assert!(is_allowed(&settings, "message", &user, DataOp::Create, false));
        assert!(is_allowed(&settings, "message", &user, DataOp::Update, true));
        assert!(!is_allowed(&settings, "message", &user, DataOp::Update, false));
        assert!(is_allowed(&settings, "message", &user, DataOp::Search, false));

        // admins act on anything
        let admin = roles(&["admin"]);
        assert!(is_allowed(&settings, "message", &admin, DataOp::Delete, false));
        assert!(is_allowed(&settings, "message", &admin, DataOp::Update, false));
    }

    #[test]
    fn denial_is_a_forbidden_error() {
        let settings = settings_with("message", default_role_permissions());
        let err = check_allowed(&settings, "message", &roles(&["key"]), DataOp::Create, false)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("create"), "{message}");
        assert!(message.contains("message"), "{message}");

        assert!(
            check_allowed(&settings, "message", &roles(&["key"]), DataOp::Read, false).is_ok()
        );
    }

    #[test]
    fn permission_names_round_trip() {
        for p in Permission::ALL {
            assert_eq!(Permission::from_name(p.as_str()), Some(p));
        }
        assert_eq!(Permission::from_name("read-all"), None);
    }
}
