use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use adminkit_core::UserId;

use crate::{PermissionKey, Role};

/// A role together with the permissions persisted for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: Role,
    pub permissions: Vec<PermissionKey>,
}

impl RoleAssignment {
    pub fn new(role: impl Into<Role>, permissions: impl IntoIterator<Item = PermissionKey>) -> Self {
        Self {
            role: role.into(),
            permissions: permissions.into_iter().collect(),
        }
    }
}

/// An authenticated actor resolved for authorization decisions.
///
/// Its permission set is the union of the permissions of every assigned role.
/// Construction is decoupled from storage and transport: callers resolve the
/// assignments (usually from persistence) and hand them over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    id: UserId,
    roles: Vec<Role>,
    permissions: BTreeSet<PermissionKey>,
}

impl Principal {
    pub fn new(id: UserId, assignments: impl IntoIterator<Item = RoleAssignment>) -> Self {
        let mut roles = Vec::new();
        let mut permissions = BTreeSet::new();
        for assignment in assignments {
            if !roles.contains(&assignment.role) {
                roles.push(assignment.role);
            }
            permissions.extend(assignment.permissions);
        }
        Self {
            id,
            roles,
            permissions,
        }
    }

    /// Principal holding exactly `permissions`, without role information.
    pub fn with_permissions(id: UserId, permissions: impl IntoIterator<Item = PermissionKey>) -> Self {
        Self {
            id,
            roles: Vec::new(),
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn permissions(&self) -> &BTreeSet<PermissionKey> {
        &self.permissions
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == name)
    }

    pub fn has_permission(&self, key: &PermissionKey) -> bool {
        self.permissions.contains(key)
    }

    /// ANY-of check: true when at least one of `keys` is held.
    pub fn has_any_permission(&self, keys: &[PermissionKey]) -> bool {
        keys.iter().any(|key| self.permissions.contains(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BootstrapRole;

    #[test]
    fn permissions_are_the_union_of_role_assignments() {
        let principal = Principal::new(
            UserId::new(),
            vec![
                RoleAssignment::new(BootstrapRole::Moderator, vec!["users.view".into(), "users.edit".into()]),
                RoleAssignment::new(BootstrapRole::Cashier, vec!["users.view".into(), "roles.view".into()]),
            ],
        );
        assert_eq!(principal.permissions().len(), 3);
        assert_eq!(principal.roles().len(), 2);
        assert!(principal.has_role("Cashier"));
    }

    #[test]
    fn any_of_semantics() {
        let principal = Principal::with_permissions(UserId::new(), vec!["users.view".into()]);
        assert!(principal.has_any_permission(&["users.delete".into(), "users.view".into()]));
        assert!(!principal.has_any_permission(&["users.delete".into()]));
        assert!(!principal.has_any_permission(&[]));
    }
}
