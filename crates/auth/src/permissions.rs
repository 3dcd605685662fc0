use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use adminkit_core::DomainError;

/// Permission identifier.
///
/// Permissions are modeled as opaque strings. CRUD keys follow the
/// `"<entity>.<action>"` convention (e.g. `"users.view"`); custom keys are
/// free-form (e.g. `"roles.super_admin_assign_permission"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionKey(Cow<'static, str>);

impl PermissionKey {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// CRUD key for `entity` and `action`.
    pub fn crud(entity: &str, action: CrudAction) -> Self {
        derive_key(entity, action)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Segment before the first dot, if any.
    pub fn entity(&self) -> Option<&str> {
        self.as_str().split_once('.').map(|(entity, _)| entity)
    }

    /// Segment after the first dot, if any.
    pub fn action(&self) -> Option<&str> {
        self.as_str().split_once('.').map(|(_, action)| action)
    }
}

impl From<&'static str> for PermissionKey {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PermissionKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for PermissionKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl core::fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the four base actions every CRUD entity exposes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrudAction {
    View,
    Create,
    Edit,
    Delete,
}

impl CrudAction {
    /// All actions in catalog order.
    pub const ALL: [CrudAction; 4] = [
        CrudAction::View,
        CrudAction::Create,
        CrudAction::Edit,
        CrudAction::Delete,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            CrudAction::View => "view",
            CrudAction::Create => "create",
            CrudAction::Edit => "edit",
            CrudAction::Delete => "delete",
        }
    }

    /// Canonical denial text for this action on `entity`.
    pub fn denial_message(self, entity: &str) -> String {
        match self {
            CrudAction::View => format!("You do not have permission to view {entity}."),
            CrudAction::Create => format!("You are not authorized to create new {entity}."),
            CrudAction::Edit => format!("You cannot edit {entity}."),
            CrudAction::Delete => {
                format!("You do not have the necessary permission to delete {entity}.")
            }
        }
    }
}

impl core::fmt::Display for CrudAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for CrudAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrudAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unknown CRUD action '{s}' (expected view, create, edit or delete)"
                ))
            })
    }
}

/// Derive the CRUD permission key `"{entity}.{action}"`.
///
/// The entity segment is used exactly as configured.
pub fn derive_key(entity: &str, action: CrudAction) -> PermissionKey {
    PermissionKey::new(format!("{entity}.{action}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_key_joins_with_a_dot() {
        assert_eq!(derive_key("users", CrudAction::View).as_str(), "users.view");
        assert_eq!(derive_key("roles", CrudAction::Delete).as_str(), "roles.delete");
    }

    #[test]
    fn key_segments() {
        let key = PermissionKey::new("roles.super_admin_assign_permission");
        assert_eq!(key.entity(), Some("roles"));
        assert_eq!(key.action(), Some("super_admin_assign_permission"));
        assert_eq!(PermissionKey::new("dashboard").entity(), None);
    }

    #[test]
    fn actions_parse_from_their_names() {
        for action in CrudAction::ALL {
            assert_eq!(action.as_str().parse::<CrudAction>().unwrap(), action);
        }
        assert!("update".parse::<CrudAction>().is_err());
    }

    #[test]
    fn denial_templates_mention_the_entity() {
        assert_eq!(
            CrudAction::Create.denial_message("roles"),
            "You are not authorized to create new roles."
        );
        assert_eq!(CrudAction::Edit.denial_message("users"), "You cannot edit users.");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: derived keys are exactly `entity` + "." + action name.
            #[test]
            fn derived_key_is_entity_dot_action(
                entity in "[a-z][a-z_]{0,30}",
                idx in 0usize..4
            ) {
                let action = CrudAction::ALL[idx];
                let key = derive_key(&entity, action);
                prop_assert_eq!(key.as_str(), format!("{}.{}", entity, action.as_str()));
                prop_assert_eq!(key.entity(), Some(entity.as_str()));
                prop_assert_eq!(key.action(), Some(action.as_str()));
            }
        }
    }
}
