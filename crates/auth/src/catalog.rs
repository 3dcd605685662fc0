//! Permission catalog: every registered definition's keys, grouped and ordered.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use crate::definition::{DenialMessages, GENERIC_DENIAL_MESSAGE, PermissionDefinition};
use crate::permissions::PermissionKey;

/// Keys of one definition, under its group name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionGroup {
    pub group_name: String,
    pub permissions: Vec<PermissionKey>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("permission '{key}' is declared by both '{first}' and '{second}'")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("permission group '{0}' is registered more than once")]
    DuplicateGroup(String),

    #[error("permission definition '{0}' does not declare a CRUD entity")]
    NotCrud(String),
}

/// Explicit registration of the definitions that make up a catalog.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    definitions: Vec<PermissionDefinition>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, definition: PermissionDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Build the catalog, rejecting keys or group names claimed twice.
    ///
    /// Definitions with an empty group name or no keys are kept for message
    /// resolution but produce no group.
    pub fn build(self) -> Result<PermissionCatalog, CatalogError> {
        let mut groups = Vec::new();
        let mut owners: HashMap<PermissionKey, usize> = HashMap::new();
        let mut group_names: HashSet<String> = HashSet::new();

        for (idx, definition) in self.definitions.iter().enumerate() {
            let group_name = definition.group_name();
            let permissions = definition.enumerate_keys();
            if group_name.is_empty() || permissions.is_empty() {
                continue;
            }

            if !group_names.insert(group_name.clone()) {
                return Err(CatalogError::DuplicateGroup(group_name));
            }

            for key in &permissions {
                if let Some(previous) = owners.insert(key.clone(), idx) {
                    return Err(CatalogError::DuplicateKey {
                        key: key.to_string(),
                        first: self.definitions[previous].name().to_string(),
                        second: definition.name().to_string(),
                    });
                }
            }

            groups.push(PermissionGroup {
                group_name,
                permissions,
            });
        }

        Ok(PermissionCatalog {
            definitions: self.definitions,
            groups,
            owners,
        })
    }
}

/// The full, deterministic, ordered set of permission keys.
///
/// Order is registration order of definitions, then in-definition order
/// (CRUD keys, then custom keys). Derived purely from static definitions, so
/// it can be built once and shared.
#[derive(Debug, Clone)]
pub struct PermissionCatalog {
    definitions: Vec<PermissionDefinition>,
    groups: Vec<PermissionGroup>,
    owners: HashMap<PermissionKey, usize>,
}

impl PermissionCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    pub fn all_groups(&self) -> &[PermissionGroup] {
        &self.groups
    }

    /// Every key in catalog order, minus those in `excluding`.
    pub fn all_permissions(&self, excluding: &[PermissionKey]) -> Vec<PermissionKey> {
        let excluded: HashSet<&PermissionKey> = excluding.iter().collect();
        self.flatten(|key| !excluded.contains(key))
    }

    /// Catalog keys that also appear in `including`, in catalog order.
    ///
    /// Keys outside the catalog are never returned, even when requested.
    pub fn all_permissions_including(&self, including: &[PermissionKey]) -> Vec<PermissionKey> {
        let included: HashSet<&PermissionKey> = including.iter().collect();
        self.flatten(|key| included.contains(key))
    }

    fn flatten(&self, keep: impl Fn(&PermissionKey) -> bool) -> Vec<PermissionKey> {
        self.groups
            .iter()
            .flat_map(|group| group.permissions.iter())
            .filter(|key| keep(key))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn contains(&self, key: &PermissionKey) -> bool {
        self.owners.contains_key(key)
    }

    pub fn definitions(&self) -> &[PermissionDefinition] {
        &self.definitions
    }

    /// Look up a definition by its declared name (e.g. `"Users"`).
    pub fn definition(&self, name: &str) -> Option<&PermissionDefinition> {
        self.definitions.iter().find(|d| d.name() == name)
    }

    /// The definition owning `key`.
    pub fn definition_for(&self, key: &PermissionKey) -> Option<&PermissionDefinition> {
        self.owners.get(key).map(|idx| &self.definitions[*idx])
    }

    /// Group name of the definition owning `key`.
    pub fn group_of(&self, key: &PermissionKey) -> Option<String> {
        self.definition_for(key).map(|d| d.group_name())
    }
}

impl DenialMessages for PermissionCatalog {
    fn denial_message(&self, key: &PermissionKey) -> String {
        match self.definition_for(key) {
            Some(definition) => definition.denial_message(key),
            None => GENERIC_DENIAL_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PermissionCatalog {
        PermissionCatalog::builder()
            .register(PermissionDefinition::crud("Users", "users"))
            .register(
                PermissionDefinition::crud("Roles", "roles")
                    .with_custom_message("roles.super_admin_assign_permission", "You are not super admin."),
            )
            .build()
            .unwrap()
    }

    fn keys(raw: &[&'static str]) -> Vec<PermissionKey> {
        raw.iter().map(|k| PermissionKey::new(*k)).collect()
    }

    #[test]
    fn groups_follow_registration_order() {
        let catalog = catalog();
        let names: Vec<&str> = catalog.all_groups().iter().map(|g| g.group_name.as_str()).collect();
        assert_eq!(names, vec!["users", "roles"]);
        assert_eq!(catalog.all_groups()[1].permissions.len(), 5);
        assert_eq!(catalog.len(), 9);
    }

    #[test]
    fn excluding_drops_only_listed_keys() {
        let catalog = catalog();
        let remaining = catalog.all_permissions(&keys(&["users.delete", "roles.view", "nope.view"]));
        assert_eq!(remaining.len(), 7);
        assert!(!remaining.contains(&PermissionKey::new("users.delete")));
        assert_eq!(remaining[0].as_str(), "users.view");
    }

    #[test]
    fn including_follows_catalog_order_and_ignores_foreign_keys() {
        let catalog = catalog();
        let picked = catalog.all_permissions_including(&keys(&[
            "roles.view",
            "ghost.view",
            "users.delete",
            "users.view",
        ]));
        assert_eq!(picked, keys(&["users.view", "users.delete", "roles.view"]));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = PermissionCatalog::builder()
            .register(PermissionDefinition::crud("Users", "users"))
            .register(PermissionDefinition::new("Accounts").with_custom("users.view"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateKey {
                key: "users.view".to_string(),
                first: "Users".to_string(),
                second: "Accounts".to_string(),
            }
        );
    }

    #[test]
    fn duplicate_groups_are_rejected() {
        let err = PermissionCatalog::builder()
            .register(PermissionDefinition::crud("Users", "users"))
            .register(PermissionDefinition::crud("UsersPermission", "members"))
            .build()
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateGroup("users".to_string()));
    }

    #[test]
    fn empty_definitions_produce_no_group() {
        let catalog = PermissionCatalog::builder()
            .register(PermissionDefinition::new("Reports"))
            .register(PermissionDefinition::crud("Users", "users"))
            .build()
            .unwrap();
        assert_eq!(catalog.all_groups().len(), 1);
        assert!(catalog.definition("Reports").is_some());
    }

    #[test]
    fn catalog_resolves_messages_through_the_owning_definition() {
        let catalog = catalog();
        assert_eq!(
            catalog.denial_message(&"roles.super_admin_assign_permission".into()),
            "You are not super admin."
        );
        assert_eq!(
            catalog.denial_message(&"users.create".into()),
            "You are not authorized to create new users."
        );
        assert_eq!(catalog.denial_message(&"ghost.view".into()), GENERIC_DENIAL_MESSAGE);
        assert_eq!(catalog.group_of(&"roles.edit".into()).as_deref(), Some("roles"));
    }

    #[test]
    fn groups_serialize_with_group_name_field() {
        let json = serde_json::to_value(&catalog().all_groups()[0]).unwrap();
        assert_eq!(json["group_name"], "users");
        assert_eq!(json["permissions"][0], "users.view");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn universe() -> Vec<PermissionKey> {
            let mut all = catalog().all_permissions(&[]);
            all.extend(keys(&["ghost.view", "users.account_activation", "roles.audit"]));
            all
        }

        fn subset() -> impl Strategy<Value = Vec<PermissionKey>> {
            proptest::sample::subsequence(universe(), 0..=12)
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: excluded keys never survive the projection.
            #[test]
            fn excluding_is_disjoint_from_the_exclusion_set(excluding in subset()) {
                let catalog = catalog();
                let remaining = catalog.all_permissions(&excluding);
                for key in &remaining {
                    prop_assert!(!excluding.contains(key));
                }
                let excluded_in_catalog = excluding.iter().filter(|k| catalog.contains(k)).count();
                prop_assert_eq!(remaining.len(), catalog.len() - excluded_in_catalog);
            }

            /// Property: including never leaks keys from outside the catalog.
            #[test]
            fn including_is_within_catalog_and_request(including in subset()) {
                let catalog = catalog();
                let full = catalog.all_permissions(&[]);
                for key in catalog.all_permissions_including(&including) {
                    prop_assert!(full.contains(&key));
                    prop_assert!(including.contains(&key));
                }
            }
        }
    }

    #[test]
    fn unfiltered_catalog_lists_every_key_once() {
        let all = catalog().all_permissions(&[]);
        let unique: HashSet<&PermissionKey> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
        assert_eq!(all.len(), 9);
    }
}
