//! Static permission definitions (one per entity).

use std::borrow::Cow;
use std::collections::HashMap;

use crate::permissions::{CrudAction, PermissionKey, derive_key};

/// Denial text used when a key has neither an override nor a CRUD template.
pub const GENERIC_DENIAL_MESSAGE: &str = "Unauthorized action";

/// Source of human-readable denial messages for permission keys.
pub trait DenialMessages {
    fn denial_message(&self, key: &PermissionKey) -> String;
}

/// A named grouping of permissions for one entity.
///
/// A definition optionally participates in CRUD (it then owns the four
/// `"<entity>.<action>"` keys), declares custom keys in declaration order, and
/// may override the denial text for any key it owns.
///
/// ```ignore
/// let roles = PermissionDefinition::crud("Roles", "roles")
///     .with_custom_message("roles.super_admin_assign_permission", "You are not super admin.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDefinition {
    name: Cow<'static, str>,
    entity: Option<Cow<'static, str>>,
    custom: Vec<PermissionKey>,
    messages: HashMap<PermissionKey, String>,
}

impl PermissionDefinition {
    /// Definition that only carries custom keys.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            entity: None,
            custom: Vec::new(),
            messages: HashMap::new(),
        }
    }

    /// Definition participating in CRUD for `entity`.
    pub fn crud(name: impl Into<Cow<'static, str>>, entity: impl Into<Cow<'static, str>>) -> Self {
        Self {
            entity: Some(entity.into()),
            ..Self::new(name)
        }
    }

    /// Declare a custom permission key. Re-declaring a key is a no-op.
    pub fn with_custom(mut self, key: impl Into<PermissionKey>) -> Self {
        let key = key.into();
        if !self.custom.contains(&key) {
            self.custom.push(key);
        }
        self
    }

    /// Override the denial message for `key` (CRUD or custom).
    pub fn with_message(mut self, key: impl Into<PermissionKey>, message: impl Into<String>) -> Self {
        self.messages.insert(key.into(), message.into());
        self
    }

    /// Declare a custom key together with its denial message.
    pub fn with_custom_message(self, key: impl Into<PermissionKey>, message: impl Into<String>) -> Self {
        let key = key.into();
        self.with_custom(key.clone()).with_message(key, message)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// Display/group name: the definition name without a trailing
    /// `"Permission"`, lowercased (`"UserPermission"` → `"user"`).
    pub fn group_name(&self) -> String {
        let name = self.name();
        name.strip_suffix("Permission").unwrap_or(name).to_lowercase()
    }

    pub fn crud_key(&self, action: CrudAction) -> Option<PermissionKey> {
        self.entity().map(|entity| derive_key(entity, action))
    }

    /// The four CRUD keys (empty when the definition has no entity).
    pub fn crud_keys(&self) -> Vec<PermissionKey> {
        CrudAction::ALL
            .into_iter()
            .filter_map(|action| self.crud_key(action))
            .collect()
    }

    pub fn custom_keys(&self) -> &[PermissionKey] {
        &self.custom
    }

    pub fn custom_messages(&self) -> &HashMap<PermissionKey, String> {
        &self.messages
    }

    /// CRUD keys (view, create, edit, delete) followed by custom keys in
    /// declaration order.
    pub fn enumerate_keys(&self) -> Vec<PermissionKey> {
        let mut keys = self.crud_keys();
        keys.extend(self.custom.iter().cloned());
        keys
    }

    pub fn owns(&self, key: &PermissionKey) -> bool {
        self.custom.contains(key) || self.crud_action_of(key).is_some()
    }

    fn crud_action_of(&self, key: &PermissionKey) -> Option<CrudAction> {
        let entity = self.entity()?;
        CrudAction::ALL
            .into_iter()
            .find(|action| derive_key(entity, *action) == *key)
    }
}

impl DenialMessages for PermissionDefinition {
    /// Override for the exact key, else the CRUD template for the entity,
    /// else [`GENERIC_DENIAL_MESSAGE`].
    fn denial_message(&self, key: &PermissionKey) -> String {
        if let Some(message) = self.messages.get(key) {
            return message.clone();
        }

        match (self.entity(), self.crud_action_of(key)) {
            (Some(entity), Some(action)) => action.denial_message(entity),
            _ => GENERIC_DENIAL_MESSAGE.to_string(),
        }
    }
}
