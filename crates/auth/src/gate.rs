//! Per-entity CRUD guard.

use std::sync::Arc;

use crate::authorize::{AuthzError, check};
use crate::catalog::CatalogError;
use crate::definition::PermissionDefinition;
use crate::permissions::{CrudAction, PermissionKey, derive_key};
use crate::principal::Principal;

/// Guards the four CRUD actions of one entity.
///
/// Each guard derives its key from the definition's entity, checks
/// authentication, then the principal's permissions. Denial text comes from
/// the definition (custom override, then CRUD template).
#[derive(Debug, Clone)]
pub struct CrudGate {
    definition: Arc<PermissionDefinition>,
}

impl CrudGate {
    pub fn new(definition: impl Into<Arc<PermissionDefinition>>) -> Result<Self, CatalogError> {
        let definition = definition.into();
        if definition.entity().is_none() {
            return Err(CatalogError::NotCrud(definition.name().to_string()));
        }
        Ok(Self { definition })
    }

    pub fn definition(&self) -> &PermissionDefinition {
        &self.definition
    }

    pub fn entity(&self) -> &str {
        self.definition.entity().unwrap_or_default()
    }

    pub fn key(&self, action: CrudAction) -> PermissionKey {
        derive_key(self.entity(), action)
    }

    pub fn can_view(&self, principal: Option<&Principal>) -> Result<(), AuthzError> {
        self.guard(principal, CrudAction::View, None)
    }

    pub fn can_create(&self, principal: Option<&Principal>) -> Result<(), AuthzError> {
        self.guard(principal, CrudAction::Create, None)
    }

    pub fn can_edit(
        &self,
        principal: Option<&Principal>,
        id: impl core::fmt::Display,
    ) -> Result<(), AuthzError> {
        self.guard(principal, CrudAction::Edit, Some(&id))
    }

    pub fn can_delete(
        &self,
        principal: Option<&Principal>,
        id: impl core::fmt::Display,
    ) -> Result<(), AuthzError> {
        self.guard(principal, CrudAction::Delete, Some(&id))
    }

    /// Guard an arbitrary key (typically one of the definition's custom keys).
    pub fn can(&self, principal: Option<&Principal>, key: &PermissionKey) -> Result<(), AuthzError> {
        check(principal, key, self.definition.as_ref())?;
        tracing::trace!(permission = %key, "access granted");
        Ok(())
    }

    fn guard(
        &self,
        principal: Option<&Principal>,
        action: CrudAction,
        target: Option<&dyn core::fmt::Display>,
    ) -> Result<(), AuthzError> {
        let key = self.key(action);
        check(principal, &key, self.definition.as_ref())?;
        match target {
            Some(id) => tracing::trace!(permission = %key, resource_id = %id, "access granted"),
            None => tracing::trace!(permission = %key, "access granted"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use adminkit_core::{RoleId, UserId};

    use super::*;
    use crate::definitions::{SUPER_ADMIN_ASSIGN_PERMISSION, roles, users};

    fn principal(keys: &[&'static str]) -> Principal {
        Principal::with_permissions(UserId::new(), keys.iter().map(|k| PermissionKey::new(*k)))
    }

    #[test]
    fn each_guard_checks_its_own_key() {
        let gate = CrudGate::new(users()).unwrap();
        let p = principal(&["users.view", "users.edit"]);

        assert!(gate.can_view(Some(&p)).is_ok());
        assert!(gate.can_edit(Some(&p), UserId::new()).is_ok());
        assert_eq!(
            gate.can_create(Some(&p)).unwrap_err().message(),
            "You are not authorized to create new users."
        );
        assert_eq!(
            gate.can_delete(Some(&p), UserId::new()).unwrap_err().message(),
            "You do not have the necessary permission to delete users."
        );
    }

    #[test]
    fn guards_require_authentication_first() {
        let gate = CrudGate::new(roles()).unwrap();
        assert_eq!(gate.can_view(None), Err(AuthzError::unauthenticated()));
        assert_eq!(gate.can_delete(None, RoleId::new()), Err(AuthzError::unauthenticated()));
    }

    #[test]
    fn custom_messages_override_templates() {
        let gate = CrudGate::new(users().with_message("users.view", "Staff directory is private.")).unwrap();
        let err = gate.can_view(Some(&principal(&[]))).unwrap_err();
        assert_eq!(err.message(), "Staff directory is private.");
    }

    #[test]
    fn custom_keys_resolve_their_own_message() {
        let gate = CrudGate::new(roles()).unwrap();
        let key = PermissionKey::new(SUPER_ADMIN_ASSIGN_PERMISSION);

        let err = gate.can(Some(&principal(&["roles.edit"])), &key).unwrap_err();
        assert_eq!(err.message(), "You are not super admin.");
        assert!(gate.can(Some(&principal(&[SUPER_ADMIN_ASSIGN_PERMISSION])), &key).is_ok());
    }

    #[test]
    fn definitions_without_entity_cannot_be_gated() {
        let err = CrudGate::new(PermissionDefinition::new("Reports")).unwrap_err();
        assert_eq!(err, CatalogError::NotCrud("Reports".to_string()));
    }
}
