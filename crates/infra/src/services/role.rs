//! Roles and their permission assignments.

use std::sync::Arc;

use adminkit_auth::{PermissionCatalog, PermissionKey};
use adminkit_core::{DeleteStatus, RoleId};

use super::crud::{CrudService, ResourceKind};
use crate::error::ServiceError;
use crate::records::RoleRecord;
use crate::store::{Filter, OrderBy, Store};

#[derive(Debug, Clone)]
pub struct RoleService {
    store: Arc<Store>,
    crud: CrudService<RoleRecord, Arc<Store>>,
    guard_name: String,
}

impl RoleService {
    pub fn new(store: Arc<Store>, guard_name: impl Into<String>) -> Self {
        let crud = CrudService::new(store.clone(), ResourceKind::ROLES);
        Self {
            store,
            crud,
            guard_name: guard_name.into(),
        }
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.crud = self.crud.with_per_page(per_page);
        self
    }

    pub fn crud(&self) -> &CrudService<RoleRecord, Arc<Store>> {
        &self.crud
    }

    pub fn create(&self, name: &str) -> Result<RoleRecord, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::invalid("The name field is required."));
        }
        self.crud.create(RoleRecord::new(name, self.guard_name.as_str()))
    }

    pub fn rename(&self, id: &RoleId, name: &str) -> Result<RoleRecord, ServiceError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::invalid("The name field is required."));
        }
        self.crud.update(id, |role| role.name = name)
    }

    pub fn get_by_id(&self, id: &RoleId) -> Result<RoleRecord, ServiceError> {
        self.crud.get_by_id(id)
    }

    pub fn all(&self, filters: &[Filter], order: &OrderBy) -> Result<Vec<RoleRecord>, ServiceError> {
        self.crud.all(filters, order)
    }

    pub fn delete(&self, id: &RoleId, status: DeleteStatus) -> Result<DeleteStatus, ServiceError> {
        self.crud.delete(id, status)
    }

    /// Keys assigned to a role, in name order.
    pub fn permissions(&self, id: &RoleId) -> Result<Vec<PermissionKey>, ServiceError> {
        self.get_by_id(id)?;
        Ok(self.store.read(|tables| {
            tables
                .role_permissions(id)
                .into_iter()
                .map(|p| PermissionKey::from(p.name.clone()))
                .collect::<Vec<_>>()
        })?)
    }

    /// Replace a role's permissions with `keys`.
    ///
    /// Every key must belong to `catalog`; missing permission rows are created
    /// with their catalog group. Returns the stored set in catalog order.
    pub fn sync_permissions(
        &self,
        id: &RoleId,
        keys: &[PermissionKey],
        catalog: &PermissionCatalog,
    ) -> Result<Vec<PermissionKey>, ServiceError> {
        if let Some(foreign) = keys.iter().find(|key| !catalog.contains(key)) {
            return Err(ServiceError::invalid(format!("Unknown permission '{foreign}'.")));
        }
        let keys = catalog.all_permissions_including(keys);

        self.store.transaction(|tables| -> Result<(), ServiceError> {
            if tables.roles.get(id).is_none() {
                return Err(ResourceKind::ROLES.not_found_error());
            }
            let mut ids = Vec::with_capacity(keys.len());
            for key in &keys {
                let group = catalog.group_of(key);
                let (permission, _) =
                    tables.upsert_permission(key.as_str(), group.as_deref(), &self.guard_name)?;
                ids.push(permission.id);
            }
            tables.sync_role_permissions(*id, ids)?;
            Ok(())
        })?;

        tracing::info!(role_id = %id, permissions = keys.len(), "role permissions synchronized");
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use adminkit_auth::definitions::default_catalog;

    use super::*;

    fn keys(raw: &[&'static str]) -> Vec<PermissionKey> {
        raw.iter().map(|k| PermissionKey::new(*k)).collect()
    }

    #[test]
    fn sync_replaces_and_orders_by_catalog() {
        let svc = RoleService::new(Arc::new(Store::default()), "web");
        let catalog = default_catalog().unwrap();
        let role = svc.create("Cashier").unwrap();

        let stored = svc
            .sync_permissions(&role.id, &keys(&["roles.view", "users.view", "users.view"]), catalog)
            .unwrap();
        assert_eq!(stored, keys(&["users.view", "roles.view"]));

        svc.sync_permissions(&role.id, &keys(&["users.edit"]), catalog).unwrap();
        assert_eq!(svc.permissions(&role.id).unwrap(), keys(&["users.edit"]));
    }

    #[test]
    fn keys_outside_the_catalog_are_rejected() {
        let svc = RoleService::new(Arc::new(Store::default()), "web");
        let catalog = default_catalog().unwrap();
        let role = svc.create("Cashier").unwrap();

        let err = svc
            .sync_permissions(&role.id, &keys(&["users.view", "billing.view"]), catalog)
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown permission 'billing.view'.");
        assert_eq!(err.status_code(), 422);
        assert!(svc.permissions(&role.id).unwrap().is_empty());
    }

    #[test]
    fn unknown_role() {
        let svc = RoleService::new(Arc::new(Store::default()), "web");
        let catalog = default_catalog().unwrap();
        let err = svc.sync_permissions(&RoleId::new(), &[], catalog).unwrap_err();
        assert_eq!(err.to_string(), "Role not found.");
        assert_eq!(svc.permissions(&RoleId::new()).unwrap_err().status_code(), 404);
    }

    #[test]
    fn duplicate_role_names_conflict() {
        let svc = RoleService::new(Arc::new(Store::default()), "web");
        svc.create("Cashier").unwrap();
        assert_eq!(svc.create("Cashier").unwrap_err().status_code(), 409);
        assert!(svc.create("  ").is_err());
    }
}
