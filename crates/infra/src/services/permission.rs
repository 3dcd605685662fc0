//! Persisted permission rows.

use std::sync::Arc;

use adminkit_auth::{PermissionGroup, PermissionKey};
use adminkit_core::{DeleteStatus, PermissionId};

use super::crud::{CrudService, ResourceKind};
use crate::error::ServiceError;
use crate::records::PermissionRecord;
use crate::store::{Filter, OrderBy, Store};

#[derive(Debug, Clone)]
pub struct PermissionService {
    crud: CrudService<PermissionRecord, Arc<Store>>,
}

impl PermissionService {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            crud: CrudService::new(store, ResourceKind::PERMISSIONS),
        }
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.crud = self.crud.with_per_page(per_page);
        self
    }

    pub fn crud(&self) -> &CrudService<PermissionRecord, Arc<Store>> {
        &self.crud
    }

    pub fn get_by_id(&self, id: &PermissionId) -> Result<PermissionRecord, ServiceError> {
        self.crud.get_by_id(id)
    }

    pub fn all(&self, filters: &[Filter], order: &OrderBy) -> Result<Vec<PermissionRecord>, ServiceError> {
        self.crud.all(filters, order)
    }

    pub fn delete(&self, id: &PermissionId, status: DeleteStatus) -> Result<DeleteStatus, ServiceError> {
        self.crud.delete(id, status)
    }

    /// Persisted permissions grouped by `group_name`, groups in first-seen
    /// order (oldest row first). Rows without a group are left out.
    pub fn permission_groups(&self) -> Result<Vec<PermissionGroup>, ServiceError> {
        let rows = self.crud.all(&[], &OrderBy::asc("id"))?;
        let mut groups: Vec<PermissionGroup> = Vec::new();
        for row in rows {
            let Some(group_name) = row.group_name else {
                continue;
            };
            let key = PermissionKey::from(row.name);
            match groups.iter_mut().find(|g| g.group_name == group_name) {
                Some(group) => group.permissions.push(key),
                None => groups.push(PermissionGroup {
                    group_name,
                    permissions: vec![key],
                }),
            }
        }
        Ok(groups)
    }
}
