//! Resolves authenticated principals from persisted role assignments.

use std::sync::Arc;

use adminkit_auth::Principal;
use adminkit_core::UserId;

use super::crud::ResourceKind;
use crate::error::ServiceError;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct AuthenticateService {
    store: Arc<Store>,
}

impl AuthenticateService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Principal for an active user: its roles plus the union of their
    /// permissions. Unknown and soft-deleted users are `NotFound`.
    pub fn principal_for(&self, id: &UserId) -> Result<Principal, ServiceError> {
        self.resolve(Some(*id))?
            .ok_or_else(|| ResourceKind::USERS.not_found_error())
    }

    /// Current principal, if any. Absent ids, unknown users and soft-deleted
    /// users all resolve to `None`.
    pub fn resolve(&self, id: Option<UserId>) -> Result<Option<Principal>, ServiceError> {
        let Some(id) = id else {
            return Ok(None);
        };
        let principal = self.store.read(|tables| {
            let user = tables.users.get(&id)?;
            if user.deleted.is_some_and(|status| status.is_deleted()) {
                return None;
            }
            Some(Principal::new(user.id, tables.role_assignments(&user.id)))
        })?;
        if principal.is_none() {
            tracing::debug!(user_id = %id, "no active user for principal");
        }
        Ok(principal)
    }
}
