//! User accounts with transactional role assignment.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use adminkit_core::{DeleteStatus, UserId};

use super::crud::{CrudService, ResourceKind};
use crate::error::ServiceError;
use crate::records::{Record, UserRecord};
use crate::store::{Filter, OrderBy, Page, Store, Tables};

pub const CREATE_FAILED: &str = "User creation failed";
pub const UPDATE_FAILED: &str = "User update synchronization error";
pub const ROLE_NOT_FOUND: &str = "User role not found.";

/// Input for [`UserService::create`]. `role` is a role name.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
    pub role: String,
}

/// Partial update; `None` leaves a field untouched. A `role` replaces every
/// role the user currently has.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserService {
    store: Arc<Store>,
    crud: CrudService<UserRecord, Arc<Store>>,
}

impl UserService {
    pub fn new(store: Arc<Store>) -> Self {
        let crud = CrudService::new(store.clone(), ResourceKind::USERS);
        Self { store, crud }
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.crud = self.crud.with_per_page(per_page);
        self
    }

    pub fn crud(&self) -> &CrudService<UserRecord, Arc<Store>> {
        &self.crud
    }

    /// Create the user and attach its role in one transaction.
    ///
    /// Any failure rolls everything back and is reported wrapped in
    /// [`ServiceError::Transaction`] with [`CREATE_FAILED`] as context.
    pub fn create(&self, input: NewUser) -> Result<UserRecord, ServiceError> {
        let email = input.email.clone();
        self.store
            .transaction(|tables| insert_user_with_role(tables, input))
            .map_err(|err| {
                tracing::error!(%email, error = %err, "user creation failed");
                ServiceError::transaction(CREATE_FAILED, err)
            })
    }

    /// Apply `changes` and, when given, replace the user's roles, atomically.
    ///
    /// An unknown user surfaces as `NotFound`; other failures are wrapped with
    /// [`UPDATE_FAILED`] as context.
    pub fn update(&self, id: &UserId, changes: UpdateUser) -> Result<UserRecord, ServiceError> {
        let result = self.store.transaction(|tables| -> Result<UserRecord, ServiceError> {
            let mut user = tables
                .users
                .get(id)
                .cloned()
                .ok_or_else(|| ResourceKind::USERS.not_found_error())?;

            if let Some(name) = changes.name {
                user.name = required("name", name)?;
            }
            if let Some(email) = changes.email {
                user.email = required("email", email)?;
            }
            if let Some(phone) = changes.phone {
                user.phone = Some(phone);
            }
            if let Some(password) = changes.password {
                user.password = password;
            }
            user.touch(Utc::now());
            let user = tables.users.replace(user)?;

            if let Some(role) = changes.role {
                let role = tables
                    .role_by_name(&role)
                    .map(|r| r.id)
                    .ok_or_else(|| ServiceError::invalid(ROLE_NOT_FOUND))?;
                tables.sync_roles(user.id, [role])?;
            }
            Ok(user)
        });

        result.map_err(|err| match err {
            ServiceError::NotFound(_) => err,
            other => {
                tracing::error!(user_id = %id, error = %other, "user update failed");
                ServiceError::transaction(UPDATE_FAILED, other)
            }
        })
    }

    pub fn get_by_id(&self, id: &UserId) -> Result<UserRecord, ServiceError> {
        self.crud.get_by_id(id)
    }

    /// Emails are unique, so there is at most one match.
    pub fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, ServiceError> {
        Ok(self.crud.find_by_column("email", email)?.into_iter().next())
    }

    pub fn all(&self, filters: &[Filter], order: &OrderBy) -> Result<Vec<UserRecord>, ServiceError> {
        self.crud.all(filters, order)
    }

    pub fn paginate(
        &self,
        page: usize,
        filters: &[Filter],
        order: &OrderBy,
    ) -> Result<Page<UserRecord>, ServiceError> {
        self.crud.paginate(None, page, filters, order)
    }

    pub fn delete(&self, id: &UserId, status: DeleteStatus) -> Result<DeleteStatus, ServiceError> {
        self.crud.delete(id, status)
    }

    /// Names of the roles assigned to a user.
    pub fn role_names(&self, id: &UserId) -> Result<Vec<String>, ServiceError> {
        self.get_by_id(id)?;
        Ok(self
            .store
            .read(|tables| tables.roles_of(id).into_iter().map(|r| r.name.clone()).collect::<Vec<_>>())?)
    }
}

/// Role lookup, user insert and role assignment against an open transaction.
pub(crate) fn insert_user_with_role(
    tables: &mut Tables,
    input: NewUser,
) -> Result<UserRecord, ServiceError> {
    let role = tables
        .role_by_name(&input.role)
        .map(|r| r.id)
        .ok_or_else(|| ServiceError::invalid(ROLE_NOT_FOUND))?;

    let user = tables.users.insert(UserRecord::new(
        required("name", input.name)?,
        required("email", input.email)?,
        input.phone,
        input.password,
    ))?;
    tables.assign_role(user.id, role)?;
    Ok(user)
}

fn required(field: &str, value: String) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::invalid(format!("The {field} field is required.")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_roles(names: &[&str]) -> Arc<Store> {
        let store = Arc::new(Store::default());
        store
            .transaction(|tables| -> Result<(), ServiceError> {
                for name in names {
                    tables.upsert_role(name, "web")?;
                }
                Ok(())
            })
            .unwrap();
        store
    }

    fn new_user(email: &str, role: &str) -> NewUser {
        NewUser {
            name: "Ann".into(),
            email: email.into(),
            phone: Some("0123".into()),
            password: "password".into(),
            role: role.into(),
        }
    }

    #[test]
    fn create_assigns_exactly_one_role() {
        let svc = UserService::new(store_with_roles(&["Moderator", "Cashier"]));
        let user = svc.create(new_user("ann@x.io", "Cashier")).unwrap();
        assert_eq!(svc.role_names(&user.id).unwrap(), vec!["Cashier"]);
        assert_eq!(user.deleted, Some(DeleteStatus::NotDeleted));
    }

    #[test]
    fn unknown_role_rolls_back_the_user() {
        let store = store_with_roles(&["Cashier"]);
        let svc = UserService::new(store.clone());

        let err = svc.create(new_user("ann@x.io", "Ghost")).unwrap_err();
        assert_eq!(err.to_string(), "User creation failed: User role not found.");
        assert!(matches!(err, ServiceError::Transaction { .. }));
        assert_eq!(store.read(|t| t.users.len()).unwrap(), 0);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let svc = UserService::new(store_with_roles(&["Cashier"]));
        svc.create(new_user("ann@x.io", "Cashier")).unwrap();
        let err = svc.create(new_user("ann@x.io", "Cashier")).unwrap_err();
        assert!(err.to_string().starts_with(CREATE_FAILED));
    }

    #[test]
    fn update_replaces_roles() {
        let svc = UserService::new(store_with_roles(&["Moderator", "Cashier"]));
        let user = svc.create(new_user("ann@x.io", "Cashier")).unwrap();

        let updated = svc
            .update(
                &user.id,
                UpdateUser {
                    name: Some("Annie".into()),
                    role: Some("Moderator".into()),
                    ..UpdateUser::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Annie");
        assert_eq!(svc.role_names(&user.id).unwrap(), vec!["Moderator"]);
    }

    #[test]
    fn failed_update_keeps_previous_state() {
        let svc = UserService::new(store_with_roles(&["Cashier"]));
        let user = svc.create(new_user("ann@x.io", "Cashier")).unwrap();

        let err = svc
            .update(
                &user.id,
                UpdateUser {
                    name: Some("Annie".into()),
                    role: Some("Ghost".into()),
                    ..UpdateUser::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "User update synchronization error: User role not found.");
        assert_eq!(svc.get_by_id(&user.id).unwrap().name, "Ann");

        let err = svc.update(&UserId::new(), UpdateUser::default()).unwrap_err();
        assert_eq!(err.to_string(), "User not found.");
    }
}
