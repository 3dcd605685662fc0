use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde_json::{Map, Value};

use adminkit_auth::{PermissionKey, Role, RoleAssignment};
use adminkit_core::{DeleteStatus, Entity, PermissionId, RoleId, UserId};

use super::query::{Filter, OrderBy, SortDirection, compare};
use crate::error::StoreError;
use crate::records::{PermissionRecord, Record, RoleRecord, UserRecord};

/// Rows of one entity keyed by id.
#[derive(Debug, Clone)]
pub struct Table<T: Record> {
    rows: BTreeMap<T::Id, T>,
    soft_delete: bool,
}

impl<T: Record> Table<T> {
    pub fn new(soft_delete: bool) -> Self {
        Self {
            rows: BTreeMap::new(),
            soft_delete,
        }
    }

    /// Whether rows carry the `deleted` marker column.
    pub fn has_soft_delete_column(&self) -> bool {
        self.soft_delete
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.rows.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    /// Row whose unique column equals `value`.
    pub fn find_unique(&self, value: &str) -> Option<&T> {
        self.rows
            .values()
            .find(|row| row.unique_value().is_some_and(|(_, v)| v == value))
    }

    pub fn insert(&mut self, mut row: T) -> Result<T, StoreError> {
        if self.rows.contains_key(row.id()) {
            return Err(StoreError::Duplicate {
                table: T::TABLE,
                column: "id",
                value: row.id().to_string(),
            });
        }
        self.ensure_unique(&row)?;
        self.normalize(&mut row);
        self.rows.insert(row.id().clone(), row.clone());
        Ok(row)
    }

    /// Overwrite an existing row.
    pub fn replace(&mut self, mut row: T) -> Result<T, StoreError> {
        if !self.rows.contains_key(row.id()) {
            return Err(self.missing(row.id()));
        }
        self.ensure_unique(&row)?;
        self.normalize(&mut row);
        self.rows.insert(row.id().clone(), row.clone());
        Ok(row)
    }

    pub fn remove(&mut self, id: &T::Id) -> Result<T, StoreError> {
        self.rows.remove(id).ok_or_else(|| self.missing(id))
    }

    /// Set the `deleted` marker.
    pub fn mark(&mut self, id: &T::Id, status: DeleteStatus) -> Result<T, StoreError> {
        if !self.soft_delete {
            return Err(StoreError::NoSoftDeleteColumn(T::TABLE));
        }
        let missing = self.missing(id);
        let row = self.rows.get_mut(id).ok_or(missing)?;
        row.set_deleted(Some(status));
        row.touch(Utc::now());
        Ok(row.clone())
    }

    /// Rows matching every filter, sorted by `order`.
    pub fn select(&self, filters: &[Filter], order: &OrderBy) -> Result<Vec<T>, StoreError> {
        let mut matched: Vec<(Map<String, Value>, &T)> = Vec::new();
        for row in self.rows.values() {
            let projected = project(row)?;
            let mut keep = true;
            for filter in filters {
                if !filter.matches(&projected, T::TABLE)? {
                    keep = false;
                    break;
                }
            }
            if keep {
                matched.push((projected, row));
            }
        }

        if let Some((first, _)) = matched.first() {
            if !first.contains_key(&order.column) {
                return Err(StoreError::InvalidQuery(format!(
                    "unknown order column '{}' on {}",
                    order.column,
                    T::TABLE
                )));
            }
        }

        matched.sort_by(|(a, _), (b, _)| {
            let ordering = compare(
                a.get(&order.column).unwrap_or(&Value::Null),
                b.get(&order.column).unwrap_or(&Value::Null),
            );
            match order.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        Ok(matched.into_iter().map(|(_, row)| row.clone()).collect())
    }

    fn ensure_unique(&self, row: &T) -> Result<(), StoreError> {
        let Some((column, value)) = row.unique_value() else {
            return Ok(());
        };
        let taken = self.rows.values().any(|other| {
            other.id() != row.id() && other.unique_value().is_some_and(|(_, v)| v == value)
        });
        if taken {
            return Err(StoreError::Duplicate {
                table: T::TABLE,
                column,
                value: value.to_string(),
            });
        }
        Ok(())
    }

    /// The marker exists exactly when the table has the column.
    fn normalize(&self, row: &mut T) {
        if self.soft_delete {
            row.set_deleted(Some(row.deleted().unwrap_or(DeleteStatus::NotDeleted)));
        } else {
            row.set_deleted(None);
        }
    }

    fn missing(&self, id: &T::Id) -> StoreError {
        StoreError::Missing {
            table: T::TABLE,
            id: id.to_string(),
        }
    }
}

fn project<T: Record>(row: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(row)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(format!(
            "{} row serialized to non-object {other}",
            T::TABLE
        ))),
    }
}

/// Which entity tables carry the soft-delete column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub users_soft_delete: bool,
    pub roles_soft_delete: bool,
    pub permissions_soft_delete: bool,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            users_soft_delete: true,
            roles_soft_delete: false,
            permissions_soft_delete: false,
        }
    }
}

/// Every table plus the role/permission and user/role pivots.
#[derive(Debug, Clone)]
pub struct Tables {
    pub users: Table<UserRecord>,
    pub roles: Table<RoleRecord>,
    pub permissions: Table<PermissionRecord>,
    role_permissions: BTreeMap<RoleId, BTreeSet<PermissionId>>,
    user_roles: BTreeMap<UserId, BTreeSet<RoleId>>,
}

impl Tables {
    pub fn new(schema: &Schema) -> Self {
        Self {
            users: Table::new(schema.users_soft_delete),
            roles: Table::new(schema.roles_soft_delete),
            permissions: Table::new(schema.permissions_soft_delete),
            role_permissions: BTreeMap::new(),
            user_roles: BTreeMap::new(),
        }
    }

    pub fn role_by_name(&self, name: &str) -> Option<&RoleRecord> {
        self.roles.find_unique(name)
    }

    pub fn permission_by_name(&self, name: &str) -> Option<&PermissionRecord> {
        self.permissions.find_unique(name)
    }

    /// Insert the role unless one with that name exists. Returns the row and
    /// whether it was created.
    pub fn upsert_role(&mut self, name: &str, guard_name: &str) -> Result<(RoleRecord, bool), StoreError> {
        if let Some(existing) = self.role_by_name(name) {
            return Ok((existing.clone(), false));
        }
        let role = self.roles.insert(RoleRecord::new(name, guard_name))?;
        Ok((role, true))
    }

    /// Insert the permission unless one with that name exists. An existing
    /// row without a group adopts `group_name`.
    pub fn upsert_permission(
        &mut self,
        name: &str,
        group_name: Option<&str>,
        guard_name: &str,
    ) -> Result<(PermissionRecord, bool), StoreError> {
        if let Some(existing) = self.permission_by_name(name).cloned() {
            if existing.group_name.is_none() && group_name.is_some() {
                let mut updated = existing;
                updated.group_name = group_name.map(str::to_string);
                updated.touch(Utc::now());
                return Ok((self.permissions.replace(updated)?, false));
            }
            return Ok((existing, false));
        }
        let created = self.permissions.insert(PermissionRecord::new(
            name,
            group_name.map(str::to_string),
            guard_name,
        ))?;
        Ok((created, true))
    }

    /// Add permissions to a role, keeping what it already has.
    pub fn give_permissions(
        &mut self,
        role: RoleId,
        permissions: impl IntoIterator<Item = PermissionId>,
    ) -> Result<(), StoreError> {
        self.require_role(&role)?;
        let ids = self.require_permissions(permissions)?;
        self.role_permissions.entry(role).or_default().extend(ids);
        Ok(())
    }

    /// Replace a role's permissions.
    pub fn sync_role_permissions(
        &mut self,
        role: RoleId,
        permissions: impl IntoIterator<Item = PermissionId>,
    ) -> Result<(), StoreError> {
        self.require_role(&role)?;
        let ids = self.require_permissions(permissions)?;
        self.role_permissions.insert(role, ids);
        Ok(())
    }

    /// Permission rows assigned to a role, in name order.
    pub fn role_permissions(&self, role: &RoleId) -> Vec<&PermissionRecord> {
        let mut rows: Vec<&PermissionRecord> = self
            .role_permissions
            .get(role)
            .into_iter()
            .flatten()
            .filter_map(|id| self.permissions.get(id))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    pub fn assign_role(&mut self, user: UserId, role: RoleId) -> Result<(), StoreError> {
        self.require_user(&user)?;
        self.require_role(&role)?;
        self.user_roles.entry(user).or_default().insert(role);
        Ok(())
    }

    /// Replace a user's roles.
    pub fn sync_roles(
        &mut self,
        user: UserId,
        roles: impl IntoIterator<Item = RoleId>,
    ) -> Result<(), StoreError> {
        self.require_user(&user)?;
        let mut ids = BTreeSet::new();
        for role in roles {
            self.require_role(&role)?;
            ids.insert(role);
        }
        self.user_roles.insert(user, ids);
        Ok(())
    }

    pub fn roles_of(&self, user: &UserId) -> Vec<&RoleRecord> {
        self.user_roles
            .get(user)
            .into_iter()
            .flatten()
            .filter_map(|id| self.roles.get(id))
            .collect()
    }

    /// The user's roles with their persisted permission keys.
    pub fn role_assignments(&self, user: &UserId) -> Vec<RoleAssignment> {
        self.roles_of(user)
            .into_iter()
            .map(|role| {
                let keys = self
                    .role_permissions(&role.id)
                    .into_iter()
                    .map(|p| PermissionKey::from(p.name.clone()));
                RoleAssignment::new(Role::new(role.name.clone()), keys)
            })
            .collect()
    }

    fn require_user(&self, id: &UserId) -> Result<(), StoreError> {
        match self.users.get(id) {
            Some(_) => Ok(()),
            None => Err(self.users.missing(id)),
        }
    }

    fn require_role(&self, id: &RoleId) -> Result<(), StoreError> {
        match self.roles.get(id) {
            Some(_) => Ok(()),
            None => Err(self.roles.missing(id)),
        }
    }

    fn require_permissions(
        &self,
        ids: impl IntoIterator<Item = PermissionId>,
    ) -> Result<BTreeSet<PermissionId>, StoreError> {
        let mut set = BTreeSet::new();
        for id in ids {
            if self.permissions.get(&id).is_none() {
                return Err(self.permissions.missing(&id));
            }
            set.insert(id);
        }
        Ok(set)
    }
}

/// Typed access to one table of [`Tables`], plus cleanup of pivot rows when a
/// row is physically removed.
pub trait HasTable<T: Record> {
    fn table(&self) -> &Table<T>;

    fn table_mut(&mut self) -> &mut Table<T>;

    fn on_removed(&mut self, _id: &T::Id) {}
}

impl HasTable<UserRecord> for Tables {
    fn table(&self) -> &Table<UserRecord> {
        &self.users
    }

    fn table_mut(&mut self) -> &mut Table<UserRecord> {
        &mut self.users
    }

    fn on_removed(&mut self, id: &UserId) {
        self.user_roles.remove(id);
    }
}

impl HasTable<RoleRecord> for Tables {
    fn table(&self) -> &Table<RoleRecord> {
        &self.roles
    }

    fn table_mut(&mut self) -> &mut Table<RoleRecord> {
        &mut self.roles
    }

    fn on_removed(&mut self, id: &RoleId) {
        self.role_permissions.remove(id);
        for roles in self.user_roles.values_mut() {
            roles.remove(id);
        }
    }
}

impl HasTable<PermissionRecord> for Tables {
    fn table(&self) -> &Table<PermissionRecord> {
        &self.permissions
    }

    fn table_mut(&mut self) -> &mut Table<PermissionRecord> {
        &mut self.permissions
    }

    fn on_removed(&mut self, id: &PermissionId) {
        for permissions in self.role_permissions.values_mut() {
            permissions.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FilterOp;

    fn tables() -> Tables {
        Tables::new(&Schema::default())
    }

    #[test]
    fn deleted_marker_follows_schema() {
        let mut t = tables();
        let user = t.users.insert(UserRecord::new("A", "a@x.io", None, "pw")).unwrap();
        assert_eq!(user.deleted, Some(DeleteStatus::NotDeleted));

        let mut role = RoleRecord::new("Cashier", "web");
        role.deleted = Some(DeleteStatus::SoftDelete);
        let role = t.roles.insert(role).unwrap();
        assert_eq!(role.deleted, None);
        assert_eq!(
            t.roles.mark(&role.id, DeleteStatus::SoftDelete),
            Err(StoreError::NoSoftDeleteColumn("roles"))
        );
    }

    #[test]
    fn unique_columns_are_enforced() {
        let mut t = tables();
        t.users.insert(UserRecord::new("A", "a@x.io", None, "pw")).unwrap();
        let err = t.users.insert(UserRecord::new("B", "a@x.io", None, "pw")).unwrap_err();
        assert_eq!(
            err,
            StoreError::Duplicate {
                table: "users",
                column: "email",
                value: "a@x.io".into()
            }
        );
    }

    #[test]
    fn select_filters_and_orders() {
        let mut t = tables();
        for name in ["Cashier", "Admin", "Moderator"] {
            t.upsert_role(name, "web").unwrap();
        }
        let names: Vec<String> = t
            .roles
            .select(&[], &OrderBy::asc("name"))
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Admin", "Cashier", "Moderator"]);

        let filtered = t
            .roles
            .select(&[Filter::new("name", FilterOp::Ne, "Admin")], &OrderBy::desc("name"))
            .unwrap();
        assert_eq!(filtered[0].name, "Moderator");
        assert_eq!(filtered.len(), 2);

        assert!(t.roles.select(&[], &OrderBy::asc("nope")).is_err());
    }

    #[test]
    fn upserts_are_idempotent() {
        let mut t = tables();
        let (first, created) = t.upsert_permission("users.view", None, "web").unwrap();
        assert!(created);
        let (second, created) = t.upsert_permission("users.view", Some("users"), "web").unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(second.group_name.as_deref(), Some("users"));
        assert_eq!(t.permissions.len(), 1);
    }

    #[test]
    fn removing_a_permission_detaches_it_from_roles() {
        let mut t = tables();
        let (role, _) = t.upsert_role("Moderator", "web").unwrap();
        let (view, _) = t.upsert_permission("users.view", Some("users"), "web").unwrap();
        let (edit, _) = t.upsert_permission("users.edit", Some("users"), "web").unwrap();
        t.give_permissions(role.id, [view.id, edit.id]).unwrap();

        t.permissions.remove(&view.id).unwrap();
        HasTable::<PermissionRecord>::on_removed(&mut t, &view.id);

        let names: Vec<&str> = t.role_permissions(&role.id).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["users.edit"]);
    }

    #[test]
    fn role_assignments_carry_permission_keys() {
        let mut t = tables();
        let user = t.users.insert(UserRecord::new("A", "a@x.io", None, "pw")).unwrap();
        let (role, _) = t.upsert_role("Moderator", "web").unwrap();
        let (view, _) = t.upsert_permission("users.view", Some("users"), "web").unwrap();
        t.give_permissions(role.id, [view.id]).unwrap();
        t.assign_role(user.id, role.id).unwrap();

        let assignments = t.role_assignments(&user.id);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].role.as_str(), "Moderator");
        assert_eq!(assignments[0].permissions, vec![PermissionKey::new("users.view")]);
    }
}
