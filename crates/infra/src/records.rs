//! Persisted rows for users, roles and permissions.

use chrono::{DateTime, Utc};
use serde::Serialize;

use adminkit_core::{DeleteStatus, Entity, PermissionId, RoleId, UserId};

/// A row type the store can hold.
///
/// Rows are filtered and ordered through their JSON form, so every filterable
/// column must appear in the serialized output. The `deleted` column is only
/// serialized on tables that carry it.
pub trait Record: Entity + Clone + Serialize + Send + Sync + 'static {
    /// Column + value that must be unique within the table, if any.
    fn unique_value(&self) -> Option<(&'static str, &str)> {
        None
    }

    fn deleted(&self) -> Option<DeleteStatus>;

    fn set_deleted(&mut self, status: Option<DeleteStatus>);

    /// Stamp the row as modified.
    fn touch(&mut self, at: DateTime<Utc>);
}

/// User account row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Credential as handed over by the caller (hashing happens upstream).
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<DeleteStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: Option<String>,
        password: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            phone,
            password: password.into(),
            deleted: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for UserRecord {
    type Id = UserId;
    const TABLE: &'static str = "users";

    fn id(&self) -> &UserId {
        &self.id
    }
}

impl Record for UserRecord {
    fn unique_value(&self) -> Option<(&'static str, &str)> {
        Some(("email", &self.email))
    }

    fn deleted(&self) -> Option<DeleteStatus> {
        self.deleted
    }

    fn set_deleted(&mut self, status: Option<DeleteStatus>) {
        self.deleted = status;
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// Role row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: String,
    pub guard_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<DeleteStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoleRecord {
    pub fn new(name: impl Into<String>, guard_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RoleId::new(),
            name: name.into(),
            guard_name: guard_name.into(),
            deleted: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for RoleRecord {
    type Id = RoleId;
    const TABLE: &'static str = "roles";

    fn id(&self) -> &RoleId {
        &self.id
    }
}

impl Record for RoleRecord {
    fn unique_value(&self) -> Option<(&'static str, &str)> {
        Some(("name", &self.name))
    }

    fn deleted(&self) -> Option<DeleteStatus> {
        self.deleted
    }

    fn set_deleted(&mut self, status: Option<DeleteStatus>) {
        self.deleted = status;
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// Permission row; `group_name` is set when the key came from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionRecord {
    pub id: PermissionId,
    pub name: String,
    pub group_name: Option<String>,
    pub guard_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<DeleteStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PermissionRecord {
    pub fn new(
        name: impl Into<String>,
        group_name: Option<String>,
        guard_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PermissionId::new(),
            name: name.into(),
            group_name,
            guard_name: guard_name.into(),
            deleted: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for PermissionRecord {
    type Id = PermissionId;
    const TABLE: &'static str = "permissions";

    fn id(&self) -> &PermissionId {
        &self.id
    }
}

impl Record for PermissionRecord {
    fn unique_value(&self) -> Option<(&'static str, &str)> {
        Some(("name", &self.name))
    }

    fn deleted(&self) -> Option<DeleteStatus> {
        self.deleted
    }

    fn set_deleted(&mut self, status: Option<DeleteStatus>) {
        self.deleted = status;
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}
