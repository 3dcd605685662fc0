//! Generic read/write/soft-delete service shared by the entity services.

use std::marker::PhantomData;

use chrono::Utc;

use adminkit_core::DeleteStatus;

use crate::error::{ServiceError, StoreError};
use crate::records::Record;
use crate::store::{Filter, OrderBy, PER_PAGE, Page, Repository};

/// Describes a resource for error reporting.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceKind {
    pub name: &'static str,
    pub not_found: &'static str,
}

impl ResourceKind {
    pub const USERS: ResourceKind = ResourceKind {
        name: "users",
        not_found: "User not found.",
    };

    pub const ROLES: ResourceKind = ResourceKind {
        name: "roles",
        not_found: "Role not found.",
    };

    pub const PERMISSIONS: ResourceKind = ResourceKind {
        name: "permissions",
        not_found: "Permission not found.",
    };

    pub fn not_found_error(&self) -> ServiceError {
        ServiceError::not_found(self.not_found)
    }
}

/// CRUD over one record type.
#[derive(Debug, Clone)]
pub struct CrudService<T, R> {
    repo: R,
    kind: ResourceKind,
    per_page: usize,
    _record: PhantomData<fn() -> T>,
}

impl<T, R> CrudService<T, R>
where
    T: Record,
    R: Repository<T>,
{
    pub fn new(repo: R, kind: ResourceKind) -> Self {
        Self {
            repo,
            kind,
            per_page: PER_PAGE,
            _record: PhantomData,
        }
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Fetch by id. Soft-deleted rows are still returned.
    pub fn get_by_id(&self, id: &T::Id) -> Result<T, ServiceError> {
        self.repo.find(id)?.ok_or_else(|| self.kind.not_found_error())
    }

    /// Rows (newest first) whose `column` equals `value`.
    pub fn find_by_column(
        &self,
        column: &str,
        value: impl Into<serde_json::Value>,
    ) -> Result<Vec<T>, ServiceError> {
        self.find_by_where(&[Filter::eq(column, value)])
    }

    /// Rows (newest first) matching every filter.
    pub fn find_by_where(&self, filters: &[Filter]) -> Result<Vec<T>, ServiceError> {
        Ok(self.repo.list(filters, &OrderBy::default())?)
    }

    pub fn all(&self, filters: &[Filter], order: &OrderBy) -> Result<Vec<T>, ServiceError> {
        Ok(self.repo.list(filters, order)?)
    }

    /// One page of matching rows. `per_page` falls back to the configured size.
    pub fn paginate(
        &self,
        per_page: Option<usize>,
        page: usize,
        filters: &[Filter],
        order: &OrderBy,
    ) -> Result<Page<T>, ServiceError> {
        let rows = self.repo.list(filters, order)?;
        Ok(Page::from_rows(rows, per_page.unwrap_or(self.per_page), page))
    }

    pub fn count(&self, filters: &[Filter]) -> Result<usize, ServiceError> {
        Ok(self.repo.count(filters)?)
    }

    pub fn create(&self, row: T) -> Result<T, ServiceError> {
        Ok(self.repo.insert(row)?)
    }

    /// Load, modify and save a row.
    pub fn update(&self, id: &T::Id, apply: impl FnOnce(&mut T)) -> Result<T, ServiceError> {
        let mut row = self.get_by_id(id)?;
        apply(&mut row);
        row.touch(Utc::now());
        self.repo.update(row).map_err(|err| self.missing_as_not_found(err))
    }

    /// Delete according to `status` and the table's schema.
    ///
    /// With a `deleted` column, `NotDeleted` and `SoftDelete` flip the marker.
    /// `PermanentDelete`, or any status on a table without the column, removes
    /// the row. Returns the action actually applied.
    pub fn delete(&self, id: &T::Id, status: DeleteStatus) -> Result<DeleteStatus, ServiceError> {
        self.get_by_id(id)?;

        let soft = self.repo.has_soft_delete_column()?;
        if soft && status != DeleteStatus::PermanentDelete {
            self.repo
                .mark_deleted(id, status)
                .map_err(|err| self.missing_as_not_found(err))?;
            return Ok(status);
        }

        if status != DeleteStatus::PermanentDelete {
            tracing::debug!(
                resource = self.kind.name,
                requested = %status,
                "no soft-delete column; deleting permanently"
            );
        }
        self.repo
            .remove(id)
            .map_err(|err| self.missing_as_not_found(err))?;
        Ok(DeleteStatus::PermanentDelete)
    }

    fn missing_as_not_found(&self, err: StoreError) -> ServiceError {
        match err {
            StoreError::Missing { .. } => self.kind.not_found_error(),
            other => ServiceError::Store(other),
        }
    }
}
