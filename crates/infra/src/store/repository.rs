use std::sync::Arc;

use adminkit_core::DeleteStatus;

use super::query::{Filter, OrderBy};
use crate::error::StoreError;
use crate::records::Record;

/// Row-level persistence for one record type.
///
/// Implementations must be safe to share across threads. Each call is atomic
/// on its own; multi-step writes go through [`super::Store::transaction`].
pub trait Repository<T: Record>: Send + Sync {
    fn find(&self, id: &T::Id) -> Result<Option<T>, StoreError>;

    fn list(&self, filters: &[Filter], order: &OrderBy) -> Result<Vec<T>, StoreError>;

    fn count(&self, filters: &[Filter]) -> Result<usize, StoreError>;

    fn insert(&self, row: T) -> Result<T, StoreError>;

    fn update(&self, row: T) -> Result<T, StoreError>;

    /// Physically remove the row.
    fn remove(&self, id: &T::Id) -> Result<T, StoreError>;

    /// Set the soft-delete marker. Fails on tables without the column.
    fn mark_deleted(&self, id: &T::Id, status: DeleteStatus) -> Result<T, StoreError>;

    /// Schema introspection: does this table carry the `deleted` column?
    fn has_soft_delete_column(&self) -> Result<bool, StoreError>;
}

impl<T: Record, R: Repository<T> + ?Sized> Repository<T> for Arc<R> {
    fn find(&self, id: &T::Id) -> Result<Option<T>, StoreError> {
        (**self).find(id)
    }

    fn list(&self, filters: &[Filter], order: &OrderBy) -> Result<Vec<T>, StoreError> {
        (**self).list(filters, order)
    }

    fn count(&self, filters: &[Filter]) -> Result<usize, StoreError> {
        (**self).count(filters)
    }

    fn insert(&self, row: T) -> Result<T, StoreError> {
        (**self).insert(row)
    }

    fn update(&self, row: T) -> Result<T, StoreError> {
        (**self).update(row)
    }

    fn remove(&self, id: &T::Id) -> Result<T, StoreError> {
        (**self).remove(id)
    }

    fn mark_deleted(&self, id: &T::Id, status: DeleteStatus) -> Result<T, StoreError> {
        (**self).mark_deleted(id, status)
    }

    fn has_soft_delete_column(&self) -> Result<bool, StoreError> {
        (**self).has_soft_delete_column()
    }
}
