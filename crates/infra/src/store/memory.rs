use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use adminkit_core::{DeleteStatus, Entity};

use super::query::{Filter, OrderBy};
use super::repository::Repository;
use super::table::{HasTable, Schema, Tables};
use crate::error::StoreError;
use crate::records::Record;

/// In-memory relational store.
///
/// Transactions run against a copy of every table and swap it in on success,
/// so a failed closure leaves no partial writes behind. Writers are serialized
/// by the lock.
#[derive(Debug)]
pub struct Store {
    tables: RwLock<Tables>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Schema::default())
    }
}

impl Store {
    pub fn new(schema: Schema) -> Self {
        Self {
            tables: RwLock::new(Tables::new(&schema)),
        }
    }

    /// Run `f` against a consistent view of all tables.
    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> Result<R, StoreError> {
        let guard = self.read_guard()?;
        Ok(f(&*guard))
    }

    /// Run `f` atomically: its writes commit only if it returns `Ok`.
    pub fn transaction<R, E>(&self, f: impl FnOnce(&mut Tables) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut guard = self.write_guard()?;
        let mut working = Tables::clone(&*guard);
        match f(&mut working) {
            Ok(value) => {
                *guard = working;
                Ok(value)
            }
            Err(err) => {
                tracing::debug!("transaction rolled back");
                Err(err)
            }
        }
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

impl<T> Repository<T> for Store
where
    T: Record,
    Tables: HasTable<T>,
{
    fn find(&self, id: &T::Id) -> Result<Option<T>, StoreError> {
        self.read(|tables| HasTable::<T>::table(tables).get(id).cloned())
    }

    fn list(&self, filters: &[Filter], order: &OrderBy) -> Result<Vec<T>, StoreError> {
        self.read(|tables| HasTable::<T>::table(tables).select(filters, order))?
    }

    fn count(&self, filters: &[Filter]) -> Result<usize, StoreError> {
        Ok(self.list(filters, &OrderBy::default())?.len())
    }

    fn insert(&self, row: T) -> Result<T, StoreError> {
        let mut tables = self.write_guard()?;
        HasTable::<T>::table_mut(&mut *tables).insert(row)
    }

    fn update(&self, row: T) -> Result<T, StoreError> {
        let mut tables = self.write_guard()?;
        HasTable::<T>::table_mut(&mut *tables).replace(row)
    }

    fn remove(&self, id: &T::Id) -> Result<T, StoreError> {
        let mut tables = self.write_guard()?;
        let removed = HasTable::<T>::table_mut(&mut *tables).remove(id)?;
        HasTable::<T>::on_removed(&mut *tables, removed.id());
        Ok(removed)
    }

    fn mark_deleted(&self, id: &T::Id, status: DeleteStatus) -> Result<T, StoreError> {
        let mut tables = self.write_guard()?;
        HasTable::<T>::table_mut(&mut *tables).mark(id, status)
    }

    fn has_soft_delete_column(&self) -> Result<bool, StoreError> {
        self.read(|tables| HasTable::<T>::table(tables).has_soft_delete_column())
    }
}
