//! Persistence behind the [`Repository`] seam: an in-memory relational store
//! and a Postgres one.

mod memory;
pub mod postgres;
mod query;
mod repository;
mod table;

pub use memory::Store;
pub use postgres::{PgRecord, PgStore};
pub use query::{Filter, FilterOp, OrderBy, PER_PAGE, Page, SortDirection};
pub use repository::Repository;
pub use table::{HasTable, Schema, Table, Tables};
