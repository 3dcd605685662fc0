//! Infrastructure layer: persistence, services, seeding and configuration.

pub mod config;
pub mod error;
pub mod records;
pub mod seeder;
pub mod services;
pub mod store;


pub use config::{AppConfig, ConfigError};
pub use error::{ServiceError, StoreError};
pub use records::{PermissionRecord, Record, RoleRecord, UserRecord};
pub use seeder::{DemoUser, Grant, RoleGrant, SeedPlan, SeedReport, Seeder};
pub use services::Services;
pub use store::{
    Filter, FilterOp, OrderBy, Page, PgRecord, PgStore, Repository, Schema, SortDirection, Store, Tables,
};
