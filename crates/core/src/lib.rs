//! `adminkit-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the permission
//! model and the persistence services (no infrastructure concerns).

pub mod delete_status;
pub mod entity;
pub mod error;
pub mod id;

pub use delete_status::DeleteStatus;
pub use entity::Entity;
pub use error::DomainError;
pub use id::{Id, IdKind, PermissionId, RoleId, UserId};
