//! `adminkit-auth`: permission model and authorization checks.
//!
//! This crate has no HTTP or storage dependencies. It derives
//! permission keys from static definitions, aggregates them into a catalog and
//! decides allow/deny for a resolved [`Principal`].

pub mod authorize;
pub mod catalog;
pub mod definition;
pub mod definitions;
pub mod gate;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, RequiredPermissions, authorize, check, require_authenticated};
pub use catalog::{CatalogBuilder, CatalogError, PermissionCatalog, PermissionGroup};
pub use definition::{DenialMessages, PermissionDefinition};
pub use gate::CrudGate;
pub use permissions::{CrudAction, PermissionKey, derive_key};
pub use principal::{Principal, RoleAssignment};
pub use roles::{BootstrapRole, Role};
