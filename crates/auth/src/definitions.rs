//! Built-in permission definitions and the process-wide default catalog.

use std::sync::OnceLock;

use crate::catalog::{CatalogBuilder, CatalogError, PermissionCatalog};
use crate::definition::PermissionDefinition;
use crate::permissions::PermissionKey;

pub const USERS_ENTITY: &str = "users";
pub const ROLES_ENTITY: &str = "roles";

/// Custom key guarding permission assignment on roles.
pub const SUPER_ADMIN_ASSIGN_PERMISSION: &str = "roles.super_admin_assign_permission";

/// User accounts: CRUD only.
pub fn users() -> PermissionDefinition {
    PermissionDefinition::crud("Users", USERS_ENTITY)
}

/// Roles: CRUD plus the super-admin assignment permission.
pub fn roles() -> PermissionDefinition {
    PermissionDefinition::crud("Roles", ROLES_ENTITY)
        .with_custom_message(SUPER_ADMIN_ASSIGN_PERMISSION, "You are not super admin.")
}

/// Builder pre-registered with every built-in definition.
pub fn catalog_builder() -> CatalogBuilder {
    CatalogBuilder::new().register(users()).register(roles())
}

/// Curated grant for the Moderator role: full CRUD on users.
pub fn moderator_grant() -> Vec<PermissionKey> {
    users().crud_keys()
}

static DEFAULT_CATALOG: OnceLock<PermissionCatalog> = OnceLock::new();

/// The built-in catalog, computed once per process.
pub fn default_catalog() -> Result<&'static PermissionCatalog, CatalogError> {
    if let Some(catalog) = DEFAULT_CATALOG.get() {
        return Ok(catalog);
    }
    let built = catalog_builder().build()?;
    Ok(DEFAULT_CATALOG.get_or_init(|| built))
}
