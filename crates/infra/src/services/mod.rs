//! Entity services over the store.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::Store;

pub mod authenticate;
pub mod crud;
pub mod permission;
pub mod role;
pub mod user;

pub use authenticate::AuthenticateService;
pub use crud::{CrudService, ResourceKind};
pub use permission::PermissionService;
pub use role::RoleService;
pub use user::{NewUser, UpdateUser, UserService};

/// Every entity service over one store, built from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct Services {
    pub users: UserService,
    pub roles: RoleService,
    pub permissions: PermissionService,
    pub authenticate: AuthenticateService,
}

impl Services {
    /// Listings page by `config.per_page`; new roles get `config.guard_name`.
    pub fn new(store: Arc<Store>, config: &AppConfig) -> Self {
        Self {
            users: UserService::new(store.clone()).with_per_page(config.per_page),
            roles: RoleService::new(store.clone(), config.guard_name.as_str()).with_per_page(config.per_page),
            permissions: PermissionService::new(store.clone()).with_per_page(config.per_page),
            authenticate: AuthenticateService::new(store),
        }
    }
}
