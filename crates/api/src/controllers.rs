//! Controller actions: a CRUD gate check followed by the service call.

use adminkit_auth::definitions::{SUPER_ADMIN_ASSIGN_PERMISSION, roles, users};
use adminkit_auth::{CrudGate, PermissionCatalog, PermissionGroup, PermissionKey};
use adminkit_core::{DeleteStatus, RoleId, UserId};
use adminkit_infra::services::{NewUser, PermissionService, RoleService, UpdateUser, UserService};
use adminkit_infra::{Filter, OrderBy, Page, RoleRecord, UserRecord};

use crate::context::RequestContext;
use crate::errors::ApiError;

pub struct UserController {
    gate: CrudGate,
    users: UserService,
}

impl UserController {
    pub fn new(users: UserService) -> Result<Self, ApiError> {
        let gate = CrudGate::new(self::users()).map_err(adminkit_infra::ServiceError::from)?;
        Ok(Self { gate, users })
    }

    pub fn index(
        &self,
        ctx: &RequestContext,
        page: usize,
        filters: &[Filter],
    ) -> Result<Page<UserRecord>, ApiError> {
        self.gate.can_view(ctx.principal())?;
        Ok(self.users.paginate(page, filters, &OrderBy::default())?)
    }

    pub fn show(&self, ctx: &RequestContext, id: UserId) -> Result<UserRecord, ApiError> {
        self.gate.can_view(ctx.principal())?;
        Ok(self.users.get_by_id(&id)?)
    }

    pub fn store(&self, ctx: &RequestContext, input: NewUser) -> Result<UserRecord, ApiError> {
        self.gate.can_create(ctx.principal())?;
        Ok(self.users.create(input)?)
    }

    pub fn update(
        &self,
        ctx: &RequestContext,
        id: UserId,
        changes: UpdateUser,
    ) -> Result<UserRecord, ApiError> {
        self.gate.can_edit(ctx.principal(), id)?;
        Ok(self.users.update(&id, changes)?)
    }

    pub fn destroy(
        &self,
        ctx: &RequestContext,
        id: UserId,
        status: DeleteStatus,
    ) -> Result<DeleteStatus, ApiError> {
        self.gate.can_delete(ctx.principal(), id)?;
        Ok(self.users.delete(&id, status)?)
    }
}

pub struct RoleController {
    gate: CrudGate,
    roles: RoleService,
    permissions: PermissionService,
    catalog: PermissionCatalog,
}

impl RoleController {
    pub fn new(
        roles: RoleService,
        permissions: PermissionService,
        catalog: PermissionCatalog,
    ) -> Result<Self, ApiError> {
        let gate = CrudGate::new(self::roles()).map_err(adminkit_infra::ServiceError::from)?;
        Ok(Self {
            gate,
            roles,
            permissions,
            catalog,
        })
    }

    pub fn index(&self, ctx: &RequestContext) -> Result<Vec<RoleRecord>, ApiError> {
        self.gate.can_view(ctx.principal())?;
        Ok(self.roles.all(&[], &OrderBy::asc("name"))?)
    }

    pub fn show(&self, ctx: &RequestContext, id: RoleId) -> Result<RoleRecord, ApiError> {
        self.gate.can_view(ctx.principal())?;
        Ok(self.roles.get_by_id(&id)?)
    }

    pub fn store(&self, ctx: &RequestContext, name: &str) -> Result<RoleRecord, ApiError> {
        self.gate.can_create(ctx.principal())?;
        Ok(self.roles.create(name)?)
    }

    pub fn update(&self, ctx: &RequestContext, id: RoleId, name: &str) -> Result<RoleRecord, ApiError> {
        self.gate.can_edit(ctx.principal(), id)?;
        Ok(self.roles.rename(&id, name)?)
    }

    pub fn destroy(
        &self,
        ctx: &RequestContext,
        id: RoleId,
        status: DeleteStatus,
    ) -> Result<DeleteStatus, ApiError> {
        self.gate.can_delete(ctx.principal(), id)?;
        Ok(self.roles.delete(&id, status)?)
    }

    /// Persisted permissions grouped for the role editing form.
    pub fn permission_groups(&self, ctx: &RequestContext) -> Result<Vec<PermissionGroup>, ApiError> {
        self.gate.can_view(ctx.principal())?;
        Ok(self.permissions.permission_groups()?)
    }

    pub fn permissions(&self, ctx: &RequestContext, id: RoleId) -> Result<Vec<PermissionKey>, ApiError> {
        self.gate.can_view(ctx.principal())?;
        Ok(self.roles.permissions(&id)?)
    }

    /// Replace a role's permissions. Restricted to holders of the super-admin
    /// assignment permission.
    pub fn assign_permissions(
        &self,
        ctx: &RequestContext,
        id: RoleId,
        keys: &[PermissionKey],
    ) -> Result<Vec<PermissionKey>, ApiError> {
        self.gate
            .can(ctx.principal(), &PermissionKey::new(SUPER_ADMIN_ASSIGN_PERMISSION))?;
        Ok(self.roles.sync_permissions(&id, keys, &self.catalog)?)
    }
}
