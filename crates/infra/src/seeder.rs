//! Provisioning: permissions, bootstrap roles, role grants and demo accounts.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use adminkit_auth::definitions::moderator_grant;
use adminkit_auth::{BootstrapRole, PermissionCatalog, PermissionKey};

use crate::error::ServiceError;
use crate::services::NewUser;
use crate::services::user::insert_user_with_role;
use crate::store::{Store, Tables};

/// Which catalog keys a role receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// The whole catalog.
    Everything,
    /// Catalog keys that are also listed here.
    Including(Vec<PermissionKey>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub role: BootstrapRole,
    pub grant: Grant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoUser {
    pub name: &'static str,
    pub email: &'static str,
    pub phone: &'static str,
    pub password: &'static str,
    pub role: BootstrapRole,
}

/// What a seed run provisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    pub roles: Vec<BootstrapRole>,
    pub grants: Vec<RoleGrant>,
    pub demo_users: Vec<DemoUser>,
}

impl SeedPlan {
    /// Bootstrap roles, Super Admin with the full catalog and Moderator with
    /// user management.
    pub fn standard() -> Self {
        Self {
            roles: BootstrapRole::ALL.to_vec(),
            grants: vec![
                RoleGrant {
                    role: BootstrapRole::SuperAdmin,
                    grant: Grant::Everything,
                },
                RoleGrant {
                    role: BootstrapRole::Moderator,
                    grant: Grant::Including(moderator_grant()),
                },
            ],
            demo_users: Vec::new(),
        }
    }

    pub fn with_demo_users(mut self) -> Self {
        self.demo_users = vec![
            DemoUser {
                name: "Admin",
                email: "admin@example.com",
                phone: "01314925185",
                password: "password",
                role: BootstrapRole::SuperAdmin,
            },
            DemoUser {
                name: "grahok",
                email: "grahok@gmail.com",
                phone: "01314925181",
                password: "password",
                role: BootstrapRole::Moderator,
            },
        ];
        self
    }
}

/// Outcome of a seed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub permissions_created: usize,
    pub roles_created: usize,
    pub users_created: usize,
    /// Permission count per granted role after the run.
    pub assignments: BTreeMap<String, usize>,
}

/// Idempotent provisioning over a [`Store`].
///
/// Every step upserts, so running twice leaves the same rows and
/// assignments as running once. The whole run is one transaction.
#[derive(Debug, Clone)]
pub struct Seeder {
    store: Arc<Store>,
    catalog: PermissionCatalog,
    guard_name: String,
}

impl Seeder {
    pub fn new(store: Arc<Store>, catalog: PermissionCatalog, guard_name: impl Into<String>) -> Self {
        Self {
            store,
            catalog,
            guard_name: guard_name.into(),
        }
    }

    pub fn run(&self, plan: &SeedPlan) -> Result<SeedReport, ServiceError> {
        let report = self.store.transaction(|tables| -> Result<SeedReport, ServiceError> {
            let mut report = SeedReport::default();
            self.seed_permissions(tables, &mut report)?;
            self.seed_roles(tables, plan, &mut report)?;
            self.grant_roles(tables, plan, &mut report)?;
            self.seed_users(tables, plan, &mut report)?;
            Ok(report)
        })?;

        tracing::info!(
            permissions_created = report.permissions_created,
            roles_created = report.roles_created,
            users_created = report.users_created,
            "seed completed"
        );
        Ok(report)
    }

    fn seed_permissions(&self, tables: &mut Tables, report: &mut SeedReport) -> Result<(), ServiceError> {
        for group in self.catalog.all_groups() {
            for key in &group.permissions {
                let (_, created) =
                    tables.upsert_permission(key.as_str(), Some(group.group_name.as_str()), &self.guard_name)?;
                if created {
                    report.permissions_created += 1;
                }
            }
        }
        Ok(())
    }

    fn seed_roles(&self, tables: &mut Tables, plan: &SeedPlan, report: &mut SeedReport) -> Result<(), ServiceError> {
        for role in &plan.roles {
            let (_, created) = tables.upsert_role(role.as_str(), &self.guard_name)?;
            if created {
                tracing::debug!(role = %role, "role created");
                report.roles_created += 1;
            }
        }
        Ok(())
    }

    /// Grants add to what a role already holds.
    fn grant_roles(&self, tables: &mut Tables, plan: &SeedPlan, report: &mut SeedReport) -> Result<(), ServiceError> {
        for RoleGrant { role, grant } in &plan.grants {
            let role_id = tables
                .role_by_name(role.as_str())
                .map(|r| r.id)
                .ok_or_else(|| ServiceError::Configuration(format!("role '{role}' does not exist")))?;

            let keys = match grant {
                Grant::Everything => self.catalog.all_permissions(&[]),
                Grant::Including(keys) => self.catalog.all_permissions_including(keys),
            };

            let mut ids = Vec::with_capacity(keys.len());
            for key in &keys {
                let group = self.catalog.group_of(key);
                let (permission, created) =
                    tables.upsert_permission(key.as_str(), group.as_deref(), &self.guard_name)?;
                if created {
                    report.permissions_created += 1;
                }
                ids.push(permission.id);
            }
            tables.give_permissions(role_id, ids)?;

            let held = tables.role_permissions(&role_id).len();
            tracing::info!(role = %role, permissions = held, "role permissions granted");
            report.assignments.insert(role.to_string(), held);
        }
        Ok(())
    }

    fn seed_users(&self, tables: &mut Tables, plan: &SeedPlan, report: &mut SeedReport) -> Result<(), ServiceError> {
        for demo in &plan.demo_users {
            if tables.users.find_unique(demo.email).is_some() {
                tracing::debug!(email = demo.email, "demo user exists; skipping");
                continue;
            }
            insert_user_with_role(
                tables,
                NewUser {
                    name: demo.name.to_string(),
                    email: demo.email.to_string(),
                    phone: Some(demo.phone.to_string()),
                    password: demo.password.to_string(),
                    role: demo.role.as_str().to_string(),
                },
            )?;
            report.users_created += 1;
        }
        Ok(())
    }
}
