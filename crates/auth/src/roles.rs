use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use adminkit_core::DomainError;

/// Role name used for RBAC.
///
/// Roles are opaque strings at this layer; which permissions a role carries is
/// decided by persisted assignments (see the seeder in `adminkit-infra`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed roles created at provisioning time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BootstrapRole {
    Admin,
    SuperAdmin,
    Moderator,
    Cashier,
}

impl BootstrapRole {
    pub const ALL: [BootstrapRole; 4] = [
        BootstrapRole::Admin,
        BootstrapRole::SuperAdmin,
        BootstrapRole::Moderator,
        BootstrapRole::Cashier,
    ];

    /// Persisted role name.
    pub const fn as_str(self) -> &'static str {
        match self {
            BootstrapRole::Admin => "Admin",
            BootstrapRole::SuperAdmin => "Super Admin",
            BootstrapRole::Moderator => "Moderator",
            BootstrapRole::Cashier => "Cashier",
        }
    }

    pub fn role(self) -> Role {
        Role::new(self.as_str())
    }
}

impl From<BootstrapRole> for Role {
    fn from(value: BootstrapRole) -> Self {
        value.role()
    }
}

impl core::fmt::Display for BootstrapRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for BootstrapRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BootstrapRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown role '{s}'")))
    }
}
