//! Authorization checks: authentication first, then ANY-of permission match.

use thiserror::Error;

use crate::definition::{DenialMessages, GENERIC_DENIAL_MESSAGE};
use crate::{PermissionKey, Principal};

/// Fixed message for requests without an authenticated principal.
pub const UNAUTHENTICATED_MESSAGE: &str = "Please be authenticated to do this action.";

/// Authorization failure.
///
/// The two variants are reported differently to clients: `Unauthenticated`
/// maps to 401, `Unauthorized` to 403.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{message}")]
    Unauthorized {
        key: Option<PermissionKey>,
        message: String,
    },
}

impl AuthzError {
    pub fn unauthenticated() -> Self {
        Self::Unauthenticated(UNAUTHENTICATED_MESSAGE.to_string())
    }

    pub fn unauthorized(key: Option<PermissionKey>, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            key,
            message: message.into(),
        }
    }

    /// HTTP-equivalent status code.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthzError::Unauthenticated(_) => 401,
            AuthzError::Unauthorized { .. } => 403,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AuthzError::Unauthenticated(message) => message,
            AuthzError::Unauthorized { message, .. } => message,
        }
    }
}

/// One or more permission keys, any of which grants access.
///
/// Duplicates are dropped; the first-given order is kept because the first
/// key selects the denial message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredPermissions(Vec<PermissionKey>);

impl RequiredPermissions {
    pub fn new(keys: impl IntoIterator<Item = PermissionKey>) -> Self {
        let mut unique: Vec<PermissionKey> = Vec::new();
        for key in keys {
            if !unique.contains(&key) {
                unique.push(key);
            }
        }
        Self(unique)
    }

    pub fn keys(&self) -> &[PermissionKey] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn primary(&self) -> Option<&PermissionKey> {
        self.0.first()
    }
}

impl From<PermissionKey> for RequiredPermissions {
    fn from(value: PermissionKey) -> Self {
        Self(vec![value])
    }
}

impl From<&PermissionKey> for RequiredPermissions {
    fn from(value: &PermissionKey) -> Self {
        Self(vec![value.clone()])
    }
}

impl From<&'static str> for RequiredPermissions {
    fn from(value: &'static str) -> Self {
        Self(vec![PermissionKey::new(value)])
    }
}

impl From<Vec<PermissionKey>> for RequiredPermissions {
    fn from(value: Vec<PermissionKey>) -> Self {
        Self::new(value)
    }
}

impl From<&[PermissionKey]> for RequiredPermissions {
    fn from(value: &[PermissionKey]) -> Self {
        Self::new(value.iter().cloned())
    }
}

impl<const N: usize> From<[PermissionKey; N]> for RequiredPermissions {
    fn from(value: [PermissionKey; N]) -> Self {
        Self::new(value)
    }
}

/// Fail with [`AuthzError::Unauthenticated`] when no principal is present.
pub fn require_authenticated(principal: Option<&Principal>) -> Result<&Principal, AuthzError> {
    principal.ok_or_else(AuthzError::unauthenticated)
}

/// Authorize a resolved principal.
///
/// - No IO
/// - Succeeds when the principal holds any of the required keys
/// - An empty requirement never succeeds
///
/// On denial the message is resolved for the first required key through
/// `messages` (definition override, CRUD template, generic fallback).
pub fn authorize<M>(
    principal: &Principal,
    required: impl Into<RequiredPermissions>,
    messages: &M,
) -> Result<(), AuthzError>
where
    M: DenialMessages + ?Sized,
{
    let required = required.into();

    if principal.has_any_permission(required.keys()) {
        return Ok(());
    }

    let message = match required.primary() {
        Some(key) => messages.denial_message(key),
        None => GENERIC_DENIAL_MESSAGE.to_string(),
    };
    Err(AuthzError::unauthorized(required.primary().cloned(), message))
}

/// Authentication check followed by [`authorize`].
pub fn check<M>(
    principal: Option<&Principal>,
    required: impl Into<RequiredPermissions>,
    messages: &M,
) -> Result<(), AuthzError>
where
    M: DenialMessages + ?Sized,
{
    let principal = require_authenticated(principal)?;
    authorize(principal, required, messages)
}

#[cfg(test)]
mod tests {
    use adminkit_core::UserId;

    use super::*;
    use crate::definitions::{default_catalog, users};

    fn viewer() -> Principal {
        Principal::with_permissions(UserId::new(), vec![PermissionKey::new("users.view")])
    }

    #[test]
    fn granted_when_key_is_held() {
        assert_eq!(authorize(&viewer(), "users.view", &users()), Ok(()));
    }

    #[test]
    fn denied_with_entity_delete_template() {
        let err = authorize(&viewer(), "users.delete", &users()).unwrap_err();
        assert_eq!(
            err,
            AuthzError::Unauthorized {
                key: Some(PermissionKey::new("users.delete")),
                message: "You do not have the necessary permission to delete users.".to_string(),
            }
        );
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn any_of_requirement_passes_on_a_single_match() {
        let required = vec![PermissionKey::new("users.delete"), PermissionKey::new("users.view")];
        assert!(authorize(&viewer(), required, &users()).is_ok());
    }

    #[test]
    fn any_of_denial_uses_first_key_message() {
        let catalog = default_catalog().unwrap();
        let required = [PermissionKey::new("roles.super_admin_assign_permission"), PermissionKey::new("roles.edit")];
        let err = authorize(&viewer(), required, catalog).unwrap_err();
        assert_eq!(err.message(), "You are not super admin.");
    }

    #[test]
    fn empty_requirement_is_denied_generically() {
        let err = authorize(&viewer(), Vec::<PermissionKey>::new(), &users()).unwrap_err();
        assert_eq!(err, AuthzError::unauthorized(None, GENERIC_DENIAL_MESSAGE));
    }

    #[test]
    fn missing_principal_is_unauthenticated_not_unauthorized() {
        for key in ["users.view", "roles.delete", "anything.at_all"] {
            let err = check(None, key, &users()).unwrap_err();
            assert_eq!(err, AuthzError::unauthenticated());
            assert_eq!(err.status_code(), 401);
            assert_eq!(err.to_string(), UNAUTHENTICATED_MESSAGE);
        }
    }

    #[test]
    fn check_delegates_to_authorize_when_authenticated() {
        let principal = viewer();
        assert!(check(Some(&principal), "users.view", &users()).is_ok());
        assert_eq!(check(Some(&principal), "users.edit", &users()).unwrap_err().status_code(), 403);
    }

    #[test]
    fn requirements_are_deduplicated_in_order() {
        let required = RequiredPermissions::new(vec![
            PermissionKey::new("b"),
            PermissionKey::new("a"),
            PermissionKey::new("b"),
        ]);
        let keys: Vec<&str> = required.keys().iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
