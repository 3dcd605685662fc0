use adminkit_auth::Principal;
use adminkit_core::UserId;
use adminkit_infra::ServiceError;
use adminkit_infra::services::AuthenticateService;

/// Per-request context: the authenticated principal, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    principal: Option<Principal>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    /// Build from the session's user id (absent when not logged in).
    pub fn resolve(auth: &AuthenticateService, user_id: Option<UserId>) -> Result<Self, ServiceError> {
        Ok(Self {
            principal: auth.resolve(user_id)?,
        })
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}
