use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use adminkit_auth::AuthzError;
use adminkit_infra::{ServiceError, StoreError};

/// Any failure a controller action can surface.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        let code = match self {
            ApiError::Authz(err) => err.status_code(),
            ApiError::Service(err) => err.status_code(),
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Authz(AuthzError::Unauthenticated(_)) => "unauthenticated",
            ApiError::Authz(AuthzError::Unauthorized { .. }) => "unauthorized",
            ApiError::Service(ServiceError::NotFound(_)) => "not_found",
            ApiError::Service(ServiceError::Invalid(_)) => "validation_error",
            ApiError::Service(ServiceError::Transaction { .. }) => "transaction_failed",
            ApiError::Service(ServiceError::Configuration(_)) => "configuration_error",
            ApiError::Service(ServiceError::Catalog(_)) => "catalog_error",
            ApiError::Service(ServiceError::Store(StoreError::Duplicate { .. })) => "conflict",
            ApiError::Service(ServiceError::Store(_)) => "store_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        json_error(status, self.code(), self.to_string())
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
