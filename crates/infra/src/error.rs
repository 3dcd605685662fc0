//! Persistence and service errors.

use thiserror::Error;

use adminkit_auth::CatalogError;

/// Storage-level failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store lock poisoned")]
    Poisoned,

    #[error("duplicate {column} '{value}' in {table}")]
    Duplicate {
        table: &'static str,
        column: &'static str,
        value: String,
    },

    #[error("no row {id} in {table}")]
    Missing { table: &'static str, id: String },

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("table {0} has no soft-delete column")]
    NoSoftDeleteColumn(&'static str),

    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The database rejected or failed a statement.
    #[error("{0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Serialization(value.to_string())
    }
}

/// Service-level failure surfaced to callers (and mapped to HTTP by the API).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Requested entity does not exist. Carries the entity-specific message.
    #[error("{0}")]
    NotFound(String),

    /// Input rejected (unknown role, key outside the catalog, ...).
    #[error("{0}")]
    Invalid(String),

    /// A multi-step write was rolled back.
    #[error("{context}: {source}")]
    Transaction {
        context: String,
        #[source]
        source: Box<ServiceError>,
    },

    /// Provisioning data is inconsistent (e.g. a required role is missing).
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn transaction(context: impl Into<String>, source: ServiceError) -> Self {
        Self::Transaction {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// HTTP-equivalent status code.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) => 404,
            ServiceError::Invalid(_) => 422,
            ServiceError::Store(StoreError::Duplicate { .. }) => 409,
            ServiceError::Transaction { .. }
            | ServiceError::Configuration(_)
            | ServiceError::Catalog(_)
            | ServiceError::Store(_) => 500,
        }
    }
}
