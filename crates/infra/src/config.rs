//! Configuration loading and representation.
//!
//! Values come from the process environment (a `.env` file is loaded by the
//! binary before this runs).

use thiserror::Error;

use crate::store::{PER_PAGE, Schema};

pub const GUARD_VAR: &str = "ADMINKIT_GUARD";
pub const PER_PAGE_VAR: &str = "ADMINKIT_PER_PAGE";
pub const SEED_DEMO_USERS_VAR: &str = "ADMINKIT_SEED_DEMO_USERS";

pub const DEFAULT_GUARD: &str = "web";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },
}

impl ConfigError {
    fn invalid(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// Runtime configuration for services and provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Guard/scope stamped on seeded roles and permissions.
    pub guard_name: String,
    /// Default page size for paginated listings.
    pub per_page: usize,
    /// Whether seeding also creates the demo accounts.
    pub seed_demo_users: bool,
    /// Which tables carry a soft-delete column.
    pub schema: Schema,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            guard_name: DEFAULT_GUARD.to_string(),
            per_page: PER_PAGE,
            seed_demo_users: false,
            schema: Schema::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source (unset variables keep defaults).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(guard) = lookup(GUARD_VAR) {
            let guard = guard.trim();
            if guard.is_empty() {
                return Err(ConfigError::invalid(GUARD_VAR, "must not be empty"));
            }
            config.guard_name = guard.to_string();
        }

        if let Some(raw) = lookup(PER_PAGE_VAR) {
            let per_page: usize = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid(PER_PAGE_VAR, format!("{e}")))?;
            if per_page == 0 {
                return Err(ConfigError::invalid(PER_PAGE_VAR, "must be greater than zero"));
            }
            config.per_page = per_page;
        }

        if let Some(raw) = lookup(SEED_DEMO_USERS_VAR) {
            config.seed_demo_users = parse_bool(&raw)
                .ok_or_else(|| ConfigError::invalid(SEED_DEMO_USERS_VAR, "expected true or false"))?;
        }

        Ok(config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
