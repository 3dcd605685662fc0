//! Transport boundary: request context, controller actions and the mapping of
//! failures to HTTP responses.

pub mod context;
pub mod controllers;
pub mod errors;

pub use context::RequestContext;
pub use controllers::{RoleController, UserController};
pub use errors::{ApiError, json_error};
