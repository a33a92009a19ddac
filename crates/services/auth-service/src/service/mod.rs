//! Authentication service business logic.

mod auth_service;
mod scope;

pub use auth_service::{AuthService, Authenticator};
pub use scope::TaskScope;
