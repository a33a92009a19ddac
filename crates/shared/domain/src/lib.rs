//! Domain layer - Core user entities and validation rules.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Types here are shared between the store client and the auth service.

pub mod constants;
pub mod error;
pub mod user;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use user::{validate_user_id, CreateUserRequest, User};
