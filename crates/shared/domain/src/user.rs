//! User domain entity and creation input.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::{ID_REQUIRED_MESSAGE, NAME_REQUIRED_MESSAGE};
use crate::error::{DomainError, DomainResult};

/// User record as held by the store.
///
/// The identifier is assigned by the store and is unique once the user exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// User creation input. The identifier is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// User display name (must not be empty)
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
}

impl CreateUserRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Run the field rules and surface the first failure as a domain error.
    pub fn validate_input(&self) -> DomainResult<()> {
        self.validate().map_err(|e| {
            let message = e
                .field_errors()
                .values()
                .next()
                .and_then(|errors| errors.first())
                .and_then(|error| error.message.as_ref())
                .map(|msg| msg.to_string())
                .unwrap_or_else(|| NAME_REQUIRED_MESSAGE.to_string());
            DomainError::validation(message)
        })
    }
}

/// Reject an empty user identifier.
pub fn validate_user_id(id: &str) -> DomainResult<()> {
    if id.is_empty() {
        return Err(DomainError::validation(ID_REQUIRED_MESSAGE));
    }
    Ok(())
}
