//! Clients for the user store.

mod in_memory;
mod user_client;

pub use in_memory::InMemoryUserClient;
pub use user_client::{CreationEvents, UserServiceClient};

#[cfg(any(test, feature = "test-utils"))]
pub use user_client::MockUserServiceClient;
