//! Store capability consumed by the auth service.

use async_trait::async_trait;
use futures::stream::BoxStream;

use common::AppResult;
use domain::{CreateUserRequest, User};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Stream of creation events.
///
/// `None` items are filler ticks with no event. The stream ending means the
/// subscription was closed by the store. Dropping it closes the subscription.
pub type CreationEvents = BoxStream<'static, Option<User>>;

/// Trait for the user store operations needed by auth-service.
///
/// Implementations must be safe to share between concurrent calls.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserServiceClient: Send + Sync {
    /// Fetch a user by identifier
    async fn find_by_id(&self, id: &str) -> AppResult<User>;

    /// Create a new user, returning the identifier assigned by the store
    async fn create(&self, request: CreateUserRequest) -> AppResult<String>;

    /// Open a fresh subscription to creation events
    async fn subscribe_creations(&self) -> AppResult<CreationEvents>;
}
