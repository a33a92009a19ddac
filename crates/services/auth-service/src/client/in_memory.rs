//! In-memory user store with a broadcast feed of creation events.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{CreateUserRequest, User, DEFAULT_EVENT_CAPACITY};

use super::{CreationEvents, UserServiceClient};

/// User store held in process memory.
///
/// Every successful `create` is published to all open subscriptions.
pub struct InMemoryUserClient {
    users: RwLock<HashMap<String, User>>,
    events: broadcast::Sender<User>,
    latency: Duration,
    fail_creates: AtomicBool,
}

impl InMemoryUserClient {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create an empty store whose event feed buffers `capacity` events per subscriber
    pub fn with_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            users: RwLock::new(HashMap::new()),
            events,
            latency: Duration::ZERO,
            fail_creates: AtomicBool::new(false),
        }
    }

    /// Delay every `create` call by `latency` before the write lands
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make subsequent `create` calls fail (or succeed again)
    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Whether the store holds no users
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

impl Default for InMemoryUserClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserServiceClient for InMemoryUserClient {
    async fn find_by_id(&self, id: &str) -> AppResult<User> {
        self.users
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn create(&self, request: CreateUserRequest) -> AppResult<String> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(AppError::service_unavailable("user-store"));
        }

        let user = User::new(Uuid::new_v4().to_string(), request.name);
        self.users
            .write()
            .await
            .insert(user.id.clone(), user.clone());

        let id = user.id.clone();
        // No open subscriptions is not an error
        if self.events.send(user).is_err() {
            debug!("No subscribers for creation of {}", id);
        }
        Ok(id)
    }

    async fn subscribe_creations(&self) -> AppResult<CreationEvents> {
        let receiver = self.events.subscribe();

        let events = stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(user) => return Some((Some(user), receiver)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Creation subscriber lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        });

        Ok(events.boxed())
    }
}
