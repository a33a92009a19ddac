//! Authentication service - User lookup and confirmed user creation.
//!
//! Creation runs two tasks in one [`TaskScope`]: a submit task that calls the
//! store's `create`, and a confirm task that watches the creation feed until the
//! new user shows up. The first failure cancels the other task and is returned.
//! Both tasks share one deadline, so a `create` call that never returns fails
//! the creation with `ConfirmationTimeout` as well.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use common::{AppError, AppResult};
use domain::{validate_user_id, CreateUserRequest, User};

use super::scope::TaskScope;
use crate::client::{CreationEvents, UserServiceClient};
use crate::config::{AuthServiceConfig, ConfirmationMatch};

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Fetch a user by identifier
    async fn get_user(&self, id: &str) -> AppResult<User>;

    /// Create a user and wait until the store reports the creation
    async fn create_user(&self, request: CreateUserRequest) -> AppResult<User>;
}

/// Concrete implementation of AuthService over a user store client.
pub struct Authenticator {
    user_client: Arc<dyn UserServiceClient>,
    confirmation_timeout: Duration,
    confirmation_match: ConfirmationMatch,
    event_capacity: usize,
}

impl Authenticator {
    /// Create new auth service instance with default settings
    pub fn new(user_client: Arc<dyn UserServiceClient>) -> Self {
        Self::with_config(user_client, &AuthServiceConfig::default())
    }

    /// Create new auth service instance from configuration
    pub fn with_config(user_client: Arc<dyn UserServiceClient>, config: &AuthServiceConfig) -> Self {
        Self {
            user_client,
            confirmation_timeout: config.confirmation_timeout,
            confirmation_match: config.confirmation_match,
            event_capacity: config.event_capacity.max(1),
        }
    }

    /// Upper bound on waiting for the creation event
    pub fn confirmation_timeout(&self) -> Duration {
        self.confirmation_timeout
    }

    /// Create a user, aborting both tasks when `cancel` fires.
    ///
    /// Returns `Cancelled` if the caller cancels before the user is confirmed.
    pub async fn create_user_with_cancellation(
        &self,
        request: CreateUserRequest,
        cancel: &CancellationToken,
    ) -> AppResult<User> {
        request.validate_input()?;

        let mut scope = TaskScope::with_parent(cancel);
        let token = scope.token();
        let (created_tx, created_rx) = watch::channel(None);
        let (confirmed_tx, mut confirmed_rx) = oneshot::channel();
        let confirmation = Confirmation {
            deadline: Instant::now() + self.confirmation_timeout,
            timeout: self.confirmation_timeout,
            matching: self.confirmation_match,
            capacity: self.event_capacity,
        };

        debug!("Creating user {:?}", request.name);

        scope.spawn(
            "confirm",
            confirm_creation(
                self.user_client.clone(),
                token.clone(),
                confirmation,
                created_rx,
                confirmed_tx,
            ),
        );
        scope.spawn(
            "submit",
            submit_creation(
                self.user_client.clone(),
                token,
                confirmation,
                request,
                created_tx,
            ),
        );

        if let Err(err) = scope.wait().await {
            warn!("User creation failed: {}", err);
            return Err(err);
        }

        let user = confirmed_rx
            .try_recv()
            .map_err(|_| AppError::internal("confirm task finished without a user"))?;
        info!("User {} created and confirmed", user.id);
        Ok(user)
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn get_user(&self, id: &str) -> AppResult<User> {
        validate_user_id(id)?;
        self.user_client.find_by_id(id).await
    }

    async fn create_user(&self, request: CreateUserRequest) -> AppResult<User> {
        self.create_user_with_cancellation(request, &CancellationToken::new())
            .await
    }
}

#[derive(Debug, Clone, Copy)]
struct Confirmation {
    deadline: Instant,
    timeout: Duration,
    matching: ConfirmationMatch,
    /// Most events held while the created identifier is still unknown
    capacity: usize,
}

/// Submit task: call `create` and publish the new identifier.
async fn submit_creation(
    user_client: Arc<dyn UserServiceClient>,
    token: CancellationToken,
    confirmation: Confirmation,
    request: CreateUserRequest,
    created_id: watch::Sender<Option<String>>,
) -> AppResult<()> {
    let created = tokio::select! {
        biased;
        () = token.cancelled() => return Err(AppError::Cancelled),
        () = tokio::time::sleep_until(confirmation.deadline) => {
            warn!("Store did not answer create within {:?}", confirmation.timeout);
            return Err(AppError::ConfirmationTimeout(confirmation.timeout));
        }
        created = user_client.create(request) => created,
    };

    match created {
        Ok(id) => {
            debug!("Store accepted user {}", id);
            created_id.send_replace(Some(id));
            Ok(())
        }
        Err(err) => {
            warn!("Store rejected user creation: {}", err);
            Err(AppError::CreationFailed)
        }
    }
}

/// Confirm task: subscribe to the creation feed and wait for the new user.
async fn confirm_creation(
    user_client: Arc<dyn UserServiceClient>,
    token: CancellationToken,
    confirmation: Confirmation,
    created_id: watch::Receiver<Option<String>>,
    confirmed: oneshot::Sender<User>,
) -> AppResult<()> {
    let events = tokio::select! {
        biased;
        () = token.cancelled() => return Err(AppError::Cancelled),
        () = tokio::time::sleep_until(confirmation.deadline) => {
            return Err(AppError::ConfirmationTimeout(confirmation.timeout));
        }
        opened = user_client.subscribe_creations() => {
            opened.map_err(|e| AppError::subscription(e.to_string()))?
        }
    };

    let user = wait_for_user(events, &token, confirmation, created_id).await?;

    // Receiver is gone only if the caller stopped waiting
    let _ = confirmed.send(user);
    Ok(())
}

/// Consume creation events until one confirms the user. The subscription is
/// dropped, and so closed, on every exit path.
async fn wait_for_user(
    mut events: CreationEvents,
    token: &CancellationToken,
    confirmation: Confirmation,
    mut created_id: watch::Receiver<Option<String>>,
) -> AppResult<User> {
    let expiry = tokio::time::sleep_until(confirmation.deadline);
    tokio::pin!(expiry);

    let mut awaiting_id = confirmation.matching == ConfirmationMatch::Identifier;
    let mut expected: Option<String> = None;
    // Events seen before the identifier is known, oldest first
    let mut unmatched: VecDeque<User> = VecDeque::new();

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => return Err(AppError::Cancelled),
            () = &mut expiry => return Err(AppError::ConfirmationTimeout(confirmation.timeout)),
            changed = created_id.changed(), if awaiting_id => {
                if changed.is_err() {
                    // Submit ended without an identifier; its error decides the outcome
                    awaiting_id = false;
                } else if let Some(id) = created_id.borrow_and_update().clone() {
                    awaiting_id = false;
                    if let Some(user) = unmatched.drain(..).find(|user| user.id == id) {
                        return Ok(user);
                    }
                    unmatched.clear();
                    expected = Some(id);
                }
            }
            event = events.next() => match event {
                Some(Some(user)) => match (confirmation.matching, expected.as_deref()) {
                    (ConfirmationMatch::FirstEvent, _) => return Ok(user),
                    (ConfirmationMatch::Identifier, Some(id)) if id == user.id => return Ok(user),
                    (ConfirmationMatch::Identifier, Some(_)) => {
                        debug!("Ignoring creation event for {}", user.id);
                    }
                    (ConfirmationMatch::Identifier, None) => {
                        if unmatched.len() >= confirmation.capacity {
                            if let Some(evicted) = unmatched.pop_front() {
                                debug!("Dropping buffered creation event for {}", evicted.id);
                            }
                        }
                        unmatched.push_back(user);
                    }
                },
                // Filler tick
                Some(None) => {}
                None => return Err(AppError::subscription("confirmation stream closed")),
            },
        }
    }
}
