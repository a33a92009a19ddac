//! User creation tests against hand-written store fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use auth_service_lib::client::{CreationEvents, InMemoryUserClient, UserServiceClient};
use auth_service_lib::config::{AuthServiceConfig, ConfirmationMatch};
use auth_service_lib::service::{AuthService, Authenticator};
use common::{AppError, AppResult};
use domain::{CreateUserRequest, User};

const SCRIPTED_ID: &str = "scripted-1";

/// Decrements the open-subscription counter when the stream is dropped.
struct OpenGuard(Arc<AtomicUsize>);

impl Drop for OpenGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store fake with fixed delays for the write and for the creation event.
struct ScriptedClient {
    create_delay: Duration,
    /// `None` means the event never arrives
    event_delay: Option<Duration>,
    consumed: Arc<AtomicUsize>,
    open: Arc<AtomicUsize>,
}

impl ScriptedClient {
    fn new(create_delay: Duration, event_delay: Option<Duration>) -> Self {
        Self {
            create_delay,
            event_delay,
            consumed: Arc::new(AtomicUsize::new(0)),
            open: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl UserServiceClient for ScriptedClient {
    async fn find_by_id(&self, _id: &str) -> AppResult<User> {
        Err(AppError::NotFound)
    }

    async fn create(&self, request: CreateUserRequest) -> AppResult<String> {
        tokio::time::sleep(self.create_delay).await;
        assert_eq!(request.name, "shubham");
        Ok(SCRIPTED_ID.to_string())
    }

    async fn subscribe_creations(&self) -> AppResult<CreationEvents> {
        self.open.fetch_add(1, Ordering::SeqCst);
        let guard = OpenGuard(self.open.clone());
        let consumed = self.consumed.clone();

        let event: CreationEvents = match self.event_delay {
            Some(delay) => stream::once(async move {
                tokio::time::sleep(delay).await;
                Some(User::new(SCRIPTED_ID, "shubham"))
            })
            .chain(stream::pending())
            .boxed(),
            None => stream::pending().boxed(),
        };

        let events = stream::iter(vec![None])
            .chain(event)
            .inspect(move |item| {
                let _guard = &guard;
                if item.is_some() {
                    consumed.fetch_add(1, Ordering::SeqCst);
                }
            })
            .boxed();
        Ok(events)
    }
}

/// Small deterministic generator for delay jitter.
struct Jitter(u64);

impl Jitter {
    fn next_millis(&mut self, max: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) % (max + 1)
    }
}

fn config(timeout: Duration, confirmation_match: ConfirmationMatch) -> AuthServiceConfig {
    AuthServiceConfig {
        confirmation_timeout: timeout,
        confirmation_match,
        ..AuthServiceConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_randomized_timing_never_deadlocks() {
    let mut jitter = Jitter(0x2545_f491_4f6c_dd1d);

    for round in 0..64 {
        let create_delay = Duration::from_millis(jitter.next_millis(3));
        let event_delay = Duration::from_millis(jitter.next_millis(3));
        let client = Arc::new(ScriptedClient::new(create_delay, Some(event_delay)));
        let consumed = client.consumed.clone();
        let open = client.open.clone();

        let mode = if round % 2 == 0 {
            ConfirmationMatch::FirstEvent
        } else {
            ConfirmationMatch::Identifier
        };
        let service = Authenticator::with_config(client, &config(Duration::from_secs(5), mode));

        let user = service
            .create_user(CreateUserRequest::new("shubham"))
            .await
            .unwrap_or_else(|e| panic!("round {} failed: {}", round, e));

        assert_eq!(user.id, SCRIPTED_ID);
        assert_eq!(consumed.load(Ordering::SeqCst), 1, "round {}", round);
        assert_eq!(open.load(Ordering::SeqCst), 0, "round {}", round);
    }
}

#[tokio::test(start_paused = true)]
async fn test_event_before_write_completes() {
    let client = Arc::new(ScriptedClient::new(
        Duration::from_secs(2),
        Some(Duration::from_millis(10)),
    ));
    let service = Authenticator::with_config(
        client,
        &config(Duration::from_secs(10), ConfirmationMatch::Identifier),
    );

    let user = service
        .create_user(CreateUserRequest::new("shubham"))
        .await
        .unwrap();

    assert_eq!(user, User::new(SCRIPTED_ID, "shubham"));
}

#[tokio::test(start_paused = true)]
async fn test_silent_stream_times_out() {
    let client = Arc::new(ScriptedClient::new(Duration::from_millis(5), None));
    let open = client.open.clone();
    let service = Authenticator::with_config(
        client,
        &config(Duration::from_millis(250), ConfirmationMatch::FirstEvent),
    );

    let started = tokio::time::Instant::now();
    let result = service.create_user(CreateUserRequest::new("shubham")).await;

    assert!(matches!(result, Err(AppError::ConfirmationTimeout(_))));
    assert!(started.elapsed() >= Duration::from_millis(250));
    assert_eq!(open.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_in_memory_store_round_trip() {
    let store = Arc::new(InMemoryUserClient::new().with_latency(Duration::from_millis(20)));
    let service = Authenticator::new(store.clone());

    let user = service
        .create_user(CreateUserRequest::new("shubham"))
        .await
        .unwrap();
    assert_eq!(user.name, "shubham");

    let fetched = service.get_user(&user.id).await.unwrap();
    assert_eq!(fetched, user);
    assert_eq!(store.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_creations_match_by_identifier() {
    let store = Arc::new(InMemoryUserClient::new().with_latency(Duration::from_millis(20)));
    let service = Authenticator::with_config(
        store.clone(),
        &config(Duration::from_secs(10), ConfirmationMatch::Identifier),
    );

    let names: Vec<String> = (0..8).map(|i| format!("user-{}", i)).collect();
    let results = futures::future::join_all(
        names
            .iter()
            .map(|name| service.create_user(CreateUserRequest::new(name.clone()))),
    )
    .await;

    let mut ids = Vec::new();
    for (name, result) in names.iter().zip(results) {
        let user = result.unwrap();
        assert_eq!(&user.name, name);
        ids.push(user.id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(store.len().await, 8);
}

#[tokio::test(start_paused = true)]
async fn test_in_memory_store_failure() {
    let store = Arc::new(InMemoryUserClient::new().with_latency(Duration::from_millis(20)));
    store.set_fail_creates(true);
    let service = Authenticator::new(store.clone());

    let result = service.create_user(CreateUserRequest::new("shubham")).await;

    assert!(matches!(result, Err(AppError::CreationFailed)));
    assert!(store.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_run_embedded_creates_and_fetches() {
    let config = AuthServiceConfig {
        confirmation_match: ConfirmationMatch::Identifier,
        ..AuthServiceConfig::default()
    };

    let users = auth_service_lib::run_embedded(&config, vec!["ada".into(), "grace".into()])
        .await
        .unwrap();

    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["ada", "grace"]);
}

#[tokio::test(start_paused = true)]
async fn test_hung_create_hits_the_deadline() {
    let client = Arc::new(ScriptedClient::new(
        Duration::from_secs(3600),
        Some(Duration::from_millis(10)),
    ));
    let service = Authenticator::with_config(
        client,
        &config(Duration::from_millis(250), ConfirmationMatch::FirstEvent),
    );

    let started = tokio::time::Instant::now();
    let result = service.create_user(CreateUserRequest::new("shubham")).await;

    assert!(matches!(result, Err(AppError::ConfirmationTimeout(_))));
    assert!(started.elapsed() >= Duration::from_millis(250));
    assert!(started.elapsed() < Duration::from_secs(3600));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_embedded_default_config_confirms_each_name() {
    let users = auth_service_lib::run_embedded(
        &AuthServiceConfig::default(),
        vec!["ada".into(), "grace".into()],
    )
    .await
    .unwrap();

    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["ada", "grace"]);
    assert_ne!(users[0].id, users[1].id);
}
