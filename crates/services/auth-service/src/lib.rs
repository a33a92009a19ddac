//! Auth Service Library
//!
//! This crate provides user lookup and confirmed user creation on top of a
//! user store client. Creation is confirmed through the store's creation feed.

pub mod client;
pub mod config;
pub mod service;

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info};

use common::AppResult;
use domain::{CreateUserRequest, User};

use crate::client::InMemoryUserClient;
use crate::config::{AuthServiceConfig, ConfirmationMatch};
use crate::service::{AuthService, Authenticator};

/// Run the auth service against an embedded in-memory store.
///
/// Creates every name concurrently, then looks each confirmed user up again.
/// With more than one name the creations share the event feed, so each one is
/// confirmed by identifier whatever `config` asks for.
pub async fn run_embedded(config: &AuthServiceConfig, names: Vec<String>) -> AppResult<Vec<User>> {
    let mut config = config.clone();
    if names.len() > 1 && config.confirmation_match != ConfirmationMatch::Identifier {
        debug!(
            "Confirming {} concurrent creations by identifier instead of {}",
            names.len(),
            config.confirmation_match
        );
        config.confirmation_match = ConfirmationMatch::Identifier;
    }

    let store = InMemoryUserClient::with_capacity(config.event_capacity)
        .with_latency(config.store_latency);

    let auth_service = Authenticator::with_config(Arc::new(store), &config);
    info!(
        "Creating {} user(s), confirmation: {}, timeout: {:?}",
        names.len(),
        config.confirmation_match,
        config.confirmation_timeout
    );

    let created = try_join_all(
        names
            .into_iter()
            .map(|name| auth_service.create_user(CreateUserRequest::new(name))),
    )
    .await?;

    let mut users = Vec::with_capacity(created.len());
    for user in created {
        users.push(auth_service.get_user(&user.id).await?);
    }
    Ok(users)
}
