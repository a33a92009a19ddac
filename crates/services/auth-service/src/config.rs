//! Auth service configuration.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use domain::{DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_EVENT_CAPACITY};

/// Default simulated write latency of the embedded store, in milliseconds.
///
/// Gives the confirm task time to subscribe before the write is published.
pub const DEFAULT_STORE_LATENCY_MS: u64 = 25;

/// How a creation event is matched to the user being created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmationMatch {
    /// The first non-empty event confirms the creation
    #[default]
    FirstEvent,
    /// Only the event carrying the identifier returned by `create` confirms it
    Identifier,
}

impl FromStr for ConfirmationMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-event" | "first_event" | "first" => Ok(ConfirmationMatch::FirstEvent),
            "identifier" | "id" => Ok(ConfirmationMatch::Identifier),
            other => Err(format!("unknown confirmation match: {}", other)),
        }
    }
}

impl fmt::Display for ConfirmationMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmationMatch::FirstEvent => write!(f, "first-event"),
            ConfirmationMatch::Identifier => write!(f, "identifier"),
        }
    }
}

/// Auth service configuration.
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    /// Upper bound on waiting for a creation event
    pub confirmation_timeout: Duration,
    /// Event matching policy
    pub confirmation_match: ConfirmationMatch,
    /// Simulated write latency of the embedded store
    pub store_latency: Duration,
    /// Per-subscriber event buffer of the embedded store
    pub event_capacity: usize,
}

impl AuthServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            confirmation_timeout: env::var("AUTH_SERVICE_CONFIRMATION_TIMEOUT_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.confirmation_timeout),
            confirmation_match: env::var("AUTH_SERVICE_CONFIRMATION_MATCH")
                .ok()
                .and_then(|m| m.parse().ok())
                .unwrap_or(defaults.confirmation_match),
            store_latency: env::var("AUTH_SERVICE_STORE_LATENCY_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_latency),
            event_capacity: env::var("AUTH_SERVICE_EVENT_CAPACITY")
                .ok()
                .and_then(|c| c.parse().ok())
                .filter(|c| *c > 0)
                .unwrap_or(defaults.event_capacity),
        }
    }
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
            confirmation_match: ConfirmationMatch::FirstEvent,
            store_latency: Duration::from_millis(DEFAULT_STORE_LATENCY_MS),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}
