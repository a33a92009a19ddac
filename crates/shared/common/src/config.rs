//! Shared configuration structures.

use std::env;

use serde::{Deserialize, Serialize};

/// Base service configuration shared by all binaries.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service name for logging and tracing
    pub service_name: String,
    /// Fallback log filter when `RUST_LOG` is not set
    pub log_level: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables, using `service_name`
    /// when `SERVICE_NAME` is not set.
    pub fn from_env(service_name: &str) -> Self {
        Self {
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| service_name.to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: "service".to_string(),
            log_level: "info".to_string(),
        }
    }
}
