//! Domain-level constants.

// =============================================================================
// Creation confirmation
// =============================================================================

/// Default upper bound on waiting for a creation event, in seconds
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 10;

/// Default capacity of the creation event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

// =============================================================================
// Validation
// =============================================================================

/// Message returned when a user identifier is missing
pub const ID_REQUIRED_MESSAGE: &str = "id is required";

/// Message returned when a user name is missing
pub const NAME_REQUIRED_MESSAGE: &str = "name is required";
