//! API constants

/// Versioned prefix for every pipeline route.
pub const API_PREFIX: &str = "/api/v0";

/// How long shutdown waits for an in-flight release batch to finish.
pub const SCHEDULER_SHUTDOWN_TIMEOUT_SECS: u64 = 30;
