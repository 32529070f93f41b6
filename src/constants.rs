//! # System Constants
//!
//! Defaults and environment variable names that define the operating envelope
//! of a bulk run.

/// Items dispatched together in one batch unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Pause between two consecutive batches, in milliseconds
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// Environment variables read by the configuration and logging layers
pub mod env {
    pub const BATCH_SIZE: &str = "BULKOPS_BATCH_SIZE";
    pub const DELAY_MS: &str = "BULKOPS_DELAY_MS";
    pub const ENV_PREFIX: &str = "BULKOPS";
    pub const ENVIRONMENT: &str = "BULKOPS_ENV";
    pub const LOG_FORMAT: &str = "BULKOPS_LOG_FORMAT";
}

/// Structured log operation names
pub mod events {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_COMPLETED: &str = "run.completed";
    pub const RUN_CANCELLED: &str = "run.cancelled";
    pub const RUN_REJECTED: &str = "run.rejected";
    pub const BATCH_STARTED: &str = "batch.started";
    pub const BATCH_SETTLED: &str = "batch.settled";
}
