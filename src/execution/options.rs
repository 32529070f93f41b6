//! Per-run options: batch shape, cooldown, and observer callbacks.

use crate::config::BatchConfig;
use crate::constants::{DEFAULT_BATCH_SIZE, DEFAULT_DELAY_MS};
use crate::execution::state::ExecutionState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Called after every settled item with a snapshot of the counters
pub type ProgressCallback = Arc<dyn Fn(&ExecutionState) + Send + Sync>;

/// Called once per batch, before its items are dispatched, with
/// `(batch_index, batch_count)`
pub type BatchStartCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Settled result of one remote unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub success: bool,
    pub message: Option<String>,
}

impl OperationOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn success_with(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

#[derive(Clone)]
pub struct RunOptions {
    pub batch_size: usize,
    pub delay: Duration,
    pub(crate) on_progress: Option<ProgressCallback>,
    pub(crate) on_batch_start: Option<BatchStartCallback>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            on_progress: None,
            on_batch_start: None,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ExecutionState) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn on_batch_start<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.on_batch_start = Some(Arc::new(callback));
        self
    }
}

impl From<&BatchConfig> for RunOptions {
    fn from(config: &BatchConfig) -> Self {
        Self::new()
            .with_batch_size(config.batch_size)
            .with_delay(config.delay())
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("batch_size", &self.batch_size)
            .field("delay", &self.delay)
            .field("on_progress", &self.on_progress.is_some())
            .field("on_batch_start", &self.on_batch_start.is_some())
            .finish()
    }
}
