//! # Run State
//!
//! Progress counters owned by the executor during a run, and the final
//! [`RunResult`] handed back to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle of the executor itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    Running,
}

/// Terminal status of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Cancelled,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Live counters for the current run.
///
/// `processed == success + failed` holds after every settled item, and
/// `processed <= total` at all times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionState {
    pub is_running: bool,
    pub total: usize,
    pub processed: usize,
    pub success: usize,
    pub failed: usize,
    /// Index of the batch most recently started
    pub current_batch_index: usize,
    pub total_batches: usize,
    pub batches_completed: usize,
}

impl ExecutionState {
    pub(crate) fn start(total: usize, total_batches: usize) -> Self {
        Self {
            is_running: true,
            total,
            total_batches,
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, succeeded: bool) {
        self.processed += 1;
        if succeeded {
            self.success += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn remaining(&self) -> usize {
        self.total - self.processed
    }

    /// Completion ratio in `[0.0, 1.0]`
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

/// One item that did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Position of the item in the original selection
    pub index: usize,
    pub batch_index: usize,
    pub message: String,
}

/// Final snapshot of a run, completed or cancelled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub total: usize,
    pub processed: usize,
    pub success: usize,
    pub failed: usize,
    pub total_batches: usize,
    pub batches_completed: usize,
    /// Sorted by `index`
    pub failures: Vec<ItemFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    pub(crate) fn from_state(
        run_id: Uuid,
        status: RunStatus,
        state: &ExecutionState,
        mut failures: Vec<ItemFailure>,
        started_at: DateTime<Utc>,
    ) -> Self {
        failures.sort_by_key(|failure| failure.index);
        Self {
            run_id,
            status,
            total: state.total,
            processed: state.processed,
            success: state.success,
            failed: state.failed,
            total_batches: state.total_batches,
            batches_completed: state.batches_completed,
            failures,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == RunStatus::Cancelled
    }

    /// Items never attempted because the run was cancelled
    pub fn skipped(&self) -> usize {
        self.total - self.processed
    }

    pub fn all_succeeded(&self) -> bool {
        self.is_completed() && self.failed == 0
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|failure| failure.index).collect()
    }

    /// Pick the failed items out of the original selection, in order, so the
    /// caller can start a retry run over them.
    pub fn select_failed<T: Clone>(&self, items: &[T]) -> Vec<T> {
        self.failures
            .iter()
            .filter_map(|failure| items.get(failure.index).cloned())
            .collect()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Operator-facing one-line summary, e.g.
    /// `Bulk RESTART completed — Success: 48, Failed: 2`
    pub fn summary(&self, action_label: &str) -> String {
        match self.status {
            RunStatus::Completed => format!(
                "Bulk {action_label} completed — Success: {}, Failed: {}",
                self.success, self.failed
            ),
            RunStatus::Cancelled => format!(
                "Bulk {action_label} cancelled — Success: {}, Failed: {}, Skipped: {}",
                self.success,
                self.failed,
                self.skipped()
            ),
        }
    }
}
