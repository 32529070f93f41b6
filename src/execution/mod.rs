//! # Batched Execution
//!
//! The engine behind every bulk action in the console: plan the selection
//! into batches, run each batch concurrently, pause between batches, and
//! tally the outcome.

pub mod executor;
pub mod options;
pub mod plan;
pub mod state;

pub use executor::{BatchExecutor, CancelHandle};
pub use options::{BatchStartCallback, OperationOutcome, ProgressCallback, RunOptions};
pub use plan::{BatchPlan, PlanPreview};
pub use state::{EngineState, ExecutionState, ItemFailure, RunResult, RunStatus};
