#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Bulk Operations Core
//!
//! Batched bulk-operation executor for the payment-reconciliation operations
//! console.
//!
//! ## Overview
//!
//! Service start/stop/restart, "add counter" and bulk mark-failed /
//! mark-success all share one shape: take an arbitrary operator selection,
//! split it into fixed-size batches, fire each batch's remote calls
//! concurrently, pause between batches so the backend is not flooded, and
//! report live success/failure counts with the option to cancel.
//!
//! ## Module Organization
//!
//! - [`execution`] - Batch planning, the executor, run state and results
//! - [`actions`] - Console bulk actions, remote command and confirmation seams
//! - [`config`] - Batch size / delay configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bulkops_core::{BatchConfig, BatchExecutor, OperationOutcome, RunOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BatchConfig::from_env()?;
//! let executor = BatchExecutor::new();
//!
//! let transaction_ids: Vec<u64> = (1..=57).collect();
//! let result = executor
//!     .run(
//!         transaction_ids,
//!         |id| async move {
//!             // mark transaction `id` failed through the remote API
//!             Ok::<_, String>(OperationOutcome::success_with(format!("{id} marked")))
//!         },
//!         RunOptions::from(&config),
//!     )
//!     .await?;
//!
//! println!("{}", result.summary("FAIL"));
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod config;
pub mod constants;
pub mod error;
pub mod execution;
pub mod logging;

pub use actions::{
    AutoConfirm, BulkAction, BulkController, BulkOutcome, ConfirmationGate, RemoteCommand,
};
pub use crate::config::BatchConfig;
pub use error::{BulkError, OperationError, Result};
pub use execution::{
    BatchExecutor, BatchPlan, CancelHandle, EngineState, ExecutionState, ItemFailure,
    OperationOutcome, PlanPreview, RunOptions, RunResult, RunStatus,
};
