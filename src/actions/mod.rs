//! # Bulk Actions
//!
//! The console's bulk buttons expressed on top of the batch executor. A
//! controller no longer carries its own partition/delay/tally loop: it names a
//! [`BulkAction`], supplies the [`RemoteCommand`] that performs one item, and
//! passes a [`ConfirmationGate`] that sees the [`PlanPreview`] before anything
//! is sent.
//!
//! The remote side (HTTP client, payload envelope) stays behind
//! [`RemoteCommand`]; nothing here knows about transport.

pub mod controller;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::OperationError;
use crate::execution::{OperationOutcome, PlanPreview};

pub use controller::{BulkController, BulkOutcome};

/// Bulk actions offered by the operations console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    ServiceStart,
    ServiceStop,
    ServiceRestart,
    AddCounter,
    MarkFailed,
    MarkSuccess,
}

impl BulkAction {
    pub const ALL: [BulkAction; 6] = [
        BulkAction::ServiceStart,
        BulkAction::ServiceStop,
        BulkAction::ServiceRestart,
        BulkAction::AddCounter,
        BulkAction::MarkFailed,
        BulkAction::MarkSuccess,
    ];

    /// Label used in confirmation prompts and run summaries
    pub fn label(&self) -> &'static str {
        match self {
            BulkAction::ServiceStart => "START",
            BulkAction::ServiceStop => "STOP",
            BulkAction::ServiceRestart => "RESTART",
            BulkAction::AddCounter => "ADD COUNTER",
            BulkAction::MarkFailed => "FAIL",
            BulkAction::MarkSuccess => "SUCCESS",
        }
    }

    pub fn is_service_control(&self) -> bool {
        matches!(
            self,
            BulkAction::ServiceStart | BulkAction::ServiceStop | BulkAction::ServiceRestart
        )
    }

    /// Prompt text for the confirmation step
    pub fn confirmation_prompt(&self, preview: &PlanPreview) -> String {
        format!(
            "{} {} item(s) in {} batch(es) of up to {}?",
            self.label(),
            preview.total,
            preview.total_batches,
            preview.batch_size
        )
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One remote unit of work for a bulk action
#[async_trait]
pub trait RemoteCommand<T: Send + 'static>: Send + Sync {
    async fn execute(
        &self,
        action: BulkAction,
        item: T,
    ) -> Result<OperationOutcome, OperationError>;
}

/// Operator consent, asked once per bulk run before dispatch
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn confirm(&self, action: BulkAction, preview: &PlanPreview) -> bool;
}

/// Gate that always proceeds, for scripted and already-confirmed runs
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

#[async_trait]
impl ConfirmationGate for AutoConfirm {
    async fn confirm(&self, _action: BulkAction, _preview: &PlanPreview) -> bool {
        true
    }
}
