//! Preview → confirm → run flow shared by every bulk button.

use tracing::info;

use crate::actions::{BulkAction, ConfirmationGate, RemoteCommand};
use crate::config::BatchConfig;
use crate::error::Result;
use crate::execution::{BatchExecutor, PlanPreview, RunOptions, RunResult};

/// What happened to a bulk request
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOutcome {
    /// The gate refused; nothing was dispatched
    Declined { preview: PlanPreview },
    Finished(RunResult),
}

impl BulkOutcome {
    pub fn is_declined(&self) -> bool {
        matches!(self, BulkOutcome::Declined { .. })
    }

    pub fn result(&self) -> Option<&RunResult> {
        match self {
            BulkOutcome::Finished(result) => Some(result),
            BulkOutcome::Declined { .. } => None,
        }
    }
}

/// One console controller's bulk surface: a remote command bound to its own
/// executor, so a second bulk run on the same page is rejected while one is
/// in progress
pub struct BulkController<C> {
    executor: BatchExecutor,
    command: C,
    config: BatchConfig,
}

impl<C> BulkController<C> {
    pub fn new(command: C, config: BatchConfig) -> Self {
        Self {
            executor: BatchExecutor::new(),
            command,
            config,
        }
    }

    pub fn executor(&self) -> &BatchExecutor {
        &self.executor
    }

    pub fn command(&self) -> &C {
        &self.command
    }

    /// Run options seeded from this controller's configuration; callers add
    /// their progress callbacks on top
    pub fn options(&self) -> RunOptions {
        RunOptions::from(&self.config)
    }

    pub fn preview(&self, item_count: usize) -> Result<PlanPreview> {
        self.executor.preview(item_count, &self.options())
    }

    pub fn cancel(&self) -> bool {
        self.executor.cancel()
    }

    pub async fn execute<T, G>(
        &self,
        action: BulkAction,
        items: Vec<T>,
        gate: &G,
        options: RunOptions,
    ) -> Result<BulkOutcome>
    where
        T: Send + 'static,
        C: RemoteCommand<T>,
        G: ConfirmationGate + ?Sized,
    {
        let preview = self.executor.preview(items.len(), &options)?;

        if !gate.confirm(action, &preview).await {
            info!(
                action = %action,
                total = preview.total,
                "Bulk action declined at confirmation"
            );
            return Ok(BulkOutcome::Declined { preview });
        }

        let command = &self.command;
        let result = self
            .executor
            .run(items, move |item| command.execute(action, item), options)
            .await?;

        info!(
            action = %action,
            run_id = %result.run_id,
            "✅ {}",
            result.summary(action.label())
        );

        Ok(BulkOutcome::Finished(result))
    }

    /// Re-run `action` over the items that failed in `previous`
    pub async fn retry_failed<T, G>(
        &self,
        action: BulkAction,
        items: &[T],
        previous: &RunResult,
        gate: &G,
        options: RunOptions,
    ) -> Result<BulkOutcome>
    where
        T: Clone + Send + 'static,
        C: RemoteCommand<T>,
        G: ConfirmationGate + ?Sized,
    {
        let failed = previous.select_failed(items);
        info!(
            action = %action,
            previous_run_id = %previous.run_id,
            retrying = failed.len(),
            "Retrying failed bulk items"
        );
        self.execute(action, failed, gate, options).await
    }
}
