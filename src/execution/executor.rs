//! # Batch Executor
//!
//! Runs a caller-supplied operation over many items, one fixed-size batch at a
//! time. Every item of a batch is dispatched concurrently on the calling task,
//! the batch is joined, and the executor pauses before starting the next one.
//!
//! Per-item failures (an `Ok` outcome with `success == false`, an `Err`, or a
//! panic inside the operation) are counted and never abort the run. Only
//! caller misuse is returned as an error, and always before the first batch.
//!
//! Cancellation is cooperative. [`BatchExecutor::cancel`] lets the current
//! batch settle, then stops before the next batch is started.
//!
//! ```rust,no_run
//! use bulkops_core::execution::{BatchExecutor, OperationOutcome, RunOptions};
//! use std::time::Duration;
//!
//! # async fn example() -> bulkops_core::Result<()> {
//! let executor = BatchExecutor::new();
//! let services = vec!["billing-sync", "sms-matcher", "balance-poller"];
//!
//! let result = executor
//!     .run(
//!         services,
//!         |service| async move {
//!             // remote restart call goes here
//!             Ok::<_, String>(OperationOutcome::success_with(format!("{service} restarted")))
//!         },
//!         RunOptions::new()
//!             .with_batch_size(25)
//!             .with_delay(Duration::from_secs(1))
//!             .on_progress(|state| println!("{}/{}", state.processed, state.total)),
//!     )
//!     .await?;
//!
//! println!("{}", result.summary("RESTART"));
//! # Ok(())
//! # }
//! ```

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;

use chrono::Utc;
use futures::future::poll_fn;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::constants::events;
use crate::error::{BulkError, Result};
use crate::execution::options::{OperationOutcome, RunOptions};
use crate::execution::plan::{BatchPlan, PlanPreview};
use crate::execution::state::{EngineState, ExecutionState, ItemFailure, RunResult, RunStatus};
use crate::logging::{log_batch_operation, log_run_operation};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const CANCEL_REQUESTED: u8 = 2;

/// Run-control flags shared between the executor and its cancel handles
#[derive(Debug)]
struct RunControl {
    phase: AtomicU8,
    cancel_notify: Notify,
}

impl RunControl {
    fn new() -> Self {
        Self {
            phase: AtomicU8::new(IDLE),
            cancel_notify: Notify::new(),
        }
    }

    fn try_begin(&self) -> bool {
        self.phase
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn request_cancel(&self) -> bool {
        let requested = self
            .phase
            .compare_exchange(RUNNING, CANCEL_REQUESTED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if requested {
            info!("🛑 Bulk run cancellation requested");
            self.cancel_notify.notify_waiters();
        } else {
            debug!("Cancel ignored: no active bulk run or cancellation already requested");
        }
        requested
    }

    fn is_cancel_requested(&self) -> bool {
        self.phase.load(Ordering::Acquire) == CANCEL_REQUESTED
    }

    fn engine_state(&self) -> EngineState {
        match self.phase.load(Ordering::Acquire) {
            IDLE => EngineState::Idle,
            _ => EngineState::Running,
        }
    }
}

/// Cloneable handle for cancelling the executor's active run from another
/// task or from inside a progress callback
#[derive(Debug, Clone)]
pub struct CancelHandle {
    control: Arc<RunControl>,
}

impl CancelHandle {
    /// Request cancellation. Returns `false` when no run was active.
    pub fn cancel(&self) -> bool {
        self.control.request_cancel()
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.control.is_cancel_requested()
    }
}

/// Returns the executor to `Idle` however the run future ends, including
/// when it is dropped mid-run
struct RunGuard<'a> {
    control: &'a RunControl,
    state: &'a Mutex<ExecutionState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().is_running = false;
        self.control.phase.store(IDLE, Ordering::Release);
    }
}

/// Partitions a selection into batches and drives them one after another
pub struct BatchExecutor {
    control: Arc<RunControl>,
    state: Arc<Mutex<ExecutionState>>,
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BatchExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchExecutor")
            .field("engine_state", &self.engine_state())
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl BatchExecutor {
    pub fn new() -> Self {
        Self {
            control: Arc::new(RunControl::new()),
            state: Arc::new(Mutex::new(ExecutionState::default())),
        }
    }

    /// Shape of a run over `item_count` items, for the confirmation step
    pub fn preview(&self, item_count: usize, options: &RunOptions) -> Result<PlanPreview> {
        if item_count == 0 {
            return Err(BulkError::EmptyItems);
        }
        PlanPreview::new(item_count, options.batch_size)
    }

    pub fn engine_state(&self) -> EngineState {
        self.control.engine_state()
    }

    pub fn is_running(&self) -> bool {
        self.engine_state() == EngineState::Running
    }

    /// Snapshot of the counters of the active run, or of the last finished
    /// run while idle
    pub fn state(&self) -> ExecutionState {
        self.state.lock().clone()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            control: Arc::clone(&self.control),
        }
    }

    /// Request cancellation of the active run. No-op when idle.
    pub fn cancel(&self) -> bool {
        self.control.request_cancel()
    }

    /// Execute `operation` over every item in `items`.
    ///
    /// Fails with [`BulkError::EmptyItems`], [`BulkError::InvalidBatchSize`] or
    /// [`BulkError::AlreadyRunning`] before anything is dispatched. Otherwise
    /// resolves with a [`RunResult`] whose status is `Completed` or
    /// `Cancelled`.
    pub async fn run<T, F, Fut, E>(
        &self,
        items: Vec<T>,
        operation: F,
        options: RunOptions,
    ) -> Result<RunResult>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = std::result::Result<OperationOutcome, E>>,
        E: fmt::Display,
    {
        if items.is_empty() {
            warn!(operation = events::RUN_REJECTED, "Bulk run rejected: no items");
            return Err(BulkError::EmptyItems);
        }

        let plan = BatchPlan::new(items, options.batch_size).inspect_err(|e| {
            warn!(operation = events::RUN_REJECTED, error = %e, "Bulk run rejected");
        })?;

        if !self.control.try_begin() {
            warn!(
                operation = events::RUN_REJECTED,
                "Bulk run rejected: executor already running"
            );
            return Err(BulkError::AlreadyRunning);
        }
        let _guard = RunGuard {
            control: &self.control,
            state: &self.state,
        };

        let run_id = Uuid::new_v4();
        let span = info_span!(
            "bulk_run",
            run_id = %run_id,
            total = plan.total(),
            total_batches = plan.total_batches()
        );

        Ok(self
            .execute_plan(run_id, plan, &operation, &options)
            .instrument(span)
            .await)
    }

    async fn execute_plan<T, F, Fut, E>(
        &self,
        run_id: Uuid,
        plan: BatchPlan<T>,
        operation: &F,
        options: &RunOptions,
    ) -> RunResult
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = std::result::Result<OperationOutcome, E>>,
        E: fmt::Display,
    {
        let started_at = Utc::now();
        let run_label = run_id.to_string();
        let total = plan.total();
        let total_batches = plan.total_batches();

        *self.state.lock() = ExecutionState::start(total, total_batches);
        log_run_operation(
            events::RUN_STARTED,
            &run_label,
            total,
            total_batches,
            "running",
            None,
        );

        let mut failures = Vec::new();
        let mut status = RunStatus::Completed;
        let mut offset = 0;

        for (batch_index, batch) in plan.into_batches().into_iter().enumerate() {
            if self.control.is_cancel_requested() {
                status = RunStatus::Cancelled;
                break;
            }

            let batch_len = batch.len();
            self.state.lock().current_batch_index = batch_index;
            if let Some(on_batch_start) = &options.on_batch_start {
                on_batch_start(batch_index, total_batches);
            }
            log_batch_operation(
                events::BATCH_STARTED,
                &run_label,
                batch_index,
                total_batches,
                batch_len,
                None,
            );

            let batch_failed = self
                .dispatch_batch(batch, offset, batch_index, operation, options, &mut failures)
                .await;

            self.state.lock().batches_completed += 1;
            offset += batch_len;
            log_batch_operation(
                events::BATCH_SETTLED,
                &run_label,
                batch_index,
                total_batches,
                batch_len,
                Some(batch_failed),
            );

            let is_last = batch_index + 1 == total_batches;
            if !is_last && !self.control.is_cancel_requested() {
                self.pause(options.delay).await;
            }
        }

        let result = {
            let mut state = self.state.lock();
            state.is_running = false;
            RunResult::from_state(run_id, status, &state, failures, started_at)
        };

        let operation_name = match status {
            RunStatus::Completed => events::RUN_COMPLETED,
            RunStatus::Cancelled => events::RUN_CANCELLED,
        };
        let details = format!(
            "success={} failed={} skipped={}",
            result.success,
            result.failed,
            result.skipped()
        );
        log_run_operation(
            operation_name,
            &run_label,
            result.total,
            result.total_batches,
            &status.to_string(),
            Some(details.as_str()),
        );

        result
    }

    /// Dispatch every item of one batch at once and wait for all of them to
    /// settle. Returns the number of failed items.
    ///
    /// Every operation is invoked and polled once before any settle is
    /// reported, so a slow progress callback never delays dispatch of the
    /// rest of the batch.
    async fn dispatch_batch<T, F, Fut, E>(
        &self,
        batch: Vec<T>,
        offset: usize,
        batch_index: usize,
        operation: &F,
        options: &RunOptions,
        failures: &mut Vec<ItemFailure>,
    ) -> usize
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = std::result::Result<OperationOutcome, E>>,
        E: fmt::Display,
    {
        let mut settled_early = Vec::new();
        let mut dispatched = Vec::with_capacity(batch.len());

        for (position, item) in batch.into_iter().enumerate() {
            let index = offset + position;
            match panic::catch_unwind(AssertUnwindSafe(|| operation(item))) {
                Ok(future) => {
                    dispatched.push((index, Box::pin(AssertUnwindSafe(future).catch_unwind())));
                }
                Err(payload) => settled_early.push((index, Err(payload))),
            }
        }

        let still_pending = poll_fn(|cx| {
            let mut pending = Vec::with_capacity(dispatched.len());
            for (index, mut future) in dispatched.drain(..) {
                match future.as_mut().poll(cx) {
                    Poll::Ready(settled) => settled_early.push((index, settled)),
                    Poll::Pending => pending.push((index, future)),
                }
            }
            Poll::Ready(pending)
        })
        .await;
        settled_early.sort_by_key(|(index, _)| *index);

        let mut in_flight: FuturesUnordered<_> = still_pending
            .into_iter()
            .map(|(index, future)| future.map(move |settled| (index, settled)))
            .collect();

        let mut batch_failed = 0;
        for (index, settled) in settled_early {
            if !self.settle_item(index, batch_index, settled, options, failures) {
                batch_failed += 1;
            }
        }
        while let Some((index, settled)) = in_flight.next().await {
            if !self.settle_item(index, batch_index, settled, options, failures) {
                batch_failed += 1;
            }
        }

        batch_failed
    }

    /// Record one settled item and report progress. Returns `true` when the
    /// item succeeded.
    fn settle_item<E: fmt::Display>(
        &self,
        index: usize,
        batch_index: usize,
        settled: std::thread::Result<std::result::Result<OperationOutcome, E>>,
        options: &RunOptions,
        failures: &mut Vec<ItemFailure>,
    ) -> bool {
        let failure_message = match settled {
            Ok(Ok(outcome)) if outcome.success => None,
            Ok(Ok(outcome)) => Some(
                outcome
                    .message
                    .unwrap_or_else(|| "operation reported failure".to_string()),
            ),
            Ok(Err(e)) => Some(e.to_string()),
            Err(payload) => Some(panic_message(payload.as_ref())),
        };
        let succeeded = failure_message.is_none();

        let snapshot = {
            let mut state = self.state.lock();
            state.record(succeeded);
            state.clone()
        };

        if let Some(message) = failure_message {
            debug!(index, batch_index, error = %message, "🔴 Bulk item failed");
            failures.push(ItemFailure {
                index,
                batch_index,
                message,
            });
        }

        if let Some(on_progress) = &options.on_progress {
            on_progress(&snapshot);
        }

        succeeded
    }

    /// Inter-batch cooldown, cut short when cancellation is requested
    async fn pause(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }

        let notified = self.control.cancel_notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.control.is_cancel_requested() {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {},
            _ = notified => {
                debug!("Cancellation received during inter-batch delay");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("operation panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("operation panicked: {message}")
    } else {
        "operation panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    async fn succeed(_: u32) -> std::result::Result<OperationOutcome, String> {
        Ok(OperationOutcome::success())
    }

    #[tokio::test]
    async fn test_rejects_empty_selection() {
        let executor = BatchExecutor::new();
        let err = executor
            .run(Vec::<u32>::new(), succeed, RunOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err, BulkError::EmptyItems);
        assert_eq!(executor.engine_state(), EngineState::Idle);
    }

    #[tokio::test]
    async fn test_rejects_zero_batch_size_before_dispatch() {
        let executor = BatchExecutor::new();
        let calls = AtomicUsize::new(0);
        let err = executor
            .run(
                vec![1, 2, 3],
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    succeed(0)
                },
                RunOptions::new().with_batch_size(0),
            )
            .await
            .unwrap_err();
        assert_eq!(err, BulkError::InvalidBatchSize { batch_size: 0 });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_when_idle_is_noop() {
        let executor = BatchExecutor::new();
        assert!(!executor.cancel());
        assert!(!executor.cancel_handle().is_cancel_requested());

        let result = executor
            .run(vec![1, 2], succeed, RunOptions::new().with_delay(Duration::ZERO))
            .await
            .unwrap();
        assert!(result.is_completed());
        assert_eq!(result.success, 2);
    }

    #[tokio::test]
    async fn test_panicking_operation_counts_as_failure() {
        let executor = BatchExecutor::new();
        let result = executor
            .run(
                vec![1u32, 2, 3],
                |n| async move {
                    if n == 2 {
                        panic!("endpoint exploded");
                    }
                    Ok::<_, String>(OperationOutcome::success())
                },
                RunOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.success, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.failures[0].index, 1);
        assert_eq!(
            result.failures[0].message,
            "operation panicked: endpoint exploded"
        );
    }

    #[tokio::test]
    async fn test_state_snapshot_retained_after_run() {
        let executor = BatchExecutor::new();
        executor
            .run(
                vec![1, 2, 3],
                succeed,
                RunOptions::new().with_batch_size(2).with_delay(Duration::ZERO),
            )
            .await
            .unwrap();

        let state = executor.state();
        assert!(!state.is_running);
        assert_eq!(state.processed, 3);
        assert_eq!(state.batches_completed, 2);
        assert_eq!(state.current_batch_index, 1);
        assert_eq!(executor.engine_state(), EngineState::Idle);
    }

    #[tokio::test]
    async fn test_dropped_run_returns_to_idle() {
        let executor = BatchExecutor::new();
        let run = executor.run(
            vec![1u32],
            |_| std::future::pending::<std::result::Result<OperationOutcome, String>>(),
            RunOptions::new(),
        );
        let timed_out = tokio::time::timeout(Duration::from_millis(20), run).await;
        assert!(timed_out.is_err());
        assert_eq!(executor.engine_state(), EngineState::Idle);
        assert!(!executor.state().is_running);
    }

    #[tokio::test]
    async fn test_whole_batch_dispatched_before_first_progress() {
        let executor = BatchExecutor::new();
        let events = Arc::new(Mutex::new(Vec::new()));

        let progress_events = Arc::clone(&events);
        let options = RunOptions::new()
            .with_delay(Duration::ZERO)
            .on_progress(move |state| {
                progress_events
                    .lock()
                    .push(format!("progress {}", state.processed));
            });

        let result = executor
            .run(
                vec![0u32, 1, 2],
                |n| {
                    let events = Arc::clone(&events);
                    async move {
                        events.lock().push(format!("dispatch {n}"));
                        if n > 0 {
                            tokio::task::yield_now().await;
                        }
                        Ok::<_, String>(OperationOutcome::success())
                    }
                },
                options,
            )
            .await
            .unwrap();

        assert_eq!(result.success, 3);
        let events = events.lock().clone();
        assert_eq!(
            events,
            vec![
                "dispatch 0",
                "dispatch 1",
                "dispatch 2",
                "progress 1",
                "progress 2",
                "progress 3",
            ]
        );
    }

    #[tokio::test]
    async fn test_panic_while_creating_future_counts_as_failure() {
        let executor = BatchExecutor::new();
        let result = executor
            .run(
                vec![1u32, 2, 3],
                |n| {
                    if n == 3 {
                        panic!("bad request");
                    }
                    succeed(n)
                },
                RunOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.success, 2);
        assert_eq!(result.failed_indices(), vec![2]);
        assert_eq!(result.failures[0].message, "operation panicked: bad request");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_cancel_handle_logs_like_executor_cancel() {
        let executor = BatchExecutor::new();
        let handle = executor.cancel_handle();
        assert!(executor.control.try_begin());

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            assert!(handle.cancel());
            assert!(!executor.cancel());
        });

        let output = String::from_utf8(logs.0.lock().clone()).unwrap();
        assert!(output.contains("Bulk run cancellation requested"));
        assert!(output.contains("cancellation already requested"));
        assert!(handle.is_cancel_requested());
    }

    #[test]
    fn test_preview_requires_items() {
        let executor = BatchExecutor::new();
        assert_eq!(
            executor.preview(0, &RunOptions::new()).unwrap_err(),
            BulkError::EmptyItems
        );
        let preview = executor.preview(57, &RunOptions::new()).unwrap();
        assert_eq!(preview.total_batches, 3);
    }
}
