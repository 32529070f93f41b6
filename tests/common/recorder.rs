use bulkops_core::{ExecutionState, RunOptions};
use parking_lot::Mutex;
use std::sync::Arc;

/// Captures everything the executor reports through its callbacks
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    pub batch_starts: Arc<Mutex<Vec<(usize, usize)>>>,
    pub progress: Arc<Mutex<Vec<ExecutionState>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach both callbacks to `options`
    pub fn attach(&self, options: RunOptions) -> RunOptions {
        let batch_starts = Arc::clone(&self.batch_starts);
        let progress = Arc::clone(&self.progress);
        options
            .on_batch_start(move |index, count| batch_starts.lock().push((index, count)))
            .on_progress(move |state| progress.lock().push(state.clone()))
    }

    pub fn batch_starts(&self) -> Vec<(usize, usize)> {
        self.batch_starts.lock().clone()
    }

    pub fn progress(&self) -> Vec<ExecutionState> {
        self.progress.lock().clone()
    }
}
