use async_trait::async_trait;
use bulkops_core::{
    BulkAction, ConfirmationGate, OperationError, OperationOutcome, PlanPreview, RemoteCommand,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// A console row selected for a bulk action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedRow {
    pub id: u64,
    pub name: String,
}

pub fn rows(count: u64) -> Vec<SelectedRow> {
    (1..=count)
        .map(|id| SelectedRow {
            id,
            name: format!("service-{id:03}"),
        })
        .collect()
}

/// Stand-in for the remote endpoint: records every call and fails the ids it
/// was told to fail
#[derive(Debug, Default, Clone)]
pub struct MockRemote {
    pub calls: Arc<Mutex<Vec<(BulkAction, u64)>>>,
    pub failing_ids: Arc<Mutex<HashSet<u64>>>,
    pub transport_down_ids: Arc<Mutex<HashSet<u64>>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(ids: impl IntoIterator<Item = u64>) -> Self {
        let remote = Self::new();
        remote.failing_ids.lock().extend(ids);
        remote
    }

    pub fn heal(&self) {
        self.failing_ids.lock().clear();
        self.transport_down_ids.lock().clear();
    }

    pub fn called_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.calls.lock().iter().map(|(_, id)| *id).collect();
        ids.sort_unstable();
        ids
    }
}

#[async_trait]
impl RemoteCommand<SelectedRow> for MockRemote {
    async fn execute(
        &self,
        action: BulkAction,
        item: SelectedRow,
    ) -> Result<OperationOutcome, OperationError> {
        self.calls.lock().push((action, item.id));
        tokio::task::yield_now().await;

        if self.transport_down_ids.lock().contains(&item.id) {
            return Err(OperationError::transport("connection reset"));
        }
        if self.failing_ids.lock().contains(&item.id) {
            return Ok(OperationOutcome::failure(format!(
                "{} rejected for {}",
                action, item.name
            )));
        }
        Ok(OperationOutcome::success_with(format!("{} ok for {}", action, item.name)))
    }
}

/// Gate that always refuses and remembers what it was shown
#[derive(Debug, Default)]
pub struct DenyAll {
    pub seen: Mutex<Vec<(BulkAction, PlanPreview)>>,
}

#[async_trait]
impl ConfirmationGate for DenyAll {
    async fn confirm(&self, action: BulkAction, preview: &PlanPreview) -> bool {
        self.seen.lock().push((action, *preview));
        false
    }
}
