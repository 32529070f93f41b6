//! # Batch Planning
//!
//! Stable, order-preserving partitioning of a selection into fixed-size
//! batches, plus the read-only [`PlanPreview`] a caller shows before asking
//! the operator to confirm a bulk action.

use crate::error::{BulkError, Result};
use serde::{Deserialize, Serialize};

/// Shape of a run, computed without touching the items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPreview {
    pub total: usize,
    pub total_batches: usize,
    pub batch_size: usize,
    /// Size of the final batch; equals `batch_size` when the split is even
    pub last_batch_size: usize,
}

impl PlanPreview {
    pub fn new(total: usize, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(BulkError::InvalidBatchSize { batch_size });
        }

        let total_batches = total.div_ceil(batch_size);
        let last_batch_size = match total % batch_size {
            0 if total > 0 => batch_size,
            remainder => remainder,
        };

        Ok(Self {
            total,
            total_batches,
            batch_size,
            last_batch_size,
        })
    }

    /// Number of inter-batch pauses a full run will take
    pub fn delay_count(&self) -> usize {
        self.total_batches.saturating_sub(1)
    }

    /// Size of the batch at `batch_index`, or `None` past the end
    pub fn batch_len(&self, batch_index: usize) -> Option<usize> {
        if batch_index >= self.total_batches {
            None
        } else if batch_index + 1 == self.total_batches {
            Some(self.last_batch_size)
        } else {
            Some(self.batch_size)
        }
    }
}

/// Items grouped into ordered batches of at most `batch_size`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan<T> {
    batch_size: usize,
    batches: Vec<Vec<T>>,
}

impl<T> BatchPlan<T> {
    /// Partition `items` preserving their order. Fails on a zero batch size.
    pub fn new(items: Vec<T>, batch_size: usize) -> Result<Self> {
        let preview = PlanPreview::new(items.len(), batch_size)?;

        let mut batches = Vec::with_capacity(preview.total_batches);
        let mut iter = items.into_iter().peekable();
        while iter.peek().is_some() {
            batches.push(iter.by_ref().take(batch_size).collect());
        }

        Ok(Self {
            batch_size,
            batches,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn total(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    pub fn total_batches(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn batches(&self) -> &[Vec<T>] {
        &self.batches
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.iter().map(Vec::len).collect()
    }

    pub fn preview(&self) -> PlanPreview {
        PlanPreview {
            total: self.total(),
            total_batches: self.total_batches(),
            batch_size: self.batch_size,
            last_batch_size: self.batches.last().map_or(0, Vec::len),
        }
    }

    pub fn into_batches(self) -> Vec<Vec<T>> {
        self.batches
    }
}
