//! Static round-robin assignment of result pages to workers.
//!
//! The total number of results is unknown up front, so the partition is
//! computed from the requested amount alone: `ceil(amount / page_size)` pages,
//! with worker `i` of `n` owning pages `i, i + n, i + 2n, ...`. Partitions for
//! a fixed `(count, total_pages)` are pairwise disjoint and cover every page.

use thiserror::Error;

/// Errors constructing a [`WorkerContext`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    /// The worker pool must contain at least one worker.
    #[error("worker count must be at least 1")]
    EmptyPool,

    /// The worker id lies outside `0..count`.
    #[error("worker id {id} out of range for a pool of {count}")]
    IdOutOfRange {
        /// Offending worker id.
        id: usize,
        /// Pool size.
        count: usize,
    },
}

/// Identity of one worker within a fixed-size pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerContext {
    id: usize,
    count: usize,
}

impl WorkerContext {
    /// Creates the context for worker `id` of `count`.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError`] when `count` is zero or `id >= count`.
    pub fn new(id: usize, count: usize) -> Result<Self, PartitionError> {
        if count == 0 {
            return Err(PartitionError::EmptyPool);
        }
        if id >= count {
            return Err(PartitionError::IdOutOfRange { id, count });
        }
        Ok(Self { id, count })
    }

    /// Returns the contexts of every worker in a pool of `count`, in id order.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::EmptyPool`] when `count` is zero.
    pub fn pool(count: usize) -> Result<Vec<Self>, PartitionError> {
        (0..count.max(1))
            .map(|id| Self::new(id, count))
            .collect()
    }

    /// Zero-based worker id.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Number of workers in the pool.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Per-worker record ceiling: `ceil(amount / count)`.
    #[must_use]
    pub fn local_cap(&self, amount: usize) -> usize {
        amount.div_ceil(self.count)
    }
}

/// Number of pages needed to cover `amount` results at `page_size` per page.
#[must_use]
pub fn total_pages(amount: usize, page_size: usize) -> usize {
    amount.div_ceil(page_size.max(1))
}

/// The page indices owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePartition {
    worker: WorkerContext,
    total_pages: usize,
}

impl PagePartition {
    /// Partition of `[0, total_pages)` owned by `worker`.
    #[must_use]
    pub fn new(worker: WorkerContext, total_pages: usize) -> Self {
        Self {
            worker,
            total_pages,
        }
    }

    /// Partition for a run requesting `amount` results.
    #[must_use]
    pub fn for_amount(worker: WorkerContext, amount: usize, page_size: usize) -> Self {
        Self::new(worker, total_pages(amount, page_size))
    }

    /// Owned page indices in ascending order.
    pub fn pages(&self) -> impl Iterator<Item = usize> + use<> {
        (self.worker.id..self.total_pages).step_by(self.worker.count)
    }

    /// Number of owned pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.total_pages
            .saturating_sub(self.worker.id)
            .div_ceil(self.worker.count)
    }

    /// True when the worker owns no pages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
