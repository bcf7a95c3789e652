//! Concurrent work-item progress tracking.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// A consistent `(completed, total)` pair.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
}

impl ProgressSnapshot {
    pub const fn new(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }

    /// Completed fraction in `0.0..=1.0`; an empty tracker reports `0.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn is_done(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

/// Counts total and completed work items for one search session.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    /// Add `count` items to the total.
    async fn add_items(&self, count: usize) -> Result<()>;

    /// Mark `count` items as completed.
    async fn items_completed(&self, count: usize) -> Result<()>;

    /// The current counters.
    fn snapshot(&self) -> ProgressSnapshot;
}

/// Receives every snapshot a [`StreamingProgressTracker`] produces.
///
/// Snapshots can arrive out of call order when workers race, but each one
/// is internally consistent.
#[async_trait]
pub trait ProgressListener: Send + Sync {
    async fn report_progress(&self, snapshot: ProgressSnapshot) -> Result<()>;
}

/// A tracker that forwards each post-update snapshot to a listener.
///
/// Counters are updated under a lock and the snapshot is captured before the
/// lock is released; the listener runs outside the lock so a slow listener
/// never blocks other workers from recording progress.
pub struct StreamingProgressTracker {
    counts: Mutex<ProgressSnapshot>,
    listener: Option<Arc<dyn ProgressListener>>,
}

impl StreamingProgressTracker {
    pub fn new(listener: Arc<dyn ProgressListener>) -> Self {
        Self {
            counts: Mutex::new(ProgressSnapshot::default()),
            listener: Some(listener),
        }
    }

    /// A tracker that only counts.
    pub fn silent() -> Self {
        Self {
            counts: Mutex::new(ProgressSnapshot::default()),
            listener: None,
        }
    }

    async fn update(&self, apply: impl FnOnce(&mut ProgressSnapshot)) -> Result<()> {
        let snapshot = {
            let mut counts = self.counts.lock();
            apply(&mut counts);
            assert!(
                counts.completed <= counts.total,
                "completed items ({}) exceeded total items ({})",
                counts.completed,
                counts.total
            );
            *counts
        };

        match &self.listener {
            Some(listener) => listener.report_progress(snapshot).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProgressTracker for StreamingProgressTracker {
    async fn add_items(&self, count: usize) -> Result<()> {
        self.update(|counts| counts.total += count).await
    }

    async fn items_completed(&self, count: usize) -> Result<()> {
        self.update(|counts| counts.completed += count).await
    }

    fn snapshot(&self) -> ProgressSnapshot {
        *self.counts.lock()
    }
}

impl fmt::Debug for StreamingProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingProgressTracker")
            .field("counts", &*self.counts.lock())
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

/// Tracker for callers that do not care about progress.
#[derive(Debug, Default)]
pub struct NoOpProgressTracker;

#[async_trait]
impl ProgressTracker for NoOpProgressTracker {
    async fn add_items(&self, _count: usize) -> Result<()> {
        Ok(())
    }

    async fn items_completed(&self, _count: usize) -> Result<()> {
        Ok(())
    }

    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::default()
    }
}
