//! Concurrency control for batch runs.
//!
//! Bounds the number of runs in flight so a second start request cannot
//! burst the external API or exhaust the process. The default bound is one,
//! which serializes runs; start requests beyond the bound are rejected, not
//! queued.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

// ─────────────────────────────────────────────────────────────────────────────
// RunScheduler
// ─────────────────────────────────────────────────────────────────────────────

/// Scheduler that limits the number of concurrent batch runs.
///
/// Uses a semaphore to enforce the limit. Permits are automatically released
/// when dropped, so a slot is freed however a run ends.
#[derive(Clone)]
pub struct RunScheduler {
    /// The underlying semaphore for concurrency control.
    sem: Arc<Semaphore>,
    /// Maximum number of concurrent runs allowed.
    max: usize,
}

impl RunScheduler {
    /// Creates a scheduler allowing `max_concurrent` runs in flight.
    ///
    /// # Panics
    ///
    /// Panics if `max_concurrent` is 0.
    pub fn new(max_concurrent: usize) -> Self {
        assert!(max_concurrent > 0, "max_concurrent must be greater than 0");

        Self {
            sem: Arc::new(Semaphore::new(max_concurrent)),
            max: max_concurrent,
        }
    }

    /// Attempts to claim a run slot without waiting.
    ///
    /// Returns `Some(permit)` if a slot is available, `None` otherwise. The
    /// permit must be held for the duration of the run.
    pub fn try_acquire(&self) -> Option<RunPermit> {
        self.sem
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| RunPermit { _permit: permit })
    }

    /// Returns the number of runs currently holding a slot.
    pub fn active_runs(&self) -> usize {
        self.max - self.sem.available_permits()
    }

    /// Returns the number of free slots.
    pub fn available_slots(&self) -> usize {
        self.sem.available_permits()
    }
}

/// A claimed run slot. Dropping it frees the slot.
pub struct RunPermit {
    _permit: OwnedSemaphorePermit,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
