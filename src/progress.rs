//! Per-run progress accounting.
//!
//! Consumers poll; there is no subscription interface. Each run owns one
//! `ProgressTracker`, handed out through the run registry, so concurrent
//! runs never share progress state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

// ─────────────────────────────────────────────────────────────────────────────
// RunPhase
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle phase of a batch run.
///
/// `Failed` is reachable only for unrecoverable conditions detected before
/// the query loop starts; per-query and per-place errors are absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    Idle,
    Running,
    Completed,
    Failed,
}

impl RunPhase {
    /// Returns true if the run cannot transition further.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Completed | RunPhase::Failed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BatchState
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot of a run's progress, as served to pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchState {
    pub phase: RunPhase,
    pub processed_count: u64,
    pub total_count: u64,
    pub percent: u8,
}

impl BatchState {
    fn idle() -> Self {
        Self {
            phase: RunPhase::Idle,
            processed_count: 0,
            total_count: 0,
            percent: 0,
        }
    }
}

/// Floored percentage of `processed` out of `total`.
///
/// A zero-query batch is complete the moment it starts, so `total == 0`
/// reports 100 without dividing.
fn percent_of(processed: u64, total: u64) -> u8 {
    if total == 0 {
        100
    } else {
        (processed * 100 / total) as u8
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ProgressTracker
// ─────────────────────────────────────────────────────────────────────────────

/// Thread-safe progress state for one run.
///
/// Cloning shares the underlying state: the runner advances it while
/// pollers snapshot it.
#[derive(Clone)]
pub struct ProgressTracker {
    state: Arc<RwLock<BatchState>>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(BatchState::idle())),
        }
    }

    /// Read-only copy of the current state.
    pub async fn snapshot(&self) -> BatchState {
        *self.state.read().await
    }

    /// Resets to the start of a run: zero progress, phase `Running`.
    ///
    /// Called before any network call so pollers never observe stale
    /// completion state from a previous run.
    pub async fn reset(&self, total: u64) {
        let mut state = self.state.write().await;
        *state = BatchState {
            phase: RunPhase::Running,
            processed_count: 0,
            total_count: total,
            percent: 0,
        };
    }

    /// Records that `processed` of `total` queries are done.
    pub async fn advance(&self, processed: u64, total: u64) {
        let mut state = self.state.write().await;
        state.processed_count = processed;
        state.total_count = total;
        state.percent = percent_of(processed, total);
    }

    /// Marks the run completed at 100 percent.
    pub async fn complete(&self) {
        let mut state = self.state.write().await;
        state.phase = RunPhase::Completed;
        state.processed_count = state.total_count;
        state.percent = 100;
    }

    /// Marks the run failed. Progress counters are left as they were.
    pub async fn fail(&self) {
        let mut state = self.state.write().await;
        state.phase = RunPhase::Failed;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
