//! Run-scoped shared state.
//!
//! Every run gets its own registry entry keyed by a run id handed back at
//! start time. Pollers and downloaders address state by that id; there is no
//! process-wide progress singleton, so concurrent runs cannot corrupt each
//! other's progress or artifact.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::progress::{BatchState, ProgressTracker};

/// Identifier of one batch run.
pub type RunId = Uuid;

/// Registry entry for one run.
struct RunEntry {
    tracker: ProgressTracker,
    artifact_path: PathBuf,
    /// Completion signal for the spawned batch task. `None` once taken.
    handle: Option<JoinHandle<()>>,
}

/// Concurrency-safe map of run id to run state.
#[derive(Clone, Default)]
pub struct RunRegistry {
    inner: Arc<RwLock<HashMap<RunId, RunEntry>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new run before its task is spawned.
    pub async fn insert(&self, run_id: RunId, tracker: ProgressTracker, artifact_path: PathBuf) {
        let mut runs = self.inner.write().await;
        runs.insert(
            run_id,
            RunEntry {
                tracker,
                artifact_path,
                handle: None,
            },
        );
    }

    /// Attaches the spawned task's handle as the run's completion signal.
    pub async fn attach_handle(&self, run_id: RunId, handle: JoinHandle<()>) {
        let mut runs = self.inner.write().await;
        if let Some(entry) = runs.get_mut(&run_id) {
            entry.handle = Some(handle);
        }
    }

    /// Read-only progress snapshot for one run, if it exists.
    pub async fn progress(&self, run_id: RunId) -> Option<BatchState> {
        let tracker = {
            let runs = self.inner.read().await;
            runs.get(&run_id).map(|entry| entry.tracker.clone())
        };
        match tracker {
            Some(tracker) => Some(tracker.snapshot().await),
            None => None,
        }
    }

    /// The artifact path for one run, if it exists.
    pub async fn artifact_path(&self, run_id: RunId) -> Option<PathBuf> {
        let runs = self.inner.read().await;
        runs.get(&run_id).map(|entry| entry.artifact_path.clone())
    }

    /// Takes the run's completion signal, leaving the entry in place.
    ///
    /// Awaiting the returned handle waits for the batch task to finish.
    pub async fn take_handle(&self, run_id: RunId) -> Option<JoinHandle<()>> {
        let mut runs = self.inner.write().await;
        runs.get_mut(&run_id).and_then(|entry| entry.handle.take())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
