//! Batch run orchestration.
//!
//! A run walks its query list in order, drives the Places client per query,
//! accumulates rows, and advances its progress tracker after every query.
//! Per-query and per-place errors are absorbed so one bad query never sinks
//! the batch; the table is exported and only then is the run marked
//! completed.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::export::{artifact_filename, export_table};
use crate::fields::{PlaceRecord, Projection};
use crate::places::PlacesClient;
use crate::progress::ProgressTracker;
use crate::registry::{RunId, RunRegistry};
use crate::scheduler::RunScheduler;

/// Pause between queries to avoid bursting the API.
const INTER_QUERY_DELAY: Duration = Duration::from_millis(500);

/// A validated batch run request, as handed over by the HTTP layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// Queries to process, in order. Order defines processing order and the
    /// progress fraction.
    pub queries: Vec<String>,
    /// Requested field identifiers; normalized against the catalog.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Label the exported table's file name is derived from.
    #[serde(default)]
    pub output_name: String,
}

/// Spawns and supervises batch runs.
///
/// Cloning is cheap; all clones share the same registry and scheduler.
#[derive(Clone)]
pub struct BatchRunner {
    client: PlacesClient,
    registry: RunRegistry,
    scheduler: RunScheduler,
    output_dir: PathBuf,
    inter_query_delay: Duration,
}

impl BatchRunner {
    pub fn new(
        client: PlacesClient,
        registry: RunRegistry,
        scheduler: RunScheduler,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            registry,
            scheduler,
            output_dir,
            inter_query_delay: INTER_QUERY_DELAY,
        }
    }

    /// Overrides the inter-query pause. Tests use `Duration::ZERO`.
    pub fn with_inter_query_delay(mut self, delay: Duration) -> Self {
        self.inter_query_delay = delay;
        self
    }

    /// Starts a run and returns its id immediately.
    ///
    /// The batch itself executes on a spawned task; callers discover
    /// completion by polling progress or attempting the download. The task's
    /// join handle is retained in the registry as the completion signal.
    ///
    /// # Errors
    ///
    /// Returns `AppError::RunsSaturated` when the scheduler has no free slot.
    pub async fn start(&self, request: RunRequest) -> Result<RunId, AppError> {
        let permit = self.scheduler.try_acquire().ok_or(AppError::RunsSaturated)?;

        let run_id = Uuid::new_v4();
        let projection = Projection::normalize(&request.fields);
        let artifact_path = self
            .output_dir
            .join(artifact_filename(run_id, &request.output_name));
        let tracker = ProgressTracker::new();

        self.registry
            .insert(run_id, tracker.clone(), artifact_path.clone())
            .await;

        info!(
            "[RUN] {} started: {} queries, {} fields",
            run_id,
            request.queries.len(),
            projection.len()
        );

        let runner = self.clone();
        let handle = tokio::spawn(async move {
            // Slot is held until the batch task finishes, however it ends.
            let _permit = permit;
            runner
                .execute(run_id, request.queries, projection, tracker, artifact_path)
                .await;
        });
        self.registry.attach_handle(run_id, handle).await;

        Ok(run_id)
    }

    /// Runs the batch to completion. Never returns an error: per-query
    /// failures are absorbed and terminal state is recorded on the tracker.
    async fn execute(
        &self,
        run_id: RunId,
        queries: Vec<String>,
        projection: Projection,
        tracker: ProgressTracker,
        artifact_path: PathBuf,
    ) {
        let total = queries.len() as u64;
        // Reset before any network call so pollers never observe stale
        // completion state.
        tracker.reset(total).await;

        let mut rows: Vec<PlaceRecord> = Vec::new();
        for (index, query) in queries.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.inter_query_delay).await;
            }

            match self.client.search(query, &projection).await {
                Ok(records) => {
                    info!(
                        "[RUN] {} query {}/{} yielded {} places",
                        run_id,
                        index + 1,
                        total,
                        records.len()
                    );
                    rows.extend(records);
                }
                Err(e) => {
                    // This query contributes zero rows; the batch continues.
                    warn!(
                        "[RUN] {} query {}/{} skipped: {}",
                        run_id,
                        index + 1,
                        total,
                        e
                    );
                }
            }

            tracker.advance((index + 1) as u64, total).await;
        }

        // The artifact is written even for zero rows, so a download after
        // completion never misses the file.
        match export_table(rows, projection, artifact_path).await {
            Ok(path) => {
                tracker.complete().await;
                info!("[RUN] {} completed: {:?}", run_id, path);
            }
            Err(e) => {
                tracker.fail().await;
                error!("[RUN] {} failed to export: {}", run_id, e);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
