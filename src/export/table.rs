//! Table serialization and artifact naming.

use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::export::AtomicTableWriter;
use crate::fields::{PlaceRecord, Projection};

/// Fallback stem when the caller-supplied label sanitizes to nothing.
const DEFAULT_OUTPUT_STEM: &str = "results";

/// Derives a safe file name from a caller-supplied label.
///
/// Space and `/` are substituted by `_`; a `.csv` extension is appended if
/// absent. Callers are not trusted with arbitrary filesystem paths.
pub fn sanitize_output_name(label: &str) -> String {
    let mut name: String = label
        .trim()
        .chars()
        .map(|c| if c == ' ' || c == '/' { '_' } else { c })
        .collect();

    if name.is_empty() {
        name = DEFAULT_OUTPUT_STEM.to_string();
    }
    if !name.to_ascii_lowercase().ends_with(".csv") {
        name.push_str(".csv");
    }
    name
}

/// On-disk artifact name for one run: the sanitized label scoped by the run
/// id, so concurrent runs never overwrite each other's output.
pub fn artifact_filename(run_id: Uuid, label: &str) -> String {
    format!("{}_{}", run_id, sanitize_output_name(label))
}

/// Serializes the accumulated rows and projection into a CSV artifact.
///
/// The header row is the projection's identifiers in projection order; every
/// data row has exactly `projection.len()` cells. The file is written
/// atomically and completely before this returns.
pub async fn export_table(
    rows: Vec<PlaceRecord>,
    projection: Projection,
    path: PathBuf,
) -> Result<PathBuf, AppError> {
    tokio::task::spawn_blocking(move || write_table_blocking(&rows, &projection, &path))
        .await
        .map_err(|e| AppError::CsvExport(format!("Task join error: {}", e)))?
}

/// Blocking implementation of table serialization.
fn write_table_blocking(
    rows: &[PlaceRecord],
    projection: &Projection,
    path: &Path,
) -> Result<PathBuf, AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::CsvExport(format!("Failed to create output directory: {}", e))
        })?;
    }

    let mut writer = AtomicTableWriter::new(path)?;
    writer.write_row(projection.headers())?;
    for row in rows {
        writer.write_row(row.cells())?;
    }
    let final_path = writer.finish()?;

    info!(
        "[EXPORT] Wrote {} rows x {} columns to {:?}",
        rows.len(),
        projection.len(),
        final_path
    );

    Ok(final_path)
}
