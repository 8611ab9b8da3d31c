//! Atomic CSV writer: temp file in the destination directory, renamed into
//! place on finish, cleaned up automatically if dropped early.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use csv::Writer;
use tempfile::NamedTempFile;

use crate::error::AppError;

/// CSV writer that only exposes complete files.
///
/// Rows are written to a temporary file next to the destination; `finish()`
/// atomically replaces the destination. Dropping the writer without calling
/// `finish()` deletes the temporary file.
pub struct AtomicTableWriter {
    writer: Writer<BufWriter<NamedTempFile>>,
    final_path: PathBuf,
}

impl AtomicTableWriter {
    /// Creates a writer targeting `final_path`.
    ///
    /// The temporary file lives in the same directory as the destination;
    /// the rename is atomic only within one filesystem.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CsvExport` if the parent directory cannot be
    /// determined or the temporary file cannot be created.
    pub fn new(final_path: impl AsRef<Path>) -> Result<Self, AppError> {
        let final_path = final_path.as_ref().to_path_buf();

        let parent_dir = final_path.parent().ok_or_else(|| {
            AppError::CsvExport(format!(
                "Cannot determine parent directory for: {}",
                final_path.display()
            ))
        })?;

        let temp_file = NamedTempFile::new_in(parent_dir)
            .map_err(|e| AppError::CsvExport(format!("Failed to create temporary file: {}", e)))?;

        Ok(Self {
            writer: Writer::from_writer(BufWriter::new(temp_file)),
            final_path,
        })
    }

    /// Appends one row. The `csv` crate handles quoting of embedded
    /// separators and newlines.
    pub fn write_row<I, T>(&mut self, row: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(row)
            .map_err(|e| AppError::CsvExport(format!("Failed to write row: {}", e)))
    }

    /// Flushes all buffers and atomically persists the file.
    ///
    /// Consumes the writer and returns the final path. On error the
    /// temporary file is cleaned up automatically.
    pub fn finish(self) -> Result<PathBuf, AppError> {
        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| AppError::CsvExport(format!("Failed to flush CSV writer: {}", e.error())))?;

        let named_temp = buf_writer
            .into_inner()
            .map_err(|e| AppError::CsvExport(format!("Failed to flush buffer: {}", e.error())))?;

        named_temp.persist(&self.final_path).map_err(|e| {
            AppError::CsvExport(format!(
                "Failed to persist file to {}: {}",
                self.final_path.display(),
                e.error
            ))
        })?;

        Ok(self.final_path)
    }
}
