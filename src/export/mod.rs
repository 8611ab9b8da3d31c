//! Tabular export of accumulated place records.
//!
//! The exported artifact is a UTF-8 CSV: one header row with the projection's
//! identifiers in projection order, then one full-width row per place record.
//! Files are written through an atomic temp-file writer, so a partially
//! written table is never visible at the final path.

mod atomic_writer;
mod table;

pub use atomic_writer::AtomicTableWriter;
pub use table::{artifact_filename, export_table, sanitize_output_name};
