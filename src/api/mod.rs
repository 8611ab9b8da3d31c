//! HTTP surface for starting runs, polling progress, and downloading the
//! exported table. Routing stays thin; all batch semantics live in the
//! library modules.

mod runs;

pub use runs::{download_run, health, run_progress, start_run};
