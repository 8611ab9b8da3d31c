//! Process configuration loaded from environment variables.
//!
//! The Places API key is required and wrapped in `secrecy::SecretString` to
//! prevent accidental exposure through `Debug` or logging. Everything else
//! has a sensible default.

use std::env;
use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::AppError;

/// Environment variable holding the Google Places API key.
pub const API_KEY_VAR: &str = "PLACES_API_KEY";

/// Environment variable for the HTTP bind address.
pub const BIND_VAR: &str = "HARVEST_BIND";

/// Environment variable for the export output directory.
pub const OUTPUT_DIR_VAR: &str = "HARVEST_OUTPUT_DIR";

/// Environment variable bounding concurrent batch runs.
pub const MAX_RUNS_VAR: &str = "HARVEST_MAX_RUNS";

const DEFAULT_BIND: &str = "127.0.0.1:5080";
const DEFAULT_OUTPUT_DIR: &str = "exports";
const DEFAULT_MAX_RUNS: usize = 1;

/// Runtime configuration for the harvester service.
#[derive(Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Google Places API key (wrapped for security).
    pub api_key: SecretString,
    /// Directory where exported tables are written.
    pub output_dir: PathBuf,
    /// Maximum number of batch runs allowed in flight at once.
    pub max_concurrent_runs: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("api_key", &"[REDACTED]")
            .field("output_dir", &self.output_dir)
            .field("max_concurrent_runs", &self.max_concurrent_runs)
            .finish()
    }
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MissingApiKey` if `PLACES_API_KEY` is unset or blank.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests inject a closure instead of mutating
    /// the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or(AppError::MissingApiKey)?;

        let bind_addr = lookup(BIND_VAR).unwrap_or_else(|| DEFAULT_BIND.to_string());

        let output_dir = lookup(OUTPUT_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let max_concurrent_runs = match lookup(MAX_RUNS_VAR) {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    AppError::Config(format!("{} must be a positive integer", MAX_RUNS_VAR))
                })?,
            None => DEFAULT_MAX_RUNS,
        };

        Ok(Self {
            bind_addr,
            api_key: SecretString::from(api_key),
            output_dir,
            max_concurrent_runs,
        })
    }
}
