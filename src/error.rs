use serde::Serialize;
use thiserror::Error;

/// Patterns (lowercase) that indicate sensitive data not safe for display.
/// Used by `contains_sensitive()` for case-insensitive matching.
pub(crate) const SENSITIVE_PATTERNS: &[&str] = &[
    "x-goog-api-key",
    "api_key",
    "apikey",
    "key=",
    "bearer ",
    "authorization:",
];

/// Returns true if the message contains any sensitive pattern (case-insensitive).
fn contains_sensitive(msg: &str) -> bool {
    let lower = msg.to_ascii_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Sanitizes a message for display.
/// If sensitive content is detected, returns the fallback instead.
fn sanitize_message(msg: &str, fallback: &str) -> String {
    if contains_sensitive(msg) {
        fallback.into()
    } else {
        msg.to_string()
    }
}

/// User-friendly error presentation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPresentation {
    pub title: String,
    pub message: String,
    pub action: Option<String>,
}

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Configuration ─────────────────────────────────────────────────────────
    #[error("Places API key is not configured")]
    MissingApiKey,

    #[error("Configuration error: {0}")]
    Config(String),

    // ── Places API ────────────────────────────────────────────────────────────
    #[error("Places API error: {0}")]
    PlacesApi(String),

    #[error("Rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    // ── Runs ──────────────────────────────────────────────────────────────────
    #[error("Run {0} not found")]
    RunNotFound(String),

    #[error("Export for run {0} is not ready yet")]
    ExportNotReady(String),

    #[error("Too many runs in flight")]
    RunsSaturated,

    // ── Export ────────────────────────────────────────────────────────────────
    #[error("CSV export error: {0}")]
    CsvExport(String),

    // ── Network ───────────────────────────────────────────────────────────────
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    // ── Generic fallback ──────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Converts the error into a user-friendly presentation suitable for an
    /// API response body. Never leaks the API key or raw request URLs.
    pub fn to_presentation(&self) -> ErrorPresentation {
        match self {
            // ── Configuration ─────────────────────────────────────────────────
            AppError::MissingApiKey => ErrorPresentation {
                title: "Missing API Key".into(),
                message: "The Places API key is not configured on the server.".into(),
                action: Some("Set PLACES_API_KEY and restart".into()),
            },

            AppError::Config(msg) => ErrorPresentation {
                title: "Configuration Error".into(),
                message: sanitize_message(msg, "The server configuration is invalid."),
                action: Some("Check the server configuration".into()),
            },

            // ── Places API ────────────────────────────────────────────────────
            AppError::PlacesApi(msg) => ErrorPresentation {
                title: "Places API Error".into(),
                message: sanitize_message(msg, "The place search service returned an error."),
                action: None,
            },

            AppError::RateLimited { retry_after_secs } => {
                let wait_msg = match retry_after_secs {
                    Some(secs) => format!("Please wait {} seconds before trying again.", secs),
                    None => "Please wait a moment before trying again.".into(),
                };
                ErrorPresentation {
                    title: "Too Many Requests".into(),
                    message: format!(
                        "The place search service is limiting requests. {}",
                        wait_msg
                    ),
                    action: Some("Wait and retry".into()),
                }
            }

            // ── Runs ──────────────────────────────────────────────────────────
            AppError::RunNotFound(_) => ErrorPresentation {
                title: "Run Not Found".into(),
                message: "No run with that identifier exists. It may never have been started."
                    .into(),
                action: Some("Start a new run".into()),
            },

            AppError::ExportNotReady(_) => ErrorPresentation {
                title: "Export Not Ready".into(),
                message:
                    "The run is still in progress. The export will be available once it completes."
                        .into(),
                action: Some("Poll progress and retry the download".into()),
            },

            AppError::RunsSaturated => ErrorPresentation {
                title: "Too Many Runs".into(),
                message: "The server is already processing the maximum number of runs.".into(),
                action: Some("Wait for a run to finish and retry".into()),
            },

            // ── Export ────────────────────────────────────────────────────────
            AppError::CsvExport(msg) => ErrorPresentation {
                title: "Export Failed".into(),
                message: format!("The results table could not be written: {}", msg),
                action: Some("Retry the run".into()),
            },

            // ── Network ───────────────────────────────────────────────────────
            AppError::ConnectionFailed(_) => ErrorPresentation {
                title: "Connection Failed".into(),
                message: "Could not reach the place search service.".into(),
                action: Some("Check network and retry".into()),
            },

            // ── Generic ───────────────────────────────────────────────────────
            AppError::Internal(_) => ErrorPresentation {
                title: "Unexpected Error".into(),
                message: "Something went wrong. Please try again.".into(),
                action: Some("Try again".into()),
            },
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_presentation().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns all AppError variants for exhaustive testing.
    fn all_variants() -> Vec<AppError> {
        vec![
            // Configuration
            AppError::MissingApiKey,
            AppError::Config("bad output dir".into()),
            // Places API
            AppError::PlacesApi("INVALID_ARGUMENT: bad field mask".into()),
            AppError::RateLimited {
                retry_after_secs: Some(30),
            },
            AppError::RateLimited {
                retry_after_secs: None,
            },
            // Runs
            AppError::RunNotFound("8b51a1f2".into()),
            AppError::ExportNotReady("8b51a1f2".into()),
            AppError::RunsSaturated,
            // Export
            AppError::CsvExport("disk full".into()),
            // Network
            AppError::ConnectionFailed("timeout".into()),
            // Generic
            AppError::Internal("something broke".into()),
        ]
    }

    #[test]
    fn all_variants_have_nonempty_title_and_message() {
        for variant in all_variants() {
            let presentation = variant.to_presentation();
            assert!(
                !presentation.title.trim().is_empty(),
                "Empty title for {:?}",
                variant
            );
            assert!(
                !presentation.message.trim().is_empty(),
                "Empty message for {:?}",
                variant
            );
        }
    }

    #[test]
    fn rate_limited_mentions_retry_time() {
        let presentation = AppError::RateLimited {
            retry_after_secs: Some(30),
        }
        .to_presentation();
        assert!(
            presentation.message.contains("30"),
            "RateLimited message should mention retry_after_secs"
        );
        let action = presentation.action.expect("RateLimited should have action");
        let action_lower = action.to_lowercase();
        assert!(action_lower.contains("wait") || action_lower.contains("retry"));
    }

    #[test]
    fn not_ready_is_distinguishable_from_not_found() {
        let not_found = AppError::RunNotFound("abc".into()).to_presentation();
        let not_ready = AppError::ExportNotReady("abc".into()).to_presentation();
        assert_ne!(not_found.title, not_ready.title);
    }

    #[test]
    fn serialization_produces_valid_json_with_required_fields() {
        for variant in all_variants() {
            let json = serde_json::to_string(&variant)
                .unwrap_or_else(|_| panic!("Failed to serialize {:?}", variant));

            let parsed: serde_json::Value = serde_json::from_str(&json)
                .unwrap_or_else(|_| panic!("Failed to parse JSON for {:?}", variant));

            assert!(
                parsed.get("title").is_some(),
                "missing 'title' for {:?}",
                variant
            );
            assert!(
                parsed.get("message").is_some(),
                "missing 'message' for {:?}",
                variant
            );
            // action can be null, but field should exist
            assert!(
                parsed.get("action").is_some(),
                "missing 'action' for {:?}",
                variant
            );
        }
    }

    #[test]
    fn no_secret_leakage_in_presentation() {
        let test_cases: Vec<(&str, AppError)> = vec![
            (
                "PlacesApi",
                AppError::PlacesApi("denied: X-Goog-Api-Key AIza123 invalid".into()),
            ),
            (
                "Config",
                AppError::Config("PLACES_API_KEY=AIza123 rejected".into()),
            ),
            (
                "ConnectionFailed",
                AppError::ConnectionFailed("https://host/v1?key=AIza123".into()),
            ),
            (
                "Internal",
                AppError::Internal("Authorization: Bearer abc leaked".into()),
            ),
        ];

        for (label, variant) in test_cases {
            let presentation = variant.to_presentation();
            let output_lower = format!(
                "{} {} {}",
                presentation.title,
                presentation.message,
                presentation.action.as_deref().unwrap_or("")
            )
            .to_ascii_lowercase();

            // Reuse production patterns for consistency
            for pattern in SENSITIVE_PATTERNS {
                assert!(
                    !output_lower.contains(pattern),
                    "{} presentation contains sensitive pattern",
                    label
                );
            }
        }
    }
}
