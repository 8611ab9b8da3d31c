//! Google Places API (New) client layer.
//!
//! Key features:
//!
//! - **Minimal search stage** - text search requests only place ids plus the
//!   continuation token; full data comes from per-place detail fetches
//! - **Bounded pagination** - continuation tokens are followed up to a fixed
//!   page cap, with the delay the API requires before a token becomes valid
//! - **Secure logging** - the API key is never logged, place ids are redacted
//! - **Error mapping** - Places error envelopes are parsed into `AppError`

pub mod client;

pub use client::{PlacesClient, MAX_SEARCH_PAGES};

/// Production endpoint for the Places API (New).
pub const DEFAULT_BASE_URL: &str = "https://places.googleapis.com";
