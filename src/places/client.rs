//! HTTP client for Places API text search and detail fetches.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::error::AppError;
use crate::fields::{PlaceRecord, Projection};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// User agent string for all Places API requests.
const CLIENT_USER_AGENT: &str = "place-harvest/0.1.0";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Field mask for the search stage: only the place id and the continuation
/// token. Full attributes are fetched per place with the caller's projection.
const SEARCH_FIELD_MASK: &str = "places.id,nextPageToken";

/// Maximum number of result pages fetched per query, bounding cost and
/// latency.
pub const MAX_SEARCH_PAGES: usize = 3;

/// Delay before a continuation token is reused. Page tokens become valid a
/// short time after they are issued.
const PAGE_TOKEN_DELAY: Duration = Duration::from_secs(2);

// ─────────────────────────────────────────────────────────────────────────────
// Internal Wire Types (match Places API JSON exactly)
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for `places:searchText`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchTextRequest<'a> {
    text_query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

/// One page of text-search results, id-only per `SEARCH_FIELD_MASK`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSearchResponse {
    #[serde(default)]
    places: Vec<WirePlaceId>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WirePlaceId {
    id: String,
}

/// Places API error envelope: `{"error": {...}}`.
#[derive(Debug, Deserialize)]
struct WireErrorEnvelope {
    error: WireApiError,
}

#[derive(Debug, Deserialize)]
struct WireApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// PlacesClient
// ─────────────────────────────────────────────────────────────────────────────

/// Client for Places API text search and detail fetches.
///
/// The base URL is injected so tests can point the client at a mock server.
/// The API key is attached per request as `X-Goog-Api-Key` and never appears
/// in URLs or logs.
#[derive(Clone)]
pub struct PlacesClient {
    /// The underlying HTTP client.
    http: reqwest::Client,
    /// API base URL (e.g. "https://places.googleapis.com").
    base_url: Url,
    /// Places API key (wrapped for security).
    api_key: SecretString,
    /// Delay before reusing a continuation token.
    page_token_delay: Duration,
}

impl PlacesClient {
    /// Creates a new Places client.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client fails to initialize.
    pub fn new(base_url: Url, api_key: SecretString) -> Result<Self, AppError> {
        let http = build_http_client()?;
        Ok(Self {
            http,
            base_url,
            api_key,
            page_token_delay: PAGE_TOKEN_DELAY,
        })
    }

    /// Overrides the continuation-token delay. Tests use `Duration::ZERO`.
    pub fn with_page_token_delay(mut self, delay: Duration) -> Self {
        self.page_token_delay = delay;
        self
    }

    /// Looks a query up and returns projected records for every place found.
    ///
    /// Issues one paginated text search for ids, then one detail fetch per
    /// id. A detail-stage error skips that place (logged, loop continues);
    /// only a search-stage error fails the whole lookup.
    pub async fn search(
        &self,
        query: &str,
        projection: &Projection,
    ) -> Result<Vec<PlaceRecord>, AppError> {
        let place_ids = self.search_ids(query).await?;

        let mut records = Vec::with_capacity(place_ids.len());
        for place_id in &place_ids {
            match self.fetch_place(place_id, projection).await {
                Ok(place) => records.push(PlaceRecord::project(&place, projection)),
                Err(e) => {
                    warn!(
                        "[PLACES] detail fetch for {} skipped: {}",
                        redact_place_id(place_id),
                        e
                    );
                }
            }
        }

        Ok(records)
    }

    /// Runs a text search and returns the place ids of every result,
    /// following continuation tokens up to `MAX_SEARCH_PAGES` pages.
    pub async fn search_ids(&self, query: &str) -> Result<Vec<String>, AppError> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 0..MAX_SEARCH_PAGES {
            if page > 0 {
                // The token is not valid until the consistency window passes.
                tokio::time::sleep(self.page_token_delay).await;
            }

            let response = self.search_page(query, page_token.as_deref()).await?;
            ids.extend(response.places.into_iter().map(|p| p.id));

            match response.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(ids)
    }

    /// Fetches one page of text-search results.
    async fn search_page(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<WireSearchResponse, AppError> {
        let url = self.build_url("/v1/places:searchText")?;

        let request_body = SearchTextRequest {
            text_query: query,
            page_token,
        };

        let response = self
            .http
            .post(url)
            .header("X-Goog-Api-Key", self.api_key.expose_secret())
            .header("X-Goog-FieldMask", SEARCH_FIELD_MASK)
            .json(&request_body)
            .send()
            .await
            .map_err(|_| {
                AppError::ConnectionFailed("Text search request failed".to_string())
            })?;

        let status = response.status();
        info!(
            "[PLACES] POST /v1/places:searchText{} -> {}",
            if page_token.is_some() { " (paginated)" } else { "" },
            status.as_u16()
        );

        if !status.is_success() {
            return Err(parse_error_response(response, status).await);
        }

        response.json().await.map_err(|e| {
            AppError::Internal(format!("Failed to parse search response: {}", e))
        })
    }

    /// Fetches the full caller-selected projection for one place.
    ///
    /// Returns the raw place JSON; projection into cells happens in
    /// [`PlaceRecord::project`].
    pub async fn fetch_place(
        &self,
        place_id: &str,
        projection: &Projection,
    ) -> Result<Value, AppError> {
        let url = self.build_url(&format!("/v1/places/{}", place_id))?;

        let response = self
            .http
            .get(url)
            .header("X-Goog-Api-Key", self.api_key.expose_secret())
            .header("X-Goog-FieldMask", projection.detail_field_mask())
            .send()
            .await
            .map_err(|_| {
                AppError::ConnectionFailed("Place detail request failed".to_string())
            })?;

        let status = response.status();
        info!(
            "[PLACES] GET /v1/places/{} -> {}",
            redact_place_id(place_id),
            status.as_u16()
        );

        if !status.is_success() {
            return Err(parse_error_response(response, status).await);
        }

        response.json().await.map_err(|e| {
            AppError::Internal(format!("Failed to parse place response: {}", e))
        })
    }

    /// Builds a full URL by joining the path with the base URL.
    fn build_url(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|_| AppError::Internal(format!("Invalid path: {}", path)))
    }
}

/// Builds the configured HTTP client.
fn build_http_client() -> Result<reqwest::Client, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Error Handling
// ─────────────────────────────────────────────────────────────────────────────

/// Parses an error response and maps it to the appropriate AppError.
async fn parse_error_response(
    response: reqwest::Response,
    status: reqwest::StatusCode,
) -> AppError {
    // Check for rate limiting
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return AppError::RateLimited {
            retry_after_secs: retry_after,
        };
    }

    // Try to parse the Places error envelope
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("Unable to read error body"));

    if let Ok(envelope) = serde_json::from_str::<WireErrorEnvelope>(&body) {
        let prefix = envelope
            .error
            .status
            .map(|s| format!("[{}] ", s))
            .unwrap_or_default();
        return AppError::PlacesApi(format!("{}{}", prefix, envelope.error.message));
    }

    // Fallback to generic error
    AppError::PlacesApi(format!(
        "HTTP {} - {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown error")
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Helper Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Redacts a place id for logging (shows first 8 chars).
fn redact_place_id(id: &str) -> String {
    if id.len() > 8 {
        format!("{}...", &id[..8])
    } else {
        id.to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
