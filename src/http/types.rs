//! Request and response bodies for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Query string of `GET /countries`.
#[derive(Debug, Default, Deserialize)]
pub struct ListCountriesQuery {
    pub region: Option<String>,
    pub currency: Option<String>,
    /// Only `gdp_desc` is recognized; other values are ignored.
    pub sort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub message: String,
    pub stored: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub total_countries: u64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// JSON error body: `{"error": ..., "details": ...}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}
