//! HTTP API for the country cache.
//!
//! Routes:
//! - `POST   /countries/refresh` - Re-fetch upstream data and upsert all countries
//! - `GET    /countries` - List countries (`region`, `currency`, `sort=gdp_desc`)
//! - `GET    /countries/image` - Summary PNG
//! - `GET    /countries/{name}` - One country by exact name
//! - `DELETE /countries/{name}` - Remove one country
//! - `GET    /status` - Row count and last refresh time
//! - `GET    /health` - Liveness check

mod handlers;
pub mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::refresh::{RefreshError, RefreshPipeline};
use crate::store::CountryStore;
use crate::summary::{SummaryError, SummaryImage};
use types::ErrorResponse;

/// State shared by all handlers.
pub struct AppState {
    pub store: CountryStore,
    pub pipeline: RefreshPipeline,
    pub summary: SummaryImage,
}

impl AppState {
    /// Builds state whose pipeline writes to `store` and regenerates `summary`.
    pub fn new(pipeline: RefreshPipeline, summary: SummaryImage) -> Self {
        let store = pipeline.store().clone();
        Self {
            store,
            pipeline: pipeline.with_summary(summary.clone()),
            summary,
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Handler error mapped onto an HTTP status and JSON body.
#[derive(Debug)]
pub enum AppError {
    /// 404 with the given message.
    NotFound(&'static str),
    /// 503 naming the upstream that failed.
    SourceUnavailable { source_name: String },
    /// 500; the detail is logged, never returned.
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, ErrorResponse::new(message)),
            Self::SourceUnavailable { source_name } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::with_details(
                    "External data source unavailable",
                    format!("Could not fetch data from {source_name}"),
                ),
            ),
            Self::Internal(e) => {
                error!(error = %format!("{e:#}"), "Request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details(
                        "Internal server error",
                        "Could not connect to the database",
                    ),
                )
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e)
    }
}

impl From<RefreshError> for AppError {
    fn from(e: RefreshError) -> Self {
        match e {
            RefreshError::SourceUnavailable(source) => Self::SourceUnavailable {
                source_name: source.source_name,
            },
            RefreshError::Storage(e) => Self::Internal(e),
        }
    }
}

impl From<SummaryError> for AppError {
    fn from(e: SummaryError) -> Self {
        Self::Internal(anyhow::Error::new(e))
    }
}

/// Builds the API router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/countries", get(handlers::list_countries))
        .route("/countries/refresh", post(handlers::refresh_countries))
        .route("/countries/image", get(handlers::country_image))
        .route(
            "/countries/{name}",
            get(handlers::get_country).delete(handlers::delete_country),
        )
        .route("/status", get(handlers::status))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
