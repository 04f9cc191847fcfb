//! Country handlers.
//!
//! Refresh from upstream, list with filters, look up and delete by name,
//! and serve the summary image.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::info;

use super::super::types::{ListCountriesQuery, RefreshResponse};
use super::super::{AppError, SharedState};
use crate::store::{CountryFilter, CountryRecord, SortOrder};

const COUNTRY_NOT_FOUND: &str = "Country not found";
const IMAGE_NOT_FOUND: &str = "Summary image not found";

/// POST /countries/refresh - Re-fetch upstream data and upsert every country.
pub(crate) async fn refresh_countries(
    State(state): State<SharedState>,
) -> Result<Json<RefreshResponse>, AppError> {
    let outcome = state.pipeline.refresh().await?;
    Ok(Json(RefreshResponse {
        message: "Country data refreshed and cached successfully".to_string(),
        stored: outcome.stored,
        skipped: outcome.skipped,
    }))
}

/// GET /countries - List countries, optionally filtered and sorted.
pub(crate) async fn list_countries(
    State(state): State<SharedState>,
    Query(query): Query<ListCountriesQuery>,
) -> Result<Json<Vec<CountryRecord>>, AppError> {
    let filter = CountryFilter {
        region: query.region,
        currency: query.currency,
    };
    let sort = query.sort.as_deref().and_then(SortOrder::parse);

    let countries = state.store.query(&filter, sort).await?;
    Ok(Json(countries))
}

/// GET /countries/{name} - Get one country by exact name.
pub(crate) async fn get_country(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<CountryRecord>, AppError> {
    let country = state
        .store
        .get_by_name(&name)
        .await?
        .ok_or(AppError::NotFound(COUNTRY_NOT_FOUND))?;
    Ok(Json(country))
}

/// DELETE /countries/{name} - Remove one country.
pub(crate) async fn delete_country(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_by_name(&name).await? {
        return Err(AppError::NotFound(COUNTRY_NOT_FOUND));
    }
    info!(country = %name, "Country deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /countries/image - Serve the summary PNG.
pub(crate) async fn country_image(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = state
        .summary
        .load()
        .await?
        .ok_or(AppError::NotFound(IMAGE_NOT_FOUND))?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}
