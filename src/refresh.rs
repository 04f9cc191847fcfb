//! Refresh pipeline: fetch, join, estimate, upsert.
//!
//! A refresh pulls the country list and the USD rate table, joins them on
//! each country's first currency code, derives an estimated GDP, and
//! upserts every valid country by name. The global refresh timestamp is
//! captured once up front and written after the loop. Each upsert commits
//! on its own; a storage failure midway leaves earlier rows in place.
//!
//! Nothing is written when either upstream fails.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::estimator::{MultiplierSource, RandomMultiplier, estimate};
use crate::sources::{CountrySource, RateSource, RateTable, RawCountry, SourceError};
use crate::store::{CountryFields, CountryStore};
use crate::summary::SummaryImage;

/// Refresh failure.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// One of the upstream providers failed; no rows were touched.
    #[error(transparent)]
    SourceUnavailable(#[from] SourceError),

    /// The store rejected a read or write.
    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),
}

/// Counts reported by a completed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Rows inserted or updated.
    pub stored: usize,
    /// Rows inserted (subset of `stored`).
    pub created: usize,
    /// Source entries dropped for a missing name or population.
    pub skipped: usize,
    pub refreshed_at: DateTime<Utc>,
}

/// Builds the row for one raw country, or `None` when it must be skipped.
pub fn merge_country(
    raw: RawCountry,
    rates: &RateTable,
    multiplier: &dyn MultiplierSource,
) -> Option<CountryFields> {
    let currency_code = raw.primary_currency().map(str::to_string);
    let name = raw.name.filter(|name| !name.is_empty())?;
    let population = raw.population?;

    let est = estimate(population, currency_code.as_deref(), rates, multiplier);

    Some(CountryFields {
        name,
        capital: raw.capital,
        region: raw.region,
        population,
        currency_code,
        exchange_rate: est.exchange_rate,
        estimated_gdp: est.estimated_gdp,
        flag_url: raw.flag_url,
    })
}

/// Orchestrates a full refresh against a store.
///
/// # Example
///
/// ```ignore
/// let pipeline = RefreshPipeline::new(countries, rates, store.clone())
///     .with_summary(SummaryImage::new("cache"));
/// let outcome = pipeline.refresh().await?;
/// ```
#[derive(Clone)]
pub struct RefreshPipeline {
    countries: Arc<dyn CountrySource>,
    rates: Arc<dyn RateSource>,
    store: CountryStore,
    multiplier: Arc<dyn MultiplierSource>,
    summary: Option<SummaryImage>,
}

impl RefreshPipeline {
    pub fn new(
        countries: Arc<dyn CountrySource>,
        rates: Arc<dyn RateSource>,
        store: CountryStore,
    ) -> Self {
        Self {
            countries,
            rates,
            store,
            multiplier: Arc::new(RandomMultiplier),
            summary: None,
        }
    }

    /// Replaces the GDP multiplier source.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: Arc<dyn MultiplierSource>) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Regenerates this summary image after every successful refresh.
    #[must_use]
    pub fn with_summary(mut self, summary: SummaryImage) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn store(&self) -> &CountryStore {
        &self.store
    }

    /// Runs one refresh.
    ///
    /// # Errors
    ///
    /// - [`RefreshError::SourceUnavailable`] if either upstream fails (nothing written)
    /// - [`RefreshError::Storage`] if an upsert or the status update fails
    pub async fn refresh(&self) -> Result<RefreshOutcome, RefreshError> {
        let raw_countries = self.countries.fetch_countries().await?;
        let rates = self.rates.fetch_rates().await?;

        let refreshed_at = Utc::now();
        let mut stored = 0;
        let mut created = 0;
        let mut skipped = 0;

        for raw in raw_countries {
            let label = raw.name.clone().unwrap_or_default();
            let Some(fields) = merge_country(raw, &rates, self.multiplier.as_ref()) else {
                debug!(country = %label, "Skipping entry without name or population");
                skipped += 1;
                continue;
            };

            let outcome = self
                .store
                .upsert(&fields)
                .await
                .map_err(RefreshError::Storage)?;
            debug!(
                country = %fields.name,
                id = outcome.id,
                created = outcome.created,
                "Upserted country"
            );

            stored += 1;
            if outcome.created {
                created += 1;
            }
        }

        self.store
            .set_last_refreshed(refreshed_at)
            .await
            .map_err(RefreshError::Storage)?;

        info!(
            stored,
            created,
            skipped,
            rates = rates.len(),
            %refreshed_at,
            "Country data refreshed"
        );

        if let Some(summary) = &self.summary
            && let Err(e) = summary.regenerate(&self.store).await
        {
            warn!(error = %e, "Summary image generation failed");
        }

        Ok(RefreshOutcome {
            stored,
            created,
            skipped,
            refreshed_at,
        })
    }
}
