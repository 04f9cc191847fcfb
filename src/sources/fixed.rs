//! In-process sources serving fixed data.
//!
//! Used for tests, offline runs and embedding. Each source can also be
//! built in a failing state to simulate an unreachable upstream.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{CountrySource, RateSource, RateTable, RawCountry, SourceError};

/// Country source returning a fixed list (or a fixed failure).
pub struct StaticCountrySource {
    name: String,
    countries: RwLock<Result<Vec<RawCountry>, SourceError>>,
}

impl StaticCountrySource {
    pub fn new(countries: Vec<RawCountry>) -> Self {
        Self {
            name: "static-countries".to_string(),
            countries: RwLock::new(Ok(countries)),
        }
    }

    /// A source whose every fetch fails as `name`.
    pub fn unavailable(name: impl Into<String>) -> Self {
        let name = name.into();
        let error = SourceError::unavailable(name.clone(), "connection refused");
        Self {
            name,
            countries: RwLock::new(Err(error)),
        }
    }

    /// Replaces the list served by later fetches.
    pub fn set_countries(&self, countries: Vec<RawCountry>) {
        *self.countries.write() = Ok(countries);
    }
}

#[async_trait]
impl CountrySource for StaticCountrySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SourceError> {
        self.countries.read().clone()
    }
}

/// Rate source returning a fixed table (or a fixed failure).
pub struct StaticRateSource {
    name: String,
    rates: RwLock<Result<RateTable, SourceError>>,
}

impl StaticRateSource {
    pub fn new(rates: RateTable) -> Self {
        Self {
            name: "static-rates".to_string(),
            rates: RwLock::new(Ok(rates)),
        }
    }

    /// Convenience constructor from `(code, rate)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(code, rate)| (code.to_string(), rate))
                .collect(),
        )
    }

    /// A source whose every fetch fails as `name`.
    pub fn unavailable(name: impl Into<String>) -> Self {
        let name = name.into();
        let error = SourceError::unavailable(name.clone(), "connection refused");
        Self {
            name,
            rates: RwLock::new(Err(error)),
        }
    }

    /// Replaces the table served by later fetches.
    pub fn set_rates(&self, rates: RateTable) {
        *self.rates.write() = Ok(rates);
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rates(&self) -> Result<RateTable, SourceError> {
        self.rates.read().clone()
    }
}
