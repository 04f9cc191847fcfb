//! Upstream data sources for country metadata and exchange rates.
//!
//! Two independent read-only providers feed a refresh:
//!
//! - [`CountrySource`] - country list (name, capital, region, population, flag, currencies)
//! - [`RateSource`] - currency code to rate mapping, quoted per 1 USD
//!
//! Every failure is reported as [`SourceError`] carrying the name of the
//! upstream that failed, so callers can tell which provider is down.
//!
//! # Example
//!
//! ```ignore
//! use country_cache::sources::{HttpCountrySource, HttpRateSource, http_client};
//! use std::time::Duration;
//!
//! let client = http_client(Duration::from_secs(10))?;
//! let countries = HttpCountrySource::new(client.clone(), "https://restcountries.com/v2/all");
//! let rates = HttpRateSource::new(client, "https://open.er-api.com/v6/latest/USD");
//! ```

mod fixed;
mod http;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

pub use fixed::{StaticCountrySource, StaticRateSource};
pub use http::{HttpCountrySource, HttpRateSource, http_client, source_name_from_url};

/// Currency code to rate (units of local currency per 1 USD).
pub type RateTable = HashMap<String, f64>;

/// An upstream provider could not be reached or returned unusable data.
#[derive(Debug, Clone, thiserror::Error)]
#[error("source unavailable: {source_name}: {reason}")]
pub struct SourceError {
    /// Host name of the failed upstream (e.g. `restcountries.com`).
    pub source_name: String,
    pub reason: String,
}

impl SourceError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Currency descriptor attached to a raw country entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    #[serde(default)]
    pub code: Option<String>,
}

/// Country entry as delivered by the metadata source.
///
/// Every field is optional; entries missing a name or population are
/// dropped by the refresh pipeline rather than rejected here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCountry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient_population")]
    pub population: Option<i64>,
    #[serde(default, rename = "flag")]
    pub flag_url: Option<String>,
    #[serde(default)]
    pub currencies: Option<Vec<CurrencyInfo>>,
}

impl RawCountry {
    /// Code of the first listed currency, if any.
    pub fn primary_currency(&self) -> Option<&str> {
        self.currencies
            .as_ref()
            .and_then(|currencies| currencies.first())
            .and_then(|currency| currency.code.as_deref())
    }
}

/// Accepts integers and integral floats (`1000.0`); anything else reads as
/// missing so the entry is skipped downstream.
fn lenient_population<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    })
}

/// Decodes a country list entry by entry.
///
/// An entry that is not an object, or whose fields have the wrong types,
/// becomes an empty [`RawCountry`]. It carries no name, so the refresh
/// skips it and counts it as skipped.
pub fn decode_countries(entries: Vec<Value>) -> Vec<RawCountry> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value(entry).unwrap_or_else(|e| {
                debug!(index, error = %e, "Undecodable country entry");
                RawCountry::default()
            })
        })
        .collect()
}

/// Keeps the numeric rates of a raw `rates` object.
///
/// `null`, strings and other non-numbers are dropped, which leaves the
/// currency without a rate.
pub fn decode_rates(raw: HashMap<String, Value>) -> RateTable {
    raw.into_iter()
        .filter_map(|(code, value)| match value.as_f64() {
            Some(rate) => Some((code, rate)),
            None => {
                debug!(currency = %code, %value, "Ignoring non-numeric rate");
                None
            },
        })
        .collect()
}

/// Provider of the raw country list.
#[async_trait]
pub trait CountrySource: Send + Sync + 'static {
    /// Name reported in [`SourceError`] when this source fails.
    fn name(&self) -> &str;

    /// Fetches the full country list in source order.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on network failure, timeout, non-success
    /// status, or a body that is not a JSON array.
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SourceError>;
}

/// Provider of the USD-based exchange rate table.
#[async_trait]
pub trait RateSource: Send + Sync + 'static {
    /// Name reported in [`SourceError`] when this source fails.
    fn name(&self) -> &str;

    /// Fetches the current rate table.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on network failure, timeout, non-success
    /// status, or a body without a `rates` object.
    async fn fetch_rates(&self) -> Result<RateTable, SourceError>;
}
