//! Record types shared by all store backends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored country row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub id: i64,
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: f64,
    pub flag_url: Option<String>,
    /// Stamped by the store on every insert or update.
    pub last_refreshed_at: DateTime<Utc>,
}

/// Field values written by an upsert. The store assigns `id` and
/// `last_refreshed_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryFields {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: f64,
    pub flag_url: Option<String>,
}

impl CountryFields {
    /// Materializes a record for backends that build rows in memory.
    pub(crate) fn into_record(self, id: i64, at: DateTime<Utc>) -> CountryRecord {
        CountryRecord {
            id,
            name: self.name,
            capital: self.capital,
            region: self.region,
            population: self.population,
            currency_code: self.currency_code,
            exchange_rate: self.exchange_rate,
            estimated_gdp: self.estimated_gdp,
            flag_url: self.flag_url,
            last_refreshed_at: at,
        }
    }
}

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: i64,
    /// `true` when a new row was inserted, `false` when an existing row was updated.
    pub created: bool,
}

/// Conjunctive exact-match filter over country rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryFilter {
    pub region: Option<String>,
    pub currency: Option<String>,
}

impl CountryFilter {
    pub(crate) fn matches(&self, record: &CountryRecord) -> bool {
        let region_ok = self
            .region
            .as_ref()
            .is_none_or(|region| record.region.as_ref() == Some(region));
        let currency_ok = self
            .currency
            .as_ref()
            .is_none_or(|code| record.currency_code.as_ref() == Some(code));
        region_ok && currency_ok
    }
}

/// Recognized sort orders for country queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Highest `estimated_gdp` first.
    GdpDesc,
}

impl SortOrder {
    /// Parses a `sort` query value. Unrecognized values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "gdp_desc" => Some(Self::GdpDesc),
            _ => None,
        }
    }
}

/// Global refresh status singleton.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshStatus {
    /// Time of the last successful refresh, `None` before the first one.
    pub last_refreshed_at: Option<DateTime<Utc>>,
}
