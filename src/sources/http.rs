//! reqwest-backed upstream sources.

use std::time::Duration;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    CountrySource, RateSource, RateTable, RawCountry, SourceError, decode_countries, decode_rates,
};

/// Builds the shared HTTP client used for both upstreams.
///
/// The timeout bounds the whole request (connect, headers and body).
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("country-cache/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Derives the name reported for a failing source from its URL host.
///
/// Falls back to the raw URL when it has no host.
pub fn source_name_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

/// GETs `url` and decodes a JSON body, mapping every failure to [`SourceError`].
async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    source_name: &str,
) -> Result<T, SourceError> {
    let unavailable = |reason: String| {
        warn!(source = %source_name, %url, %reason, "Upstream fetch failed");
        SourceError::unavailable(source_name, reason)
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    let response = response
        .error_for_status()
        .map_err(|e| unavailable(e.to_string()))?;

    let body = response
        .json::<T>()
        .await
        .map_err(|e| unavailable(format!("invalid response body: {e}")))?;

    debug!(source = %source_name, "Upstream fetch succeeded");
    Ok(body)
}

/// Country metadata source backed by a REST endpoint returning a JSON array.
///
/// Only a body that is not an array fails the fetch; malformed entries
/// inside the array are handed on empty and skipped by the refresh.
#[derive(Clone)]
pub struct HttpCountrySource {
    client: reqwest::Client,
    url: String,
    name: String,
}

impl HttpCountrySource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        let url = url.into();
        let name = source_name_from_url(&url);
        Self { client, url, name }
    }
}

#[async_trait]
impl CountrySource for HttpCountrySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SourceError> {
        let entries: Vec<Value> = get_json(&self.client, &self.url, &self.name).await?;
        Ok(decode_countries(entries))
    }
}

#[derive(Deserialize)]
struct RatesPayload {
    rates: HashMap<String, Value>,
}

/// Exchange rate source backed by an endpoint returning `{"rates": {...}}`.
#[derive(Clone)]
pub struct HttpRateSource {
    client: reqwest::Client,
    url: String,
    name: String,
}

impl HttpRateSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        let url = url.into();
        let name = source_name_from_url(&url);
        Self { client, url, name }
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rates(&self) -> Result<RateTable, SourceError> {
        let payload: RatesPayload = get_json(&self.client, &self.url, &self.name).await?;
        Ok(decode_rates(payload.rates))
    }
}
