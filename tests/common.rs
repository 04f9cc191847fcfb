//! Shared harness for HTTP integration tests.
//!
//! `TestHost` serves the real router on an ephemeral port, backed by an
//! in-memory store, fixed upstream sources and a temporary cache directory.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use country_cache::estimator::FixedMultiplier;
use country_cache::http::{AppState, router};
use country_cache::refresh::RefreshPipeline;
use country_cache::sources::{
    CurrencyInfo, RateTable, RawCountry, StaticCountrySource, StaticRateSource,
};
use country_cache::store::{
    CountryBackend, CountryFields, CountryFilter, CountryRecord, CountryStore, MemoryBackend,
    RefreshStatus, SortOrder,
};
use country_cache::summary::SummaryImage;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Raw upstream entry with the given name, population and currency.
pub fn country(name: &str, population: Option<i64>, currency: Option<&str>) -> RawCountry {
    RawCountry {
        name: Some(name.to_string()),
        capital: Some(format!("{name} City")),
        region: Some("Africa".to_string()),
        population,
        flag_url: Some(format!("https://flags.example/{name}.svg")),
        currencies: currency.map(|code| {
            vec![CurrencyInfo {
                code: Some(code.to_string()),
            }]
        }),
    }
}

/// Same as [`country`] with an explicit region.
pub fn country_in(name: &str, region: &str, population: i64, currency: &str) -> RawCountry {
    RawCountry {
        region: Some(region.to_string()),
        ..country(name, Some(population), Some(currency))
    }
}

/// Memory backend whose `fail_on`-th insert (1-based) fails.
pub struct FailingInserts {
    inner: MemoryBackend,
    fail_on: usize,
    inserts: AtomicUsize,
}

impl FailingInserts {
    pub fn new(fail_on: usize) -> Self {
        Self {
            inner: MemoryBackend::new(),
            fail_on,
            inserts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CountryBackend for FailingInserts {
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<CountryRecord>> {
        self.inner.find_by_name(name).await
    }

    async fn insert(&self, fields: &CountryFields) -> anyhow::Result<i64> {
        if self.inserts.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
            anyhow::bail!("disk I/O error");
        }
        self.inner.insert(fields).await
    }

    async fn update(&self, id: i64, fields: &CountryFields) -> anyhow::Result<bool> {
        self.inner.update(id, fields).await
    }

    async fn query(
        &self,
        filter: &CountryFilter,
        sort: Option<SortOrder>,
    ) -> anyhow::Result<Vec<CountryRecord>> {
        self.inner.query(filter, sort).await
    }

    async fn delete_by_name(&self, name: &str) -> anyhow::Result<bool> {
        self.inner.delete_by_name(name).await
    }

    async fn count(&self) -> anyhow::Result<u64> {
        self.inner.count().await
    }

    async fn status(&self) -> anyhow::Result<RefreshStatus> {
        self.inner.status().await
    }

    async fn set_last_refreshed(&self, at: DateTime<Utc>) -> anyhow::Result<()> {
        self.inner.set_last_refreshed(at).await
    }
}

pub struct TestHostBuilder {
    countries: Option<Arc<StaticCountrySource>>,
    rates: Option<Arc<StaticRateSource>>,
    multiplier: Option<u32>,
    store: Option<CountryStore>,
}

impl TestHostBuilder {
    pub fn countries(mut self, countries: Vec<RawCountry>) -> Self {
        self.countries = Some(Arc::new(StaticCountrySource::new(countries)));
        self
    }

    pub fn country_source(mut self, source: StaticCountrySource) -> Self {
        self.countries = Some(Arc::new(source));
        self
    }

    pub fn rates(mut self, pairs: &[(&str, f64)]) -> Self {
        self.rates = Some(Arc::new(StaticRateSource::from_pairs(
            pairs.iter().copied(),
        )));
        self
    }

    pub fn rate_source(mut self, source: StaticRateSource) -> Self {
        self.rates = Some(Arc::new(source));
        self
    }

    /// Replaces the default in-memory store.
    pub fn store(mut self, store: CountryStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Pins the GDP multiplier; random when unset.
    pub fn multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    pub async fn start(self) -> std::io::Result<TestHost> {
        let countries = self
            .countries
            .unwrap_or_else(|| Arc::new(StaticCountrySource::new(Vec::new())));
        let rates = self
            .rates
            .unwrap_or_else(|| Arc::new(StaticRateSource::new(RateTable::new())));

        let store = self.store.unwrap_or_else(CountryStore::memory);
        let cache_dir = TempDir::new()?;
        let summary = SummaryImage::new(cache_dir.path().join("cache"));

        let mut pipeline = RefreshPipeline::new(countries.clone(), rates.clone(), store.clone());
        if let Some(m) = self.multiplier {
            pipeline = pipeline.with_multiplier(Arc::new(FixedMultiplier::new(m)));
        }
        let state = Arc::new(AppState::new(pipeline, summary));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router(state)).await;
        });

        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(std::io::Error::other)?;

        Ok(TestHost {
            addr,
            client,
            store,
            countries,
            rates,
            _cache_dir: cache_dir,
            handle,
        })
    }
}

pub struct TestHost {
    addr: SocketAddr,
    client: reqwest::Client,
    pub store: CountryStore,
    pub countries: Arc<StaticCountrySource>,
    pub rates: Arc<StaticRateSource>,
    _cache_dir: TempDir,
    handle: JoinHandle<()>,
}

impl TestHost {
    pub fn builder() -> TestHostBuilder {
        TestHostBuilder {
            countries: None,
            rates: None,
            multiplier: None,
            store: None,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.get(self.url(path)).send().await
    }

    pub async fn post(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.post(self.url(path)).send().await
    }

    pub async fn delete(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.delete(self.url(path)).send().await
    }

    /// POST /countries/refresh and assert success.
    pub async fn refresh(&self) -> serde_json::Value {
        let resp = self.post("/countries/refresh").await.expect("refresh request");
        assert_eq!(resp.status(), 200, "refresh failed");
        resp.json().await.expect("refresh body")
    }
}

impl Drop for TestHost {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
