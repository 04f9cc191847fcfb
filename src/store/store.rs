//! High-level `CountryStore` wrapper over backend implementations.
//!
//! Provides a convenient API that wraps any `CountryBackend` implementation.

use super::backend::CountryBackend;
use super::memory::MemoryBackend;
use super::sqlite::SqliteBackend;
use super::types::{
    CountryFields, CountryFilter, CountryRecord, RefreshStatus, SortOrder, UpsertOutcome,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

/// Country record store.
///
/// Wraps a `CountryBackend` implementation and provides a consistent API
/// regardless of the underlying storage mechanism.
///
/// # Thread Safety
///
/// `CountryStore` is `Clone` and can be shared across threads. The
/// underlying backend handles concurrent access safely.
///
/// # Example
///
/// ```ignore
/// use country_cache::store::{CountryFilter, CountryStore, SortOrder};
///
/// let store = CountryStore::file("./countries.db")?;
/// let african = store
///     .query(&CountryFilter { region: Some("Africa".into()), currency: None }, Some(SortOrder::GdpDesc))
///     .await?;
/// ```
#[derive(Clone)]
pub struct CountryStore {
    backend: Arc<dyn CountryBackend>,
}

impl CountryStore {
    /// Creates a store backed by a SQLite database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or its schema
    /// cannot be created.
    pub fn file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let backend = SqliteBackend::open(path)?;
        Ok(Self {
            backend: Arc::new(backend),
        })
    }

    /// Creates a store backed by a private in-memory SQLite database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn sqlite_in_memory() -> Result<Self> {
        let backend = SqliteBackend::open_in_memory()?;
        Ok(Self {
            backend: Arc::new(backend),
        })
    }

    /// Creates a store backed by the DashMap in-memory backend.
    pub fn memory() -> Self {
        Self {
            backend: Arc::new(MemoryBackend::new()),
        }
    }

    /// Creates a store with a custom backend.
    pub fn custom<B: CountryBackend>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Inserts or updates a country keyed by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn upsert(&self, fields: &CountryFields) -> Result<UpsertOutcome> {
        self.backend.upsert(fields).await
    }

    /// Returns countries matching every filter predicate.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn query(
        &self,
        filter: &CountryFilter,
        sort: Option<SortOrder>,
    ) -> Result<Vec<CountryRecord>> {
        self.backend.query(filter, sort).await
    }

    /// Looks up a country by exact name.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<CountryRecord>> {
        self.backend.find_by_name(name).await
    }

    /// Deletes a country by exact name. Returns `Ok(true)` if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn delete_by_name(&self, name: &str) -> Result<bool> {
        self.backend.delete_by_name(name).await
    }

    /// Number of stored countries.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn count(&self) -> Result<u64> {
        self.backend.count().await
    }

    /// Top `limit` countries by estimated GDP.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn top_by_gdp(&self, limit: usize) -> Result<Vec<CountryRecord>> {
        self.backend.top_by_gdp(limit).await
    }

    /// Reads the refresh status singleton.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn status(&self) -> Result<RefreshStatus> {
        self.backend.status().await
    }

    /// Records the time of a completed refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn set_last_refreshed(&self, at: DateTime<Utc>) -> Result<()> {
        self.backend.set_last_refreshed(at).await
    }
}
