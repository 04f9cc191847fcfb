//! Backend trait for the country store.
//!
//! Defines the interface that all country storage backends must implement,
//! enabling pluggable storage (SQLite, in-memory, etc.).

use super::types::{
    CountryFields, CountryFilter, CountryRecord, RefreshStatus, SortOrder, UpsertOutcome,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Backend trait for country storage.
///
/// All backends must be thread-safe (`Send + Sync`) for use with tokio.
/// Each mutating call is its own unit of work; no call spans several rows
/// of a refresh.
///
/// # Example
///
/// ```ignore
/// use country_cache::store::{CountryBackend, MemoryBackend};
///
/// let backend = MemoryBackend::new();
/// let outcome = backend.upsert(&fields).await?;
/// let row = backend.find_by_name("Wakanda").await?;
/// ```
#[async_trait]
pub trait CountryBackend: Send + Sync + 'static {
    /// Looks up a row by exact (case-sensitive) name.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn find_by_name(&self, name: &str) -> Result<Option<CountryRecord>>;

    /// Inserts a new row and returns its id.
    ///
    /// The backend stamps `last_refreshed_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name already exists or the write fails.
    async fn insert(&self, fields: &CountryFields) -> Result<i64>;

    /// Overwrites every mutable field of the row with `id`.
    ///
    /// The backend stamps `last_refreshed_at`. The name is left untouched.
    /// Returns `Ok(false)` if no row has that id (e.g. deleted meanwhile).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn update(&self, id: i64, fields: &CountryFields) -> Result<bool>;

    /// Returns rows matching all filter predicates, optionally sorted.
    ///
    /// Without a sort order rows come back in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn query(
        &self,
        filter: &CountryFilter,
        sort: Option<SortOrder>,
    ) -> Result<Vec<CountryRecord>>;

    /// Deletes a row by exact name.
    ///
    /// Returns `Ok(true)` if a row was removed, `Ok(false)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn delete_by_name(&self, name: &str) -> Result<bool>;

    /// Number of stored rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn count(&self) -> Result<u64>;

    /// Reads the refresh status singleton.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn status(&self) -> Result<RefreshStatus>;

    /// Records the time of a completed refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn set_last_refreshed(&self, at: DateTime<Utc>) -> Result<()>;

    /// Top `limit` rows by estimated GDP, highest first.
    ///
    /// Default implementation sorts the full table; backends may override
    /// for efficiency.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn top_by_gdp(&self, limit: usize) -> Result<Vec<CountryRecord>> {
        let mut rows = self
            .query(&CountryFilter::default(), Some(SortOrder::GdpDesc))
            .await?;
        rows.truncate(limit);
        Ok(rows)
    }

    /// Inserts the row if its name is unseen, otherwise updates it in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup or the write fails.
    async fn upsert(&self, fields: &CountryFields) -> Result<UpsertOutcome> {
        if let Some(existing) = self.find_by_name(&fields.name).await?
            && self.update(existing.id, fields).await?
        {
            return Ok(UpsertOutcome {
                id: existing.id,
                created: false,
            });
        }

        // Unseen name, or the row was deleted between lookup and update.
        let id = self.insert(fields).await?;
        Ok(UpsertOutcome { id, created: true })
    }
}
