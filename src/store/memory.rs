//! In-memory country storage backend.
//!
//! Provides a fast, non-persistent store using DashMap keyed by country
//! name. Ideal for testing, development, and embedded use cases.

use super::backend::CountryBackend;
use super::types::{CountryFields, CountryFilter, CountryRecord, RefreshStatus, SortOrder};
use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// In-memory country storage backend using DashMap.
///
/// All data is lost when the process exits. Ids are assigned from a
/// monotonically increasing counter and never reused.
///
/// # Thread Safety
///
/// `MemoryBackend` is `Clone`; clones share the same underlying data.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    rows: Arc<DashMap<String, CountryRecord>>,
    last_id: Arc<AtomicI64>,
    last_refreshed_at: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl MemoryBackend {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CountryBackend for MemoryBackend {
    async fn find_by_name(&self, name: &str) -> Result<Option<CountryRecord>> {
        Ok(self.rows.get(name).map(|row| row.value().clone()))
    }

    async fn insert(&self, fields: &CountryFields) -> Result<i64> {
        match self.rows.entry(fields.name.clone()) {
            Entry::Occupied(_) => bail!("Country '{}' already exists", fields.name),
            Entry::Vacant(slot) => {
                let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
                slot.insert(fields.clone().into_record(id, Utc::now()));
                Ok(id)
            },
        }
    }

    async fn update(&self, id: i64, fields: &CountryFields) -> Result<bool> {
        let Some(mut row) = self.rows.iter_mut().find(|row| row.id == id) else {
            return Ok(false);
        };
        let name = row.name.clone();
        *row = CountryFields {
            name,
            ..fields.clone()
        }
        .into_record(id, Utc::now());
        Ok(true)
    }

    async fn query(
        &self,
        filter: &CountryFilter,
        sort: Option<SortOrder>,
    ) -> Result<Vec<CountryRecord>> {
        let mut rows: Vec<CountryRecord> = self
            .rows
            .iter()
            .filter(|row| filter.matches(row.value()))
            .map(|row| row.value().clone())
            .collect();

        rows.sort_by_key(|row| row.id);
        if sort == Some(SortOrder::GdpDesc) {
            rows.sort_by(|a, b| b.estimated_gdp.total_cmp(&a.estimated_gdp));
        }
        Ok(rows)
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool> {
        Ok(self.rows.remove(name).is_some())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.rows.len() as u64)
    }

    async fn status(&self) -> Result<RefreshStatus> {
        Ok(RefreshStatus {
            last_refreshed_at: *self.last_refreshed_at.read(),
        })
    }

    async fn set_last_refreshed(&self, at: DateTime<Utc>) -> Result<()> {
        *self.last_refreshed_at.write() = Some(at);
        Ok(())
    }
}
