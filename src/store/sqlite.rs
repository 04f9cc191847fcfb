//! SQLite-backed country storage.
//!
//! Holds the `countries` table and the singleton `app_status` row. Every
//! statement runs in autocommit mode, so a refresh commits row by row.

use super::backend::CountryBackend;
use super::types::{CountryFields, CountryFilter, CountryRecord, RefreshStatus, SortOrder};
use crate::constants::STATUS_ROW_ID;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::path::Path;
use std::sync::Arc;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS countries (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    name              TEXT NOT NULL UNIQUE,
    capital           TEXT,
    region            TEXT,
    population        INTEGER NOT NULL,
    currency_code     TEXT,
    exchange_rate     REAL,
    estimated_gdp     REAL NOT NULL DEFAULT 0,
    flag_url          TEXT,
    last_refreshed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_countries_region ON countries(region);
CREATE INDEX IF NOT EXISTS idx_countries_currency ON countries(currency_code);

CREATE TABLE IF NOT EXISTS app_status (
    id                INTEGER PRIMARY KEY,
    last_refreshed_at TEXT
);
";

const COLUMNS: &str = "id, name, capital, region, population, currency_code, exchange_rate, \
                       estimated_gdp, flag_url, last_refreshed_at";

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CountryRecord> {
    Ok(CountryRecord {
        id: row.get("id")?,
        name: row.get("name")?,
        capital: row.get("capital")?,
        region: row.get("region")?,
        population: row.get("population")?,
        currency_code: row.get("currency_code")?,
        exchange_rate: row.get("exchange_rate")?,
        estimated_gdp: row.get("estimated_gdp")?,
        flag_url: row.get("flag_url")?,
        last_refreshed_at: row.get("last_refreshed_at")?,
    })
}

/// SQLite country storage backend.
///
/// # Thread Safety
///
/// `SqliteBackend` is `Clone` and can be shared across threads. The single
/// connection sits behind a mutex and all statements run on the blocking
/// thread pool.
#[derive(Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Opens or creates a database file and bootstraps the schema.
    ///
    /// Creates parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory cannot be created
    /// - Database file cannot be opened or created
    /// - Schema bootstrap fails
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to enable WAL mode")?;

        Self::from_connection(conn)
    }

    /// Creates a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to create schema")?;
        conn.execute(
            "INSERT OR IGNORE INTO app_status (id, last_refreshed_at) VALUES (?1, NULL)",
            params![STATUS_ROW_ID],
        )
        .context("Failed to seed status row")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn find_by_name_sync(&self, name: &str) -> Result<Option<CountryRecord>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM countries WHERE name = ?1"),
            params![name],
            row_to_record,
        )
        .optional()
        .with_context(|| format!("Failed to look up country '{name}'"))
    }

    fn insert_sync(&self, fields: &CountryFields) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO countries (name, capital, region, population, currency_code, \
             exchange_rate, estimated_gdp, flag_url, last_refreshed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                fields.name,
                fields.capital,
                fields.region,
                fields.population,
                fields.currency_code,
                fields.exchange_rate,
                fields.estimated_gdp,
                fields.flag_url,
                Utc::now(),
            ],
        )
        .with_context(|| format!("Failed to insert country '{}'", fields.name))?;
        Ok(conn.last_insert_rowid())
    }

    fn update_sync(&self, id: i64, fields: &CountryFields) -> Result<bool> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE countries SET capital = ?1, region = ?2, population = ?3, \
             currency_code = ?4, exchange_rate = ?5, estimated_gdp = ?6, flag_url = ?7, \
             last_refreshed_at = ?8 WHERE id = ?9",
            params![
                fields.capital,
                fields.region,
                fields.population,
                fields.currency_code,
                fields.exchange_rate,
                fields.estimated_gdp,
                fields.flag_url,
                Utc::now(),
                id,
            ],
        )
        .with_context(|| format!("Failed to update country '{}'", fields.name))?;
        Ok(updated > 0)
    }

    fn query_sync(
        &self,
        filter: &CountryFilter,
        sort: Option<SortOrder>,
        limit: Option<usize>,
    ) -> Result<Vec<CountryRecord>> {
        let mut sql = format!("SELECT {COLUMNS} FROM countries WHERE 1=1");
        let mut args: Vec<&str> = Vec::new();

        if let Some(region) = &filter.region {
            sql.push_str(" AND region = ?");
            args.push(region);
        }
        if let Some(currency) = &filter.currency {
            sql.push_str(" AND currency_code = ?");
            args.push(currency);
        }

        match sort {
            Some(SortOrder::GdpDesc) => sql.push_str(" ORDER BY estimated_gdp DESC, id ASC"),
            None => sql.push_str(" ORDER BY id ASC"),
        }

        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql).context("Failed to prepare country query")?;
        let rows = stmt
            .query_map(params_from_iter(args), row_to_record)
            .context("Failed to query countries")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read country row")?;
        Ok(rows)
    }

    fn delete_by_name_sync(&self, name: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let removed = conn
            .execute("DELETE FROM countries WHERE name = ?1", params![name])
            .with_context(|| format!("Failed to delete country '{name}'"))?;
        Ok(removed > 0)
    }

    fn count_sync(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM countries", [], |row| row.get(0))
            .context("Failed to count countries")?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn status_sync(&self) -> Result<RefreshStatus> {
        let conn = self.conn.lock();
        let last_refreshed_at = conn
            .query_row(
                "SELECT last_refreshed_at FROM app_status WHERE id = ?1",
                params![STATUS_ROW_ID],
                |row| row.get::<_, Option<DateTime<Utc>>>(0),
            )
            .optional()
            .context("Failed to read refresh status")?
            .flatten();
        Ok(RefreshStatus { last_refreshed_at })
    }

    fn set_last_refreshed_sync(&self, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO app_status (id, last_refreshed_at) VALUES (?1, ?2) \
             ON CONFLICT(id) DO UPDATE SET last_refreshed_at = excluded.last_refreshed_at",
            params![STATUS_ROW_ID, at],
        )
        .context("Failed to update refresh status")?;
        Ok(())
    }
}

#[async_trait]
impl CountryBackend for SqliteBackend {
    async fn find_by_name(&self, name: &str) -> Result<Option<CountryRecord>> {
        let backend = self.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || backend.find_by_name_sync(&name))
            .await
            .context("Task join error")?
    }

    async fn insert(&self, fields: &CountryFields) -> Result<i64> {
        let backend = self.clone();
        let fields = fields.clone();
        tokio::task::spawn_blocking(move || backend.insert_sync(&fields))
            .await
            .context("Task join error")?
    }

    async fn update(&self, id: i64, fields: &CountryFields) -> Result<bool> {
        let backend = self.clone();
        let fields = fields.clone();
        tokio::task::spawn_blocking(move || backend.update_sync(id, &fields))
            .await
            .context("Task join error")?
    }

    async fn query(
        &self,
        filter: &CountryFilter,
        sort: Option<SortOrder>,
    ) -> Result<Vec<CountryRecord>> {
        let backend = self.clone();
        let filter = filter.clone();
        tokio::task::spawn_blocking(move || backend.query_sync(&filter, sort, None))
            .await
            .context("Task join error")?
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool> {
        let backend = self.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || backend.delete_by_name_sync(&name))
            .await
            .context("Task join error")?
    }

    async fn count(&self) -> Result<u64> {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.count_sync())
            .await
            .context("Task join error")?
    }

    async fn status(&self) -> Result<RefreshStatus> {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.status_sync())
            .await
            .context("Task join error")?
    }

    async fn set_last_refreshed(&self, at: DateTime<Utc>) -> Result<()> {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.set_last_refreshed_sync(at))
            .await
            .context("Task join error")?
    }

    async fn top_by_gdp(&self, limit: usize) -> Result<Vec<CountryRecord>> {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || {
            backend.query_sync(&CountryFilter::default(), Some(SortOrder::GdpDesc), Some(limit))
        })
        .await
        .context("Task join error")?
    }
}
