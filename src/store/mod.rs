//! Country record store with pluggable backends.
//!
//! Holds one row per country name plus the global refresh status
//! singleton. Supports multiple backends:
//!
//! - **SqliteBackend**: Persistent relational storage (default for the server)
//! - **MemoryBackend**: Fast, non-persistent storage (ideal for testing/embedding)
//!
//! # Example
//!
//! ```ignore
//! use country_cache::store::CountryStore;
//!
//! // In-memory (testing/embedding)
//! let store = CountryStore::memory();
//!
//! // Persistent (production)
//! let store = CountryStore::file("./countries.db")?;
//! let total = store.count().await?;
//! ```
//!
//! # Custom Backends
//!
//! Implement the `CountryBackend` trait to use custom storage:
//!
//! ```ignore
//! use country_cache::store::{CountryBackend, CountryStore};
//!
//! struct MysqlBackend { /* ... */ }
//! impl CountryBackend for MysqlBackend { /* ... */ }
//!
//! let store = CountryStore::custom(MysqlBackend::new());
//! ```

mod backend;
mod memory;
mod sqlite;
#[allow(clippy::module_inception)]
mod store;
mod types;

#[cfg(test)]
mod tests;

// Re-export the public API
pub use backend::CountryBackend;
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub use store::CountryStore;
pub use types::{
    CountryFields, CountryFilter, CountryRecord, RefreshStatus, SortOrder, UpsertOutcome,
};
