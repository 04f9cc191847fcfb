//! Tests for the country store module.
//!
//! Behavioral tests run against both backends.

use super::*;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

fn fields(name: &str, region: &str, currency: Option<&str>, gdp: f64) -> CountryFields {
    CountryFields {
        name: name.to_string(),
        capital: Some(format!("{name} City")),
        region: Some(region.to_string()),
        population: 1_000,
        currency_code: currency.map(str::to_string),
        exchange_rate: currency.map(|_| 1.5),
        estimated_gdp: gdp,
        flag_url: None,
    }
}

fn backends() -> Vec<(&'static str, CountryStore)> {
    vec![
        ("sqlite", CountryStore::sqlite_in_memory().unwrap()),
        ("memory", CountryStore::memory()),
    ]
}

async fn seed(store: &CountryStore) {
    for f in [
        fields("France", "Europe", Some("EUR"), 300.0),
        fields("Germany", "Europe", Some("EUR"), 500.0),
        fields("Norway", "Europe", Some("NOK"), 100.0),
        fields("Kenya", "Africa", Some("KES"), 200.0),
        fields("Nowhere", "Africa", None, 0.0),
    ] {
        store.upsert(&f).await.unwrap();
    }
}

fn names(rows: &[CountryRecord]) -> Vec<&str> {
    rows.iter().map(|r| r.name.as_str()).collect()
}

#[tokio::test]
async fn test_upsert_inserts_then_updates_in_place() {
    for (label, store) in backends() {
        let first = store
            .upsert(&fields("Wakanda", "Africa", Some("WAK"), 10.0))
            .await
            .unwrap();
        assert!(first.created, "{label}");

        let before = store.get_by_name("Wakanda").await.unwrap().unwrap();

        let mut changed = fields("Wakanda", "Atlantis", Some("ATL"), 99.0);
        changed.capital = None;
        changed.population = 42;
        changed.flag_url = Some("https://flags.example/wk.svg".into());
        let second = store.upsert(&changed).await.unwrap();

        assert!(!second.created, "{label}");
        assert_eq!(second.id, first.id, "{label}");
        assert_eq!(store.count().await.unwrap(), 1, "{label}");

        let after = store.get_by_name("Wakanda").await.unwrap().unwrap();
        assert_eq!(after.id, first.id);
        assert_eq!(after.capital, None);
        assert_eq!(after.region.as_deref(), Some("Atlantis"));
        assert_eq!(after.population, 42);
        assert_eq!(after.currency_code.as_deref(), Some("ATL"));
        assert_eq!(after.estimated_gdp, 99.0);
        assert_eq!(after.flag_url.as_deref(), Some("https://flags.example/wk.svg"));
        assert!(after.last_refreshed_at >= before.last_refreshed_at, "{label}");
    }
}

#[tokio::test]
async fn test_get_by_name_is_case_sensitive() {
    for (label, store) in backends() {
        seed(&store).await;
        assert!(store.get_by_name("France").await.unwrap().is_some(), "{label}");
        assert!(store.get_by_name("france").await.unwrap().is_none(), "{label}");
    }
}

#[tokio::test]
async fn test_query_without_filter_returns_insertion_order() {
    for (label, store) in backends() {
        seed(&store).await;
        let rows = store.query(&CountryFilter::default(), None).await.unwrap();
        assert_eq!(
            names(&rows),
            ["France", "Germany", "Norway", "Kenya", "Nowhere"],
            "{label}"
        );
    }
}

#[tokio::test]
async fn test_query_filters_are_conjunctive() {
    for (label, store) in backends() {
        seed(&store).await;

        let filter = CountryFilter {
            region: Some("Europe".into()),
            currency: Some("EUR".into()),
        };
        let rows = store.query(&filter, None).await.unwrap();
        assert_eq!(names(&rows), ["France", "Germany"], "{label}");

        let filter = CountryFilter {
            region: Some("Africa".into()),
            currency: Some("EUR".into()),
        };
        assert!(store.query(&filter, None).await.unwrap().is_empty(), "{label}");

        let filter = CountryFilter {
            region: None,
            currency: Some("KES".into()),
        };
        let rows = store.query(&filter, None).await.unwrap();
        assert_eq!(names(&rows), ["Kenya"], "{label}");
    }
}

#[tokio::test]
async fn test_query_filter_is_exact_match() {
    for (label, store) in backends() {
        seed(&store).await;
        let filter = CountryFilter {
            region: Some("europe".into()),
            currency: None,
        };
        assert!(store.query(&filter, None).await.unwrap().is_empty(), "{label}");
    }
}

#[tokio::test]
async fn test_query_sorted_by_gdp_desc() {
    for (label, store) in backends() {
        seed(&store).await;
        let rows = store
            .query(&CountryFilter::default(), Some(SortOrder::GdpDesc))
            .await
            .unwrap();
        assert_eq!(
            names(&rows),
            ["Germany", "France", "Kenya", "Norway", "Nowhere"],
            "{label}"
        );
        assert!(
            rows.windows(2)
                .all(|w| w[0].estimated_gdp >= w[1].estimated_gdp),
            "{label}"
        );
    }
}

#[tokio::test]
async fn test_top_by_gdp_limits_rows() {
    for (label, store) in backends() {
        seed(&store).await;
        let rows = store.top_by_gdp(2).await.unwrap();
        assert_eq!(names(&rows), ["Germany", "France"], "{label}");
    }
}

#[tokio::test]
async fn test_delete_by_name() {
    for (label, store) in backends() {
        seed(&store).await;
        assert!(store.delete_by_name("Kenya").await.unwrap(), "{label}");
        assert!(!store.delete_by_name("Kenya").await.unwrap(), "{label}");
        assert!(store.get_by_name("Kenya").await.unwrap().is_none(), "{label}");
        assert_eq!(store.count().await.unwrap(), 4, "{label}");
    }
}

#[tokio::test]
async fn test_deleted_name_gets_fresh_id_on_reinsert() {
    for (label, store) in backends() {
        let first = store
            .upsert(&fields("Kenya", "Africa", Some("KES"), 1.0))
            .await
            .unwrap();
        store.delete_by_name("Kenya").await.unwrap();
        let second = store
            .upsert(&fields("Kenya", "Africa", Some("KES"), 1.0))
            .await
            .unwrap();
        assert!(second.created, "{label}");
        assert_ne!(second.id, first.id, "{label}");
    }
}

#[tokio::test]
async fn test_status_starts_empty_and_records_refresh() {
    for (label, store) in backends() {
        assert_eq!(store.status().await.unwrap().last_refreshed_at, None, "{label}");

        let at = Utc.with_ymd_and_hms(2025, 10, 22, 8, 30, 0).unwrap();
        store.set_last_refreshed(at).await.unwrap();
        assert_eq!(store.status().await.unwrap().last_refreshed_at, Some(at), "{label}");

        let later = Utc.with_ymd_and_hms(2025, 10, 23, 9, 0, 0).unwrap();
        store.set_last_refreshed(later).await.unwrap();
        assert_eq!(
            store.status().await.unwrap().last_refreshed_at,
            Some(later),
            "{label}"
        );
    }
}

#[tokio::test]
async fn test_sqlite_file_persists_across_reopen() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("nested").join("countries.db");
    let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();

    {
        let store = CountryStore::file(&db_path).unwrap();
        store
            .upsert(&fields("Ghana", "Africa", Some("GHS"), 7.5))
            .await
            .unwrap();
        store.set_last_refreshed(at).await.unwrap();
    }

    let store = CountryStore::file(&db_path).unwrap();
    let ghana = store.get_by_name("Ghana").await.unwrap().unwrap();
    assert_eq!(ghana.exchange_rate, Some(1.5));
    assert_eq!(ghana.estimated_gdp, 7.5);
    assert_eq!(store.status().await.unwrap().last_refreshed_at, Some(at));
}

#[tokio::test]
async fn test_memory_backend_insert_rejects_duplicate_name() {
    let backend = MemoryBackend::new();
    backend
        .insert(&fields("Chad", "Africa", None, 0.0))
        .await
        .unwrap();
    assert!(backend.insert(&fields("Chad", "Africa", None, 0.0)).await.is_err());
    assert_eq!(backend.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_sqlite_backend_insert_rejects_duplicate_name() {
    let backend = SqliteBackend::open_in_memory().unwrap();
    backend
        .insert(&fields("Chad", "Africa", None, 0.0))
        .await
        .unwrap();
    assert!(backend.insert(&fields("Chad", "Africa", None, 0.0)).await.is_err());
}

#[tokio::test]
async fn test_update_missing_id_reports_false() {
    let sqlite = SqliteBackend::open_in_memory().unwrap();
    let memory = MemoryBackend::new();
    let backends: [(&str, &dyn CountryBackend); 2] = [("sqlite", &sqlite), ("memory", &memory)];

    for (label, backend) in backends {
        let id = backend
            .insert(&fields("Chad", "Africa", None, 0.0))
            .await
            .unwrap();
        assert!(backend.delete_by_name("Chad").await.unwrap(), "{label}");

        let updated = backend
            .update(id, &fields("Chad", "Africa", None, 1.0))
            .await
            .unwrap();
        assert!(!updated, "{label}");
        assert_eq!(backend.count().await.unwrap(), 0, "{label}");
    }
}

/// Serves a lookup result for a row that has already been deleted.
struct StaleLookup {
    inner: MemoryBackend,
    stale: CountryRecord,
}

#[async_trait::async_trait]
impl CountryBackend for StaleLookup {
    async fn find_by_name(&self, _name: &str) -> anyhow::Result<Option<CountryRecord>> {
        Ok(Some(self.stale.clone()))
    }

    async fn insert(&self, fields: &CountryFields) -> anyhow::Result<i64> {
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

    async fn set_last_refreshed(&self, at: chrono::DateTime<Utc>) -> anyhow::Result<()> {
        self.inner.set_last_refreshed(at).await
    }
}

#[tokio::test]
async fn test_upsert_reinserts_row_deleted_after_lookup() {
    let stale = fields("Chad", "Africa", None, 0.0).into_record(999, Utc::now());
    let store = CountryStore::custom(StaleLookup {
        inner: MemoryBackend::new(),
        stale,
    });

    let outcome = store
        .upsert(&fields("Chad", "Africa", None, 3.0))
        .await
        .unwrap();
    assert!(outcome.created);
    assert_ne!(outcome.id, 999);
    assert_eq!(store.count().await.unwrap(), 1);
}
