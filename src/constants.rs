//! Shared constants for the country cache service.

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default database name (SQLite file stem).
pub const DEFAULT_DB_NAME: &str = "countries";

/// Directory holding the SQLite database file.
pub const DEFAULT_DATA_DIR: &str = ".";

/// Country metadata source.
pub const DEFAULT_COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";

/// USD-based exchange rate source.
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

/// Timeout applied to each upstream fetch, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Inclusive bounds of the random GDP multiplier.
pub const GDP_MULTIPLIER_MIN: u32 = 1000;
pub const GDP_MULTIPLIER_MAX: u32 = 2000;

/// Well-known id of the singleton `app_status` row.
pub const STATUS_ROW_ID: i64 = 1;

/// Directory holding the generated summary image.
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// File name of the generated summary image.
pub const SUMMARY_IMAGE_FILE: &str = "summary.png";

/// Number of countries listed in the summary image.
pub const SUMMARY_TOP_N: usize = 5;

/// Summary image dimensions in pixels.
pub const SUMMARY_WIDTH: u32 = 800;
pub const SUMMARY_HEIGHT: u32 = 600;
