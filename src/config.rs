//! Service configuration.
//!
//! Every setting can be given as a flag or through the environment. The
//! binary loads a `.env` file first, so local overrides work without
//! exporting anything.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::constants::{
    DEFAULT_CACHE_DIR, DEFAULT_COUNTRIES_URL, DEFAULT_DATA_DIR, DEFAULT_DB_NAME,
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_RATES_URL,
};

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "country-cache")]
#[command(about = "Caches country metadata with USD exchange rates and estimated GDP")]
pub struct Config {
    /// Listen port
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Database name; the SQLite file is `<data-dir>/<db-name>.db`
    #[arg(long, env = "DB_NAME", default_value = DEFAULT_DB_NAME)]
    pub db_name: String,

    /// Accepted for compatibility with server databases; unused by SQLite
    #[arg(long, env = "DB_HOST")]
    pub db_host: Option<String>,

    /// Accepted for compatibility with server databases; unused by SQLite
    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    /// Accepted for compatibility with server databases; unused by SQLite
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Directory holding the database file
    #[arg(long, env = "DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Directory holding the summary image
    #[arg(long, env = "CACHE_DIR", default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    /// Country metadata endpoint
    #[arg(long, env = "COUNTRIES_URL", default_value = DEFAULT_COUNTRIES_URL)]
    pub countries_url: String,

    /// Exchange rate endpoint (USD base)
    #[arg(long, env = "RATES_URL", default_value = DEFAULT_RATES_URL)]
    pub rates_url: String,

    /// Timeout for each upstream request, in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout_secs: u64,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    /// Path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.db", self.db_name))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Server database settings that were supplied but have no effect.
    pub fn ignored_db_settings(&self) -> Vec<&'static str> {
        [
            ("DB_HOST", self.db_host.is_some()),
            ("DB_USER", self.db_user.is_some()),
            ("DB_PASSWORD", self.db_password.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }

    /// Validates the configuration.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails with one or more errors:
    /// - Port 0
    /// - Zero fetch timeout
    /// - Empty database name or one containing a path separator
    /// - Upstream URLs that do not parse
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.port == 0 {
            errors.push("port must be between 1 and 65535".to_string());
        } else if self.port < 1024 {
            warnings.push(format!(
                "port {} is privileged and may require elevated permissions",
                self.port
            ));
        }

        if self.fetch_timeout_secs == 0 {
            errors.push("fetch timeout must be at least 1 second".to_string());
        }

        if self.db_name.trim().is_empty() {
            errors.push("database name cannot be empty".to_string());
        } else if self.db_name.contains(['/', '\\']) {
            errors.push(format!(
                "database name '{}' must not contain path separators",
                self.db_name
            ));
        }

        for (label, value) in [
            ("countries URL", &self.countries_url),
            ("rates URL", &self.rates_url),
        ] {
            if let Err(e) = url::Url::parse(value) {
                errors.push(format!("{label} '{value}' is invalid: {e}"));
            }
        }

        let ignored = self.ignored_db_settings();
        if !ignored.is_empty() {
            warnings.push(format!(
                "{} set but ignored by the embedded SQLite store",
                ignored.join(", ")
            ));
        }

        // Return errors if any
        if !errors.is_empty() {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }

        Ok(ValidationResult { warnings })
    }
}
