//! Country data cache.
//!
//! Pulls country metadata and USD exchange rates from two public APIs,
//! derives an estimated GDP per country, and serves the cached result over
//! HTTP together with a generated summary image.

pub mod config;
pub mod constants;
pub mod estimator;
pub mod http;
pub mod refresh;
pub mod sources;
pub mod store;
pub mod summary;
