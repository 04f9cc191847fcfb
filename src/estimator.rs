//! Estimated GDP derivation.
//!
//! The estimate is a synthetic figure: population scaled by a random
//! multiplier in `[1000, 2000]`, converted out of the local currency with the
//! USD exchange rate. The multiplier is drawn through [`MultiplierSource`] so
//! callers can pin it for reproducible results.

use rand::Rng;

use crate::constants::{GDP_MULTIPLIER_MAX, GDP_MULTIPLIER_MIN};
use crate::sources::RateTable;

/// Supplies the GDP multiplier, one draw per country.
pub trait MultiplierSource: Send + Sync + 'static {
    /// Returns a value in `[GDP_MULTIPLIER_MIN, GDP_MULTIPLIER_MAX]`.
    fn draw(&self) -> u32;
}

/// Uniform draw from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomMultiplier;

impl MultiplierSource for RandomMultiplier {
    fn draw(&self) -> u32 {
        rand::thread_rng().gen_range(GDP_MULTIPLIER_MIN..=GDP_MULTIPLIER_MAX)
    }
}

/// Always returns the same multiplier, clamped into the valid range.
#[derive(Debug, Clone, Copy)]
pub struct FixedMultiplier(u32);

impl FixedMultiplier {
    pub fn new(multiplier: u32) -> Self {
        Self(multiplier.clamp(GDP_MULTIPLIER_MIN, GDP_MULTIPLIER_MAX))
    }
}

impl MultiplierSource for FixedMultiplier {
    fn draw(&self) -> u32 {
        self.0
    }
}

/// Rate resolved for a country and the GDP derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Rate found for the currency, even when it is unusable (`<= 0`).
    pub exchange_rate: Option<f64>,
    /// Always `>= 0`.
    pub estimated_gdp: f64,
}

impl Estimate {
    const NONE: Self = Self {
        exchange_rate: None,
        estimated_gdp: 0.0,
    };
}

/// Estimates GDP for one country.
///
/// Returns a zero GDP when the currency is missing, unknown, or has a
/// non-positive rate. The multiplier is only drawn when a GDP is produced.
/// Non-positive populations yield zero.
pub fn estimate(
    population: i64,
    currency_code: Option<&str>,
    rates: &RateTable,
    multiplier: &dyn MultiplierSource,
) -> Estimate {
    let Some(code) = currency_code else {
        return Estimate::NONE;
    };
    let Some(&rate) = rates.get(code) else {
        return Estimate::NONE;
    };

    if !(rate.is_finite() && rate > 0.0) {
        return Estimate {
            exchange_rate: Some(rate),
            estimated_gdp: 0.0,
        };
    }

    let gdp = population as f64 * f64::from(multiplier.draw()) / rate;
    Estimate {
        exchange_rate: Some(rate),
        estimated_gdp: gdp.max(0.0),
    }
}
