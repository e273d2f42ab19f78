//! Decimal (metric) time: a day of 10 hours, each of 100 minutes of 100 seconds.

use super::TimeSample;
use crate::error::FieldError;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Length of one decimal second, in standard seconds.
pub const CONVERSION_RATIO: f64 = SECONDS_PER_DAY / 100_000.0;

/// A time of day on the decimal clock.
///
/// Each field carries the fraction accumulated from the finer units, so
/// `hours` is in `[0, 10)` and `minutes`/`seconds` are in `[0, 100)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecimalTime {
    pub hours: f64,
    pub minutes: f64,
    pub seconds: f64,
}

impl DecimalTime {
    /// Builds a decimal time from the fraction of the day elapsed, in `[0, 1)`.
    pub fn from_day_fraction(fraction: f64) -> Self {
        let fraction = fraction.rem_euclid(1.0);
        Self {
            hours: fraction * 10.0,
            minutes: (fraction * 1_000.0).rem_euclid(100.0),
            seconds: (fraction * 100_000.0).rem_euclid(100.0),
        }
    }
}

/// Converts a standard sample into decimal time.
pub trait DecimalTimeConverter: Send + Sync {
    fn convert(&self, sample: &TimeSample) -> Result<DecimalTime, FieldError>;
}

/// Maps the elapsed fraction of the standard day onto the decimal day.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricDayConverter;

impl DecimalTimeConverter for MetricDayConverter {
    fn convert(&self, sample: &TimeSample) -> Result<DecimalTime, FieldError> {
        let seconds = f64::from(
            sample.require_hour()? * 3_600
                + sample.require_minute()? * 60
                + sample.require_second()?,
        ) + f64::from(sample.require_nanosecond()?) / 1e9;
        Ok(DecimalTime::from_day_fraction(seconds / SECONDS_PER_DAY))
    }
}

/// Expresses a standard interval in decimal seconds.
pub fn to_decimal_interval(seconds: f64) -> f64 {
    seconds / CONVERSION_RATIO
}
