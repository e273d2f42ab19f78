//! Captures instants from a clock source and decomposes them into calendar fields.
//!
//! A `TimeSample` is always produced from a single captured instant, so the
//! hour, minute and second it reports can never drift relative to each other.

pub mod decimal;
mod text;

use crate::error::FieldError;
use chrono::{DateTime, Datelike, FixedOffset, Local, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

pub use decimal::{DecimalTime, DecimalTimeConverter, MetricDayConverter};

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// AM/PM indicator on a 12-hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Am,
    Pm,
}

/// Alternating per-second state that drives a pendulum indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickTock {
    Tick,
    Tock,
}

/// An immutable snapshot of one sampled instant.
///
/// Every field is optional. A field is `None` only when the calendar could not
/// resolve it, and anything computed from a missing field is missing too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeSample {
    pub year: Option<i32>,
    /// Month of the year, 1 = January.
    pub month: Option<u32>,
    /// Day of the month, starting at 1.
    pub day: Option<u32>,
    /// Day of the week, 1 = Sunday.
    pub weekday: Option<u32>,
    /// Hour of the day, 0–23.
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
    /// Sub-second remainder, 0–999_999_999.
    pub nanosecond: Option<u32>,
}

impl TimeSample {
    /// Decomposes a zoned instant into a sample.
    ///
    /// A leap second (reported by chrono as a nanosecond value past one
    /// second) is clamped to the last nanosecond of second 59.
    pub fn from_datetime<Z: TimeZone>(instant: &DateTime<Z>) -> Self {
        let nanosecond = instant.nanosecond().min(NANOS_PER_SECOND - 1);
        Self {
            year: Some(instant.year()),
            month: Some(instant.month()),
            day: Some(instant.day()),
            weekday: Some(instant.weekday().number_from_sunday()),
            hour: Some(instant.hour()),
            minute: Some(instant.minute()),
            second: Some(instant.second()),
            nanosecond: Some(nanosecond),
        }
    }

    /// The hour on a 12-hour dial: 0 → 12, 13–23 → hour − 12.
    pub fn hour12(&self) -> Option<u32> {
        self.hour.map(|hour| match hour {
            0 => 12,
            1..=12 => hour,
            _ => hour - 12,
        })
    }

    pub fn period(&self) -> Option<Period> {
        self.hour
            .map(|hour| if hour < 12 { Period::Am } else { Period::Pm })
    }

    pub fn tick_tock(&self) -> Option<TickTock> {
        self.second.map(|second| {
            if second % 2 == 0 {
                TickTock::Tick
            } else {
                TickTock::Tock
            }
        })
    }

    /// The sub-second remainder as a fraction of a second, in `[0, 1)`.
    pub fn fractional_second(&self) -> Option<f64> {
        self.nanosecond
            .map(|nanos| f64::from(nanos) / f64::from(NANOS_PER_SECOND))
    }

    /// The current second including its sub-second remainder.
    pub fn precise_second(&self) -> Option<f64> {
        Some(f64::from(self.second?) + self.fractional_second()?)
    }

    pub fn millisecond(&self) -> Option<u32> {
        self.nanosecond.map(|nanos| nanos / 1_000_000)
    }

    /// Seconds elapsed since local midnight, including the sub-second remainder.
    pub fn seconds_since_midnight(&self) -> Option<f64> {
        let whole = self.hour? * 3_600 + self.minute? * 60 + self.second?;
        Some(f64::from(whole) + self.fractional_second()?)
    }

    /// Returns `true` when every field is present.
    pub fn is_complete(&self) -> bool {
        self.year.is_some()
            && self.month.is_some()
            && self.day.is_some()
            && self.weekday.is_some()
            && self.hour.is_some()
            && self.minute.is_some()
            && self.second.is_some()
            && self.nanosecond.is_some()
    }

    pub(crate) fn require_hour(&self) -> Result<u32, FieldError> {
        self.hour.ok_or(FieldError { field: "hour" })
    }

    pub(crate) fn require_minute(&self) -> Result<u32, FieldError> {
        self.minute.ok_or(FieldError { field: "minute" })
    }

    pub(crate) fn require_second(&self) -> Result<u32, FieldError> {
        self.second.ok_or(FieldError { field: "second" })
    }

    pub(crate) fn require_nanosecond(&self) -> Result<u32, FieldError> {
        self.nanosecond.ok_or(FieldError { field: "nanosecond" })
    }
}

/// A source of wall-clock instants.
///
/// The emitter samples through this trait so hosts and tests can substitute
/// their own notion of "now".
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Reads the operating system clock, either in the local zone or a fixed IANA zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource {
    zone: Option<Tz>,
}

impl SystemTimeSource {
    /// A source that reports time in the system's local zone.
    pub fn local() -> Self {
        Self { zone: None }
    }

    /// A source that reports time in the given zone.
    pub fn in_zone(zone: Tz) -> Self {
        Self { zone: Some(zone) }
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.zone {
            Some(zone) => Utc::now().with_timezone(&zone).fixed_offset(),
            None => Local::now().fixed_offset(),
        }
    }
}

/// A source whose instant only moves when it is told to.
#[derive(Debug)]
pub struct ManualTimeSource {
    current: Mutex<DateTime<FixedOffset>>,
}

impl ManualTimeSource {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<FixedOffset>) {
        *self.current.lock() = instant;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut current = self.current.lock();
        *current += by;
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.current.lock()
    }
}

/// Produces `TimeSample`s from a `TimeSource`.
#[derive(Clone)]
pub struct TimeSampler {
    source: Arc<dyn TimeSource>,
}

impl TimeSampler {
    pub fn new(source: Arc<dyn TimeSource>) -> Self {
        Self { source }
    }

    /// Captures the current instant and decomposes it.
    pub fn sample(&self) -> TimeSample {
        TimeSample::from_datetime(&self.source.now())
    }
}

impl Default for TimeSampler {
    fn default() -> Self {
        Self::new(Arc::new(SystemTimeSource::local()))
    }
}

impl fmt::Debug for TimeSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeSampler").finish_non_exhaustive()
    }
}
