//! Maps symbolic precision levels to sampling intervals and back.
//!
//! The preset intervals are NTSC-derived frame durations. They are kept to the
//! full stored precision so an interval read back from the emitter resolves to
//! the same preset.

use crate::error::ClockError;
use serde::Deserialize;
use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

/// One update per second.
pub const LOW_INTERVAL: f64 = 1.0;
/// 23.976 updates per second.
pub const MEDIUM_INTERVAL: f64 = 0.04170837504;
/// 29.97 updates per second.
pub const HIGH_INTERVAL: f64 = 0.03336670003;
/// 59.94 updates per second.
pub const VERY_HIGH_INTERVAL: f64 = 0.01668335002;

/// Default epsilon, in seconds, used when matching an interval to a preset.
pub const DEFAULT_INTERVAL_TOLERANCE: f64 = 1e-6;

/// How often the clock is sampled.
///
/// Levels compare by their interval: a smaller interval is a higher precision,
/// so `Low < Medium < High < VeryHigh`. A `Custom` level equal in interval to a
/// preset compares equal to it.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecisionLevel {
    #[default]
    Low,
    Medium,
    High,
    #[serde(alias = "very_high")]
    VeryHigh,
    /// A user-defined interval in seconds.
    Custom(f64),
}

impl PrecisionLevel {
    /// The presets, coarsest first, as offered in a selection list.
    pub const PRESETS: [PrecisionLevel; 4] = [
        PrecisionLevel::Low,
        PrecisionLevel::Medium,
        PrecisionLevel::High,
        PrecisionLevel::VeryHigh,
    ];

    /// The sampling interval in seconds.
    pub fn interval(self) -> f64 {
        match self {
            PrecisionLevel::Low => LOW_INTERVAL,
            PrecisionLevel::Medium => MEDIUM_INTERVAL,
            PrecisionLevel::High => HIGH_INTERVAL,
            PrecisionLevel::VeryHigh => VERY_HIGH_INTERVAL,
            PrecisionLevel::Custom(seconds) => seconds,
        }
    }

    /// The sampling interval as a `Duration`, rejecting non-positive or non-finite values.
    pub fn duration(self) -> Result<Duration, ClockError> {
        interval_duration(self.interval())
    }

    /// Whole updates per second, truncated (a 1.0s interval is 1, Medium is 23).
    pub fn updates_per_second(self) -> u32 {
        (1.0 / self.interval()) as u32
    }

    pub fn is_custom(self) -> bool {
        matches!(self, PrecisionLevel::Custom(_))
    }
}

impl PartialEq for PrecisionLevel {
    fn eq(&self, other: &Self) -> bool {
        self.interval() == other.interval()
    }
}

impl PartialOrd for PrecisionLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        other.interval().partial_cmp(&self.interval())
    }
}

impl fmt::Display for PrecisionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrecisionLevel::Low => write!(f, "Low"),
            PrecisionLevel::Medium => write!(f, "Medium"),
            PrecisionLevel::High => write!(f, "High"),
            PrecisionLevel::VeryHigh => write!(f, "Very High"),
            PrecisionLevel::Custom(seconds) => write!(f, "Custom ({seconds}s)"),
        }
    }
}

/// Analog display options that can demand a finer sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// The tick-tock pendulum is visible.
    pub tick_tock: bool,
    /// The AM/PM period indicator is visible.
    pub period: bool,
}

impl DisplayOptions {
    /// The coarsest precision these options tolerate, if they constrain it at all.
    ///
    /// A pendulum sampled once per second jumps instead of swinging, so it
    /// needs at least `Medium`.
    pub fn minimum_precision(self) -> Option<PrecisionLevel> {
        self.tick_tock.then_some(PrecisionLevel::Medium)
    }
}

/// Converts an interval in seconds into a `Duration`, rejecting anything that
/// is not a positive, finite, representable number of seconds.
pub fn interval_duration(seconds: f64) -> Result<Duration, ClockError> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(ClockError::InvalidInterval { seconds });
    }
    match Duration::try_from_secs_f64(seconds) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        _ => Err(ClockError::InvalidInterval { seconds }),
    }
}

/// Resolves precision levels to intervals and intervals back to levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionPolicy {
    tolerance: f64,
}

impl PrecisionPolicy {
    /// Creates a policy that matches presets within `tolerance` seconds.
    pub fn new(tolerance: f64) -> Result<Self, ClockError> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ClockError::InvalidTolerance { tolerance });
        }
        Ok(Self { tolerance })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn resolve_interval(&self, level: PrecisionLevel) -> f64 {
        level.interval()
    }

    /// Finds the preset nearest to `seconds` within the tolerance, or falls
    /// back to `Custom(seconds)`.
    pub fn precision_from_interval(&self, seconds: f64) -> PrecisionLevel {
        PrecisionLevel::PRESETS
            .iter()
            .copied()
            .map(|preset| (preset, (preset.interval() - seconds).abs()))
            .filter(|(_, distance)| *distance <= self.tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(preset, _)| preset)
            .unwrap_or(PrecisionLevel::Custom(seconds))
    }

    /// The precision actually used once display options are accounted for.
    pub fn effective_precision(
        &self,
        requested: PrecisionLevel,
        options: DisplayOptions,
    ) -> PrecisionLevel {
        match options.minimum_precision() {
            Some(minimum) if requested < minimum => minimum,
            _ => requested,
        }
    }
}

impl Default for PrecisionPolicy {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_INTERVAL_TOLERANCE,
        }
    }
}
