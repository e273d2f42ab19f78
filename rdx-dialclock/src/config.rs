//! Defines the configuration structure for the Dialclock engine.
//!
//! The struct is designed to be deserialized from a TOML file with the
//! `config` crate, so a host can hand its stored settings to the engine
//! without building every value by hand.

use crate::common::RotationUnit;
use crate::error::ClockError;
use crate::precision::{DisplayOptions, PrecisionLevel, PrecisionPolicy, DEFAULT_INTERVAL_TOLERANCE};
use crate::rotation::{ClockBase, HandSpec};
use crate::time::{SystemTimeSource, TimeSource};
use chrono_tz::Tz;
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// The top-level configuration for a `TimeEmitter`.
#[derive(Debug, Clone, Deserialize)]
pub struct DialclockConfig {
    /// The requested sampling precision.
    #[serde(default)]
    pub precision: PrecisionLevel,

    /// The clock system used for the standard hand set.
    #[serde(default)]
    pub clock_base: ClockBase,

    /// The unit angles are published in.
    #[serde(default)]
    pub rotation_unit: RotationUnit,

    /// An explicit list of hands to compute. When absent, the standard set for
    /// `clock_base` and `display` is used.
    #[serde(default)]
    pub hands: Option<Vec<HandSpec>>,

    /// Analog display toggles that can raise the effective precision.
    #[serde(default)]
    pub display: DisplayOptions,

    /// The IANA zone to sample in (e.g. "America/New_York"). Defaults to the
    /// system's local zone.
    #[serde(default)]
    pub timezone: Option<Tz>,

    /// How far, in seconds, an interval may be from a preset and still resolve to it.
    #[serde(default = "default_interval_tolerance")]
    pub interval_tolerance: f64,
}

impl DialclockConfig {
    /// Loads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClockError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates TOML configuration text.
    pub fn from_toml_str(text: &str) -> Result<Self, ClockError> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects a non-positive custom interval or a bad tolerance.
    pub fn validate(&self) -> Result<(), ClockError> {
        self.precision.duration()?;
        PrecisionPolicy::new(self.interval_tolerance)?;
        Ok(())
    }

    pub fn policy(&self) -> Result<PrecisionPolicy, ClockError> {
        PrecisionPolicy::new(self.interval_tolerance)
    }

    /// The system clock, in the configured zone.
    pub fn time_source(&self) -> Arc<dyn TimeSource> {
        match self.timezone {
            Some(zone) => Arc::new(SystemTimeSource::in_zone(zone)),
            None => Arc::new(SystemTimeSource::local()),
        }
    }
}

impl Default for DialclockConfig {
    fn default() -> Self {
        Self {
            precision: PrecisionLevel::Low,
            clock_base: ClockBase::TwelveHour,
            rotation_unit: RotationUnit::Degrees,
            hands: None,
            display: DisplayOptions::default(),
            timezone: None,
            interval_tolerance: default_interval_tolerance(),
        }
    }
}

// --- Default value functions for serde ---

fn default_interval_tolerance() -> f64 {
    DEFAULT_INTERVAL_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::DialBase;

    #[test]
    fn empty_file_uses_defaults() {
        let config = DialclockConfig::from_toml_str("").unwrap();
        assert!(matches!(config.precision, PrecisionLevel::Low));
        assert_eq!(config.clock_base, ClockBase::TwelveHour);
        assert_eq!(config.rotation_unit, RotationUnit::Degrees);
        assert!(config.hands.is_none());
        assert!(config.timezone.is_none());
        assert_eq!(config.interval_tolerance, DEFAULT_INTERVAL_TOLERANCE);
    }

    #[test]
    fn parses_a_full_file() {
        let text = r#"
            precision = "veryhigh"
            clock_base = "twenty_four_hour"
            rotation_unit = "radians"
            timezone = "Europe/Paris"
            interval_tolerance = 0.001
            hands = ["period", "tick_tock_pendulum"]

            [display]
            tick_tock = true
        "#;
        let config = DialclockConfig::from_toml_str(text).unwrap();
        assert!(matches!(config.precision, PrecisionLevel::VeryHigh));
        assert_eq!(config.clock_base, ClockBase::TwentyFourHour);
        assert_eq!(config.rotation_unit, RotationUnit::Radians);
        assert_eq!(config.timezone, Some(chrono_tz::Europe::Paris));
        assert_eq!(
            config.hands,
            Some(vec![HandSpec::Period, HandSpec::TickTockPendulum])
        );
        assert!(config.display.tick_tock);
        assert!(!config.display.period);
    }

    #[test]
    fn parses_tagged_variants() {
        let text = r#"
            precision = { custom = 0.5 }
            hands = [
                { hour = "decimal" },
                { minute = "standard" },
                { second = { base = "decimal", precise = true } },
            ]
        "#;
        let config = DialclockConfig::from_toml_str(text).unwrap();
        assert_eq!(config.precision.interval(), 0.5);
        assert_eq!(
            config.hands,
            Some(vec![
                HandSpec::Hour(ClockBase::Decimal),
                HandSpec::Minute(DialBase::Standard),
                HandSpec::Second {
                    base: DialBase::Decimal,
                    precise: true
                },
            ])
        );
    }

    #[test]
    fn rejects_non_positive_custom_interval() {
        let err = DialclockConfig::from_toml_str("precision = { custom = -1.0 }").unwrap_err();
        assert!(matches!(err, ClockError::InvalidInterval { .. }));
    }

    #[test]
    fn rejects_negative_tolerance() {
        let err = DialclockConfig::from_toml_str("interval_tolerance = -0.5").unwrap_err();
        assert!(matches!(err, ClockError::InvalidTolerance { .. }));
    }

    #[test]
    fn unknown_timezone_is_a_config_error() {
        let err = DialclockConfig::from_toml_str(r#"timezone = "Mars/Olympus""#).unwrap_err();
        assert!(matches!(err, ClockError::Config(_)));
    }
}
