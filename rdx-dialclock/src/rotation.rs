//! Converts decomposed time into normalized hand rotations.
//!
//! Every angle leaves this module inside `[0, full_circle)`. The three binary
//! or sweeping indicators (`Period`, `TickTock`, `TickTockPendulum`) are not
//! angles; they return values in `[0, 1]` that the presentation layer maps onto
//! its own sweep geometry, and they are the same in either rotation unit.

use crate::common::{RotationUnit, FULL_CIRCLE_DEGREES};
use crate::error::FieldError;
use crate::time::{DecimalTimeConverter, MetricDayConverter, Period, TickTock, TimeSample};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The time system an hour hand is read against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockBase {
    #[default]
    TwelveHour,
    TwentyFourHour,
    Decimal,
}

impl ClockBase {
    /// Hours in one full turn of the hour hand.
    pub fn modulus(self) -> f64 {
        match self {
            ClockBase::TwelveHour => 12.0,
            ClockBase::TwentyFourHour => 24.0,
            ClockBase::Decimal => 10.0,
        }
    }

    /// The dial the minute and second hands use alongside this hour base.
    pub fn dial(self) -> DialBase {
        match self {
            ClockBase::Decimal => DialBase::Decimal,
            ClockBase::TwelveHour | ClockBase::TwentyFourHour => DialBase::Standard,
        }
    }
}

/// The subdivision used by minute and second hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialBase {
    /// 60 units per turn.
    #[default]
    Standard,
    /// 100 units per turn.
    Decimal,
}

impl DialBase {
    pub fn modulus(self) -> f64 {
        match self {
            DialBase::Standard => 60.0,
            DialBase::Decimal => 100.0,
        }
    }
}

/// A rotation the presentation layer asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandSpec {
    Hour(ClockBase),
    Minute(DialBase),
    /// `precise` carries the sub-second remainder instead of stepping whole seconds.
    Second { base: DialBase, precise: bool },
    Period,
    TickTock,
    TickTockPendulum,
}

impl HandSpec {
    /// Returns `true` for the indicators that report a state in `[0, 1]` rather than an angle.
    pub fn is_indicator(self) -> bool {
        matches!(
            self,
            HandSpec::Period | HandSpec::TickTock | HandSpec::TickTockPendulum
        )
    }

    /// The hand set an analog face shows for a clock base and display options.
    pub fn standard_set(
        base: ClockBase,
        precise_seconds: bool,
        period: bool,
        tick_tock: bool,
    ) -> Vec<HandSpec> {
        let mut hands = vec![
            HandSpec::Hour(base),
            HandSpec::Minute(base.dial()),
            HandSpec::Second {
                base: base.dial(),
                precise: precise_seconds,
            },
        ];
        if period {
            hands.push(HandSpec::Period);
        }
        if tick_tock {
            hands.push(HandSpec::TickTock);
            hands.push(HandSpec::TickTockPendulum);
        }
        hands
    }
}

impl fmt::Display for HandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandSpec::Hour(ClockBase::TwelveHour) => write!(f, "hour"),
            HandSpec::Hour(ClockBase::TwentyFourHour) => write!(f, "hour24"),
            HandSpec::Hour(ClockBase::Decimal) => write!(f, "hour (decimal)"),
            HandSpec::Minute(DialBase::Standard) => write!(f, "minute"),
            HandSpec::Minute(DialBase::Decimal) => write!(f, "minute (decimal)"),
            HandSpec::Second { base, precise } => {
                let precise = if *precise { "precise " } else { "" };
                match base {
                    DialBase::Standard => write!(f, "{precise}second"),
                    DialBase::Decimal => write!(f, "{precise}second (decimal)"),
                }
            }
            HandSpec::Period => write!(f, "period"),
            HandSpec::TickTock => write!(f, "tick-tock"),
            HandSpec::TickTockPendulum => write!(f, "pendulum"),
        }
    }
}

/// Folds a raw value into `[0, full_circle)`, including negative values and
/// values that land exactly on the full circle.
pub fn normalize(value: f64, full_circle: f64) -> f64 {
    let wrapped = value.rem_euclid(full_circle);
    // rem_euclid can round a tiny negative value up to the modulus itself.
    if wrapped >= full_circle {
        0.0
    } else {
        wrapped
    }
}

/// `(value / modulus)` of a full turn, in normalized degrees.
fn turn_degrees(value: f64, modulus: f64) -> f64 {
    normalize(value / modulus * FULL_CIRCLE_DEGREES, FULL_CIRCLE_DEGREES)
}

/// One tick's rotations, keyed by the hand they were computed for.
///
/// A hand maps to `None` when the sample lacked a field it needs; the
/// presentation layer keeps showing that hand's previous value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RotationSnapshot {
    rotations: BTreeMap<HandSpec, Option<f64>>,
}

impl RotationSnapshot {
    /// The rotation for `hand`, or `None` if it was not requested or could not be computed.
    pub fn get(&self, hand: HandSpec) -> Option<f64> {
        self.rotations.get(&hand).copied().flatten()
    }

    pub fn contains(&self, hand: HandSpec) -> bool {
        self.rotations.contains_key(&hand)
    }

    pub fn iter(&self) -> impl Iterator<Item = (HandSpec, Option<f64>)> + '_ {
        self.rotations.iter().map(|(hand, value)| (*hand, *value))
    }

    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty()
    }

    /// Hands that were requested but could not be computed this tick.
    pub fn missing(&self) -> impl Iterator<Item = HandSpec> + '_ {
        self.rotations
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(hand, _)| *hand)
    }
}

/// Stateless hand-rotation calculator.
#[derive(Clone)]
pub struct RotationEngine {
    unit: RotationUnit,
    decimal: Arc<dyn DecimalTimeConverter>,
}

impl RotationEngine {
    pub fn new(unit: RotationUnit) -> Self {
        Self::with_decimal_converter(unit, Arc::new(MetricDayConverter))
    }

    /// Uses a custom decimal-time conversion for `Decimal` hands.
    pub fn with_decimal_converter(
        unit: RotationUnit,
        decimal: Arc<dyn DecimalTimeConverter>,
    ) -> Self {
        Self { unit, decimal }
    }

    pub fn unit(&self) -> RotationUnit {
        self.unit
    }

    /// Same converter, different output unit.
    pub fn with_unit(&self, unit: RotationUnit) -> Self {
        Self {
            unit,
            decimal: Arc::clone(&self.decimal),
        }
    }

    /// The rotation for one hand, or `None` if the sample lacks a field it needs.
    pub fn rotate(&self, sample: &TimeSample, hand: HandSpec) -> Option<f64> {
        self.try_rotate(sample, hand).ok()
    }

    /// Like `rotate`, reporting which field was missing.
    pub fn try_rotate(&self, sample: &TimeSample, hand: HandSpec) -> Result<f64, FieldError> {
        let degrees = match hand {
            HandSpec::Period => return period_state(sample),
            HandSpec::TickTock => return tick_tock_state(sample),
            HandSpec::TickTockPendulum => return pendulum_state(sample),
            HandSpec::Hour(base) => self.hour_degrees(sample, base)?,
            HandSpec::Minute(dial) => self.minute_degrees(sample, dial)?,
            HandSpec::Second { base, precise } => self.second_degrees(sample, base, precise)?,
        };
        Ok(normalize(
            self.unit.from_degrees(degrees),
            self.unit.full_circle(),
        ))
    }

    /// Computes every requested hand. A missing field only voids the hands
    /// that depend on it.
    pub fn snapshot(&self, sample: &TimeSample, hands: &[HandSpec]) -> RotationSnapshot {
        let rotations = hands
            .iter()
            .map(|hand| (*hand, self.rotate(sample, *hand)))
            .collect();
        RotationSnapshot { rotations }
    }

    fn hour_degrees(&self, sample: &TimeSample, base: ClockBase) -> Result<f64, FieldError> {
        let hour = match base {
            ClockBase::Decimal => {
                let decimal = self.decimal.convert(sample)?;
                return Ok(turn_degrees(decimal.hours, base.modulus()));
            }
            ClockBase::TwelveHour => sample.hour12().ok_or(FieldError { field: "hour" })?,
            ClockBase::TwentyFourHour => sample.require_hour()?,
        };
        let minutes = f64::from(sample.require_minute()?) + precise_second(sample)? / 60.0;
        Ok(turn_degrees(f64::from(hour) + minutes / 60.0, base.modulus()))
    }

    fn minute_degrees(&self, sample: &TimeSample, dial: DialBase) -> Result<f64, FieldError> {
        let minutes = match dial {
            DialBase::Standard => {
                f64::from(sample.require_minute()?) + precise_second(sample)? / 60.0
            }
            DialBase::Decimal => self.decimal.convert(sample)?.minutes,
        };
        Ok(turn_degrees(minutes, dial.modulus()))
    }

    fn second_degrees(
        &self,
        sample: &TimeSample,
        dial: DialBase,
        precise: bool,
    ) -> Result<f64, FieldError> {
        let seconds = match (dial, precise) {
            (DialBase::Standard, true) => precise_second(sample)?,
            (DialBase::Standard, false) => f64::from(sample.require_second()?),
            (DialBase::Decimal, true) => self.decimal.convert(sample)?.seconds,
            (DialBase::Decimal, false) => self.decimal.convert(sample)?.seconds.floor(),
        };
        Ok(turn_degrees(seconds, dial.modulus()))
    }

    /// The text a digital readout shows for a hand.
    pub fn text(&self, sample: &TimeSample, hand: HandSpec) -> Option<String> {
        match hand {
            HandSpec::Hour(ClockBase::TwelveHour) => sample.hour12_string(),
            HandSpec::Hour(ClockBase::TwentyFourHour) => sample.hour24_string(),
            HandSpec::Hour(ClockBase::Decimal) => {
                let hours = self.decimal.convert(sample).ok()?.hours;
                Some(format!("{}", hours.floor() as u32))
            }
            HandSpec::Minute(DialBase::Standard) => sample.padded_minute(),
            HandSpec::Minute(DialBase::Decimal) => {
                let minutes = self.decimal.convert(sample).ok()?.minutes;
                Some(format!("{:02}", minutes.floor() as u32))
            }
            HandSpec::Second {
                base: DialBase::Standard,
                precise,
            } => {
                if precise {
                    sample.padded_precise_second()
                } else {
                    sample.padded_second()
                }
            }
            HandSpec::Second {
                base: DialBase::Decimal,
                ..
            } => {
                let seconds = self.decimal.convert(sample).ok()?.seconds;
                Some(format!("{:02}", seconds.floor() as u32))
            }
            HandSpec::Period => sample.period_string().map(str::to_owned),
            HandSpec::TickTock | HandSpec::TickTockPendulum => {
                sample.tick_tock_string().map(str::to_owned)
            }
        }
    }

    pub fn hour(&self, sample: &TimeSample) -> Option<f64> {
        self.rotate(sample, HandSpec::Hour(ClockBase::TwelveHour))
    }

    pub fn hour24(&self, sample: &TimeSample) -> Option<f64> {
        self.rotate(sample, HandSpec::Hour(ClockBase::TwentyFourHour))
    }

    pub fn minute(&self, sample: &TimeSample) -> Option<f64> {
        self.rotate(sample, HandSpec::Minute(DialBase::Standard))
    }

    pub fn second(&self, sample: &TimeSample) -> Option<f64> {
        self.rotate(sample, HandSpec::Second { base: DialBase::Standard, precise: false })
    }

    pub fn precise_second(&self, sample: &TimeSample) -> Option<f64> {
        self.rotate(sample, HandSpec::Second { base: DialBase::Standard, precise: true })
    }

    pub fn period(&self, sample: &TimeSample) -> Option<f64> {
        self.rotate(sample, HandSpec::Period)
    }

    pub fn tick_tock(&self, sample: &TimeSample) -> Option<f64> {
        self.rotate(sample, HandSpec::TickTock)
    }

    pub fn pendulum(&self, sample: &TimeSample) -> Option<f64> {
        self.rotate(sample, HandSpec::TickTockPendulum)
    }

    pub fn hour_decimal(&self, sample: &TimeSample) -> Option<f64> {
        self.rotate(sample, HandSpec::Hour(ClockBase::Decimal))
    }

    pub fn minute_decimal(&self, sample: &TimeSample) -> Option<f64> {
        self.rotate(sample, HandSpec::Minute(DialBase::Decimal))
    }

    pub fn second_decimal(&self, sample: &TimeSample) -> Option<f64> {
        self.rotate(sample, HandSpec::Second { base: DialBase::Decimal, precise: false })
    }

    pub fn precise_second_decimal(&self, sample: &TimeSample) -> Option<f64> {
        self.rotate(sample, HandSpec::Second { base: DialBase::Decimal, precise: true })
    }
}

impl Default for RotationEngine {
    fn default() -> Self {
        Self::new(RotationUnit::Degrees)
    }
}

impl fmt::Debug for RotationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotationEngine")
            .field("unit", &self.unit)
            .finish_non_exhaustive()
    }
}

/// Computes one hand with the default decimal conversion.
pub fn rotate(sample: &TimeSample, hand: HandSpec, unit: RotationUnit) -> Option<f64> {
    RotationEngine::new(unit).rotate(sample, hand)
}

fn precise_second(sample: &TimeSample) -> Result<f64, FieldError> {
    let second = sample.require_second()?;
    let nanos = sample.require_nanosecond()?;
    Ok(f64::from(second) + f64::from(nanos) / 1e9)
}

fn period_state(sample: &TimeSample) -> Result<f64, FieldError> {
    sample.require_hour()?;
    Ok(match sample.period() {
        Some(Period::Pm) => 1.0,
        _ => 0.0,
    })
}

fn tick_tock_state(sample: &TimeSample) -> Result<f64, FieldError> {
    sample.require_second()?;
    Ok(match sample.tick_tock() {
        Some(TickTock::Tock) => 1.0,
        _ => 0.0,
    })
}

/// Rises 0 → 1 across a tick second and falls back 1 → 0 across a tock second.
fn pendulum_state(sample: &TimeSample) -> Result<f64, FieldError> {
    sample.require_second()?;
    let fraction = f64::from(sample.require_nanosecond()?) / 1e9;
    Ok(match sample.tick_tock() {
        Some(TickTock::Tock) => 1.0 - fraction,
        _ => fraction,
    })
}
