//! Pass-through text accessors the presentation layer formats verbatim.

use super::{Period, TickTock, TimeSample};

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];
const WEEKDAY_NAMES_SHORT: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const MONTH_NAMES_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Pads a time unit to two digits (1 to "01").
fn pad(unit: u32) -> String {
    format!("{unit:02}")
}

/// Looks up a one-based index in a name table.
fn lookup(table: &'static [&'static str], one_based: Option<u32>) -> Option<&'static str> {
    let index = usize::try_from(one_based?.checked_sub(1)?).ok()?;
    table.get(index).copied()
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Am => "AM",
            Period::Pm => "PM",
        }
    }
}

impl TickTock {
    pub fn as_str(self) -> &'static str {
        match self {
            TickTock::Tick => "tick",
            TickTock::Tock => "tock",
        }
    }
}

impl TimeSample {
    /// The 12-hour dial hour, unpadded.
    pub fn hour12_string(&self) -> Option<String> {
        self.hour12().map(|hour| hour.to_string())
    }

    pub fn hour24_string(&self) -> Option<String> {
        self.hour.map(pad)
    }

    pub fn padded_minute(&self) -> Option<String> {
        self.minute.map(pad)
    }

    pub fn padded_second(&self) -> Option<String> {
        self.second.map(pad)
    }

    /// The precise second rounded to the nearest whole second, padded.
    /// Never reads "60": the minute field has not carried yet.
    pub fn padded_precise_second(&self) -> Option<String> {
        self.precise_second()
            .map(|precise| pad(precise.round().min(59.0) as u32))
    }

    pub fn period_string(&self) -> Option<&'static str> {
        self.period().map(Period::as_str)
    }

    pub fn tick_tock_string(&self) -> Option<&'static str> {
        self.tick_tock().map(TickTock::as_str)
    }

    pub fn weekday_name(&self) -> Option<&'static str> {
        lookup(&WEEKDAY_NAMES, self.weekday)
    }

    pub fn weekday_name_short(&self) -> Option<&'static str> {
        lookup(&WEEKDAY_NAMES_SHORT, self.weekday)
    }

    pub fn month_name(&self) -> Option<&'static str> {
        lookup(&MONTH_NAMES, self.month)
    }

    pub fn month_name_short(&self) -> Option<&'static str> {
        lookup(&MONTH_NAMES_SHORT, self.month)
    }

    /// A long-form date such as "Saturday, March 9, 2024".
    ///
    /// The weekday prefix is dropped when the weekday is unknown; the date
    /// itself requires year, month and day.
    pub fn date_string(&self) -> Option<String> {
        let date = format!("{} {}, {}", self.month_name()?, self.day?, self.year?);
        Some(match self.weekday_name() {
            Some(weekday) => format!("{weekday}, {date}"),
            None => date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TimeSample {
        TimeSample {
            year: Some(2024),
            month: Some(3),
            day: Some(9),
            weekday: Some(7),
            hour: Some(15),
            minute: Some(4),
            second: Some(7),
            nanosecond: Some(600_000_000),
        }
    }

    #[test]
    fn pads_time_units() {
        let s = sample();
        assert_eq!(s.hour12_string().as_deref(), Some("3"));
        assert_eq!(s.hour24_string().as_deref(), Some("15"));
        assert_eq!(s.padded_minute().as_deref(), Some("04"));
        assert_eq!(s.padded_second().as_deref(), Some("07"));
        assert_eq!(s.padded_precise_second().as_deref(), Some("08"));
    }

    #[test]
    fn rounded_second_stays_within_the_minute() {
        let s = TimeSample {
            second: Some(59),
            nanosecond: Some(600_000_000),
            ..sample()
        };
        assert_eq!(s.padded_precise_second().as_deref(), Some("59"));
        assert_eq!(s.padded_second().as_deref(), Some("59"));
    }

    #[test]
    fn names_and_dates() {
        let s = sample();
        assert_eq!(s.weekday_name(), Some("Saturday"));
        assert_eq!(s.weekday_name_short(), Some("Sat"));
        assert_eq!(s.month_name(), Some("March"));
        assert_eq!(s.month_name_short(), Some("Mar"));
        assert_eq!(s.period_string(), Some("PM"));
        assert_eq!(s.tick_tock_string(), Some("tock"));
        assert_eq!(s.date_string().as_deref(), Some("Saturday, March 9, 2024"));
    }

    #[test]
    fn out_of_range_indices_are_absent() {
        let s = TimeSample {
            month: Some(13),
            weekday: Some(0),
            ..sample()
        };
        assert_eq!(s.month_name(), None);
        assert_eq!(s.weekday_name(), None);
        assert_eq!(s.date_string(), None);
    }

    #[test]
    fn date_without_weekday() {
        let s = TimeSample {
            weekday: None,
            ..sample()
        };
        assert_eq!(s.date_string().as_deref(), Some("March 9, 2024"));
    }
}
