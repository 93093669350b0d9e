//! Time source and per-location time/date formatting

use crate::{location::Location, settings::DateFormat};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Source of the current time, so the ticker can be driven by a fixed clock
/// in tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Rendered time and date for one location
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClockDisplay {
    pub time: String,
    pub date: String,
}

impl ClockDisplay {
    pub const INVALID_TIME: &'static str = "--:--";
    pub const INVALID_DATE: &'static str = "--";

    fn invalid() -> Self {
        Self {
            time: Self::INVALID_TIME.into(),
            date: Self::INVALID_DATE.into(),
        }
    }
}

/// Format the local time and date at a location. If the location's zone isn't
/// a known IANA zone, both fields get placeholders instead.
pub fn compute_display(
    location: &Location,
    now: DateTime<Utc>,
    date_format: DateFormat,
) -> ClockDisplay {
    let Ok(zone) = location.zone.parse::<Tz>() else {
        return ClockDisplay::invalid();
    };
    let local = now.with_timezone(&zone);
    // https://docs.rs/chrono/latest/chrono/format/strftime/index.html
    ClockDisplay {
        time: local.format("%H:%M").to_string(),
        date: local.format(date_pattern(date_format)).to_string(),
    }
}

/// strftime pattern for each date format. These follow US English
/// conventions, except `intl` which is always year-month-day
fn date_pattern(date_format: DateFormat) -> &'static str {
    match date_format {
        DateFormat::Std => "%a, %b %-d",
        DateFormat::Full => "%A, %B %-d",
        DateFormat::Us => "%m/%d/%Y",
        DateFormat::Intl => "%Y-%m-%d",
        DateFormat::Short => "%b %-d",
        DateFormat::Day => "%A",
    }
}

/// Clock frozen at a single instant
#[cfg(test)]
#[derive(Copy, Clone, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
