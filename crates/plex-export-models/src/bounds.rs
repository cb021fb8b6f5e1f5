use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

/// Coarse date-only token: `YYYY-MM-DD`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Fine date-plus-time token: `YYYY-MM-DD-HH-MM`.
pub const STAMP_FORMAT: &str = "%Y-%m-%d-%H-%M";

/// An inclusive date-range bound that may carry minute precision.
///
/// Export filenames, checkpoints, config values and CLI flags all use one of
/// the two token formats; parsing tries the fine format first so a stamp is
/// never truncated to its date part by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Day(NaiveDate),
    Minute(NaiveDateTime),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBoundError(pub String);

impl fmt::Display for ParseBoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized date token '{}' (expected YYYY-MM-DD or YYYY-MM-DD-HH-MM)", self.0)
    }
}

impl std::error::Error for ParseBoundError {}

impl FromStr for DateBound {
    type Err = ParseBoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, STAMP_FORMAT) {
            return Ok(DateBound::Minute(dt));
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
            return Ok(DateBound::Day(d));
        }
        Err(ParseBoundError(s.to_string()))
    }
}

impl From<NaiveDate> for DateBound {
    fn from(d: NaiveDate) -> Self {
        DateBound::Day(d)
    }
}

impl From<NaiveDateTime> for DateBound {
    fn from(dt: NaiveDateTime) -> Self {
        DateBound::Minute(dt)
    }
}

impl DateBound {
    pub fn date(&self) -> NaiveDate {
        match self {
            DateBound::Day(d) => *d,
            DateBound::Minute(dt) => dt.date(),
        }
    }

    pub fn datetime(&self) -> NaiveDateTime {
        match self {
            DateBound::Day(d) => d.and_hms_opt(0, 0, 0).expect("midnight is valid"),
            DateBound::Minute(dt) => *dt,
        }
    }

    /// Format back to the token shape the bound was parsed from.
    pub fn token(&self) -> String {
        match self {
            DateBound::Day(d) => d.format(DATE_FORMAT).to_string(),
            DateBound::Minute(dt) => dt.format(STAMP_FORMAT).to_string(),
        }
    }
}

/// Date-precision range check used for already-normalized records.
///
/// A minute-precision `from` bound degrades to its date so that date-only
/// records on the boundary day stay included; downstream dedup makes the
/// overlap idempotent.
pub fn within_bounds(date: NaiveDate, from: Option<&DateBound>, to: Option<&DateBound>) -> bool {
    if let Some(from) = from {
        if date < from.date() {
            return false;
        }
    }
    if let Some(to) = to {
        if date > to.date() {
            return false;
        }
    }
    true
}

/// Datetime-precision range check used on freshly fetched rows, where the
/// watch timestamp still carries time of day. The `to` bound stays at date
/// precision to match the date-only convention of export filters.
pub fn within_bounds_at(at: NaiveDateTime, from: Option<&DateBound>, to: Option<&DateBound>) -> bool {
    if let Some(from) = from {
        let included = match from {
            DateBound::Minute(dt) => at >= *dt,
            DateBound::Day(d) => at.date() >= *d,
        };
        if !included {
            return false;
        }
    }
    if let Some(to) = to {
        if at.date() > to.date() {
            return false;
        }
    }
    true
}
