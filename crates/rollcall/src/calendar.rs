//! Calendar arithmetic and navigation parameters.
//!
//! Dates travel between commands the way they travelled between the original
//! screens: a month as a two-digit string (`"01"` through `"12"`) and a selected day
//! as an ISO `YYYY-MM-DD` string. Remote rows are timestamp-typed, so a day
//! query normalizes to the full UTC day range before filtering.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::error::{Error, Result};

/// Month names in display order.
pub const MONTH_NAMES: [&str; 12] = [
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

/// Compute the UTC day range `[00:00:00.000, 23:59:59.999]` for a date.
///
/// Any timestamp-typed remote row logically on the day falls inside the
/// returned bounds; rows on the neighboring days fall outside.
#[must_use]
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default());
    let end = Utc.from_utc_datetime(&date.and_hms_milli_opt(23, 59, 59, 999).unwrap_or_default());
    (start, end)
}

/// Parse an ISO `YYYY-MM-DD` navigation parameter.
///
/// # Errors
///
/// Returns an error if the string is not a valid calendar date.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| Error::InvalidParam {
        message: format!("not an ISO date (YYYY-MM-DD): {raw}"),
    })
}

/// A year-month position for month navigation.
///
/// The month is always in 1-12; construction goes through the validating
/// constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    year: i32,
    month: u32,
}

impl MonthCursor {
    /// Calendar year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month of year, 1-12.
    #[must_use]
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Create a cursor, validating the month.
    ///
    /// # Errors
    ///
    /// Returns an error if `month` is outside 1-12.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if (1..=12).contains(&month) {
            Ok(Self { year, month })
        } else {
            Err(Error::InvalidParam {
                message: format!("month out of range: {month}"),
            })
        }
    }

    /// Parse a two-digit month parameter (`"01"` through `"12"`).
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is not a valid month.
    pub fn from_param(year: i32, param: &str) -> Result<Self> {
        let month: u32 = param.parse().map_err(|_| Error::InvalidParam {
            message: format!("not a month parameter: {param}"),
        })?;
        Self::new(year, month)
    }

    /// The two-digit navigation parameter for this month.
    #[must_use]
    pub fn param(&self) -> String {
        format!("{:02}", self.month)
    }

    /// Advance one month, rolling the year forward past December.
    #[must_use]
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Go back one month, rolling the year backward past January.
    #[must_use]
    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Display name, e.g. `"May 2024"`.
    #[must_use]
    pub fn label(&self) -> String {
        let name = MONTH_NAMES[(self.month - 1) as usize];
        format!("{name} {}", self.year)
    }

    /// First day of the month.
    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }
}

impl std::fmt::Display for MonthCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Split the twelve months into two display columns by index parity.
///
/// Returns (name, two-digit param) pairs: even indices in the left column,
/// odd indices in the right.
#[must_use]
pub fn month_columns() -> (Vec<(&'static str, String)>, Vec<(&'static str, String)>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for (index, name) in MONTH_NAMES.iter().enumerate() {
        let entry = (*name, format!("{:02}", index + 1));
        if index % 2 == 0 {
            left.push(entry);
        } else {
            right.push(entry);
        }
    }
    (left, right)
}
