//! Multi-year trading calendar with bounded forward walks.
//!
//! A [`TradingCalendar`] holds the holiday sets for every year it was given.
//! A year without a set degrades to weekend-only logic, matching the holiday
//! resolver's behavior when the remote source is unavailable.
//!
//! Forward walks (`next_trading_date`, `earn_days_for`) never scan more than
//! [`MAX_SCAN_DAYS`] calendar days. A corrupted holiday set that closes every
//! day surfaces as [`CalendarError::NoTradingDay`] instead of an endless loop.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Days, NaiveDate};

use crate::holidays::{is_trading_day, HolidaySet, TradingDay};

/// Upper bound on calendar days scanned by a single forward walk.
pub const MAX_SCAN_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// No trading day found within [`MAX_SCAN_DAYS`] after `from`.
    NoTradingDay { from: NaiveDate, scanned_days: u32 },
    /// Date arithmetic left the representable range.
    OutOfRange(NaiveDate),
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarError::NoTradingDay { from, scanned_days } => write!(
                f,
                "no trading day within {scanned_days} days after {from}; holiday data looks corrupt"
            ),
            CalendarError::OutOfRange(d) => write!(f, "date out of range after {d}"),
        }
    }
}

impl std::error::Error for CalendarError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradingCalendar {
    years: BTreeMap<i32, HolidaySet>,
}

impl TradingCalendar {
    /// Weekend-only calendar (no holiday data for any year).
    pub fn weekends_only() -> Self {
        Self::default()
    }

    pub fn with_year(mut self, year: i32, holidays: HolidaySet) -> Self {
        self.insert_year(year, holidays);
        self
    }

    pub fn insert_year(&mut self, year: i32, holidays: HolidaySet) {
        self.years.insert(year, holidays);
    }

    pub fn has_year(&self, year: i32) -> bool {
        self.years.contains_key(&year)
    }

    pub fn classify(&self, date: NaiveDate) -> TradingDay {
        match self.years.get(&date.year()) {
            Some(set) => is_trading_day(date, set),
            None => is_trading_day(date, &HolidaySet::empty()),
        }
    }

    pub fn is_trading(&self, date: NaiveDate) -> bool {
        self.classify(date).is_trading
    }

    /// First trading date strictly after `from`.
    pub fn next_trading_date(&self, from: NaiveDate) -> Result<NaiveDate, CalendarError> {
        let mut cursor = from;
        for _ in 0..MAX_SCAN_DAYS {
            cursor = next_day(cursor)?;
            if self.is_trading(cursor) {
                return Ok(cursor);
            }
        }
        Err(CalendarError::NoTradingDay {
            from,
            scanned_days: MAX_SCAN_DAYS,
        })
    }

    /// Calendar days of return folded into the NAV published on `date`.
    ///
    /// Counts `date` itself plus every following non-trading day, stopping
    /// when the day after the counted span is a trading day:
    /// Mon–Thu → 1, Friday before a plain weekend → 3, the day before a
    /// holiday block → 1 + block length.
    pub fn earn_days_for(&self, date: NaiveDate) -> Result<u32, CalendarError> {
        let mut days = 1u32;
        let mut last = date;
        loop {
            let following = next_day(last)?;
            if self.is_trading(following) {
                return Ok(days);
            }
            if days >= MAX_SCAN_DAYS {
                return Err(CalendarError::NoTradingDay {
                    from: date,
                    scanned_days: days,
                });
            }
            days += 1;
            last = following;
        }
    }
}

fn next_day(d: NaiveDate) -> Result<NaiveDate, CalendarError> {
    d.checked_add_days(Days::new(1))
        .ok_or(CalendarError::OutOfRange(d))
}
