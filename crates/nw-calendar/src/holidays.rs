//! Holiday set and single-day trading classifier.
//!
//! # Rules
//!
//! - Saturday and Sunday are never trading days. Compensatory workdays (a
//!   weekend the government marks as a working day) stay closed: the exchange
//!   does not open on weekends.
//! - A weekday whose `MM-DD` entry is marked `is_holiday = true` is closed.
//! - Every other day is a trading day. An entry marked `is_holiday = false`
//!   never disqualifies a weekday.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};

// ---------------------------------------------------------------------------
// HolidaySet
// ---------------------------------------------------------------------------

/// One calendar entry as published by the holiday source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HolidayEntry {
    pub is_holiday: bool,
    pub name: String,
}

/// Holiday entries for a single calendar year, keyed by `"MM-DD"`.
///
/// An absent key means "not a designated holiday". Immutable once built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HolidaySet {
    entries: BTreeMap<String, HolidayEntry>,
}

impl HolidaySet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from `("MM-DD", entry)` pairs. Later duplicates win.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, HolidayEntry)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, month: u32, day: u32) -> Option<&HolidayEntry> {
        self.entries.get(&month_day_key(month, day))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries flagged as actual days off.
    pub fn holiday_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_holiday).count()
    }
}

fn month_day_key(month: u32, day: u32) -> String {
    format!("{month:02}-{day:02}")
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Why a date is (or is not) a trading day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DayReason {
    TradingDay,
    Weekend,
    Holiday(String),
}

impl fmt::Display for DayReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayReason::TradingDay => write!(f, "trading day"),
            DayReason::Weekend => write!(f, "weekend"),
            DayReason::Holiday(name) => write!(f, "holiday:{name}"),
        }
    }
}

/// Classification verdict for one date.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TradingDay {
    pub is_trading: bool,
    pub reason: DayReason,
}

impl TradingDay {
    fn open() -> Self {
        Self {
            is_trading: true,
            reason: DayReason::TradingDay,
        }
    }

    fn closed(reason: DayReason) -> Self {
        Self {
            is_trading: false,
            reason,
        }
    }
}

/// Classify `date` against the holiday set of its year.
///
/// The weekend check is reported first; either condition alone closes the day.
pub fn is_trading_day(date: NaiveDate, holidays: &HolidaySet) -> TradingDay {
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        return TradingDay::closed(DayReason::Weekend);
    }

    match holidays.get(date.month(), date.day()) {
        Some(entry) if entry.is_holiday => {
            let name = if entry.name.trim().is_empty() {
                "holiday".to_string()
            } else {
                entry.name.clone()
            };
            TradingDay::closed(DayReason::Holiday(name))
        }
        _ => TradingDay::open(),
    }
}
