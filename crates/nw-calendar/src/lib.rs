//! nw-calendar
//!
//! Exchange trading calendar for the NAV discount monitor.
//!
//! Pure deterministic logic. No IO, no wall-clock. Callers supply holiday
//! sets (fetched elsewhere) and the current time.
//!
//! - [`holidays`]: per-year holiday set and the single-day classifier.
//! - [`calendar`]: multi-year calendar with bounded forward walks
//!   (next trading date, earn days).
//! - [`session`]: intraday session windows and wait-until-open arithmetic.

pub mod calendar;
pub mod holidays;
pub mod session;

pub use calendar::{CalendarError, TradingCalendar, MAX_SCAN_DAYS};
pub use holidays::{is_trading_day, DayReason, HolidayEntry, HolidaySet, TradingDay};
pub use session::{SessionPhase, SessionSchedule};

/// Exchange-local timezone used when none is configured.
pub const DEFAULT_TIMEZONE: chrono_tz::Tz = chrono_tz::Asia::Shanghai;
