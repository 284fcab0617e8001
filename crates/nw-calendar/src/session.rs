//! Intraday trading session windows.
//!
//! Two fixed windows in exchange-local time (default 09:30–11:30 and
//! 13:00–15:00). Window bounds are inclusive; the market counts as closed
//! only strictly after the afternoon end.

use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

/// Where a wall-clock time falls relative to the trading day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    BeforeOpen,
    Morning,
    LunchBreak,
    Afternoon,
    Closed,
}

impl SessionPhase {
    pub fn is_trading(self) -> bool {
        matches!(self, SessionPhase::Morning | SessionPhase::Afternoon)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSchedule {
    pub morning_start: NaiveTime,
    pub morning_end: NaiveTime,
    pub afternoon_start: NaiveTime,
    pub afternoon_end: NaiveTime,
}

impl Default for SessionSchedule {
    fn default() -> Self {
        Self {
            morning_start: hm(9, 30),
            morning_end: hm(11, 30),
            afternoon_start: hm(13, 0),
            afternoon_end: hm(15, 0),
        }
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

impl SessionSchedule {
    /// `true` when the four boundaries are strictly increasing.
    pub fn is_ordered(&self) -> bool {
        self.morning_start < self.morning_end
            && self.morning_end < self.afternoon_start
            && self.afternoon_start < self.afternoon_end
    }

    pub fn phase(&self, t: NaiveTime) -> SessionPhase {
        if t > self.afternoon_end {
            SessionPhase::Closed
        } else if t >= self.afternoon_start {
            SessionPhase::Afternoon
        } else if t > self.morning_end {
            SessionPhase::LunchBreak
        } else if t >= self.morning_start {
            SessionPhase::Morning
        } else {
            SessionPhase::BeforeOpen
        }
    }

    pub fn is_trading_time(&self, t: NaiveTime) -> bool {
        self.phase(t).is_trading()
    }

    pub fn is_closed(&self, t: NaiveTime) -> bool {
        t > self.afternoon_end
    }

    /// Time to sleep from `now` until the next session opens.
    ///
    /// - lunch break → same-day afternoon open
    /// - after close → next-day morning open
    /// - otherwise → same-day morning open
    ///
    /// Clamped at zero: a `now` already inside a window yields zero or the
    /// time to a boundary already passed, never a negative wait.
    pub fn wait_until_next_session(&self, now: DateTime<Tz>) -> Duration {
        let today = now.date_naive();
        let target = match self.phase(now.time()) {
            SessionPhase::LunchBreak => at(now.timezone(), today, self.afternoon_start),
            SessionPhase::Closed => today
                .checked_add_days(Days::new(1))
                .and_then(|tomorrow| at(now.timezone(), tomorrow, self.morning_start)),
            _ => at(now.timezone(), today, self.morning_start),
        };

        match target {
            Some(t) => (t - now).to_std().unwrap_or(Duration::ZERO),
            None => Duration::ZERO,
        }
    }
}

fn at(tz: Tz, date: NaiveDate, t: NaiveTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&date.and_time(t)).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_TIMEZONE;

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn shanghai(h: u32, m: u32, s: u32) -> DateTime<Tz> {
        DEFAULT_TIMEZONE
            .with_ymd_and_hms(2024, 10, 10, h, m, s)
            .single()
            .unwrap()
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let s = SessionSchedule::default();
        assert!(s.is_trading_time(t(9, 30, 0)));
        assert!(s.is_trading_time(t(11, 30, 0)));
        assert!(s.is_trading_time(t(13, 0, 0)));
        assert!(s.is_trading_time(t(15, 0, 0)));
        assert!(!s.is_trading_time(t(9, 29, 59)));
        assert!(!s.is_trading_time(t(11, 30, 1)));
        assert!(!s.is_trading_time(t(12, 59, 59)));
    }

    #[test]
    fn phases() {
        let s = SessionSchedule::default();
        assert_eq!(s.phase(t(8, 0, 0)), SessionPhase::BeforeOpen);
        assert_eq!(s.phase(t(10, 0, 0)), SessionPhase::Morning);
        assert_eq!(s.phase(t(12, 0, 0)), SessionPhase::LunchBreak);
        assert_eq!(s.phase(t(14, 0, 0)), SessionPhase::Afternoon);
        assert_eq!(s.phase(t(15, 0, 1)), SessionPhase::Closed);
    }

    #[test]
    fn closed_only_strictly_after_afternoon_end() {
        let s = SessionSchedule::default();
        assert!(!s.is_closed(t(15, 0, 0)));
        assert!(s.is_closed(t(15, 0, 1)));
    }

    #[test]
    fn wait_before_open_targets_morning() {
        let s = SessionSchedule::default();
        assert_eq!(
            s.wait_until_next_session(shanghai(9, 0, 0)),
            Duration::from_secs(30 * 60)
        );
    }

    #[test]
    fn wait_during_lunch_targets_afternoon() {
        let s = SessionSchedule::default();
        assert_eq!(
            s.wait_until_next_session(shanghai(11, 45, 0)),
            Duration::from_secs(75 * 60)
        );
    }

    #[test]
    fn wait_after_close_targets_next_morning() {
        let s = SessionSchedule::default();
        // 15:30 -> 09:30 next day = 18h
        assert_eq!(
            s.wait_until_next_session(shanghai(15, 30, 0)),
            Duration::from_secs(18 * 3600)
        );
    }

    #[test]
    fn wait_inside_window_is_zero() {
        let s = SessionSchedule::default();
        assert_eq!(s.wait_until_next_session(shanghai(10, 0, 0)), Duration::ZERO);
        assert_eq!(s.wait_until_next_session(shanghai(14, 0, 0)), Duration::ZERO);
    }

    #[test]
    fn default_schedule_is_ordered() {
        assert!(SessionSchedule::default().is_ordered());
        let broken = SessionSchedule {
            morning_end: t(14, 0, 0),
            ..SessionSchedule::default()
        };
        assert!(!broken.is_ordered());
    }
}
