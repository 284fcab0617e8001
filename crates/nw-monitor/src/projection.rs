//! Fund snapshot and forward-NAV projection.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use nw_calendar::{CalendarError, TradingCalendar};
use nw_md::{FetchError, FundHistory};

use crate::estimate::estimate_daily_growth;

/// What the run knows about the fund after bootstrap. Built once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundSnapshot {
    pub fund_code: String,
    pub fund_name: String,
    pub latest_nav: Decimal,
    pub latest_nav_date: NaiveDate,
    pub estimated_daily_growth: Decimal,
}

impl FundSnapshot {
    /// Newest point becomes the latest NAV; growth is the median heuristic
    /// over the same history.
    pub fn from_history(fund_code: &str, history: &FundHistory) -> Result<Self, FetchError> {
        let latest = history.points.first().ok_or_else(|| {
            FetchError::InsufficientData(format!("fund {fund_code}: empty NAV history"))
        })?;

        Ok(Self {
            fund_code: fund_code.to_string(),
            fund_name: history.name.clone(),
            latest_nav: latest.nav,
            latest_nav_date: latest.date,
            estimated_daily_growth: estimate_daily_growth(&history.points),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    pub next_estimated_date: NaiveDate,
    pub next_estimated_nav: Decimal,
    pub earn_days: u32,
}

/// Estimate the next published NAV.
///
/// The next publication date is the first trading day after the latest NAV
/// date; it folds in `earn_days` days of return.
pub fn project(
    snapshot: &FundSnapshot,
    calendar: &TradingCalendar,
) -> Result<Projection, CalendarError> {
    let next = calendar.next_trading_date(snapshot.latest_nav_date)?;
    let earn_days = calendar.earn_days_for(next)?;
    Ok(Projection {
        next_estimated_date: next,
        next_estimated_nav: snapshot.latest_nav
            + snapshot.estimated_daily_growth * Decimal::from(earn_days),
        earn_days,
    })
}

/// NAV the live price is compared against during one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavReference {
    /// Projected from the published history.
    Projected {
        snapshot: FundSnapshot,
        projection: Projection,
    },
    /// Taken from configuration; no history is fetched.
    Fixed { fund_code: String, nav: Decimal },
}

impl NavReference {
    pub fn fund_code(&self) -> &str {
        match self {
            NavReference::Projected { snapshot, .. } => &snapshot.fund_code,
            NavReference::Fixed { fund_code, .. } => fund_code,
        }
    }

    pub fn nav(&self) -> Decimal {
        match self {
            NavReference::Projected { projection, .. } => projection.next_estimated_nav,
            NavReference::Fixed { nav, .. } => *nav,
        }
    }
}
