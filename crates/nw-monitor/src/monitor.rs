//! Discount monitor: startup gating, bootstrap, and the polling loop.
//!
//! # State machine
//! ```text
//! Startup ──non-trading day──▶ NonTradingDay (exit 0)
//!    │ ──after close─────────▶ MarketClosed (exit 0)
//!    │ ──outside session─────▶ sleep until open
//!    ▼
//! Bootstrap ──history error──▶ HistoryUnavailable (exit 0, no retry)
//!    │ (skipped with a fixed NAV)
//!    ▼
//! Polling ◀──────────────────┐
//!    │ quote error  → sleep retry_interval
//!    │ quote ok     → policy → Alert / Quiet → sleep check_interval
//!    │ between sessions → sleep until next open
//!    ▼ now > afternoon close
//! Completed(MonitorReport)
//! ```

use std::fmt;
use std::time::Duration;

use chrono::DateTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use tracing::{info, warn};

use nw_calendar::{CalendarError, DayReason, SessionPhase, SessionSchedule, MAX_SCAN_DAYS};
use nw_md::{FetchError, HolidayResolver, HolidaySource, NavHistorySource, QuoteSource};
use nw_notify::NotifierSet;

use crate::clock::Clock;
use crate::message::AlertMessage;
use crate::projection::{project, FundSnapshot, NavReference, Projection};
use crate::watermark::{discount, format_bp, AlertDecision, AlertPolicy, AlertState};

/// Smallest sleep taken while waiting for a session boundary.
const MIN_SESSION_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub fund_code: String,
    pub policy: AlertPolicy,
    /// Compare against this NAV instead of projecting one from history.
    pub fixed_nav: Option<Decimal>,
    pub check_interval: Duration,
    pub retry_interval: Duration,
    pub schedule: SessionSchedule,
    pub title: Option<String>,
}

impl MonitorSettings {
    pub fn new(fund_code: impl Into<String>, policy: AlertPolicy) -> Self {
        Self {
            fund_code: fund_code.into(),
            policy,
            fixed_nav: None,
            check_interval: Duration::from_secs(30),
            retry_interval: Duration::from_secs(30),
            schedule: SessionSchedule::default(),
            title: None,
        }
    }
}

/// Counters for one completed polling session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorReport {
    pub polls: u32,
    pub quote_failures: u32,
    pub alerts: u32,
    pub failed_deliveries: u32,
    /// Highest discount alerted on (discount policy).
    pub watermark: Decimal,
    /// Lowest price alerted on (price-floor policy).
    pub lowest_alerted_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    NonTradingDay(DayReason),
    MarketClosed,
    HistoryUnavailable(FetchError),
    ProjectionUnavailable(CalendarError),
    Completed(MonitorReport),
}

impl RunOutcome {
    /// One-line summary for the final log record.
    pub fn summary(&self) -> String {
        match self {
            RunOutcome::NonTradingDay(reason) => format!("not a trading day ({reason})"),
            RunOutcome::MarketClosed => "market already closed".to_string(),
            RunOutcome::HistoryUnavailable(e) => format!("NAV history unavailable: {e}"),
            RunOutcome::ProjectionUnavailable(e) => format!("projection failed: {e}"),
            RunOutcome::Completed(r) => {
                let mut line = format!(
                    "session complete: polls={} quote_failures={} alerts={} watermark={}",
                    r.polls,
                    r.quote_failures,
                    r.alerts,
                    format_bp(r.watermark)
                );
                if let Some(lowest) = r.lowest_alerted_price {
                    line.push_str(&format!(" lowest_alerted_price={lowest}"));
                }
                line
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    History(FetchError),
    Calendar(CalendarError),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapError::History(e) => write!(f, "history: {e}"),
            BootstrapError::Calendar(e) => write!(f, "calendar: {e}"),
        }
    }
}

impl std::error::Error for BootstrapError {}

pub struct DiscountMonitor<H, N, Q, C>
where
    H: HolidaySource,
    N: NavHistorySource,
    Q: QuoteSource,
    C: Clock,
{
    settings: MonitorSettings,
    holidays: HolidayResolver<H>,
    history: N,
    quotes: Q,
    notifiers: NotifierSet,
    clock: C,
}

impl<H, N, Q, C> DiscountMonitor<H, N, Q, C>
where
    H: HolidaySource,
    N: NavHistorySource,
    Q: QuoteSource,
    C: Clock,
{
    pub fn new(
        settings: MonitorSettings,
        holidays: HolidayResolver<H>,
        history: N,
        quotes: Q,
        notifiers: NotifierSet,
        clock: C,
    ) -> Self {
        Self {
            settings,
            holidays,
            history,
            quotes,
            notifiers,
            clock,
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// One full run: gate on day and session, bootstrap, poll until close.
    pub async fn run(&mut self) -> RunOutcome {
        let now = self.clock.now();
        let today = now.date_naive();

        let calendar = self.holidays.calendar_for(today, MAX_SCAN_DAYS).await;
        let verdict = calendar.classify(today);
        if !verdict.is_trading {
            info!(date = %today, reason = %verdict.reason, "not a trading day; exiting");
            return RunOutcome::NonTradingDay(verdict.reason);
        }

        let schedule = self.settings.schedule;
        match schedule.phase(now.time()) {
            SessionPhase::Closed => {
                info!(time = %now.format("%H:%M:%S"), "market already closed; exiting");
                return RunOutcome::MarketClosed;
            }
            phase if !phase.is_trading() => {
                let wait = self.session_wait(now);
                info!(
                    time = %now.format("%H:%M:%S"),
                    ?phase,
                    wait_secs = wait.as_secs(),
                    "outside trading session; waiting for open"
                );
                self.clock.sleep(wait).await;
            }
            _ => {}
        }

        let reference = match self.reference().await {
            Ok(v) => v,
            Err(BootstrapError::History(e)) => {
                warn!(fund = %self.settings.fund_code, error = %e, "NAV history unavailable; exiting");
                return RunOutcome::HistoryUnavailable(e);
            }
            Err(BootstrapError::Calendar(e)) => {
                warn!(fund = %self.settings.fund_code, error = %e, "projection failed; exiting");
                return RunOutcome::ProjectionUnavailable(e);
            }
        };

        RunOutcome::Completed(self.monitor_prices(&reference).await)
    }

    /// The configured fixed NAV, or a projection from history.
    pub async fn reference(&mut self) -> Result<NavReference, BootstrapError> {
        if let Some(nav) = self.settings.fixed_nav {
            info!(fund = %self.settings.fund_code, nav = %nav, "using fixed NAV estimate");
            return Ok(NavReference::Fixed {
                fund_code: self.settings.fund_code.clone(),
                nav,
            });
        }
        let (snapshot, projection) = self.bootstrap().await?;
        Ok(NavReference::Projected {
            snapshot,
            projection,
        })
    }

    /// Fetch history, estimate growth, project the next NAV.
    pub async fn bootstrap(&mut self) -> Result<(FundSnapshot, Projection), BootstrapError> {
        let code = self.settings.fund_code.clone();
        let history = self
            .history
            .fetch_history(&code)
            .await
            .map_err(BootstrapError::History)?;
        let snapshot = FundSnapshot::from_history(&code, &history).map_err(BootstrapError::History)?;

        info!(
            fund = %code,
            name = %snapshot.fund_name,
            latest_nav = %snapshot.latest_nav,
            latest_nav_date = %snapshot.latest_nav_date,
            points = history.points.len(),
            daily_growth = %snapshot.estimated_daily_growth,
            "NAV snapshot loaded"
        );

        // Covers the next publication date and the holiday block after it.
        let calendar = self
            .holidays
            .calendar_for(snapshot.latest_nav_date, 2 * MAX_SCAN_DAYS)
            .await;
        let projection = project(&snapshot, &calendar).map_err(BootstrapError::Calendar)?;

        info!(
            next_date = %projection.next_estimated_date,
            next_nav = %projection.next_estimated_nav.round_dp(4),
            earn_days = projection.earn_days,
            "next NAV projected"
        );

        Ok((snapshot, projection))
    }

    /// Poll the live price until the afternoon session closes.
    pub async fn monitor_prices(&mut self, reference: &NavReference) -> MonitorReport {
        let schedule = self.settings.schedule;
        let fund_code = reference.fund_code().to_string();
        let nav = reference.nav();
        let mut state = AlertState::new(self.settings.policy);
        let mut report = MonitorReport::default();

        info!(
            fund = %fund_code,
            reference_nav = %nav.round_dp(4),
            policy = %self.settings.policy,
            "price monitoring started"
        );

        loop {
            let now = self.clock.now();
            let phase = schedule.phase(now.time());

            if phase == SessionPhase::Closed {
                break;
            }

            if !phase.is_trading() {
                let wait = self.session_wait(now);
                info!(
                    time = %now.format("%H:%M:%S"),
                    ?phase,
                    wait_secs = wait.as_secs(),
                    "outside trading session"
                );
                self.clock.sleep(wait).await;
                continue;
            }

            let quote = match self.quotes.fetch_quote(&fund_code).await {
                Ok(q) => q,
                Err(e) => {
                    report.quote_failures += 1;
                    warn!(
                        time = %now.format("%H:%M:%S"),
                        source = self.quotes.source_name(),
                        error = %e,
                        "quote fetch failed"
                    );
                    self.clock.sleep(self.settings.retry_interval).await;
                    continue;
                }
            };
            report.polls += 1;

            match discount(nav, quote.price) {
                None => warn!(reference_nav = %nav, "reference NAV not positive; discount undefined"),
                Some(d) => match state.observe(quote.price, d) {
                    AlertDecision::Alert => {
                        report.alerts += 1;
                        warn!(
                            time = %now.format("%H:%M:%S"),
                            price = %quote.price,
                            pct_change = %quote.percent_change,
                            reference_nav = %nav.round_dp(4),
                            discount_bp = %format_bp(d),
                            "alert"
                        );
                        let msg = AlertMessage::render(
                            self.settings.title.as_deref(),
                            reference,
                            &quote,
                            now,
                            d,
                        );
                        let delivery = self.notifiers.broadcast(&msg.title, &msg.body).await;
                        if let Some(e) = delivery.first_error() {
                            report.failed_deliveries += 1;
                            warn!(
                                delivered = delivery.delivered(),
                                attempted = delivery.attempted(),
                                error = %e,
                                "alert delivery incomplete"
                            );
                        }
                    }
                    AlertDecision::Quiet => info!(
                        time = %now.format("%H:%M:%S"),
                        price = %quote.price,
                        pct_change = %quote.percent_change,
                        reference_nav = %nav.round_dp(4),
                        discount_bp = %format_bp(d),
                        "tick"
                    ),
                },
            }

            self.clock.sleep(self.settings.check_interval).await;
        }

        report.watermark = state.discount_level();
        report.lowest_alerted_price = state.lowest_alerted_price();
        info!(
            polls = report.polls,
            quote_failures = report.quote_failures,
            alerts = report.alerts,
            "market closed; monitoring finished"
        );
        report
    }

    fn session_wait(&self, now: DateTime<Tz>) -> Duration {
        self.settings
            .schedule
            .wait_until_next_session(now)
            .max(MIN_SESSION_WAIT)
    }
}
