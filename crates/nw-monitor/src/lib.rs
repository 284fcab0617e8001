//! nw-monitor
//!
//! Discount monitor for an exchange-traded money-market fund.
//!
//! Pipeline per run:
//! 1. classify today; abort quietly on a non-trading day
//! 2. wait for the session to open
//! 3. fetch NAV history, estimate the daily NAV change ([`estimate`]) and
//!    project the next published NAV ([`projection`]), unless a fixed NAV
//!    estimate is configured
//! 4. poll the live price until close, alerting per [`AlertPolicy`]: new
//!    discount highs, or new price lows under a floor ([`watermark`],
//!    [`monitor`])
//!
//! Wall-clock access goes through [`Clock`] so the whole run can be driven
//! deterministically in tests.

pub mod clock;
pub mod estimate;
pub mod message;
pub mod monitor;
pub mod projection;
pub mod watermark;

pub use clock::{Clock, SystemClock};
pub use estimate::{estimate_daily_growth, GROWTH_SAMPLE_POINTS};
pub use message::AlertMessage;
pub use monitor::{BootstrapError, DiscountMonitor, MonitorReport, MonitorSettings, RunOutcome};
pub use projection::{project, FundSnapshot, NavReference, Projection};
pub use watermark::{
    discount, format_bp, AlertDecision, AlertPolicy, AlertState, AlertWatermark,
    PriceFloorWatermark,
};
