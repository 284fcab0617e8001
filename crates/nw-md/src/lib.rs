//! nw-md
//!
//! Upstream market-data sources for the NAV discount monitor.
//!
//! This crate owns the source traits and their HTTP implementations:
//! - [`holidays`]: legal-holiday calendar per year + the caching resolver.
//! - [`history`]: recent NAV history of a fund.
//! - [`quote`]: live exchange quote of a fund.
//!
//! Every source returns an explicit `Result`; nothing here substitutes a zero
//! value for "unavailable". Callers decide whether a failure is fatal.

pub mod history;
pub mod holidays;
pub mod quote;

mod http;

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

pub use history::{parse_history_script, EastmoneyHistorySource, HISTORY_WINDOW};
pub use holidays::{HolidayResolver, TimorHolidaySource};
pub use quote::{parse_quote_record, Exchange, TencentQuoteSource};

// ---------------------------------------------------------------------------
// Shared types
// ---------------------------------------------------------------------------

/// One published NAV value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: Decimal,
}

/// Fund display name plus a recent NAV window, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundHistory {
    pub name: String,
    pub points: Vec<NavPoint>,
}

/// Live exchange quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveQuote {
    pub price: Decimal,
    /// Percent change versus the previous close (e.g. `0.01` = 0.01%).
    pub percent_change: Decimal,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a source may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Timeout, connection failure, or non-2xx status.
    NetworkUnavailable(String),
    /// The payload did not have the expected shape.
    UpstreamFormat(String),
    /// The payload parsed but carried too little data to proceed.
    InsufficientData(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NetworkUnavailable(msg) => write!(f, "network unavailable: {msg}"),
            FetchError::UpstreamFormat(msg) => write!(f, "upstream format error: {msg}"),
            FetchError::InsufficientData(msg) => write!(f, "insufficient data: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::UpstreamFormat(e.to_string())
        } else {
            FetchError::NetworkUnavailable(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Source traits
// ---------------------------------------------------------------------------

/// Legal-holiday calendar for one year.
#[async_trait::async_trait]
pub trait HolidaySource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_year(&self, year: i32) -> Result<nw_calendar::HolidaySet, FetchError>;
}

/// Recent NAV history for a fund.
#[async_trait::async_trait]
pub trait NavHistorySource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_history(&self, fund_code: &str) -> Result<FundHistory, FetchError>;
}

/// Live exchange quote for a fund.
#[async_trait::async_trait]
pub trait QuoteSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_quote(&self, fund_code: &str) -> Result<LiveQuote, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display() {
        assert_eq!(
            FetchError::NetworkUnavailable("timed out".to_string()).to_string(),
            "network unavailable: timed out"
        );
        assert_eq!(
            FetchError::UpstreamFormat("missing field".to_string()).to_string(),
            "upstream format error: missing field"
        );
        assert_eq!(
            FetchError::InsufficientData("0 points".to_string()).to_string(),
            "insufficient data: 0 points"
        );
    }

    #[test]
    fn sources_are_object_safe() {
        fn _holiday(_: &dyn HolidaySource) {}
        fn _history(_: &dyn NavHistorySource) {}
        fn _quote(_: &dyn QuoteSource) {}
    }
}
