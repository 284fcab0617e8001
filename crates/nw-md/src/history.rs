//! Fund NAV history from the Eastmoney `pingzhongdata` script.
//!
//! The payload is a JavaScript file of `var x = ...;` assignments. Two are
//! read:
//! - `fS_name = "..."`: display name (falls back to the fund code)
//! - `Data_netWorthTrend = [...];`: `{x: epoch millis, y: nav, ...}` records,
//!   oldest first. `new Date(Y,M,D)` literals are rewritten to strings before
//!   the array is parsed as JSON.

use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use chrono::DateTime;
use chrono_tz::Tz;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::http::{build_client, now_millis, text_body, trim_base};
use crate::{FetchError, FundHistory, NavHistorySource, NavPoint};

pub const EASTMONEY_BASE_URL: &str = "https://fund.eastmoney.com";

/// Most recent points retained from the trend array.
pub const HISTORY_WINDOW: usize = 20;

const HISTORY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct EastmoneyHistorySource {
    http: reqwest::Client,
    base_url: String,
    tz: Tz,
}

impl EastmoneyHistorySource {
    pub fn new(tz: Tz) -> Result<Self, FetchError> {
        Self::new_with_base_url(EASTMONEY_BASE_URL.to_string(), tz)
    }

    pub fn new_with_base_url(base_url: String, tz: Tz) -> Result<Self, FetchError> {
        Ok(Self {
            http: build_client(HISTORY_TIMEOUT)?,
            base_url,
            tz,
        })
    }
}

#[async_trait::async_trait]
impl NavHistorySource for EastmoneyHistorySource {
    fn source_name(&self) -> &'static str {
        "eastmoney"
    }

    async fn fetch_history(&self, fund_code: &str) -> Result<FundHistory, FetchError> {
        let url = format!("{}/pingzhongdata/{}.js", trim_base(&self.base_url), fund_code);
        let referer = format!("https://fund.eastmoney.com/{fund_code}.html");

        let resp = self
            .http
            .get(url)
            .query(&[("t", now_millis())])
            .header(reqwest::header::REFERER, referer)
            .header(reqwest::header::ACCEPT, "*/*")
            .header(reqwest::header::ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9,en;q=0.8")
            .send()
            .await?;

        let body = text_body(resp, "history").await?;
        parse_history_script(fund_code, &body, self.tz)
    }
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"fS_name\s*=\s*['"]([^'"]+)['"]"#).expect("static regex"))
}

fn trend_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Data_netWorthTrend\s*=\s*(\[.*?\]);").expect("static regex")
    })
}

fn js_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"new Date\((\d{4}),(\d{1,2}),(\d{1,2})\)").expect("static regex")
    })
}

#[derive(Debug, Deserialize)]
struct TrendRecord {
    x: i64,
    y: serde_json::Number,
}

/// Extract the fund name and the newest [`HISTORY_WINDOW`] points
/// (newest first) from a `pingzhongdata` script body.
///
/// `tz` converts the epoch-millis `x` values to exchange-local dates.
pub fn parse_history_script(fund_code: &str, body: &str, tz: Tz) -> Result<FundHistory, FetchError> {
    let name = name_re()
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| fund_code.to_string());

    let raw = trend_re()
        .captures(body)
        .and_then(|c| c.get(1))
        .ok_or_else(|| {
            FetchError::UpstreamFormat(format!("fund {fund_code}: Data_netWorthTrend not found"))
        })?
        .as_str();

    let normalized = js_date_re().replace_all(raw, r#""$1-$2-$3""#);

    let records: Vec<TrendRecord> = serde_json::from_str(&normalized).map_err(|e| {
        FetchError::UpstreamFormat(format!("fund {fund_code}: trend json decode failed: {e}"))
    })?;

    if records.is_empty() {
        return Err(FetchError::InsufficientData(format!(
            "fund {fund_code}: empty NAV history"
        )));
    }

    let points = records
        .iter()
        .rev()
        .take(HISTORY_WINDOW)
        .map(|r| to_point(r, tz))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FundHistory { name, points })
}

fn to_point(r: &TrendRecord, tz: Tz) -> Result<NavPoint, FetchError> {
    let date = DateTime::from_timestamp_millis(r.x)
        .ok_or_else(|| FetchError::UpstreamFormat(format!("timestamp out of range: {}", r.x)))?
        .with_timezone(&tz)
        .date_naive();

    let text = r.y.to_string();
    let nav = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| FetchError::UpstreamFormat(format!("nav value '{text}' invalid: {e}")))?;

    Ok(NavPoint { date, nav })
}
