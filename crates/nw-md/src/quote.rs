//! Live exchange quote from the Tencent `qt.gtimg.cn` text feed.
//!
//! Response shape: `v_sh511880="1~name~511880~100.003~...";`: a single
//! `~`-delimited record. Field 3 is the last price, field 32 the percent
//! change; a valid record has at least 33 fields.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::http::{build_client, text_body, trim_base};
use crate::{FetchError, LiveQuote, QuoteSource};

pub const TENCENT_BASE_URL: &str = "https://qt.gtimg.cn";

const QUOTE_TIMEOUT: Duration = Duration::from_secs(5);
const PRICE_FIELD: usize = 3;
const PCT_FIELD: usize = 32;
const MIN_FIELDS: usize = 33;

/// Listing exchange, used as the symbol prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Exchange {
    #[default]
    Sh,
    Sz,
}

impl Exchange {
    pub fn prefix(&self) -> &'static str {
        match self {
            Exchange::Sh => "sh",
            Exchange::Sz => "sz",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sh" => Some(Exchange::Sh),
            "sz" => Some(Exchange::Sz),
            _ => None,
        }
    }

    pub fn symbol(&self, fund_code: &str) -> String {
        format!("{}{}", self.prefix(), fund_code)
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Debug, Clone)]
pub struct TencentQuoteSource {
    http: reqwest::Client,
    base_url: String,
    exchange: Exchange,
}

impl TencentQuoteSource {
    pub fn new(exchange: Exchange) -> Result<Self, FetchError> {
        Self::new_with_base_url(TENCENT_BASE_URL.to_string(), exchange)
    }

    pub fn new_with_base_url(base_url: String, exchange: Exchange) -> Result<Self, FetchError> {
        Ok(Self {
            http: build_client(QUOTE_TIMEOUT)?,
            base_url,
            exchange,
        })
    }
}

#[async_trait::async_trait]
impl QuoteSource for TencentQuoteSource {
    fn source_name(&self) -> &'static str {
        "tencent"
    }

    async fn fetch_quote(&self, fund_code: &str) -> Result<LiveQuote, FetchError> {
        let url = format!(
            "{}/q={}",
            trim_base(&self.base_url),
            self.exchange.symbol(fund_code)
        );

        let resp = self
            .http
            .get(url)
            .header(reqwest::header::REFERER, "https://quote.eastmoney.com/")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let body = text_body(resp, "quote").await?;
        parse_quote_record(&body)
    }
}

/// Parse one `name="f0~f1~...";` record.
///
/// A blank, non-numeric, or non-positive price is a format error: an
/// exchange-traded fund never legitimately trades at or below zero, and the
/// feed blanks the field for unknown or suspended symbols.
pub fn parse_quote_record(body: &str) -> Result<LiveQuote, FetchError> {
    let (_, value) = body
        .split_once('=')
        .ok_or_else(|| FetchError::UpstreamFormat("quote record has no '='".to_string()))?;

    let value = value.trim().trim_matches(|c: char| c == '"' || c == ';' || c.is_whitespace());
    let parts: Vec<&str> = value.split('~').collect();

    if parts.len() < MIN_FIELDS {
        return Err(FetchError::UpstreamFormat(format!(
            "quote record has {} fields, need {}",
            parts.len(),
            MIN_FIELDS
        )));
    }

    let price = parse_field(parts[PRICE_FIELD], "price")?
        .ok_or_else(|| FetchError::UpstreamFormat("quote price is blank".to_string()))?;
    if price <= Decimal::ZERO {
        return Err(FetchError::UpstreamFormat(format!(
            "quote price {price} is not positive"
        )));
    }

    let percent_change = parse_field(parts[PCT_FIELD], "percent change")?.unwrap_or(Decimal::ZERO);

    Ok(LiveQuote {
        price,
        percent_change,
    })
}

fn parse_field(raw: &str, what: &str) -> Result<Option<Decimal>, FetchError> {
    let t = raw.trim();
    if t.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(t)
        .map(Some)
        .map_err(|e| FetchError::UpstreamFormat(format!("quote {what} '{t}' invalid: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(price: &str, pct: &str) -> String {
        let mut fields: Vec<String> = (0..50).map(|i| format!("f{i}")).collect();
        fields[0] = "1".to_string();
        fields[2] = "511880".to_string();
        fields[PRICE_FIELD] = price.to_string();
        fields[PCT_FIELD] = pct.to_string();
        format!("v_sh511880=\"{}\";\n", fields.join("~"))
    }

    #[test]
    fn parses_price_and_percent_change() {
        let q = parse_quote_record(&record("100.003", "0.01")).unwrap();
        assert_eq!(q.price, dec!(100.003));
        assert_eq!(q.percent_change, dec!(0.01));
    }

    #[test]
    fn negative_percent_change() {
        let q = parse_quote_record(&record("1.235", "-0.08")).unwrap();
        assert_eq!(q.percent_change, dec!(-0.08));
    }

    #[test]
    fn blank_percent_defaults_to_zero() {
        let q = parse_quote_record(&record("1.235", "")).unwrap();
        assert_eq!(q.percent_change, Decimal::ZERO);
    }

    #[test]
    fn blank_price_is_format_error() {
        assert!(matches!(
            parse_quote_record(&record("", "0.01")),
            Err(FetchError::UpstreamFormat(_))
        ));
    }

    #[test]
    fn zero_price_is_format_error() {
        assert!(matches!(
            parse_quote_record(&record("0.000", "0.00")),
            Err(FetchError::UpstreamFormat(_))
        ));
    }

    #[test]
    fn short_record_is_format_error() {
        let err = parse_quote_record("v_sh511880=\"1~x~511880~100.0\";").unwrap_err();
        assert!(err.to_string().contains("4 fields"));
    }

    #[test]
    fn unknown_symbol_response_is_format_error() {
        assert!(parse_quote_record("v_pv_none_match=\"1\";").is_err());
        assert!(parse_quote_record("").is_err());
    }

    #[test]
    fn exchange_symbol_prefix() {
        assert_eq!(Exchange::Sh.symbol("511880"), "sh511880");
        assert_eq!(Exchange::Sz.symbol("159001"), "sz159001");
        assert_eq!(Exchange::parse(" SZ "), Some(Exchange::Sz));
        assert_eq!(Exchange::parse("hk"), None);
    }
}
