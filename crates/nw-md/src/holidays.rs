//! Legal-holiday source and the per-process holiday resolver.
//!
//! # Wire format (timor.tech)
//! `GET /api/holiday/year/{year}` →
//! `{"code": 0, "holiday": {"10-01": {"holiday": true, "name": "..."}, ...}}`
//!
//! Entries with `"holiday": false` are compensatory workdays. They are kept in
//! the set; the classifier ignores them on weekends and weekdays alike.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{Datelike, Days, NaiveDate};
use nw_calendar::{HolidayEntry, HolidaySet, TradingCalendar};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::http::{build_client, text_body, trim_base};
use crate::{FetchError, HolidaySource};

pub const TIMOR_BASE_URL: &str = "https://timor.tech";

const HOLIDAY_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// timor.tech source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TimorHolidaySource {
    http: reqwest::Client,
    base_url: String,
}

impl TimorHolidaySource {
    pub fn new() -> Result<Self, FetchError> {
        Self::new_with_base_url(TIMOR_BASE_URL.to_string())
    }

    pub fn new_with_base_url(base_url: String) -> Result<Self, FetchError> {
        Ok(Self {
            http: build_client(HOLIDAY_TIMEOUT)?,
            base_url,
        })
    }

    fn year_url(&self, year: i32) -> String {
        format!("{}/api/holiday/year/{}", trim_base(&self.base_url), year)
    }
}

#[async_trait::async_trait]
impl HolidaySource for TimorHolidaySource {
    fn source_name(&self) -> &'static str {
        "timor"
    }

    async fn fetch_year(&self, year: i32) -> Result<HolidaySet, FetchError> {
        let resp = self.http.get(self.year_url(year)).send().await?;
        let body = text_body(resp, "holiday").await?;
        parse_holiday_year(&body)
    }
}

#[derive(Debug, Deserialize)]
struct TimorYearResponse {
    code: i64,
    holiday: Option<BTreeMap<String, TimorHolidayEntry>>,
}

#[derive(Debug, Deserialize)]
struct TimorHolidayEntry {
    holiday: bool,
    #[serde(default)]
    name: String,
}

/// Parse a timor.tech year response into a [`HolidaySet`].
pub fn parse_holiday_year(body: &str) -> Result<HolidaySet, FetchError> {
    let parsed: TimorYearResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::UpstreamFormat(format!("holiday json decode failed: {e}")))?;

    if parsed.code != 0 {
        return Err(FetchError::UpstreamFormat(format!(
            "holiday api returned code={}",
            parsed.code
        )));
    }

    let map = parsed
        .holiday
        .ok_or_else(|| FetchError::UpstreamFormat("holiday map missing".to_string()))?;

    Ok(HolidaySet::from_entries(map.into_iter().map(|(k, v)| {
        (
            k,
            HolidayEntry {
                is_holiday: v.holiday,
                name: v.name,
            },
        )
    })))
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Per-year memoizing front of a [`HolidaySource`].
///
/// Constructed once per process. A year is fetched at most once; a failed
/// fetch caches the empty set so the classifier degrades to weekend-only
/// logic for the rest of the run.
pub struct HolidayResolver<S> {
    source: S,
    cache: HashMap<i32, HolidaySet>,
}

impl<S: HolidaySource> HolidayResolver<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    pub fn is_cached(&self, year: i32) -> bool {
        self.cache.contains_key(&year)
    }

    /// Holiday set for `year`. Never fails.
    pub async fn resolve(&mut self, year: i32) -> HolidaySet {
        if let Some(set) = self.cache.get(&year) {
            debug!(year, "holiday set served from cache");
            return set.clone();
        }

        let set = match self.source.fetch_year(year).await {
            Ok(set) => {
                info!(
                    year,
                    source = self.source.source_name(),
                    entries = set.len(),
                    holidays = set.holiday_count(),
                    "holiday set loaded"
                );
                set
            }
            Err(e) => {
                warn!(
                    year,
                    source = self.source.source_name(),
                    error = %e,
                    "holiday fetch failed; falling back to weekend-only calendar"
                );
                HolidaySet::empty()
            }
        };

        self.cache.insert(year, set.clone());
        set
    }

    /// Calendar covering every year touched by `[from, from + span_days]`.
    pub async fn calendar_for(&mut self, from: NaiveDate, span_days: u32) -> TradingCalendar {
        let to = from
            .checked_add_days(Days::new(u64::from(span_days)))
            .unwrap_or(from);

        let mut cal = TradingCalendar::weekends_only();
        for year in from.year()..=to.year() {
            let set = self.resolve(year).await;
            cal.insert_year(year, set);
        }
        cal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn parses_holiday_and_workday_entries() {
        let body = r#"{"code":0,"holiday":{
            "10-01":{"holiday":true,"name":"National Day","wage":3,"date":"2024-10-01"},
            "10-12":{"holiday":false,"name":"National Day makeup","wage":1,"after":true}
        }}"#;
        let set = parse_holiday_year(body).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.get(10, 1).unwrap().is_holiday);
        assert!(!set.get(10, 12).unwrap().is_holiday);
    }

    #[test]
    fn nonzero_code_is_format_error() {
        let err = parse_holiday_year(r#"{"code":-1,"holiday":{}}"#).unwrap_err();
        assert!(matches!(err, FetchError::UpstreamFormat(_)));
    }

    #[test]
    fn missing_map_is_format_error() {
        let err = parse_holiday_year(r#"{"code":0}"#).unwrap_err();
        assert!(matches!(err, FetchError::UpstreamFormat(_)));
    }

    #[test]
    fn garbage_is_format_error() {
        assert!(matches!(
            parse_holiday_year("<html>"),
            Err(FetchError::UpstreamFormat(_))
        ));
    }

    struct CountingSource {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl HolidaySource for CountingSource {
        fn source_name(&self) -> &'static str {
            "counting"
        }

        async fn fetch_year(&self, _year: i32) -> Result<HolidaySet, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::NetworkUnavailable("down".to_string()));
            }
            Ok(HolidaySet::from_entries([(
                "01-01",
                HolidayEntry {
                    is_holiday: true,
                    name: "New Year".to_string(),
                },
            )]))
        }
    }

    #[tokio::test]
    async fn resolver_fetches_each_year_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut r = HolidayResolver::new(CountingSource {
            calls: calls.clone(),
            fail: false,
        });
        let a = r.resolve(2025).await;
        let b = r.resolve(2025).await;
        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        r.resolve(2026).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn resolver_degrades_to_empty_and_caches_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut r = HolidayResolver::new(CountingSource {
            calls: calls.clone(),
            fail: true,
        });
        assert!(r.resolve(2025).await.is_empty());
        assert!(r.is_cached(2025));
        assert!(r.resolve(2025).await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn calendar_for_spans_year_boundary() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut r = HolidayResolver::new(CountingSource {
            calls: calls.clone(),
            fail: false,
        });
        let from = NaiveDate::from_ymd_opt(2024, 12, 20).unwrap();
        let cal = r.calendar_for(from, 30).await;
        assert!(cal.has_year(2024));
        assert!(cal.has_year(2025));
        assert!(!cal.is_trading(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
