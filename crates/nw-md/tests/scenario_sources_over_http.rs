//! HTTP-level scenarios for the three upstream sources, against httpmock.
//!
//! GREEN when:
//! - well-formed payloads parse into the shared types
//! - non-2xx statuses surface as NetworkUnavailable
//! - malformed payloads surface as UpstreamFormat
//! - the holiday resolver hits the upstream once per year and degrades to an
//!   empty set on failure

use chrono::NaiveDate;
use httpmock::prelude::*;
use nw_md::{
    EastmoneyHistorySource, Exchange, FetchError, HolidayResolver, HolidaySource,
    NavHistorySource, QuoteSource, TencentQuoteSource, TimorHolidaySource,
};
use rust_decimal_macros::dec;

const TZ: chrono_tz::Tz = chrono_tz::Asia::Shanghai;

fn quote_body(price: &str) -> String {
    let mut fields: Vec<String> = (0..40).map(|i| i.to_string()).collect();
    fields[3] = price.to_string();
    fields[32] = "-0.01".to_string();
    format!("v_sh511880=\"{}\";\n", fields.join("~"))
}

// ---------------------------------------------------------------------------
// Holidays
// ---------------------------------------------------------------------------

#[tokio::test]
async fn holiday_year_is_fetched_and_parsed() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/holiday/year/2024");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"code":0,"holiday":{"10-01":{"holiday":true,"name":"National Day"}}}"#);
        })
        .await;

    let src = TimorHolidaySource::new_with_base_url(server.base_url()).unwrap();
    let set = src.fetch_year(2024).await.unwrap();
    m.assert_async().await;
    assert_eq!(set.get(10, 1).unwrap().name, "National Day");
}

#[tokio::test]
async fn resolver_caches_per_year() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/holiday/year/2024");
            then.status(200)
                .body(r#"{"code":0,"holiday":{"10-01":{"holiday":true,"name":"National Day"}}}"#);
        })
        .await;

    let src = TimorHolidaySource::new_with_base_url(server.base_url()).unwrap();
    let mut resolver = HolidayResolver::new(src);
    let first = resolver.resolve(2024).await;
    let second = resolver.resolve(2024).await;
    assert_eq!(first, second);
    m.assert_hits_async(1).await;
}

#[tokio::test]
async fn resolver_degrades_on_server_error() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/holiday/year/2024");
            then.status(503);
        })
        .await;

    let src = TimorHolidaySource::new_with_base_url(server.base_url()).unwrap();
    let mut resolver = HolidayResolver::new(src);
    let cal = resolver
        .calendar_for(NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(), 5)
        .await;
    m.assert_hits_async(1).await;
    // Weekend-only fallback: National Day weekday looks open.
    assert!(cal.is_trading(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()));
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[tokio::test]
async fn history_script_is_fetched_and_parsed() {
    let server = MockServer::start_async().await;
    let body = "var fS_name = \"Yinhua Money Market\";\
                var Data_netWorthTrend = [{\"x\":1728316800000,\"y\":100.0051},\
                {\"x\":1728403200000,\"y\":100.0103}];";
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/pingzhongdata/511880.js")
                .query_param_exists("t");
            then.status(200)
                .header("content-type", "application/javascript")
                .body(body);
        })
        .await;

    let src = EastmoneyHistorySource::new_with_base_url(server.base_url(), TZ).unwrap();
    let h = src.fetch_history("511880").await.unwrap();
    m.assert_async().await;
    assert_eq!(h.name, "Yinhua Money Market");
    assert_eq!(h.points[0].nav, dec!(100.0103));
    assert_eq!(h.points[0].date, NaiveDate::from_ymd_opt(2024, 10, 9).unwrap());
}

#[tokio::test]
async fn history_404_is_network_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pingzhongdata/000000.js");
            then.status(404);
        })
        .await;

    let src = EastmoneyHistorySource::new_with_base_url(server.base_url(), TZ).unwrap();
    let err = src.fetch_history("000000").await.unwrap_err();
    assert!(matches!(err, FetchError::NetworkUnavailable(_)), "{err}");
}

#[tokio::test]
async fn history_without_trend_is_format_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pingzhongdata/511880.js");
            then.status(200).body("var fS_name = \"x\";");
        })
        .await;

    let src = EastmoneyHistorySource::new_with_base_url(server.base_url(), TZ).unwrap();
    let err = src.fetch_history("511880").await.unwrap_err();
    assert!(matches!(err, FetchError::UpstreamFormat(_)), "{err}");
}

// ---------------------------------------------------------------------------
// Quote
// ---------------------------------------------------------------------------

#[tokio::test]
async fn quote_uses_exchange_prefix() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path("/q=sh511880");
            then.status(200).body(quote_body("100.004"));
        })
        .await;

    let src = TencentQuoteSource::new_with_base_url(server.base_url(), Exchange::Sh).unwrap();
    let q = src.fetch_quote("511880").await.unwrap();
    m.assert_async().await;
    assert_eq!(q.price, dec!(100.004));
    assert_eq!(q.percent_change, dec!(-0.01));
}

#[tokio::test]
async fn quote_blank_price_is_error_not_zero() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/q=sh511880");
            then.status(200).body(quote_body(""));
        })
        .await;

    let src = TencentQuoteSource::new_with_base_url(server.base_url(), Exchange::Sh).unwrap();
    assert!(matches!(
        src.fetch_quote("511880").await,
        Err(FetchError::UpstreamFormat(_))
    ));
}

#[tokio::test]
async fn quote_connection_refused_is_network_unavailable() {
    // Nothing listens on port 9 (discard) in CI sandboxes.
    let src =
        TencentQuoteSource::new_with_base_url("http://127.0.0.1:9".to_string(), Exchange::Sh)
            .unwrap();
    assert!(matches!(
        src.fetch_quote("511880").await,
        Err(FetchError::NetworkUnavailable(_))
    ));
}
