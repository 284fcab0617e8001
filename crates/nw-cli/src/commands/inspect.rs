//! Read-only commands: `estimate`, `check-day`, `config-hash`.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};

use nw_calendar::MAX_SCAN_DAYS;
use nw_notify::NotifierSet;

use super::{build_monitor, holiday_resolver, load_config};
use crate::ConfigArgs;

pub async fn estimate(args: &ConfigArgs) -> Result<()> {
    let (_loaded, cfg) = load_config(args)?;
    let mut monitor = build_monitor(&cfg, NotifierSet::new())?;

    let (snapshot, projection) = monitor
        .bootstrap()
        .await
        .with_context(|| format!("estimate failed for fund {}", cfg.fund.code))?;

    println!("fund={} name={}", snapshot.fund_code, snapshot.fund_name);
    println!(
        "latest_nav={:.4} latest_nav_date={}",
        snapshot.latest_nav, snapshot.latest_nav_date
    );
    println!("daily_growth={}", snapshot.estimated_daily_growth);
    println!(
        "next_estimated_date={} earn_days={}",
        projection.next_estimated_date, projection.earn_days
    );
    println!("next_estimated_nav={:.4}", projection.next_estimated_nav);
    Ok(())
}

pub async fn check_day(args: &ConfigArgs, date: Option<NaiveDate>) -> Result<()> {
    let (_loaded, cfg) = load_config(args)?;
    let tz = cfg.timezone()?;
    let date = date.unwrap_or_else(|| Utc::now().with_timezone(&tz).date_naive());

    let mut resolver = holiday_resolver(&cfg)?;
    let calendar = resolver.calendar_for(date, MAX_SCAN_DAYS).await;
    let verdict = calendar.classify(date);

    println!(
        "date={} trading={} reason={}",
        date, verdict.is_trading, verdict.reason
    );
    let next = calendar.next_trading_date(date)?;
    println!("next_trading_date={next}");
    Ok(())
}

pub fn config_hash(args: &ConfigArgs) -> Result<()> {
    let (loaded, _cfg) = load_config(args)?;
    println!("config_hash={}", loaded.config_hash);
    println!("{}", loaded.canonical_json);
    Ok(())
}
