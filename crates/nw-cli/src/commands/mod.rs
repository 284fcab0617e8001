//! Command handlers for navwatch.
//!
//! Shared wiring (config loading, source and notifier construction) lives
//! here; command-specific logic lives in the submodules.

pub mod inspect;
pub mod run;

use anyhow::{Context, Result};
use tracing::{info, warn};

use nw_config::secrets::{resolve_secrets, ResolvedSecrets};
use nw_config::{AlertPolicyKind, LoadedConfig, MonitorConfig};
use nw_md::{EastmoneyHistorySource, Exchange, HolidayResolver, TencentQuoteSource, TimorHolidaySource};
use nw_monitor::{AlertPolicy, DiscountMonitor, MonitorSettings, SystemClock};
use nw_notify::{BarkNotifier, FeishuNotifier, NotifierSet, PushmeNotifier};

use crate::ConfigArgs;

/// Merge defaults + overlays, apply CLI overrides, validate.
pub fn load_config(args: &ConfigArgs) -> Result<(LoadedConfig, MonitorConfig)> {
    let path_refs: Vec<&str> = args.config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = nw_config::load_with_defaults(&path_refs)?;
    let mut cfg = MonitorConfig::from_json(&loaded.config_json)?;

    if let Some(code) = &args.fund {
        cfg.fund.code = code.trim().to_string();
        cfg.validate()?;
    }

    info!(
        config_hash = %loaded.config_hash,
        fund = %cfg.fund.code,
        exchange = %cfg.fund.exchange,
        policy = ?cfg.monitor.alert_policy,
        threshold_bp = %cfg.monitor.warning_discount_bp,
        "config loaded"
    );
    Ok((loaded, cfg))
}

pub fn holiday_resolver(cfg: &MonitorConfig) -> Result<HolidayResolver<TimorHolidaySource>> {
    let source = TimorHolidaySource::new_with_base_url(cfg.sources.holiday_base_url.clone())
        .context("build holiday source")?;
    Ok(HolidayResolver::new(source))
}

/// One notifier per channel that has a credential, in broadcast order.
pub fn build_notifiers(cfg: &MonitorConfig, secrets: &ResolvedSecrets) -> Result<NotifierSet> {
    let mut set = NotifierSet::new();
    let n = &cfg.notify;
    let s = &cfg.sources;

    if let Some(token) = &secrets.feishu_token {
        set.register(Box::new(FeishuNotifier::new_with_base_url(
            s.feishu_base_url.clone(),
            token.clone(),
        )?));
    }
    if let Some(key) = &secrets.pushme_key {
        set.register(Box::new(PushmeNotifier::new_with_base_url(
            s.pushme_base_url.clone(),
            key.clone(),
            n.pushme_category.clone(),
            n.pushme_icon.clone(),
        )?));
    }
    if let Some(key) = &secrets.bark_key {
        set.register(Box::new(BarkNotifier::new_with_base_url(
            s.bark_base_url.clone(),
            key.clone(),
            n.bark_group.clone(),
        )?));
    }

    if set.is_empty() {
        warn!(
            feishu = %n.channels_env.feishu,
            pushme = %n.channels_env.pushme,
            bark = %n.channels_env.bark,
            "no notification channel has credentials; alerts will only be logged"
        );
    } else {
        info!(channels = ?set.names(), "notification channels configured");
    }
    Ok(set)
}

pub fn notifiers_from_env(loaded: &LoadedConfig, cfg: &MonitorConfig) -> Result<NotifierSet> {
    let secrets = resolve_secrets(&loaded.config_json)?;
    build_notifiers(cfg, &secrets)
}

pub type LiveMonitor =
    DiscountMonitor<TimorHolidaySource, EastmoneyHistorySource, TencentQuoteSource, SystemClock>;

pub fn alert_policy(cfg: &MonitorConfig) -> Result<AlertPolicy> {
    Ok(match cfg.monitor.alert_policy {
        AlertPolicyKind::Discount => AlertPolicy::Discount {
            threshold: cfg.warning_threshold(),
        },
        AlertPolicyKind::PriceFloor => AlertPolicy::PriceFloor {
            floor: cfg
                .monitor
                .price_floor
                .context("CONFIG_INVALID: monitor.price_floor is required")?,
        },
    })
}

pub fn build_monitor(cfg: &MonitorConfig, notifiers: NotifierSet) -> Result<LiveMonitor> {
    let tz = cfg.timezone()?;
    let exchange = Exchange::parse(&cfg.fund.exchange)
        .with_context(|| format!("CONFIG_INVALID: fund.exchange '{}'", cfg.fund.exchange))?;

    let history = EastmoneyHistorySource::new_with_base_url(cfg.sources.history_base_url.clone(), tz)
        .context("build history source")?;
    let quotes = TencentQuoteSource::new_with_base_url(cfg.sources.quote_base_url.clone(), exchange)
        .context("build quote source")?;

    let settings = MonitorSettings {
        fund_code: cfg.fund.code.clone(),
        policy: alert_policy(cfg)?,
        fixed_nav: cfg.monitor.fixed_nav,
        check_interval: cfg.check_interval(),
        retry_interval: cfg.retry_interval(),
        schedule: cfg.session_schedule()?,
        title: cfg.notify.title.clone(),
    };

    Ok(DiscountMonitor::new(
        settings,
        holiday_resolver(cfg)?,
        history,
        quotes,
        notifiers,
        SystemClock::new(tz),
    ))
}
