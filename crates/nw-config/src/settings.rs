//! Typed view of the merged configuration.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use nw_calendar::SessionSchedule;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Built-in configuration table. Operator YAML files are merged on top.
pub const DEFAULT_CONFIG_YAML: &str = r#"
fund:
  code: "511880"
  exchange: "sh"

monitor:
  # discount: alert on new discount highs at or above warning_discount_bp.
  # price_floor: alert on new price lows under price_floor.
  alert_policy: "discount"
  # Alert when (projected NAV - price) / projected NAV reaches this many basis points (‱).
  warning_discount_bp: 0.5
  # price_floor: 99.993
  # Skip history and compare against this NAV instead.
  # fixed_nav: 100.0029
  check_interval_secs: 30
  retry_interval_secs: 30
  timezone: "Asia/Shanghai"
  sessions:
    morning_start: "09:30"
    morning_end: "11:30"
    afternoon_start: "13:00"
    afternoon_end: "15:00"

notify:
  pushme_category: "arbitrage"
  pushme_icon: "😀"
  bark_group: "navwatch"
  # Channels that must have credentials; empty = best effort.
  required: []
  channels_env:
    feishu: "FEISHU_WEBHOOK_TOKEN"
    pushme: "PUSHME_PUSH_KEY"
    bark: "BARK_KEY"

sources:
  holiday_base_url: "https://timor.tech"
  history_base_url: "https://fund.eastmoney.com"
  quote_base_url: "https://qt.gtimg.cn"
  feishu_base_url: "https://open.feishu.cn"
  pushme_base_url: "https://push.i-i.me"
  bark_base_url: "https://api.day.app"
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub fund: FundSettings,
    pub monitor: MonitorSettings,
    pub notify: NotifySettings,
    pub sources: SourceSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundSettings {
    pub code: String,
    pub exchange: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPolicyKind {
    #[default]
    Discount,
    PriceFloor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    #[serde(default)]
    pub alert_policy: AlertPolicyKind,
    pub warning_discount_bp: Decimal,
    #[serde(default)]
    pub price_floor: Option<Decimal>,
    #[serde(default)]
    pub fixed_nav: Option<Decimal>,
    pub check_interval_secs: u64,
    pub retry_interval_secs: u64,
    pub timezone: String,
    pub sessions: SessionSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub morning_start: String,
    pub morning_end: String,
    pub afternoon_start: String,
    pub afternoon_end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifySettings {
    /// Overrides the `<fund name> discount` title.
    #[serde(default)]
    pub title: Option<String>,
    pub pushme_category: String,
    pub pushme_icon: String,
    pub bark_group: String,
    #[serde(default)]
    pub required: Vec<String>,
    pub channels_env: ChannelEnvNames,
}

/// Env-var NAMES holding channel credentials (never the values).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEnvNames {
    pub feishu: String,
    pub pushme: String,
    pub bark: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    pub holiday_base_url: String,
    pub history_base_url: String,
    pub quote_base_url: String,
    pub feishu_base_url: String,
    pub pushme_base_url: String,
    pub bark_base_url: String,
}

impl MonitorConfig {
    /// Deserialize and validate a merged config document.
    pub fn from_json(config_json: &Value) -> Result<Self> {
        let cfg: MonitorConfig = serde_json::from_value(config_json.clone())
            .context("CONFIG_INVALID: config does not match the expected shape")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Built-in defaults only.
    pub fn defaults() -> Result<Self> {
        let loaded = crate::load_layered_yaml_from_strings(&[DEFAULT_CONFIG_YAML])?;
        Self::from_json(&loaded.config_json)
    }

    pub fn validate(&self) -> Result<()> {
        let code = self.fund.code.trim();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
            bail!("CONFIG_INVALID: fund.code '{}' must be digits", self.fund.code);
        }
        if !matches!(self.fund.exchange.trim().to_ascii_lowercase().as_str(), "sh" | "sz") {
            bail!(
                "CONFIG_INVALID: fund.exchange '{}' must be sh | sz",
                self.fund.exchange
            );
        }
        if self.monitor.warning_discount_bp < Decimal::ZERO {
            bail!("CONFIG_INVALID: monitor.warning_discount_bp must be >= 0");
        }
        match (self.monitor.alert_policy, self.monitor.price_floor) {
            (AlertPolicyKind::PriceFloor, None) => {
                bail!("CONFIG_INVALID: monitor.price_floor is required when alert_policy is price_floor")
            }
            (AlertPolicyKind::PriceFloor, Some(floor)) if floor <= Decimal::ZERO => {
                bail!("CONFIG_INVALID: monitor.price_floor must be > 0")
            }
            (AlertPolicyKind::Discount, Some(_)) => {
                bail!("CONFIG_INVALID: monitor.price_floor is only used when alert_policy is price_floor")
            }
            _ => {}
        }
        if matches!(self.monitor.fixed_nav, Some(nav) if nav <= Decimal::ZERO) {
            bail!("CONFIG_INVALID: monitor.fixed_nav must be > 0");
        }
        if self.monitor.check_interval_secs == 0 || self.monitor.retry_interval_secs == 0 {
            bail!("CONFIG_INVALID: monitor intervals must be > 0 seconds");
        }
        self.timezone()?;
        let schedule = self.session_schedule()?;
        if !schedule.is_ordered() {
            bail!("CONFIG_INVALID: monitor.sessions boundaries must be strictly increasing");
        }
        Ok(())
    }

    /// Warning threshold as a fraction (0.5‱ → 0.00005).
    pub fn warning_threshold(&self) -> Decimal {
        self.monitor.warning_discount_bp / Decimal::from(10_000)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.check_interval_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.retry_interval_secs)
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.monitor
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("CONFIG_INVALID: monitor.timezone: {e}"))
    }

    pub fn session_schedule(&self) -> Result<SessionSchedule> {
        let s = &self.monitor.sessions;
        Ok(SessionSchedule {
            morning_start: parse_hm(&s.morning_start, "morning_start")?,
            morning_end: parse_hm(&s.morning_end, "morning_end")?,
            afternoon_start: parse_hm(&s.afternoon_start, "afternoon_start")?,
            afternoon_end: parse_hm(&s.afternoon_end, "afternoon_end")?,
        })
    }
}

fn parse_hm(raw: &str, field: &str) -> Result<NaiveTime> {
    let t = raw.trim();
    NaiveTime::parse_from_str(t, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
        .map_err(|_| anyhow!("CONFIG_INVALID: monitor.sessions.{field} '{raw}' is not HH:MM"))
}
