//! Notification-channel secret resolution.
//!
//! This module is the single place that reads credential env vars.
//!
//! # Contract
//! - Config YAML stores only env var NAMES (`notify.channels_env.*`).
//! - Callers invoke [`resolve_secrets`] once at startup (after the dotenv
//!   bootstrap) and pass the result into notifier constructors.
//! - `Debug` on [`ResolvedSecrets`] redacts values.
//! - Error messages name the env var, never its value.
//!
//! # Enforcement
//! Every channel is optional unless listed in `notify.required`; a required
//! channel without a credential fails with SECRETS_MISSING.

use anyhow::{bail, Result};
use serde_json::Value;

/// Channel identifiers accepted in `notify.required`.
pub const CHANNELS: &[&str] = &["feishu", "pushme", "bark"];

#[derive(Clone, Default)]
pub struct ResolvedSecrets {
    /// Feishu custom-bot webhook token (last path segment of the hook URL).
    pub feishu_token: Option<String>,
    /// PushMe push key.
    pub pushme_key: Option<String>,
    /// Bark device key.
    pub bark_key: Option<String>,
}

impl ResolvedSecrets {
    /// Channel names that have a credential, in broadcast order.
    pub fn configured_channels(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.feishu_token.is_some() {
            out.push("feishu");
        }
        if self.pushme_key.is_some() {
            out.push("pushme");
        }
        if self.bark_key.is_some() {
            out.push("bark");
        }
        out
    }
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field(
                "feishu_token",
                &self.feishu_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("pushme_key", &self.pushme_key.as_ref().map(|_| "<REDACTED>"))
            .field("bark_key", &self.bark_key.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

struct SecretEnvNames {
    feishu_var: String,
    pushme_var: String,
    bark_var: String,
}

/// Non-empty trimmed string at `pointer`, if any.
fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `None` if the variable is unset or blank.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn parse_env_names(config_json: &Value) -> SecretEnvNames {
    SecretEnvNames {
        feishu_var: read_str_at(config_json, "/notify/channels_env/feishu")
            .unwrap_or_else(|| "FEISHU_WEBHOOK_TOKEN".to_string()),
        pushme_var: read_str_at(config_json, "/notify/channels_env/pushme")
            .unwrap_or_else(|| "PUSHME_PUSH_KEY".to_string()),
        bark_var: read_str_at(config_json, "/notify/channels_env/bark")
            .unwrap_or_else(|| "BARK_KEY".to_string()),
    }
}

fn required_channels(config_json: &Value) -> Result<Vec<String>> {
    let Some(list) = config_json.pointer("/notify/required") else {
        return Ok(Vec::new());
    };
    let Some(items) = list.as_array() else {
        bail!("SECRETS_CONFIG_INVALID: notify.required must be a list");
    };

    let mut out = Vec::new();
    for item in items {
        let name = item.as_str().unwrap_or_default().trim().to_ascii_lowercase();
        if !CHANNELS.contains(&name.as_str()) {
            bail!(
                "SECRETS_UNKNOWN_CHANNEL: '{}' in notify.required; expected one of: {}",
                item,
                CHANNELS.join(" | ")
            );
        }
        out.push(name);
    }
    Ok(out)
}

/// Resolve channel credentials from the environment.
///
/// # Errors
/// SECRETS_MISSING naming the env var of the first required channel whose
/// credential is absent; SECRETS_UNKNOWN_CHANNEL for a bad `notify.required`.
pub fn resolve_secrets(config_json: &Value) -> Result<ResolvedSecrets> {
    let names = parse_env_names(config_json);
    let required = required_channels(config_json)?;

    let secrets = ResolvedSecrets {
        feishu_token: resolve_env(&names.feishu_var),
        pushme_key: resolve_env(&names.pushme_var),
        bark_key: resolve_env(&names.bark_var),
    };

    for channel in &required {
        let (present, var) = match channel.as_str() {
            "feishu" => (secrets.feishu_token.is_some(), &names.feishu_var),
            "pushme" => (secrets.pushme_key.is_some(), &names.pushme_var),
            _ => (secrets.bark_key.is_some(), &names.bark_var),
        };
        if !present {
            bail!(
                "SECRETS_MISSING: required env var '{}' ({} channel) is not set or empty",
                var,
                channel
            );
        }
    }

    Ok(secrets)
}
