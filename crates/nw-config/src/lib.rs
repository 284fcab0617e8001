//! nw-config
//!
//! Layered YAML configuration for the monitor.
//!
//! # Layers
//! 1. [`DEFAULT_CONFIG_YAML`]: the built-in table (fund, threshold, intervals,
//!    sessions, upstream URLs, env-var names of channel credentials).
//! 2. Zero or more operator YAML files, merged in order; later files win.
//!
//! The merged document is canonicalized and hashed so each run can log the
//! exact configuration it used. Literal secrets are rejected: YAML carries
//! env-var NAMES only; values are resolved by [`secrets`].

pub mod secrets;
pub mod settings;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;

pub use settings::{AlertPolicyKind, MonitorConfig, DEFAULT_CONFIG_YAML};

/// Leaf strings starting with one of these are credentials, not env-var
/// names, and abort loading with CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "https://open.feishu.cn/open-apis/bot/v2/hook/",
    "https://api.day.app/",
    "https://push.i-i.me/?push_key=",
    "-----BEGIN",
    "sk-",
    "ghp_",
];

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

/// Built-in defaults overlaid with the YAML files at `paths`.
pub fn load_with_defaults(paths: &[&str]) -> Result<LoadedConfig> {
    let overlays = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}")))
        .collect::<Result<Vec<_>>>()?;

    let mut docs = vec![DEFAULT_CONFIG_YAML];
    docs.extend(overlays.iter().map(String::as_str));
    load_layered_yaml_from_strings(&docs)
}

/// Merge YAML documents in order (later wins), reject literal secrets,
/// canonicalize and hash.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Map::new());
    for (idx, raw) in yaml_docs.iter().enumerate() {
        let doc: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml in layer {idx}"))?;
        if doc.is_null() {
            continue;
        }
        let doc = serde_json::to_value(doc)
            .with_context(|| format!("layer {idx} is not representable as json"))?;
        overlay(&mut merged, doc);
    }

    if let Some(pointer) = find_secret_literal(&merged, String::new()) {
        bail!("CONFIG_SECRET_DETECTED leaf={pointer} value=REDACTED");
    }

    // serde_json::Map is ordered by key, so this serialization is canonical.
    let canonical_json = serde_json::to_string(&merged).context("config serialize failed")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key by key; anything else is replaced wholesale.
fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base_map), Value::Object(top_map)) => {
            for (key, top_val) in top_map {
                match base_map.get_mut(&key) {
                    Some(slot) => overlay(slot, top_val),
                    None => {
                        base_map.insert(key, top_val);
                    }
                }
            }
        }
        (slot, top) => *slot = top,
    }
}

/// JSON pointer of the first leaf that looks like a credential.
fn find_secret_literal(v: &Value, at: String) -> Option<String> {
    match v {
        Value::String(s) if looks_like_secret(s) => Some(if at.is_empty() { "/".into() } else { at }),
        Value::Object(map) => map.iter().find_map(|(k, child)| {
            let token = k.replace('~', "~0").replace('/', "~1");
            find_secret_literal(child, format!("{at}/{token}"))
        }),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, child)| find_secret_literal(child, format!("{at}/{i}"))),
        _ => None,
    }
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    SECRET_PREFIXES
        .iter()
        .any(|p| t.len() > p.len() && t.starts_with(p))
}
