//! tcal-config
//!
//! Layered YAML configuration for the calendar engine.
//!
//! Documents merge in order (later overrides earlier), `TCAL_*` environment
//! overrides apply on top, and the result is rendered as canonical JSON and
//! hashed with sha256 so two runs can prove they used the same settings.
//!
//! ```yaml
//! defaults:
//!   download: "https://example.com/defaults.json,12h"
//!   auto_url: null
//!   auto_period_secs: 86400
//!   fetch_timeout_ms: 10000
//! registry:
//!   max_entries: 256
//! log:
//!   filter: "info"
//! ```

use std::fs;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tcal_defaults::{DownloadConfig, ManagerOptions};
use tcal_registry::RegistryOptions;

pub const ENV_DEFAULTS_DOWNLOAD: &str = "TCAL_DEFAULTS_DOWNLOAD";
pub const ENV_REGISTRY_MAX_ENTRIES: &str = "TCAL_REGISTRY_MAX_ENTRIES";
pub const ENV_LOG: &str = "TCAL_LOG";

// ---------------------------------------------------------------------------
// Typed config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsSection {
    /// Download config string applied at startup; see `DownloadConfig`.
    pub download: String,
    pub auto_url: Option<String>,
    pub auto_period_secs: u64,
    pub fetch_timeout_ms: u64,
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            download: String::new(),
            auto_url: None,
            auto_period_secs: 24 * 3600,
            fetch_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrySection {
    pub max_entries: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    pub filter: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub defaults: DefaultsSection,
    pub registry: RegistrySection,
    pub log: LogSection,
}

impl EngineConfig {
    pub fn manager_options(&self) -> ManagerOptions {
        ManagerOptions {
            auto_url: self.defaults.auto_url.clone(),
            auto_period: Duration::from_secs(self.defaults.auto_period_secs),
        }
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            max_entries: self.registry.max_entries,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.defaults.fetch_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        DownloadConfig::parse(&self.defaults.download)
            .with_context(|| "CONFIG_INVALID leaf=/defaults/download")?;
        if self.defaults.fetch_timeout_ms == 0 {
            bail!("CONFIG_INVALID leaf=/defaults/fetch_timeout_ms: must be > 0");
        }
        if self.defaults.auto_period_secs == 0 {
            bail!("CONFIG_INVALID leaf=/defaults/auto_period_secs: must be > 0");
        }
        if self.registry.max_entries == Some(0) {
            bail!("CONFIG_INVALID leaf=/registry/max_entries: must be > 0 or null");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
    pub config: EngineConfig,
}

/// Read and merge YAML files, applying overrides from the process
/// environment.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }
    let doc_refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_with_env(&doc_refs, |key| std::env::var(key).ok())
}

/// Merge YAML documents without consulting the environment.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    load_layered_yaml_with_env(yaml_docs, |_| None)
}

/// Merge YAML documents, then apply `TCAL_*` overrides read through `env`.
pub fn load_layered_yaml_with_env<F>(yaml_docs: &[&str], env: F) -> Result<LoadedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        // An empty document decodes as null; treat it as an empty layer.
        if !v_json.is_null() {
            merged = deep_merge(merged, v_json);
        }
    }
    let merged = apply_env_overrides(merged, env)?;

    let config: EngineConfig =
        serde_json::from_value(merged.clone()).context("config does not match schema")?;
    config.validate()?;

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
        config,
    })
}

/// Apply `TCAL_DEFAULTS_DOWNLOAD`, `TCAL_REGISTRY_MAX_ENTRIES` and `TCAL_LOG`.
///
/// An empty `TCAL_REGISTRY_MAX_ENTRIES` means unbounded.
pub fn apply_env_overrides<F>(config: Value, env: F) -> Result<Value>
where
    F: Fn(&str) -> Option<String>,
{
    let mut overlay = serde_json::json!({});
    if let Some(download) = env(ENV_DEFAULTS_DOWNLOAD) {
        overlay["defaults"]["download"] = Value::String(download);
    }
    if let Some(max) = env(ENV_REGISTRY_MAX_ENTRIES) {
        let value = match max.trim() {
            "" => Value::Null,
            n => {
                let parsed: u64 = n
                    .parse()
                    .with_context(|| format!("{ENV_REGISTRY_MAX_ENTRIES}={max} is not a number"))?;
                Value::from(parsed)
            }
        };
        overlay["registry"]["max_entries"] = value;
    }
    if let Some(filter) = env(ENV_LOG) {
        overlay["log"]["filter"] = Value::String(filter);
    }
    Ok(deep_merge(config, overlay))
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json's default map is ordered by key, so serialization is canonical.
    serde_json::to_string(v).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let loaded = load_layered_yaml_from_strings(&["{}"]).unwrap();
        assert_eq!(loaded.config, EngineConfig::default());
        assert_eq!(loaded.config.log.filter, "info");
        assert_eq!(loaded.config.registry_options().max_entries, None);
    }

    #[test]
    fn deep_merge_overrides_leaves_only() {
        let merged = deep_merge(
            serde_json::json!({"a": {"x": 1, "y": 2}}),
            serde_json::json!({"a": {"y": 3}}),
        );
        assert_eq!(merged, serde_json::json!({"a": {"x": 1, "y": 3}}));
    }
}
