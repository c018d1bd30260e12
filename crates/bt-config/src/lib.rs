mod errors;
mod merge;
mod resolve;
mod types;

pub use errors::ConfigError;
pub use merge::{canonicalize_json, deep_merge, sha256_hex};
pub use resolve::resolve;
pub use types::*;

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;

/// A deep-merged, canonicalized, hashed config tree prior to normalization.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_json: Value,
    pub canonical_json: String,
    pub config_hash: String,
}

/// Load and deep-merge YAML overlays from disk, in the given order. Later
/// files override earlier files.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let sources: Result<Vec<String>> = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("read config: {p}")))
        .collect();
    load_layered_yaml_from_strings(&sources?.iter().map(String::as_str).collect::<Vec<_>>())
}

/// Same as [`load_layered_yaml`] but takes YAML source text directly, which
/// is how the test suite and anything composing overlays in memory drives it.
pub fn load_layered_yaml_from_strings(sources: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());

    for (idx, s) in sources.iter().enumerate() {
        let yaml_val: serde_yaml::Value =
            serde_yaml::from_str(s).with_context(|| format!("parse yaml overlay #{idx}"))?;
        let json_val = serde_json::to_value(yaml_val).context("yaml->json conversion failed")?;
        deep_merge(&mut merged, json_val);
    }

    let canonical = canonicalize_json(&merged);
    let hash = sha256_hex(canonical.as_bytes());

    Ok(LoadedConfig {
        config_json: serde_json::from_str(&canonical).context("canonical json parse failed")?,
        canonical_json: canonical,
        config_hash: hash,
    })
}

/// Load, merge, and resolve a full layered config in one call — the entry
/// point `bt-cli` and `bt-engine::run` use.
pub fn load_and_resolve(paths: &[&str]) -> Result<ResolvedConfig> {
    let loaded = load_layered_yaml(paths)?;
    let resolved = resolve(&loaded.config_json, loaded.config_hash).map_err(anyhow::Error::from)?;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolving_a_resolved_config_is_a_fixed_point() {
        let loaded = load_layered_yaml_from_strings(&[
            r#"
execution:
  profile: tier1
risk:
  r_per_trade: 0.02
  stop_resolution_mode: safe
  allow_legacy_proxy: true
"#,
        ])
        .unwrap();
        let resolved = resolve(&loaded.config_json, loaded.config_hash.clone()).unwrap();

        // Re-serialize the resolved config and resolve it again: normalization
        // of an already-normalized tree must be idempotent.
        let as_value = serde_json::to_value(&resolved).unwrap();
        let resolved_again = resolve(&as_value, loaded.config_hash).unwrap();

        assert_eq!(resolved.execution, resolved_again.execution);
        assert_eq!(resolved.risk, resolved_again.risk);
        assert_eq!(resolved.strategy, resolved_again.strategy);
        assert_eq!(resolved.htf_resampler, resolved_again.htf_resampler);
        assert_eq!(resolved.benchmark, resolved_again.benchmark);
    }
}
