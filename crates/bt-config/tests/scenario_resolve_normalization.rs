//! End-to-end config resolution: layered overlays resolve into a typed,
//! validated config exactly as the run_backtest CLI would see it.

use bt_config::{load_layered_yaml_from_strings, resolve, ExecutionProfile, StopResolutionMode};

#[test]
fn custom_profile_overlay_resolves_with_explicit_costs() {
    let loaded = load_layered_yaml_from_strings(&[r#"
execution:
  profile: custom
  maker_fee: 0.0
  taker_fee: 0.001
  slippage_bps: 1.0
  spread_bps: 0.5
  delay_bars: 2
"#])
    .unwrap();
    let resolved = resolve(&loaded.config_json, loaded.config_hash).unwrap();
    assert_eq!(resolved.execution.profile, ExecutionProfile::Custom);
    assert_eq!(resolved.execution.delay_bars, 2);
    assert_eq!(resolved.execution.taker_fee, 0.001);
}

#[test]
fn safe_mode_with_legacy_proxy_allowed_round_trips() {
    let loaded = load_layered_yaml_from_strings(&[r#"
risk:
  stop_resolution_mode: safe
  allow_legacy_proxy: true
"#])
    .unwrap();
    let resolved = resolve(&loaded.config_json, loaded.config_hash).unwrap();
    assert_eq!(resolved.risk.stop_resolution_mode, StopResolutionMode::Safe);
    assert!(resolved.risk.allow_legacy_proxy);
}

#[test]
fn later_overlay_wins_on_conflicting_scalar() {
    let loaded = load_layered_yaml_from_strings(&[
        r#"risk: { r_per_trade: 0.01 }"#,
        r#"risk: { r_per_trade: 0.03 }"#,
    ])
    .unwrap();
    let resolved = resolve(&loaded.config_json, loaded.config_hash).unwrap();
    assert_eq!(resolved.risk.r_per_trade, 0.03);
}

#[test]
fn default_resolved_config_uses_strict_mode_with_no_legacy_proxy() {
    let loaded = load_layered_yaml_from_strings(&["{}"]).unwrap();
    let resolved = resolve(&loaded.config_json, loaded.config_hash).unwrap();
    assert_eq!(resolved.risk.stop_resolution_mode, StopResolutionMode::Strict);
    assert!(!resolved.risk.allow_legacy_proxy);
}
