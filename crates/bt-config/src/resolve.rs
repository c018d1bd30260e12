use serde_json::Value;
use std::collections::BTreeSet;

use crate::errors::ConfigError;
use crate::types::*;

fn ptr<'a>(root: &'a Value, p: &str) -> Option<&'a Value> {
    root.pointer(p)
}

fn as_f64(v: &Value, field: &str) -> Result<f64, ConfigError> {
    v.as_f64().ok_or_else(|| ConfigError::TypeMismatch {
        field: field.to_string(),
        expected: "a number".to_string(),
    })
}

fn as_u64(v: &Value, field: &str) -> Result<u64, ConfigError> {
    v.as_u64().ok_or_else(|| ConfigError::TypeMismatch {
        field: field.to_string(),
        expected: "a non-negative integer".to_string(),
    })
}

fn as_str<'a>(v: &'a Value, field: &str) -> Result<&'a str, ConfigError> {
    v.as_str().ok_or_else(|| ConfigError::TypeMismatch {
        field: field.to_string(),
        expected: "a string".to_string(),
    })
}

fn as_bool(v: &Value, field: &str) -> Result<bool, ConfigError> {
    v.as_bool().ok_or_else(|| ConfigError::TypeMismatch {
        field: field.to_string(),
        expected: "a boolean".to_string(),
    })
}

fn bounds(field: &str, value: f64, lo: f64, hi: f64, lo_inclusive: bool, hi_inclusive: bool) -> Result<(), ConfigError> {
    let lo_ok = if lo_inclusive { value >= lo } else { value > lo };
    let hi_ok = if hi_inclusive { value <= hi } else { value < hi };
    if lo_ok && hi_ok {
        Ok(())
    } else {
        Err(ConfigError::BoundsViolation {
            field: field.to_string(),
            value: value.to_string(),
            bound: format!(
                "{}{lo}, {hi}{}",
                if lo_inclusive { "[" } else { "(" },
                if hi_inclusive { "]" } else { ")" }
            ),
        })
    }
}

fn resolve_execution(merged: &Value) -> Result<ExecutionConfig, ConfigError> {
    let profile_str = ptr(merged, "/execution/profile")
        .map(|v| as_str(v, "execution.profile"))
        .transpose()?
        .unwrap_or("tier2");

    let explicit_fields = ["maker_fee", "taker_fee", "slippage_bps", "spread_bps", "delay_bars"];
    let any_explicit_set = |field: &str| ptr(merged, &format!("/execution/{field}")).is_some();

    let (profile, values) = match profile_str {
        "tier1" | "tier2" | "tier3" => {
            for field in explicit_fields {
                if any_explicit_set(field) {
                    return Err(ConfigError::TierConflict {
                        profile: profile_str.to_string(),
                        field: field.to_string(),
                    });
                }
            }
            let (profile, values) = match profile_str {
                "tier1" => (ExecutionProfile::Tier1, TIER1),
                "tier2" => (ExecutionProfile::Tier2, TIER2),
                _ => (ExecutionProfile::Tier3, TIER3),
            };
            (profile, values)
        }
        "custom" => {
            for field in explicit_fields {
                if !any_explicit_set(field) {
                    return Err(ConfigError::CustomMissingField { field: field.to_string() });
                }
            }
            let values = TierValues {
                maker_fee: as_f64(ptr(merged, "/execution/maker_fee").unwrap(), "execution.maker_fee")?,
                taker_fee: as_f64(ptr(merged, "/execution/taker_fee").unwrap(), "execution.taker_fee")?,
                slippage_bps: as_f64(ptr(merged, "/execution/slippage_bps").unwrap(), "execution.slippage_bps")?,
                spread_bps: as_f64(ptr(merged, "/execution/spread_bps").unwrap(), "execution.spread_bps")?,
                delay_bars: as_u64(ptr(merged, "/execution/delay_bars").unwrap(), "execution.delay_bars")? as u32,
            };
            (ExecutionProfile::Custom, values)
        }
        other => {
            return Err(ConfigError::TypeMismatch {
                field: "execution.profile".to_string(),
                expected: format!("one of tier1|tier2|tier3|custom, got {other}"),
            })
        }
    };

    let intrabar_mode = match ptr(merged, "/execution/intrabar_mode").map(|v| as_str(v, "execution.intrabar_mode")).transpose()? {
        Some("worst_case") | None => IntrabarMode::WorstCase,
        Some("best_case") => IntrabarMode::BestCase,
        Some("midpoint") => IntrabarMode::Midpoint,
        Some(other) => {
            return Err(ConfigError::TypeMismatch {
                field: "execution.intrabar_mode".to_string(),
                expected: format!("one of worst_case|best_case|midpoint, got {other}"),
            })
        }
    };

    let spread_mode = match ptr(merged, "/execution/spread_mode").map(|v| as_str(v, "execution.spread_mode")).transpose()? {
        Some("fixed_bps") | None => SpreadMode::FixedBps,
        Some("none") => SpreadMode::None,
        Some(other) => {
            return Err(ConfigError::TypeMismatch {
                field: "execution.spread_mode".to_string(),
                expected: format!("one of fixed_bps|none, got {other}"),
            })
        }
    };

    Ok(ExecutionConfig {
        profile,
        maker_fee: values.maker_fee,
        taker_fee: values.taker_fee,
        slippage_bps: values.slippage_bps,
        spread_bps: values.spread_bps,
        delay_bars: values.delay_bars,
        intrabar_mode,
        spread_mode,
    })
}

fn resolve_risk(merged: &Value) -> Result<RiskConfig, ConfigError> {
    let direct_mode = ptr(merged, "/risk/stop_resolution_mode")
        .map(|v| as_str(v, "risk.stop_resolution_mode"))
        .transpose()?;
    let direct_allow_legacy = ptr(merged, "/risk/allow_legacy_proxy")
        .map(|v| as_bool(v, "risk.allow_legacy_proxy"))
        .transpose()?;
    let legacy_alias = ptr(merged, "/risk/stop_resolution")
        .map(|v| as_str(v, "risk.stop_resolution"))
        .transpose()?;

    let (mode, allow_legacy_proxy) = match legacy_alias {
        Some("strict") => {
            if direct_mode.is_some_and(|m| m != "strict") || direct_allow_legacy == Some(true) {
                return Err(ConfigError::StopModeConflict {
                    detail: "risk.stop_resolution=strict contradicts risk.stop_resolution_mode/allow_legacy_proxy".to_string(),
                });
            }
            (StopResolutionMode::Strict, false)
        }
        Some("allow_legacy_proxy") => {
            if direct_mode.is_some_and(|m| m != "safe") || direct_allow_legacy == Some(false) {
                return Err(ConfigError::StopModeConflict {
                    detail: "risk.stop_resolution=allow_legacy_proxy contradicts risk.stop_resolution_mode/allow_legacy_proxy".to_string(),
                });
            }
            (StopResolutionMode::Safe, true)
        }
        Some(other) => {
            return Err(ConfigError::TypeMismatch {
                field: "risk.stop_resolution".to_string(),
                expected: format!("one of strict|allow_legacy_proxy, got {other}"),
            })
        }
        None => {
            let mode = match direct_mode {
                Some("safe") => StopResolutionMode::Safe,
                Some("strict") | None => StopResolutionMode::Strict,
                Some(other) => {
                    return Err(ConfigError::TypeMismatch {
                        field: "risk.stop_resolution_mode".to_string(),
                        expected: format!("one of safe|strict, got {other}"),
                    })
                }
            };
            let allow = direct_allow_legacy.unwrap_or(false);
            (mode, allow)
        }
    };

    if mode == StopResolutionMode::Strict && allow_legacy_proxy {
        return Err(ConfigError::StopModeConflict {
            detail: "strict mode cannot be combined with allow_legacy_proxy=true".to_string(),
        });
    }

    let r_per_trade = ptr(merged, "/risk/r_per_trade")
        .map(|v| as_f64(v, "risk.r_per_trade"))
        .transpose()?
        .unwrap_or(0.01);
    bounds("risk.r_per_trade", r_per_trade, 0.0, 1.0, false, true)?;

    let min_stop_distance = ptr(merged, "/risk/min_stop_distance")
        .map(|v| as_f64(v, "risk.min_stop_distance"))
        .transpose()?
        .unwrap_or(0.0);

    let min_stop_distance_pct = ptr(merged, "/risk/min_stop_distance_pct")
        .map(|v| as_f64(v, "risk.min_stop_distance_pct"))
        .transpose()?
        .unwrap_or(0.0);
    bounds("risk.min_stop_distance_pct", min_stop_distance_pct, 0.0, 1.0, true, true)?;

    let max_notional_pct_equity = ptr(merged, "/risk/max_notional_pct_equity")
        .map(|v| as_f64(v, "risk.max_notional_pct_equity"))
        .transpose()?
        .unwrap_or(1.0);
    bounds("risk.max_notional_pct_equity", max_notional_pct_equity, 0.0, 10.0, false, true)?;

    let maintenance_free_margin_pct = ptr(merged, "/risk/maintenance_free_margin_pct")
        .map(|v| as_f64(v, "risk.maintenance_free_margin_pct"))
        .transpose()?
        .unwrap_or(0.0);
    bounds(
        "risk.maintenance_free_margin_pct",
        maintenance_free_margin_pct,
        0.0,
        1.0,
        true,
        true,
    )?;

    let max_positions = ptr(merged, "/risk/max_positions")
        .map(|v| as_u64(v, "risk.max_positions"))
        .transpose()?
        .unwrap_or(10) as u32;

    let contract_lot_size = ptr(merged, "/risk/contract_lot_size")
        .map(|v| as_f64(v, "risk.contract_lot_size"))
        .transpose()?
        .unwrap_or(1e-8);

    let hybrid_policy = match ptr(merged, "/risk/hybrid_policy").map(|v| as_str(v, "risk.hybrid_policy")).transpose()? {
        Some("wider") | None => HybridPolicy::Wider,
        Some("tighter") => HybridPolicy::Tighter,
        Some(other) => {
            return Err(ConfigError::TypeMismatch {
                field: "risk.hybrid_policy".to_string(),
                expected: format!("one of wider|tighter, got {other}"),
            })
        }
    };

    Ok(RiskConfig {
        stop_resolution_mode: mode,
        allow_legacy_proxy,
        r_per_trade,
        min_stop_distance,
        min_stop_distance_pct,
        max_notional_pct_equity,
        maintenance_free_margin_pct,
        max_positions,
        contract_lot_size,
        hybrid_policy,
    })
}

fn string_vec(v: &Value, field: &str) -> Result<Vec<String>, ConfigError> {
    v.as_array()
        .ok_or_else(|| ConfigError::TypeMismatch {
            field: field.to_string(),
            expected: "an array of strings".to_string(),
        })?
        .iter()
        .map(|e| as_str(e, field).map(|s| s.to_string()))
        .collect()
}

fn resolve_data(merged: &Value) -> Result<DataConfig, ConfigError> {
    let subset = ptr(merged, "/data/symbols_subset")
        .map(|v| string_vec(v, "data.symbols_subset"))
        .transpose()?;
    let alias = ptr(merged, "/data/symbols")
        .map(|v| string_vec(v, "data.symbols"))
        .transpose()?;

    let symbols_subset = match (subset, alias) {
        (Some(a), Some(b)) => {
            let set_a: BTreeSet<_> = a.iter().cloned().collect();
            let set_b: BTreeSet<_> = b.iter().cloned().collect();
            if set_a != set_b {
                return Err(ConfigError::AliasConflict {
                    canonical: "data.symbols_subset".to_string(),
                    alias: "data.symbols".to_string(),
                });
            }
            Some(a)
        }
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    };

    let max_symbols = ptr(merged, "/data/max_symbols")
        .map(|v| as_u64(v, "data.max_symbols"))
        .transpose()?
        .map(|n| n as usize);

    let date_range = match ptr(merged, "/data/date_range") {
        Some(v) => {
            let start = as_str(
                ptr(v, "/start").ok_or_else(|| ConfigError::TypeMismatch {
                    field: "data.date_range.start".to_string(),
                    expected: "present".to_string(),
                })?,
                "data.date_range.start",
            )?
            .to_string();
            let end = as_str(
                ptr(v, "/end").ok_or_else(|| ConfigError::TypeMismatch {
                    field: "data.date_range.end".to_string(),
                    expected: "present".to_string(),
                })?,
                "data.date_range.end",
            )?
            .to_string();
            Some(DateRange { start, end })
        }
        None => None,
    };

    let row_limit_per_symbol = ptr(merged, "/data/row_limit_per_symbol")
        .map(|v| as_u64(v, "data.row_limit_per_symbol"))
        .transpose()?
        .map(|n| n as usize);

    let chunksize = ptr(merged, "/data/chunksize")
        .map(|v| as_u64(v, "data.chunksize"))
        .transpose()?
        .map(|n| n as usize);

    Ok(DataConfig {
        symbols_subset,
        max_symbols,
        date_range,
        row_limit_per_symbol,
        chunksize,
    })
}

fn resolve_strategy(merged: &Value) -> Result<StrategyConfig, ConfigError> {
    let policy = match ptr(merged, "/strategy/signal_conflict_policy")
        .map(|v| as_str(v, "strategy.signal_conflict_policy"))
        .transpose()?
    {
        Some("reject") | None => SignalConflictPolicy::Reject,
        Some("first_wins") => SignalConflictPolicy::FirstWins,
        Some("last_wins") => SignalConflictPolicy::LastWins,
        Some("net_out") => SignalConflictPolicy::NetOut,
        Some(other) => {
            return Err(ConfigError::TypeMismatch {
                field: "strategy.signal_conflict_policy".to_string(),
                expected: format!("one of reject|first_wins|last_wins|net_out, got {other}"),
            })
        }
    };
    Ok(StrategyConfig { signal_conflict_policy: policy })
}

fn resolve_htf(merged: &Value) -> Result<HtfResamplerConfig, ConfigError> {
    let block_was_present = ptr(merged, "/htf_resampler").is_some();

    let mut timeframes = match ptr(merged, "/htf_resampler/timeframes") {
        Some(v) => string_vec(v, "htf_resampler.timeframes")?,
        None => Vec::new(),
    };
    let mut strict = match ptr(merged, "/htf_resampler/strict") {
        Some(v) => as_bool(v, "htf_resampler.strict")?,
        None => true,
    };

    if let Some(tf) = ptr(merged, "/data/timeframe") {
        let tf = as_str(tf, "data.timeframe")?.to_string();
        timeframes = vec![tf];
        if !block_was_present {
            strict = true;
        }
    }

    Ok(HtfResamplerConfig { timeframes, strict })
}

fn resolve_benchmark(merged: &Value) -> Result<BenchmarkConfig, ConfigError> {
    let enabled = ptr(merged, "/benchmark/enabled")
        .map(|v| as_bool(v, "benchmark.enabled"))
        .transpose()?
        .unwrap_or(false);
    Ok(BenchmarkConfig { enabled })
}

/// Mirrors `bt_data::PRICE_SCALE`. Duplicated rather than imported: `bt-data`
/// depends on `bt-config`, not the other way around, and a single scale
/// constant isn't worth a shared crate.
const PRICE_SCALE: f64 = 1_000_000.0;

fn resolve_portfolio(merged: &Value) -> Result<PortfolioConfig, ConfigError> {
    let starting_equity = ptr(merged, "/portfolio/starting_equity")
        .map(|v| as_f64(v, "portfolio.starting_equity"))
        .transpose()?
        .unwrap_or(10_000.0);
    bounds("portfolio.starting_equity", starting_equity, 0.0, f64::MAX, false, true)?;
    Ok(PortfolioConfig {
        starting_equity: (starting_equity * PRICE_SCALE).round() as i64,
    })
}

/// Normalize a deep-merged config tree into the resolved, validated form.
/// `config_hash` is the SHA-256 of the canonical pre-resolution tree, computed
/// by the caller and threaded through here so resolution stays a pure function
/// of the merged value plus that one provenance string.
pub fn resolve(merged: &Value, config_hash: String) -> Result<ResolvedConfig, ConfigError> {
    Ok(ResolvedConfig {
        execution: resolve_execution(merged)?,
        risk: resolve_risk(merged)?,
        data: resolve_data(merged)?,
        strategy: resolve_strategy(merged)?,
        htf_resampler: resolve_htf(merged)?,
        benchmark: resolve_benchmark(merged)?,
        portfolio: resolve_portfolio(merged)?,
        config_hash,
    })
}
