use bt_config::{HybridPolicy as ConfigHybridPolicy, RiskConfig};
use bt_data::{Bar, Side, PRICE_SCALE, QTY_SCALE};
use bt_strategy::{HybridPolicy, IndicatorRegistry, OpenPositionSummary, PortfolioSnapshot, Signal, StopSpec, StopSpecKind};

use crate::types::{OrderIntent, OrderIntentMetadata, OrderType, RejectReason, RejectedDecision, StopResolutionResult};

fn to_config_hybrid_policy(p: HybridPolicy) -> ConfigHybridPolicy {
    match p {
        HybridPolicy::Wider => ConfigHybridPolicy::Wider,
        HybridPolicy::Tighter => ConfigHybridPolicy::Tighter,
    }
}

/// Step 1 of the entry path: turn a `Signal`'s loosely-typed stop intent
/// into a normalized `StopSpec`, applying the safe/strict/legacy-proxy
/// precedence rules.
pub fn normalize_stop_spec(signal: &Signal, cfg: &RiskConfig) -> Result<StopSpec, RejectReason> {
    if let Some(spec) = &signal.metadata.stop_spec {
        return Ok(spec.clone());
    }
    if let Some(stop_price) = signal.metadata.stop_price {
        return Ok(StopSpec::explicit(stop_price, "signal.stop_price"));
    }

    match cfg.stop_resolution_mode {
        bt_config::StopResolutionMode::Strict => Err(RejectReason::StopUnresolvableStrict),
        bt_config::StopResolutionMode::Safe => {
            if cfg.allow_legacy_proxy {
                Ok(StopSpec {
                    kind: StopSpecKind::LegacyProxy,
                    stop_price: None,
                    structural_stop: None,
                    atr_multiple: None,
                    atr_indicator: None,
                    hybrid_policy: None,
                    hybrid_components: Vec::new(),
                    raw_source: "legacy_proxy:prev_bar".to_string(),
                })
            } else {
                Err(RejectReason::StopUnresolvableSafeNoProxy)
            }
        }
    }
}

/// Step 2: resolve a normalized `StopSpec` into a concrete stop distance,
/// given the signal's side, entry price, and the previous bar (for
/// `legacy_proxy`). `global_hybrid_policy` applies only when the spec itself
/// does not carry a `hybrid_policy`.
pub fn resolve_stop_distance(
    side: Side,
    entry_price: i64,
    prev_bar: Option<&Bar>,
    spec: &StopSpec,
    symbol: &str,
    indicators: &dyn IndicatorRegistry,
    global_hybrid_policy: ConfigHybridPolicy,
) -> Result<StopResolutionResult, RejectReason> {
    match spec.kind {
        StopSpecKind::Explicit => {
            let stop_price = spec.stop_price.ok_or(RejectReason::InvalidStopDirection)?;
            check_direction(side, entry_price, stop_price)?;
            Ok(StopResolutionResult {
                stop_price,
                stop_distance: (entry_price - stop_price).abs(),
                stop_source: StopSpecKind::Explicit,
                is_valid: true,
                used_fallback: false,
                reason_code: "resolved_explicit".to_string(),
                details: spec.raw_source.clone(),
            })
        }
        StopSpecKind::Structural => {
            let stop_price = spec.structural_stop.ok_or(RejectReason::InvalidStopDirection)?;
            check_direction(side, entry_price, stop_price)?;
            Ok(StopResolutionResult {
                stop_price,
                stop_distance: (entry_price - stop_price).abs(),
                stop_source: StopSpecKind::Structural,
                is_valid: true,
                used_fallback: false,
                reason_code: "resolved_structural".to_string(),
                details: spec.raw_source.clone(),
            })
        }
        StopSpecKind::Atr => {
            let atr_multiple = spec.atr_multiple.unwrap_or(1.0);
            let indicator_name = spec.atr_indicator.as_deref().unwrap_or("atr_14");
            let atr = indicators.read(indicator_name, symbol).ok_or(RejectReason::IndicatorNotReady)?;
            let stop_distance = ((atr_multiple * atr) * PRICE_SCALE as f64).round() as i64;
            let stop_price = entry_price - side.sign() * stop_distance;
            Ok(StopResolutionResult {
                stop_price,
                stop_distance,
                stop_source: StopSpecKind::Atr,
                is_valid: true,
                used_fallback: false,
                reason_code: "resolved_atr".to_string(),
                details: format!("{indicator_name}*{atr_multiple}"),
            })
        }
        StopSpecKind::Hybrid => {
            if spec.hybrid_components.is_empty() {
                return Err(RejectReason::InvalidStopDirection);
            }
            let mut resolved = Vec::with_capacity(spec.hybrid_components.len());
            for component in &spec.hybrid_components {
                resolved.push(resolve_stop_distance(side, entry_price, prev_bar, component, symbol, indicators, global_hybrid_policy)?);
            }
            let policy = spec.hybrid_policy.unwrap_or(match global_hybrid_policy {
                ConfigHybridPolicy::Wider => HybridPolicy::Wider,
                ConfigHybridPolicy::Tighter => HybridPolicy::Tighter,
            });
            let chosen = match policy {
                HybridPolicy::Wider => resolved.into_iter().max_by_key(|r| r.stop_distance).unwrap(),
                HybridPolicy::Tighter => resolved.into_iter().min_by_key(|r| r.stop_distance).unwrap(),
            };
            Ok(StopResolutionResult {
                stop_price: chosen.stop_price,
                stop_distance: chosen.stop_distance,
                stop_source: StopSpecKind::Hybrid,
                is_valid: true,
                used_fallback: chosen.used_fallback,
                reason_code: "resolved_hybrid".to_string(),
                details: format!("{:?}:{}", to_config_hybrid_policy(policy), chosen.details),
            })
        }
        StopSpecKind::LegacyProxy => {
            let prev = prev_bar.ok_or(RejectReason::PrevBarUnavailable)?;
            let stop_price = match side {
                Side::Buy => prev.low,
                Side::Sell => prev.high,
            };
            Ok(StopResolutionResult {
                stop_price,
                stop_distance: (entry_price - stop_price).abs(),
                stop_source: StopSpecKind::LegacyProxy,
                is_valid: true,
                used_fallback: true,
                reason_code: "fallback_legacy_proxy".to_string(),
                details: "prev_bar".to_string(),
            })
        }
    }
}

fn check_direction(side: Side, entry_price: i64, stop_price: i64) -> Result<(), RejectReason> {
    let ok = match side {
        Side::Buy => stop_price < entry_price,
        Side::Sell => stop_price > entry_price,
    };
    if ok {
        Ok(())
    } else {
        Err(RejectReason::InvalidStopDirection)
    }
}

/// Step 3: equity-percent R-based sizing, rounded down to the contract lot.
/// Returns `qty` in `QTY_SCALE` units, or `None` when the rounded quantity
/// is zero.
pub fn size_position(equity: i64, r_per_trade: f64, stop_distance: i64, contract_lot_size: f64) -> Option<i64> {
    if stop_distance <= 0 {
        return None;
    }
    let risk_amount = (equity as f64 * r_per_trade).round() as i64;
    let qty_raw = (risk_amount as i128 * QTY_SCALE as i128) / stop_distance as i128;
    let lot_scaled = ((contract_lot_size * QTY_SCALE as f64).round() as i128).max(1);
    let qty = ((qty_raw / lot_scaled) * lot_scaled) as i64;
    if qty > 0 {
        Some(qty)
    } else {
        None
    }
}

pub fn risk_amount(equity: i64, r_per_trade: f64) -> i64 {
    (equity as f64 * r_per_trade).round() as i64
}

/// Step 4: the three ordered guardrails. First failure rejects.
pub fn apply_guardrails(
    symbol: &str,
    side: Side,
    qty: i64,
    entry_price: i64,
    cfg: &RiskConfig,
    portfolio: &PortfolioSnapshot,
) -> Result<(), RejectReason> {
    let already_open = portfolio
        .open_positions
        .iter()
        .any(|p: &OpenPositionSummary| p.symbol == symbol && p.side == side);
    if !already_open && portfolio.open_positions.len() as u32 >= cfg.max_positions {
        return Err(RejectReason::MaxPositions);
    }

    let notional = (qty as i128 * entry_price as i128) / QTY_SCALE as i128;
    let notional_cap = (cfg.max_notional_pct_equity * portfolio.equity as f64) as i128;
    if notional > notional_cap {
        return Err(RejectReason::NotionalCap);
    }

    let margin_after = portfolio.margin_used as i128 + notional;
    let free_margin_after = portfolio.equity as i128 - margin_after;
    let maintenance_floor = (cfg.maintenance_free_margin_pct * portfolio.equity as f64) as i128;
    if free_margin_after < maintenance_floor {
        return Err(RejectReason::InsufficientMargin);
    }

    Ok(())
}

/// Full entry-path evaluation for one signal. Exit-like signals must be
/// handled by the caller via the reduce-only short-circuit before ever
/// reaching this function.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_entry_signal(
    signal: &Signal,
    entry_price: i64,
    prev_bar: Option<&Bar>,
    cfg: &RiskConfig,
    indicators: &dyn IndicatorRegistry,
    portfolio: &PortfolioSnapshot,
    delay_bars: u32,
) -> Result<OrderIntent, RejectedDecision> {
    let reject = |reason: RejectReason, detail: String| RejectedDecision {
        ts: signal.ts,
        symbol: signal.symbol.clone(),
        side: signal.side,
        reason,
        detail,
    };

    let spec = normalize_stop_spec(signal, cfg).map_err(|r| reject(r.clone(), r.to_string()))?;

    let resolution = resolve_stop_distance(
        signal.side,
        entry_price,
        prev_bar,
        &spec,
        &signal.symbol,
        indicators,
        cfg.hybrid_policy,
    )
    .map_err(|r| reject(r.clone(), r.to_string()))?;

    let min_distance = (cfg.min_stop_distance * PRICE_SCALE as f64).max(cfg.min_stop_distance_pct * entry_price as f64);
    if (resolution.stop_distance as f64) < min_distance {
        return Err(reject(RejectReason::MinStopDistance, format!("stop_distance={} < {}", resolution.stop_distance, min_distance)));
    }

    let qty = size_position(portfolio.equity, cfg.r_per_trade, resolution.stop_distance, cfg.contract_lot_size)
        .ok_or_else(|| reject(RejectReason::SizingZeroQty, "rounded qty == 0".to_string()))?;

    apply_guardrails(&signal.symbol, signal.side, qty, entry_price, cfg, portfolio).map_err(|r| reject(r.clone(), r.to_string()))?;

    Ok(OrderIntent {
        ts_created: signal.ts,
        symbol: signal.symbol.clone(),
        side: signal.side,
        order_type: OrderType::Market,
        qty,
        metadata: OrderIntentMetadata {
            risk_amount: risk_amount(portfolio.equity, cfg.r_per_trade),
            stop_distance: resolution.stop_distance,
            stop_source: resolution.stop_source,
            stop_details: resolution.details.clone(),
            r_metrics_valid: !resolution.used_fallback,
            used_legacy_stop_proxy: matches!(resolution.stop_source, StopSpecKind::LegacyProxy),
            stop_resolution_mode: cfg.stop_resolution_mode,
            delay_remaining: delay_bars,
            reason_code: resolution.reason_code,
        },
    })
}
