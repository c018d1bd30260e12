//! Buffers nothing itself — every writer here takes the already-buffered
//! `Vec`s a finished (or failed) run produced and flushes them to the run
//! directory in one pass. CSV is hand-built (header + rows) rather than
//! pulling in a `csv` dependency.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use bt_config::{DataConfig, ResolvedConfig};
use bt_data::is_scope_reducing;
use bt_engine::{DecisionRow, EquityRow, RunOutcome};
use bt_execution::Fill;
use bt_portfolio::Trade;

use crate::errors::ArtifactError;
use crate::types::{PerformanceReport, RunStatus, RunStatusCode, SCHEMA_VERSION};

pub fn write_config_used(dir: &Path, cfg: &ResolvedConfig) -> Result<(), ArtifactError> {
    let yaml = serde_yaml::to_string(cfg)?;
    fs::write(dir.join("config_used.yaml"), yaml)?;
    Ok(())
}

pub fn write_equity_csv(dir: &Path, rows: &[EquityRow]) -> Result<(), ArtifactError> {
    let mut out = String::from("ts,cash,equity,realized_pnl,unrealized_pnl,margin_used\n");
    for r in rows {
        out.push_str(&format!("{},{},{},{},{},{}\n", r.ts, r.cash, r.equity, r.realized_pnl_cum, r.unrealized_pnl, r.margin_used));
    }
    fs::write(dir.join("equity.csv"), out)?;
    Ok(())
}

pub fn write_trades_csv(dir: &Path, trades: &[Trade]) -> Result<(), ArtifactError> {
    let mut out = String::from(
        "entry_ts,exit_ts,symbol,side,qty,entry_price,exit_price,pnl,pnl_price,fees_paid,pnl_net,fees,slippage,mae_price,mfe_price,risk_amount,stop_distance,r_multiple_gross,r_multiple_net\n",
    );
    for t in trades {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            t.entry_ts,
            t.exit_ts,
            t.symbol,
            side_str(t.side),
            t.qty,
            t.entry_price,
            t.exit_price,
            t.pnl_price,
            t.pnl_price,
            t.fees_paid,
            t.pnl_net,
            t.fees_paid,
            t.slippage_paid,
            t.mae_price,
            t.mfe_price,
            opt(t.risk_amount),
            opt(t.stop_distance),
            opt_f(t.r_multiple_gross),
            opt_f(t.r_multiple_net),
        ));
    }
    fs::write(dir.join("trades.csv"), out)?;
    Ok(())
}

fn side_str(side: bt_data::Side) -> &'static str {
    match side {
        bt_data::Side::Buy => "buy",
        bt_data::Side::Sell => "sell",
    }
}

fn opt(v: Option<i64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn opt_f(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

pub fn write_fills_jsonl(dir: &Path, fills: &[Fill]) -> Result<(), ArtifactError> {
    let mut out = String::new();
    for f in fills {
        let row = serde_json::json!({
            "ts_filled": f.ts_filled,
            "symbol": f.symbol,
            "side": side_str(f.side),
            "qty": f.qty,
            "price": f.price,
            "fee_cost": f.fee_cost,
            "slippage_cost": f.slippage_cost,
            "spread_cost": f.spread_cost,
            "ts_created": f.metadata.ts_created,
            "reason_code": f.metadata.risk.reason_code,
        });
        out.push_str(&serde_json::to_string(&row)?);
        out.push('\n');
    }
    fs::write(dir.join("fills.jsonl"), out)?;
    Ok(())
}

pub fn write_decisions_jsonl(dir: &Path, decisions: &[DecisionRow]) -> Result<(), ArtifactError> {
    let mut out = String::new();
    for d in decisions {
        let row = serde_json::json!({
            "ts": d.ts,
            "symbol": d.symbol,
            "side": side_str(d.side),
            "accepted": d.accepted,
            "reason_code": d.reason_code,
            "metadata": d.detail,
        });
        out.push_str(&serde_json::to_string(&row)?);
        out.push('\n');
    }
    fs::write(dir.join("decisions.jsonl"), out)?;
    Ok(())
}

/// Groups trades by UTC calendar day of `entry_ts` and reports, per bucket,
/// the trade count and net-PnL expectancy (mean `pnl_net`).
pub fn write_performance_by_bucket_csv(dir: &Path, trades: &[Trade]) -> Result<(), ArtifactError> {
    const SECONDS_PER_DAY: i64 = 86_400;
    let mut buckets: BTreeMap<i64, (u64, i128)> = BTreeMap::new();
    for t in trades {
        let bucket = t.entry_ts.div_euclid(SECONDS_PER_DAY);
        let entry = buckets.entry(bucket).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += t.pnl_net as i128;
    }

    let mut out = String::from("bucket,n_trades,ev_net\n");
    for (bucket, (n, sum)) in buckets {
        let ev_net = sum as f64 / n as f64;
        out.push_str(&format!("{},{},{}\n", bucket, n, ev_net));
    }
    fs::write(dir.join("performance_by_bucket.csv"), out)?;
    Ok(())
}

pub fn write_performance_json(dir: &Path, outcome: &RunOutcome, starting_equity: i64) -> Result<(), ArtifactError> {
    let gross_pnl: i64 = outcome.trades.iter().map(|t| t.pnl_price).sum();
    let fee_total: i64 = outcome.fills.iter().map(|f| f.fee_cost).sum();
    let slippage_total: i64 = outcome.fills.iter().map(|f| f.slippage_cost).sum();
    let spread_total: i64 = outcome.fills.iter().map(|f| f.spread_cost).sum();
    let net_pnl = outcome.final_state.equity - starting_equity;

    let denom = gross_pnl.unsigned_abs().max(1) as f64;
    let fee_drag_pct = fee_total as f64 / denom;
    let slippage_drag_pct = slippage_total as f64 / denom;
    let spread_drag_pct = spread_total as f64 / denom;

    let (cagr, sharpe, max_drawdown_pct) = equity_curve_metrics(&outcome.equity_rows, starting_equity);

    let report = PerformanceReport {
        schema_version: SCHEMA_VERSION,
        final_equity: outcome.final_state.equity,
        gross_pnl,
        net_pnl,
        fee_total,
        slippage_total,
        spread_total,
        fee_drag_pct,
        slippage_drag_pct,
        spread_drag_pct,
        cagr,
        sharpe,
        max_drawdown_pct,
    };
    fs::write(dir.join("performance.json"), serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

/// CAGR/Sharpe/max-drawdown from the buffered equity curve. Sharpe here is
/// the unannualized mean/stddev of step-over-step returns: the base feed's
/// bar spacing isn't fixed across runs (any base timeframe is supported),
/// so picking a bars-per-year annualization constant would bake in an
/// assumption the engine itself doesn't make.
fn equity_curve_metrics(rows: &[EquityRow], starting_equity: i64) -> (f64, f64, f64) {
    if rows.is_empty() || starting_equity <= 0 {
        return (0.0, 0.0, 0.0);
    }

    let final_equity = rows.last().unwrap().equity;
    let years = (rows.last().unwrap().ts - rows.first().unwrap().ts) as f64 / (365.25 * 86_400.0);
    let cagr = if years > 0.0 {
        (final_equity as f64 / starting_equity as f64).powf(1.0 / years) - 1.0
    } else {
        0.0
    };

    let mut returns = Vec::with_capacity(rows.len());
    let mut prev = starting_equity as f64;
    for r in rows {
        if prev != 0.0 {
            returns.push((r.equity as f64 - prev) / prev);
        }
        prev = r.equity as f64;
    }
    let sharpe = if returns.len() > 1 {
        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
        let stddev = variance.sqrt();
        if stddev > 0.0 {
            mean / stddev
        } else {
            0.0
        }
    } else {
        0.0
    };

    let mut peak = starting_equity as f64;
    let mut max_drawdown_pct = 0.0f64;
    for r in rows {
        let equity = r.equity as f64;
        if equity > peak {
            peak = equity;
        }
        let drawdown = (peak - equity) / peak;
        if drawdown > max_drawdown_pct {
            max_drawdown_pct = drawdown;
        }
    }

    (cagr, sharpe, max_drawdown_pct)
}

pub fn write_data_scope_json(dir: &Path, data_cfg: &DataConfig) -> Result<(), ArtifactError> {
    if !is_scope_reducing(data_cfg) {
        return Ok(());
    }
    fs::write(dir.join("data_scope.json"), serde_json::to_string_pretty(data_cfg)?)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn write_run_status(
    dir: &Path,
    cfg: &ResolvedConfig,
    outcome: &RunOutcome,
    run_id: &str,
) -> Result<(), ArtifactError> {
    let mut stop_resolution_counts: BTreeMap<String, u64> = BTreeMap::new();
    for d in &outcome.decisions {
        if d.accepted {
            *stop_resolution_counts.entry(d.reason_code.clone()).or_insert(0) += 1;
        }
    }

    let notes = match &outcome.liquidation_reason {
        Some(reason) => vec![format!("run ended via {reason}")],
        None => Vec::new(),
    };

    let status = RunStatus {
        schema_version: SCHEMA_VERSION,
        status: RunStatusCode::Pass,
        error_type: None,
        error_message: None,
        traceback: None,
        run_id: run_id.to_string(),
        execution_profile: format!("{:?}", cfg.execution.profile).to_lowercase(),
        effective_execution: serde_json::to_value(cfg.execution)?,
        spread_mode: format!("{:?}", cfg.execution.spread_mode).to_lowercase(),
        intrabar_mode: format!("{:?}", cfg.execution.intrabar_mode).to_lowercase(),
        stop_resolution: format!("{:?}", cfg.risk.stop_resolution_mode).to_lowercase(),
        used_legacy_stop_proxy: outcome.used_legacy_stop_proxy,
        r_metrics_valid: !outcome.used_legacy_stop_proxy,
        stop_resolution_counts,
        notes,
        stop_contract: None,
    };
    fs::write(dir.join("run_status.json"), serde_json::to_string_pretty(&status)?)?;
    Ok(())
}

/// Best-effort failure path: written when the run never
/// produced a `RunOutcome` at all, so every field beyond the error
/// description is left empty/default rather than fabricated.
pub fn write_run_status_failure(dir: &Path, run_id: &str, error_type: &str, error_message: &str) -> Result<(), ArtifactError> {
    fs::create_dir_all(dir)?;
    let status = RunStatus {
        schema_version: SCHEMA_VERSION,
        status: RunStatusCode::Fail,
        error_type: Some(error_type.to_string()),
        error_message: Some(error_message.to_string()),
        traceback: None,
        run_id: run_id.to_string(),
        execution_profile: String::new(),
        effective_execution: serde_json::Value::Null,
        spread_mode: String::new(),
        intrabar_mode: String::new(),
        stop_resolution: String::new(),
        used_legacy_stop_proxy: false,
        r_metrics_valid: false,
        stop_resolution_counts: BTreeMap::new(),
        notes: Vec::new(),
        stop_contract: None,
    };
    fs::write(dir.join("run_status.json"), serde_json::to_string_pretty(&status)?)?;
    Ok(())
}

/// Writes every unconditional artifact plus the conditional ones that apply,
/// for a run that completed successfully. The caller still calls
/// [`write_run_status`] itself so it can thread the resolved `run_id`
/// through whatever else needs it (e.g. CLI stdout summary).
pub fn write_all(dir: &Path, cfg: &ResolvedConfig, outcome: &RunOutcome, run_id: &str) -> Result<(), ArtifactError> {
    fs::create_dir_all(dir)?;
    write_config_used(dir, cfg)?;
    write_equity_csv(dir, &outcome.equity_rows)?;
    write_trades_csv(dir, &outcome.trades)?;
    write_fills_jsonl(dir, &outcome.fills)?;
    write_decisions_jsonl(dir, &outcome.decisions)?;
    write_performance_json(dir, outcome, cfg.portfolio.starting_equity)?;
    write_performance_by_bucket_csv(dir, &outcome.trades)?;
    write_data_scope_json(dir, &cfg.data)?;
    write_run_status(dir, cfg, outcome, run_id)?;
    Ok(())
}
