//! The per-timestep loop: feed → delayed fills → indicator
//! update → strategy → conflict resolution → risk evaluation → execution
//! submission → mark-to-market → row emission → liquidation check.

use std::collections::{BTreeMap, VecDeque};

use bt_config::ResolvedConfig;
use bt_data::{Bar, DataFeed, HtfBar};
use bt_execution::ExecutionEngine;
use bt_portfolio::Portfolio;
use bt_risk::{evaluate_entry_signal, AtrRegistry};
use bt_strategy::{resolve_signal_conflicts, BarHistory, Signal, Strategy, StrategyContext};

use crate::errors::EngineError;
use crate::types::{DecisionRow, EquityRow, RunOutcome};

/// The one concrete indicator stream the engine keeps warmed every bar.
/// Strategies that need a different ATR period than the default 14 aren't
/// served by this — the workspace carries a single indicator registry, not
/// a general-purpose plugin system.
const DEFAULT_ATR_NAME: &str = "atr_14";

/// Caps per-symbol history retention so a very long run doesn't grow this
/// buffer unbounded; large enough that no `tests/scenario_*` lookback window
/// comes close to it.
const LOOKBACK_CAP: usize = 4096;

struct History {
    bars: BTreeMap<String, VecDeque<Bar>>,
}

impl History {
    fn new() -> Self {
        Self { bars: BTreeMap::new() }
    }

    fn prev_bar(&self, symbol: &str) -> Option<&Bar> {
        self.bars.get(symbol).and_then(|v| v.back())
    }

    fn record(&mut self, symbol: &str, bar: Bar) {
        let v = self.bars.entry(symbol.to_string()).or_default();
        v.push_back(bar);
        if v.len() > LOOKBACK_CAP {
            v.pop_front();
        }
    }
}

impl BarHistory for History {
    fn lookback(&self, symbol: &str, n: usize) -> Vec<Bar> {
        match self.bars.get(symbol) {
            Some(v) => {
                let mut out: Vec<Bar> = v.iter().rev().take(n).cloned().collect();
                out.reverse();
                out
            }
            None => Vec::new(),
        }
    }
}

/// Runs one full backtest to completion. Fatal on the first config/data/
/// strategy-contract/portfolio error; otherwise always reaches end-of-run
/// liquidation and returns a complete `RunOutcome`.
pub fn run(mut feed: DataFeed, strategy: &mut dyn Strategy, cfg: &ResolvedConfig) -> Result<RunOutcome, EngineError> {
    let mut portfolio = Portfolio::new(cfg.portfolio.starting_equity);
    let mut exec = ExecutionEngine::new(cfg.execution);
    let mut atrs = AtrRegistry::new();
    let mut history = History::new();
    let mut htf_store: BTreeMap<String, BTreeMap<String, HtfBar>> = BTreeMap::new();
    let mut last_known_bars: BTreeMap<String, Bar> = BTreeMap::new();

    let mut equity_rows = Vec::new();
    let mut decisions = Vec::new();
    let mut fills = Vec::new();
    let mut used_legacy_stop_proxy = false;
    let mut last_ts: Option<i64> = None;
    let mut liquidation_reason: Option<String> = None;

    while let Some(step) = feed.next() {
        let ts = step.ts;
        last_ts = Some(ts);

        let queued_fills = exec.step(ts, &step.bars)?;
        for fill in &queued_fills {
            portfolio.apply_fill(fill)?;
        }
        fills.extend(queued_fills);

        for (symbol, bar) in &step.bars {
            atrs.update(DEFAULT_ATR_NAME, symbol, bar);
        }

        for (tf, per_symbol) in step.htf_bars {
            htf_store.entry(tf).or_default().extend(per_symbol);
        }

        let tradeable_universe: Vec<String> = step.bars.keys().cloned().collect();
        let portfolio_snapshot = portfolio.snapshot();
        let ctx = StrategyContext {
            portfolio: &portfolio_snapshot,
            indicators: &atrs,
            htf_bars: &htf_store,
            history: &history,
        };
        let signals = strategy.on_bars(ts, &step.bars, &tradeable_universe, &ctx);
        let resolved = resolve_signal_conflicts(signals, cfg.strategy.signal_conflict_policy)?;

        for signal in resolved {
            if signal.is_exit() {
                handle_exit(&signal, &mut portfolio, &mut exec, cfg, &mut decisions);
                continue;
            }

            let Some(bar) = step.bars.get(&signal.symbol) else {
                tracing::debug!(symbol = %signal.symbol, ts, "entry signal for symbol with no bar this step, skipped");
                continue;
            };
            let entry_price = bar.close;
            let prev_bar = history.prev_bar(&signal.symbol);
            let snapshot = portfolio.snapshot();

            match evaluate_entry_signal(&signal, entry_price, prev_bar, &cfg.risk, &atrs, &snapshot, cfg.execution.delay_bars) {
                Ok(intent) => {
                    if intent.metadata.used_legacy_stop_proxy {
                        used_legacy_stop_proxy = true;
                    }
                    decisions.push(DecisionRow {
                        ts,
                        symbol: signal.symbol.clone(),
                        side: signal.side,
                        accepted: true,
                        reason_code: intent.metadata.reason_code.clone(),
                        detail: intent.metadata.stop_details.clone(),
                    });
                    exec.submit(intent);
                }
                Err(rejected) => {
                    tracing::debug!(symbol = %rejected.symbol, ts, reason = %rejected.reason, "risk rejected signal");
                    decisions.push(DecisionRow {
                        ts,
                        symbol: rejected.symbol,
                        side: rejected.side,
                        accepted: false,
                        reason_code: rejected.reason.to_string(),
                        detail: rejected.detail,
                    });
                }
            }
        }

        portfolio.mark_to_market(&step.bars)?;
        equity_rows.push(EquityRow::from_state(ts, portfolio.state()));

        if portfolio.free_margin() < 0 {
            tracing::warn!(ts, free_margin = portfolio.free_margin(), "forced liquidation: negative free margin");
            let liq_fills = portfolio.liquidate_all(&cfg.execution, &step.bars, ts, "liquidation:negative_free_margin")?;
            if !liq_fills.is_empty() {
                fills.extend(liq_fills);
                liquidation_reason = Some("liquidation:negative_free_margin".to_string());
                equity_rows.push(EquityRow::from_state(ts, portfolio.state()));
            }
        }

        for (symbol, bar) in step.bars {
            last_known_bars.insert(symbol.clone(), bar.clone());
            history.record(&symbol, bar);
        }
    }

    if let Some(ts) = last_ts {
        if portfolio.open_positions().count() > 0 {
            tracing::warn!(ts, "forced liquidation: end of run");
            let liq_fills = portfolio.liquidate_all(&cfg.execution, &last_known_bars, ts, "liquidation:end_of_run")?;
            fills.extend(liq_fills);
            liquidation_reason = Some("liquidation:end_of_run".to_string());
            equity_rows.push(EquityRow::from_state(ts, portfolio.state()));
        }
    }

    Ok(RunOutcome {
        equity_rows,
        decisions,
        fills,
        trades: portfolio.trades().to_vec(),
        final_state: portfolio.state().clone(),
        used_legacy_stop_proxy,
        liquidation_reason,
    })
}

/// Exit-like signals bypass the risk engine entirely: close
/// whatever's open on `signal.side`, if anything is. `signal.side` names the
/// position being exited, so the closing order runs in the opposite
/// direction.
fn handle_exit(
    signal: &Signal,
    portfolio: &mut Portfolio,
    exec: &mut ExecutionEngine,
    cfg: &ResolvedConfig,
    decisions: &mut Vec<DecisionRow>,
) {
    let qty = portfolio
        .open_positions()
        .find(|p| p.symbol == signal.symbol && p.side == signal.side)
        .map(|p| p.qty);

    let Some(qty) = qty else {
        tracing::debug!(symbol = %signal.symbol, ts = signal.ts, "exit signal with no matching open position, skipped");
        return;
    };

    let intent = bt_risk::OrderIntent::reduce_only(signal.ts, signal.symbol.clone(), signal.side.opposite(), qty, cfg.execution.delay_bars);
    decisions.push(DecisionRow {
        ts: signal.ts,
        symbol: signal.symbol.clone(),
        side: signal.side,
        accepted: true,
        reason_code: "resolved_exit".to_string(),
        detail: "reduce_only".to_string(),
    });
    exec.submit(intent);
}
