use bt_data::Side;
use bt_execution::Fill;
use bt_portfolio::{PortfolioState, Trade};

/// One row of `equity.csv`, emitted once per timestep after mark-to-market.
#[derive(Clone, Debug, PartialEq)]
pub struct EquityRow {
    pub ts: i64,
    pub cash: i64,
    pub equity: i64,
    pub realized_pnl_cum: i64,
    pub unrealized_pnl: i64,
    pub margin_used: i64,
}

impl EquityRow {
    pub fn from_state(ts: i64, state: &PortfolioState) -> Self {
        Self {
            ts,
            cash: state.cash,
            equity: state.equity,
            realized_pnl_cum: state.realized_pnl_cum,
            unrealized_pnl: state.unrealized_pnl,
            margin_used: state.margin_used,
        }
    }
}

/// One row of `decisions.jsonl`: the outcome of evaluating a
/// single resolved signal, whether accepted into the execution queue or
/// rejected by the risk engine.
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionRow {
    pub ts: i64,
    pub symbol: String,
    pub side: Side,
    pub accepted: bool,
    pub reason_code: String,
    pub detail: String,
}

/// Everything a run produced, handed back to `bt-cli` for artifact writing.
/// `bt_engine::run` only ever returns this on success; on a fatal error the
/// caller gets an `EngineError` with no partial outcome — only
/// `run_status.json` is written best-effort in that case, by the CLI
/// catching the error directly rather than by threading partial state back
/// through this type.
pub struct RunOutcome {
    pub equity_rows: Vec<EquityRow>,
    pub decisions: Vec<DecisionRow>,
    pub fills: Vec<Fill>,
    pub trades: Vec<Trade>,
    pub final_state: PortfolioState,
    /// True once any accepted intent ever used `legacy_proxy` stop
    /// resolution; recorded for `run_status.json` provenance.
    pub used_legacy_stop_proxy: bool,
    pub liquidation_reason: Option<String>,
}
