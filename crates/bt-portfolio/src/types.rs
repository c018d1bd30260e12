use bt_data::Side;
use bt_risk::OrderIntentMetadata;

/// One open position per `(symbol, side)`. Opposite-side fills
/// reduce/close this before ever flipping to a new position on the other
/// side.
#[derive(Clone, Debug, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    pub qty: i64,
    pub avg_price: i64,
    pub open_ts: i64,
    pub accumulated_fees: i64,
    pub accumulated_slippage: i64,
    pub realized_pnl_on_closes: i64,
    pub metadata: OrderIntentMetadata,
    /// Most favorable/adverse price observed since `open_ts`, tracked from
    /// each step's bar `high`/`low` against the position's side.
    pub mae_price: i64,
    pub mfe_price: i64,
}

/// A closed round-trip. `r_multiple_gross`/`r_multiple_net`
/// are `None` whenever the opening intent's `risk_amount` was absent or
/// `r_metrics_valid` was false (the legacy-proxy fallback case).
#[derive(Clone, Debug, PartialEq)]
pub struct Trade {
    pub entry_ts: i64,
    pub exit_ts: i64,
    pub symbol: String,
    pub side: Side,
    pub qty: i64,
    pub entry_price: i64,
    pub exit_price: i64,
    pub pnl_price: i64,
    pub fees_paid: i64,
    pub slippage_paid: i64,
    pub pnl_net: i64,
    pub mae_price: i64,
    pub mfe_price: i64,
    pub risk_amount: Option<i64>,
    pub stop_distance: Option<i64>,
    pub r_multiple_gross: Option<f64>,
    pub r_multiple_net: Option<f64>,
}

/// Portfolio state. `equity = cash + realized_pnl_cum +
/// unrealized_pnl` is maintained as an invariant by every mutating method
/// in this crate, never recomputed ad hoc downstream.
#[derive(Clone, Debug, PartialEq)]
pub struct PortfolioState {
    pub cash: i64,
    pub equity: i64,
    pub realized_pnl_cum: i64,
    pub unrealized_pnl: i64,
    pub margin_used: i64,
}

impl PortfolioState {
    pub fn new(starting_equity: i64) -> Self {
        Self {
            cash: starting_equity,
            equity: starting_equity,
            realized_pnl_cum: 0,
            unrealized_pnl: 0,
            margin_used: 0,
        }
    }
}
