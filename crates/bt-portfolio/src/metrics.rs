//! Mark-to-market, MAE/MFE tracking, and the read-only snapshot handed to
//! strategies and the risk engine.

use std::collections::BTreeMap;

use bt_data::{Bar, Side, QTY_SCALE};
use bt_strategy::{OpenPositionSummary, PortfolioSnapshot};

use crate::types::{PortfolioState, Position};

fn pnl_price(position_side: Side, entry_price: i64, last_close: i64, qty: i64) -> i64 {
    let delta = (last_close - entry_price) as i128 * position_side.sign() as i128;
    ((delta * qty as i128) / QTY_SCALE as i128) as i64
}

/// Updates each open position's MAE/MFE against `bar.high`/`bar.low`, then
/// recomputes `unrealized_pnl` and `equity` from the current `cash` and
/// `realized_pnl_cum` per the mark-to-market identity.
pub fn mark_to_market(
    positions: &mut BTreeMap<(String, Side), Position>,
    state: &mut PortfolioState,
    bars: &BTreeMap<String, Bar>,
) {
    let mut unrealized = 0i64;
    for ((symbol, _side), pos) in positions.iter_mut() {
        let Some(bar) = bars.get(symbol) else { continue };

        let favorable = match pos.side {
            Side::Buy => bar.high,
            Side::Sell => bar.low,
        };
        let adverse = match pos.side {
            Side::Buy => bar.low,
            Side::Sell => bar.high,
        };
        if pos.side.sign() * (favorable - pos.mfe_price) > 0 {
            pos.mfe_price = favorable;
        }
        if pos.side.sign() * (adverse - pos.mae_price) < 0 {
            pos.mae_price = adverse;
        }

        unrealized += pnl_price(pos.side, pos.avg_price, bar.close, pos.qty);
    }

    state.unrealized_pnl = unrealized;
    state.equity = state.cash + state.realized_pnl_cum + state.unrealized_pnl;
}

pub fn free_margin(state: &PortfolioState) -> i64 {
    state.equity - state.margin_used
}

/// Recomputes `margin_used` as the sum of open positions' notional at their
/// average price, matching the approximation `bt_risk::apply_guardrails`
/// uses when admitting new entries.
pub fn recompute_margin_used(positions: &BTreeMap<(String, Side), Position>) -> i64 {
    positions
        .values()
        .map(|p| ((p.qty as i128 * p.avg_price as i128) / QTY_SCALE as i128) as i64)
        .sum()
}

pub fn snapshot(positions: &BTreeMap<(String, Side), Position>, state: &PortfolioState) -> PortfolioSnapshot {
    PortfolioSnapshot {
        equity: state.equity,
        cash: state.cash,
        margin_used: state.margin_used,
        open_positions: positions
            .values()
            .map(|p| OpenPositionSummary {
                symbol: p.symbol.clone(),
                side: p.side,
                qty: p.qty,
                avg_price: p.avg_price,
            })
            .collect(),
    }
}
