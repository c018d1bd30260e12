//! Fill application: open/extend same-side, reduce/close/flip opposite-side.

use std::collections::BTreeMap;

use bt_data::{Side, QTY_SCALE};
use bt_execution::Fill;

use crate::errors::PortfolioError;
use crate::types::{PortfolioState, Position, Trade};

fn notional(qty: i64, price: i64) -> Result<i64, ()> {
    let n = (qty as i128 * price as i128) / QTY_SCALE as i128;
    if n > i64::MAX as i128 || n < i64::MIN as i128 {
        Err(())
    } else {
        Ok(n as i64)
    }
}

fn pnl_price(position_side: Side, entry_price: i64, exit_price: i64, qty: i64) -> Result<i64, ()> {
    let delta = (exit_price - entry_price) as i128 * position_side.sign() as i128;
    let p = (delta * qty as i128) / QTY_SCALE as i128;
    if p > i64::MAX as i128 || p < i64::MIN as i128 {
        Err(())
    } else {
        Ok(p as i64)
    }
}

/// Applies one fill to `positions`/`state`, returning a `Trade` if the fill
/// closed some or all of an opposite-side position.
///
/// Order of operations:
/// 1. Fee always debits cash immediately.
/// 2. If an opposite-side position exists, reduce it first (emitting a
///    Trade for the reduced portion); any residual fill quantity then
///    opens/extends a same-side position at the fill price.
/// 3. Otherwise the fill simply opens/extends the same-side position.
pub fn apply_fill(
    positions: &mut BTreeMap<(String, Side), Position>,
    state: &mut PortfolioState,
    fill: &Fill,
) -> Result<Option<Trade>, PortfolioError> {
    if fill.qty <= 0 {
        return Err(PortfolioError::NonPositiveFillQty { symbol: fill.symbol.clone(), qty: fill.qty });
    }

    state.cash -= fill.fee_cost;

    let opposite_key = (fill.symbol.clone(), fill.side.opposite());
    let mut trade = None;
    let mut residual_qty = fill.qty;

    if let Some(mut opp) = positions.remove(&opposite_key) {
        let reduce_qty = residual_qty.min(opp.qty);
        let pnl = pnl_price(opp.side, opp.avg_price, fill.price, reduce_qty)
            .map_err(|_| PortfolioError::Overflow { symbol: fill.symbol.clone(), ts: fill.ts_filled })?;

        // Apportion the closed position's accumulated entry fee/slippage
        // pro-rata to the quantity being closed here, so a position closed
        // across multiple partial fills doesn't re-report the same entry
        // cost on every resulting `Trade`.
        let apportioned_fees = ((opp.accumulated_fees as i128 * reduce_qty as i128) / opp.qty as i128) as i64;
        let apportioned_slippage = ((opp.accumulated_slippage as i128 * reduce_qty as i128) / opp.qty as i128) as i64;

        opp.realized_pnl_on_closes += pnl;
        state.realized_pnl_cum += pnl;
        residual_qty -= reduce_qty;

        let fees_paid = apportioned_fees + fill.fee_cost;
        let slippage_paid = apportioned_slippage + fill.slippage_cost;

        trade = Some(Trade {
            entry_ts: opp.open_ts,
            exit_ts: fill.ts_filled,
            symbol: fill.symbol.clone(),
            side: opp.side,
            qty: reduce_qty,
            entry_price: opp.avg_price,
            exit_price: fill.price,
            pnl_price: pnl,
            fees_paid,
            slippage_paid,
            pnl_net: pnl - fees_paid,
            mae_price: opp.mae_price,
            mfe_price: opp.mfe_price,
            risk_amount: if opp.metadata.r_metrics_valid { Some(opp.metadata.risk_amount) } else { None },
            stop_distance: if opp.metadata.r_metrics_valid { Some(opp.metadata.stop_distance) } else { None },
            r_multiple_gross: r_multiple(&opp, pnl),
            r_multiple_net: r_multiple(&opp, pnl - fees_paid),
        });

        opp.accumulated_fees -= apportioned_fees;
        opp.accumulated_slippage -= apportioned_slippage;
        opp.qty -= reduce_qty;
        if opp.qty < 0 {
            return Err(PortfolioError::NegativeQtyInvariant { symbol: opp.symbol.clone(), qty: opp.qty });
        }
        if opp.qty > 0 {
            positions.insert(opposite_key, opp);
        }
    }

    if residual_qty > 0 {
        let key = (fill.symbol.clone(), fill.side);
        match positions.get_mut(&key) {
            Some(pos) => {
                let total_cost = notional(pos.qty, pos.avg_price)
                    .and_then(|a| notional(residual_qty, fill.price).map(|b| a as i128 + b as i128))
                    .map_err(|_| PortfolioError::Overflow { symbol: fill.symbol.clone(), ts: fill.ts_filled })?;
                let total_qty = pos.qty + residual_qty;
                pos.avg_price = ((total_cost * QTY_SCALE as i128) / total_qty as i128) as i64;
                pos.qty = total_qty;
                pos.accumulated_fees += fill.fee_cost;
                pos.accumulated_slippage += fill.slippage_cost;
            }
            None => {
                positions.insert(
                    key,
                    Position {
                        symbol: fill.symbol.clone(),
                        side: fill.side,
                        qty: residual_qty,
                        avg_price: fill.price,
                        open_ts: fill.ts_filled,
                        accumulated_fees: fill.fee_cost,
                        accumulated_slippage: fill.slippage_cost,
                        realized_pnl_on_closes: 0,
                        metadata: fill.metadata.risk.clone(),
                        mae_price: fill.price,
                        mfe_price: fill.price,
                    },
                );
            }
        }
    }

    Ok(trade)
}

fn r_multiple(position: &Position, pnl: i64) -> Option<f64> {
    if !position.metadata.r_metrics_valid || position.metadata.risk_amount <= 0 {
        return None;
    }
    Some(pnl as f64 / position.metadata.risk_amount as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_data::PRICE_SCALE;
    use bt_execution::FillMetadata;
    use bt_risk::OrderIntentMetadata;
    use bt_strategy::StopSpecKind;

    fn metadata(risk_amount: i64, stop_distance: i64, valid: bool) -> OrderIntentMetadata {
        OrderIntentMetadata {
            risk_amount,
            stop_distance,
            stop_source: StopSpecKind::Explicit,
            stop_details: "t".to_string(),
            r_metrics_valid: valid,
            used_legacy_stop_proxy: !valid,
            stop_resolution_mode: bt_config::StopResolutionMode::Strict,
            delay_remaining: 0,
            reason_code: "resolved_explicit".to_string(),
        }
    }

    fn fill(side: Side, qty: i64, price: i64, fee: i64, risk: OrderIntentMetadata) -> Fill {
        Fill {
            ts_filled: 60,
            symbol: "AAA".to_string(),
            side,
            qty,
            price,
            fee_cost: fee,
            slippage_cost: 0,
            spread_cost: 0,
            metadata: FillMetadata { ts_created: 0, intrabar_raw_price: price, risk },
        }
    }

    #[test]
    fn opening_fill_creates_a_position_and_debits_fee() {
        let mut positions = BTreeMap::new();
        let mut state = PortfolioState::new(10_000 * PRICE_SCALE);
        let f = fill(Side::Buy, 100 * QTY_SCALE, 100 * PRICE_SCALE, 5 * PRICE_SCALE, metadata(100 * PRICE_SCALE, PRICE_SCALE, true));
        let trade = apply_fill(&mut positions, &mut state, &f).unwrap();
        assert!(trade.is_none());
        assert_eq!(state.cash, 10_000 * PRICE_SCALE - 5 * PRICE_SCALE);
        let pos = positions.get(&("AAA".to_string(), Side::Buy)).unwrap();
        assert_eq!(pos.qty, 100 * QTY_SCALE);
        assert_eq!(pos.avg_price, 100 * PRICE_SCALE);
    }

    #[test]
    fn opposite_fill_closes_and_emits_trade_with_r_multiple() {
        let mut positions = BTreeMap::new();
        let mut state = PortfolioState::new(10_000 * PRICE_SCALE);
        let entry = fill(Side::Buy, 100 * QTY_SCALE, 100 * PRICE_SCALE, 0, metadata(1 * PRICE_SCALE, PRICE_SCALE, true));
        apply_fill(&mut positions, &mut state, &entry).unwrap();

        let exit = fill(Side::Sell, 100 * QTY_SCALE, 103 * PRICE_SCALE, 0, metadata(0, 0, false));
        let trade = apply_fill(&mut positions, &mut state, &exit).unwrap().unwrap();

        assert_eq!(trade.pnl_price, 3 * PRICE_SCALE);
        assert_eq!(trade.r_multiple_gross, Some(3.0));
        assert!(positions.get(&("AAA".to_string(), Side::Buy)).is_none());
    }

    #[test]
    fn residual_quantity_flips_to_opposite_side() {
        let mut positions = BTreeMap::new();
        let mut state = PortfolioState::new(10_000 * PRICE_SCALE);
        let entry = fill(Side::Buy, 50 * QTY_SCALE, 100 * PRICE_SCALE, 0, metadata(50 * PRICE_SCALE, PRICE_SCALE, true));
        apply_fill(&mut positions, &mut state, &entry).unwrap();

        let flip = fill(Side::Sell, 80 * QTY_SCALE, 101 * PRICE_SCALE, 0, metadata(0, 0, false));
        let trade = apply_fill(&mut positions, &mut state, &flip).unwrap();
        assert!(trade.is_some());
        assert!(positions.get(&("AAA".to_string(), Side::Buy)).is_none());
        let short = positions.get(&("AAA".to_string(), Side::Sell)).unwrap();
        assert_eq!(short.qty, 30 * QTY_SCALE);
        assert_eq!(short.avg_price, 101 * PRICE_SCALE);
    }

    #[test]
    fn legacy_proxy_entry_leaves_r_multiple_null() {
        let mut positions = BTreeMap::new();
        let mut state = PortfolioState::new(10_000 * PRICE_SCALE);
        let entry = fill(Side::Buy, 100 * QTY_SCALE, 100 * PRICE_SCALE, 0, metadata(0, 0, false));
        apply_fill(&mut positions, &mut state, &entry).unwrap();
        let exit = fill(Side::Sell, 100 * QTY_SCALE, 105 * PRICE_SCALE, 0, metadata(0, 0, false));
        let trade = apply_fill(&mut positions, &mut state, &exit).unwrap().unwrap();
        assert_eq!(trade.r_multiple_gross, None);
        assert_eq!(trade.risk_amount, None);
    }
}
