//! Order queue with delay, intrabar price selection, and the
//! spread/slippage/fee cost pipeline.

use std::collections::BTreeMap;

use bt_config::{ExecutionConfig, IntrabarMode, SpreadMode};
use bt_data::{Bar, Side, PRICE_SCALE, QTY_SCALE};
use bt_risk::OrderIntent;

use crate::errors::ExecutionError;
use crate::types::{Fill, FillMetadata};

/// Raw intrabar price before spread/slippage, chosen per `intrabar_mode`.
fn intrabar_raw_price(mode: IntrabarMode, side: Side, bar: &Bar) -> i64 {
    match mode {
        IntrabarMode::WorstCase => match side {
            Side::Buy => bar.high,
            Side::Sell => bar.low,
        },
        IntrabarMode::BestCase => match side {
            Side::Buy => bar.low,
            Side::Sell => bar.high,
        },
        IntrabarMode::Midpoint => (bar.high + bar.low) / 2,
    }
}

/// Applies the spread half-width, then slippage, to the raw intrabar price.
/// Returns `(price_final, spread_cost, slippage_cost)`, all in cash-micros
/// per unit scaled to `qty` by the caller.
fn apply_spread_and_slippage(
    cfg: &ExecutionConfig,
    side: Side,
    raw_price: i64,
) -> (i64, i64, i64) {
    let sign = side.sign();

    let spread_delta = match cfg.spread_mode {
        SpreadMode::FixedBps => {
            ((sign as f64) * (cfg.spread_bps / 2.0 / 10_000.0) * raw_price as f64).round() as i64
        }
        SpreadMode::None => 0,
    };
    let after_spread = raw_price + spread_delta;

    let slippage_delta =
        ((sign as f64) * (cfg.slippage_bps / 10_000.0) * after_spread as f64).round() as i64;
    let price_final = after_spread + slippage_delta;

    (price_final, spread_delta, slippage_delta)
}

fn notional_cash_micros(qty: i64, price: i64) -> Result<i64, ()> {
    let n = (qty as i128 * price as i128) / QTY_SCALE as i128;
    if n > i64::MAX as i128 || n < i64::MIN as i128 {
        Err(())
    } else {
        Ok(n as i64)
    }
}

/// Builds a fill for `qty` units of `symbol`/`side` against `bar`, running
/// the full intrabar → spread → slippage → fee pipeline. Used both for
/// ordinary delayed-queue fills and for forced-liquidation closes, which
/// must go through this same pipeline.
pub fn build_fill(
    cfg: &ExecutionConfig,
    ts_filled: i64,
    symbol: &str,
    side: Side,
    qty: i64,
    bar: &Bar,
    metadata: FillMetadata,
) -> Result<Fill, ExecutionError> {
    let raw = intrabar_raw_price(cfg.intrabar_mode, side, bar);
    let (price_final, spread_delta, slippage_delta) = apply_spread_and_slippage(cfg, side, raw);

    let spread_cost = notional_cash_micros(qty, spread_delta.abs())
        .map_err(|_| ExecutionError::PriceOverflow { symbol: symbol.to_string(), ts: ts_filled })?;
    let slippage_cost = notional_cash_micros(qty, slippage_delta.abs())
        .map_err(|_| ExecutionError::PriceOverflow { symbol: symbol.to_string(), ts: ts_filled })?;

    let notional = notional_cash_micros(qty, price_final.abs())
        .map_err(|_| ExecutionError::PriceOverflow { symbol: symbol.to_string(), ts: ts_filled })?;
    let fee_cost = (cfg.taker_fee * notional.unsigned_abs() as f64).round() as i64;

    Ok(Fill {
        ts_filled,
        symbol: symbol.to_string(),
        side,
        qty,
        price: price_final,
        fee_cost,
        slippage_cost,
        spread_cost,
        metadata,
    })
}

/// Queue of pending `OrderIntent`s awaiting their delay, plus the pipeline
/// that turns an eligible intent into a `Fill` once its symbol has a bar.
pub struct ExecutionEngine {
    cfg: ExecutionConfig,
    queue: Vec<OrderIntent>,
}

impl ExecutionEngine {
    pub fn new(cfg: ExecutionConfig) -> Self {
        Self { cfg, queue: Vec::new() }
    }

    /// Enqueues a freshly accepted intent. `delay_remaining` is already set
    /// by the risk engine from the resolved `execution.delay_bars`.
    pub fn submit(&mut self, intent: OrderIntent) {
        self.queue.push(intent);
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Spec.md §4.7 steps (2)+(3): decrement every pending order's delay,
    /// then fill every order whose delay has reached zero and whose symbol
    /// has a bar this step. Orders for absent symbols stay queued.
    pub fn step(
        &mut self,
        ts: i64,
        bars: &BTreeMap<String, Bar>,
    ) -> Result<Vec<Fill>, ExecutionError> {
        for intent in &mut self.queue {
            intent.metadata.delay_remaining = intent.metadata.delay_remaining.saturating_sub(1);
        }

        let mut fills = Vec::new();
        let mut remaining = Vec::with_capacity(self.queue.len());
        for intent in self.queue.drain(..) {
            let eligible = intent.metadata.delay_remaining == 0;
            let bar = bars.get(&intent.symbol);
            match (eligible, bar) {
                (true, Some(bar)) => {
                    let fill = build_fill(
                        &self.cfg,
                        ts,
                        &intent.symbol,
                        intent.side,
                        intent.qty,
                        bar,
                        FillMetadata {
                            ts_created: intent.ts_created,
                            intrabar_raw_price: intrabar_raw_price(self.cfg.intrabar_mode, intent.side, bar),
                            risk: intent.metadata.clone(),
                        },
                    )?;
                    fills.push(fill);
                }
                _ => remaining.push(intent),
            }
        }
        self.queue = remaining;

        Ok(fills)
    }
}
