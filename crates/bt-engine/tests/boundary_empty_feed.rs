mod support;

use std::collections::BTreeMap;

use bt_data::{Bar, DataFeed};
use bt_strategy::{Signal, Strategy, StrategyContext};
use support::base_cfg;

struct NeverCalled;

impl Strategy for NeverCalled {
    fn on_bars(&mut self, _ts: i64, _bars: &BTreeMap<String, Bar>, _universe: &[String], _ctx: &StrategyContext) -> Vec<Signal> {
        panic!("on_bars must never be called for an empty feed");
    }
}

#[test]
fn empty_feed_passes_with_zero_trades_and_unchanged_starting_equity() {
    let cfg = base_cfg(10_000.0);
    let feed = DataFeed::new(BTreeMap::new(), &cfg.data, &cfg.htf_resampler).unwrap();
    let mut strategy = NeverCalled;

    let outcome = bt_engine::run(feed, &mut strategy, &cfg).unwrap();

    assert!(outcome.equity_rows.is_empty());
    assert!(outcome.fills.is_empty());
    assert!(outcome.trades.is_empty());
    assert!(outcome.decisions.is_empty());
    assert_eq!(outcome.final_state.equity, 10_000 * bt_data::PRICE_SCALE);
    assert!(outcome.liquidation_reason.is_none());
}
