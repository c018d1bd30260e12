mod support;

use std::collections::BTreeMap;

use bt_config::SignalConflictPolicy;
use bt_data::{DataFeed, Side};
use bt_strategy::Signal;
use support::{bar, base_cfg, ScriptedStrategy};

#[test]
fn net_out_cancels_simultaneous_opposite_entries_into_zero_intents() {
    let mut by_symbol = BTreeMap::new();
    by_symbol.insert(
        "AAA".to_string(),
        vec![bar(0, "AAA", 100.0, 101.0, 99.0, 100.0, 10), bar(60, "AAA", 100.0, 102.0, 100.0, 101.0, 10)],
    );

    let mut cfg = base_cfg(10_000.0);
    cfg.strategy.signal_conflict_policy = SignalConflictPolicy::NetOut;
    let feed = DataFeed::new(by_symbol, &cfg.data, &cfg.htf_resampler).unwrap();

    let mut buy = Signal::new(0, "AAA", Side::Buy, "entry", 1.0);
    buy.metadata.stop_price = Some(99_000_000);
    let mut sell = Signal::new(0, "AAA", Side::Sell, "entry", 1.0);
    sell.metadata.stop_price = Some(101_000_000);
    let mut strategy = ScriptedStrategy::new(vec![(0, vec![buy, sell])]);

    let outcome = bt_engine::run(feed, &mut strategy, &cfg).unwrap();

    assert!(outcome.fills.is_empty());
    assert!(outcome.decisions.is_empty());
    assert_eq!(outcome.final_state.equity, 10_000 * bt_data::PRICE_SCALE);
}
