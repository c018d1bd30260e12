mod support;

use std::collections::BTreeMap;

use bt_data::{DataFeed, Side};
use bt_strategy::Signal;
use support::{bar, base_cfg, ScriptedStrategy};

fn run_once() -> bt_engine::RunOutcome {
    let mut by_symbol = BTreeMap::new();
    by_symbol.insert(
        "AAA".to_string(),
        vec![
            bar(0, "AAA", 100.0, 101.0, 99.0, 100.0, 10),
            bar(60, "AAA", 100.0, 102.0, 100.0, 101.0, 10),
            bar(120, "AAA", 101.0, 103.0, 100.0, 102.0, 10),
        ],
    );
    let cfg = base_cfg(10_000.0);
    let feed = DataFeed::new(by_symbol, &cfg.data, &cfg.htf_resampler).unwrap();

    let mut entry = Signal::new(0, "AAA", Side::Buy, "entry", 1.0);
    entry.metadata.stop_price = Some(99_000_000);
    let mut strategy = ScriptedStrategy::new(vec![(0, vec![entry])]);

    bt_engine::run(feed, &mut strategy, &cfg).unwrap()
}

#[test]
fn identical_inputs_produce_bit_identical_equity_and_fill_sequences() {
    let a = run_once();
    let b = run_once();

    assert_eq!(a.equity_rows, b.equity_rows);
    assert_eq!(a.fills, b.fills);
    assert_eq!(a.trades, b.trades);
    assert_eq!(a.final_state, b.final_state);
}
