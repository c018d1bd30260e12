use std::collections::BTreeMap;

use bt_data::{merge_by_timestamp, Bar};

fn bar(ts: i64, symbol: &str) -> Bar {
    Bar::new(ts, symbol, 100_000_000, 101_000_000, 99_000_000, 100_000_000, 1)
}

#[test]
fn merge_preserves_gaps_without_synthesizing_bars() {
    let mut data = BTreeMap::new();
    // AAA trades every minute; BBB has a gap at minute 60 (e.g. halted).
    data.insert("AAA".to_string(), vec![bar(0, "AAA"), bar(60, "AAA"), bar(120, "AAA")]);
    data.insert("BBB".to_string(), vec![bar(0, "BBB"), bar(120, "BBB")]);

    let steps = merge_by_timestamp(data);

    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].1.len(), 2);
    assert_eq!(steps[1].0, 60);
    assert_eq!(steps[1].1.len(), 1, "BBB must not appear at minute 60, not be synthesized");
    assert!(!steps[1].1.contains_key("BBB"));
    assert_eq!(steps[2].1.len(), 2);
}

#[test]
fn three_symbols_with_staggered_start_times_merge_in_timestamp_order() {
    let mut data = BTreeMap::new();
    data.insert("AAA".to_string(), vec![bar(0, "AAA"), bar(60, "AAA")]);
    data.insert("BBB".to_string(), vec![bar(60, "BBB"), bar(120, "BBB")]);
    data.insert("CCC".to_string(), vec![bar(120, "CCC")]);

    let steps = merge_by_timestamp(data);
    let timestamps: Vec<i64> = steps.iter().map(|(ts, _)| *ts).collect();
    assert_eq!(timestamps, vec![0, 60, 120]);
    assert_eq!(steps[0].1.len(), 1);
    assert_eq!(steps[1].1.len(), 2);
    assert_eq!(steps[2].1.len(), 2);
}
