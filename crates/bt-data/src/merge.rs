//! k-way merge of per-symbol bar sequences into a single timestamp-ordered
//! stream, keyed by `(ts, symbol)`. Gaps are preserved exactly as found in
//! the source data: a symbol simply has no entry at timestamps where it has
//! no bar. No bar is synthesized to fill a gap.

use std::collections::{BTreeMap, BinaryHeap};
use std::cmp::Reverse;

use crate::types::Bar;

/// One fully time-aligned step of the merged stream: every symbol that has a
/// bar at this timestamp, keyed by symbol.
pub type MergedStep = (i64, BTreeMap<String, Bar>);

/// Merges per-symbol sorted bar vectors into ascending-timestamp steps.
/// Each input vector must already be validated and sorted (as
/// `csv_source`/`validate` guarantee).
pub fn merge_by_timestamp(by_symbol: BTreeMap<String, Vec<Bar>>) -> Vec<MergedStep> {
    let mut cursors: BTreeMap<String, (Vec<Bar>, usize)> = by_symbol
        .into_iter()
        .map(|(symbol, bars)| (symbol, (bars, 0)))
        .collect();

    let mut heap: BinaryHeap<Reverse<(i64, String)>> = BinaryHeap::new();
    for (symbol, (bars, _)) in &cursors {
        if let Some(b) = bars.first() {
            heap.push(Reverse((b.ts, symbol.clone())));
        }
    }

    let mut steps: Vec<MergedStep> = Vec::new();

    while let Some(Reverse((ts, _))) = heap.pop() {
        // Drain every symbol whose next bar shares this timestamp.
        let mut step: BTreeMap<String, Bar> = BTreeMap::new();
        let symbols: Vec<String> = cursors.keys().cloned().collect();
        for symbol in symbols {
            let (bars, pos) = cursors.get_mut(&symbol).unwrap();
            if *pos < bars.len() && bars[*pos].ts == ts {
                step.insert(symbol.clone(), bars[*pos].clone());
                *pos += 1;
                if *pos < bars.len() {
                    heap.push(Reverse((bars[*pos].ts, symbol.clone())));
                }
            }
        }
        // The heap may still hold stale entries for symbols already advanced
        // past this timestamp by a previous iteration; skip duplicates that
        // point at a position already consumed.
        if !step.is_empty() {
            steps.push((ts, step));
        }
    }

    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: i64, symbol: &str) -> Bar {
        Bar::new(ts, symbol, 100, 101, 99, 100, 1)
    }

    #[test]
    fn aligns_shared_timestamps_and_preserves_gaps() {
        let mut data = BTreeMap::new();
        data.insert("AAA".to_string(), vec![bar(0, "AAA"), bar(60, "AAA"), bar(120, "AAA")]);
        data.insert("BBB".to_string(), vec![bar(0, "BBB"), bar(120, "BBB")]);

        let steps = merge_by_timestamp(data);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].0, 0);
        assert_eq!(steps[0].1.len(), 2);
        assert_eq!(steps[1].0, 60);
        assert_eq!(steps[1].1.len(), 1);
        assert!(steps[1].1.contains_key("AAA"));
        assert_eq!(steps[2].0, 120);
        assert_eq!(steps[2].1.len(), 2);
    }

    #[test]
    fn single_symbol_passes_through_unchanged() {
        let mut data = BTreeMap::new();
        data.insert("AAA".to_string(), vec![bar(0, "AAA"), bar(60, "AAA")]);
        let steps = merge_by_timestamp(data);
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn empty_input_produces_no_steps() {
        let steps = merge_by_timestamp(BTreeMap::new());
        assert!(steps.is_empty());
    }
}
