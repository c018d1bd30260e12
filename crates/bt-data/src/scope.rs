//! Scope knobs applied in a fixed order:
//! symbols_subset → max_symbols → date_range → row_limit_per_symbol →
//! chunksize (performance-only; recorded but otherwise a no-op here since
//! this crate loads per-symbol sequences eagerly rather than in true
//! streaming chunks).

use std::collections::BTreeMap;

use bt_config::DataConfig;
use chrono::DateTime;

use crate::types::Bar;

/// True when any knob that reduces what the run actually saw is active —
/// the signal `bt-artifacts` uses to decide whether to emit `data_scope.json`.
pub fn is_scope_reducing(cfg: &DataConfig) -> bool {
    cfg.symbols_subset.is_some()
        || cfg.max_symbols.is_some()
        || cfg.date_range.is_some()
        || cfg.row_limit_per_symbol.is_some()
}

pub fn apply_scope(mut by_symbol: BTreeMap<String, Vec<Bar>>, cfg: &DataConfig) -> BTreeMap<String, Vec<Bar>> {
    if let Some(subset) = &cfg.symbols_subset {
        by_symbol.retain(|symbol, _| subset.contains(symbol));
    }

    if let Some(max_symbols) = cfg.max_symbols {
        let keep: Vec<String> = by_symbol.keys().take(max_symbols).cloned().collect();
        by_symbol.retain(|symbol, _| keep.contains(symbol));
    }

    if let Some(range) = &cfg.date_range {
        if let (Ok(start), Ok(end)) = (
            DateTime::parse_from_rfc3339(&range.start),
            DateTime::parse_from_rfc3339(&range.end),
        ) {
            let start = start.timestamp();
            let end = end.timestamp();
            for bars in by_symbol.values_mut() {
                bars.retain(|b| b.ts >= start && b.ts < end);
            }
        }
    }

    if let Some(limit) = cfg.row_limit_per_symbol {
        for bars in by_symbol.values_mut() {
            bars.truncate(limit);
        }
    }

    // chunksize is a performance-only batch size; this in-memory
    // implementation has nothing further to do with it.
    by_symbol
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(symbol: &str, tss: &[i64]) -> Vec<Bar> {
        tss.iter().map(|&ts| Bar::new(ts, symbol, 100, 101, 99, 100, 1)).collect()
    }

    #[test]
    fn knobs_apply_in_documented_order() {
        let mut data = BTreeMap::new();
        data.insert("AAA".to_string(), bars("AAA", &[0, 60, 120]));
        data.insert("BBB".to_string(), bars("BBB", &[0, 60]));
        data.insert("CCC".to_string(), bars("CCC", &[0, 60]));

        let cfg = DataConfig {
            symbols_subset: Some(vec!["AAA".to_string(), "BBB".to_string()]),
            max_symbols: Some(1),
            date_range: None,
            row_limit_per_symbol: Some(1),
            chunksize: None,
        };

        let scoped = apply_scope(data, &cfg);
        // symbols_subset keeps AAA,BBB; max_symbols=1 keeps the first
        // remaining key in BTreeMap order (AAA); row_limit truncates to 1 bar.
        assert_eq!(scoped.len(), 1);
        assert!(scoped.contains_key("AAA"));
        assert_eq!(scoped["AAA"].len(), 1);
    }

    #[test]
    fn date_range_is_half_open_utc() {
        let mut data = BTreeMap::new();
        data.insert("AAA".to_string(), bars("AAA", &[0, 60, 120]));
        let cfg = DataConfig {
            symbols_subset: None,
            max_symbols: None,
            date_range: Some(bt_config::DateRange {
                start: "1970-01-01T00:00:00Z".to_string(),
                end: "1970-01-01T00:02:00Z".to_string(),
            }),
            row_limit_per_symbol: None,
            chunksize: None,
        };
        let scoped = apply_scope(data, &cfg);
        assert_eq!(scoped["AAA"].iter().map(|b| b.ts).collect::<Vec<_>>(), vec![0, 60]);
    }
}
