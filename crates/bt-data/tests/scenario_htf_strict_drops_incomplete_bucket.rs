use std::collections::BTreeMap;

use bt_config::{DataConfig, HtfResamplerConfig};
use bt_data::{Bar, DataFeed};

fn bar(ts: i64) -> Bar {
    Bar::new(ts, "AAA", 100_000_000, 101_000_000, 99_000_000, 100_000_000, 1)
}

/// 1-min bars for 14 consecutive minutes (missing
/// minute 8) aggregating to 15m under strict mode. No HTF bar is ever
/// emitted for that bucket, including once minute 15 starts.
#[test]
fn fourteen_of_fifteen_minute_bars_never_emit_under_strict_mode() {
    let mut rows: Vec<Bar> = Vec::new();
    for m in 0..15 {
        if m == 8 {
            continue;
        }
        rows.push(bar(m * 60));
    }
    // A following bucket's bars, to force the first bucket to finalize.
    for m in 15..20 {
        rows.push(bar(m * 60));
    }

    let mut data = BTreeMap::new();
    data.insert("AAA".to_string(), rows);

    let data_cfg = DataConfig::default();
    let htf_cfg = HtfResamplerConfig {
        timeframes: vec!["15m".to_string()],
        strict: true,
    };
    let mut feed = DataFeed::new(data, &data_cfg, &htf_cfg).unwrap();

    let mut any_htf_emitted = false;
    while let Some(step) = feed.next() {
        if !step.htf_bars.is_empty() {
            any_htf_emitted = true;
        }
    }

    assert!(!any_htf_emitted, "strict mode must drop the incomplete 15m bucket entirely");
}
