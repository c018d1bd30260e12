//! Single-file CSV ingestion: the one concrete `on-disk reader` this crate
//! carries, since the CLI needs *something* to drive `run_backtest --data`
//! end to end even though a general CSV/Parquet reader is out of scope.
//! Generalizes the single-symbol, pre-scaled-integer loader pattern from the
//! bar-replay engine this workspace grew out of to: multi-symbol rows, an
//! explicit RFC3339 `ts` column (the wire-boundary float/calendar parsing
//! documented in bt-data's fixed-point design note), and the full bar
//! validation set.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::DateTime;

use crate::errors::DataError;
use crate::types::{Bar, PRICE_SCALE, QTY_SCALE};
use crate::validate::validate_bar;

/// Parses an entire CSV table into per-symbol validated, sorted bar
/// sequences. Required columns: `ts, symbol, open, high, low, close, volume`.
pub fn load_csv_file(path: impl AsRef<Path>) -> Result<BTreeMap<String, Vec<Bar>>, DataError> {
    let s = fs::read_to_string(path).map_err(|e| DataError::Io(e.to_string()))?;
    parse_csv_bars(&s)
}

pub fn parse_csv_bars(csv: &str) -> Result<BTreeMap<String, Vec<Bar>>, DataError> {
    let mut lines = csv.lines();

    let header_line = lines
        .next()
        .ok_or_else(|| DataError::Parse { line: 1, reason: "empty input".to_string() })?;
    let header_line = header_line.trim().trim_start_matches('\u{feff}');

    let headers: Vec<String> = split_csv_line(header_line);
    let mut idx: BTreeMap<String, usize> = BTreeMap::new();
    for (i, h) in headers.iter().enumerate() {
        idx.insert(h.trim().to_string(), i);
    }

    let col_ts = find_required(&idx, "ts")?;
    let col_symbol = find_required(&idx, "symbol")?;
    let col_open = find_required(&idx, "open")?;
    let col_high = find_required(&idx, "high")?;
    let col_low = find_required(&idx, "low")?;
    let col_close = find_required(&idx, "close")?;
    let col_volume = find_required(&idx, "volume")?;

    let mut by_symbol: BTreeMap<String, Vec<Bar>> = BTreeMap::new();

    for (line_idx0, raw) in lines.enumerate() {
        let line_no = line_idx0 + 2;
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }

        let fields = split_csv_line(raw);
        let get = |col: usize| -> Result<&str, DataError> {
            fields.get(col).map(|s| s.as_str()).ok_or_else(|| DataError::Parse {
                line: line_no,
                reason: format!("missing column index {col}"),
            })
        };

        let symbol = get(col_symbol)?.to_string();
        if symbol.is_empty() {
            return Err(DataError::Parse {
                line: line_no,
                reason: "symbol is empty".to_string(),
            });
        }

        let ts_raw = get(col_ts)?;
        let ts = parse_rfc3339_utc_secs(ts_raw, line_no)?;

        let open = parse_price(get(col_open)?, line_no, "open")?;
        let high = parse_price(get(col_high)?, line_no, "high")?;
        let low = parse_price(get(col_low)?, line_no, "low")?;
        let close = parse_price(get(col_close)?, line_no, "close")?;
        let volume = parse_qty(get(col_volume)?, line_no, "volume")?;

        let bar = Bar::new(ts, symbol.clone(), open, high, low, close, volume);
        let prev = by_symbol.get(&symbol).and_then(|v| v.last());
        validate_bar(prev, &bar)?;
        by_symbol.entry(symbol).or_default().push(bar);
    }

    Ok(by_symbol)
}

fn find_required(idx: &BTreeMap<String, usize>, name: &'static str) -> Result<usize, DataError> {
    idx.get(name).copied().ok_or(DataError::MissingColumn(name))
}

fn parse_rfc3339_utc_secs(s: &str, line: usize) -> Result<i64, DataError> {
    let dt = DateTime::parse_from_rfc3339(s.trim()).map_err(|_| DataError::NonUtcTimestamp {
        line,
        raw: s.to_string(),
    })?;
    Ok(dt.with_timezone(&chrono::Utc).timestamp())
}

fn parse_price(s: &str, line: usize, column: &str) -> Result<i64, DataError> {
    let f: f64 = s.trim().parse().map_err(|_| DataError::Parse {
        line,
        reason: format!("invalid number in column {column}: {s}"),
    })?;
    Ok((f * PRICE_SCALE as f64).round() as i64)
}

fn parse_qty(s: &str, line: usize, column: &str) -> Result<i64, DataError> {
    let f: f64 = s.trim().parse().map_err(|_| DataError::Parse {
        line,
        reason: format!("invalid number in column {column}: {s}"),
    })?;
    Ok((f * QTY_SCALE as f64).round() as i64)
}

/// Minimal CSV splitting (no quoting support, matching the format's no-quote
/// convention).
fn split_csv_line(line: &str) -> Vec<String> {
    line.split(',').map(|s| s.trim().to_string()).collect()
}
