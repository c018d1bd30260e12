use crate::errors::DataError;
use crate::types::Bar;

/// Validates one bar against the invariants required of every Bar,
/// given the previous bar seen for the same symbol (if any).
pub fn validate_bar(prev: Option<&Bar>, bar: &Bar) -> Result<(), DataError> {
    if bar.ts % 60 != 0 {
        return Err(DataError::BaseTimeframeNotOneMinute {
            symbol: bar.symbol.clone(),
            ts: bar.ts,
        });
    }

    if bar.volume < 0 {
        return Err(DataError::NegativeVolume {
            symbol: bar.symbol.clone(),
            ts: bar.ts,
        });
    }

    let lo = bar.open.min(bar.close);
    let hi = bar.open.max(bar.close);
    if bar.low > lo {
        return Err(DataError::InvalidOhlc {
            symbol: bar.symbol.clone(),
            ts: bar.ts,
            reason: "low must be <= min(open, close)".to_string(),
        });
    }
    if bar.high < hi {
        return Err(DataError::InvalidOhlc {
            symbol: bar.symbol.clone(),
            ts: bar.ts,
            reason: "high must be >= max(open, close)".to_string(),
        });
    }
    if bar.high < bar.low {
        return Err(DataError::InvalidOhlc {
            symbol: bar.symbol.clone(),
            ts: bar.ts,
            reason: "high must be >= low".to_string(),
        });
    }

    if let Some(p) = prev {
        if bar.ts == p.ts {
            return Err(DataError::DuplicateTimestamp {
                symbol: bar.symbol.clone(),
                ts: bar.ts,
            });
        }
        if bar.ts < p.ts {
            return Err(DataError::NonMonotonicTimestamp {
                symbol: bar.symbol.clone(),
                prev_ts: p.ts,
                ts: bar.ts,
            });
        }
    }

    Ok(())
}

/// Validates a full per-symbol sequence in one pass; used by sources that
/// load an entire table into memory up front (the single-file mode).
pub fn validate_sequence(bars: &[Bar]) -> Result<(), DataError> {
    let mut prev: Option<&Bar> = None;
    for bar in bars {
        validate_bar(prev, bar)?;
        prev = Some(bar);
    }
    Ok(())
}
