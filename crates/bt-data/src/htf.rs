//! Higher-timeframe resampler: maintains, per symbol, a
//! current bucket and finalizes it the moment a bar from the next bucket
//! arrives. There is no end-of-stream flush — an unclosed final bucket is
//! never emitted, strict or not.

use std::collections::BTreeMap;

use crate::types::{Bar, HtfBar};

/// Any intra-bucket gap wider than this marks the bucket incomplete. Tied to
/// the 1-minute base-feed assumption; if the base feed ever stops being
/// 1-minute this constant would need to become a parameter instead of a
/// hard-coded threshold.
pub const HTF_GAP_THRESHOLD_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Minutes(i64),
    Hours(i64),
    Days(i64),
}

impl Timeframe {
    /// Parses strings like `"5m"`, `"1h"`, `"1d"`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (num, unit) = s.split_at(s.len().checked_sub(1)?);
        let n: i64 = num.parse().ok()?;
        if n <= 0 {
            return None;
        }
        match unit {
            "m" => Some(Timeframe::Minutes(n)),
            "h" => Some(Timeframe::Hours(n)),
            "d" => Some(Timeframe::Days(n)),
            _ => None,
        }
    }

    pub fn period_secs(&self) -> i64 {
        match self {
            Timeframe::Minutes(n) => n * 60,
            Timeframe::Hours(n) => n * 3600,
            Timeframe::Days(n) => n * 86400,
        }
    }

    pub fn expected_bars(&self) -> i64 {
        self.period_secs() / 60
    }

    pub fn bucket_start(&self, ts: i64) -> i64 {
        let period = self.period_secs();
        ts.div_euclid(period) * period
    }
}

struct Bucket {
    bucket_start: i64,
    n_bars: i64,
    incomplete: bool,
    last_ts: i64,
    open: i64,
    high: i64,
    low: i64,
    close: i64,
    volume: i64,
}

/// Resamples one symbol's 1-minute bar stream into a timeframe's HTF bars.
/// Call `push` per incoming bar, in increasing timestamp order; a bar is
/// returned whenever pushing closes the previous bucket.
pub struct HtfResampler {
    timeframe: Timeframe,
    strict: bool,
    current: BTreeMap<String, Bucket>,
}

impl HtfResampler {
    pub fn new(timeframe: Timeframe, strict: bool) -> Self {
        Self {
            timeframe,
            strict,
            current: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, bar: &Bar) -> Option<HtfBar> {
        let bucket_start = self.timeframe.bucket_start(bar.ts);
        let expected = self.timeframe.expected_bars();

        let finalized = match self.current.get(&bar.symbol) {
            Some(b) if b.bucket_start == bucket_start => None,
            Some(_) => self.finalize(&bar.symbol, expected),
            None => None,
        };

        self.current
            .entry(bar.symbol.clone())
            .and_modify(|b| {
                if b.bucket_start == bucket_start {
                    if bar.ts - b.last_ts > HTF_GAP_THRESHOLD_SECS {
                        b.incomplete = true;
                    }
                    b.n_bars += 1;
                    b.last_ts = bar.ts;
                    b.high = b.high.max(bar.high);
                    b.low = b.low.min(bar.low);
                    b.close = bar.close;
                    b.volume += bar.volume;
                } else {
                    *b = Bucket {
                        bucket_start,
                        n_bars: 1,
                        incomplete: false,
                        last_ts: bar.ts,
                        open: bar.open,
                        high: bar.high,
                        low: bar.low,
                        close: bar.close,
                        volume: bar.volume,
                    };
                }
            })
            .or_insert_with(|| Bucket {
                bucket_start,
                n_bars: 1,
                incomplete: false,
                last_ts: bar.ts,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
            });

        finalized.map(|b| self.bucket_to_htf_bar(&bar.symbol, b))
    }

    fn finalize(&mut self, symbol: &str, expected: i64) -> Option<Bucket> {
        let bucket = self.current.remove(symbol)?;
        let complete = !bucket.incomplete && bucket.n_bars == expected;
        if complete || !self.strict {
            Some(bucket)
        } else {
            None
        }
    }

    fn bucket_to_htf_bar(&self, symbol: &str, b: Bucket) -> HtfBar {
        HtfBar {
            ts: b.bucket_start,
            symbol: symbol.to_string(),
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume: b.volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: i64, o: i64, h: i64, l: i64, c: i64, v: i64) -> Bar {
        Bar::new(ts, "AAA", o, h, l, c, v)
    }

    #[test]
    fn emits_complete_bucket_on_next_bucket_arrival() {
        let tf = Timeframe::parse("5m").unwrap();
        let mut r = HtfResampler::new(tf, true);
        for m in 0..5 {
            assert!(r.push(&bar(m * 60, 100, 101, 99, 100, 1)).is_none());
        }
        let emitted = r.push(&bar(300, 100, 101, 99, 100, 1));
        let htf = emitted.unwrap();
        assert_eq!(htf.ts, 0);
        assert_eq!(htf.volume, 5);
    }

    #[test]
    fn strict_mode_drops_incomplete_bucket_with_gap() {
        // 15m bucket, 14 consecutive minutes present, minute 8 missing.
        let tf = Timeframe::parse("15m").unwrap();
        let mut r = HtfResampler::new(tf, true);
        let minutes: Vec<i64> = (0..15).filter(|&m| m != 8).collect();
        let mut emitted = None;
        for m in &minutes {
            emitted = r.push(&bar(m * 60, 100, 101, 99, 100, 1));
        }
        assert!(emitted.is_none());
        // Next bucket starting at minute 15 must not retroactively emit it.
        let next = r.push(&bar(900, 100, 101, 99, 100, 1));
        assert!(next.is_none());
    }

    #[test]
    fn non_strict_mode_emits_incomplete_bucket_anyway() {
        let tf = Timeframe::parse("5m").unwrap();
        let mut r = HtfResampler::new(tf, false);
        for m in [0, 1, 2] {
            r.push(&bar(m * 60, 100, 101, 99, 100, 1));
        }
        let emitted = r.push(&bar(300, 100, 101, 99, 100, 1));
        assert!(emitted.is_some());
    }

    #[test]
    fn final_unclosed_bucket_is_never_emitted() {
        let tf = Timeframe::parse("5m").unwrap();
        let mut r = HtfResampler::new(tf, false);
        for m in 0..3 {
            assert!(r.push(&bar(m * 60, 100, 101, 99, 100, 1)).is_none());
        }
        // Stream ends here; no flush call exists in this API at all.
    }

    #[test]
    fn parses_minute_hour_day_timeframes() {
        assert_eq!(Timeframe::parse("5m").unwrap().period_secs(), 300);
        assert_eq!(Timeframe::parse("1h").unwrap().period_secs(), 3600);
        assert_eq!(Timeframe::parse("1d").unwrap().period_secs(), 86400);
        assert!(Timeframe::parse("bogus").is_none());
    }
}
