//! The one concrete indicator this crate owns: Wilder's ATR, needed to make
//! `StopSpec::Atr` resolution testable end to end. The streaming indicator
//! library in general is an external collaborator (spec Non-goal); this is
//! the single exception carved out for the risk engine's own stop-distance
//! arithmetic.

use std::collections::BTreeMap;

use bt_data::{Bar, PRICE_SCALE};
use bt_strategy::IndicatorRegistry;

#[derive(Clone, Debug)]
pub struct WilderAtr {
    period: usize,
    seed_sum: f64,
    seed_count: usize,
    value: Option<f64>,
    prev_close: Option<i64>,
}

impl WilderAtr {
    pub fn new(period: usize) -> Self {
        debug_assert!(period > 0);
        Self {
            period,
            seed_sum: 0.0,
            seed_count: 0,
            value: None,
            prev_close: None,
        }
    }

    pub fn update(&mut self, bar: &Bar) {
        let high = bar.high as f64 / PRICE_SCALE as f64;
        let low = bar.low as f64 / PRICE_SCALE as f64;
        let tr = match self.prev_close {
            None => high - low,
            Some(prev_close) => {
                let prev_close = prev_close as f64 / PRICE_SCALE as f64;
                (high - low).max((high - prev_close).abs()).max((low - prev_close).abs())
            }
        };

        match self.value {
            Some(atr) => {
                let n = self.period as f64;
                self.value = Some((atr * (n - 1.0) + tr) / n);
            }
            None => {
                self.seed_sum += tr;
                self.seed_count += 1;
                if self.seed_count == self.period {
                    self.value = Some(self.seed_sum / self.period as f64);
                }
            }
        }

        self.prev_close = Some(bar.close);
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_warmed(&self) -> bool {
        self.value.is_some()
    }
}

/// Parses a trailing numeric suffix off an indicator name, e.g. `atr_14` or
/// `atr14` both yield period `14`; falls back to `14` when no number is
/// present.
fn parse_period(name: &str) -> usize {
    let digits: String = name.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    let digits: String = digits.chars().rev().collect();
    digits.parse().unwrap_or(14)
}

/// Lazily instantiates a `WilderAtr` per `(indicator_name, symbol)` pair the
/// first time it's updated, keyed exactly as strategies reference it through
/// `StopSpec::atr_indicator`.
#[derive(Default)]
pub struct AtrRegistry {
    atrs: BTreeMap<(String, String), WilderAtr>,
}

impl AtrRegistry {
    pub fn new() -> Self {
        Self { atrs: BTreeMap::new() }
    }

    pub fn update(&mut self, indicator_name: &str, symbol: &str, bar: &Bar) {
        let period = parse_period(indicator_name);
        self.atrs
            .entry((indicator_name.to_string(), symbol.to_string()))
            .or_insert_with(|| WilderAtr::new(period))
            .update(bar);
    }
}

impl IndicatorRegistry for AtrRegistry {
    fn read(&self, name: &str, symbol: &str) -> Option<f64> {
        self.atrs.get(&(name.to_string(), symbol.to_string())).and_then(|a| a.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(h: i64, l: i64, c: i64) -> Bar {
        Bar::new(0, "AAA", c, h, l, c, 1)
    }

    #[test]
    fn atr_is_not_ready_before_period_bars_seen() {
        let mut atr = WilderAtr::new(3);
        atr.update(&bar(101_000_000, 99_000_000, 100_000_000));
        atr.update(&bar(102_000_000, 99_000_000, 100_000_000));
        assert!(!atr.is_warmed());
        atr.update(&bar(103_000_000, 98_000_000, 100_000_000));
        assert!(atr.is_warmed());
    }

    #[test]
    fn atr_value_is_a_smoothed_true_range_average() {
        let mut atr = WilderAtr::new(2);
        atr.update(&bar(102_000_000, 100_000_000, 101_000_000));
        atr.update(&bar(103_000_000, 101_000_000, 102_000_000));
        // seed = average of both true ranges (both 2.0 here), so ATR == 2.0.
        assert_eq!(atr.value(), Some(2.0));
    }

    #[test]
    fn registry_reads_by_name_and_symbol() {
        let mut reg = AtrRegistry::new();
        assert_eq!(reg.read("atr_2", "AAA"), None);
        reg.update("atr_2", "AAA", &bar(102_000_000, 100_000_000, 101_000_000));
        reg.update("atr_2", "AAA", &bar(103_000_000, 101_000_000, 102_000_000));
        assert!(reg.read("atr_2", "AAA").is_some());
        assert_eq!(reg.read("atr_2", "BBB"), None);
    }
}
